use super::{TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};

/// An error token, used to carry a structured failure back across a redirect (§3 `error`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorToken {
    pub code: u32,
    pub message: String,
    pub creation: u32,
}

impl TokenVariant for ErrorToken {
    const TYPE_NAME: &'static str = "error";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        if self.code == 0 {
            return Err(WebauthError::Corrupt("code must be nonzero in error token".into()));
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        w.push_uint32("ec", self.code);
        w.push_string("em", &self.message);
        w.push_time("ct", self.creation);
    }

    fn read_attrs(r: &AttrReader) -> Result<Self> {
        Ok(ErrorToken {
            code: r
                .get_uint32("ec")?
                .ok_or_else(|| WebauthError::Corrupt("missing code in error token".into()))?,
            message: r
                .get_string("em")?
                .ok_or_else(|| WebauthError::Corrupt("missing message in error token".into()))?,
            creation: r
                .get_time("ct")?
                .ok_or_else(|| WebauthError::Corrupt("missing creation in error token".into()))?,
        })
    }
}
