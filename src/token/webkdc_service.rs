use super::{TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};
use crate::key::SecretBytes;

/// A service token a WAS uses to authenticate itself to the WebKDC (§3 `webkdc-service`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebkdcServiceToken {
    pub subject: String,
    pub session_key: SecretBytes,
    pub creation: u32,
    pub expiration: u32,
}

impl TokenVariant for WebkdcServiceToken {
    const TYPE_NAME: &'static str = "webkdc-service";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        w.push_string("s", &self.subject);
        w.push_binary("k", self.session_key.as_slice());
        w.push_time("ct", self.creation);
        w.push_time("et", self.expiration);
    }

    fn read_attrs(r: &AttrReader) -> Result<Self> {
        Ok(WebkdcServiceToken {
            subject: r
                .get_string("s")?
                .ok_or_else(|| WebauthError::Corrupt("missing subject in webkdc-service token".into()))?,
            session_key: r
                .get_binary("k")
                .map(SecretBytes::new)
                .ok_or_else(|| WebauthError::Corrupt("missing session_key in webkdc-service token".into()))?,
            creation: r
                .get_time("ct")?
                .ok_or_else(|| WebauthError::Corrupt("missing creation in webkdc-service token".into()))?,
            expiration: r
                .get_time("et")?
                .ok_or_else(|| WebauthError::Corrupt("missing expiration in webkdc-service token".into()))?,
        })
    }

    fn expiration(&self) -> Option<u32> {
        Some(self.expiration)
    }
}
