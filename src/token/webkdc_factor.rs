use super::{join_factors, split_factors, TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};

/// A token recording which authentication factors a subject satisfied, for reuse across a
/// single-sign-on session without re-prompting (§3 `webkdc-factor`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebkdcFactorToken {
    pub subject: String,
    pub expiration: u32,
    pub initial_factors: Option<Vec<String>>,
    pub session_factors: Option<Vec<String>>,
}

impl TokenVariant for WebkdcFactorToken {
    const TYPE_NAME: &'static str = "webkdc-factor";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        if self.initial_factors.is_none() && self.session_factors.is_none() {
            return Err(WebauthError::Corrupt(
                "missing initial_factors or session_factors in webkdc-factor token".into(),
            ));
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        w.push_string("s", &self.subject);
        w.push_time("et", self.expiration);
        if let Some(initial_factors) = &self.initial_factors {
            w.push_string("if", &join_factors(initial_factors));
        }
        if let Some(session_factors) = &self.session_factors {
            w.push_string("sf", &join_factors(session_factors));
        }
    }

    fn read_attrs(r: &AttrReader) -> Result<Self> {
        Ok(WebkdcFactorToken {
            subject: r
                .get_string("s")?
                .ok_or_else(|| WebauthError::Corrupt("missing subject in webkdc-factor token".into()))?,
            expiration: r
                .get_time("et")?
                .ok_or_else(|| WebauthError::Corrupt("missing expiration in webkdc-factor token".into()))?,
            initial_factors: r.get_string("if")?.map(|s| split_factors(&s)),
            session_factors: r.get_string("sf")?.map(|s| split_factors(&s)),
        })
    }

    fn expiration(&self) -> Option<u32> {
        Some(self.expiration)
    }
}
