use super::{join_factors, split_factors, TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};
use crate::key::SecretBytes;

/// An application token: either an anonymous session-key bearer, or a subject-bound session
/// (§3 `app`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppToken {
    pub subject: Option<String>,
    pub authz_subject: Option<String>,
    pub session_key: Option<SecretBytes>,
    pub last_used: Option<u32>,
    pub initial_factors: Option<Vec<String>>,
    pub session_factors: Option<Vec<String>>,
    pub loa: Option<u32>,
    pub creation: u32,
    pub expiration: u32,
}

impl TokenVariant for AppToken {
    const TYPE_NAME: &'static str = "app";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        if self.session_key.is_some() {
            if self.subject.is_some() {
                return Err(WebauthError::Corrupt("subject not valid with session_key in app token".into()));
            }
            if self.authz_subject.is_some() {
                return Err(WebauthError::Corrupt(
                    "authz_subject not valid with session_key in app token".into(),
                ));
            }
            if self.last_used.is_some() {
                return Err(WebauthError::Corrupt("last_used not valid with session_key in app token".into()));
            }
            if self.initial_factors.is_some() {
                return Err(WebauthError::Corrupt(
                    "initial_factors not valid with session_key in app token".into(),
                ));
            }
            if self.session_factors.is_some() {
                return Err(WebauthError::Corrupt(
                    "session_factors not valid with session_key in app token".into(),
                ));
            }
            if self.loa.is_some() {
                return Err(WebauthError::Corrupt("loa not valid with session_key in app token".into()));
            }
        } else if self.subject.is_none() {
            return Err(WebauthError::Corrupt("missing subject in app token".into()));
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        if let Some(subject) = &self.subject {
            w.push_string("s", subject);
        }
        if let Some(authz_subject) = &self.authz_subject {
            w.push_string("as", authz_subject);
        }
        if let Some(session_key) = &self.session_key {
            w.push_binary("k", session_key.as_slice());
        }
        if let Some(last_used) = self.last_used {
            w.push_time("lu", last_used);
        }
        if let Some(initial_factors) = &self.initial_factors {
            w.push_string("if", &join_factors(initial_factors));
        }
        if let Some(session_factors) = &self.session_factors {
            w.push_string("sf", &join_factors(session_factors));
        }
        if let Some(loa) = self.loa {
            w.push_uint32("loa", loa);
        }
        w.push_time("ct", self.creation);
        w.push_time("et", self.expiration);
    }

    fn read_attrs(r: &AttrReader) -> Result<Self> {
        Ok(AppToken {
            subject: r.get_string("s")?,
            authz_subject: r.get_string("as")?,
            session_key: r.get_binary("k").map(SecretBytes::new),
            last_used: r.get_time("lu")?,
            initial_factors: r.get_string("if")?.map(|s| split_factors(&s)),
            session_factors: r.get_string("sf")?.map(|s| split_factors(&s)),
            loa: r.get_uint32("loa")?,
            creation: r
                .get_time("ct")?
                .ok_or_else(|| WebauthError::Corrupt("missing creation in app token".into()))?,
            expiration: r
                .get_time("et")?
                .ok_or_else(|| WebauthError::Corrupt("missing expiration in app token".into()))?,
        })
    }

    fn expiration(&self) -> Option<u32> {
        Some(self.expiration)
    }
}
