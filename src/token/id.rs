use super::{join_factors, split_factors, TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};
use crate::key::SecretBytes;

/// An identity token asserting a subject's authentication, backed by either the WebKDC's own
/// say-so or a Kerberos credential (§3 `id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdToken {
    pub subject: Option<String>,
    pub auth: String,
    pub auth_data: Option<SecretBytes>,
    pub initial_factors: Option<Vec<String>>,
    pub session_factors: Option<Vec<String>>,
    pub loa: Option<u32>,
    pub creation: u32,
    pub expiration: u32,
}

impl TokenVariant for IdToken {
    const TYPE_NAME: &'static str = "id";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        if self.auth != "webkdc" && self.auth != "krb5" {
            return Err(WebauthError::Corrupt(format!("unknown auth {} in id token", self.auth)));
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        if let Some(subject) = &self.subject {
            w.push_string("s", subject);
        }
        w.push_string("au", &self.auth);
        if let Some(auth_data) = &self.auth_data {
            w.push_binary("ad", auth_data.as_slice());
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
        Ok(IdToken {
            subject: r.get_string("s")?,
            auth: r
                .get_string("au")?
                .ok_or_else(|| WebauthError::Corrupt("missing auth in id token".into()))?,
            auth_data: r.get_binary("ad").map(SecretBytes::new),
            initial_factors: r.get_string("if")?.map(|s| split_factors(&s)),
            session_factors: r.get_string("sf")?.map(|s| split_factors(&s)),
            loa: r.get_uint32("loa")?,
            creation: r
                .get_time("ct")?
                .ok_or_else(|| WebauthError::Corrupt("missing creation in id token".into()))?,
            expiration: r
                .get_time("et")?
                .ok_or_else(|| WebauthError::Corrupt("missing expiration in id token".into()))?,
        })
    }

    fn expiration(&self) -> Option<u32> {
        Some(self.expiration)
    }
}
