use super::{join_factors, split_factors, TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};
use crate::key::SecretBytes;

/// A proxy token: a WebKDC-delegated credential a WAS can present on the user's behalf
/// (§3 `proxy`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyToken {
    pub subject: String,
    pub proxy_type: String,
    pub webkdc_proxy: SecretBytes,
    pub initial_factors: Option<Vec<String>>,
    pub session_factors: Option<Vec<String>>,
    pub loa: Option<u32>,
    pub creation: u32,
    pub expiration: u32,
}

impl TokenVariant for ProxyToken {
    const TYPE_NAME: &'static str = "proxy";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        if self.proxy_type != "krb5" {
            return Err(WebauthError::Corrupt(format!("unknown type {} in proxy token", self.proxy_type)));
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        w.push_string("s", &self.subject);
        w.push_string("ty", &self.proxy_type);
        w.push_binary("wp", self.webkdc_proxy.as_slice());
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
        Ok(ProxyToken {
            subject: r
                .get_string("s")?
                .ok_or_else(|| WebauthError::Corrupt("missing subject in proxy token".into()))?,
            proxy_type: r
                .get_string("ty")?
                .ok_or_else(|| WebauthError::Corrupt("missing type in proxy token".into()))?,
            webkdc_proxy: r
                .get_binary("wp")
                .map(SecretBytes::new)
                .ok_or_else(|| WebauthError::Corrupt("missing webkdc_proxy in proxy token".into()))?,
            initial_factors: r.get_string("if")?.map(|s| split_factors(&s)),
            session_factors: r.get_string("sf")?.map(|s| split_factors(&s)),
            loa: r.get_uint32("loa")?,
            creation: r
                .get_time("ct")?
                .ok_or_else(|| WebauthError::Corrupt("missing creation in proxy token".into()))?,
            expiration: r
                .get_time("et")?
                .ok_or_else(|| WebauthError::Corrupt("missing expiration in proxy token".into()))?,
        })
    }

    fn expiration(&self) -> Option<u32> {
        Some(self.expiration)
    }
}
