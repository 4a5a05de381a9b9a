use super::{join_factors, split_factors, TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};
use crate::key::SecretBytes;

/// A token the WebKDC issues to itself to represent a user's delegated authentication state
/// across requests (§3 `webkdc-proxy`; GLOSSARY "Proxy token").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebkdcProxyToken {
    pub subject: String,
    pub proxy_type: String,
    pub proxy_subject: String,
    pub data: SecretBytes,
    pub initial_factors: Option<Vec<String>>,
    pub loa: Option<u32>,
    pub creation: u32,
    pub expiration: u32,
}

const VALID_PROXY_TYPES: [&str; 3] = ["krb5", "remuser", "otp"];

impl TokenVariant for WebkdcProxyToken {
    const TYPE_NAME: &'static str = "webkdc-proxy";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        if !VALID_PROXY_TYPES.contains(&self.proxy_type.as_str()) {
            return Err(WebauthError::Corrupt(format!(
                "unknown proxy_type {} in webkdc-proxy token",
                self.proxy_type
            )));
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        w.push_string("s", &self.subject);
        w.push_string("pt", &self.proxy_type);
        w.push_string("ps", &self.proxy_subject);
        w.push_binary("d", self.data.as_slice());
        if let Some(initial_factors) = &self.initial_factors {
            w.push_string("if", &join_factors(initial_factors));
        }
        if let Some(loa) = self.loa {
            w.push_uint32("loa", loa);
        }
        w.push_time("ct", self.creation);
        w.push_time("et", self.expiration);
    }

    fn read_attrs(r: &AttrReader) -> Result<Self> {
        Ok(WebkdcProxyToken {
            subject: r
                .get_string("s")?
                .ok_or_else(|| WebauthError::Corrupt("missing subject in webkdc-proxy token".into()))?,
            proxy_type: r
                .get_string("pt")?
                .ok_or_else(|| WebauthError::Corrupt("missing proxy_type in webkdc-proxy token".into()))?,
            proxy_subject: r
                .get_string("ps")?
                .ok_or_else(|| WebauthError::Corrupt("missing proxy_subject in webkdc-proxy token".into()))?,
            data: r
                .get_binary("d")
                .map(SecretBytes::new)
                .ok_or_else(|| WebauthError::Corrupt("missing data in webkdc-proxy token".into()))?,
            initial_factors: r.get_string("if")?.map(|s| split_factors(&s)),
            loa: r.get_uint32("loa")?,
            creation: r
                .get_time("ct")?
                .ok_or_else(|| WebauthError::Corrupt("missing creation in webkdc-proxy token".into()))?,
            expiration: r
                .get_time("et")?
                .ok_or_else(|| WebauthError::Corrupt("missing expiration in webkdc-proxy token".into()))?,
        })
    }

    fn expiration(&self) -> Option<u32> {
        Some(self.expiration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn krb5_token() -> WebkdcProxyToken {
        WebkdcProxyToken {
            subject: "jdoe".into(),
            proxy_type: "krb5".into(),
            proxy_subject: "krbtgt/EXAMPLE.ORG@EXAMPLE.ORG".into(),
            data: SecretBytes::new(vec![1, 2, 3]),
            initial_factors: Some(vec!["p".into()]),
            loa: None,
            creation: 0,
            expiration: 4_000_000_000,
        }
    }

    #[test]
    fn each_valid_proxy_type_validates() {
        for proxy_type in ["krb5", "remuser", "otp"] {
            let mut token = krb5_token();
            token.proxy_type = proxy_type.into();
            assert!(token.validate(ValidateMode::Encode).is_ok());
        }
    }

    #[test]
    fn unknown_proxy_type_is_rejected() {
        let mut token = krb5_token();
        token.proxy_type = "x509".into();
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }

    #[test]
    fn debug_does_not_leak_delegated_data() {
        let formatted = format!("{:?}", krb5_token());
        assert!(formatted.contains("redacted"));
    }
}
