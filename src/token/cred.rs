use super::{TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};
use crate::key::SecretBytes;

/// A delegated credential token wrapping an opaque Kerberos credential blob (§3 `cred`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredToken {
    pub subject: String,
    pub credential_type: String,
    pub service: String,
    pub data: SecretBytes,
    pub creation: u32,
    pub expiration: u32,
}

impl TokenVariant for CredToken {
    const TYPE_NAME: &'static str = "cred";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        if self.credential_type != "krb5" {
            return Err(WebauthError::Corrupt(format!(
                "unknown type {} in cred token",
                self.credential_type
            )));
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        w.push_string("s", &self.subject);
        w.push_string("ty", &self.credential_type);
        w.push_string("sv", &self.service);
        w.push_binary("d", self.data.as_slice());
        w.push_time("ct", self.creation);
        w.push_time("et", self.expiration);
    }

    fn read_attrs(r: &AttrReader) -> Result<Self> {
        Ok(CredToken {
            subject: r
                .get_string("s")?
                .ok_or_else(|| WebauthError::Corrupt("missing subject in cred token".into()))?,
            credential_type: r
                .get_string("ty")?
                .ok_or_else(|| WebauthError::Corrupt("missing type in cred token".into()))?,
            service: r
                .get_string("sv")?
                .ok_or_else(|| WebauthError::Corrupt("missing service in cred token".into()))?,
            data: r
                .get_binary("d")
                .map(SecretBytes::new)
                .ok_or_else(|| WebauthError::Corrupt("missing data in cred token".into()))?,
            creation: r
                .get_time("ct")?
                .ok_or_else(|| WebauthError::Corrupt("missing creation in cred token".into()))?,
            expiration: r
                .get_time("et")?
                .ok_or_else(|| WebauthError::Corrupt("missing expiration in cred token".into()))?,
        })
    }

    fn expiration(&self) -> Option<u32> {
        Some(self.expiration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn krb5_token() -> CredToken {
        CredToken {
            subject: "jdoe".into(),
            credential_type: "krb5".into(),
            service: "imap/mail.example.org".into(),
            data: SecretBytes::new(vec![1, 2, 3]),
            creation: 0,
            expiration: 4_000_000_000,
        }
    }

    #[test]
    fn krb5_type_validates() {
        assert!(krb5_token().validate(ValidateMode::Encode).is_ok());
    }

    #[test]
    fn unknown_credential_type_is_rejected() {
        let mut token = krb5_token();
        token.credential_type = "oauth2".into();
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }

    #[test]
    fn debug_does_not_leak_credential_data() {
        let token = krb5_token();
        let formatted = format!("{:?}", token);
        assert!(formatted.contains("redacted"));
    }
}
