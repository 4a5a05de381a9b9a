use super::{TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};

/// A username/credential login token presented by the browser to the WebKDC (§3 `login`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginToken {
    pub username: String,
    pub password: Option<String>,
    pub otp: Option<String>,
    pub otp_type: Option<String>,
    pub creation: u32,
}

impl TokenVariant for LoginToken {
    const TYPE_NAME: &'static str = "login";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        match (&self.password, &self.otp) {
            (None, None) => {
                return Err(WebauthError::Corrupt("missing password or otp in login token".into()))
            }
            (Some(_), Some(_)) => {
                return Err(WebauthError::Corrupt("otp not valid with password in login token".into()))
            }
            _ => {}
        }
        if self.otp_type.is_some() && self.otp.is_none() {
            return Err(WebauthError::Corrupt("otp_type not valid without otp in login token".into()));
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        w.push_string("un", &self.username);
        if let Some(password) = &self.password {
            w.push_string("pw", password);
        }
        if let Some(otp) = &self.otp {
            w.push_string("otp", otp);
        }
        if let Some(otp_type) = &self.otp_type {
            w.push_string("ot", otp_type);
        }
        w.push_time("ct", self.creation);
    }

    fn read_attrs(r: &AttrReader) -> Result<Self> {
        Ok(LoginToken {
            username: r
                .get_string("un")?
                .ok_or_else(|| WebauthError::Corrupt("missing username in login token".into()))?,
            password: r.get_string("pw")?,
            otp: r.get_string("otp")?,
            otp_type: r.get_string("ot")?,
            creation: r
                .get_time("ct")?
                .ok_or_else(|| WebauthError::Corrupt("missing creation in login token".into()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password_login() -> LoginToken {
        LoginToken {
            username: "jdoe".into(),
            password: Some("hunter2".into()),
            otp: None,
            otp_type: None,
            creation: 0,
        }
    }

    #[test]
    fn password_only_validates() {
        assert!(password_login().validate(ValidateMode::Encode).is_ok());
    }

    #[test]
    fn otp_only_validates() {
        let token = LoginToken {
            username: "jdoe".into(),
            password: None,
            otp: Some("123456".into()),
            otp_type: Some("totp".into()),
            creation: 0,
        };
        assert!(token.validate(ValidateMode::Encode).is_ok());
    }

    #[test]
    fn password_and_otp_together_is_rejected() {
        let mut token = password_login();
        token.otp = Some("123456".into());
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }

    #[test]
    fn neither_password_nor_otp_is_rejected() {
        let mut token = password_login();
        token.password = None;
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }

    #[test]
    fn otp_type_without_otp_is_rejected() {
        let mut token = password_login();
        token.otp_type = Some("totp".into());
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }
}
