use super::{TokenVariant, ValidateMode};
use crate::attr::{AttrReader, AttrWriter};
use crate::error::{Result, WebauthError};

/// A request token: either a bare WebKDC command, or a request for the WebKDC to issue an
/// `id` or `proxy` token back to the relying application (§3 `req`).
///
/// `state` is an opaque, caller-supplied blob (§6 lists it among the binary fields) round-
/// tripped unchanged through the WebKDC redirect; this core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub command: Option<String>,
    pub request_type: Option<String>,
    pub return_url: Option<String>,
    pub auth: Option<String>,
    pub proxy_type: Option<String>,
    pub state: Option<Vec<u8>>,
}

impl TokenVariant for RequestToken {
    const TYPE_NAME: &'static str = "req";

    fn validate(&self, _mode: ValidateMode) -> Result<()> {
        if self.command.is_some() {
            if self.request_type.is_some() {
                return Err(WebauthError::Corrupt("type not valid with command in req token".into()));
            }
            if self.return_url.is_some() {
                return Err(WebauthError::Corrupt("return_url not valid with command in req token".into()));
            }
            if self.auth.is_some() {
                return Err(WebauthError::Corrupt("auth not valid with command in req token".into()));
            }
            if self.proxy_type.is_some() {
                return Err(WebauthError::Corrupt("proxy_type not valid with command in req token".into()));
            }
            if self.state.is_some() {
                return Err(WebauthError::Corrupt("state not valid with command in req token".into()));
            }
            return Ok(());
        }

        let request_type = self
            .request_type
            .as_deref()
            .ok_or_else(|| WebauthError::Corrupt("missing command or type in req token".into()))?;
        if self.return_url.is_none() {
            return Err(WebauthError::Corrupt("missing return_url in req token".into()));
        }
        match request_type {
            "id" => {
                if self.auth.is_none() {
                    return Err(WebauthError::Corrupt("missing auth in req token".into()));
                }
                if self.proxy_type.is_some() {
                    return Err(WebauthError::Corrupt("proxy_type not valid with type=id in req token".into()));
                }
            }
            "proxy" => {
                if self.proxy_type.is_none() {
                    return Err(WebauthError::Corrupt("missing proxy_type in req token".into()));
                }
                if self.auth.is_some() {
                    return Err(WebauthError::Corrupt("auth not valid with type=proxy in req token".into()));
                }
            }
            other => return Err(WebauthError::Corrupt(format!("unknown type {other} in req token"))),
        }
        Ok(())
    }

    fn write_attrs(&self, w: &mut AttrWriter) {
        if let Some(command) = &self.command {
            w.push_string("cmd", command);
            return;
        }
        if let Some(request_type) = &self.request_type {
            w.push_string("rt", request_type);
        }
        if let Some(return_url) = &self.return_url {
            w.push_string("ru", return_url);
        }
        if let Some(auth) = &self.auth {
            w.push_string("au", auth);
        }
        if let Some(proxy_type) = &self.proxy_type {
            w.push_string("pt", proxy_type);
        }
        if let Some(state) = &self.state {
            w.push_binary("st", state);
        }
    }

    fn read_attrs(r: &AttrReader) -> Result<Self> {
        Ok(RequestToken {
            command: r.get_string("cmd")?,
            request_type: r.get_string("rt")?,
            return_url: r.get_string("ru")?,
            auth: r.get_string("au")?,
            proxy_type: r.get_string("pt")?,
            state: r.get_binary("st"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_command() -> RequestToken {
        RequestToken {
            command: Some("logout".into()),
            request_type: None,
            return_url: None,
            auth: None,
            proxy_type: None,
            state: None,
        }
    }

    fn id_request() -> RequestToken {
        RequestToken {
            command: None,
            request_type: Some("id".into()),
            return_url: Some("https://was.example.org/return".into()),
            auth: Some("webkdc".into()),
            proxy_type: None,
            state: Some(vec![1, 2, 3]),
        }
    }

    #[test]
    fn bare_command_validates() {
        assert!(bare_command().validate(ValidateMode::Encode).is_ok());
    }

    #[test]
    fn command_with_return_url_is_rejected() {
        let mut token = bare_command();
        token.return_url = Some("https://was.example.org/return".into());
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }

    #[test]
    fn id_request_validates() {
        assert!(id_request().validate(ValidateMode::Encode).is_ok());
    }

    #[test]
    fn proxy_request_validates() {
        let token = RequestToken {
            command: None,
            request_type: Some("proxy".into()),
            return_url: Some("https://was.example.org/return".into()),
            auth: None,
            proxy_type: Some("krb5".into()),
            state: None,
        };
        assert!(token.validate(ValidateMode::Encode).is_ok());
    }

    #[test]
    fn id_request_missing_return_url_is_rejected() {
        let mut token = id_request();
        token.return_url = None;
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }

    #[test]
    fn id_request_with_proxy_type_is_rejected() {
        let mut token = id_request();
        token.proxy_type = Some("krb5".into());
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }

    #[test]
    fn unknown_request_type_is_rejected() {
        let mut token = id_request();
        token.request_type = Some("bogus".into());
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }

    #[test]
    fn neither_command_nor_type_is_rejected() {
        let token = RequestToken {
            command: None,
            request_type: None,
            return_url: None,
            auth: None,
            proxy_type: None,
            state: None,
        };
        assert!(matches!(token.validate(ValidateMode::Encode), Err(WebauthError::Corrupt(_))));
    }
}
