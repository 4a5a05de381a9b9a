//! Typed tokens (§3, §4.E): a discriminated union of ten variants, each with its own field
//! constraints, encoded via the attribute codec (§4.C) and sealed via the envelope (§4.D).

mod app;
mod cred;
mod error_token;
mod id;
mod login;
mod proxy;
mod request;
mod webkdc_factor;
mod webkdc_proxy;
mod webkdc_service;

pub use app::AppToken;
pub use cred::CredToken;
pub use error_token::ErrorToken;
pub use id::IdToken;
pub use login::LoginToken;
pub use proxy::ProxyToken;
pub use request::RequestToken;
pub use webkdc_factor::WebkdcFactorToken;
pub use webkdc_proxy::WebkdcProxyToken;
pub use webkdc_service::WebkdcServiceToken;

use crate::attr::{AttrReader, AttrWriter};
use crate::envelope;
use crate::error::{Result, WebauthError};
use crate::keyring::Keyring;
use crate::time::now_u32;
use crate::wrappers;

/// Which direction validation runs in: encoding skips the expiration check, decoding
/// enforces it (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateMode {
    Encode,
    Decode,
}

/// A type a caller is willing to accept from [`Token::decode`]; `Any` skips the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    Any,
    App,
    Cred,
    Error,
    Id,
    Login,
    Proxy,
    Request,
    WebkdcFactor,
    WebkdcProxy,
    WebkdcService,
}

impl ExpectedType {
    fn wire_name(self) -> Option<&'static str> {
        match self {
            ExpectedType::Any => None,
            ExpectedType::App => Some("app"),
            ExpectedType::Cred => Some("cred"),
            ExpectedType::Error => Some("error"),
            ExpectedType::Id => Some("id"),
            ExpectedType::Login => Some("login"),
            ExpectedType::Proxy => Some("proxy"),
            ExpectedType::Request => Some("req"),
            ExpectedType::WebkdcFactor => Some("webkdc-factor"),
            ExpectedType::WebkdcProxy => Some("webkdc-proxy"),
            ExpectedType::WebkdcService => Some("webkdc-service"),
        }
    }
}

/// A shared contract every token variant struct implements; not object-safe by design since
/// dispatch happens on the wire `t` string, not on a trait object (§9 "dispatch table").
pub(crate) trait TokenVariant: Sized {
    const TYPE_NAME: &'static str;
    fn validate(&self, mode: ValidateMode) -> Result<()>;
    fn write_attrs(&self, w: &mut AttrWriter);
    fn read_attrs(r: &AttrReader) -> Result<Self>;
    /// `None` for variants with no expiration field (§3: `login`, `error`).
    fn expiration(&self) -> Option<u32> {
        None
    }
}

/// Join a factor list for the wire (comma-separated, per the GLOSSARY).
pub(crate) fn join_factors(factors: &[String]) -> String {
    factors.join(",")
}

/// Split a wire factor list back into its components; empty string yields an empty list.
pub(crate) fn split_factors(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(',').map(|s| s.to_string()).collect()
    }
}

macro_rules! token_enum {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// The tagged union over all ten token variants (§3).
        #[derive(Debug, Clone, PartialEq)]
        pub enum Token {
            $($variant($ty)),+
        }

        impl Token {
            fn type_name(&self) -> &'static str {
                match self {
                    $(Token::$variant(_) => <$ty as TokenVariant>::TYPE_NAME),+
                }
            }

            fn validate(&self, mode: ValidateMode) -> Result<()> {
                match self {
                    $(Token::$variant(t) => t.validate(mode)),+
                }
            }

            fn write_attrs(&self, w: &mut AttrWriter) {
                match self {
                    $(Token::$variant(t) => t.write_attrs(w)),+
                }
            }

            fn expiration(&self) -> Option<u32> {
                match self {
                    $(Token::$variant(t) => t.expiration()),+
                }
            }
        }
    };
}

token_enum! {
    App(AppToken),
    Cred(CredToken),
    Error(ErrorToken),
    Id(IdToken),
    Login(LoginToken),
    Proxy(ProxyToken),
    Request(RequestToken),
    WebkdcFactor(WebkdcFactorToken),
    WebkdcProxy(WebkdcProxyToken),
    WebkdcService(WebkdcServiceToken),
}

impl Token {
    /// Validate, serialize, encrypt under the keyring's best encryption key, and base64 the
    /// result (§4.E `encode`).
    pub fn encode(&self, keyring: &Keyring) -> Result<String> {
        let raw = self.encode_raw(keyring)?;
        Ok(wrappers::base64_encode(&raw))
    }

    /// Same as [`Token::encode`] but without the outer base64 framing (§4.E `encode_raw`).
    pub fn encode_raw(&self, keyring: &Keyring) -> Result<Vec<u8>> {
        self.validate(ValidateMode::Encode)?;
        let mut w = AttrWriter::new();
        w.push_string("t", self.type_name());
        self.write_attrs(&mut w);
        let payload = w.finish();
        envelope::encrypt(&payload, keyring)
    }

    /// Base64-decode, decrypt, parse attributes, dispatch to a variant, validate, and check
    /// expiration (§4.E `decode`).
    pub fn decode(s: &str, expected: ExpectedType, keyring: &Keyring) -> Result<Token> {
        let raw = wrappers::base64_decode(s)?;
        Self::decode_raw(&raw, expected, keyring)
    }

    /// Same as [`Token::decode`] but for a raw (non-base64) envelope.
    pub fn decode_raw(raw: &[u8], expected: ExpectedType, keyring: &Keyring) -> Result<Token> {
        let payload = envelope::decrypt(raw, keyring)?;
        let r = AttrReader::parse(&payload)?;
        let actual = r
            .get_string("t")?
            .ok_or_else(|| WebauthError::Corrupt("missing t in token".into()))?;

        if let Some(expected_name) = expected.wire_name() {
            if expected_name != actual {
                return Err(WebauthError::Corrupt(format!(
                    "token type mismatch: expected {expected_name}, got {actual}"
                )));
            }
        }

        let token = match actual.as_str() {
            "app" => Token::App(AppToken::read_attrs(&r)?),
            "cred" => Token::Cred(CredToken::read_attrs(&r)?),
            "error" => Token::Error(ErrorToken::read_attrs(&r)?),
            "id" => Token::Id(IdToken::read_attrs(&r)?),
            "login" => Token::Login(LoginToken::read_attrs(&r)?),
            "proxy" => Token::Proxy(ProxyToken::read_attrs(&r)?),
            "req" => Token::Request(RequestToken::read_attrs(&r)?),
            "webkdc-factor" => Token::WebkdcFactor(WebkdcFactorToken::read_attrs(&r)?),
            "webkdc-proxy" => Token::WebkdcProxy(WebkdcProxyToken::read_attrs(&r)?),
            "webkdc-service" => Token::WebkdcService(WebkdcServiceToken::read_attrs(&r)?),
            other => return Err(WebauthError::Corrupt(format!("unknown token type {other}"))),
        };

        token.validate(ValidateMode::Decode)?;

        if let Some(expiration) = token.expiration() {
            let now = now_u32()?;
            if expiration < now {
                return Err(WebauthError::TokenExpired);
            }
        }

        Ok(token)
    }
}
