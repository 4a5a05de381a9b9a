//! Typed token codec and symmetric keyring for WebAuth single sign-on.
//!
//! This crate implements the wire format for WebAuth's ten token types, the
//! encrypt-then-authenticate envelope they travel in, and the keyring and rotation machinery
//! that manages the symmetric keys those envelopes are sealed under. It does not implement a
//! network service around any of this; callers own transport, storage location, and policy.

mod attr;
mod envelope;
mod error;
mod key;
mod keyring;
mod rotation;
mod time;
mod token;
mod wrappers;

pub use error::{Result, WebauthError};
pub use key::{Key, KeyAlgorithm, KeySize, SecretBytes};
pub use keyring::{KeyUsage, Keyring, KeyringEntry, SharedKeyring};
pub use rotation::{auto_update, RotationStatus};
pub use token::{
    AppToken, CredToken, ErrorToken, ExpectedType, IdToken, LoginToken, ProxyToken, RequestToken,
    Token, ValidateMode, WebkdcFactorToken, WebkdcProxyToken, WebkdcServiceToken,
};
pub use wrappers::{base64_decode, base64_encode, peek_key_hint};
