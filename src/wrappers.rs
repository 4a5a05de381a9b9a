//! External-facing wrappers (§4.G): the outer base64 framing tokens travel in, and a way to
//! peek at an envelope's key-hint without a keyring or a full decrypt.

use crate::error::{Result, WebauthError};
use base64::{engine::general_purpose, Engine as _};

const HINT_LEN: usize = 4;

/// Standard MIME base64, no line wrapping (§4.G).
pub fn base64_encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Inverse of [`base64_encode`].
pub fn base64_decode(s: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(s.trim())
        .map_err(|e| WebauthError::Corrupt(format!("invalid base64: {e}")))
}

/// Extract the 4-byte key-hint (the encrypting key's `creation` timestamp) from a raw
/// envelope without decrypting it. Callers of [`crate::token::Token::decode`] never need to
/// supply this themselves; it exists for diagnostics and for external collaborators (§6)
/// that want to log which key era produced a token before attempting a full decode.
pub fn peek_key_hint(raw_envelope: &[u8]) -> Result<u32> {
    if raw_envelope.len() < HINT_LEN {
        return Err(WebauthError::Corrupt("envelope too short for a key hint".into()));
    }
    Ok(u32::from_be_bytes(raw_envelope[..HINT_LEN].try_into().unwrap()))
}
