//! Symmetric keys (§4.A).

use crate::error::{Result, WebauthError};
use rand::RngCore;
use zeroize::Zeroizing;

/// The only algorithm family this core issues keys for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Aes,
}

impl KeyAlgorithm {
    pub(crate) fn wire_tag(self) -> u32 {
        match self {
            KeyAlgorithm::Aes => 1,
        }
    }

    pub(crate) fn from_wire_tag(tag: u32) -> Result<Self> {
        match tag {
            1 => Ok(KeyAlgorithm::Aes),
            other => Err(WebauthError::BadKey(format!("unknown key algorithm tag {other}"))),
        }
    }
}

/// Key length in bits, one of the three AES key sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySize {
    Bits128,
    Bits192,
    Bits256,
}

impl KeySize {
    pub fn bytes(self) -> usize {
        match self {
            KeySize::Bits128 => 16,
            KeySize::Bits192 => 24,
            KeySize::Bits256 => 32,
        }
    }

    fn from_byte_len(len: usize) -> Result<Self> {
        match len {
            16 => Ok(KeySize::Bits128),
            24 => Ok(KeySize::Bits192),
            32 => Ok(KeySize::Bits256),
            other => Err(WebauthError::BadKey(format!("unsupported key length {other} bytes"))),
        }
    }
}

/// A symmetric key: an algorithm tag plus its raw secret bytes.
///
/// Key material is wrapped in `Zeroizing` so it is scrubbed on drop, and `Debug` never
/// prints the bytes themselves.
#[derive(Clone)]
pub struct Key {
    algorithm: KeyAlgorithm,
    size: KeySize,
    bytes: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("algorithm", &self.algorithm)
            .field("size", &self.size)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl Key {
    /// Create a key from explicit material, which must match `size` exactly, or fresh
    /// CSPRNG randomness when `material` is `None`.
    pub fn create(algorithm: KeyAlgorithm, size: KeySize, material: Option<&[u8]>) -> Result<Self> {
        let bytes = match material {
            Some(m) => {
                if m.len() != size.bytes() {
                    return Err(WebauthError::BadKey(format!(
                        "key material is {} bytes, expected {}",
                        m.len(),
                        size.bytes()
                    )));
                }
                Zeroizing::new(m.to_vec())
            }
            None => {
                let mut buf = vec![0u8; size.bytes()];
                rand::rngs::OsRng.fill_bytes(&mut buf);
                Zeroizing::new(buf)
            }
        };
        Ok(Key { algorithm, size, bytes })
    }

    /// Deep copy.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn size(&self) -> KeySize {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn from_wire(algorithm_tag: u32, bytes: &[u8]) -> Result<Self> {
        let algorithm = KeyAlgorithm::from_wire_tag(algorithm_tag)?;
        let size = KeySize::from_byte_len(bytes.len())?;
        Ok(Key {
            algorithm,
            size,
            bytes: Zeroizing::new(bytes.to_vec()),
        })
    }
}

/// A secret byte string carried inside a token (`session_key`, `auth_data`, `data`,
/// `webkdc_proxy`) — wrapped the same way [`Key`] wraps its own material, so a decoded
/// token's `Debug` output never leaks credentials into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBytes(Zeroizing<Vec<u8>>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretBytes").field(&"<redacted>").finish()
    }
}
