//! Crate-wide error taxonomy.
//!
//! Every fallible operation in this crate returns `Result<T, WebauthError>`. Lower layers
//! (the attribute codec, the envelope) report the most specific kind they can; higher layers
//! (token validation, keyring I/O) wrap with contextual detail without discarding the kind.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebauthError {
    #[error("corrupt: {0}")]
    Corrupt(String),

    #[error("HMAC verification failed")]
    BadHmac,

    #[error("bad key: {0}")]
    BadKey(String),

    #[error("token expired")]
    TokenExpired,

    #[error("token stale")]
    TokenStale,

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("cannot open file for read: {0}")]
    FileOpenRead(String),

    #[error("cannot read file: {0}")]
    FileRead(String),

    #[error("cannot open file for write: {0}")]
    FileOpenWrite(String),

    #[error("cannot write file: {0}")]
    FileWrite(String),

    #[error("unsupported keyring file version")]
    FileVersion,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, WebauthError>;
