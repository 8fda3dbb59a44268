use thiserror::Error;

pub type OczResult<T> = Result<T, OczError>;

/// Every failure the engine can report.
///
/// Cryptographic variants deliberately carry no detail: a caller cannot tell
/// a wrong key from tampered bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OczError {
    #[error("key derivation failed: {0}")]
    KdfFailure(String),

    #[error("key derivation cancelled")]
    KdfCancelled,

    #[error("authentication failed: wrong key or corrupted data")]
    AuthenticationFailure,

    #[error("key unwrap failed: wrong key or corrupted data")]
    UnwrapFailure,

    #[error("container format error: {0}")]
    ContainerFormat(String),

    #[error("chunk {index} failed authentication")]
    ChunkDecryptFailure { index: u32 },

    #[error("no active session")]
    NoActiveSession,

    #[error("encryption failed: {0}")]
    EncryptionFailure(String),

    #[error("invalid encoding: {0}")]
    Encoding(String),
}
