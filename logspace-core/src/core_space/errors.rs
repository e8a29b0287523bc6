//! Error types for the space subsystem
//!
//! One taxonomy for the whole core: validation failures are raised before any
//! I/O, decode failures during bulk reads abort the whole read, and
//! collaborator failures bubble through `Store`/`Identity` unmodified.

use thiserror::Error;

/// Errors that can occur in the space subsystem
#[derive(Debug, Error)]
pub enum SpaceError {
    /// Undefined or mismatched-length input, rejected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed thread address
    #[error("Invalid thread address: {0}")]
    InvalidAddress(String),

    /// Thread address names a different space than the one operated on
    #[error("Thread address {address} does not belong to space {space}")]
    CrossSpace { address: String, space: String },

    /// Authentication or parse failure while decoding a private entry;
    /// indicates key mismatch or corruption, never masked
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error bubbled from the underlying log engine
    #[error("Store error: {0}")]
    Store(String),

    /// Error bubbled from the identity/keyring collaborator
    #[error("Identity error: {0}")]
    Identity(String),

    /// Operation attempted in a lifecycle state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type for space operations
pub type SpaceResult<T> = Result<T, SpaceError>;

impl From<serde_json::Error> for SpaceError {
    fn from(err: serde_json::Error) -> Self {
        SpaceError::Serialization(err.to_string())
    }
}
