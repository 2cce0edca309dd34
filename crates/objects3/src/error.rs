//! Error types for the objects3 crate

use objects3_store::StoreError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by document operations.
///
/// A missing key is never an error here; reads report it as `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// The store rejected or failed the request
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored body is not the requested JSON shape
    #[error("failed to decode JSON document {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document could not be serialized
    #[error("failed to encode JSON document {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Keys and documents of a multi-put do not pair up
    #[error("{keys} keys given for {documents} documents")]
    LengthMismatch { keys: usize, documents: usize },
}

impl Error {
    /// The storage service error code, if the store reported one
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Store(e) => e.code(),
            _ => None,
        }
    }
}
