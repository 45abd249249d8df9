use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum StrataStorageError {
    /// An error that occurs during block encoding
    #[error("Failed to encode a block: {0}")]
    EncodeFailed(String),

    /// An error that occurs during block decoding
    #[error("Failed to decode a block: {0}")]
    DecodeFailed(String),

    /// An error that occurs when working with a storage backend
    #[error("Storage backend error: {0}")]
    StorageBackend(String),

    /// A URI could not be parsed or converted
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// A URI named a scheme that no backend can serve
    #[error("No storage backend for URI scheme: {0}")]
    UnsupportedScheme(String),
}
