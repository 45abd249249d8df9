use strata_storage::StrataStorageError;
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum StrataLogError {
    /// The log was configured with out-of-range options
    #[error("Invalid log configuration: {0}")]
    Configuration(String),

    /// There was a problem when accessing storage
    #[error("Storage error: {0}")]
    Storage(#[from] StrataStorageError),

    /// A payload or blob could not be decoded into the expected form
    #[error("Failed to decode: {0}")]
    Decode(String),

    /// A referenced blob is missing from storage
    #[error("Blob not found in storage: {0}")]
    MissingBlob(String),

    /// The log did not match the expected shape
    #[error("Log did not match expected shape: {0}")]
    UnexpectedShape(String),
}

impl StrataLogError {
    /// Wrap an [`Encoder`] error, preserving the decode/encode distinction.
    ///
    /// [`Encoder`]: strata_storage::Encoder
    pub(crate) fn codec<E>(error: E) -> Self
    where
        E: Into<StrataStorageError>,
    {
        match error.into() {
            StrataStorageError::DecodeFailed(message) => StrataLogError::Decode(message),
            other => StrataLogError::Storage(other),
        }
    }
}
