use std::{fmt::Display, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::StrataStorageError;

/// A [`Uri`] is a helper type that validates and reliably converts between
/// plain string URIs and the locations they name. Blob locations are
/// expressed as a base [`Uri`] with content-addressed key segments joined
/// onto its path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Uri(Url);

impl Uri {
    /// Produce a new [`Uri`] with `segment` appended to this one's path.
    ///
    /// The segment is treated as a single path component; it must not
    /// contain `/`.
    pub fn join_key(&self, segment: &str) -> Result<Self, StrataStorageError> {
        let mut url = self.0.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StrataStorageError::InvalidUri(format!("URI cannot be a base: {}", self.0))
            })?
            .pop_if_empty()
            .push(segment);
        Ok(Self(url))
    }

    /// Interpret this [`Uri`] as a local filesystem path.
    ///
    /// The result is an error unless the scheme is `file`.
    pub fn to_file_path(&self) -> Result<std::path::PathBuf, StrataStorageError> {
        self.0.to_file_path().map_err(|_| {
            StrataStorageError::InvalidUri(format!("URI is not a file path: {}", self.0))
        })
    }
}

impl Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", **self)
    }
}

impl From<Uri> for String {
    fn from(value: Uri) -> Self {
        (*value).to_string()
    }
}

impl Deref for Uri {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Uri {
    type Err = StrataStorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse().map_err(|error| {
            StrataStorageError::InvalidUri(format!("{error}"))
        })?))
    }
}

impl TryFrom<String> for Uri {
    type Error = StrataStorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn it_joins_key_segments_onto_the_path() -> Result<()> {
        let base: Uri = "mem://blobs/logs".parse()?;

        let joined = base.join_key("slab")?.join_key("abc123")?;

        assert_eq!(joined.to_string(), "mem://blobs/logs/slab/abc123");
        Ok(())
    }

    #[test]
    fn it_joins_onto_a_trailing_slash_without_an_empty_segment() -> Result<()> {
        let base: Uri = "file:///tmp/strata/".parse()?;

        let joined = base.join_key("tree")?;

        assert_eq!(joined.to_string(), "file:///tmp/strata/tree");
        Ok(())
    }

    #[test]
    fn it_rejects_a_malformed_uri() {
        assert!("not a uri".parse::<Uri>().is_err());
    }

    #[test]
    fn it_converts_file_uris_to_paths() -> Result<()> {
        let uri: Uri = "file:///tmp/strata/slab/abc".parse()?;

        assert_eq!(
            uri.to_file_path()?,
            std::path::PathBuf::from("/tmp/strata/slab/abc")
        );
        Ok(())
    }
}
