use crate::{MemoryStorageBackend, StorageBackend, StrataStorageError, Uri};

#[cfg(not(target_arch = "wasm32"))]
use crate::FileSystemStorageBackend;

/// A [`BlobStore`] moves opaque byte blobs to and from locations named by
/// [`Uri`], selecting a [`StorageBackend`] by the URI scheme:
///
/// - `mem:` blobs live in a shared in-memory backend owned by this value
///   (and its clones) and are never persisted
/// - `file:` blobs are written as files, rooted at the URI's directory
///
/// Any other scheme is rejected with
/// [`StrataStorageError::UnsupportedScheme`].
#[derive(Clone, Default)]
pub struct BlobStore {
    memory: MemoryStorageBackend<String, Vec<u8>>,
}

impl BlobStore {
    /// Store `bytes` at the location named by `uri`.
    pub async fn put(&self, uri: &Uri, bytes: Vec<u8>) -> Result<(), StrataStorageError> {
        tracing::trace!("writing {} bytes to {uri}", bytes.len());
        match uri.scheme() {
            "mem" => {
                let mut backend = self.memory.clone();
                backend.set(uri.to_string(), bytes).await
            }
            #[cfg(not(target_arch = "wasm32"))]
            "file" => {
                let (dir, name) = file_location(uri)?;
                let mut backend = FileSystemStorageBackend::<String, Vec<u8>>::new(dir).await?;
                backend.set(name, bytes).await
            }
            other => Err(StrataStorageError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Retrieve the blob (if any) stored at the location named by `uri`.
    pub async fn get(&self, uri: &Uri) -> Result<Option<Vec<u8>>, StrataStorageError> {
        match uri.scheme() {
            "mem" => self.memory.get(&uri.to_string()).await,
            #[cfg(not(target_arch = "wasm32"))]
            "file" => {
                let (dir, name) = file_location(uri)?;
                let backend = FileSystemStorageBackend::<String, Vec<u8>>::new(dir).await?;
                backend.get(&name).await
            }
            other => Err(StrataStorageError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn file_location(uri: &Uri) -> Result<(std::path::PathBuf, String), StrataStorageError> {
    let path = uri.to_file_path()?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StrataStorageError::InvalidUri(format!("URI has no file name: {uri}")))?
        .to_string();
    let dir = path
        .parent()
        .ok_or_else(|| StrataStorageError::InvalidUri(format!("URI has no directory: {uri}")))?
        .to_owned();
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn it_stores_and_retrieves_memory_blobs() -> Result<()> {
        let store = BlobStore::default();
        let uri: Uri = "mem://blobs/test/one".parse()?;

        store.put(&uri, vec![1, 2, 3]).await?;

        assert_eq!(store.get(&uri).await?, Some(vec![1, 2, 3]));
        Ok(())
    }

    #[tokio::test]
    async fn it_shares_memory_blobs_across_clones() -> Result<()> {
        let store = BlobStore::default();
        let clone = store.clone();
        let uri: Uri = "mem://blobs/test/two".parse()?;

        store.put(&uri, vec![4, 5]).await?;

        assert_eq!(clone.get(&uri).await?, Some(vec![4, 5]));
        Ok(())
    }

    #[tokio::test]
    async fn it_stores_and_retrieves_file_blobs() -> Result<()> {
        let tempdir = tempfile::tempdir()?;
        let store = BlobStore::default();
        let uri: Uri = format!("file://{}/blob-one", tempdir.path().display()).parse()?;

        store.put(&uri, vec![6, 7, 8]).await?;

        assert_eq!(store.get(&uri).await?, Some(vec![6, 7, 8]));
        Ok(())
    }

    #[tokio::test]
    async fn it_returns_none_for_a_missing_blob() -> Result<()> {
        let store = BlobStore::default();
        let uri: Uri = "mem://blobs/test/missing".parse()?;

        assert!(store.get(&uri).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_an_unsupported_scheme() -> Result<()> {
        let store = BlobStore::default();
        let uri: Uri = "gopher://blobs/test".parse()?;

        assert!(matches!(
            store.put(&uri, vec![]).await,
            Err(StrataStorageError::UnsupportedScheme(_))
        ));
        Ok(())
    }
}
