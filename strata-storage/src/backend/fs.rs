use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use strata_common::ConditionalSync;

use super::StorageBackend;
use crate::StrataStorageError;

/// A basic file-system-based [StorageBackend] implementation. All values are
/// stored inside a root directory as files named after their keys. Keys must
/// already be path-safe; the blob layer only produces base58-encoded content
/// hashes as keys.
#[derive(Clone)]
pub struct FileSystemStorageBackend<Key, Value>
where
    Key: AsRef<str> + Clone,
    Value: AsRef<[u8]> + From<Vec<u8>> + Clone,
{
    root_dir: PathBuf,
    key_type: PhantomData<Key>,
    value_type: PhantomData<Value>,
}

impl<Key, Value> FileSystemStorageBackend<Key, Value>
where
    Key: AsRef<str> + Clone,
    Value: AsRef<[u8]> + From<Vec<u8>> + Clone,
{
    /// Creates a new [`FileSystemStorageBackend`] that stores files in
    /// `root_dir`.
    pub async fn new<Pathlike>(root_dir: Pathlike) -> Result<Self, StrataStorageError>
    where
        Pathlike: AsRef<Path>,
    {
        let root_dir = root_dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&root_dir)
            .await
            .map_err(|error| StrataStorageError::StorageBackend(format!("{error}")))?;
        Ok(Self {
            root_dir,
            key_type: PhantomData,
            value_type: PhantomData,
        })
    }

    fn make_path(&self, key: &Key) -> PathBuf {
        self.root_dir.join(key.as_ref())
    }
}

#[async_trait]
impl<Key, Value> StorageBackend for FileSystemStorageBackend<Key, Value>
where
    Key: AsRef<str> + Clone + ConditionalSync,
    Value: AsRef<[u8]> + Clone + From<Vec<u8>> + ConditionalSync,
{
    type Key = Key;
    type Value = Value;
    type Error = StrataStorageError;

    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        tokio::fs::write(self.make_path(&key), value)
            .await
            .map_err(|error| StrataStorageError::StorageBackend(format!("{error}")))?;
        Ok(())
    }

    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        match tokio::fs::read(self.make_path(key)).await {
            Ok(bytes) => Ok(Some(Value::from(bytes))),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StrataStorageError::StorageBackend(format!("{error}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    async fn make_backend() -> Result<(FileSystemStorageBackend<String, Vec<u8>>, tempfile::TempDir)>
    {
        let tempdir = tempfile::tempdir()?;
        let backend = FileSystemStorageBackend::new(tempdir.path()).await?;
        Ok((backend, tempdir))
    }

    #[tokio::test]
    async fn it_returns_none_for_a_missing_key() -> Result<()> {
        let (backend, _tempdir) = make_backend().await?;

        let result = backend.get(&"missing".to_string()).await?;
        assert!(result.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn it_sets_and_gets_a_value() -> Result<()> {
        let (mut backend, _tempdir) = make_backend().await?;

        let key = "test-key".to_string();
        let value = b"test-value".to_vec();

        backend.set(key.clone(), value.clone()).await?;

        let result = backend.get(&key).await?;
        assert_eq!(result, Some(value));
        Ok(())
    }

    #[tokio::test]
    async fn it_overwrites_an_existing_value() -> Result<()> {
        let (mut backend, _tempdir) = make_backend().await?;

        let key = "test-key".to_string();

        backend.set(key.clone(), b"value1".to_vec()).await?;
        backend.set(key.clone(), b"value2".to_vec()).await?;

        let result = backend.get(&key).await?;
        assert_eq!(result, Some(b"value2".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn it_handles_a_large_value() -> Result<()> {
        let (mut backend, _tempdir) = make_backend().await?;

        let key = "large-key".to_string();
        let value: Vec<u8> = (0..1024 * 1024).map(|i| (i % 256) as u8).collect();

        backend.set(key.clone(), value.clone()).await?;

        let result = backend.get(&key).await?;
        assert_eq!(result, Some(value));
        Ok(())
    }
}
