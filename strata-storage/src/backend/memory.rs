use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use strata_common::ConditionalSync;
use tokio::sync::RwLock;

use super::StorageBackend;
use crate::StrataStorageError;

/// A trivial implementation of [StorageBackend] - backed by a [HashMap] -
/// where all values are kept in memory and never persisted. Clones share
/// their contents.
#[derive(Clone, Default)]
pub struct MemoryStorageBackend<Key, Value>
where
    Key: Eq + std::hash::Hash,
    Value: Clone,
{
    entries: Arc<RwLock<HashMap<Key, Value>>>,
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<Key, Value> StorageBackend for MemoryStorageBackend<Key, Value>
where
    Key: Clone + Eq + std::hash::Hash + ConditionalSync,
    Value: Clone + ConditionalSync,
{
    type Key = Key;
    type Value = Value;
    type Error = StrataStorageError;

    async fn set(&mut self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        let mut entries = self.entries.write().await;
        entries.insert(key, value);
        Ok(())
    }

    async fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn it_returns_none_for_a_missing_key() -> Result<()> {
        let backend = MemoryStorageBackend::<String, Vec<u8>>::default();

        assert!(backend.get(&"missing".to_string()).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn it_sets_and_gets_a_value() -> Result<()> {
        let mut backend = MemoryStorageBackend::<String, Vec<u8>>::default();

        backend.set("key".to_string(), vec![1, 2, 3]).await?;

        assert_eq!(backend.get(&"key".to_string()).await?, Some(vec![1, 2, 3]));

        Ok(())
    }

    #[tokio::test]
    async fn it_shares_contents_across_clones() -> Result<()> {
        let mut backend = MemoryStorageBackend::<String, Vec<u8>>::default();
        let clone = backend.clone();

        backend.set("key".to_string(), vec![4, 5, 6]).await?;

        assert_eq!(clone.get(&"key".to_string()).await?, Some(vec![4, 5, 6]));

        Ok(())
    }
}
