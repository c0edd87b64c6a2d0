//! 内存存储后端
//!
//! 有序 map，游标为上一页最后一个 key。

use crate::error::StoreResult;
use crate::storage::backend::{KvStore, ListPage};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryBackend {
    async fn list(&self, cursor: Option<&str>, limit: usize) -> StoreResult<ListPage> {
        let entries = self.entries.read().await;
        let lower = match cursor {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Unbounded,
        };

        let mut range = entries.range((lower, Bound::Unbounded)).map(|(k, _)| k);
        let keys: Vec<String> = range.by_ref().take(limit.max(1)).cloned().collect();

        let cursor = match (range.next(), keys.last()) {
            (Some(_), Some(last)) => Some(last.clone()),
            _ => None,
        };

        Ok(ListPage { keys, cursor })
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Memory"
    }
}
