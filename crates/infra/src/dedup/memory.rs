//! インメモリ重複排除台帳
//!
//! プロセス内でのみ有効な台帳。ローカル実行や `DEDUP_BACKEND=memory` 指定時に使う。
//! プロセス終了とともに記録は失われる。

use std::collections::HashSet;

use async_trait::async_trait;
use booknotify_domain::IdempotencyKey;
use tokio::sync::RwLock;

use super::DedupStore;
use crate::InfraError;

/// インメモリ実装の DedupStore
#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    keys: RwLock<HashSet<String>>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn exists(&self, key: &IdempotencyKey) -> Result<bool, InfraError> {
        Ok(self.keys.read().await.contains(key.as_str()))
    }

    async fn record(&self, key: &IdempotencyKey) -> Result<(), InfraError> {
        self.keys.write().await.insert(key.as_str().to_owned());
        Ok(())
    }
}
