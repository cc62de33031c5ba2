//! # 重複排除台帳
//!
//! 送信済みメッセージの冪等キーを記録し、同じ通知を二度送らないための台帳。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `DedupStore` trait で台帳の参照・記録を抽象化
//! - **2 つの実装**: DynamoDB（本番用）、インメモリ（ローカル実行用）
//! - **環境変数切替**: `DEDUP_BACKEND` でランタイム選択
//!
//! 「参照してから記録する」は原子的ではない。同じキーの 2 件が並行に処理された場合は
//! 両方送信されうる。これは上流の at-least-once 配信と合わせて許容している。

mod dynamodb;
mod memory;

use async_trait::async_trait;
use booknotify_domain::IdempotencyKey;
pub use dynamodb::DynamoDbDedupStore;
pub use memory::InMemoryDedupStore;

use crate::InfraError;

/// 重複排除台帳トレイト
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// キーが既に記録されているか確認する
    ///
    /// 直前の `record` が反映された状態を返すこと（強整合読み取り）。
    async fn exists(&self, key: &IdempotencyKey) -> Result<bool, InfraError>;

    /// キーを記録する
    ///
    /// 既に記録済みのキーに対しても成功を返す。
    async fn record(&self, key: &IdempotencyKey) -> Result<(), InfraError>;
}
