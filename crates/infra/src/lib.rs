//! # BookNotify インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! 通知ディスパッチャが依存する 2 つの外部協調者を trait で抽象化し、
//! その具体的な実装を提供する。クライアントはプロセス起動時に一度だけ作成し、
//! 呼び出し側へ明示的に渡す（グローバルな遅延初期化は行わない）。
//!
//! ## 責務
//!
//! - **重複排除台帳**: [`dedup::DedupStore`]（DynamoDB / インメモリ）
//! - **メール送信**: [`notification::MailSender`]（SES / SMTP / Noop）
//! - **DynamoDB 接続**: クライアント生成とテーブルの自動作成
//!
//! ## モジュール構成
//!
//! - [`dedup`] - 重複排除台帳
//! - [`dynamodb`] - DynamoDB 接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信
//! - `mock` - テスト用インメモリ実装（`test-utils` feature）

pub mod dedup;
pub mod dynamodb;
pub mod error;
pub mod notification;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use dedup::DedupStore;
pub use error::{InfraError, InfraErrorKind};
pub use notification::MailSender;
