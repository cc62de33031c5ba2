//! # BookNotify ドメイン層
//!
//! 書籍の作成・削除イベントからメール通知を組み立てるためのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **純粋関数のみ**: パース・鍵導出はいずれも I/O を持たない
//! - **型による分類**: 処理結果・送信拒否理由を列挙型で表現し、ログ集計に使う
//! - **インフラ非依存**: DynamoDB や SES の型はこのクレートに現れない
//!
//! ## 依存関係の方向
//!
//! ```text
//! notifier → infra → domain
//!     ↘        ↓
//!       shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`notification`] - 通知レコード、メッセージのパース、メールメッセージ
//! - [`idempotency`] - 重複排除に使う冪等キーの導出
//! - [`dispatch`] - レコード単位の処理結果と送信拒否の分類
//!
//! ## 使用例
//!
//! ```rust
//! use booknotify_domain::notification::{BookAction, BookNotification};
//!
//! let record = BookNotification::parse("Create Book,42,Go in Action,Doe Jane,jane@x.com").unwrap();
//! assert_eq!(record.action, BookAction::Create);
//! assert_eq!(record.book_title, "Go in Action");
//! ```

pub mod dispatch;
pub mod idempotency;
pub mod notification;

pub use dispatch::{DispatchOutcome, DropReason, FailureReason, MailRejection};
pub use idempotency::{IdempotencyKey, KeyStrategy};
pub use notification::{
    BookAction,
    BookNotification,
    EmailMessage,
    ParseError,
    RawNotification,
};
