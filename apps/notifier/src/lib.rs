//! # BookNotify 通知ディスパッチャ
//!
//! 書籍の作成・削除イベントをバッチで受け取り、通知メールを送信する。
//!
//! ## 処理の流れ
//!
//! ```text
//! SNS イベント ─→ decode_event ─→ BatchHandler ─→ Dispatcher（1 レコードずつ）
//!                                                    │
//!                                                    ├─ BookNotification::parse
//!                                                    ├─ TemplateRenderer::render
//!                                                    ├─ IdempotencyKey::derive
//!                                                    ├─ DedupStore::exists / record
//!                                                    └─ MailSender::send_email
//! ```
//!
//! ## モジュール構成
//!
//! - [`config`] - 環境変数からの設定読み込み
//! - [`error`] - アプリケーション層のエラー
//! - [`event`] - SNS イベントエンベロープのデコード
//! - [`usecase`] - テンプレートレンダリング、ディスパッチ、バッチ処理

pub mod config;
pub mod error;
pub mod event;
pub mod usecase;

pub use config::NotifierConfig;
pub use error::NotifierError;
pub use usecase::{
    BatchHandler,
    BatchResult,
    Dispatcher,
    MessageSettings,
    RenderError,
    TemplateRenderer,
};
