//! # メール送信
//!
//! 通知メールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailSender` trait でメール送信を抽象化
//! - **3 つの実装**: SES（本番用）、SMTP（Mailpit 開発用）、Noop（通知無効化用）
//! - **環境変数切替**: `MAIL_BACKEND` でランタイム選択
//!
//! 送信失敗はバックエンド固有のエラーのまま返さず、[`MailRejection`] に分類して返す。
//! 送信の再試行はここでは行わない。

mod noop;
mod ses;
mod smtp;

use async_trait::async_trait;
use booknotify_domain::{EmailMessage, MailRejection};
pub use noop::NoopMailSender;
pub use ses::{SesMailSender, classify_error_code, create_client as create_ses_client};
pub use smtp::SmtpMailSender;

/// メール送信トレイト
#[async_trait]
pub trait MailSender: Send + Sync {
    /// メールを 1 通送信する
    ///
    /// 宛先は `email.to` の 1 件のみ。送信元アドレスは各実装が保持する。
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailRejection>;
}
