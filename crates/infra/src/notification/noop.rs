//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。

use async_trait::async_trait;
use booknotify_domain::{EmailMessage, MailRejection};

use super::MailSender;

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopMailSender;

#[async_trait]
impl MailSender for NoopMailSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailRejection> {
        tracing::info!(
            mail.to = %email.to,
            mail.subject = %email.subject,
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_emailがエラーを返さない() {
        let sender = NoopMailSender;
        let email = EmailMessage {
            to:        "ops@example.com".to_string(),
            subject:   "Your book 'Go in Action' on example.com has been created".to_string(),
            html_body: "<p>Hi Doe Jane,</p>".to_string(),
            text_body: "Hi Doe Jane,".to_string(),
        };

        let result = sender.send_email(&email).await;
        assert!(result.is_ok());
    }
}
