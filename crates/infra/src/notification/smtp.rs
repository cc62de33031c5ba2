//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。

use async_trait::async_trait;
use booknotify_domain::{EmailMessage, MailRejection};
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp,
};

use super::MailSender;

/// SMTP メール送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpMailSender {
    transport:    AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    /// - `from_address`: 送信元メールアドレス
    pub fn new(host: &str, port: u16, from_address: String) -> Self {
        // TLS なしで接続する（Mailpit 等のローカル SMTP 向け）
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self {
            transport,
            from_address,
        }
    }

    fn build_message(&self, email: &EmailMessage) -> Result<Message, MailRejection> {
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|e| MailRejection::ContentRejected(format!("送信元アドレス不正: {e}")))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| MailRejection::ContentRejected(format!("宛先アドレス不正: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| MailRejection::ContentRejected(format!("メッセージ構築失敗: {e}")))
    }
}

/// SMTP 応答を拒否理由に分類する
///
/// 5xx の恒久エラーはメッセージ自体の拒否とみなす。それ以外は分類しない。
fn classify_smtp_error(err: &smtp::Error) -> MailRejection {
    if err.is_permanent() {
        MailRejection::ContentRejected(format!("SMTP 送信拒否: {err}"))
    } else {
        MailRejection::Unclassified(format!("SMTP 送信失敗: {err}"))
    }
}

#[async_trait]
impl MailSender for SmtpMailSender {
    #[tracing::instrument(skip_all, level = "debug", fields(mail.to = %email.to))]
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailRejection> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| classify_smtp_error(&e))?;

        Ok(())
    }
}
