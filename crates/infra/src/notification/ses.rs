//! SES メール送信実装
//!
//! AWS SES v2 API を使用してメールを送信する。
//! 本番環境で使用する。

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata},
    types::{Body, Content, Destination, EmailContent, Message},
};
use booknotify_domain::{EmailMessage, MailRejection};

use super::MailSender;

const CHARSET: &str = "UTF-8";

/// SES v2 クライアントを作成する
///
/// 認証情報は SDK 標準のプロバイダチェーン（実行ロール、環境変数など）から取得する。
pub async fn create_client(region: &str) -> Client {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_owned()))
        .load()
        .await;
    Client::new(&config)
}

/// SES のエラーコードを拒否理由に分類する
pub fn classify_error_code(code: Option<&str>, detail: impl Into<String>) -> MailRejection {
    let detail = detail.into();
    match code {
        Some("MessageRejected") => MailRejection::ContentRejected(detail),
        Some("MailFromDomainNotVerifiedException") => {
            MailRejection::SenderDomainNotVerified(detail)
        }
        Some("NotFoundException" | "ConfigurationSetDoesNotExistException") => {
            MailRejection::ConfigurationSetMissing(detail)
        }
        _ => MailRejection::Unclassified(detail),
    }
}

/// SES メール送信
///
/// `aws_sdk_sesv2::Client` をラップする。
pub struct SesMailSender {
    client:       Client,
    from_address: String,
}

impl SesMailSender {
    /// 新しい SES 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `client`: AWS SES v2 クライアント
    /// - `from_address`: 送信元メールアドレス（SES で検証済みであること）
    pub fn new(client: Client, from_address: String) -> Self {
        Self {
            client,
            from_address,
        }
    }

    fn content(data: &str, part: &str) -> Result<Content, MailRejection> {
        Content::builder()
            .data(data)
            .charset(CHARSET)
            .build()
            .map_err(|e| MailRejection::Unclassified(format!("{part}の構築に失敗: {e}")))
    }
}

#[async_trait]
impl MailSender for SesMailSender {
    #[tracing::instrument(skip_all, level = "debug", fields(mail.to = %email.to))]
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailRejection> {
        let destination = Destination::builder().to_addresses(&email.to).build();

        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(Self::content(&email.subject, "件名")?)
                    .body(
                        Body::builder()
                            .html(Self::content(&email.html_body, "HTML 本文")?)
                            .text(Self::content(&email.text_body, "テキスト本文")?)
                            .build(),
                    )
                    .build(),
            )
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&self.from_address)
            .destination(destination)
            .content(content)
            .send()
            .await
            .map_err(|e| classify_error_code(e.code(), DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            mail.message_id = output.message_id().unwrap_or_default(),
            "SES がメールを受け付けました"
        );
        Ok(())
    }
}
