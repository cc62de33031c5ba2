//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **HTML のみ自動エスケープ**: `.html` テンプレートは tera の autoescape 対象。
//!   ベース URL は設定値のため `safe` で埋め込む
//! - **決定的な出力**: 同じ入力からは常にバイト単位で同一の件名・本文を生成する。
//!   プレーンテキスト本文は冪等キーの元になる

use booknotify_domain::{BookAction, BookNotification, EmailMessage};
use tera::{Context, Tera};
use thiserror::Error;

/// テンプレート処理のエラー
#[derive(Debug, Error)]
pub enum RenderError {
    /// 埋め込みテンプレートの登録（構文解析）に失敗
    #[error("テンプレートの登録に失敗しました: {0}")]
    Register(#[source] tera::Error),

    /// 変数の展開に失敗
    #[error("テンプレート {template} のレンダリングに失敗しました: {source}")]
    Render {
        template: String,
        #[source]
        source:   tera::Error,
    },
}

/// メッセージ生成に使う設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSettings {
    /// サイト名（件名・本文に表示）
    pub site_name: String,
    /// 書籍詳細・一覧リンクのベース URL（末尾スラッシュなし）
    pub base_url:  String,
    /// 送信先メールアドレス
    pub recipient: String,
}

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、`BookNotification` から
/// `EmailMessage` を生成する。
pub struct TemplateRenderer {
    engine:   Tera,
    settings: MessageSettings,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new(settings: MessageSettings) -> Result<Self, RenderError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "book_created.html",
                    include_str!("../../templates/notifications/book_created.html"),
                ),
                (
                    "book_created.txt",
                    include_str!("../../templates/notifications/book_created.txt"),
                ),
                (
                    "book_deleted.html",
                    include_str!("../../templates/notifications/book_deleted.html"),
                ),
                (
                    "book_deleted.txt",
                    include_str!("../../templates/notifications/book_deleted.txt"),
                ),
                (
                    "fallback.html",
                    include_str!("../../templates/notifications/fallback.html"),
                ),
                (
                    "fallback.txt",
                    include_str!("../../templates/notifications/fallback.txt"),
                ),
            ])
            .map_err(RenderError::Register)?;

        Ok(Self { engine, settings })
    }

    /// 通知レコードからメールメッセージを生成する
    ///
    /// # 引数
    ///
    /// - `notification`: パース済みの通知レコード
    /// - `unsubscribe_url`: 購読解除リンク（空文字の場合はリンクを出力しない）
    pub fn render(
        &self,
        notification: &BookNotification,
        unsubscribe_url: &str,
    ) -> Result<EmailMessage, RenderError> {
        let (template_name, subject) = self.template_and_subject(notification);
        let context = self.build_context(notification, unsubscribe_url);

        let html_body = self.render_one(&format!("{template_name}.html"), &context)?;
        let text_body = self.render_one(&format!("{template_name}.txt"), &context)?;

        Ok(EmailMessage {
            to: self.settings.recipient.clone(),
            subject,
            html_body,
            text_body,
        })
    }

    fn render_one(&self, template: &str, context: &Context) -> Result<String, RenderError> {
        self.engine
            .render(template, context)
            .map_err(|source| RenderError::Render {
                template: template.to_string(),
                source,
            })
    }

    fn template_and_subject(&self, notification: &BookNotification) -> (&'static str, String) {
        let site = &self.settings.site_name;
        let title = &notification.book_title;

        match notification.action {
            BookAction::Create => (
                "book_created",
                format!("Your book '{title}' on {site} has been created"),
            ),
            BookAction::Delete => (
                "book_deleted",
                format!(
                    "The Book '{}' of '{title}' on {site} has been deleted",
                    notification.book_id
                ),
            ),
            BookAction::Unrecognized => ("fallback", format!("Notification from {site}")),
        }
    }

    fn build_context(&self, notification: &BookNotification, unsubscribe_url: &str) -> Context {
        let mut context = Context::new();
        context.insert("site_name", &self.settings.site_name);
        context.insert("base_url", &self.settings.base_url);
        context.insert("action_label", &notification.action_label);
        context.insert("book_id", &notification.book_id);
        context.insert("book_title", &notification.book_title);
        context.insert("owner_name", &notification.owner_name);
        context.insert("owner_email", &notification.owner_email);
        context.insert("unsubscribe_url", unsubscribe_url);
        context
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_settings() -> MessageSettings {
        MessageSettings {
            site_name: "books.example.com".to_string(),
            base_url:  "http://prod.books.example.com".to_string(),
            recipient: "ops@example.com".to_string(),
        }
    }

    fn make_renderer() -> TemplateRenderer {
        TemplateRenderer::new(make_settings()).unwrap()
    }

    fn parse(raw: &str) -> BookNotification {
        BookNotification::parse(raw).unwrap()
    }

    #[test]
    fn newが正常に初期化される() {
        assert!(TemplateRenderer::new(make_settings()).is_ok());
    }

    #[test]
    fn 作成通知のレンダリングが正しい() {
        let renderer = make_renderer();
        let notification = parse("Create Book,42,Go in Action,Doe Jane,jane@example.com");

        let email = renderer
            .render(&notification, "https://sns.example.com/unsubscribe?id=1")
            .unwrap();

        assert_eq!(email.to, "ops@example.com");
        assert_eq!(
            email.subject,
            "Your book 'Go in Action' on books.example.com has been created"
        );
        assert_eq!(
            email.text_body,
            "Hi Doe Jane,\n\
             The Book 42, Go in Action owned by jane@example.com on books.example.com has been created.\n\
             See more details:\n\
             http://prod.books.example.com/v1/books/42 This Book\n\
             http://prod.books.example.com/v1/mybooks Books under your name\n\
             This email was sent from books.example.com.\n\
             Unsubscribe: https://sns.example.com/unsubscribe?id=1\n"
        );
        assert!(email.html_body.contains("<p>Hi Doe Jane,</p>"));
        assert!(
            email
                .html_body
                .contains(r#"href="http://prod.books.example.com/v1/books/42""#)
        );
        assert!(
            email
                .html_body
                .contains(r#"href="http://prod.books.example.com/v1/mybooks""#)
        );
        assert!(email.html_body.contains("Unsubscribe</a>"));
    }

    #[test]
    fn 削除通知には詳細リンクと一覧リンクが含まれない() {
        let renderer = make_renderer();
        let notification = parse("Delete Book,7,Rust,Doe John,john@example.com");

        let email = renderer
            .render(&notification, "https://sns.example.com/unsubscribe?id=2")
            .unwrap();

        assert_eq!(
            email.subject,
            "The Book '7' of 'Rust' on books.example.com has been deleted"
        );
        assert_eq!(
            email.text_body,
            "Hi Doe John,\n\
             The Book 7, Rust owned by john@example.com on books.example.com has been deleted.\n\
             This email was sent from books.example.com.\n\
             Unsubscribe: https://sns.example.com/unsubscribe?id=2\n"
        );
        assert!(!email.html_body.contains("/v1/books/"));
        assert!(!email.html_body.contains("/v1/mybooks"));
        assert!(email.html_body.contains("Unsubscribe</a>"));
    }

    #[test]
    fn 未知の操作は汎用テンプレートでレンダリングされる() {
        let renderer = make_renderer();
        let notification = parse("Update Book,42,Go in Action,Doe Jane,jane@example.com");

        let email = renderer.render(&notification, "").unwrap();

        assert_eq!(email.subject, "Notification from books.example.com");
        assert!(email.text_body.contains(r#"An update "Update Book" was received"#));
        assert!(email.text_body.contains("The Book 42, Go in Action"));
    }

    #[test]
    fn 購読解除リンクが空の場合はリンクを出力しない() {
        let renderer = make_renderer();
        let notification = parse("Delete Book,7,Rust,Doe John,john@example.com");

        let email = renderer.render(&notification, "").unwrap();

        assert!(!email.text_body.contains("Unsubscribe"));
        assert!(!email.html_body.contains("Unsubscribe"));
        assert!(email.text_body.ends_with("This email was sent from books.example.com.\n"));
    }

    #[test]
    fn htmlではフィールド値がエスケープされる() {
        let renderer = make_renderer();
        let notification = parse("Create Book,42,<b>Go</b> & Rust,Doe Jane,jane@example.com");

        let email = renderer.render(&notification, "").unwrap();

        assert!(email.html_body.contains("&lt;b&gt;Go&lt;&#x2F;b&gt; &amp; Rust"));
        assert!(!email.html_body.contains("<b>Go</b>"));
        assert!(email.text_body.contains("<b>Go</b> & Rust"));
    }

    #[test]
    fn 同じ入力からは同一の出力が得られる() {
        let notification = parse("Create Book,42,Go in Action,Doe Jane,jane@example.com");

        let first = make_renderer().render(&notification, "u").unwrap();
        let second = make_renderer().render(&notification, "u").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn 登録されていないテンプレートはテンプレート名付きのエラーになる() {
        let renderer = make_renderer();

        let err = renderer
            .render_one("book_updated.txt", &Context::new())
            .unwrap_err();

        assert!(matches!(&err, RenderError::Render { template, .. } if template == "book_updated.txt"));
        assert!(err.to_string().starts_with("テンプレート book_updated.txt のレンダリングに失敗しました"));
    }

    #[test]
    fn 空のフィールドでもレンダリングできる() {
        let renderer = make_renderer();
        let notification = parse("Create Book,,,,");

        let email = renderer.render(&notification, "").unwrap();

        assert_eq!(email.subject, "Your book '' on books.example.com has been created");
        assert!(email.text_body.starts_with("Hi ,\nThe Book ,  owned by  on"));
    }
}
