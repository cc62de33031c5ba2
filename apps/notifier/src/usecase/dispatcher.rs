//! # ディスパッチャ
//!
//! 生通知 1 件を処理し、結果を [`DispatchOutcome`] で返す。
//!
//! ## 処理順序
//!
//! 1. パース: フィールド数不正なら `Dropped`
//! 2. レンダリング
//! 3. 冪等キーの導出
//! 4. 台帳の参照: 記録済みなら `SkippedDuplicate`
//! 5. 台帳への記録: 失敗したら送信せず `Failed(Store)`
//! 6. メール送信: 拒否されたら `Failed(Mail)`。再試行しない
//!
//! 記録を送信より先に行うため、記録後に送信が失敗した通知は再配信されても送られない。
//! 二重送信よりも送信漏れを選ぶ順序である。
//!
//! キャンセルは台帳の参照前と記録前にのみ確認する。記録が済んだ通知は必ず送信まで進む。

use std::sync::Arc;

use booknotify_domain::{
    BookAction,
    BookNotification,
    DispatchOutcome,
    DropReason,
    FailureReason,
    IdempotencyKey,
    KeyStrategy,
    ParseError,
    RawNotification,
};
use booknotify_infra::{DedupStore, MailSender};
use booknotify_shared::event_log::error::{category, kind};
use tokio_util::sync::CancellationToken;

use super::TemplateRenderer;

/// 通知 1 件分の配信を行うディスパッチャ
///
/// 台帳とメール送信器はプロセス起動時に構築したものを受け取る。
pub struct Dispatcher {
    renderer:     TemplateRenderer,
    dedup_store:  Arc<dyn DedupStore>,
    mail_sender:  Arc<dyn MailSender>,
    key_strategy: KeyStrategy,
}

impl Dispatcher {
    pub fn new(
        renderer: TemplateRenderer,
        dedup_store: Arc<dyn DedupStore>,
        mail_sender: Arc<dyn MailSender>,
        key_strategy: KeyStrategy,
    ) -> Self {
        Self {
            renderer,
            dedup_store,
            mail_sender,
            key_strategy,
        }
    }

    /// 生通知 1 件を配信する
    ///
    /// エラーは返さず、すべて [`DispatchOutcome`] に畳み込む。
    /// `cancel` がキャンセル済みの場合、台帳に記録する前に `Failed(Cancelled)` で打ち切る。
    #[tracing::instrument(
        skip_all,
        fields(notification.action = tracing::field::Empty, notification.book_id = tracing::field::Empty)
    )]
    pub async fn dispatch(
        &self,
        raw: &RawNotification,
        cancel: &CancellationToken,
    ) -> DispatchOutcome {
        let notification = match BookNotification::parse(&raw.message) {
            Ok(notification) => notification,
            Err(ParseError::WrongFieldCount { expected, actual }) => {
                tracing::warn!(
                    error.category = category::INPUT,
                    error.kind = kind::MALFORMED_MESSAGE,
                    expected,
                    actual,
                    "メッセージのフィールド数が不正なため破棄します"
                );
                return DispatchOutcome::Dropped(DropReason::Malformed {
                    field_count: actual,
                });
            }
        };

        let span = tracing::Span::current();
        span.record(
            "notification.action",
            tracing::field::display(notification.action),
        );
        span.record("notification.book_id", notification.book_id.as_str());

        if notification.action == BookAction::Unrecognized {
            tracing::warn!(
                error.category = category::INPUT,
                error.kind = kind::UNRECOGNIZED_ACTION,
                notification.action_label = %notification.action_label,
                "未知の操作種別です。汎用テンプレートで送信します"
            );
        }

        let email = match self.renderer.render(&notification, &raw.unsubscribe_url) {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::TEMPLATE,
                    error = %e,
                    "通知テンプレートのレンダリングに失敗"
                );
                return DispatchOutcome::Failed(FailureReason::Render(e.to_string()));
            }
        };

        let key = IdempotencyKey::derive(&email, self.key_strategy);
        tracing::debug!(
            notification.key_strategy = %self.key_strategy,
            notification.key_len = key.as_str().len(),
            "冪等キーを導出しました"
        );

        if cancel.is_cancelled() {
            return DispatchOutcome::Failed(FailureReason::Cancelled);
        }

        match self.dedup_store.exists(&key).await {
            Ok(true) => return DispatchOutcome::SkippedDuplicate,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::DEDUP_STORE,
                    error = %e,
                    span_trace = %e.span_trace(),
                    "重複排除台帳の参照に失敗"
                );
                return DispatchOutcome::Failed(FailureReason::Store(e.to_string()));
            }
        }

        if cancel.is_cancelled() {
            tracing::warn!("キャンセルされたため台帳に記録せず打ち切ります");
            return DispatchOutcome::Failed(FailureReason::Cancelled);
        }

        if let Err(e) = self.dedup_store.record(&key).await {
            tracing::error!(
                error.category = category::INFRASTRUCTURE,
                error.kind = kind::DEDUP_STORE,
                error = %e,
                span_trace = %e.span_trace(),
                "重複排除台帳への記録に失敗。送信を中止します"
            );
            return DispatchOutcome::Failed(FailureReason::Store(e.to_string()));
        }

        match self.mail_sender.send_email(&email).await {
            Ok(()) => DispatchOutcome::Sent,
            Err(rejection) => {
                tracing::error!(
                    error.category = category::EXTERNAL_SERVICE,
                    error.kind = kind::MAIL_SEND,
                    mail.rejection = rejection.code(),
                    error = %rejection,
                    "メール送信が拒否されました"
                );
                DispatchOutcome::Failed(FailureReason::Mail(rejection))
            }
        }
    }
}
