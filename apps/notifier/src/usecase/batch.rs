//! # バッチハンドラ
//!
//! 1 回の呼び出しで届いたレコード群を先頭から順に 1 件ずつディスパッチし、結果を集計する。
//!
//! ## 失敗の扱い
//!
//! - レコード単位の失敗（破棄・台帳エラー・送信拒否）は他のレコードに影響しない
//! - バッチ全体が失敗するのは、イベントのデコード失敗とキャンセルのみ
//!
//! バッチ完了時には件数の内訳を 1 行にまとめたサマリログ（`log.type = "canonical"`）を出力する。

use std::time::Instant;

use booknotify_domain::{DispatchOutcome, FailureReason, RawNotification};
use booknotify_shared::{
    event_log::{
        error::{category, kind},
        event,
    },
    log_business_event,
};
use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::Dispatcher;
use crate::{error::NotifierError, event::decode_event};

/// バッチの処理結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// バッチに含まれていたレコード数
    pub total:             usize,
    pub sent:              usize,
    pub skipped_duplicate: usize,
    pub dropped:           usize,
    pub failed:            usize,
    /// 途中でキャンセルされたか
    pub cancelled:         bool,
    /// 処理したレコードの結果（入力順）。キャンセル後のレコードは含まない
    pub outcomes:          Vec<DispatchOutcome>,
}

impl BatchResult {
    fn new(total: usize) -> Self {
        Self {
            total,
            outcomes: Vec::with_capacity(total),
            ..Self::default()
        }
    }

    fn push(&mut self, outcome: DispatchOutcome) {
        match &outcome {
            DispatchOutcome::Sent => self.sent += 1,
            DispatchOutcome::SkippedDuplicate => self.skipped_duplicate += 1,
            DispatchOutcome::Dropped(_) => self.dropped += 1,
            DispatchOutcome::Failed(_) => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// 処理したレコード数
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// バッチとして成功したか
    ///
    /// レコード単位の失敗があっても成功とみなす。キャンセルされた場合のみ失敗。
    pub fn is_success(&self) -> bool {
        !self.cancelled
    }
}

/// バッチハンドラ
pub struct BatchHandler {
    dispatcher: Dispatcher,
}

impl BatchHandler {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// SNS イベント JSON をデコードしてバッチを処理する
    ///
    /// # エラー
    ///
    /// デコードに失敗した場合は、どのレコードも処理せずに
    /// [`NotifierError::EventDecode`] を返す。
    pub async fn handle_event(
        &self,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Result<BatchResult, NotifierError> {
        let records = decode_event(payload).inspect_err(|e| {
            tracing::error!(
                error.category = category::INPUT,
                error.kind = kind::EVENT_DECODE,
                error = %e,
                "イベントのデコードに失敗しました"
            );
        })?;

        Ok(self.handle_batch(&records, cancel).await)
    }

    /// レコード群を順に処理する
    #[tracing::instrument(skip_all, fields(batch.id = %Uuid::now_v7(), batch.size = records.len()))]
    pub async fn handle_batch(
        &self,
        records: &[RawNotification],
        cancel: &CancellationToken,
    ) -> BatchResult {
        let started = Instant::now();
        let mut result = BatchResult::new(records.len());

        log_business_event!(
            event.category = event::category::BATCH,
            event.action = event::action::BATCH_STARTED,
            event.result = event::result::SUCCESS,
            batch.started_at = %Utc::now().to_rfc3339(),
            batch.record_count = records.len(),
            "バッチ処理を開始します"
        );

        for (index, raw) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                result.cancelled = true;
                log_business_event!(
                    event.category = event::category::BATCH,
                    event.action = event::action::BATCH_CANCELLED,
                    event.result = event::result::FAILURE,
                    batch.processed = index,
                    batch.remaining = records.len() - index,
                    "キャンセルされたため残りのレコードを処理しません"
                );
                break;
            }

            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_RECEIVED,
                event.result = event::result::SUCCESS,
                record.index = index,
                record.message = %raw.message,
                "レコードを受信しました"
            );

            let outcome = self.dispatcher.dispatch(raw, cancel).await;
            tracing::debug!(
                record.index = index,
                record.outcome = outcome.label(),
                "レコードの処理が完了しました"
            );
            log_outcome(index, &outcome);

            if outcome == DispatchOutcome::Failed(FailureReason::Cancelled) {
                result.cancelled = true;
            }
            result.push(outcome);
        }

        tracing::info!(
            log.r#type = "canonical",
            batch.total = result.total,
            batch.processed = result.processed(),
            batch.sent = result.sent,
            batch.skipped_duplicate = result.skipped_duplicate,
            batch.dropped = result.dropped,
            batch.failed = result.failed,
            batch.cancelled = result.cancelled,
            batch.latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            batch.completed_at = %Utc::now().to_rfc3339(),
            "バッチ処理が完了しました"
        );

        log_business_event!(
            event.category = event::category::BATCH,
            event.action = event::action::BATCH_COMPLETED,
            event.result = if result.is_success() {
                event::result::SUCCESS
            } else {
                event::result::FAILURE
            },
            "バッチ処理を終了します"
        );

        result
    }
}

/// レコード 1 件の処理結果をビジネスイベントとして出力する
fn log_outcome(index: usize, outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Sent => log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_SENT,
            event.result = event::result::SUCCESS,
            record.index = index,
            "通知メール送信成功"
        ),
        DispatchOutcome::SkippedDuplicate => log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_SKIPPED_DUPLICATE,
            event.result = event::result::SKIPPED,
            record.index = index,
            "送信済みの通知のためスキップしました"
        ),
        DispatchOutcome::Dropped(reason) => log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_DROPPED,
            event.result = event::result::SKIPPED,
            record.index = index,
            record.drop_reason = ?reason,
            "通知を破棄しました"
        ),
        DispatchOutcome::Failed(reason) => {
            let failure_kind: &'static str = reason.into();
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_FAILED,
                event.result = event::result::FAILURE,
                record.index = index,
                record.failure_kind = failure_kind,
                record.failure = ?reason,
                "通知の処理に失敗しました"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use booknotify_domain::{DropReason, KeyStrategy, MailRejection};
    use booknotify_infra::mock::{MockDedupStore, MockMailSender};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::usecase::{MessageSettings, TemplateRenderer};

    fn make_handler(store: &MockDedupStore, sender: &MockMailSender) -> BatchHandler {
        let renderer = TemplateRenderer::new(MessageSettings {
            site_name: "books.example.com".to_string(),
            base_url:  "http://prod.books.example.com".to_string(),
            recipient: "ops@example.com".to_string(),
        })
        .unwrap();
        BatchHandler::new(Dispatcher::new(
            renderer,
            Arc::new(store.clone()),
            Arc::new(sender.clone()),
            KeyStrategy::PlainBody,
        ))
    }

    #[tokio::test]
    async fn 空のバッチは成功し何も送信しない() {
        let store = MockDedupStore::new();
        let sender = MockMailSender::new();
        let handler = make_handler(&store, &sender);

        let result = handler.handle_batch(&[], &CancellationToken::new()).await;

        assert!(result.is_success());
        assert_eq!(result, BatchResult::default());
        assert_eq!(sender.sent_count(), 0);
    }

    #[tokio::test]
    async fn 不正なレコードがあっても後続のレコードは処理される() {
        let store = MockDedupStore::new();
        let sender = MockMailSender::new();
        let handler = make_handler(&store, &sender);
        let records = vec![
            RawNotification::new("Create Book,1,A,Doe Jane,jane@example.com", ""),
            RawNotification::new("garbage", ""),
            RawNotification::new("Delete Book,2,B,Doe John,john@example.com", ""),
        ];

        let result = handler.handle_batch(&records, &CancellationToken::new()).await;

        assert!(result.is_success());
        assert_eq!(result.total, 3);
        assert_eq!(result.sent, 2);
        assert_eq!(result.dropped, 1);
        assert_eq!(
            result.outcomes,
            vec![
                DispatchOutcome::Sent,
                DispatchOutcome::Dropped(DropReason::Malformed { field_count: 1 }),
                DispatchOutcome::Sent,
            ]
        );
        assert_eq!(sender.sent_count(), 2);
    }

    #[tokio::test]
    async fn 送信拒否はバッチを失敗させない() {
        let store = MockDedupStore::new();
        let sender = MockMailSender::new();
        sender.reject_with(MailRejection::ContentRejected("rejected".to_string()));
        let handler = make_handler(&store, &sender);
        let records = vec![
            RawNotification::new("Create Book,1,A,Doe Jane,jane@example.com", ""),
            RawNotification::new("Create Book,2,B,Doe Jane,jane@example.com", ""),
        ];

        let result = handler.handle_batch(&records, &CancellationToken::new()).await;

        assert!(result.is_success());
        assert_eq!(result.failed, 2);
        assert_eq!(store.recorded_keys().len(), 2);
    }

    #[tokio::test]
    async fn キャンセル済みの場合はどのレコードも処理しない() {
        let store = MockDedupStore::new();
        let sender = MockMailSender::new();
        let handler = make_handler(&store, &sender);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let records = vec![RawNotification::new(
            "Create Book,1,A,Doe Jane,jane@example.com",
            "",
        )];

        let result = handler.handle_batch(&records, &cancel).await;

        assert!(!result.is_success());
        assert!(result.cancelled);
        assert_eq!(result.total, 1);
        assert_eq!(result.processed(), 0);
        assert_eq!(sender.sent_count(), 0);
        assert_eq!(store.exists_calls(), 0);
    }

    #[tokio::test]
    async fn デコードに失敗したイベントはエラーになる() {
        let store = MockDedupStore::new();
        let sender = MockMailSender::new();
        let handler = make_handler(&store, &sender);

        let result = handler
            .handle_event(b"{\"Records\": 42}", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(NotifierError::EventDecode(_))));
        assert_eq!(store.exists_calls(), 0);
    }

    #[tokio::test]
    async fn イベントjsonからバッチを処理できる() {
        let store = MockDedupStore::new();
        let sender = MockMailSender::new();
        let handler = make_handler(&store, &sender);
        let payload = br#"{"Records":[{"Sns":{"Message":"Create Book,1,A,Doe Jane,jane@example.com","UnsubscribeUrl":"https://sns.example.com/u"}}]}"#;

        let result = handler
            .handle_event(payload, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.sent, 1);
        assert!(sender.sent_emails()[0].text_body.contains("Unsubscribe: https://sns.example.com/u"));
    }
}
