//! # インフラ層エラー定義
//!
//! 重複排除台帳（DynamoDB）の操作で発生するエラーを表現する。
//!
//! 種別（[`InfraErrorKind`]）はどの台帳操作で失敗したかを表し、ログの
//! `error` フィールドにそのまま出る。生成時には [`SpanTrace`] を捕捉するため、
//! どのバッチのどのレコードを処理中だったかをエラーから辿れる。
//!
//! AWS SDK のエラー型は操作ごとに異なるジェネリクスを持つので、詳細は
//! `DisplayErrorContext` で文字列化して保持する。

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
#[derive(Debug, Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// 失敗した台帳操作
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfraErrorKind {
    /// 冪等キーの参照（`exists`）
    #[error("重複排除台帳の参照に失敗: {0}")]
    Lookup(String),

    /// 冪等キーの記録（`record`）
    #[error("重複排除台帳への記録に失敗: {0}")]
    Record(String),

    /// 起動時のテーブル確認・作成
    #[error("重複排除テーブル '{table}' の準備に失敗: {detail}")]
    TableSetup { table: String, detail: String },
}

impl InfraError {
    fn new(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    pub fn lookup(detail: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::Lookup(detail.into()))
    }

    pub fn record(detail: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::Record(detail.into()))
    }

    pub fn table_setup(table: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::TableSetup {
            table:  table.into(),
            detail: detail.into(),
        })
    }

    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// 生成時点のスパン（バッチ ID・通知の書籍 ID など）
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }
}

impl std::error::Error for InfraError {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    #[test]
    fn 生成時の処理中スパンがspan_traceに残る() {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);

        let span = tracing::info_span!("dispatch", notification.book_id = "42");
        let _enter = span.enter();
        let err = InfraError::record("ProvisionedThroughputExceededException");

        let trace = err.span_trace().to_string();
        assert!(trace.contains("dispatch"), "スパン名が含まれること: {trace}");
    }

    #[rstest]
    #[case(
        InfraError::lookup("GetItem がタイムアウトしました"),
        "重複排除台帳の参照に失敗: GetItem がタイムアウトしました"
    )]
    #[case(
        InfraError::record("PutItem がタイムアウトしました"),
        "重複排除台帳への記録に失敗: PutItem がタイムアウトしました"
    )]
    #[case(
        InfraError::table_setup("booknotify-dedup", "AccessDeniedException"),
        "重複排除テーブル 'booknotify-dedup' の準備に失敗: AccessDeniedException"
    )]
    fn 表示文字列に失敗した操作が含まれる(#[case] err: InfraError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn 種別で失敗した操作を判別できる() {
        let err = InfraError::table_setup("booknotify-dedup", "ResourceNotFoundException");

        assert_eq!(
            err.kind(),
            &InfraErrorKind::TableSetup {
                table:  "booknotify-dedup".to_string(),
                detail: "ResourceNotFoundException".to_string(),
            }
        );
    }
}
