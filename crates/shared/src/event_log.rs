//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で通知の配信状況を追跡できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` / `tracing::warn!` に `error.category` + `error.kind` フィールドを
//! 直接追加する。定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const BATCH: &str = "batch";
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベントアクション
    pub mod action {
        // バッチ
        pub const BATCH_STARTED: &str = "batch.started";
        pub const BATCH_COMPLETED: &str = "batch.completed";
        pub const BATCH_CANCELLED: &str = "batch.cancelled";

        // 通知
        pub const NOTIFICATION_RECEIVED: &str = "notification.received";
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_SKIPPED_DUPLICATE: &str = "notification.skipped_duplicate";
        pub const NOTIFICATION_DROPPED: &str = "notification.dropped";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const SKIPPED: &str = "skipped";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（重複排除台帳）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（メール送信）
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// 上流から届いたデータの不備
        pub const INPUT: &str = "input";
    }

    /// エラー種別
    pub mod kind {
        pub const DEDUP_STORE: &str = "dedup_store";
        pub const MAIL_SEND: &str = "mail_send";
        pub const MALFORMED_MESSAGE: &str = "malformed_message";
        pub const UNRECOGNIZED_ACTION: &str = "unrecognized_action";
        pub const TEMPLATE: &str = "template";
        pub const EVENT_DECODE: &str = "event_decode";
    }
}
