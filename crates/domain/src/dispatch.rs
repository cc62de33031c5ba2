//! # 配信結果
//!
//! 通知レコード 1 件ごとの処理結果と、メール送信が拒否された理由の分類を定義する。
//! いずれも永続化はせず、ログ出力とバッチ集計にのみ使う。

use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;

/// メール送信の拒否理由
///
/// 送信バックエンドが返したエラーを分類したもの。
/// どの分類でもコンポーネント内での再試行は行わない。
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, IntoStaticStr)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MailRejection {
    /// メッセージ内容が拒否された
    #[error("メッセージが拒否されました: {0}")]
    ContentRejected(String),

    /// 送信元ドメインが検証されていない
    #[error("送信元ドメインが未検証です: {0}")]
    SenderDomainNotVerified(String),

    /// 設定セットが存在しない
    #[error("設定セットが存在しません: {0}")]
    ConfigurationSetMissing(String),

    /// 分類できないエラー
    #[error("分類できない送信エラー: {0}")]
    Unclassified(String),
}

impl MailRejection {
    /// ログ用の分類コード
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

/// 破棄理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// メッセージの形式が不正
    Malformed { field_count: usize },
}

/// 失敗理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize, IntoStaticStr)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureReason {
    /// 重複排除台帳の参照・記録に失敗
    Store(String),
    /// テンプレートレンダリングに失敗
    Render(String),
    /// メール送信が拒否された
    Mail(MailRejection),
    /// 呼び出しがキャンセルされた
    Cancelled,
}

/// 通知レコード 1 件の処理結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, IntoStaticStr)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatchOutcome {
    /// 送信した
    Sent,
    /// 送信済みのためスキップした
    SkippedDuplicate,
    /// 処理せずに破棄した
    Dropped(DropReason),
    /// 処理に失敗した
    Failed(FailureReason),
}

impl DispatchOutcome {
    /// ログ用のラベル
    pub fn label(&self) -> &'static str {
        self.into()
    }
}
