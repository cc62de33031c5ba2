//! # 通知ディスパッチャ設定
//!
//! 環境変数から設定を読み込む。`.env` ファイルがあれば `main` で先に読み込まれる。
//!
//! 読み込みは [`NotifierConfig::from_lookup`] に集約しており、テストでは
//! プロセス環境を書き換えずに任意の値を与えられる。

use std::{env, str::FromStr};

use booknotify_domain::KeyStrategy;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::usecase::MessageSettings;

/// 重複排除テーブル名のデフォルト値
pub const DEFAULT_DEDUP_TABLE: &str = "booknotify-dedup";

/// 設定読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値が不正
    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MailBackend {
    /// Amazon SES v2（本番）
    Ses,
    /// SMTP（Mailpit 等）
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// 重複排除台帳バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum DedupBackend {
    #[strum(serialize = "dynamodb")]
    DynamoDb,
    #[strum(serialize = "memory")]
    Memory,
}

/// 通知ディスパッチャの設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// SES / DynamoDB のリージョン
    pub aws_region: String,
    /// メール送信設定
    pub mail:       MailConfig,
    /// 重複排除設定
    pub dedup:      DedupConfig,
    /// メール本文に埋め込むサイト情報
    pub site:       SiteConfig,
}

/// メール送信の設定
///
/// `MAIL_BACKEND` 環境変数で送信バックエンドを切り替える。
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub backend:      MailBackend,
    /// 送信元メールアドレス（SES で検証済みであること）
    pub from_address: String,
    /// 送信先メールアドレス（固定）
    pub recipient:    String,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:    String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:    u16,
}

/// 重複排除の設定
#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub backend:      DedupBackend,
    /// 重複排除テーブル名
    ///
    /// 本文テンプレートが旧システムと異なるため、旧システムの台帳（`csye6225`）とはキーが一致しない。
    /// デフォルトは専用テーブル。
    pub table_name:   String,
    /// DynamoDB Local のエンドポイント。設定時はテーブルを自動作成する
    pub endpoint:     Option<String>,
    pub key_strategy: KeyStrategy,
}

/// サイト情報
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// 件名・本文に表示するサイト名
    pub name:     String,
    /// 書籍詳細・一覧リンクのベース URL
    pub base_url: String,
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str, default: &str| -> String {
            lookup(name).unwrap_or_else(|| default.to_string())
        };

        let mail = MailConfig {
            backend:      parse_var("MAIL_BACKEND", var("MAIL_BACKEND", "ses"))?,
            from_address: var("MAIL_FROM_ADDRESS", "update@prod.6225csyekeyuliu.me"),
            recipient:    lookup("MAIL_RECIPIENT")
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("MAIL_RECIPIENT"))?,
            smtp_host:    var("SMTP_HOST", "localhost"),
            smtp_port:    parse_var("SMTP_PORT", var("SMTP_PORT", "1025"))?,
        };

        let dedup = DedupConfig {
            backend:      parse_var("DEDUP_BACKEND", var("DEDUP_BACKEND", "dynamodb"))?,
            table_name:   var("DEDUP_TABLE_NAME", DEFAULT_DEDUP_TABLE),
            endpoint:     lookup("DYNAMODB_ENDPOINT").filter(|v| !v.is_empty()),
            key_strategy: parse_var(
                "DEDUP_KEY_STRATEGY",
                var("DEDUP_KEY_STRATEGY", "plain_body"),
            )?,
        };

        let site = SiteConfig {
            name:     var("SITE_NAME", "6225csyekeyuliu.me"),
            base_url: var("SITE_BASE_URL", "http://prod.6225csyekeyuliu.me")
                .trim_end_matches('/')
                .to_string(),
        };

        Ok(Self {
            aws_region: var("AWS_REGION", "us-east-1"),
            mail,
            dedup,
            site,
        })
    }

    /// テンプレートレンダラーに渡す設定
    pub fn message_settings(&self) -> MessageSettings {
        MessageSettings {
            site_name: self.site.name.clone(),
            base_url:  self.site.base_url.clone(),
            recipient: self.mail.recipient.clone(),
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
