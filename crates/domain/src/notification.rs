//! # 通知
//!
//! 書籍イベント通知に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`RawNotification`] | 生通知 | イベントソースから届いた未検証のメッセージ文字列 |
//! | [`BookNotification`] | 通知レコード | 5 フィールドに分解・検証済みの通知 |
//! | [`BookAction`] | 操作種別 | 作成 / 削除 / 未知 |
//! | [`EmailMessage`] | 送信メール | レンダリング済みの件名・本文・宛先 |
//!
//! ## メッセージ形式
//!
//! 上流サービスは次の形式でメッセージを発行する:
//!
//! ```text
//! {操作},{書籍 ID},{書籍タイトル},{所有者の姓 名},{所有者メールアドレス}
//! ```
//!
//! 区切り文字 `,` のエスケープは存在しない。フィールド値に `,` を含めないことは
//! 上流との契約であり、含まれた場合はフィールド数不一致として破棄される。
//! 前後の空白は上流データのまま保持する（トリムしない）。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

/// メッセージのパースエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `,` で分割したフィールド数が 5 でない
    #[error("メッセージのフィールド数が不正です: 期待値={expected}, 実際={actual}")]
    WrongFieldCount { expected: usize, actual: usize },
}

/// 書籍に対する操作種別
///
/// メッセージ先頭フィールドの完全一致で判定する。
/// どちらにも一致しない場合は [`Unrecognized`](BookAction::Unrecognized) となり、
/// エラーにはせず汎用テンプレートで送信される。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookAction {
    /// 書籍の作成
    Create,
    /// 書籍の削除
    Delete,
    /// 未知の操作
    Unrecognized,
}

impl BookAction {
    /// 作成イベントのラベル
    pub const CREATE_LABEL: &'static str = "Create Book";
    /// 削除イベントのラベル
    pub const DELETE_LABEL: &'static str = "Delete Book";

    /// メッセージ先頭フィールドから操作種別を判定する
    pub fn from_label(label: &str) -> Self {
        match label {
            Self::CREATE_LABEL => Self::Create,
            Self::DELETE_LABEL => Self::Delete,
            _ => Self::Unrecognized,
        }
    }
}

/// 生通知
///
/// イベントソース（SNS）から届いたレコード 1 件分。
/// `unsubscribe_url` は空文字の場合がある。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNotification {
    /// カンマ区切りのメッセージ本体
    pub message:         String,
    /// 購読解除リンク
    pub unsubscribe_url: String,
}

impl RawNotification {
    pub fn new(message: impl Into<String>, unsubscribe_url: impl Into<String>) -> Self {
        Self {
            message:         message.into(),
            unsubscribe_url: unsubscribe_url.into(),
        }
    }
}

/// 通知レコード
///
/// [`RawNotification::message`] を 5 フィールドに分解したもの。
/// フィールド数が 5 の場合にのみ生成される。値が空文字であっても受け入れる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookNotification {
    /// 操作種別
    pub action:       BookAction,
    /// 先頭フィールドの原文（未知の操作をログに残すために保持する）
    pub action_label: String,
    /// 書籍 ID
    pub book_id:      String,
    /// 書籍タイトル
    pub book_title:   String,
    /// 所有者名（`{姓} {名}`）
    pub owner_name:   String,
    /// 所有者メールアドレス（相関用。送信先には使わない）
    pub owner_email:  String,
}

impl BookNotification {
    /// メッセージのフィールド数
    pub const FIELD_COUNT: usize = 5;
    /// フィールド区切り文字
    pub const DELIMITER: char = ',';

    /// メッセージ文字列を通知レコードにパースする
    ///
    /// # エラー
    ///
    /// `,` で分割した結果が 5 フィールドでない場合は
    /// [`ParseError::WrongFieldCount`] を返す。
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = raw.split(Self::DELIMITER).collect();

        let [action_label, book_id, book_title, owner_name, owner_email] = fields.as_slice()
        else {
            return Err(ParseError::WrongFieldCount {
                expected: Self::FIELD_COUNT,
                actual:   fields.len(),
            });
        };

        Ok(Self {
            action:       BookAction::from_label(action_label),
            action_label: (*action_label).to_string(),
            book_id:      (*book_id).to_string(),
            book_title:   (*book_title).to_string(),
            owner_name:   (*owner_name).to_string(),
            owner_email:  (*owner_email).to_string(),
        })
    }
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。`MailSender` に渡される。
/// 送信元アドレスは送信器側の設定で決まるため、ここには含めない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}
