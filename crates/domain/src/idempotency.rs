//! # 冪等キー
//!
//! 重複排除台帳に記録するキーを、レンダリング済みのプレーンテキスト本文から導出する。
//!
//! 本文そのものをキーにするため、テンプレートを変更すると過去の配信記録とは
//! 一致しなくなる。内容が変わった通知は再送されるべきなので、これは意図した挙動である。

use derive_more::Display;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{EnumString, IntoStaticStr};

use crate::notification::EmailMessage;

/// 冪等キーの導出方式
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// プレーンテキスト本文をそのままキーにする（既存の台帳と互換）
    #[default]
    PlainBody,
    /// プレーンテキスト本文の SHA-256（小文字 16 進、64 文字）
    Sha256,
}

/// 冪等キー（値オブジェクト）
///
/// 意味的に同一の通知は同じキーになり、異なる通知は異なるキーになる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// メールメッセージから冪等キーを導出する
    pub fn derive(email: &EmailMessage, strategy: KeyStrategy) -> Self {
        match strategy {
            KeyStrategy::PlainBody => Self(email.text_body.clone()),
            KeyStrategy::Sha256 => Self(hex::encode(Sha256::digest(email.text_body.as_bytes()))),
        }
    }

    /// 台帳に保存済みの値から復元する
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::{assert_eq, assert_ne};

    use super::*;

    fn make_email(text_body: &str) -> EmailMessage {
        EmailMessage {
            to:        "ops@example.com".to_string(),
            subject:   "件名".to_string(),
            html_body: "<p>本文</p>".to_string(),
            text_body: text_body.to_string(),
        }
    }

    #[test]
    fn plain_bodyはテキスト本文をそのままキーにする() {
        let key = IdempotencyKey::derive(&make_email("Hi Doe Jane,\n"), KeyStrategy::PlainBody);
        assert_eq!(key.as_str(), "Hi Doe Jane,\n");
    }

    #[test]
    fn sha256は64文字の16進ダイジェストになる() {
        let key = IdempotencyKey::derive(&make_email("abc"), KeyStrategy::Sha256);
        assert_eq!(
            key.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(key.as_str().len(), 64);
    }

    #[test]
    fn 同じ本文は同じキーになり異なる本文は異なるキーになる() {
        for strategy in [KeyStrategy::PlainBody, KeyStrategy::Sha256] {
            let a = IdempotencyKey::derive(&make_email("same"), strategy);
            let b = IdempotencyKey::derive(&make_email("same"), strategy);
            let c = IdempotencyKey::derive(&make_email("other"), strategy);
            assert_eq!(a, b);
            assert_ne!(a, c);
        }
    }

    #[test]
    fn html本文や件名はキーに影響しない() {
        let mut email = make_email("body");
        let before = IdempotencyKey::derive(&email, KeyStrategy::PlainBody);
        email.subject = "別の件名".to_string();
        email.html_body = "<h1>別</h1>".to_string();
        let after = IdempotencyKey::derive(&email, KeyStrategy::PlainBody);
        assert_eq!(before, after);
    }

    #[test]
    fn 導出方式を文字列からパースできる() {
        assert_eq!(
            KeyStrategy::from_str("plain_body").unwrap(),
            KeyStrategy::PlainBody
        );
        assert_eq!(KeyStrategy::from_str("sha256").unwrap(), KeyStrategy::Sha256);
        assert!(KeyStrategy::from_str("md5").is_err());
        assert_eq!(KeyStrategy::default(), KeyStrategy::PlainBody);
    }
}
