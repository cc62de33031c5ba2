//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! booknotify-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use booknotify_domain::{EmailMessage, IdempotencyKey, MailRejection};

use crate::{dedup::DedupStore, error::InfraError, notification::MailSender};

// ===== MockMailSender =====

/// 送信したメールを記録するモック
///
/// `reject_with` で次回以降の送信をすべて拒否させられる。
#[derive(Clone, Default)]
pub struct MockMailSender {
    sent:      Arc<Mutex<Vec<EmailMessage>>>,
    rejection: Arc<Mutex<Option<MailRejection>>>,
}

impl MockMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降の送信を指定の理由で拒否する
    pub fn reject_with(&self, rejection: MailRejection) {
        *self.rejection.lock().unwrap() = Some(rejection);
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailSender for MockMailSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailRejection> {
        if let Some(rejection) = self.rejection.lock().unwrap().clone() {
            return Err(rejection);
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== MockDedupStore =====

/// 記録したキーを保持するモック
///
/// `fail_exists` / `fail_record` で台帳障害を再現できる。
/// `exists` の呼び出し回数も数える。
#[derive(Clone, Default)]
pub struct MockDedupStore {
    keys:         Arc<Mutex<Vec<String>>>,
    fail_exists:  Arc<Mutex<bool>>,
    fail_record:  Arc<Mutex<bool>>,
    exists_calls: Arc<Mutex<usize>>,
}

impl MockDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送信済みキーを事前登録する
    pub fn preload(&self, key: &IdempotencyKey) {
        self.keys.lock().unwrap().push(key.as_str().to_owned());
    }

    /// `exists` をエラーにする
    pub fn fail_exists(&self) {
        *self.fail_exists.lock().unwrap() = true;
    }

    /// `record` をエラーにする
    pub fn fail_record(&self) {
        *self.fail_record.lock().unwrap() = true;
    }

    /// 記録済みキー（登録順、重複を含む）
    pub fn recorded_keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn exists_calls(&self) -> usize {
        *self.exists_calls.lock().unwrap()
    }
}

#[async_trait]
impl DedupStore for MockDedupStore {
    async fn exists(&self, key: &IdempotencyKey) -> Result<bool, InfraError> {
        *self.exists_calls.lock().unwrap() += 1;
        if *self.fail_exists.lock().unwrap() {
            return Err(InfraError::lookup("GetItem がタイムアウトしました"));
        }
        Ok(self
            .keys
            .lock()
            .unwrap()
            .iter()
            .any(|k| k == key.as_str()))
    }

    async fn record(&self, key: &IdempotencyKey) -> Result<(), InfraError> {
        if *self.fail_record.lock().unwrap() {
            return Err(InfraError::record("PutItem がタイムアウトしました"));
        }
        self.keys.lock().unwrap().push(key.as_str().to_owned());
        Ok(())
    }
}
