//! # アプリケーション層のエラー
//!
//! バッチ全体を失敗させるエラー（設定不備、イベントのデコード失敗、起動時の初期化失敗）を表す。
//! レコード単位の失敗は [`DispatchOutcome`](booknotify_domain::DispatchOutcome) で表現し、
//! ここには含めない。

use booknotify_infra::InfraError;
use thiserror::Error;

use crate::{config::ConfigError, usecase::RenderError};

/// 通知ディスパッチャのエラー
#[derive(Debug, Error)]
pub enum NotifierError {
    /// 設定の読み込みに失敗
    #[error("設定エラー: {0}")]
    Config(#[from] ConfigError),

    /// イベントエンベロープのデコードに失敗
    #[error("イベントのデコードに失敗しました: {0}")]
    EventDecode(#[from] serde_json::Error),

    /// テンプレートの登録に失敗
    #[error("テンプレートの初期化に失敗しました: {0}")]
    Template(#[from] RenderError),

    /// 重複排除台帳の準備に失敗
    #[error("重複排除台帳の準備に失敗しました: {0}")]
    DedupSetup(#[from] InfraError),
}
