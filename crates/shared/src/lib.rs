//! # BookNotify 共有ユーティリティ
//!
//! ドメイン層・インフラ層・通知アプリの全体で使う横断的なユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - トレーシング初期化は `observability` feature の背後に置き、ライブラリ利用側に
//!   subscriber 依存を強制しない

pub mod event_log;
pub mod observability;
