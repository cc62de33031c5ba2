//! # トレーシング初期化
//!
//! 通知ディスパッチャは標準出力をバッチ結果の JSON に使うため、ログはすべて
//! 標準エラー出力に書き出す。
//!
//! 出力形式は環境変数 `LOG_FORMAT` で選ぶ。ログ収集基盤に流す場合は `json`、
//! 手元で実行する場合は未設定（`pretty`）のままでよい。

use strum::{Display, EnumString};

/// `LOG_FORMAT` の環境変数名
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum LogFormat {
    /// 1 イベント 1 行の JSON
    Json,
    /// 人間向けのテキスト
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する
    ///
    /// 未設定・空文字はデフォルト形式。解釈できない値は元の文字列を `Err` で返す。
    /// subscriber の初期化前に呼ぶため、警告の出力は呼び出し側が初期化後に行う。
    pub fn resolve(value: Option<&str>) -> Result<Self, String> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(v) => v.parse().map_err(|_| v.to_string()),
        }
    }
}

/// トレーシングを初期化する
///
/// - フィルタ: `RUST_LOG`。未設定なら `info,booknotify=debug`
/// - 形式: `LOG_FORMAT`（[`LogFormat::resolve`]）
/// - `ErrorLayer` を登録し、インフラ層のエラーが `SpanTrace` を捕捉できるようにする
#[cfg(feature = "observability")]
pub fn init_tracing(service: &'static str) {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let requested = std::env::var(LOG_FORMAT_VAR).ok();
    let (format, rejected) = match LogFormat::resolve(requested.as_deref()) {
        Ok(format) => (format, None),
        Err(value) => (LogFormat::default(), Some(value)),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,booknotify=debug".into());

    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    if let Some(value) = rejected {
        tracing::warn!(
            log_format = %value,
            "{LOG_FORMAT_VAR} の値を解釈できません。{format} で出力します"
        );
    }
    tracing::debug!(service, log_format = %format, "トレーシングを初期化しました");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, LogFormat::Pretty)]
    #[case(Some(""), LogFormat::Pretty)]
    #[case(Some("pretty"), LogFormat::Pretty)]
    #[case(Some("json"), LogFormat::Json)]
    #[case(Some(" json "), LogFormat::Json)]
    fn log_formatを解釈できる(#[case] value: Option<&str>, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::resolve(value), Ok(expected));
    }

    #[rstest]
    #[case("JSON")]
    #[case("text")]
    fn 解釈できない値は元の文字列をエラーで返す(#[case] value: &str) {
        assert_eq!(LogFormat::resolve(Some(value)), Err(value.to_string()));
    }

    #[test]
    fn 警告文に出す形式名はsnake_case() {
        assert_eq!(LogFormat::Json.to_string(), "json");
        assert_eq!(LogFormat::default().to_string(), "pretty");
    }
}
