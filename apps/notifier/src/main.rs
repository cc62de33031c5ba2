//! # BookNotify 通知ディスパッチャ
//!
//! 標準入力から SNS イベント JSON を 1 件読み込み、含まれる通知をすべて処理して終了する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `MAIL_RECIPIENT` | **Yes** | 通知メールの送信先 |
//! | `MAIL_BACKEND` | No | `ses` / `smtp` / `noop`（デフォルト: `ses`） |
//! | `MAIL_FROM_ADDRESS` | No | 送信元アドレス |
//! | `SMTP_HOST` / `SMTP_PORT` | No | SMTP 接続先（デフォルト: `localhost:1025`） |
//! | `AWS_REGION` | No | SES / DynamoDB のリージョン（デフォルト: `us-east-1`） |
//! | `DEDUP_BACKEND` | No | `dynamodb` / `memory`（デフォルト: `dynamodb`） |
//! | `DEDUP_TABLE_NAME` | No | 重複排除テーブル名（デフォルト: `booknotify-dedup`） |
//! | `DYNAMODB_ENDPOINT` | No | DynamoDB Local のエンドポイント |
//! | `DEDUP_KEY_STRATEGY` | No | `plain_body` / `sha256`（デフォルト: `plain_body`） |
//! | `SITE_NAME` / `SITE_BASE_URL` | No | メール本文に埋め込むサイト情報 |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`）。ログは標準エラー出力に書く |
//!
//! ## 起動方法
//!
//! ```bash
//! # ローカル（Mailpit + インメモリ台帳）
//! MAIL_RECIPIENT=ops@example.com MAIL_BACKEND=smtp DEDUP_BACKEND=memory \
//!   cargo run -p booknotify-notifier < event.json
//! ```
//!
//! 終了コードはバッチ全体の成否を表す。レコード単位の失敗では非 0 にならない。

use std::sync::Arc;

use anyhow::Context as _;
use booknotify_infra::{
    DedupStore,
    MailSender,
    dedup::{DynamoDbDedupStore, InMemoryDedupStore},
    dynamodb,
    notification::{NoopMailSender, SesMailSender, SmtpMailSender, create_ses_client},
};
use booknotify_notifier::{
    BatchHandler,
    Dispatcher,
    NotifierConfig,
    NotifierError,
    TemplateRenderer,
    config::{DedupBackend, MailBackend},
};
use booknotify_shared::observability::init_tracing;
use tokio::io::AsyncReadExt as _;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing("booknotify-notifier");

    let config = NotifierConfig::from_env().map_err(NotifierError::from)?;
    tracing::info!(
        mail.backend = %config.mail.backend,
        dedup.backend = %config.dedup.backend,
        dedup.key_strategy = %config.dedup.key_strategy,
        "通知ディスパッチャを起動します"
    );

    // クライアントは起動時に一度だけ構築して注入する
    let mail_sender = build_mail_sender(&config).await;
    let dedup_store = build_dedup_store(&config).await?;
    let renderer = TemplateRenderer::new(config.message_settings()).map_err(NotifierError::from)?;
    let handler = BatchHandler::new(Dispatcher::new(
        renderer,
        dedup_store,
        mail_sender,
        config.dedup.key_strategy,
    ));

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let mut payload = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut payload)
        .await
        .context("標準入力からイベントを読み込めませんでした")?;

    let result = handler.handle_event(&payload, &cancel).await?;
    println!("{}", serde_json::to_string(&result)?);

    if !result.is_success() {
        anyhow::bail!(
            "バッチ処理がキャンセルされました（{}/{} 件処理済み）",
            result.processed(),
            result.total
        );
    }

    Ok(())
}

async fn build_mail_sender(config: &NotifierConfig) -> Arc<dyn MailSender> {
    let mail = &config.mail;
    match mail.backend {
        MailBackend::Ses => {
            let client = create_ses_client(&config.aws_region).await;
            Arc::new(SesMailSender::new(client, mail.from_address.clone()))
        }
        MailBackend::Smtp => Arc::new(SmtpMailSender::new(
            &mail.smtp_host,
            mail.smtp_port,
            mail.from_address.clone(),
        )),
        MailBackend::Noop => Arc::new(NoopMailSender),
    }
}

async fn build_dedup_store(config: &NotifierConfig) -> Result<Arc<dyn DedupStore>, NotifierError> {
    let dedup = &config.dedup;
    match dedup.backend {
        DedupBackend::DynamoDb => {
            let client =
                dynamodb::create_client(&config.aws_region, dedup.endpoint.as_deref()).await;
            if dedup.endpoint.is_some() {
                dynamodb::ensure_dedup_table(&client, &dedup.table_name).await?;
            }
            Ok(Arc::new(DynamoDbDedupStore::new(
                client,
                dedup.table_name.clone(),
            )))
        }
        DedupBackend::Memory => {
            tracing::warn!("インメモリ台帳を使用します。重複排除はこのプロセス内でのみ有効です");
            Ok(Arc::new(InMemoryDedupStore::new()))
        }
    }
}

/// Ctrl+C または SIGTERM を受け取ったら処理中のバッチをキャンセルする
async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C ハンドラの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM ハンドラの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::warn!("Ctrl+C を受信しました。バッチをキャンセルします"),
        () = terminate => tracing::warn!("SIGTERM を受信しました。バッチをキャンセルします"),
    }

    cancel.cancel();
}
