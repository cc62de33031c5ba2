//! # DynamoDB 接続管理
//!
//! 重複排除台帳として使う Amazon DynamoDB への接続を管理する。
//!
//! ## 設計方針
//!
//! - **本番環境**: 実行ロールの認証情報で Amazon DynamoDB に接続（エンドポイント未指定）
//! - **ローカル開発**: DynamoDB Local に接続（`DYNAMODB_ENDPOINT` で指定）
//! - **テーブル自動作成**: エンドポイント指定時のみ、起動時にテーブルを作成（冪等）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use booknotify_infra::dynamodb;
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     // 本番（AWS）
//!     let client = dynamodb::create_client("us-east-1", None).await;
//!
//!     // ローカル（DynamoDB Local）
//!     let client = dynamodb::create_client("us-east-1", Some("http://localhost:18000")).await;
//!     dynamodb::ensure_dedup_table(&client, "booknotify-dedup").await?;
//!     Ok(())
//! }
//! ```

use aws_sdk_dynamodb::{
    Client,
    error::DisplayErrorContext,
    types::{AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType},
};

use crate::InfraError;

/// 重複排除台帳のパーティションキー属性名
pub const KEY_ATTRIBUTE: &str = "id";

/// DynamoDB クライアントを作成する
///
/// `endpoint` が `None` の場合は SDK 標準の認証情報プロバイダチェーンを使う。
/// `Some` の場合は DynamoDB Local 向けにダミーの認証情報を設定する。
pub async fn create_client(region: &str, endpoint: Option<&str>) -> Client {
    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_owned()));

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder
            .endpoint_url(endpoint_url)
            // DynamoDB Local はクレデンシャルを検証しないが、SDK はプロバイダが必要
            .credentials_provider(aws_sdk_dynamodb::config::Credentials::new(
                "local", "local", None, None, "local",
            ));
    }

    let config = config_builder.load().await;
    Client::new(&config)
}

/// 重複排除台帳テーブルが存在しなければ作成する（冪等）
///
/// テーブルスキーマ:
/// - PK: `id` (String) - 冪等キー
///
/// 記録日時 `recorded_at` は非キー属性のためスキーマには含めない。
pub async fn ensure_dedup_table(client: &Client, table_name: &str) -> Result<(), InfraError> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(_) => {
            tracing::debug!(table = %table_name, "重複排除テーブルは既に存在します");
            return Ok(());
        }
        Err(err) => {
            let not_found = err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception());
            if !not_found {
                return Err(InfraError::table_setup(
                    table_name,
                    format!("DescribeTable: {}", DisplayErrorContext(&err)),
                ));
            }
        }
    }

    tracing::info!(table = %table_name, "重複排除テーブルを作成します");

    let create_result = client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(KEY_ATTRIBUTE)
                .key_type(KeyType::Hash)
                .build()
                .map_err(|e| InfraError::table_setup(table_name, format!("KeySchema: {e}")))?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(KEY_ATTRIBUTE)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|e| {
                    InfraError::table_setup(table_name, format!("AttributeDefinition: {e}"))
                })?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    if let Err(err) = create_result {
        // 並行起動時はテーブル作成中の ResourceInUseException が返りうる
        let in_use = err
            .as_service_error()
            .is_some_and(|e| e.is_resource_in_use_exception());
        if !in_use {
            return Err(InfraError::table_setup(
                table_name,
                format!("CreateTable: {}", DisplayErrorContext(&err)),
            ));
        }
        tracing::debug!(table = %table_name, "重複排除テーブルは既に作成中です");
        return Ok(());
    }

    tracing::info!(table = %table_name, "重複排除テーブルを作成しました");
    Ok(())
}
