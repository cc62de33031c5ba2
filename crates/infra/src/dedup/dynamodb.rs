//! DynamoDB 重複排除台帳
//!
//! 1 キー 1 アイテムで記録する。パーティションキー `id` に冪等キーを、
//! 非キー属性 `recorded_at` に記録日時（RFC 3339）を格納する。

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, error::DisplayErrorContext, types::AttributeValue};
use booknotify_domain::IdempotencyKey;
use chrono::Utc;

use super::DedupStore;
use crate::{InfraError, dynamodb::KEY_ATTRIBUTE};

const RECORDED_AT_ATTRIBUTE: &str = "recorded_at";

/// DynamoDB 実装の DedupStore
pub struct DynamoDbDedupStore {
    client:     Client,
    table_name: String,
}

impl DynamoDbDedupStore {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl DedupStore for DynamoDbDedupStore {
    #[tracing::instrument(skip_all, level = "debug", fields(table = %self.table_name, key.len = key.as_str().len()))]
    async fn exists(&self, key: &IdempotencyKey) -> Result<bool, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(key.as_str().to_owned()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| InfraError::lookup(DisplayErrorContext(&e).to_string()))?;

        let found = output.item().is_some_and(|item| !item.is_empty());
        tracing::debug!(found, "重複排除台帳を参照しました");
        Ok(found)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(table = %self.table_name, key.len = key.as_str().len()))]
    async fn record(&self, key: &IdempotencyKey) -> Result<(), InfraError> {
        let mut item = HashMap::new();
        item.insert(
            KEY_ATTRIBUTE.to_string(),
            AttributeValue::S(key.as_str().to_owned()),
        );
        item.insert(
            RECORDED_AT_ATTRIBUTE.to_string(),
            AttributeValue::S(Utc::now().to_rfc3339()),
        );

        // 同一キーの PutItem は上書きになるため、記録済みキーでも成功する
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| InfraError::record(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!("重複排除台帳に記録しました");
        Ok(())
    }
}
