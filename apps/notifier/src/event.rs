//! # SNS イベントエンベロープ
//!
//! SNS が配信するイベント JSON から、通知メッセージと購読解除リンクだけを取り出す。
//!
//! ```json
//! {
//!   "Records": [
//!     {
//!       "EventSource": "aws:sns",
//!       "Sns": {
//!         "MessageId": "...",
//!         "Message": "Create Book,42,Go in Action,Doe Jane,jane@example.com",
//!         "UnsubscribeUrl": "https://sns.us-east-1.amazonaws.com/?Action=Unsubscribe&..."
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! 上記以外のフィールドは無視する。`Records` がない（または `null` の）イベントは空のバッチとして扱う。

use booknotify_domain::RawNotification;
use serde::Deserialize;

use crate::error::NotifierError;

#[derive(Debug, Deserialize)]
struct SnsEvent {
    #[serde(rename = "Records", default)]
    records: Option<Vec<SnsEventRecord>>,
}

#[derive(Debug, Deserialize)]
struct SnsEventRecord {
    #[serde(rename = "Sns")]
    sns: SnsEntity,
}

#[derive(Debug, Deserialize)]
struct SnsEntity {
    #[serde(rename = "Message")]
    message:         String,
    #[serde(rename = "UnsubscribeUrl", default)]
    unsubscribe_url: Option<String>,
}

/// SNS イベント JSON をデコードする
///
/// # エラー
///
/// JSON として不正な場合、またはレコードに `Sns.Message` がない場合は
/// [`NotifierError::EventDecode`] を返す。この場合はどのレコードも処理しない。
pub fn decode_event(payload: &[u8]) -> Result<Vec<RawNotification>, NotifierError> {
    let event: SnsEvent = serde_json::from_slice(payload)?;

    let Some(records) = event.records else {
        tracing::warn!("イベントに Records がありません。空のバッチとして扱います");
        return Ok(Vec::new());
    };

    Ok(records
        .into_iter()
        .map(|record| RawNotification {
            message:         record.sns.message,
            unsubscribe_url: record.sns.unsubscribe_url.unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn snsイベントからメッセージと購読解除リンクを取り出す() {
        let payload = br#"{
            "Records": [
                {
                    "EventSource": "aws:sns",
                    "EventVersion": "1.0",
                    "Sns": {
                        "Type": "Notification",
                        "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
                        "TopicArn": "arn:aws:sns:us-east-1:123456789012:book-events",
                        "Message": "Create Book,42,Go in Action,Doe Jane,jane@example.com",
                        "Timestamp": "2020-11-26T15:04:05.000Z",
                        "UnsubscribeUrl": "https://sns.example.com/unsubscribe?id=1",
                        "MessageAttributes": {}
                    }
                },
                {
                    "Sns": {
                        "Message": "Delete Book,7,Rust,Doe John,john@example.com",
                        "UnsubscribeUrl": ""
                    }
                }
            ]
        }"#;

        let records = decode_event(payload).unwrap();

        assert_eq!(
            records,
            vec![
                RawNotification::new(
                    "Create Book,42,Go in Action,Doe Jane,jane@example.com",
                    "https://sns.example.com/unsubscribe?id=1",
                ),
                RawNotification::new("Delete Book,7,Rust,Doe John,john@example.com", ""),
            ]
        );
    }

    #[test]
    fn 購読解除リンクがない場合は空文字になる() {
        let payload = br#"{"Records":[{"Sns":{"Message":"a,b,c,d,e"}}]}"#;

        let records = decode_event(payload).unwrap();

        assert_eq!(records[0].unsubscribe_url, "");
    }

    #[test]
    fn recordsがない場合は空のバッチになる() {
        assert!(decode_event(b"{}").unwrap().is_empty());
        assert!(decode_event(br#"{"Records":null}"#).unwrap().is_empty());
        assert!(decode_event(br#"{"Records":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn 不正なjsonはデコードエラーになる() {
        let result = decode_event(b"not json");
        assert!(matches!(result, Err(NotifierError::EventDecode(_))));
    }

    #[test]
    fn messageがないレコードはデコードエラーになる() {
        let result = decode_event(br#"{"Records":[{"Sns":{"UnsubscribeUrl":"x"}}]}"#);
        assert!(matches!(result, Err(NotifierError::EventDecode(_))));
    }
}
