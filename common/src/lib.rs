use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Push channel message type announcing a freshly created log.
pub const NEW_LOG: &str = "NEW_LOG";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: String,
    pub timestamp: String,
    pub level: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl LogRecord {
    /// Stamps a submitted log with a fresh id and the current time.
    pub fn from_new(new: NewLog) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            level: new.level,
            message: new.message,
            stake_username: new.stake_username,
            app_version: new.app_version,
            platform: new.platform,
            details: new.details,
        }
    }

    /// The record's instant, or the earliest representable one if the
    /// timestamp cannot be parsed.
    pub fn instant(&self) -> DateTime<Utc> {
        parse_timestamp(&self.timestamp).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Body of a log submission.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewLog {
    pub level: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Query string of `GET /api/logs`. Absent fields are never serialized.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stake_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Envelope of every push channel frame: `{ "type": ..., "data": ... }`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PushEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl PushEnvelope {
    pub fn new_log(record: &LogRecord) -> serde_json::Result<Self> {
        Ok(Self {
            kind: NEW_LOG.to_string(),
            data: serde_json::to_value(record)?,
        })
    }

    /// The carried record if this is a well-formed `NEW_LOG` message.
    pub fn into_new_log(self) -> Option<LogRecord> {
        if self.kind != NEW_LOG {
            return None;
        }
        serde_json::from_value(self.data).ok()
    }
}

/// Parses RFC 3339 timestamps, zone-less ISO-8601 date-times (read as UTC),
/// bare dates and epoch milliseconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    s.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_supported_timestamp_shapes() {
        let expected = parse_timestamp("2024-03-01T10:00:00Z").unwrap();
        assert_eq!(parse_timestamp("2024-03-01T11:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:00:00.000"), Some(expected));
        assert_eq!(
            parse_timestamp(&expected.timestamp_millis().to_string()),
            Some(expected)
        );
        assert!(parse_timestamp("2024-03-01").is_some());
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn unparseable_timestamp_is_earliest_instant() {
        let record: LogRecord = serde_json::from_value(json!({
            "id": "1",
            "timestamp": "not a date",
            "level": "info",
            "message": "m",
        }))
        .unwrap();
        assert_eq!(record.instant(), DateTime::<Utc>::MIN_UTC);
        assert_eq!(record.stake_username, None);
        assert_eq!(record.details, None);
    }

    #[test]
    fn query_omits_absent_fields() {
        let query = LogQuery {
            level: Some("error".into()),
            page: Some(2),
            ..Default::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value, json!({ "level": "error", "page": 2 }));
    }

    #[test]
    fn envelope_only_yields_new_log_records() {
        let record: LogRecord = serde_json::from_value(json!({
            "id": "7",
            "timestamp": "2024-03-01T10:00:00Z",
            "level": "warn",
            "message": "disk",
            "stakeUsername": "alice",
            "details": { "free": [1, 2] },
        }))
        .unwrap();

        let envelope = PushEnvelope::new_log(&record).unwrap();
        assert_eq!(envelope.clone().into_new_log(), Some(record));

        let other: PushEnvelope =
            serde_json::from_value(json!({ "type": "PING", "data": {} })).unwrap();
        assert_eq!(other.into_new_log(), None);

        let broken: PushEnvelope =
            serde_json::from_value(json!({ "type": "NEW_LOG", "data": { "id": 3 } })).unwrap();
        assert_eq!(broken.into_new_log(), None);
    }
}
