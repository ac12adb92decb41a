use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::{NormalizedRecord, QueryParameters};

/// Query-level facts captured once the last page has been pulled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetadata {
    #[serde(rename = "Query")]
    pub query: String,
    #[serde(rename = "Returned Events")]
    pub returned_events: u64,
    #[serde(rename = "Auths")]
    pub auths: String,
    #[serde(rename = "Cert")]
    pub cert: String,
    #[serde(rename = "Unix Timestamp(ms)")]
    pub unix_timestamp_ms: i64,
}

impl QueryMetadata {
    /// Snapshots `params` and the final count with the current time.
    pub fn capture(
        params: &QueryParameters,
        returned_events: u64,
        credential_label: impl Into<String>,
    ) -> Self {
        Self {
            query: params.query().to_string(),
            returned_events,
            auths: params.auths().to_string(),
            cert: credential_label.into(),
            unix_timestamp_ms: now_unix_ms(),
        }
    }
}

/// Milliseconds since the Unix epoch, UTC.
pub fn now_unix_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// The persisted artifact: metadata plus every accumulated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub metadata: QueryMetadata,
    pub events: Vec<NormalizedRecord>,
}

impl QueryResults {
    pub fn new(metadata: QueryMetadata, events: Vec<NormalizedRecord>) -> Self {
        Self { metadata, events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_uses_service_key_names() {
        let params = QueryParameters::new("q", "GENRES == 'Test'", "PUBLIC,PRIVATE");
        let metadata = QueryMetadata::capture(&params, 12, "alice");

        let value = serde_json::to_value(&metadata).expect("metadata should serialize");
        let keys = value
            .as_object()
            .map(|object| object.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        assert_eq!(
            keys,
            vec!["Query", "Returned Events", "Auths", "Cert", "Unix Timestamp(ms)"]
        );
        assert_eq!(value["Returned Events"], 12);
        assert_eq!(value["Cert"], "alice");
    }

    #[test]
    fn capture_time_is_current() {
        let before = now_unix_ms();
        let metadata = QueryMetadata::capture(&QueryParameters::new("q", "x", "a"), 0, "c");
        let after = now_unix_ms();

        assert!(metadata.unix_timestamp_ms >= before);
        assert!(metadata.unix_timestamp_ms <= after);
    }
}
