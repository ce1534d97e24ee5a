use chrono::SecondsFormat;

/// Job identifiers are random UUIDs assigned by the store.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Render a timestamp as RFC 3339 with millisecond precision and a `Z`
/// suffix, so that textual order matches chronological order.
pub fn timestamp_text(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
