//! ISO-8601 serde adapter for room timestamps.
//!
//! Any RFC 3339 offset is accepted on input and normalized to UTC. Output
//! uses the `Z` suffix and only as many fractional digits as the value
//! needs, so decode(encode(t)) == t.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_iso8601(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso8601(&raw).map_err(serde::de::Error::custom)
}

/// Formats a timestamp the way it is persisted.
pub fn format_iso8601(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_iso8601(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("invalid ISO-8601 timestamp `{raw}`: {err}"))
}
