use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Persisted counter state, stored on disk as
/// `{"totalClicks": n, "lastUpdated": "<ISO-8601>"}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CounterRecord {
    pub total_clicks: u64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl CounterRecord {
    /// Fresh record with a zero count stamped now.
    pub fn zero() -> Self {
        Self { total_clicks: 0, last_updated: Utc::now() }
    }

    /// Add `delta` (saturating) and restamp.
    pub fn bump(&mut self, delta: ClickDelta) {
        self.total_clicks = self.total_clicks.saturating_add(delta.get());
        self.last_updated = Utc::now();
    }
}

/// Accepts RFC 3339 or a naive ISO-8601 timestamp, the latter read as local time.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Amount to add to the counter. Anything that is not a non-negative integer
/// collapses to the default of one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickDelta(u64);

impl ClickDelta {
    pub const DEFAULT: ClickDelta = ClickDelta(1);

    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Coerce an optional JSON value (the `clicks` field of a request).
    pub fn from_json(raw: Option<&Value>) -> Self {
        raw.and_then(Value::as_u64).map(Self).unwrap_or_default()
    }

    /// Coerce a whole request body; non-objects and missing `clicks` give the default.
    pub fn from_body(body: &Value) -> Self {
        Self::from_json(body.get("clicks"))
    }
}

impl Default for ClickDelta {
    fn default() -> Self {
        Self::DEFAULT
    }
}
