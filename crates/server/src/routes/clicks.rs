use axum::{body::Bytes, extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use service::counter::{run_blocking, ClickDelta, CounterRecord};
use tracing::debug;

use crate::errors::ApiError;
use crate::routes::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClicksResponse {
    pub total_clicks: u64,
    pub last_updated: DateTime<Utc>,
}

impl From<CounterRecord> for ClicksResponse {
    fn from(r: CounterRecord) -> Self {
        Self { total_clicks: r.total_clicks, last_updated: r.last_updated }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementResponse {
    pub total_clicks: u64,
    pub success: bool,
    pub last_updated: DateTime<Utc>,
}

impl From<CounterRecord> for IncrementResponse {
    fn from(r: CounterRecord) -> Self {
        Self { total_clicks: r.total_clicks, success: true, last_updated: r.last_updated }
    }
}

/// GET /api/clicks
pub async fn get_clicks(State(state): State<AppState>) -> Result<Json<ClicksResponse>, ApiError> {
    let record = run_blocking(&state.store, |s| s.load()).await?;
    Ok(Json(record.into()))
}

/// POST /api/clicks
///
/// The body is optional. Anything other than a JSON object carrying a
/// non-negative integer `clicks` increments by one.
pub async fn add_clicks(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IncrementResponse>, ApiError> {
    let delta = delta_from_body(&body);
    debug!(delta = delta.get(), "incrementing clicks");
    let record = run_blocking(&state.store, move |s| s.increment(delta)).await?;
    Ok(Json(record.into()))
}

fn delta_from_body(body: &[u8]) -> ClickDelta {
    serde_json::from_slice::<Value>(body)
        .map(|v| ClickDelta::from_body(&v))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_body_parsing() {
        assert_eq!(delta_from_body(b"").get(), 1);
        assert_eq!(delta_from_body(b"not json").get(), 1);
        assert_eq!(delta_from_body(b"null").get(), 1);
        assert_eq!(delta_from_body(br#"{"clicks": 7}"#).get(), 7);
        assert_eq!(delta_from_body(br#"{"clicks": -7}"#).get(), 1);
    }
}
