use chrono::{DateTime, Utc};
use serde::Serialize;

/// Body of `GET /api/health`.
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl Health {
    pub fn healthy() -> Self {
        Self { status: "healthy", timestamp: Utc::now() }
    }
}

/// Generic `{"error": ...}` body shared by every failing endpoint.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
