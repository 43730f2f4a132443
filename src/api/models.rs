//! Response bodies for the HTTP surface
//!
//! The hit endpoint itself answers in plain text; only errors and `/stats`
//! are JSON.

use serde::{Deserialize, Serialize};

use crate::observability::MetricsSnapshot;

/// Error body: `{"code": "INTERNAL_ERROR", "message": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Body of `GET /stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub window_secs: f64,
    /// Events inside the window right now
    pub in_window: usize,
    /// Events retained, including expired ones not yet pruned
    pub stored: usize,
    pub durability: &'static str,
    pub metrics: MetricsSnapshot,
}
