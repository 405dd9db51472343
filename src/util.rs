//! Shared utility functions.

use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, Utc};

use crate::error::{AppError, Result};

pub const SECONDS_PER_DAY: i64 = 86400;

pub fn now() -> i64 {
    Utc::now().timestamp()
}

pub fn gen_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse an admin-form date (`YYYY-MM-DD`) into a Unix timestamp at 00:00 UTC.
pub fn parse_date(value: &str) -> Result<i64> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date: {}", value)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::Validation(format!("Invalid date: {}", value)))?;
    Ok(midnight.and_utc().timestamp())
}

/// Extract `(username, password)` from an HTTP Basic Authorization header.
pub fn extract_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Basic "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
