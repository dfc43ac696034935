//! Single error shape for everything the gateway can fail with.
//!
//! Callers branch on [`ApiErrorKind`]; `status`, `message` and `raw_body`
//! carry whatever the backend said.

use std::fmt;
use thiserror::Error;

use crate::models::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 401, the session is no longer valid
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 400 from the backend, or a payload rejected before sending
    Validation,
    /// No response was received
    Network,
    /// A body could not be encoded, or a 2xx body had an unexpected shape
    Serialization,
    /// Any other status
    Unknown,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiErrorKind::Validation,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            _ => ApiErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApiErrorKind::Unauthorized => "Unauthorized",
            ApiErrorKind::Forbidden => "Forbidden",
            ApiErrorKind::NotFound => "Not found",
            ApiErrorKind::Validation => "Validation error",
            ApiErrorKind::Network => "Network error",
            ApiErrorKind::Serialization => "Serialization error",
            ApiErrorKind::Unknown => "Unexpected response",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, absent when no response was received
    pub status: Option<u16>,
    pub message: String,
    pub raw_body: Option<String>,
}

impl ApiError {
    /// Build the error for a non-2xx response
    pub fn from_response(status: u16, body: &str) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            status: Some(status),
            message: extract_message(body).unwrap_or_else(|| default_message(status)),
            raw_body: Some(body.to_string()),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status: None,
            message: message.into(),
            raw_body: None,
        }
    }

    pub fn serialization(status: Option<u16>, message: impl Into<String>, raw_body: Option<String>) -> Self {
        Self {
            kind: ApiErrorKind::Serialization,
            status,
            message: message.into(),
            raw_body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self {
            kind: ApiErrorKind::Validation,
            status: None,
            message: err.to_string(),
            raw_body: None,
        }
    }
}

/// Pull a human readable message out of an error body.
///
/// The backend answers `{"error": "..."}` most of the time, sometimes
/// `{"message": "..."}` and occasionally some other single string field.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => ["error", "message", "msg", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .or_else(|| map.values().find_map(|v| v.as_str()))
            .map(str::to_string),
        Ok(serde_json::Value::String(s)) => Some(s),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}

fn default_message(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}
