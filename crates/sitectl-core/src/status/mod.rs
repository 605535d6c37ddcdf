//! Site status protocol: wire types, errors, and the service seam.
//!
//! The remote service exposes a single boolean flag at `/api/site-status`:
//!
//! - `GET`  → `{"isLive": bool}`
//! - `POST` with `{"live": bool}` → `{"isLive": bool}` (authoritative)

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

mod http;

pub use http::{HttpStatusService, STATUS_PATH, StatusEndpoint, USER_AGENT};

/// The site flag as reported by the status service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "isLive")]
    pub is_live: bool,
}

impl Status {
    pub const LIVE: Status = Status { is_live: true };
    pub const MAINTENANCE: Status = Status { is_live: false };

    pub fn new(is_live: bool) -> Self {
        Self { is_live }
    }

    /// Returns the opposite flag value.
    pub fn flipped(self) -> Self {
        Self {
            is_live: !self.is_live,
        }
    }

    /// Short badge label.
    pub fn label(self) -> &'static str {
        if self.is_live { "Live" } else { "Maintenance" }
    }

    /// One-line description for the maintenance-mode row.
    pub fn description(self) -> &'static str {
        if self.is_live {
            "Website is live and accessible"
        } else {
            "Website is under maintenance"
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Body of the write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub live: bool,
}

/// Categories of status errors.
///
/// `Network` and `Rejected` are the two failure classes the controller
/// distinguishes in its logs; `Timeout` and `Parse` are narrower variants
/// of a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusErrorKind {
    /// Request never completed (connection refused, DNS, reset, ...)
    Network,
    /// Server answered with a non-2xx status
    Rejected,
    /// Request exceeded the configured timeout
    Timeout,
    /// 2xx response whose body is not a status object
    Parse,
}

impl fmt::Display for StatusErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusErrorKind::Network => write!(f, "network"),
            StatusErrorKind::Rejected => write!(f, "rejected"),
            StatusErrorKind::Timeout => write!(f, "timeout"),
            StatusErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the status service with kind and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusError {
    /// Error category
    pub kind: StatusErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
    /// HTTP status code for `Rejected` errors
    pub status: Option<u16>,
}

impl StatusError {
    pub fn new(kind: StatusErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            status: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(StatusErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StatusErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(StatusErrorKind::Parse, message)
    }

    /// Creates a rejection error from a non-2xx response.
    ///
    /// Pulls `error` / `message` out of a JSON body when the server sends one.
    pub fn rejected(status: u16, body: &str) -> Self {
        let body = body.trim();
        let details = (!body.is_empty()).then(|| body.to_string());
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .or_else(|| json.get("message"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .map_or_else(
                || format!("HTTP {status}"),
                |msg| format!("HTTP {status}: {msg}"),
            );
        Self {
            kind: StatusErrorKind::Rejected,
            message,
            details,
            status: Some(status),
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.kind == StatusErrorKind::Rejected
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StatusError {}

/// Result type for status operations.
pub type StatusResult<T> = std::result::Result<T, StatusError>;

/// Remote holder of the authoritative site flag.
///
/// Implementations perform exactly one request per call and never retry.
pub trait StatusService: Send + Sync + 'static {
    /// Reads the current flag.
    fn fetch_status(&self) -> impl Future<Output = StatusResult<Status>> + Send;

    /// Overwrites the flag and returns the value the server settled on.
    fn write_status(&self, live: bool) -> impl Future<Output = StatusResult<Status>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_uses_camel_case_field() {
        let status: Status = serde_json::from_str(r#"{"isLive": true}"#).unwrap();
        assert_eq!(status, Status::LIVE);
        assert_eq!(
            serde_json::to_string(&Status::MAINTENANCE).unwrap(),
            r#"{"isLive":false}"#
        );
    }

    #[test]
    fn test_toggle_request_body() {
        let body = serde_json::to_value(ToggleRequest { live: false }).unwrap();
        assert_eq!(body, serde_json::json!({ "live": false }));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Status::LIVE.label(), "Live");
        assert_eq!(Status::MAINTENANCE.label(), "Maintenance");
        assert_eq!(Status::LIVE.flipped(), Status::MAINTENANCE);
        assert_eq!(
            Status::MAINTENANCE.description(),
            "Website is under maintenance"
        );
    }

    #[test]
    fn test_rejected_extracts_json_message() {
        let err = StatusError::rejected(503, r#"{"error":"database offline"}"#);
        assert_eq!(err.kind, StatusErrorKind::Rejected);
        assert_eq!(err.status, Some(503));
        assert_eq!(err.to_string(), "HTTP 503: database offline");
        assert!(err.details.is_some());
    }

    #[test]
    fn test_rejected_plain_body() {
        let err = StatusError::rejected(500, "");
        assert_eq!(err.to_string(), "HTTP 500");
        assert_eq!(err.details, None);

        let err = StatusError::rejected(502, "Bad Gateway");
        assert_eq!(err.to_string(), "HTTP 502");
        assert_eq!(err.details.as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(StatusErrorKind::Network.to_string(), "network");
        assert_eq!(StatusErrorKind::Timeout.to_string(), "timeout");
    }
}
