use std::fmt;

use serde::Serialize;

/// Structured error type for the bridge. Replaces stringly-typed errors so
/// callers can match on error codes before deciding how to surface them.
///
/// Only `Validation` is ever returned as a hard `Err` from the channel's
/// submission API; the remaining kinds are folded into failure envelopes so
/// a tool-calling client always receives a structured response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum BridgeError {
    Validation { message: String },
    Io { message: String },
    Timeout { elapsed_ms: u64 },
    Parse { message: String },
    Execution { message: String },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Validation { message } => write!(f, "{message}"),
            BridgeError::Io { message } => write!(f, "I/O error: {message}"),
            BridgeError::Timeout { elapsed_ms } => {
                write!(
                    f,
                    "Timed out after {elapsed_ms} ms waiting for a response; the host executor may not be running"
                )
            }
            BridgeError::Parse { message } => write!(f, "Malformed response: {message}"),
            BridgeError::Execution { message } => write!(f, "Script error: {message}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Parse {
            message: e.to_string(),
        }
    }
}

/// Allow converting BridgeError to String for embedding in response envelopes.
impl From<BridgeError> for String {
    fn from(e: BridgeError) -> String {
        e.to_string()
    }
}

impl From<String> for BridgeError {
    fn from(s: String) -> Self {
        BridgeError::Validation { message: s }
    }
}

impl From<&str> for BridgeError {
    fn from(s: &str) -> Self {
        BridgeError::Validation {
            message: s.to_string(),
        }
    }
}
