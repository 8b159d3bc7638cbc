use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The uniform result shape both sides of the bridge speak: every response
/// file holds exactly one of these, and the channel hands them to callers
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn ok(data: Value) -> Self {
        BridgeResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        BridgeResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Prefixes the ExtendScript engine uses when evaluation itself failed.
/// Matched against trimmed raw output, before any envelope parsing applies.
pub const ERROR_MARKERS: &[&str] = &["Error:", "EvalScript error"];

/// Classify raw engine output into a response envelope.
///
/// Scripts built by the template engine already return envelope JSON, but
/// the engine can hand back anything: its own error strings, a bare value
/// from an ad-hoc script, or nothing at all. The rules, in order:
///
/// 1. Output that parses as a JSON object with a boolean `success` is a
///    well-formed envelope and is forwarded as-is.
/// 2. Output starting with a known error marker becomes a failure envelope
///    carrying the engine's message.
/// 3. Anything else is wrapped as a success whose data is the raw string,
///    so ad-hoc scripts still get their value back.
pub fn interpret_raw(raw: &str) -> BridgeResponse {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.get("success").is_some_and(Value::is_boolean) {
            if let Ok(response) = serde_json::from_value::<BridgeResponse>(value) {
                return response;
            }
        }
    }
    if ERROR_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
    {
        return BridgeResponse::err(trimmed);
    }
    BridgeResponse::ok(Value::String(raw.to_string()))
}
