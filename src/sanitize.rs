//! Escaping and validation for script payloads.
//!
//! Interpolated values travel inside ExtendScript string literals, so the
//! escaping here decides whether a clip name like `O'Brien "final" cut` is
//! data or code. Validation is a conservative pattern screen, not a parser.

use crate::error::BridgeError;

/// Hard cap on a serialized script, in bytes. Oversized submissions are
/// rejected outright; silent truncation would corrupt the script.
pub const MAX_SCRIPT_BYTES: usize = 500 * 1024;

/// Substrings rejected in validated submissions. Matched anywhere in the
/// script text; legitimate identifiers that happen to contain one are
/// rejected too, which is the accepted cost of screening without parsing.
const DENY_PATTERNS: &[&str] = &["eval(", "$.eval", "system.callSystem"];

/// Escape a value for embedding inside an ExtendScript string literal.
///
/// One pass over the input, which is equivalent to replacing backslashes
/// first and the other characters after: no output escape is ever
/// re-escaped. Covers backslash, both quote styles, newline, carriage
/// return, and tab.
pub fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Size screen applied to every submission, validated or not.
pub fn check_size(script: &str) -> Result<(), BridgeError> {
    if script.len() > MAX_SCRIPT_BYTES {
        return Err(BridgeError::Validation {
            message: format!(
                "Script is {} bytes; the maximum is {MAX_SCRIPT_BYTES} bytes",
                script.len()
            ),
        });
    }
    Ok(())
}

/// Full screen for validated submissions: size cap plus the deny-list.
pub fn validate_script(script: &str) -> Result<(), BridgeError> {
    check_size(script)?;
    for pattern in DENY_PATTERNS {
        if script.contains(pattern) {
            return Err(BridgeError::Validation {
                message: format!("Script contains disallowed pattern \"{pattern}\""),
            });
        }
    }
    Ok(())
}
