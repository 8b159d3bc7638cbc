//! Centralized naming scheme for the shared bridge directory.
//!
//! This module is the single source of truth for file-name prefixes and
//! extensions, environment-variable names, and path-building functions.
//! No other module should hard-code these strings.

use std::path::{Path, PathBuf};

use crate::ids::CorrelationId;

// ── Protocol file naming ─────────────────────────────────────────

pub const COMMAND_PREFIX: &str = "cmd_";
pub const COMMAND_EXTENSION: &str = "jsx";
pub const RESPONSE_PREFIX: &str = "res_";
pub const RESPONSE_EXTENSION: &str = "json";

// ── Directory and environment names ──────────────────────────────

/// Subfolder of the OS temp directory used when no override is given.
pub const BRIDGE_DIR_NAME: &str = "jsx-bridge";

pub const BRIDGE_DIR_ENV: &str = "JSX_BRIDGE_DIR";
pub const TIMEOUT_ENV: &str = "JSX_BRIDGE_TIMEOUT_MS";
pub const AUDIT_DIR_ENV: &str = "JSX_BRIDGE_AUDIT_DIR";

// ── Path builders ────────────────────────────────────────────────

/// Default shared directory: a fixed subfolder of the OS temp directory,
/// so both sides agree on the location without prior coordination.
pub fn default_bridge_dir() -> PathBuf {
    std::env::temp_dir().join(BRIDGE_DIR_NAME)
}

pub fn command_file_name(id: &CorrelationId) -> String {
    format!("{COMMAND_PREFIX}{id}.{COMMAND_EXTENSION}")
}

pub fn response_file_name(id: &CorrelationId) -> String {
    format!("{RESPONSE_PREFIX}{id}.{RESPONSE_EXTENSION}")
}

pub fn command_path(bridge_dir: &Path, id: &CorrelationId) -> PathBuf {
    bridge_dir.join(command_file_name(id))
}

pub fn response_path(bridge_dir: &Path, id: &CorrelationId) -> PathBuf {
    bridge_dir.join(response_file_name(id))
}

// ── File-name classification ─────────────────────────────────────

/// Extract the correlation id from a command file name, or `None` if the
/// name does not follow the `cmd_<id>.jsx` scheme. Used by the executor's
/// discovery scan.
pub fn parse_command_file_name(name: &str) -> Option<CorrelationId> {
    let stem = name
        .strip_prefix(COMMAND_PREFIX)?
        .strip_suffix(&format!(".{COMMAND_EXTENSION}"))?;
    CorrelationId::parse(stem)
}

/// True for any file the protocol may have left behind, including `.tmp`
/// partials from an interrupted response write. The sweep removes exactly
/// these and nothing else, since an operator-supplied directory may be
/// shared with other software.
pub fn is_bridge_file(name: &str) -> bool {
    name.starts_with(COMMAND_PREFIX) || name.starts_with(RESPONSE_PREFIX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_command_and_response_names_share_id() {
        let id = CorrelationId::parse("1717000000000_7").unwrap();
        assert_eq!(command_file_name(&id), "cmd_1717000000000_7.jsx");
        assert_eq!(response_file_name(&id), "res_1717000000000_7.json");
    }

    #[test]
    fn test_parse_command_file_name_round_trip() {
        let id = CorrelationId::parse("1717000000000_42").unwrap();
        let parsed = parse_command_file_name(&command_file_name(&id)).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_command_file_name_rejects_foreign_names() {
        assert!(parse_command_file_name("res_1717000000000_1.json").is_none());
        assert!(parse_command_file_name("cmd_1717000000000_1.txt").is_none());
        assert!(parse_command_file_name("cmd_notanid.jsx").is_none());
        assert!(parse_command_file_name("notes.md").is_none());
    }

    #[test]
    fn test_is_bridge_file_covers_tmp_partials() {
        assert!(is_bridge_file("cmd_1_2.jsx"));
        assert!(is_bridge_file("res_1_2.json"));
        assert!(is_bridge_file("res_1_2.json.tmp"));
        assert!(!is_bridge_file("other.json"));
    }
}
