use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::paths;

/// Default wait for a response file before a submission gives up.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Deadline for the pre-authored health-check ping. Short on purpose:
/// the ping script is trivial, so a slow answer already means trouble.
pub const HEALTH_CHECK_TIMEOUT_MS: u64 = 5_000;

/// Configuration for one side of the bridge.
///
/// Resolution order for each knob: explicit argument, then environment
/// variable, then built-in default. Both processes must agree on
/// `bridge_dir`; everything else is per-process.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Shared directory both sides watch.
    pub bridge_dir: PathBuf,
    /// How long a submission waits for its response file.
    pub timeout: Duration,
    /// Where JSONL audit rows go. `None` disables auditing.
    pub audit_dir: Option<PathBuf>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

impl BridgeOptions {
    /// Resolve options from explicit arguments, the environment
    /// (`JSX_BRIDGE_DIR`, `JSX_BRIDGE_TIMEOUT_MS`, `JSX_BRIDGE_AUDIT_DIR`),
    /// and defaults, in that order.
    pub fn resolve(bridge_dir: Option<PathBuf>, timeout_ms: Option<u64>) -> Self {
        Self::resolve_from(bridge_dir, timeout_ms, EnvOverrides::capture())
    }

    fn resolve_from(
        bridge_dir: Option<PathBuf>,
        timeout_ms: Option<u64>,
        env: EnvOverrides,
    ) -> Self {
        let bridge_dir = bridge_dir
            .or_else(|| non_empty_path(env.bridge_dir))
            .unwrap_or_else(paths::default_bridge_dir);
        let timeout_ms = timeout_ms
            .or_else(|| {
                env.timeout_ms
                    .and_then(|raw| raw.into_string().ok())
                    .and_then(|raw| parse_timeout_ms(&raw))
            })
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Self {
            bridge_dir,
            timeout: Duration::from_millis(timeout_ms),
            audit_dir: non_empty_path(env.audit_dir),
        }
    }

    pub fn with_audit_dir(mut self, audit_dir: PathBuf) -> Self {
        self.audit_dir = Some(audit_dir);
        self
    }
}

/// Raw environment values feeding [`BridgeOptions::resolve`]. Captured as a
/// plain struct so the precedence rules can be exercised in tests without
/// mutating process-wide state.
#[derive(Debug, Default)]
struct EnvOverrides {
    bridge_dir: Option<OsString>,
    timeout_ms: Option<OsString>,
    audit_dir: Option<OsString>,
}

impl EnvOverrides {
    fn capture() -> Self {
        Self {
            bridge_dir: std::env::var_os(paths::BRIDGE_DIR_ENV),
            timeout_ms: std::env::var_os(paths::TIMEOUT_ENV),
            audit_dir: std::env::var_os(paths::AUDIT_DIR_ENV),
        }
    }
}

fn non_empty_path(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Zero and unparsable values are ignored so a bad environment variable
/// degrades to the default instead of wedging every submission.
fn parse_timeout_ms(raw: &str) -> Option<u64> {
    raw.trim().parse().ok().filter(|&ms| ms > 0)
}
