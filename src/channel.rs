//! The client side of the bridge: submit a script, wait for its response.
//!
//! A submission writes `cmd_<id>.jsx` into the shared directory and polls
//! for `res_<id>.json` until it appears or the deadline passes. Validation
//! problems are the only hard `Err` the submission API returns; timeouts,
//! I/O failures, and malformed responses all resolve to an `Ok` failure
//! envelope, so a tool-calling caller can always relay a structured result.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::audit;
use crate::envelope::BridgeResponse;
use crate::error::BridgeError;
use crate::ids::{CorrelationId, IdGenerator};
use crate::options::{BridgeOptions, HEALTH_CHECK_TIMEOUT_MS};
use crate::paths;
use crate::sanitize;
use crate::template;

/// How often a waiting submission re-checks for its response file.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One client endpoint of the bridge. Owns its id counter, so independent
/// channels never contend; commands from one channel are totally ordered
/// by id even within a single millisecond.
pub struct CommandChannel {
    options: BridgeOptions,
    ids: IdGenerator,
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new(BridgeOptions::default())
    }
}

impl CommandChannel {
    pub fn new(options: BridgeOptions) -> Self {
        Self {
            options,
            ids: IdGenerator::new(),
        }
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Submit a script in validated mode: size cap plus the deny-list
    /// screen, applied before any filesystem I/O.
    pub async fn send(&self, script: &str) -> Result<BridgeResponse, BridgeError> {
        self.send_with_timeout(script, self.options.timeout).await
    }

    pub async fn send_with_timeout(
        &self,
        script: &str,
        timeout: Duration,
    ) -> Result<BridgeResponse, BridgeError> {
        sanitize::validate_script(script)?;
        Ok(self.submit(script, timeout).await)
    }

    /// Submit a pre-authored script, skipping the deny-list screen. Meant
    /// for scripts assembled upstream from already-escaped fragments; the
    /// size cap still applies.
    pub async fn send_unchecked(&self, script: &str) -> Result<BridgeResponse, BridgeError> {
        self.send_unchecked_with_timeout(script, self.options.timeout)
            .await
    }

    pub async fn send_unchecked_with_timeout(
        &self,
        script: &str,
        timeout: Duration,
    ) -> Result<BridgeResponse, BridgeError> {
        sanitize::check_size(script)?;
        Ok(self.submit(script, timeout).await)
    }

    /// Probe whether a host executor is answering: submit a trivial ping
    /// script with a short fixed deadline and report whether a success
    /// envelope came back.
    pub async fn health_check(&self) -> bool {
        let script = template::build(r#"    return bridgeSuccess("pong");"#);
        match self
            .send_unchecked_with_timeout(&script, Duration::from_millis(HEALTH_CHECK_TIMEOUT_MS))
            .await
        {
            Ok(response) => response.success,
            Err(_) => false,
        }
    }

    /// Remove stale protocol files left by a previous crash on either
    /// side. Call at startup, before the first submission.
    pub fn sweep(&self) -> Result<usize, BridgeError> {
        sweep_dir(&self.options.bridge_dir)
    }

    async fn submit(&self, script: &str, timeout: Duration) -> BridgeResponse {
        let started = Instant::now();
        let id = self.ids.next();
        let response = match self.submit_inner(&id, script, timeout, started).await {
            Ok(response) => response,
            Err(e) => BridgeResponse::err(e.to_string()),
        };
        audit::log_submission(
            self.options.audit_dir.as_deref(),
            &id,
            script.len(),
            &response,
            started.elapsed(),
        );
        response
    }

    async fn submit_inner(
        &self,
        id: &CorrelationId,
        script: &str,
        timeout: Duration,
        started: Instant,
    ) -> Result<BridgeResponse, BridgeError> {
        let bridge_dir = &self.options.bridge_dir;
        ensure_bridge_dir(bridge_dir)?;

        let command_file = paths::command_path(bridge_dir, id);
        let response_file = paths::response_path(bridge_dir, id);
        write_command(&command_file, script).await?;
        debug!(id = %id, bytes = script.len(), "command file written");

        let deadline = started + timeout;
        loop {
            match tokio::fs::read_to_string(&response_file).await {
                Ok(content) => {
                    let _ = tokio::fs::remove_file(&response_file).await;
                    let _ = tokio::fs::remove_file(&command_file).await;
                    let response = serde_json::from_str::<BridgeResponse>(&content)?;
                    debug!(id = %id, success = response.success, "response received");
                    return Ok(response);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(id = %id, error = %e, "response file unreadable; abandoning command");
                    abandon(&command_file, &response_file).await;
                    return Err(e.into());
                }
            }

            if Instant::now() >= deadline {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!(id = %id, elapsed_ms, "no response before deadline; abandoning command");
                abandon(&command_file, &response_file).await;
                return Err(BridgeError::Timeout { elapsed_ms });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Write the command whole: temp sibling, fsync, rename. The executor's
/// scan may run the instant the name appears, and a `.tmp` suffix never
/// parses as a claimable command.
async fn write_command(path: &Path, script: &str) -> Result<(), BridgeError> {
    let mut tmp_name = OsString::from(path.file_name().unwrap_or_default());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut file = tokio::fs::File::create(&tmp_path).await?;
    file.write_all(script.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Best-effort cleanup when a submission gives up. An unclaimed command
/// must not execute after the caller stops listening, and a response that
/// lands in the giving-up instant must not sit until the next sweep.
async fn abandon(command_file: &Path, response_file: &Path) {
    let _ = tokio::fs::remove_file(command_file).await;
    let _ = tokio::fs::remove_file(response_file).await;
}

/// Remove every file carrying a protocol prefix from `bridge_dir`,
/// including `.tmp` partials from an interrupted write. Files
/// that do not belong to the protocol are left alone. Safe to call when
/// the directory does not exist.
pub fn sweep_dir(bridge_dir: &Path) -> Result<usize, BridgeError> {
    let entries = match std::fs::read_dir(bridge_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !paths::is_bridge_file(name) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!(file = name, error = %e, "failed to remove stale bridge file"),
        }
    }
    if removed > 0 {
        info!(dir = %bridge_dir.display(), removed, "swept stale bridge files");
    }
    Ok(removed)
}

/// Scripts and responses can carry project contents, so the shared
/// directory is created owner-only where the platform supports it.
fn ensure_bridge_dir(bridge_dir: &Path) -> Result<(), BridgeError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(bridge_dir)?;
    }
    #[cfg(not(unix))]
    std::fs::create_dir_all(bridge_dir)?;
    Ok(())
}
