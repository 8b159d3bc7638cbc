//! The panel side of the bridge: discover pending commands, claim them,
//! evaluate, and write responses.
//!
//! Each discovery scan lists `cmd_*.jsx` files, sorts them into creation
//! order, and claims each by deleting it before evaluation starts. The
//! delete is the at-most-once guarantee: a command that crashed the engine
//! mid-run is gone on restart instead of running twice, and the waiting
//! caller times out. Evaluation happens on spawned tasks so one slow
//! script never blocks later claims, and responses may complete out of
//! order; correlation ids keep them sorted out on the client side.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::envelope::{self, BridgeResponse};
use crate::error::BridgeError;
use crate::ids::CorrelationId;
use crate::paths;

/// Default cadence of the discovery scan.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The evaluation seam. The real implementation hands the script to the
/// application's ExtendScript engine and returns whatever string it
/// produces; tests substitute scripted fakes.
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    async fn evaluate(&self, script: &str) -> Result<String, BridgeError>;
}

/// Polling executor that drives a [`ScriptEngine`] from the shared
/// directory. One instance per bridge directory.
pub struct HostExecutor<E> {
    bridge_dir: PathBuf,
    engine: Arc<E>,
    poll_interval: Duration,
    in_flight: JoinSet<()>,
}

impl<E: ScriptEngine + 'static> HostExecutor<E> {
    pub fn new(bridge_dir: PathBuf, engine: Arc<E>) -> Self {
        Self {
            bridge_dir,
            engine,
            poll_interval: DEFAULT_POLL_INTERVAL,
            in_flight: JoinSet::new(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// One discovery scan. Claims every pending command in id order and
    /// starts evaluating each on its own task; returns how many were
    /// claimed. Failures on one command never stop the scan.
    ///
    /// Must be called from within a tokio runtime, since evaluations are
    /// spawned onto it.
    pub fn tick(&mut self) -> Result<usize, BridgeError> {
        // Reap tasks that finished since the last scan.
        while self.in_flight.try_join_next().is_some() {}

        let mut claimed = 0;
        for (id, path) in pending_commands(&self.bridge_dir)? {
            let script = match std::fs::read_to_string(&path) {
                Ok(script) => script,
                Err(e) => {
                    // Lost command: remove any remnant and move on. The
                    // waiting caller times out on its own.
                    warn!(id = %id, error = %e, "unreadable command file; dropping");
                    let _ = std::fs::remove_file(&path);
                    continue;
                }
            };
            if let Err(e) = std::fs::remove_file(&path) {
                // Claim failed. Without the delete the command could run
                // twice, so it must not run at all.
                warn!(id = %id, error = %e, "could not claim command file; skipping");
                continue;
            }
            claimed += 1;
            debug!(id = %id, bytes = script.len(), "claimed command");

            let engine = Arc::clone(&self.engine);
            let response_file = paths::response_path(&self.bridge_dir, &id);
            self.in_flight.spawn(async move {
                let response = match engine.evaluate(&script).await {
                    Ok(raw) => envelope::interpret_raw(&raw),
                    // Engine-reported errors travel verbatim; everything
                    // else gets the error kind's framing.
                    Err(BridgeError::Execution { message }) => BridgeResponse::err(message),
                    Err(e) => BridgeResponse::err(e.to_string()),
                };
                if let Err(e) = write_response(&response_file, &response) {
                    warn!(file = %response_file.display(), error = %e, "failed to write response");
                }
            });
        }
        Ok(claimed)
    }

    /// Scan until `shutdown` is set, then drain in-flight evaluations so
    /// every claimed command still gets its response written.
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) {
        info!(dir = %self.bridge_dir.display(), "host executor started");
        while !shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.tick() {
                warn!(error = %e, "discovery scan failed");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        while self.in_flight.join_next().await.is_some() {}
        info!("host executor stopped");
    }
}

/// List pending commands in claim order: numeric (timestamp, counter),
/// not filename bytes, so `_10` runs after `_9`.
fn pending_commands(bridge_dir: &Path) -> Result<Vec<(CorrelationId, PathBuf)>, BridgeError> {
    let entries = match std::fs::read_dir(bridge_dir) {
        Ok(entries) => entries,
        // Not created yet; the first submission will make it.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut pending: Vec<(CorrelationId, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let id = paths::parse_command_file_name(name.to_str()?)?;
            Some((id, entry.path()))
        })
        .collect();
    pending.sort();
    Ok(pending)
}

/// Write the response whole: temp sibling, fsync, rename. The channel may
/// read the file the instant it appears, so it must never observe a
/// partial write.
fn write_response(path: &Path, response: &BridgeResponse) -> Result<(), BridgeError> {
    let json = serde_json::to_string(response)?;

    let mut tmp_name = OsString::from(path.file_name().unwrap_or_default());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut file = std::fs::File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
