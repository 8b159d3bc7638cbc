//! JSONL audit logging for bridge submissions.
//!
//! When an audit directory is configured, every submission is logged as a
//! single line in `{audit_dir}/YYYY-MM-DD.jsonl`. Best-effort: logging
//! never panics or fails the caller.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::envelope::BridgeResponse;
use crate::ids::CorrelationId;

#[derive(Serialize)]
struct SubmissionAuditEntry<'a> {
    ts: u64,
    id: String,
    script_bytes: usize,
    success: bool,
    error: Option<&'a str>,
    duration_ms: u64,
}

/// Log one completed submission to today's JSONL audit file.
///
/// `audit_dir` of `None` means auditing is disabled. Failures while writing
/// are silently ignored so they never affect the caller's control flow.
pub fn log_submission(
    audit_dir: Option<&Path>,
    id: &CorrelationId,
    script_bytes: usize,
    response: &BridgeResponse,
    duration: Duration,
) {
    let Some(dir) = audit_dir else {
        return;
    };

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let entry = SubmissionAuditEntry {
        ts: now,
        id: id.to_string(),
        script_bytes,
        success: response.success,
        error: response.error.as_deref(),
        duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
    };

    let _ = fs::create_dir_all(dir);

    let filename = format!("{}.jsonl", date_from_epoch(now));
    let path = dir.join(filename);

    if let Ok(json) = serde_json::to_string(&entry) {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
            let _ = writeln!(file, "{json}");
        }
    }
}

/// Format epoch seconds as `YYYY-MM-DD` without external deps.
#[allow(clippy::unreadable_literal, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn date_from_epoch(epoch_secs: u64) -> String {
    // Civil date from day count (algorithm from Howard Hinnant)
    let days = (epoch_secs / 86400) as i64;
    let z = days + 719468;
    let era = (if z >= 0 { z } else { z - 146096 }) / 146097;
    let doe = (z - era * 146097) as u64; // day of era [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = (yoe as i64) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };

    format!("{y:04}-{m:02}-{d:02}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_date_from_epoch() {
        // 2026-08-23 00:00:00 UTC = 1787443200
        assert_eq!(date_from_epoch(1_787_443_200), "2026-08-23");
        // Unix epoch
        assert_eq!(date_from_epoch(0), "1970-01-01");
        // Leap day: 2024-02-29 00:00:00 UTC = 1709164800
        assert_eq!(date_from_epoch(1_709_164_800), "2024-02-29");
        // End of day rounds correctly
        assert_eq!(date_from_epoch(1_787_443_200 + 86_399), "2026-08-23");
    }

    #[test]
    fn test_log_submission_writes_one_line() {
        let dir = std::env::temp_dir().join("jsxbridge_test_audit_write");
        let _ = std::fs::remove_dir_all(&dir);

        let id = CorrelationId::parse("1717000000000_3").unwrap();
        let response = BridgeResponse::err("boom");
        log_submission(Some(&dir), &id, 128, &response, Duration::from_millis(42));

        let mut entries = std::fs::read_dir(&dir).unwrap();
        let file = entries.next().unwrap().unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        let line = content.lines().next().unwrap();
        let row: Value = serde_json::from_str(line).unwrap();
        assert_eq!(row["id"], "1717000000000_3");
        assert_eq!(row["script_bytes"], 128);
        assert_eq!(row["success"], false);
        assert_eq!(row["error"], "boom");
        assert_eq!(row["duration_ms"], 42);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_log_submission_no_panic_on_unwritable_dir() {
        // Logging under a path that cannot be created should silently fail.
        let bogus = Path::new("/proc/jsxbridge-test-nonexistent/audit");
        let id = CorrelationId::parse("1_1").unwrap();
        log_submission(
            Some(bogus),
            &id,
            10,
            &BridgeResponse::ok(Value::Null),
            Duration::from_millis(5),
        );
        // No panic = pass
    }

    #[test]
    fn test_log_submission_disabled_without_dir() {
        let id = CorrelationId::parse("1_2").unwrap();
        log_submission(None, &id, 10, &BridgeResponse::ok(Value::Null), Duration::ZERO);
    }
}
