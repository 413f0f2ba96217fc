//! Run reports and the bounded run history.

use crate::core::error::DeployCheckError;
use crate::core::time;
use crate::core::verdict::{Status, Verdict};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const HISTORY_FILE: &str = "deploy-check-history.json";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let count = |s: Status| verdicts.iter().filter(|v| v.status == s).count();
        Summary {
            total: verdicts.len(),
            passed: count(Status::Pass),
            warned: count(Status::Warn),
            failed: count(Status::Fail),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Report {
    pub run_id: String,
    pub generated_at: String,
    pub status: Status,
    pub exit_code: i32,
    pub cancelled: bool,
    pub summary: Summary,
    /// See [`fingerprint`]; equal for runs over an unchanged tree.
    pub fingerprint: String,
    pub verdicts: Vec<Verdict>,
}

impl Report {
    pub fn from_verdicts(verdicts: Vec<Verdict>, cancelled: bool) -> Self {
        let summary = Summary::from_verdicts(&verdicts);
        let status = if summary.failed > 0 || cancelled {
            Status::Fail
        } else if summary.warned > 0 {
            Status::Warn
        } else {
            Status::Pass
        };
        Report {
            run_id: time::new_run_id(),
            generated_at: time::now_epoch_z(),
            status,
            exit_code: if status == Status::Fail { 1 } else { 0 },
            cancelled,
            summary,
            fingerprint: fingerprint(&verdicts),
            verdicts,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn failed_checks(&self) -> Vec<&str> {
        self.verdicts
            .iter()
            .filter(|v| v.is_fail())
            .map(|v| v.check.as_str())
            .collect()
    }
}

/// SHA-256 over each verdict's check, status and messages.
///
/// Payloads carry run-specific detail such as timings and are left out.
pub fn fingerprint(verdicts: &[Verdict]) -> String {
    let mut hasher = Sha256::new();
    for v in verdicts {
        hasher.update(v.check.as_bytes());
        hasher.update(b"\0");
        hasher.update(v.status.label().as_bytes());
        for message in &v.messages {
            hasher.update(b"\0");
            hasher.update(message.as_bytes());
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Write `value` as pretty JSON, replacing `path` atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DeployCheckError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Rolling history of run reports, newest last, bounded to `limit` entries.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
    limit: usize,
}

impl History {
    pub fn new(report_dir: &Path, limit: usize) -> Self {
        History {
            path: report_dir.join(HISTORY_FILE),
            limit: limit.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Report>, DeployCheckError> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| DeployCheckError::parse(&self.path, e))
    }

    /// Where an unreadable history file is moved before starting afresh.
    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }

    /// Append `report`, evicting the oldest entries beyond the limit.
    ///
    /// A history file that no longer parses is moved to [`History::backup_path`]
    /// and a new history is started.
    pub fn append(&self, report: &Report) -> Result<Vec<Report>, DeployCheckError> {
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(DeployCheckError::ParseError { .. }) => {
                fs::rename(&self.path, self.backup_path())?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.push(report.clone());
        if entries.len() > self.limit {
            let excess = entries.len() - self.limit;
            entries.drain(..excess);
        }
        write_json(&self.path, &entries)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn verdicts() -> Vec<Verdict> {
        vec![
            Verdict::pass("a", "A", "ok"),
            Verdict::warn("b", "B", vec!["careful".to_string()]),
        ]
    }

    #[test]
    fn warn_only_run_succeeds() {
        let report = Report::from_verdicts(verdicts(), false);
        assert_eq!(report.status, Status::Warn);
        assert_eq!(report.exit_code, 0);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.warned, 1);
    }

    #[test]
    fn any_fail_or_cancel_fails_run() {
        let mut v = verdicts();
        v.push(Verdict::fail("c", "C", vec!["broken".to_string()]));
        let report = Report::from_verdicts(v, false);
        assert_eq!(report.exit_code, 1);
        assert_eq!(report.failed_checks(), vec!["c"]);

        let cancelled = Report::from_verdicts(verdicts(), true);
        assert_eq!(cancelled.status, Status::Fail);
        assert!(!cancelled.success());
    }

    #[test]
    fn fingerprint_ignores_payload() {
        let a = vec![Verdict::pass("build", "Build", "done")
            .with_payload(serde_json::json!({"elapsedSecs": 12.5}))];
        let b = vec![Verdict::pass("build", "Build", "done")
            .with_payload(serde_json::json!({"elapsedSecs": 48.1}))];
        assert_eq!(fingerprint(&a), fingerprint(&b));
        let c = vec![Verdict::warn("build", "Build", vec!["done".to_string()])];
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn fingerprint_ignores_run_identity() {
        let a = Report::from_verdicts(verdicts(), false);
        let b = Report::from_verdicts(verdicts(), false);
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn history_is_bounded_and_keeps_newest() {
        let tmp = tempdir().unwrap();
        let history = History::new(tmp.path(), 3);
        let mut ids = Vec::new();
        for _ in 0..5 {
            let report = Report::from_verdicts(verdicts(), false);
            ids.push(report.run_id.clone());
            history.append(&report).unwrap();
        }
        let entries = history.load().unwrap();
        assert_eq!(entries.len(), 3);
        let kept: Vec<_> = entries.iter().map(|r| r.run_id.clone()).collect();
        assert_eq!(kept, ids[2..].to_vec());
    }

    #[test]
    fn corrupt_history_is_parse_error() {
        let tmp = tempdir().unwrap();
        let history = History::new(tmp.path(), 20);
        fs::write(history.path(), "{not json").unwrap();
        assert!(matches!(
            history.load().unwrap_err(),
            DeployCheckError::ParseError { .. }
        ));
    }

    #[test]
    fn corrupt_history_is_set_aside() {
        let tmp = tempdir().unwrap();
        let history = History::new(tmp.path(), 5);
        fs::write(history.path(), "{broken").unwrap();

        let entries = history.append(&Report::from_verdicts(verdicts(), false)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read_to_string(history.backup_path()).unwrap(), "{broken");
        assert_eq!(history.load().unwrap().len(), 1);
    }
}
