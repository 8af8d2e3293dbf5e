use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::error::{EngineError, Result};
use crate::models::{RemovalRecord, RemovalSummary};

/// Append-only, per-account removal log.
///
/// Every line is written with a single `write_all` and flushed before the call
/// returns, so a process killed between records leaves only whole lines.
pub struct AuditLog {
    path: PathBuf,
    file: File,
}

/// `RemovedLicenses_<account>.log` inside `dir`.
pub fn log_path(dir: &Path, account_id: u32) -> PathBuf {
    dir.join(format!("RemovedLicenses_{}.log", account_id))
}

impl AuditLog {
    /// Open (or create) the account's log and write the `SESSION_START` header.
    pub fn open(dir: &Path, account_id: u32) -> Result<Self> {
        let path = log_path(dir, account_id);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| EngineError::Audit {
                path: path.clone(),
                source,
            })?;

        let mut log = AuditLog { path, file };
        let started = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        log.write_line(&format!("SESSION_START {}", started))?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&mut self, record: &RemovalRecord) -> Result<()> {
        self.write_line(&record.to_string())
    }

    /// Close the session: `SUMMARY` line followed by a blank separator.
    pub fn summary(&mut self, summary: &RemovalSummary) -> Result<()> {
        self.write_line(&format!(
            "SUMMARY removed={} skipped={} failed={}\n",
            summary.removed, summary.skipped, summary.failed
        ))
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        self.file
            .write_all(buf.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|source| EngineError::Audit {
                path: self.path.clone(),
                source,
            })
    }
}
