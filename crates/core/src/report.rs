//! Run bookkeeping: error log, reprocess queue and scene exclusion list

use crate::error::Result;
use chrono::Local;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only CSV log of per-scene processing errors.
///
/// The header row is written when the file is created; subsequent runs
/// keep appending.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one failure with the current local timestamp
    pub fn record(&self, file: &str, error: &str) -> Result<()> {
        let new = !self.path.exists();
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if new {
            writeln!(out, "Time, File, Error")?;
        }
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(out, "{stamp}, {file}, {error}")?;
        debug!(file, error, "failure recorded");
        Ok(())
    }
}

/// Scenes whose cloud mask was missing, queued for reprocessing
#[derive(Debug, Clone)]
pub struct ReprocessQueue {
    path: PathBuf,
}

impl ReprocessQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn push(&self, scene: &str) -> Result<()> {
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(out, "{scene}")?;
        Ok(())
    }
}

/// Read a scene exclusion list: one 7-character year+day-of-year code
/// per line. Shorter lines are ignored.
pub fn read_bad_list<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| line.len() >= 7)
        .map(|line| line[..7].to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_error_log_header_once() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.csv"));

        log.record("LT50230241995182AAA02", "no cloud mask").unwrap();
        log.record("LT50230241996101AAA02", "read failed").unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Time, File, Error");
        assert!(lines[1].ends_with("LT50230241995182AAA02, no cloud mask"));
    }

    #[test]
    fn test_reprocess_queue_appends() {
        let dir = TempDir::new().unwrap();
        let queue = ReprocessQueue::new(dir.path().join("reprocess.txt"));
        queue.push("LT50230241995182AAA02").unwrap();
        queue.push("LE70230242001150EDC00").unwrap();

        let text = std::fs::read_to_string(dir.path().join("reprocess.txt")).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_bad_list_skips_short_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("badlist.txt");
        std::fs::write(&path, "1995182\n\nxx\n2001150 cloudy\n").unwrap();

        let bad = read_bad_list(&path).unwrap();
        assert_eq!(bad.len(), 2);
        assert!(bad.contains("1995182"));
        assert!(bad.contains("2001150"));
    }
}
