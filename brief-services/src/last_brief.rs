//! Persistence of the last successful brief timestamp
//!
//! The digest window starts where the previous brief left off, so the
//! timestamp survives restarts on disk. Writes go through a temp file and
//! rename so a crash mid-write never leaves a truncated file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use brief_core::{BriefError, BriefResult};

/// How far back to look when no stored timestamp is usable
const DEFAULT_LOOKBACK_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct LastBriefStore {
    path: PathBuf,
}

impl LastBriefStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored timestamp, falling back to 24h ago when the file is
    /// missing or unparseable.
    pub fn read(&self) -> DateTime<Utc> {
        let fallback = Utc::now() - Duration::hours(DEFAULT_LOOKBACK_HOURS);
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return fallback,
        };
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "unreadable last-brief timestamp, using fallback");
                fallback
            }
        }
    }

    /// Atomically persist `ts` via temp file + rename
    pub fn write(&self, ts: DateTime<Utc>) -> BriefResult<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| BriefError::internal(format!("temp file in {}: {e}", dir.display())))?;
        tmp.write_all(ts.to_rfc3339().as_bytes())
            .map_err(|e| BriefError::internal(format!("write last-brief timestamp: {e}")))?;
        tmp.persist(&self.path)
            .map_err(|e| BriefError::internal(format!("persist {}: {e}", self.path.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_24h() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastBriefStore::new(dir.path().join("last_brief.txt"));
        let ts = store.read();
        let age = Utc::now() - ts;
        assert!(age >= Duration::hours(23) && age <= Duration::hours(25));
    }

    #[test]
    fn round_trips_a_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastBriefStore::new(dir.path().join("last_brief.txt"));
        let ts = Utc::now() - Duration::hours(3);
        store.write(ts).unwrap();
        let got = store.read();
        assert!((got - ts).num_seconds().abs() <= 1);
    }

    #[test]
    fn garbage_contents_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_brief.txt");
        fs::write(&path, "not a timestamp").unwrap();
        let store = LastBriefStore::new(&path);
        let age = Utc::now() - store.read();
        assert!(age >= Duration::hours(23) && age <= Duration::hours(25));
    }

    #[test]
    fn write_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastBriefStore::new(dir.path().join("last_brief.txt"));
        let first = Utc::now() - Duration::hours(10);
        let second = Utc::now() - Duration::hours(1);
        store.write(first).unwrap();
        store.write(second).unwrap();
        assert!((store.read() - second).num_seconds().abs() <= 1);
    }
}
