use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flagstatus_common::{validate_json, BadgeSummary, StatusRecord, Validation};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize document for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One published location: a status document plus its badge next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sink {
    status_path: PathBuf,
    badge_path: PathBuf,
}

impl Sink {
    /// Badge goes beside the status file as `<stem>.badge.json`.
    pub fn new(status_path: impl Into<PathBuf>) -> Self {
        let status_path = status_path.into();
        let stem = status_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "flag_status".to_string());
        let badge_path = status_path.with_file_name(format!("{stem}.badge.json"));
        Self {
            status_path,
            badge_path,
        }
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    pub fn badge_path(&self) -> &Path {
        &self.badge_path
    }

    pub fn write(&self, record: &StatusRecord, badge: &BadgeSummary) -> Result<(), SinkError> {
        write_json_atomic(&self.status_path, record)?;
        write_json_atomic(&self.badge_path, badge)?;
        info!(
            path = %self.status_path.display(),
            status = %record.status,
            source = %record.source,
            "Wrote status"
        );
        Ok(())
    }

    /// The record this sink currently holds, if it is valid and was actually
    /// observed. Failure records and the hardcoded default are skipped.
    pub fn read_last_known(&self) -> Option<StatusRecord> {
        let raw = match fs::read_to_string(&self.status_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.status_path.display(), "No previous status");
                return None;
            }
            Err(e) => {
                warn!(path = %self.status_path.display(), error = %e, "Could not read previous status");
                return None;
            }
        };

        match validate_json(&raw) {
            Validation::Valid(record) if record.is_failure() => {
                info!(path = %self.status_path.display(), "Previous status was a failure record, ignoring");
                None
            }
            Validation::Valid(record) if record.is_default() => {
                debug!(path = %self.status_path.display(), "Previous status was the hardcoded default, ignoring");
                None
            }
            Validation::Valid(record) => Some(record),
            Validation::Invalid(reason) => {
                warn!(path = %self.status_path.display(), reason = %reason, "Previous status is invalid, ignoring");
                None
            }
        }
    }
}

/// Canonical on-disk form: two-space pretty JSON with a trailing newline.
pub fn to_canonical_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Write via a temp file in the target directory, then rename over the target,
/// so readers only ever see a complete document.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), SinkError> {
    let json = to_canonical_json(value).map_err(|source| SinkError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagstatus_common::{FlagStatus, DEFAULT_REASON};

    #[test]
    fn badge_path_sits_next_to_status_file() {
        let sink = Sink::new("docs/flag_status.json");
        assert_eq!(sink.badge_path(), Path::new("docs/flag_status.badge.json"));

        let sink = Sink::new("status");
        assert_eq!(sink.badge_path(), Path::new("status.badge.json"));
    }

    #[test]
    fn write_creates_directories_and_both_documents() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("nested/deeper/flag_status.json"));
        let record = StatusRecord::default_status(DEFAULT_REASON);

        sink.write(&record, &BadgeSummary::unknown()).unwrap();

        let status = fs::read_to_string(sink.status_path()).unwrap();
        assert!(status.ends_with("}\n"));
        assert!(status.contains("\"source\": \"Default\""));
        let badge: BadgeSummary =
            serde_json::from_str(&fs::read_to_string(sink.badge_path()).unwrap()).unwrap();
        assert_eq!(badge, BadgeSummary::unknown());
    }

    #[test]
    fn written_record_reads_back_as_last_known() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("flag_status.json"));
        let mut record = StatusRecord::default_status("No notices");
        record.status = FlagStatus::HalfStaff;
        record.source = "HalfStaff.org".into();

        sink.write(&record, &BadgeSummary::for_status(record.status)).unwrap();

        assert_eq!(sink.read_last_known(), Some(record));
    }

    #[test]
    fn failure_records_are_not_last_known() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("flag_status.json"));
        let failed = StatusRecord::failure(FlagStatus::FullStaff, "disk full");

        sink.write(&failed, &BadgeSummary::unknown()).unwrap();

        assert!(sink.read_last_known().is_none());
    }

    #[test]
    fn default_records_are_not_last_known() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("flag_status.json"));

        sink.write(&StatusRecord::default_status(DEFAULT_REASON), &BadgeSummary::unknown())
            .unwrap();

        assert!(sink.read_last_known().is_none());
    }

    #[test]
    fn corrupt_or_missing_files_are_not_last_known() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("flag_status.json"));
        assert!(sink.read_last_known().is_none());

        fs::write(sink.status_path(), "{\"status\": \"full-staff\"").unwrap();
        assert!(sink.read_last_known().is_none());
    }
}
