//! Persistent error log.
//!
//! Errors are values; this module is the collaborator that writes them to
//! disk. Each record lands in its own file named after the UTC time it was
//! written: `<dir>/<YYYY-MM-DD>-Time-<SS>sec+<MM>min+<HH>hrs.log`. When two
//! records fall in the same second the later one gets a `-1`, `-2`, ...
//! suffix before the extension, so no record overwrites another.
//!
//! Logging never fails the caller: directory or write errors are reported
//! through `tracing` and the record is dropped.

use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use domain::{DomainError, ErrorReport, RunMode};

/// Upper bound on same-second suffixes before giving up.
const MAX_SAME_SECOND_RECORDS: u32 = 1000;

/// Sink accepting domain errors for persistence.
#[async_trait]
pub trait ErrorLog: Send + Sync {
    /// Persist one error. Returns where it was written, or `None` if the
    /// record could not be stored.
    async fn record(&self, error: &DomainError) -> Option<PathBuf>;
}

/// JSON body of a log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub report: ErrorReport,
}

/// Writes one JSON file per error under a directory.
#[derive(Debug, Clone)]
pub struct FileErrorLog {
    dir: PathBuf,
    mode: RunMode,
}

impl FileErrorLog {
    pub fn new(dir: impl Into<PathBuf>, mode: RunMode) -> Self {
        Self {
            dir: dir.into(),
            mode,
        }
    }

    /// Base file name (without extension) for a record written at `at`.
    pub fn file_stem(at: DateTime<Utc>) -> String {
        format!(
            "{}-Time-{:02}sec+{:02}min+{:02}hrs",
            at.format("%Y-%m-%d"),
            at.second(),
            at.minute(),
            at.hour()
        )
    }

    async fn write_record(&self, record: &LogRecord) -> std::io::Result<PathBuf> {
        // create_dir_all succeeds if another writer created the directory first
        fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_vec_pretty(record)?;
        let stem = Self::file_stem(record.date);

        for attempt in 0..MAX_SAME_SECOND_RECORDS {
            let name = if attempt == 0 {
                format!("{}.log", stem)
            } else {
                format!("{}-{}.log", stem, attempt)
            };
            let path = self.dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(&body).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == IoErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(std::io::Error::new(
            IoErrorKind::AlreadyExists,
            format!("more than {} records for {}", MAX_SAME_SECOND_RECORDS, stem),
        ))
    }
}

#[async_trait]
impl ErrorLog for FileErrorLog {
    async fn record(&self, error: &DomainError) -> Option<PathBuf> {
        let record = LogRecord {
            date: Utc::now(),
            report: error.report(self.mode),
        };

        match self.write_record(&record).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(dir = %self.dir.display(), "Error writing log file: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain::ErrorKind;

    #[test]
    fn test_file_stem_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 4, 5).unwrap();
        assert_eq!(FileErrorLog::file_stem(at), "2024-03-07-Time-05sec+04min+09hrs");
    }

    #[tokio::test]
    async fn test_record_creates_dir_and_writes_json() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let log = FileErrorLog::new(&dir, RunMode::Production);

        let path = log.record(&DomainError::database("connection refused")).await.unwrap();

        assert!(path.starts_with(&dir));
        assert!(path.extension().is_some_and(|ext| ext == "log"));
        let body = std::fs::read_to_string(&path).unwrap();
        let record: LogRecord = serde_json::from_str(&body).unwrap();
        assert_eq!(record.report.kind, ErrorKind::Database);
        assert_eq!(record.report.message, "connection refused");
        assert!(record.report.stack.is_none());
    }

    #[tokio::test]
    async fn test_same_second_records_are_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let log = FileErrorLog::new(tmp.path(), RunMode::Development);

        let first = log.record(&DomainError::not_found("first")).await.unwrap();
        let second = log.record(&DomainError::not_found("second")).await.unwrap();

        assert_ne!(first, second);
        let first_body = std::fs::read_to_string(&first).unwrap();
        let second_body = std::fs::read_to_string(&second).unwrap();
        assert!(first_body.contains("\"first\""));
        assert!(second_body.contains("\"second\""));
    }

    #[tokio::test]
    async fn test_unwritable_dir_does_not_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("occupied");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let log = FileErrorLog::new(&blocker, RunMode::Development);
        assert!(log.record(&DomainError::database("boom")).await.is_none());
    }
}
