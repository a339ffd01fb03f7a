//! Daily trace log: one JSON array of [`TraceRecord`]s per UTC calendar day.
//!
//! Each write reads the day's file, appends, and rewrites the whole array. Writes
//! from one logger are serialized so concurrent requests cannot drop each other's
//! records.

use crate::error::PersistenceError;
use crate::shared::TraceRecord;
use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct TraceLogger {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl TraceLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the records for `date`: `chat-trace-YYYY-MM-DD.json`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("chat-trace-{}.json", date.format("%Y-%m-%d")))
    }

    /// Best-effort append. Failures are logged and swallowed.
    pub async fn record(&self, record: &TraceRecord) {
        if let Err(e) = self.try_record(record).await {
            tracing::warn!(
                target: "recipe::trace",
                session_id = %record.session_id,
                error = %e,
                "Failed to write trace record"
            );
        }
    }

    /// Appends `record` to the file for its own day and returns that file's path.
    pub async fn try_record(&self, record: &TraceRecord) -> Result<PathBuf, PersistenceError> {
        let path = self.path_for(record.timestamp.date_naive());
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistenceError::io(&self.dir, e))?;

        let mut records = self.load_for_append(&path).await?;
        records.push(record.clone());
        let body = serde_json::to_vec_pretty(&records)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| PersistenceError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| PersistenceError::io(&path, e))?;

        tracing::debug!(
            target: "recipe::trace",
            path = %path.display(),
            count = records.len(),
            "Trace record written"
        );
        Ok(path)
    }

    /// Reads every record for `date`. A missing file is an empty day.
    pub async fn read_day(&self, date: NaiveDate) -> Result<Vec<TraceRecord>, PersistenceError> {
        let path = self.path_for(date);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }

    /// Existing records for an append. Missing or malformed content starts a fresh list;
    /// other read failures abort so an unreadable file is not overwritten.
    async fn load_for_append(&self, path: &Path) -> Result<Vec<TraceRecord>, PersistenceError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::io(path, e)),
        };
        match serde_json::from_slice::<Vec<TraceRecord>>(&bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    target: "recipe::trace",
                    path = %path.display(),
                    error = %e,
                    "Malformed trace file, starting a new record list"
                );
                Ok(Vec::new())
            }
        }
    }
}
