use crate::error::AppError;
use crate::types::PredictionRecord;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Maximum number of entries the dashboard reads back.
pub const RECENT_LIMIT: usize = 200;

/// Append-only JSON-lines log of served predictions. Records are never
/// updated or deleted; each append is one whole line under the lock so
/// concurrent requests cannot interleave a record.
pub struct PredictionLog {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    /// Append one record as a single line. Callers treat failures as
    /// non-fatal; the response path never depends on this succeeding.
    pub async fn append(&self, record: &PredictionRecord) -> Result<(), AppError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.append_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Read back up to `limit` of the most recent entries, oldest first.
    /// Lines that fail to parse are skipped; a missing log is empty.
    pub async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = tokio::fs::read_to_string(&self.path).await?;
        let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(limit);
        Ok(lines[start..]
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}
