use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::error::PersistenceError;
use crate::models::{AchievementRecord, AttemptResult};

/// Append-only log of graded attempts and earned achievements.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_attempt(&self, attempt: &AttemptResult) -> Result<(), PersistenceError>;

    async fn append_achievements(
        &self,
        records: &[AchievementRecord],
    ) -> Result<(), PersistenceError>;

    /// Appends an attempt together with the achievements it earned.
    /// Either both become visible or neither does. Re-appending an attempt id is a no-op.
    async fn append_completion(
        &self,
        attempt: &AttemptResult,
        records: &[AchievementRecord],
    ) -> Result<(), PersistenceError>;

    async fn all_attempts(&self) -> Result<Vec<AttemptResult>, PersistenceError>;

    async fn all_achievements(&self) -> Result<Vec<AchievementRecord>, PersistenceError>;
}

#[derive(Debug, Default, Clone)]
struct HistoryLog {
    attempts: Vec<AttemptResult>,
    achievements: Vec<AchievementRecord>,
}

impl HistoryLog {
    fn contains_attempt(&self, attempt: &AttemptResult) -> bool {
        self.attempts.iter().any(|existing| existing.id == attempt.id)
    }

    fn has_award(&self, record: &AchievementRecord) -> bool {
        self.achievements
            .iter()
            .any(|existing| existing.is_same_award(record))
    }

    /// Records in `records` that grant an award not already held, first occurrence wins.
    fn new_records<'a>(&self, records: &'a [AchievementRecord]) -> Vec<&'a AchievementRecord> {
        let mut fresh: Vec<&AchievementRecord> = Vec::with_capacity(records.len());
        for record in records {
            let seen = fresh.iter().any(|kept| kept.is_same_award(record));
            if !seen && !self.has_award(record) {
                fresh.push(record);
            }
        }
        fresh
    }

    fn push_records(&mut self, records: Vec<AchievementRecord>) {
        for record in records {
            if !self.has_award(&record) {
                self.achievements.push(record);
            }
        }
    }

    /// Folds one entry in. Entries repeating a known attempt or award are dropped,
    /// so a line written twice by a retried append loads once.
    fn apply(&mut self, entry: LogEntry) {
        match entry {
            LogEntry::Attempt { attempt } => {
                if !self.contains_attempt(&attempt) {
                    self.attempts.push(attempt);
                }
            }
            LogEntry::Achievements { records } => self.push_records(records),
            LogEntry::Completion {
                attempt,
                achievements,
            } => {
                if self.contains_attempt(&attempt) {
                    return;
                }
                self.attempts.push(attempt);
                self.push_records(achievements);
            }
        }
    }
}

/// One line of the JSONL history file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
enum LogEntry {
    Attempt {
        attempt: AttemptResult,
    },
    Achievements {
        records: Vec<AchievementRecord>,
    },
    Completion {
        attempt: AttemptResult,
        achievements: Vec<AchievementRecord>,
    },
}

/// Process-local store; contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    log: RwLock<HistoryLog>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(attempts: Vec<AttemptResult>, achievements: Vec<AchievementRecord>) -> Self {
        Self {
            log: RwLock::new(HistoryLog {
                attempts,
                achievements,
            }),
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append_attempt(&self, attempt: &AttemptResult) -> Result<(), PersistenceError> {
        let mut log = self.log.write().await;
        if !log.contains_attempt(attempt) {
            log.attempts.push(attempt.clone());
        }
        Ok(())
    }

    async fn append_achievements(
        &self,
        records: &[AchievementRecord],
    ) -> Result<(), PersistenceError> {
        let mut log = self.log.write().await;
        let fresh: Vec<AchievementRecord> = log.new_records(records).into_iter().cloned().collect();
        log.achievements.extend(fresh);
        Ok(())
    }

    async fn append_completion(
        &self,
        attempt: &AttemptResult,
        records: &[AchievementRecord],
    ) -> Result<(), PersistenceError> {
        let mut log = self.log.write().await;
        if log.contains_attempt(attempt) {
            tracing::debug!("Attempt {} already stored, skipping", attempt.id);
            return Ok(());
        }
        log.attempts.push(attempt.clone());
        log.push_records(records.to_vec());
        Ok(())
    }

    async fn all_attempts(&self) -> Result<Vec<AttemptResult>, PersistenceError> {
        Ok(self.log.read().await.attempts.clone())
    }

    async fn all_achievements(&self) -> Result<Vec<AchievementRecord>, PersistenceError> {
        Ok(self.log.read().await.achievements.clone())
    }
}

/// Durable store writing one JSON object per line.
///
/// Each append is a single write of one complete line followed by `sync_data`; a failed
/// append is truncated away. A trailing line without a newline is an interrupted write
/// and is cut off when the store is opened.
pub struct JsonlHistoryStore {
    path: PathBuf,
    log: Mutex<HistoryLog>,
}

impl JsonlHistoryStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let log = match tokio::fs::read(&path).await {
            Ok(raw) => {
                let (log, complete_len) = Self::parse(&raw)?;
                if complete_len < raw.len() {
                    tracing::warn!(
                        "Discarding {} bytes of interrupted history write in {}",
                        raw.len() - complete_len,
                        path.display()
                    );
                    Self::truncate(&path, complete_len as u64).await?;
                }
                log
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HistoryLog::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "History store opened at {} ({} attempts, {} achievements)",
            path.display(),
            log.attempts.len(),
            log.achievements.len()
        );

        Ok(Self {
            path,
            log: Mutex::new(log),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses every newline-terminated line. Returns the log and the byte length of
    /// the complete lines.
    fn parse(raw: &[u8]) -> Result<(HistoryLog, usize), PersistenceError> {
        let complete_len = raw
            .iter()
            .rposition(|byte| *byte == b'\n')
            .map_or(0, |end| end + 1);
        let complete =
            std::str::from_utf8(&raw[..complete_len]).map_err(|e| PersistenceError::Corrupt {
                line: raw[..e.valid_up_to()]
                    .iter()
                    .filter(|byte| **byte == b'\n')
                    .count()
                    + 1,
                reason: e.to_string(),
            })?;

        let mut log = HistoryLog::default();
        for (number, line) in complete.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: LogEntry =
                serde_json::from_str(line).map_err(|e| PersistenceError::Corrupt {
                    line: number + 1,
                    reason: e.to_string(),
                })?;
            log.apply(entry);
        }

        Ok((log, complete_len))
    }

    async fn truncate(path: &Path, len: u64) -> Result<(), PersistenceError> {
        let file = tokio::fs::OpenOptions::new().write(true).open(path).await?;
        file.set_len(len).await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn write_entry(&self, entry: &LogEntry) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let start = file.metadata().await?.len();

        if let Err(e) = Self::append_line(&mut file, line.as_bytes()).await {
            match file.set_len(start).await {
                Ok(()) => tracing::warn!(
                    error = %e,
                    "History append failed, rolled back to {} bytes",
                    start
                ),
                Err(rollback) => tracing::error!(
                    error = %e,
                    rollback_error = %rollback,
                    "History append failed and could not be rolled back"
                ),
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn append_line(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
        file.write_all(bytes).await?;
        file.sync_data().await
    }
}

#[async_trait]
impl HistoryStore for JsonlHistoryStore {
    async fn append_attempt(&self, attempt: &AttemptResult) -> Result<(), PersistenceError> {
        let mut log = self.log.lock().await;
        if log.contains_attempt(attempt) {
            return Ok(());
        }
        let entry = LogEntry::Attempt {
            attempt: attempt.clone(),
        };
        self.write_entry(&entry).await?;
        log.apply(entry);
        Ok(())
    }

    async fn append_achievements(
        &self,
        records: &[AchievementRecord],
    ) -> Result<(), PersistenceError> {
        let mut log = self.log.lock().await;
        let fresh: Vec<AchievementRecord> = log.new_records(records).into_iter().cloned().collect();
        if fresh.is_empty() {
            return Ok(());
        }
        let entry = LogEntry::Achievements { records: fresh };
        self.write_entry(&entry).await?;
        log.apply(entry);
        Ok(())
    }

    async fn append_completion(
        &self,
        attempt: &AttemptResult,
        records: &[AchievementRecord],
    ) -> Result<(), PersistenceError> {
        let mut log = self.log.lock().await;
        if log.contains_attempt(attempt) {
            tracing::debug!("Attempt {} already stored, skipping", attempt.id);
            return Ok(());
        }
        let entry = LogEntry::Completion {
            attempt: attempt.clone(),
            achievements: log.new_records(records).into_iter().cloned().collect(),
        };
        self.write_entry(&entry).await?;
        log.apply(entry);

        tracing::debug!(
            "Persisted attempt {} with {} achievements to {}",
            attempt.id,
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn all_attempts(&self) -> Result<Vec<AttemptResult>, PersistenceError> {
        Ok(self.log.lock().await.attempts.clone())
    }

    async fn all_achievements(&self) -> Result<Vec<AchievementRecord>, PersistenceError> {
        Ok(self.log.lock().await.achievements.clone())
    }
}
