use crate::domain::NormalizedProduct;
use crate::error::Result;
use crate::pipeline::processing::scoring::{Band, Driver, ScoreResult};
use crate::types::{InputKind, RawProductRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;
use uuid::Uuid;

/// One completed lookup, as kept in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub input_kind: InputKind,
    pub query: String,
    pub raw: RawProductRecord,
    pub normalized: NormalizedProduct,
    pub score: u8,
    pub band: Band,
    pub drivers: Vec<Driver>,
}

impl HistoryEntry {
    pub fn new(
        input_kind: InputKind,
        query: &str,
        raw: RawProductRecord,
        normalized: NormalizedProduct,
        result: ScoreResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            input_kind,
            query: query.to_string(),
            raw,
            normalized,
            score: result.score,
            band: result.band,
            drivers: result.drivers,
        }
    }
}

/// Storage trait for lookup history
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: &HistoryEntry) -> Result<()>;

    /// The newest `limit` entries, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>>;
}

fn newest_first(entries: &[HistoryEntry], limit: usize) -> Vec<HistoryEntry> {
    entries.iter().rev().take(limit).cloned().collect()
}

/// In-memory history for development/testing
#[derive(Default)]
pub struct InMemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.push(entry.clone());
        debug!("Recorded history entry {}", entry.id);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(newest_first(&entries, limit))
    }
}

/// History persisted as a pretty-printed JSON array
pub struct JsonFileHistory {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: AsyncMutex<()>,
}

impl JsonFileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<HistoryEntry>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistory {
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.push(entry.clone());
        self.save(&entries).await?;
        debug!("Saved history entry {} to {}", entry.id, self.path.display());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let entries = self.load().await?;
        Ok(newest_first(&entries, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::scoring::score;

    fn entry(query: &str) -> HistoryEntry {
        let product = NormalizedProduct::unknown();
        let result = score(&product);
        HistoryEntry::new(InputKind::Barcode, query, RawProductRecord::Absent, product, result)
    }

    #[tokio::test]
    async fn test_in_memory_recent_is_newest_first() {
        let history = InMemoryHistory::new();
        for q in ["1", "2", "3"] {
            history.append(&entry(q)).await.unwrap();
        }

        let recent = history.recent(2).await.unwrap();
        let queries: Vec<&str> = recent.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["3", "2"]);
    }

    #[tokio::test]
    async fn test_json_file_history_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let history = JsonFileHistory::new(&path);
        assert!(history.recent(10).await.unwrap().is_empty());

        let first = entry("3017620429484");
        history.append(&first).await.unwrap();
        history.append(&entry("5000112548167")).await.unwrap();

        let reopened = JsonFileHistory::new(&path);
        let recent = reopened.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1], first);
        assert_eq!(recent[0].query, "5000112548167");
    }

    #[tokio::test]
    async fn test_corrupt_history_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();

        let history = JsonFileHistory::new(&path);
        assert!(history.recent(1).await.is_err());
    }
}
