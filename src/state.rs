//! Processed-delivery log.
//!
//! A small JSON file in the download directory listing the message keys
//! that were already audited, so a polling run never replies twice.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::StateError;

pub const PROCESSED_FILE: &str = "processed.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProcessedFile {
    #[serde(default)]
    processed: BTreeSet<String>,
}

/// File-backed set of processed delivery keys.
#[derive(Debug)]
pub struct ProcessedLog {
    path: PathBuf,
    entries: ProcessedFile,
}

impl ProcessedLog {
    /// Load the log from `dir`, starting empty if the file does not exist.
    pub async fn load(dir: &Path) -> Result<Self, StateError> {
        let path = dir.join(PROCESSED_FILE);
        let entries = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProcessedFile::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = entries.processed.len(), "Processed log loaded");
        Ok(Self { path, entries })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.processed.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.processed.is_empty()
    }

    /// Remember `key` and persist the log.
    pub async fn record(&mut self, key: &str) -> Result<(), StateError> {
        if !self.entries.processed.insert(key.to_string()) {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write-then-rename so a crash never leaves a truncated log.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.entries)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ProcessedLog::load(dir.path()).await.unwrap();
        assert!(log.is_empty());
        assert!(!log.contains("anything"));
    }

    #[tokio::test]
    async fn recorded_keys_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ProcessedLog::load(dir.path()).await.unwrap();
        log.record("delivery-1@example.com").await.unwrap();
        log.record("uid-7").await.unwrap();
        log.record("uid-7").await.unwrap();

        let reloaded = ProcessedLog::load(dir.path()).await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("delivery-1@example.com"));
        assert!(reloaded.contains("uid-7"));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROCESSED_FILE), b"{ not json").unwrap();
        let err = ProcessedLog::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, StateError::Corrupt(_)));
    }

    #[tokio::test]
    async fn record_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("audit").join("inbox");
        let mut log = ProcessedLog::load(&nested).await.unwrap();
        log.record("k").await.unwrap();
        assert!(nested.join(PROCESSED_FILE).exists());
    }
}
