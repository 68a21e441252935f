//! Local filesystem sink.
//!
//! Appends one `{"key": …, "value": …}` JSON object per line. A record
//! counts as acknowledged once the file has been flushed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{Sink, SinkRecord};

/// JSON lines file sink.
#[derive(Debug, Clone)]
pub struct LocalSink {
    path: PathBuf,
}

impl LocalSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Sink for LocalSink {
    async fn send_many(&self, records: &[SinkRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        self.ensure_dir().await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut sent = 0;
        for record in records {
            if record.key.trim().is_empty() {
                return Err(AppError::sink(format!(
                    "record {} has an empty key",
                    sent
                )));
            }

            let mut line = serde_json::to_vec(record)?;
            line.push(b'\n');
            file.write_all(&line).await?;
            file.flush().await?;

            log::debug!("Published: path={} key={}", self.path.display(), record.key);
            sent += 1;
        }

        file.sync_all().await?;
        log::info!("Published {} records to {}", sent, self.path.display());
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(key: &str) -> SinkRecord {
        SinkRecord {
            key: key.to_string(),
            value: json!({ "doc_id": key, "title": "제목" }),
        }
    }

    #[tokio::test]
    async fn test_send_many_appends_lines() {
        let tmp = TempDir::new().unwrap();
        let sink = LocalSink::new(tmp.path().join("out/posts.jsonl"));

        assert_eq!(sink.send_many(&[record("5558:1"), record("5558:2")]).await.unwrap(), 2);
        assert_eq!(sink.send_many(&[record("5558:3")]).await.unwrap(), 1);

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<SinkRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], record("5558:1"));
        assert_eq!(lines[2].key, "5558:3");
    }

    #[tokio::test]
    async fn test_empty_key_fails_batch() {
        let tmp = TempDir::new().unwrap();
        let sink = LocalSink::new(tmp.path().join("posts.jsonl"));

        let err = sink
            .send_many(&[record("5558:1"), record("  ")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Sink(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let sink = LocalSink::new(tmp.path().join("posts.jsonl"));

        assert_eq!(sink.send_many(&[]).await.unwrap(), 0);
        assert!(!sink.path().exists());
    }
}
