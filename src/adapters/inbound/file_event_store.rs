use crate::common::{EventEnvelope, EventStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Mission journal on disk.
///
/// One JSON Lines file per mission id (`<mission>.jsonl`) under `base_path`.
/// Files are only ever appended to.
pub struct FileEventStore {
    base_path: PathBuf,
}

impl FileEventStore {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn mission_file(&self, mission_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", mission_id))
    }

    async fn ensure_base_dir(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("Failed to create journal directory: {}", e))
    }

    async fn read_file(path: &Path) -> Result<Vec<EventEnvelope>, String> {
        let file = File::open(path)
            .await
            .map_err(|e| format!("Failed to open journal file {}: {}", path.display(), e))?;

        let mut lines = BufReader::new(file).lines();
        let mut events = Vec::new();
        let mut line_number = 0usize;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("Failed to read line: {}", e))?
        {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let event: EventEnvelope = serde_json::from_str(&line).map_err(|e| {
                format!(
                    "Failed to deserialize event at {}:{}: {}",
                    path.display(),
                    line_number,
                    e
                )
            })?;
            events.push(event);
        }

        Ok(events)
    }
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn append_events(
        &self,
        aggregate_id: &str,
        events: Vec<EventEnvelope>,
    ) -> Result<(), String> {
        self.ensure_base_dir().await?;

        let file_path = self.mission_file(aggregate_id);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await
            .map_err(|e| format!("Failed to open journal file {}: {}", file_path.display(), e))?;

        let mut buffer = String::new();
        for event in events {
            let json_line = serde_json::to_string(&event)
                .map_err(|e| format!("Failed to serialize event: {}", e))?;
            buffer.push_str(&json_line);
            buffer.push('\n');
        }

        file.write_all(buffer.as_bytes())
            .await
            .map_err(|e| format!("Failed to write events: {}", e))?;
        file.flush()
            .await
            .map_err(|e| format!("Failed to flush journal file: {}", e))?;

        Ok(())
    }

    async fn load_events(&self, aggregate_id: &str) -> Result<Vec<EventEnvelope>, String> {
        let file_path = self.mission_file(aggregate_id);
        if !tokio::fs::try_exists(&file_path).await.unwrap_or(false) {
            return Ok(vec![]);
        }
        Self::read_file(&file_path).await
    }

    async fn load_events_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        self.ensure_base_dir().await?;

        let mut dir = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(|e| format!("Failed to read journal directory: {}", e))?;

        let mut all_events = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| format!("Failed to read directory entry: {}", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
                continue;
            }
            all_events.extend(
                Self::read_file(&path)
                    .await?
                    .into_iter()
                    .filter(|e| e.event_type == event_type)
                    .filter(|e| from_timestamp.map_or(true, |from| e.occurred_at >= from)),
            );
        }

        all_events.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        Ok(all_events)
    }
}
