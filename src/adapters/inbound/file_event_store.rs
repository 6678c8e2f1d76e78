use crate::common::{EventEnvelope, EventStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Simulation journal on disk: one JSON Lines file per run, named `<run_id>.jsonl`.
pub struct FileEventStore {
    base_path: PathBuf,
}

impl FileEventStore {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn stream_path(&self, aggregate_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", aggregate_id))
    }

    async fn ensure_base_dir(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("Failed to create journal directory {}: {}", self.base_path.display(), e))
    }
}

async fn read_stream(path: &Path) -> Result<Vec<EventEnvelope>, String> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)
        .await
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let mut lines = BufReader::new(file).lines();
    let mut events = Vec::new();
    let mut line_number = 0usize;
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?
    {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: EventEnvelope = serde_json::from_str(&line)
            .map_err(|e| format!("Bad event at {}:{}: {}", path.display(), line_number, e))?;
        events.push(event);
    }
    Ok(events)
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: u64,
        events: Vec<EventEnvelope>,
    ) -> Result<(), String> {
        self.ensure_base_dir().await?;
        let path = self.stream_path(aggregate_id);

        let current_version = read_stream(&path).await?.len() as u64;
        if current_version != expected_version {
            return Err(format!(
                "Version mismatch for {}: expected {}, got {}",
                aggregate_id, expected_version, current_version
            ));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

        for event in events {
            let mut line = serde_json::to_string(&event).map_err(|e| format!("Failed to serialize event: {}", e))?;
            line.push('\n');
            file.write_all(line.as_bytes())
                .await
                .map_err(|e| format!("Failed to write event: {}", e))?;
        }

        file.flush().await.map_err(|e| format!("Failed to flush {}: {}", path.display(), e))
    }

    async fn load_events(&self, aggregate_id: &str, from_version: u64) -> Result<Vec<EventEnvelope>, String> {
        let events = read_stream(&self.stream_path(aggregate_id)).await?;
        Ok(events.into_iter().skip(from_version as usize).collect())
    }

    async fn load_events_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        self.ensure_base_dir().await?;

        let mut matching = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(|e| format!("Failed to read journal directory: {}", e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| format!("Failed to read journal directory entry: {}", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
                continue;
            }
            matching.extend(
                read_stream(&path)
                    .await?
                    .into_iter()
                    .filter(|e| e.event_type == event_type)
                    .filter(|e| from_timestamp.map_or(true, |from| e.occurred_at >= from)),
            );
        }

        matching.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        Ok(matching)
    }
}
