use crate::common::{EventEnvelope, EventStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory journal store, used when no journal directory is configured
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<String, Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Number of missions with at least one event.
    pub async fn mission_count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append_events(
        &self,
        aggregate_id: &str,
        events: Vec<EventEnvelope>,
    ) -> Result<(), String> {
        if let Some(foreign) = events.iter().find(|e| e.aggregate_id != aggregate_id) {
            return Err(format!(
                "Event {} belongs to mission {}, not {}",
                foreign.event_id, foreign.aggregate_id, aggregate_id
            ));
        }

        let mut store = self.events.write().await;
        store
            .entry(aggregate_id.to_string())
            .or_insert_with(Vec::new)
            .extend(events);
        Ok(())
    }

    async fn load_events(&self, aggregate_id: &str) -> Result<Vec<EventEnvelope>, String> {
        let store = self.events.read().await;
        Ok(store.get(aggregate_id).cloned().unwrap_or_default())
    }

    async fn load_events_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        let store = self.events.read().await;

        let mut filtered_events: Vec<EventEnvelope> = store
            .values()
            .flatten()
            .filter(|e| e.event_type == event_type)
            .filter(|e| from_timestamp.map_or(true, |from| e.occurred_at >= from))
            .cloned()
            .collect();

        filtered_events.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        Ok(filtered_events)
    }
}
