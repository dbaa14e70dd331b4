use super::events::MissionEvent;
use super::projections::{MissionOverview, MissionProjectionStore, MissionStats};
use super::aggregate::MissionType;
use crate::common::{DomainEvent, EventEnvelope, EventMetadata, EventStore};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

pub type SharedMissionProjections = Arc<RwLock<MissionProjectionStore>>;

/// Appends mission events to the journal store and keeps the mission
/// projections current.
pub struct MissionJournalActor {
    event_store: Arc<dyn EventStore>,
    projection_store: SharedMissionProjections,
    event_receiver: mpsc::Receiver<MissionEvent>,
    robot_id: Option<String>,
}

impl MissionJournalActor {
    pub fn new(event_store: Arc<dyn EventStore>, event_receiver: mpsc::Receiver<MissionEvent>) -> Self {
        Self {
            event_store,
            projection_store: Arc::new(RwLock::new(MissionProjectionStore::new())),
            event_receiver,
            robot_id: None,
        }
    }

    pub fn with_robot_id(mut self, robot_id: impl Into<String>) -> Self {
        self.robot_id = Some(robot_id.into());
        self
    }

    /// Handle to the projections that stays valid after the actor is spawned.
    pub fn projections(&self) -> SharedMissionProjections {
        self.projection_store.clone()
    }

    pub async fn run(&mut self) {
        while let Some(event) = self.event_receiver.recv().await {
            if let Err(e) = self.handle_event(event).await {
                tracing::error!("Failed to journal mission event: {}", e);
            }
        }
    }

    async fn handle_event(&self, event: MissionEvent) -> Result<(), String> {
        let metadata = EventMetadata {
            robot_id: self.robot_id.clone(),
            source: "MissionJournalActor".to_string(),
        };

        let envelope = EventEnvelope::new(&event, "Mission", metadata)
            .map_err(|e| format!("Failed to create event envelope: {}", e))?;

        // Projections follow the orchestrator even when the store is down.
        self.projection_store.write().await.apply_event(&event);

        self.event_store
            .append_events(event.aggregate_id(), vec![envelope])
            .await?;

        tracing::debug!("Journaled mission event: {}", event.event_type());
        Ok(())
    }

    pub async fn get_overview(&self, mission_id: &str) -> Option<MissionOverview> {
        let store = self.projection_store.read().await;
        store.overviews.get(mission_id).cloned()
    }

    pub async fn get_stats(&self, kind: Option<MissionType>) -> MissionStats {
        self.projection_store.read().await.stats_for(kind)
    }
}
