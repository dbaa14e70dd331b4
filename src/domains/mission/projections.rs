use super::aggregate::{MissionState, MissionType};
use super::events::MissionEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle of one mission as seen by the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionOverview {
    pub mission_id: String,
    pub kind: Option<MissionType>,
    pub state: MissionState,
    pub history: Vec<MissionState>,
    pub cleared: bool,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl MissionOverview {
    pub fn new(
        mission_id: String,
        kind: Option<MissionType>,
        state: MissionState,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            mission_id,
            kind,
            state,
            history: vec![state],
            cleared: false,
            started_at,
            last_activity: started_at,
        }
    }

    pub fn apply_event(&mut self, event: &MissionEvent) {
        match event {
            MissionEvent::StateChanged { to, timestamp, .. } => {
                self.state = *to;
                self.history.push(*to);
                self.last_activity = *timestamp;
            }
            MissionEvent::MetaUpdated { timestamp, .. } => {
                self.last_activity = *timestamp;
            }
            MissionEvent::Cleared { timestamp, .. } => {
                self.cleared = true;
                self.last_activity = *timestamp;
            }
            MissionEvent::Started { .. } => {}
        }
    }
}

/// Counters per mission type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionStats {
    pub started: usize,
    pub completed: usize,
    pub errors: usize,
    pub skipped: usize,
    pub abandoned: usize,
}

#[derive(Debug, Default)]
pub struct MissionProjectionStore {
    pub overviews: HashMap<String, MissionOverview>,
    pub stats: HashMap<Option<MissionType>, MissionStats>,
}

impl MissionProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_event(&mut self, event: &MissionEvent) {
        match event {
            MissionEvent::Started {
                mission_id,
                kind,
                state,
                timestamp,
                ..
            } => {
                let stats = self.stats.entry(*kind).or_default();
                if *state == MissionState::Skip {
                    stats.skipped += 1;
                } else {
                    stats.started += 1;
                }
                self.overviews.insert(
                    mission_id.clone(),
                    MissionOverview::new(mission_id.clone(), *kind, *state, *timestamp),
                );
            }
            MissionEvent::StateChanged { mission_id, to, .. } => {
                let kind = self.kind_of(mission_id);
                let stats = self.stats.entry(kind).or_default();
                match to {
                    MissionState::End => stats.completed += 1,
                    MissionState::Error => stats.errors += 1,
                    MissionState::Skip => stats.skipped += 1,
                    _ => {}
                }
            }
            MissionEvent::Cleared {
                mission_id,
                last_state,
                ..
            } => {
                if !matches!(last_state, MissionState::End | MissionState::Skip) {
                    let kind = self.kind_of(mission_id);
                    self.stats.entry(kind).or_default().abandoned += 1;
                }
            }
            MissionEvent::MetaUpdated { .. } => {}
        }

        if let Some(overview) = self.overviews.get_mut(event.mission_id()) {
            overview.apply_event(event);
        }
    }

    fn kind_of(&self, mission_id: &str) -> Option<MissionType> {
        self.overviews.get(mission_id).and_then(|o| o.kind)
    }

    pub fn stats_for(&self, kind: Option<MissionType>) -> MissionStats {
        self.stats.get(&kind).cloned().unwrap_or_default()
    }
}
