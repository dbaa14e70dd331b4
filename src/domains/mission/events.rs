use super::aggregate::{Mission, MissionMeta, MissionState, MissionType};
use crate::common::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MissionEvent {
    Started {
        mission_id: String,
        kind: Option<MissionType>,
        state: MissionState,
        meta: Option<MissionMeta>,
        timestamp: DateTime<Utc>,
    },
    StateChanged {
        mission_id: String,
        from: MissionState,
        to: MissionState,
        meta: Option<MissionMeta>,
        timestamp: DateTime<Utc>,
    },
    MetaUpdated {
        mission_id: String,
        meta: Option<MissionMeta>,
        timestamp: DateTime<Utc>,
    },
    Cleared {
        mission_id: String,
        last_state: MissionState,
        timestamp: DateTime<Utc>,
    },
}

impl MissionEvent {
    /// The journal entry describing a mission mutation, if anything changed.
    pub fn between(previous: Option<&Mission>, next: Option<&Mission>) -> Option<MissionEvent> {
        let timestamp = Utc::now();
        match (previous, next) {
            (None, None) => None,
            (Some(prev), None) => Some(MissionEvent::Cleared {
                mission_id: prev.id.clone(),
                last_state: prev.state,
                timestamp,
            }),
            (prev, Some(next)) if prev.map(|p| p.id.as_str()) != Some(next.id.as_str()) => {
                Some(MissionEvent::Started {
                    mission_id: next.id.clone(),
                    kind: next.kind,
                    state: next.state,
                    meta: next.meta.clone(),
                    timestamp,
                })
            }
            (Some(prev), Some(next)) if prev.state != next.state => Some(MissionEvent::StateChanged {
                mission_id: next.id.clone(),
                from: prev.state,
                to: next.state,
                meta: next.meta.clone(),
                timestamp,
            }),
            (Some(prev), Some(next)) if prev.meta != next.meta => Some(MissionEvent::MetaUpdated {
                mission_id: next.id.clone(),
                meta: next.meta.clone(),
                timestamp,
            }),
            _ => None,
        }
    }

    pub fn mission_id(&self) -> &str {
        match self {
            MissionEvent::Started { mission_id, .. }
            | MissionEvent::StateChanged { mission_id, .. }
            | MissionEvent::MetaUpdated { mission_id, .. }
            | MissionEvent::Cleared { mission_id, .. } => mission_id,
        }
    }
}

impl DomainEvent for MissionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MissionEvent::Started { .. } => "MissionStarted",
            MissionEvent::StateChanged { .. } => "MissionStateChanged",
            MissionEvent::MetaUpdated { .. } => "MissionMetaUpdated",
            MissionEvent::Cleared { .. } => "MissionCleared",
        }
    }

    fn aggregate_id(&self) -> &str {
        self.mission_id()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MissionEvent::Started { timestamp, .. }
            | MissionEvent::StateChanged { timestamp, .. }
            | MissionEvent::MetaUpdated { timestamp, .. }
            | MissionEvent::Cleared { timestamp, .. } => *timestamp,
        }
    }
}
