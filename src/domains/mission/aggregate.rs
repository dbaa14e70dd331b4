use crate::domains::robot::RobotKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionType {
    Delivery,
    Disinfection,
}

impl MissionType {
    pub fn for_robot(kind: RobotKind) -> Option<Self> {
        match kind {
            RobotKind::Delivery => Some(MissionType::Delivery),
            RobotKind::Disinfection => Some(MissionType::Disinfection),
            RobotKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionState {
    Start,
    Code,
    Move,
    Return,
    End,
    Error,
    Skip,
}

/// Free-form mission details. Delivery missions use `from`/`to`/`phone_number`,
/// disinfection missions use `path_id`/`repetition`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_id: Option<String>,
    /// Remaining path traversals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition: Option<u32>,
}

impl MissionMeta {
    pub fn delivery(to: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            to: Some(to.into()),
            phone_number: Some(phone_number.into()),
            ..Default::default()
        }
    }

    pub fn disinfection(path_id: impl Into<String>, repetition: u32) -> Self {
        Self {
            path_id: Some(path_id.into()),
            repetition: Some(repetition),
            ..Default::default()
        }
    }

    pub fn has_destination(&self) -> bool {
        self.to.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<MissionType>,
    pub state: MissionState,
    pub meta: Option<MissionMeta>,
}

/// A requested mission mutation. `report` asks for the result to be mirrored
/// to the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionUpdate {
    pub state: Option<MissionState>,
    pub meta: Option<MissionMeta>,
    pub report: bool,
}

impl MissionUpdate {
    pub fn new(state: Option<MissionState>, meta: Option<MissionMeta>, report: bool) -> Self {
        Self { state, meta, report }
    }

    /// Clear the mission and report the empty mission.
    pub fn clear() -> Self {
        Self::new(None, None, true)
    }

    pub fn reported(state: MissionState, meta: Option<MissionMeta>) -> Self {
        Self::new(Some(state), meta, true)
    }

    pub fn silent(state: MissionState, meta: Option<MissionMeta>) -> Self {
        Self::new(Some(state), meta, false)
    }
}

impl Mission {
    /// Apply an update to the current mission:
    ///
    /// * no state, some meta: replace the meta of the current mission
    /// * no state, no meta: clear the mission
    /// * `start`: a new mission with a fresh id, typed after the robot
    /// * any other state: set state and meta, creating a mission if none exists
    pub fn assign(current: Option<&Mission>, update: &MissionUpdate, robot: RobotKind) -> Option<Mission> {
        match (update.state, &update.meta) {
            (None, Some(meta)) => current.map(|m| Mission {
                meta: Some(meta.clone()),
                ..m.clone()
            }),
            (None, None) => None,
            (Some(MissionState::Start), meta) => Some(Mission {
                id: Uuid::new_v4().to_string(),
                kind: MissionType::for_robot(robot),
                state: MissionState::Start,
                meta: meta.clone(),
            }),
            (Some(state), meta) => Some(match current {
                Some(m) => Mission {
                    state,
                    meta: meta.clone(),
                    ..m.clone()
                },
                None => Mission {
                    id: Uuid::new_v4().to_string(),
                    kind: MissionType::for_robot(robot),
                    state,
                    meta: meta.clone(),
                },
            }),
        }
    }

    pub fn meta(&self) -> MissionMeta {
        self.meta.clone().unwrap_or_default()
    }

    /// Undelivered: a destination was set but the robot never reported
    /// returning from it.
    pub fn is_dangling_delivery(&self) -> bool {
        self.state != MissionState::Return
            && self.meta.as_ref().is_some_and(MissionMeta::has_destination)
    }
}
