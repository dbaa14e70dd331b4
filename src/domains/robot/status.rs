use crate::domains::site::{Pose, Position2D};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LidState {
    Open,
    #[default]
    Close,
    Opening,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrakeState {
    #[default]
    Release,
    Latch,
    Freewheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NavigationState {
    #[default]
    Init,
    Idle,
    Mapping,
    Parking,
    Parked,
    Unparking,
    Active,
    GoalCancelling,
    Delocalized,
    Relocalizing,
    Fault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FluidLevel {
    #[serde(default)]
    pub low: bool,
    #[serde(default)]
    pub high: bool,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CurrentFloor {
    #[serde(default)]
    pub bound_box: Vec<Position2D>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Full status snapshot polled from the platform. Each poll replaces the
/// previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RobotStatus {
    /// Battery charge in percent.
    pub charge: f64,
    #[serde(default)]
    pub charging: bool,
    #[serde(default)]
    pub lid: LidState,
    #[serde(default, rename = "eBrake")]
    pub e_brake: BrakeState,
    #[serde(default)]
    pub lost: bool,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub fluid_level: FluidLevel,
    #[serde(default)]
    pub position: Pose,
    #[serde(default)]
    pub motor_shutdown: bool,
    #[serde(default)]
    pub current_goal: Option<String>,
    #[serde(default)]
    pub record_video: HashMap<String, bool>,
    #[serde(default)]
    pub navigation_state: NavigationState,
    #[serde(default)]
    pub waypoint_last_update: u64,
    #[serde(default)]
    pub current_floor: CurrentFloor,
}

impl RobotStatus {
    pub fn lid_is_closed(&self) -> bool {
        matches!(self.lid, LidState::Close | LidState::Closing)
    }
}
