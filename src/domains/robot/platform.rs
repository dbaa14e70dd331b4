use super::info::InitData;
use super::status::RobotStatus;
use crate::domains::mission::Mission;
use crate::domains::site::Position2D;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request rejected: {reason}")]
    Rejected { reason: String },

    #[error("Platform unavailable")]
    Unavailable,
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Capabilities the client announces at `init`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub state_inspector: bool,
}

/// Where a move-to-point request goes: a named waypoint or raw `[x, y, heading]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Waypoint(String),
    Coordinate([f64; 3]),
}

impl Target {
    /// Raw coordinate target. A negative heading means the final orientation
    /// does not matter.
    pub fn coordinate(position: Position2D, heading: f64) -> Self {
        Target::Coordinate([position.x, position.y, heading])
    }

    pub fn ignores_orientation(&self) -> bool {
        matches!(self, Target::Coordinate([_, _, heading]) if *heading < 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MotionProfile {
    #[default]
    Normal,
    Narrow,
    Slow,
    DepthCameraInterference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavGoal {
    pub waypoint: Target,
    pub profile: MotionProfile,
    pub ignore_orientation: bool,
}

impl NavGoal {
    pub fn to(waypoint: Target) -> Self {
        let ignore_orientation = waypoint.ignores_orientation();
        Self {
            waypoint,
            profile: MotionProfile::Normal,
            ignore_orientation,
        }
    }

    pub fn with_profile(mut self, profile: MotionProfile) -> Self {
        self.profile = profile;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarState {
    Boarding,
    Alighting,
    #[serde(other)]
    Moving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarStatus {
    pub state: CarState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElevatorAction {
    Dispatch,
    Call,
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatorCommand {
    pub integration: String,
    pub command: ElevatorAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boarding_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alighting_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_timeout_ms: Option<u64>,
}

impl ElevatorCommand {
    pub fn new(integration: impl Into<String>, command: ElevatorAction) -> Self {
        Self {
            integration: integration.into(),
            command,
            car: None,
            boarding_zone: None,
            alighting_zone: None,
            rpc_timeout_ms: None,
        }
    }

    pub fn car(mut self, car: impl Into<String>) -> Self {
        self.car = Some(car.into());
        self
    }

    pub fn zones(mut self, boarding: impl Into<String>, alighting: impl Into<String>) -> Self {
        self.boarding_zone = Some(boarding.into());
        self.alighting_zone = Some(alighting.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ElevatorReply {
    #[serde(default)]
    pub car: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LidCommand {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrakeCommand {
    Release,
    Freewheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlarmType {
    NavBlocked,
    DeliveryFailure,
    SmsFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub platform: String,
    pub phone_number: String,
    pub sender_id: String,
    pub message: String,
}

/// Port to the robot platform API. The transport behind it is up to the
/// adapter; only the request/response contract matters here.
#[async_trait]
pub trait RobotPlatform: Send + Sync {
    async fn init(&self, capabilities: Capabilities) -> PlatformResult<InitData>;
    async fn status(&self) -> PlatformResult<RobotStatus>;

    /// Returns the platform's result message for the goal.
    async fn nav_goal(&self, goal: &NavGoal) -> PlatformResult<String>;
    async fn nav_park(&self, charge_await_timeout: Duration) -> PlatformResult<()>;
    /// Force-set localization to a waypoint.
    async fn nav_position(&self, waypoint: &str) -> PlatformResult<()>;
    async fn nav_cancel(&self) -> PlatformResult<()>;

    async fn compute_floor(&self, point: Position2D) -> PlatformResult<FloorDescriptor>;
    async fn elevator_state(
        &self,
        integration: &str,
        car: &str,
    ) -> PlatformResult<HashMap<String, CarStatus>>;
    async fn elevator_command(&self, command: &ElevatorCommand) -> PlatformResult<ElevatorReply>;

    async fn set_lid(&self, lid: LidCommand) -> PlatformResult<()>;
    async fn set_ebrake(&self, brake: BrakeCommand) -> PlatformResult<()>;
    async fn set_disinfection(&self, on: bool) -> PlatformResult<()>;
    async fn record_video(&self, record: bool) -> PlatformResult<()>;

    async fn report_mission(&self, mission: Option<&Mission>) -> PlatformResult<()>;
    async fn alert(&self, alarm: AlarmType, message: &str) -> PlatformResult<()>;
    async fn send_message(&self, message: &OutboundMessage) -> PlatformResult<()>;
    async fn map_image(&self) -> PlatformResult<Vec<u8>>;
}

pub type DynPlatform = Arc<dyn RobotPlatform>;
