pub mod controller;
pub mod elevator;
pub mod request;

pub use controller::*;
pub use elevator::DoorHold;
pub use request::*;

use std::time::Duration;
use thiserror::Error;

/// Escalation reasons. Any of these ends the request; the parent decides
/// whether that ends the mission.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    #[error("Navigation blocked after {attempts} attempt(s)")]
    Blocked { attempts: u32 },

    #[error("Navigation timed out after {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("Unknown waypoint: {id}")]
    UnknownWaypoint { id: String },

    #[error("No {role} found on floor '{floor}'")]
    MissingElevatorNode { role: &'static str, floor: String },

    #[error("Unknown floor region: {id}")]
    UnknownRegion { id: String },
}
