use super::NavigationError;
use crate::domains::robot::{RobotStatus, Target};
use crate::domains::site::{is_same_floor, Pose, Position2D, SiteMap};
use std::sync::Arc;
use std::time::Duration;

/// One point-to-point movement. Map, position and floor are snapshots taken
/// when the request is built; the controller never re-reads them.
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub target: Target,
    /// `None` means no time limit.
    pub timeout: Option<Duration>,
    /// `None` means retry forever.
    pub max_retry: Option<u32>,
    pub map: Arc<SiteMap>,
    pub current_position: Pose,
    pub bound_box: Option<Vec<Position2D>>,
}

impl NavigationRequest {
    pub fn new(target: Target, map: Arc<SiteMap>) -> Self {
        Self {
            target,
            timeout: None,
            max_retry: None,
            map,
            current_position: Pose::default(),
            bound_box: None,
        }
    }

    /// A zero timeout is treated as unlimited.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// A zero retry budget is treated as unlimited.
    pub fn with_max_retry(mut self, max_retry: Option<u32>) -> Self {
        self.max_retry = max_retry.filter(|n| *n > 0);
        self
    }

    pub fn with_position(mut self, position: Pose) -> Self {
        self.current_position = position;
        self
    }

    pub fn with_bound_box(mut self, bound_box: Vec<Position2D>) -> Self {
        self.bound_box = (bound_box.len() >= 4).then_some(bound_box);
        self
    }

    /// Snapshot position and floor from the latest status.
    pub fn from_status(self, status: &RobotStatus) -> Self {
        self.with_position(status.position)
            .with_bound_box(status.current_floor.bound_box.clone())
    }

    pub fn target_position(&self) -> Result<Position2D, NavigationError> {
        match &self.target {
            Target::Waypoint(id) => self
                .map
                .points
                .get(id)
                .map(|p| p.coord)
                .ok_or_else(|| NavigationError::UnknownWaypoint { id: id.clone() }),
            Target::Coordinate([x, y, _]) => Ok(Position2D::new(*x, *y)),
        }
    }

    /// Without a known floor bound box the target is assumed reachable
    /// without an elevator.
    pub fn target_on_current_floor(&self, target: Position2D) -> bool {
        match &self.bound_box {
            Some(bound_box) => is_same_floor(target, bound_box),
            None => true,
        }
    }
}

/// Fixed delays used by the controller and the elevator protocol.
#[derive(Debug, Clone)]
pub struct NavigationSettings {
    /// Wait after a failed move before the attempt counts as failed.
    pub goal_backoff: Duration,
    pub retry_backoff: Duration,
    pub dispatch_backoff: Duration,
    pub elevator_poll: Duration,
    pub door_hold_period: Duration,
    pub dispatch_rpc_timeout: Duration,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            goal_backoff: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(1),
            dispatch_backoff: Duration::from_secs(5),
            elevator_poll: Duration::from_secs(1),
            door_hold_period: Duration::from_secs(1),
            dispatch_rpc_timeout: Duration::from_secs(20),
        }
    }
}
