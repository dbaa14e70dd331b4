use super::request::{NavigationRequest, NavigationSettings};
use super::NavigationError;
use crate::domains::robot::{
    CarState, DynPlatform, ElevatorAction, ElevatorCommand, FloorDescriptor, MotionProfile,
    NavGoal, PlatformResult, Target,
};
use crate::domains::site::{Position2D, SiteMap};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Keeps the car door open by re-sending `open` every period until dropped.
pub struct DoorHold {
    task: JoinHandle<()>,
}

impl DoorHold {
    pub fn start(platform: DynPlatform, integration: &str, car: &str, period: Duration) -> Self {
        let command = ElevatorCommand::new(integration, ElevatorAction::Open).car(car);
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                ticker.tick().await;
                if let Err(e) = platform.elevator_command(&command).await {
                    tracing::warn!("Door hold for car {:?} failed: {}", command.car, e);
                }
            }
        });
        Self { task }
    }
}

impl Drop for DoorHold {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Dispatching,
    Waiting { car: String },
    Boarding { car: String },
    Riding { car: String },
    Alighting { car: String },
}

/// Cross-floor leg of a navigation request: lobby, dispatch, board, ride,
/// alight. Returns once the robot stands in the boarding zone of the target
/// floor; the caller then resumes the ordinary move.
pub(crate) struct ElevatorRide<'a> {
    platform: DynPlatform,
    map: &'a SiteMap,
    settings: &'a NavigationSettings,
    bound_box: &'a [Position2D],
    from: Position2D,
    to: Position2D,
}

impl<'a> ElevatorRide<'a> {
    pub fn new(
        platform: DynPlatform,
        request: &'a NavigationRequest,
        settings: &'a NavigationSettings,
        to: Position2D,
    ) -> Self {
        Self {
            platform,
            map: &request.map,
            settings,
            bound_box: request.bound_box.as_deref().unwrap_or(&[]),
            from: request.current_position.position(),
            to,
        }
    }

    pub async fn run(&self) -> Result<(), NavigationError> {
        let (current_floor, target_floor) = self.resolve_floors().await;
        tracing::info!(
            "Elevator ride from floor '{}' to floor '{}'",
            current_floor.name,
            target_floor.name
        );

        let (lobby, node) = self.map.elevator_lobby(self.bound_box).ok_or_else(|| {
            NavigationError::MissingElevatorNode {
                role: "lobby",
                floor: current_floor.name.clone(),
            }
        })?;
        while self.move_to(lobby, MotionProfile::Normal).await.is_err() {}
        let integration = node.integration_id.as_str();

        let target_bound = self
            .map
            .region(&target_floor.id)
            .map(|r| r.geometry.as_slice())
            .ok_or_else(|| NavigationError::UnknownRegion {
                id: target_floor.id.clone(),
            })?;

        let mut stage = Stage::Dispatching;
        loop {
            tracing::debug!("Elevator stage: {:?}", stage);
            stage = match stage {
                Stage::Dispatching => Stage::Waiting {
                    car: self.dispatch(integration, &current_floor, &target_floor).await,
                },
                Stage::Waiting { car } => {
                    let _hold = self.hold_door(integration, &car);
                    let zone = self.node(
                        self.map.boarding_zone(integration, &car, self.bound_box),
                        "boarding zone",
                        &current_floor,
                    )?;
                    if self.move_to(zone, MotionProfile::Normal).await.is_err() {
                        Stage::Dispatching
                    } else if self.wait_for_car(integration, &car, CarState::Boarding).await {
                        Stage::Boarding { car }
                    } else {
                        tracing::warn!("Car {} is no longer allocated, dispatching again", car);
                        Stage::Dispatching
                    }
                }
                Stage::Boarding { car } => {
                    let _hold = self.hold_door(integration, &car);
                    let interior = self.node(
                        self.map.car_interior(integration, &car, self.bound_box),
                        "car interior",
                        &current_floor,
                    )?;
                    if self.move_to(interior, MotionProfile::Narrow).await.is_err() {
                        Stage::Boarding { car }
                    } else {
                        let call = ElevatorCommand::new(integration, ElevatorAction::Call)
                            .car(car.as_str())
                            .zones(current_floor.name.as_str(), target_floor.name.as_str());
                        match self.platform.elevator_command(&call).await {
                            Ok(_) => Stage::Riding { car },
                            Err(e) => {
                                tracing::warn!("Calling car {} failed: {}", car, e);
                                Stage::Boarding { car }
                            }
                        }
                    }
                }
                Stage::Riding { car } => {
                    let interior = self.node(
                        self.map.car_interior(integration, &car, target_bound),
                        "car interior",
                        &target_floor,
                    )?;
                    self.force_position(interior).await;
                    if self.wait_for_car(integration, &car, CarState::Alighting).await {
                        Stage::Alighting { car }
                    } else {
                        tracing::warn!("Car {} released during ride, dispatching again", car);
                        Stage::Dispatching
                    }
                }
                Stage::Alighting { car } => {
                    let _hold = self.hold_door(integration, &car);
                    let zone = self.node(
                        self.map.boarding_zone(integration, &car, target_bound),
                        "alighting zone",
                        &target_floor,
                    )?;
                    if self.move_to(zone, MotionProfile::Narrow).await.is_ok() {
                        let close = ElevatorCommand::new(integration, ElevatorAction::Close).car(car.as_str());
                        if let Err(e) = self.platform.elevator_command(&close).await {
                            tracing::warn!("Closing car {} failed: {}", car, e);
                        }
                        return Ok(());
                    }
                    Stage::Alighting { car }
                }
            };
        }
    }

    fn node<'m>(
        &self,
        found: Option<&'m str>,
        role: &'static str,
        floor: &FloorDescriptor,
    ) -> Result<&'m str, NavigationError> {
        found.ok_or_else(|| NavigationError::MissingElevatorNode {
            role,
            floor: floor.name.clone(),
        })
    }

    fn hold_door(&self, integration: &str, car: &str) -> DoorHold {
        DoorHold::start(
            self.platform.clone(),
            integration,
            car,
            self.settings.door_hold_period,
        )
    }

    async fn resolve_floors(&self) -> (FloorDescriptor, FloorDescriptor) {
        loop {
            let (current, target) = tokio::join!(
                self.platform.compute_floor(self.from),
                self.platform.compute_floor(self.to)
            );
            match (current, target) {
                (Ok(current), Ok(target)) => return (current, target),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!("Floor resolution failed: {}", e);
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
            }
        }
    }

    async fn move_to(&self, waypoint: &str, profile: MotionProfile) -> PlatformResult<String> {
        let goal = NavGoal::to(Target::Waypoint(waypoint.to_string())).with_profile(profile);
        let result = self.platform.nav_goal(&goal).await;
        if let Err(e) = &result {
            tracing::warn!("Move to {} failed: {}", waypoint, e);
            tokio::time::sleep(self.settings.goal_backoff).await;
        }
        result
    }

    async fn force_position(&self, waypoint: &str) {
        while let Err(e) = self.platform.nav_position(waypoint).await {
            tracing::warn!("Setting position to {} failed: {}", waypoint, e);
            tokio::time::sleep(self.settings.retry_backoff).await;
        }
    }

    async fn dispatch(
        &self,
        integration: &str,
        current: &FloorDescriptor,
        target: &FloorDescriptor,
    ) -> String {
        let mut command = ElevatorCommand::new(integration, ElevatorAction::Dispatch)
            .zones(current.name.as_str(), target.name.as_str());
        command.rpc_timeout_ms = Some(self.settings.dispatch_rpc_timeout.as_millis() as u64);

        loop {
            match self.platform.elevator_command(&command).await {
                Ok(reply) => match reply.car {
                    Some(car) => {
                        tracing::info!("Car {} dispatched", car);
                        return car;
                    }
                    None => tracing::warn!("Dispatch returned no car"),
                },
                Err(e) => tracing::warn!("Dispatch failed: {}", e),
            }
            tokio::time::sleep(self.settings.dispatch_backoff).await;
        }
    }

    /// Poll until the car reports `wanted`. Returns `false` as soon as the car
    /// disappears from the allocation.
    async fn wait_for_car(&self, integration: &str, car: &str, wanted: CarState) -> bool {
        loop {
            match self.platform.elevator_state(integration, car).await {
                Ok(cars) => match cars.get(car) {
                    None => return false,
                    Some(status) if status.state == wanted => return true,
                    Some(status) => tracing::debug!("Car {} is {:?}", car, status.state),
                },
                Err(e) => tracing::warn!("Elevator state poll failed: {}", e),
            }
            tokio::time::sleep(self.settings.elevator_poll).await;
        }
    }
}
