use crate::domains::mission::Mission;
use crate::domains::robot::*;
use crate::domains::schedule::{ScheduleEntry, StartTime, WeekdayMask};
use crate::domains::site::*;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Platform operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    Status,
    NavGoal,
    NavPark,
    NavPosition,
    NavCancel,
    ComputeFloor,
    ElevatorState,
    ElevatorCommand,
    Lid,
    EBrake,
    Disinfection,
    RecordVideo,
    Mission,
    Alert,
    Message,
    MapImage,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Next(u32),
    Always,
}

/// Every call that reached the simulator, except status polls.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    Init,
    NavGoal(NavGoal),
    NavPark,
    NavPosition(String),
    NavCancel,
    ComputeFloor(Position2D),
    ElevatorState { integration: String, car: String },
    ElevatorCommand(ElevatorCommand),
    Lid(LidCommand),
    EBrake(BrakeCommand),
    Disinfection(bool),
    RecordVideo(bool),
    Mission(Option<Mission>),
    Alert(AlarmType, String),
    Message(OutboundMessage),
    MapImage,
}

#[derive(Debug, Default)]
struct SimElevator {
    cars: HashMap<String, CarState>,
    release_on_next_poll: bool,
    ride_polls: u32,
    ride_remaining: u32,
}

struct SimState {
    init: InitData,
    status: RobotStatus,
    calls: Vec<SimCall>,
    failures: HashMap<Operation, Failure>,
    elevator: SimElevator,
    nav_message: String,
    status_delays: VecDeque<Duration>,
}

impl SimState {
    fn check(&mut self, op: Operation) -> PlatformResult<()> {
        match self.failures.get_mut(&op) {
            Some(Failure::Always) => Err(simulated(op)),
            Some(Failure::Next(remaining)) => {
                *remaining -= 1;
                if *remaining == 0 {
                    self.failures.remove(&op);
                }
                Err(simulated(op))
            }
            None => Ok(()),
        }
    }

    fn region_at(&self, point: Position2D) -> Option<(&String, &Region)> {
        self.init
            .site
            .map
            .regions
            .iter()
            .find(|(_, region)| is_same_floor(point, &region.geometry))
    }

    fn resolve(&self, target: &Target) -> PlatformResult<(Position2D, f64)> {
        match target {
            Target::Waypoint(id) => {
                let point = self
                    .init
                    .site
                    .map
                    .points
                    .get(id)
                    .ok_or_else(|| PlatformError::Rejected {
                        reason: format!("unknown waypoint {}", id),
                    })?;
                let theta = point.waypoint.as_ref().map(|w| w.theta).unwrap_or_default();
                Ok((point.coord, theta))
            }
            Target::Coordinate([x, y, heading]) => Ok((Position2D::new(*x, *y), heading.max(0.0))),
        }
    }

    fn place(&mut self, position: Position2D, theta: f64) {
        self.status.position = Pose {
            x: position.x,
            y: position.y,
            theta,
        };
        let floor = self
            .region_at(position)
            .map(|(id, region)| CurrentFloor {
                bound_box: region.geometry.clone(),
                name: Some(region.name.clone().unwrap_or_else(|| id.clone())),
            });
        if let Some(floor) = floor {
            self.status.current_floor = floor;
        }
    }
}

fn simulated(op: Operation) -> PlatformError {
    PlatformError::Transport(format!("simulated {:?} failure", op))
}

/// In-memory robot platform. Moves are instantaneous, the elevator answers
/// dispatches with a car that is ready to board at once.
#[derive(Clone)]
pub struct SimulatedPlatform {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedPlatform {
    pub fn new(init: InitData) -> Self {
        let mut state = SimState {
            init,
            status: RobotStatus {
                charge: 80.0,
                online: true,
                ..Default::default()
            },
            calls: Vec::new(),
            failures: HashMap::new(),
            elevator: SimElevator::default(),
            nav_message: "success".to_string(),
            status_delays: VecDeque::new(),
        };
        let start = state
            .init
            .site
            .map
            .points
            .iter()
            .find(|(_, p)| p.waypoint.as_ref().is_some_and(|w| w.home.is_some()))
            .map(|(_, p)| p.coord);
        if let Some(start) = start {
            state.place(start, 0.0);
        }

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn demo(kind: RobotKind) -> Self {
        Self::new(demo_site(kind))
    }

    /// Fail the next `count` calls of `op`.
    pub async fn fail_next(&self, op: Operation, count: u32) {
        if count > 0 {
            self.state.lock().await.failures.insert(op, Failure::Next(count));
        }
    }

    pub async fn fail_always(&self, op: Operation) {
        self.state.lock().await.failures.insert(op, Failure::Always);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// The next elevator poll finds no car allocated to the robot.
    pub async fn release_car_on_next_poll(&self) {
        self.state.lock().await.elevator.release_on_next_poll = true;
    }

    /// A called car reports `Moving` for this many polls before it arrives.
    pub async fn set_ride_polls(&self, polls: u32) {
        self.state.lock().await.elevator.ride_polls = polls;
    }

    /// Upcoming status polls answer only after these delays, with the
    /// snapshot taken when the poll arrived.
    pub async fn delay_status(&self, delays: Vec<Duration>) {
        self.state.lock().await.status_delays.extend(delays);
    }

    /// Message returned by successful `nav_goal` calls.
    pub async fn set_nav_message(&self, message: &str) {
        self.state.lock().await.nav_message = message.to_string();
    }

    pub async fn set_charge(&self, charge: f64) {
        self.state.lock().await.status.charge = charge;
    }

    /// Teleport the robot, updating its floor.
    pub async fn place_at(&self, position: Position2D) {
        self.state.lock().await.place(position, 0.0);
    }

    pub async fn calls(&self) -> Vec<SimCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn current_status(&self) -> RobotStatus {
        self.state.lock().await.status.clone()
    }

    async fn record(&self, op: Operation, call: SimCall) -> PlatformResult<tokio::sync::MutexGuard<'_, SimState>> {
        let mut state = self.state.lock().await;
        state.calls.push(call);
        state.check(op)?;
        Ok(state)
    }

    /// Record a call that leaves the simulated state untouched.
    async fn log_call(&self, op: Operation, call: SimCall) -> PlatformResult<()> {
        self.record(op, call).await.map(drop)
    }
}

#[async_trait]
impl RobotPlatform for SimulatedPlatform {
    async fn init(&self, capabilities: Capabilities) -> PlatformResult<InitData> {
        tracing::debug!("Simulated init with {:?}", capabilities);
        let state = self.record(Operation::Init, SimCall::Init).await?;
        Ok(state.init.clone())
    }

    async fn status(&self) -> PlatformResult<RobotStatus> {
        let (status, delay) = {
            let mut state = self.state.lock().await;
            state.check(Operation::Status)?;
            (state.status.clone(), state.status_delays.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(status)
    }

    async fn nav_goal(&self, goal: &NavGoal) -> PlatformResult<String> {
        let mut state = self.record(Operation::NavGoal, SimCall::NavGoal(goal.clone())).await?;
        let (position, theta) = state.resolve(&goal.waypoint)?;
        state.status.charging = false;
        state.place(position, theta);
        state.status.current_goal = match &goal.waypoint {
            Target::Waypoint(id) => Some(id.clone()),
            Target::Coordinate(_) => None,
        };
        Ok(state.nav_message.clone())
    }

    async fn nav_park(&self, charge_await_timeout: Duration) -> PlatformResult<()> {
        tracing::debug!("Simulated park, awaiting charge for {:?}", charge_await_timeout);
        let mut state = self.record(Operation::NavPark, SimCall::NavPark).await?;
        state.status.charging = true;
        state.status.navigation_state = NavigationState::Parked;
        Ok(())
    }

    async fn nav_position(&self, waypoint: &str) -> PlatformResult<()> {
        let mut state = self
            .record(Operation::NavPosition, SimCall::NavPosition(waypoint.to_string()))
            .await?;
        let (position, theta) = state.resolve(&Target::Waypoint(waypoint.to_string()))?;
        state.place(position, theta);
        Ok(())
    }

    async fn nav_cancel(&self) -> PlatformResult<()> {
        let mut state = self.record(Operation::NavCancel, SimCall::NavCancel).await?;
        state.status.current_goal = None;
        Ok(())
    }

    async fn compute_floor(&self, point: Position2D) -> PlatformResult<FloorDescriptor> {
        let state = self
            .record(Operation::ComputeFloor, SimCall::ComputeFloor(point))
            .await?;
        let (id, region) = state.region_at(point).ok_or_else(|| PlatformError::Rejected {
            reason: format!("no floor contains ({}, {})", point.x, point.y),
        })?;
        Ok(FloorDescriptor {
            id: id.clone(),
            name: region.name.clone().unwrap_or_else(|| id.clone()),
            meta: region.floor.clone().unwrap_or_default(),
        })
    }

    async fn elevator_state(
        &self,
        integration: &str,
        car: &str,
    ) -> PlatformResult<HashMap<String, CarStatus>> {
        let mut state = self
            .record(
                Operation::ElevatorState,
                SimCall::ElevatorState {
                    integration: integration.to_string(),
                    car: car.to_string(),
                },
            )
            .await?;
        if state.elevator.release_on_next_poll {
            state.elevator.release_on_next_poll = false;
            state.elevator.cars.clear();
        }
        if state.elevator.ride_remaining > 0 {
            state.elevator.ride_remaining -= 1;
        } else {
            for car_state in state.elevator.cars.values_mut() {
                if *car_state == CarState::Moving {
                    *car_state = CarState::Alighting;
                }
            }
        }
        Ok(state
            .elevator
            .cars
            .iter()
            .map(|(id, car_state)| (id.clone(), CarStatus { state: *car_state }))
            .collect())
    }

    async fn elevator_command(&self, command: &ElevatorCommand) -> PlatformResult<ElevatorReply> {
        let mut state = self
            .record(Operation::ElevatorCommand, SimCall::ElevatorCommand(command.clone()))
            .await?;

        let car = match command.command {
            ElevatorAction::Dispatch => {
                let car = state
                    .init
                    .site
                    .map
                    .points
                    .values()
                    .filter_map(|p| p.waypoint.as_ref()?.elevator.as_ref())
                    .filter(|node| node.integration_id == command.integration)
                    .find_map(|node| node.car.clone())
                    .ok_or(PlatformError::Unavailable)?;
                state.elevator.cars.insert(car.clone(), CarState::Boarding);
                Some(car)
            }
            ElevatorAction::Call => {
                let car = command.car.clone().ok_or_else(|| PlatformError::Rejected {
                    reason: "call without car".to_string(),
                })?;
                let ride = state.elevator.ride_polls;
                let arrival = if ride > 0 { CarState::Moving } else { CarState::Alighting };
                state.elevator.ride_remaining = ride;
                state.elevator.cars.insert(car.clone(), arrival);
                Some(car)
            }
            ElevatorAction::Close => {
                if let Some(car) = &command.car {
                    state.elevator.cars.remove(car);
                }
                command.car.clone()
            }
            ElevatorAction::Open => command.car.clone(),
        };
        Ok(ElevatorReply { car })
    }

    async fn set_lid(&self, lid: LidCommand) -> PlatformResult<()> {
        let mut state = self.record(Operation::Lid, SimCall::Lid(lid)).await?;
        state.status.lid = match lid {
            LidCommand::Open => LidState::Open,
            LidCommand::Close => LidState::Close,
        };
        Ok(())
    }

    async fn set_ebrake(&self, brake: BrakeCommand) -> PlatformResult<()> {
        let mut state = self.record(Operation::EBrake, SimCall::EBrake(brake)).await?;
        state.status.e_brake = match brake {
            BrakeCommand::Release => BrakeState::Release,
            BrakeCommand::Freewheel => BrakeState::Freewheel,
        };
        Ok(())
    }

    async fn set_disinfection(&self, on: bool) -> PlatformResult<()> {
        self.log_call(Operation::Disinfection, SimCall::Disinfection(on)).await?;
        Ok(())
    }

    async fn record_video(&self, record: bool) -> PlatformResult<()> {
        let mut state = self.record(Operation::RecordVideo, SimCall::RecordVideo(record)).await?;
        state.status.record_video.insert("front".to_string(), record);
        Ok(())
    }

    async fn report_mission(&self, mission: Option<&Mission>) -> PlatformResult<()> {
        self.log_call(Operation::Mission, SimCall::Mission(mission.cloned())).await?;
        Ok(())
    }

    async fn alert(&self, alarm: AlarmType, message: &str) -> PlatformResult<()> {
        self.log_call(Operation::Alert, SimCall::Alert(alarm, message.to_string())).await?;
        Ok(())
    }

    async fn send_message(&self, message: &OutboundMessage) -> PlatformResult<()> {
        self.log_call(Operation::Message, SimCall::Message(message.clone())).await?;
        Ok(())
    }

    async fn map_image(&self) -> PlatformResult<Vec<u8>> {
        self.log_call(Operation::MapImage, SimCall::MapImage).await?;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

fn point(x: f64, y: f64, waypoint: Option<Waypoint>) -> Point {
    Point {
        coord: Position2D::new(x, y),
        name: None,
        waypoint,
    }
}

fn elevator(car: Option<&str>, boarding: Option<&str>, lobby: bool) -> Option<Waypoint> {
    Some(Waypoint {
        elevator: Some(ElevatorNode {
            integration_id: "lift".to_string(),
            car: car.map(str::to_string),
            boarding: boarding.map(str::to_string),
            lobby,
        }),
        ..Default::default()
    })
}

fn floor(name: &str, x0: f64) -> Region {
    Region {
        geometry: vec![
            Position2D::new(x0, 0.0),
            Position2D::new(x0, 20.0),
            Position2D::new(x0 + 20.0, 20.0),
            Position2D::new(x0 + 20.0, 0.0),
        ],
        name: Some(name.to_string()),
        floor: None,
        gate: None,
    }
}

/// Two floors joined by one elevator car, a home point with a daily
/// disinfection schedule, a charger and a delivery destination per floor.
pub fn demo_site(kind: RobotKind) -> InitData {
    let destination = || {
        Some(Waypoint {
            delivery: Some(DeliveryRole { destination: true }),
            ..Default::default()
        })
    };
    let schedule = vec![
        ScheduleEntry::new(StartTime { hour: 9, minute: 0 }, WeekdayMask::ALL).with_disinfection("ward-a", 2),
        ScheduleEntry::new(StartTime { hour: 21, minute: 30 }, WeekdayMask(0b011_1110))
            .with_disinfection("ward-b", 1),
    ];

    let points = BTreeMap::from([
        (
            "home-1".to_string(),
            point(
                2.0,
                2.0,
                Some(Waypoint {
                    home: Some(HomeRole {
                        schedule: Some(schedule),
                    }),
                    ..Default::default()
                }),
            ),
        ),
        (
            "charger-1".to_string(),
            point(
                1.0,
                1.0,
                Some(Waypoint {
                    charger: true,
                    ..Default::default()
                }),
            ),
        ),
        ("room-101".to_string(), point(5.0, 15.0, destination())),
        ("lobby-1".to_string(), point(10.0, 10.0, elevator(None, None, true))),
        ("board-1".to_string(), point(12.0, 10.0, elevator(None, Some("car-a"), false))),
        ("car-a-1".to_string(), point(15.0, 10.0, elevator(Some("car-a"), None, false))),
        ("room-201".to_string(), point(105.0, 15.0, destination())),
        ("lobby-2".to_string(), point(110.0, 10.0, elevator(None, None, true))),
        ("board-2".to_string(), point(112.0, 10.0, elevator(None, Some("car-a"), false))),
        ("car-a-2".to_string(), point(115.0, 10.0, elevator(Some("car-a"), None, false))),
    ]);

    let regions = BTreeMap::from([
        ("floor-1".to_string(), floor("1F", 0.0)),
        ("floor-2".to_string(), floor("2F", 100.0)),
    ]);

    let paths = BTreeMap::from([
        (
            "ward-a".to_string(),
            Path {
                geometry: vec![
                    Position2D::new(3.0, 3.0),
                    Position2D::new(6.0, 3.0),
                    Position2D::new(6.0, 6.0),
                ],
                name: Some("Ward A".to_string()),
            },
        ),
        (
            "ward-b".to_string(),
            Path {
                geometry: vec![Position2D::new(8.0, 2.0), Position2D::new(8.0, 8.0)],
                name: Some("Ward B".to_string()),
            },
        ),
    ]);

    InitData {
        site: SiteInfo {
            id: "demo-site".to_string(),
            locale: Some("en".to_string()),
            map: Arc::new(SiteMap {
                height: 20.0,
                width: 120.0,
                resolution: 0.05,
                points,
                regions,
                paths,
            }),
        },
        robot: RobotIdentity {
            id: "errand-01".to_string(),
            kind,
            name: Some("Errand".to_string()),
            timezone: None,
            debug_mode: false,
        },
        params: RobotParams::default(),
    }
}
