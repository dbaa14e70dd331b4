use super::context::Context;
use super::events::Event;
use super::services::{self, ServiceSpec};
use super::state::*;
use crate::domains::mission::{Mission, MissionEvent, MissionMeta, MissionState, MissionUpdate};
use crate::domains::robot::{AlarmType, BrakeCommand, BrakeState, LidCommand, RobotKind};
use rand::Rng;
use std::collections::VecDeque;

/// Side effects requested by a transition. `Raise` re-enters the machine;
/// everything else is carried out by the runtime.
#[derive(Debug, Clone)]
pub enum Effect {
    Raise(Event),
    ReportMission(Option<Mission>),
    Journal(MissionEvent),
    Alert { alarm: AlarmType, message: String },
    CancelNavigation,
    RecordVideo(bool),
    SetLid(LidCommand),
    SetBrake(BrakeCommand),
}

/// State plus context. Transitions consume the machine and return the next
/// one; `version` counts processed events.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    pub state: State,
    pub ctx: Context,
    pub version: u64,
}

impl Machine {
    pub fn new(ctx: Context) -> Self {
        Self {
            state: State::Init,
            ctx,
            version: 0,
        }
    }

    /// Process one event. Raised events are returned as [`Effect::Raise`].
    pub fn step(mut self, event: Event) -> (Machine, Vec<Effect>) {
        let mut fx = Vec::new();
        if !self.state.is_terminal() {
            self.handle(event, &mut fx);
        }
        self.version += 1;
        (self, fx)
    }

    /// Process one event and every event it raises, in order, before
    /// returning. Only non-raise effects are returned.
    pub fn settle(self, event: Event) -> (Machine, Vec<Effect>) {
        let mut machine = self;
        let mut queue = VecDeque::from([event]);
        let mut out = Vec::new();

        while let Some(event) = queue.pop_front() {
            let (next, effects) = machine.step(event);
            machine = next;
            for effect in effects {
                match effect {
                    Effect::Raise(raised) => queue.push_back(raised),
                    other => out.push(other),
                }
            }
        }
        (machine, out)
    }

    pub fn services(&self) -> Vec<ServiceSpec> {
        services::derive(&self.state, &self.ctx)
    }

    fn handle(&mut self, event: Event, fx: &mut Vec<Effect>) {
        let waiting = State::Delivery(DeliveryPhase::WaitForRecipient);
        let was_waiting = self.state == waiting;
        self.dispatch(event, fx);
        // The password is texted at most once per delivery.
        if was_waiting && self.state != waiting {
            self.ctx.sms_pending = false;
        }
    }

    fn dispatch(&mut self, event: Event, fx: &mut Vec<Effect>) {
        // Handlers of the active state win over the global ones.
        let event = match self.handle_state(event, fx) {
            Some(unhandled) => unhandled,
            None => return,
        };

        match event {
            Event::StatusUpdate(status) => self.ctx.status = *status,
            Event::SendMission(update) => self.assign_mission(update, fx),
            Event::SetTickRemain(value) => self.ctx.tick_remain = value,
            Event::Tick => self.tick(fx),
            Event::LidFire => {
                let lid = if self.ctx.status.lid_is_closed() {
                    LidCommand::Open
                } else {
                    LidCommand::Close
                };
                fx.push(Effect::SetLid(lid));
            }
            Event::EBrakeFire => {
                let brake = if self.ctx.status.e_brake == BrakeState::Freewheel {
                    BrakeCommand::Release
                } else {
                    BrakeCommand::Freewheel
                };
                fx.push(Effect::SetBrake(brake));
            }
            Event::ParkFire if self.ctx.charger_point.is_some() => self.enter_charging(),
            other => {
                tracing::debug!("Ignoring '{}' in state {}", other.name(), self.state);
            }
        }
    }

    /// State-specific handling. Returns the event back when the active state
    /// has no handler for it.
    fn handle_state(&mut self, event: Event, fx: &mut Vec<Effect>) -> Option<Event> {
        match (self.state.clone(), event) {
            (State::Init, Event::InitCompleted(data)) => {
                self.ctx.apply_init(*data);
                self.state = State::EnterPasscode;
            }
            (State::EnterPasscode, Event::PasscodeEntered) => {
                self.state = State::ConfirmPosition(PositionPhase::AwaitingSelection);
            }

            // confirmPosition
            (
                State::ConfirmPosition(PositionPhase::AwaitingSelection),
                Event::InitPosConfirmed { home, charger },
            ) => {
                if self.ctx.map.point(&home).is_err() || self.ctx.map.point(&charger).is_err() {
                    tracing::warn!("Rejecting unknown home '{}' or charger '{}'", home, charger);
                    return None;
                }
                self.ctx.home_point = Some(home);
                self.ctx.charger_point = Some(charger);
                self.state = State::ConfirmPosition(PositionPhase::Overriding);
            }
            (State::ConfirmPosition(PositionPhase::Overriding), Event::PositionOverridden) => {
                self.ctx.assign_scheduler();
                if self.ctx.params.integration_test {
                    self.state = State::IntegrationTest(TestPhase::AwaitingSelection);
                } else if self.ctx.robot_kind() == RobotKind::Disinfection {
                    self.enter_charging();
                } else {
                    self.enter_idle(fx);
                }
            }

            // integrationTest
            (State::IntegrationTest(phase), event) => return self.handle_test(phase, event, fx),

            // idle / getItem
            (State::Idle(phase), event) => return self.handle_standby(phase, false, event, fx),
            (State::GetItem(phase), event) => return self.handle_standby(phase, true, event, fx),

            // charging
            (State::Charging(phase), event) => return self.handle_charging(phase, event, fx),

            // delivery
            (State::Delivery(phase), event) => return self.handle_delivery(phase, event, fx),

            // disinfection
            (State::Disinfection(DisinfectionPhase::FetchingMap), Event::MapImageFetched(image)) => {
                self.ctx.map_image = Some(std::sync::Arc::new(image));
                self.start_traversal(0, fx);
            }
            (
                State::Disinfection(DisinfectionPhase::Navigating { round, hop }),
                Event::NavigationSucceeded | Event::NavigationEscalated(_),
            ) => {
                // A blocked waypoint counts as reached.
                self.advance_hop(round, hop, fx);
            }
            (State::Disinfection(DisinfectionPhase::Navigating { round, hop }), Event::Pause) => {
                fx.push(Effect::CancelNavigation);
                self.state = State::Disinfection(DisinfectionPhase::Paused { round, hop });
            }
            (
                State::Disinfection(DisinfectionPhase::Paused { round, hop }),
                Event::Resume | Event::DelayElapsed,
            ) => {
                self.state = State::Disinfection(DisinfectionPhase::Navigating { round, hop });
            }

            // openLid / refill
            (State::OpenLid(phase), event) => return self.handle_refill(phase, false, event, fx),
            (State::Refill(phase), event) => return self.handle_refill(phase, true, event, fx),

            // returnHome
            (State::ReturnHome, Event::NavigationSucceeded) => self.enter_idle(fx),
            (State::ReturnHome, Event::NavigationEscalated(err)) => {
                tracing::error!("Return home failed: {}", err);
                self.state = State::FatalError;
            }

            (_, event) => return Some(event),
        }
        None
    }

    fn handle_test(&mut self, phase: TestPhase, event: Event, fx: &mut Vec<Effect>) -> Option<Event> {
        match (phase, event) {
            (TestPhase::AwaitingSelection, Event::BeginTest { tests, path_id }) => {
                if tests.is_empty() {
                    tracing::warn!("Integration test started without any stage");
                    return None;
                }
                if tests.run_path && self.ctx.path(&path_id).is_empty() {
                    tracing::warn!("Integration test path '{}' is unknown or empty", path_id);
                    return None;
                }
                self.ctx.test.selection = tests;
                self.ctx.test.path_id = Some(path_id);
                if !self.ctx.test.recording {
                    self.ctx.test.recording = true;
                    fx.push(Effect::RecordVideo(true));
                }
                self.enter_test_run_path();
            }
            (TestPhase::RunPath { round, hop }, Event::NavigationSucceeded | Event::NavigationEscalated(_)) => {
                let len = self.test_path_len();
                if hop + 1 >= len {
                    self.enter_test_park();
                } else {
                    self.state = State::IntegrationTest(TestPhase::RunPath { round, hop: hop + 1 });
                }
            }
            (TestPhase::Docking { .. }, Event::Parked) => {
                self.ctx.test.park_attempts += 1;
                self.ctx.test.park_successes += 1;
                self.state = State::IntegrationTest(TestPhase::Docked);
            }
            (TestPhase::Docking { attempt }, Event::ParkFailed) => {
                self.ctx.test.park_attempts += 1;
                self.state = State::IntegrationTest(TestPhase::Docking { attempt: attempt + 1 });
            }
            (TestPhase::Docked, Event::DelayElapsed) => self.enter_test_lid(),
            (TestPhase::LidOpening, Event::LidMoved) => {
                self.state = State::IntegrationTest(TestPhase::LidDelay);
            }
            (TestPhase::LidDelay, Event::DelayElapsed) => {
                self.state = State::IntegrationTest(TestPhase::LidClosing);
            }
            (TestPhase::LidClosing, Event::LidMoved) => {
                self.ctx.test.round += 1;
                self.enter_test_run_path();
            }
            (_, event) => return Some(event),
        }
        None
    }

    fn handle_standby(
        &mut self,
        phase: IdlePhase,
        get_item: bool,
        event: Event,
        fx: &mut Vec<Effect>,
    ) -> Option<Event> {
        match event {
            Event::Clear => self.clean(get_item, fx),
            Event::ToOpenLid if !get_item => self.state = State::OpenLid(RefillPhase::LidOpening),
            Event::ToRefill if get_item => self.state = State::Refill(RefillPhase::LidOpening),
            Event::ToCharging => self.enter_charging(),
            Event::StartDelivery => {
                self.state = State::Delivery(DeliveryPhase::EnterPasscodeInit);
            }
            Event::StartDisinfection(index) => self.start_scheduled_disinfection(index, fx),
            Event::QuickStartDisinfection { path_id } => self.begin_disinfection(path_id, 1, fx),
            other => {
                tracing::trace!("{:?} standby does not handle '{}'", phase, other.name());
                return Some(other);
            }
        }
        None
    }

    fn handle_charging(&mut self, phase: ChargingPhase, event: Event, fx: &mut Vec<Effect>) -> Option<Event> {
        match (phase, event) {
            (ChargingPhase::Docking { .. }, Event::Parked) => {
                self.state = State::Charging(ChargingPhase::Docked);
            }
            (ChargingPhase::Docking { attempt }, Event::ParkFailed) => {
                self.state = State::Charging(ChargingPhase::Docking { attempt: attempt + 1 });
            }
            (ChargingPhase::Docked, Event::Wake) => {
                if self.ctx.robot_kind() == RobotKind::Disinfection {
                    self.state = State::Charging(ChargingPhase::EnterPasscode);
                } else if self.ctx.status.charge >= self.ctx.params.min_battery_wakeup {
                    self.state = State::ReturnHome;
                } else {
                    tracing::info!(
                        "Wake ignored, charge {:.0}% below {:.0}%",
                        self.ctx.status.charge,
                        self.ctx.params.min_battery_wakeup
                    );
                }
            }
            (ChargingPhase::EnterPasscode, Event::PasscodeEntered) => self.state = State::ReturnHome,
            (ChargingPhase::EnterPasscode, Event::Back) => {
                self.state = State::Charging(ChargingPhase::Docked);
            }
            (_, Event::Clear) => fx.push(Effect::Raise(Event::SendMission(MissionUpdate::clear()))),
            (_, Event::StartDisinfection(index)) => self.start_scheduled_disinfection(index, fx),
            (_, Event::QuickStartDisinfection { path_id }) => self.begin_disinfection(path_id, 1, fx),
            (_, event) => return Some(event),
        }
        None
    }

    fn handle_delivery(&mut self, phase: DeliveryPhase, event: Event, fx: &mut Vec<Effect>) -> Option<Event> {
        use DeliveryPhase::*;

        match (phase, event) {
            (EnterPasscodeInit, Event::PasscodeEntered) => self.enter_place_items(fx),
            (EnterPasscodeInit, Event::Back) => self.enter_idle(fx),

            (PlaceItems(PlacePhase::LidOpening), Event::LidMoved) => {
                self.state = State::Delivery(PlaceItems(PlacePhase::ItemPlacing));
            }
            (PlaceItems(PlacePhase::ItemPlacing), Event::ItemPlaced) => {
                self.state = State::Delivery(PlaceItems(PlacePhase::LidClosing));
            }
            (PlaceItems(PlacePhase::ItemPlacing), Event::Back) => {
                self.state = State::Delivery(PlaceItems(PlacePhase::Cancelled));
            }
            (PlaceItems(PlacePhase::LidClosing), Event::LidMoved) => {
                self.state = State::Delivery(ConfigRecipient);
            }
            (PlaceItems(PlacePhase::Cancelled), Event::LidMoved) => self.enter_idle(fx),
            (PlaceItems(_), Event::Back) => self.enter_idle(fx),

            (ConfigRecipient, Event::RecipientConfigured(meta)) => {
                fx.push(Effect::Raise(Event::SendMission(MissionUpdate::new(
                    None,
                    Some(meta),
                    false,
                ))));
                self.state = State::Delivery(ConfirmDetails);
            }
            (ConfigRecipient, Event::Back) => self.enter_place_items(fx),

            (ConfirmDetails, Event::DetailsConfirmed) => {
                let meta = self.ctx.mission.as_ref().and_then(|m| m.meta.clone());
                if !meta.as_ref().is_some_and(MissionMeta::has_destination) {
                    tracing::warn!("Details confirmed without a destination");
                    return None;
                }
                fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
                    MissionState::Move,
                    meta,
                ))));
                self.state = State::Delivery(Delivering);
            }
            (ConfirmDetails, Event::Back) => self.state = State::Delivery(ConfigRecipient),

            (Delivering, Event::NavigationRetrying(notice)) => {
                tracing::warn!("Delivery navigation retry #{}: {}", notice.attempt, notice.reason);
                fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
                    MissionState::Error,
                    self.mission_meta(),
                ))));
            }
            (Delivering, Event::NavigationSucceeded) => self.enter_wait_for_recipient(fx),
            (Delivering, Event::NavigationEscalated(err)) => {
                tracing::error!("Delivery navigation escalated: {}", err);
                self.state = State::FatalError;
            }

            (WaitForRecipient, Event::RecipientInteracted) => {
                self.state = State::Delivery(EnterPasscodeCollect);
            }
            (WaitForRecipient, Event::SmsFinished { delivered }) => {
                if !delivered {
                    tracing::warn!("Password could not be texted to the recipient");
                }
                self.ctx.sms_pending = false;
            }
            (EnterPasscodeCollect, Event::PasscodeEntered) => {
                self.state = State::Delivery(CollectItems(CollectPhase::LidOpening));
            }
            (EnterPasscodeCollect, Event::Back) => self.enter_wait_for_recipient(fx),

            (CollectItems(CollectPhase::LidOpening), Event::LidMoved) => {
                self.state = State::Delivery(CollectItems(CollectPhase::ItemCollection));
            }
            (CollectItems(CollectPhase::ItemCollection), Event::ItemCollected) => {
                self.state = State::Delivery(CollectItems(CollectPhase::LidClosing));
            }
            (CollectItems(CollectPhase::LidClosing), Event::LidMoved) => {
                fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
                    MissionState::Return,
                    self.mission_meta(),
                ))));
                self.state = State::ReturnHome;
            }

            (_, event) => return Some(event),
        }
        None
    }

    fn handle_refill(
        &mut self,
        phase: RefillPhase,
        get_item: bool,
        event: Event,
        fx: &mut Vec<Effect>,
    ) -> Option<Event> {
        let wrap = if get_item { State::Refill } else { State::OpenLid };
        match (phase, event) {
            (RefillPhase::LidOpening, Event::LidMoved) => self.state = wrap(RefillPhase::Refilling),
            (RefillPhase::Refilling, Event::Filled) => self.state = wrap(RefillPhase::LidClosing),
            (RefillPhase::LidClosing, Event::LidMoved) => {
                if get_item {
                    self.enter_get_item(fx);
                } else {
                    self.enter_idle(fx);
                }
            }
            (_, event) => return Some(event),
        }
        None
    }

    fn tick(&mut self, fx: &mut Vec<Effect>) {
        if self.ctx.tick_remain > 0 {
            self.ctx.tick_remain -= 1;
            return;
        }

        match self.state {
            State::Delivery(DeliveryPhase::CollectItems(CollectPhase::ItemCollection)) => {
                self.state = State::Delivery(DeliveryPhase::CollectItems(CollectPhase::LidClosing));
            }
            State::Delivery(DeliveryPhase::WaitForRecipient) => {
                let meta = self.mission_meta().unwrap_or_default();
                fx.push(Effect::Alert {
                    alarm: AlarmType::DeliveryFailure,
                    message: format!(
                        "Recipient: {}; \nDestination name: {}",
                        meta.phone_number.unwrap_or_default(),
                        meta.to.unwrap_or_default()
                    ),
                });
                self.state = State::ReturnHome;
            }
            State::Delivery(DeliveryPhase::PlaceItems(PlacePhase::ItemPlacing)) => {
                self.state = State::Delivery(DeliveryPhase::PlaceItems(PlacePhase::Cancelled));
            }
            State::Idle(_) => self.enter_charging(),
            _ => self.state = State::ReturnHome,
        }
    }

    fn assign_mission(&mut self, update: MissionUpdate, fx: &mut Vec<Effect>) {
        let next = Mission::assign(self.ctx.mission.as_ref(), &update, self.ctx.robot_kind());
        if let Some(event) = MissionEvent::between(self.ctx.mission.as_ref(), next.as_ref()) {
            fx.push(Effect::Journal(event));
        }
        if update.report && !self.ctx.debug_mode {
            fx.push(Effect::ReportMission(next.clone()));
        }
        self.ctx.mission = next;
    }

    fn mission_meta(&self) -> Option<MissionMeta> {
        self.ctx.mission.as_ref().and_then(|m| m.meta.clone())
    }

    // --- entries ---

    fn enter_idle(&mut self, fx: &mut Vec<Effect>) {
        self.mission_check(false, fx);
    }

    fn enter_get_item(&mut self, fx: &mut Vec<Effect>) {
        self.mission_check(true, fx);
    }

    fn standby(get_item: bool, phase: IdlePhase) -> State {
        if get_item {
            State::GetItem(phase)
        } else {
            State::Idle(phase)
        }
    }

    fn mission_check(&mut self, get_item: bool, fx: &mut Vec<Effect>) {
        let returned = self
            .ctx
            .mission
            .as_ref()
            .is_some_and(|m| m.state == MissionState::Return);

        if self.ctx.failed_delivery() {
            self.state = Self::standby(get_item, IdlePhase::FailedDelivery);
        } else if returned {
            fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
                MissionState::End,
                None,
            ))));
            if self.ctx.robot_kind() == RobotKind::Disinfection {
                self.enter_charging();
            } else {
                self.clean(get_item, fx);
            }
        } else {
            self.clean(get_item, fx);
        }
    }

    fn clean(&mut self, get_item: bool, fx: &mut Vec<Effect>) {
        fx.push(Effect::Raise(Event::SendMission(MissionUpdate::clear())));
        self.state = Self::standby(get_item, IdlePhase::Clean);
    }

    fn enter_charging(&mut self) {
        self.state = State::Charging(ChargingPhase::Docking { attempt: 0 });
    }

    fn enter_place_items(&mut self, fx: &mut Vec<Effect>) {
        fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
            MissionState::Start,
            None,
        ))));
        self.ctx.delivery_password = None;
        self.ctx.sms_pending = false;
        self.state = State::Delivery(DeliveryPhase::PlaceItems(PlacePhase::LidOpening));
    }

    fn enter_wait_for_recipient(&mut self, fx: &mut Vec<Effect>) {
        fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
            MissionState::Code,
            self.mission_meta(),
        ))));
        let has_phone = self
            .mission_meta()
            .is_some_and(|meta| meta.phone_number.is_some());
        if self.ctx.delivery_password.is_none() && has_phone && !self.ctx.debug_mode {
            self.ctx.delivery_password = Some(generate_password());
            self.ctx.sms_pending = true;
        }
        self.state = State::Delivery(DeliveryPhase::WaitForRecipient);
    }

    fn start_scheduled_disinfection(&mut self, index: usize, fx: &mut Vec<Effect>) {
        let Some(home) = self.ctx.home_point.as_deref() else {
            return;
        };
        let target = self
            .ctx
            .map
            .home_schedule(home)
            .get(index)
            .and_then(|entry| Some((entry.disinfection.as_ref()?.path_id.clone(), entry.repetition)));

        match target {
            Some((path_id, repetition)) => self.begin_disinfection(path_id, repetition, fx),
            None => tracing::warn!("Schedule entry {} has no disinfection path", index),
        }
    }

    fn begin_disinfection(&mut self, path_id: String, repetition: u32, fx: &mut Vec<Effect>) {
        if self.ctx.path(&path_id).is_empty() {
            tracing::warn!("Disinfection path '{}' is unknown or empty", path_id);
            return;
        }

        let meta = MissionMeta::disinfection(path_id, repetition);
        if self.ctx.status.charge < self.ctx.params.min_battery_disinfection {
            tracing::info!(
                "Skipping disinfection, charge {:.0}% below {:.0}%",
                self.ctx.status.charge,
                self.ctx.params.min_battery_disinfection
            );
            fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
                MissionState::Skip,
                Some(meta),
            ))));
            return;
        }

        fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
            MissionState::Start,
            Some(meta),
        ))));
        self.state = State::Disinfection(DisinfectionPhase::FetchingMap);
    }

    fn disinfection_meta(&self) -> MissionMeta {
        self.mission_meta().unwrap_or_default()
    }

    fn disinfection_path_len(&self) -> usize {
        self.disinfection_meta()
            .path_id
            .map(|id| self.ctx.path(&id).len())
            .unwrap_or(0)
    }

    fn start_traversal(&mut self, round: u32, fx: &mut Vec<Effect>) {
        if self.disinfection_path_len() == 0 {
            let mut meta = self.disinfection_meta();
            meta.repetition = Some(0);
            self.finish_disinfection(meta, fx);
        } else {
            self.state = State::Disinfection(DisinfectionPhase::Navigating { round, hop: 0 });
        }
    }

    fn advance_hop(&mut self, round: u32, hop: usize, fx: &mut Vec<Effect>) {
        if hop + 1 >= self.disinfection_path_len() {
            self.complete_traversal(round, fx);
        } else {
            self.state = State::Disinfection(DisinfectionPhase::Navigating { round, hop: hop + 1 });
        }
    }

    /// One full pass over the path: decrement the remaining repetitions and
    /// either start over or head home.
    fn complete_traversal(&mut self, round: u32, fx: &mut Vec<Effect>) {
        let mut meta = self.disinfection_meta();
        let remaining = meta.repetition.unwrap_or(1).saturating_sub(1);
        meta.repetition = Some(remaining);

        fx.push(Effect::Raise(Event::SendMission(MissionUpdate::silent(
            MissionState::Move,
            Some(meta.clone()),
        ))));

        if remaining == 0 {
            self.finish_disinfection(meta, fx);
        } else {
            self.start_traversal(round + 1, fx);
        }
    }

    fn finish_disinfection(&mut self, meta: MissionMeta, fx: &mut Vec<Effect>) {
        fx.push(Effect::Raise(Event::SendMission(MissionUpdate::reported(
            MissionState::Return,
            Some(meta),
        ))));
        self.state = State::ReturnHome;
    }

    fn test_path_len(&self) -> usize {
        self.ctx
            .test
            .path_id
            .as_deref()
            .map(|id| self.ctx.path(id).len())
            .unwrap_or(0)
    }

    fn enter_test_run_path(&mut self) {
        if self.ctx.test.selection.run_path && self.test_path_len() > 0 {
            self.state = State::IntegrationTest(TestPhase::RunPath {
                round: self.ctx.test.round,
                hop: 0,
            });
        } else {
            self.enter_test_park();
        }
    }

    fn enter_test_park(&mut self) {
        if self.ctx.test.selection.park_cycle {
            self.state = State::IntegrationTest(TestPhase::Docking { attempt: 0 });
        } else {
            self.enter_test_lid();
        }
    }

    fn enter_test_lid(&mut self) {
        if self.ctx.test.selection.lid_cycle {
            self.state = State::IntegrationTest(TestPhase::LidOpening);
        } else {
            self.ctx.test.round += 1;
            self.enter_test_run_path();
        }
    }
}

/// Four digits, never starting with zero.
fn generate_password() -> String {
    rand::thread_rng().gen_range(1000..10000).to_string()
}
