use super::context::Context;
use super::events::Event;
use super::machine::{Effect, Machine};
use super::services::{self, ServiceId, ServiceSender, ServiceSpec};
use super::state::State;
use crate::domains::logger::DynLogger;
use crate::domains::mission::{Mission, MissionEvent};
use crate::domains::navigation::NavigationSettings;
use crate::domains::robot::{
    AlarmType, BrakeCommand, Capabilities, DynPlatform, LidCommand, RobotStatus,
};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Delays and budgets used by the orchestrator's services.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub tick: Duration,
    pub status_poll: Duration,
    pub retry_backoff: Duration,
    pub park_charge_await: Duration,
    pub pause_cooldown: Duration,
    pub docked_settle: Duration,
    pub lid_test_hold: Duration,
    pub sms_retry_delay: Duration,
    pub sms_attempts: u32,
    /// Countdown length when a phase has no configured timeout.
    pub default_countdown_secs: u64,
    pub navigation: NavigationSettings,
    pub capabilities: Capabilities,
    pub sender_id: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            status_poll: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(1),
            park_charge_await: Duration::from_secs(5),
            pause_cooldown: Duration::from_secs(60),
            docked_settle: Duration::from_secs(5),
            lid_test_hold: Duration::from_secs(10),
            sms_retry_delay: Duration::from_secs(60),
            sms_attempts: 3,
            default_countdown_secs: 300,
            navigation: NavigationSettings::default(),
            capabilities: Capabilities {
                state_inspector: true,
            },
            sender_id: "Errand Robotics".to_string(),
        }
    }
}

/// What the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub version: u64,
    pub state: State,
    pub path: String,
    pub mission: Option<Mission>,
    pub tick_remain: i64,
    pub status: RobotStatus,
    pub failed_delivery: bool,
    pub skipped_disinfection: bool,
    /// Password the recipient has to type in. Never serialized.
    #[serde(skip)]
    pub delivery_password: Option<String>,
}

impl StateView {
    pub fn of(machine: &Machine) -> Self {
        let ctx = &machine.ctx;
        Self {
            version: machine.version,
            state: machine.state.clone(),
            path: machine.state.path(),
            mission: ctx.mission.clone(),
            tick_remain: ctx.tick_remain,
            status: ctx.status.clone(),
            failed_delivery: ctx.failed_delivery(),
            skipped_disinfection: ctx.skipped_disinfection(),
            delivery_password: ctx.delivery_password.clone(),
        }
    }
}

/// The side of the orchestrator the outside world holds on to.
#[derive(Clone)]
pub struct OrchestratorHandle {
    pub intents: mpsc::Sender<Event>,
    pub view: watch::Receiver<StateView>,
}

/// Platform calls that result from transitions. They run on a single worker
/// so that they reach the platform in the order they were issued.
#[derive(Debug)]
enum PlatformCall {
    ReportMission(Option<Mission>),
    Alert { alarm: AlarmType, message: String },
    CancelNavigation,
    RecordVideo(bool),
    SetLid(LidCommand),
    SetBrake(BrakeCommand),
    Sprayer(bool),
}

struct RunningService {
    id: ServiceId,
    spec: ServiceSpec,
    task: JoinHandle<()>,
}

/// Single event loop around [`Machine`]. Owns the running services and starts
/// or stops them after every processed event.
pub struct Orchestrator {
    machine: Machine,
    platform: DynPlatform,
    logger: DynLogger,
    settings: RuntimeSettings,
    journal: Option<mpsc::Sender<MissionEvent>>,
    intents: mpsc::Receiver<Event>,
    service_tx: ServiceSender,
    service_rx: mpsc::UnboundedReceiver<(ServiceId, Event)>,
    running: Vec<RunningService>,
    next_service_id: ServiceId,
    calls_tx: mpsc::UnboundedSender<PlatformCall>,
    calls_rx: Option<mpsc::UnboundedReceiver<PlatformCall>>,
    view: watch::Sender<StateView>,
}

impl Orchestrator {
    pub fn new(
        platform: DynPlatform,
        logger: DynLogger,
        settings: RuntimeSettings,
        debug_mode: bool,
    ) -> (Self, OrchestratorHandle) {
        let machine = Machine::new(Context::new(debug_mode));
        let (intents_tx, intents) = mpsc::channel(64);
        let (service_tx, service_rx) = mpsc::unbounded_channel();
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        let (view, view_rx) = watch::channel(StateView::of(&machine));

        let orchestrator = Self {
            machine,
            platform,
            logger,
            settings,
            journal: None,
            intents,
            service_tx,
            service_rx,
            running: Vec::new(),
            next_service_id: 0,
            calls_tx,
            calls_rx: Some(calls_rx),
            view,
        };
        let handle = OrchestratorHandle {
            intents: intents_tx,
            view: view_rx,
        };
        (orchestrator, handle)
    }

    /// Forward every mission mutation to a journal actor.
    pub fn with_journal(mut self, journal: mpsc::Sender<MissionEvent>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Run until the robot lands in the fatal error state or every intent
    /// sender is gone. Returns the final state.
    pub async fn run(mut self) -> State {
        let worker = self
            .calls_rx
            .take()
            .map(|calls| tokio::spawn(platform_worker(self.platform.clone(), calls)));

        self.logger
            .info(&format!("Orchestrator starting in state {}", self.machine.state));
        self.reconcile_services();
        self.publish();

        while !self.machine.state.is_terminal() {
            let event = tokio::select! {
                biased;
                Some((id, event)) = self.service_rx.recv() => {
                    if !self.running.iter().any(|s| s.id == id) {
                        tracing::trace!("Dropping '{}' from stopped service {}", event.name(), id);
                        continue;
                    }
                    event
                }
                intent = self.intents.recv() => match intent {
                    Some(event) => event,
                    None => {
                        tracing::info!("Intent channel closed, stopping orchestrator");
                        break;
                    }
                },
            };
            self.dispatch(event).await;
        }

        for service in std::mem::take(&mut self.running) {
            self.stop_service(service);
        }
        let final_state = self.machine.state.clone();
        drop(self);
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("Platform call worker failed: {}", e);
            }
        }
        final_state
    }

    async fn dispatch(&mut self, event: Event) {
        let name = event.name();
        let before = self.machine.state.clone();

        let (machine, effects) = std::mem::take(&mut self.machine).settle(event);
        self.machine = machine;

        for effect in effects {
            self.apply(effect).await;
        }

        if self.machine.state != before {
            self.logger
                .info(&format!("{} --{}--> {}", before, name, self.machine.state));
            if self.machine.state.is_terminal() {
                self.logger
                    .error("Robot entered the fatal error state and needs manual intervention");
            }
        }

        self.reconcile_services();
        self.publish();
    }

    async fn apply(&mut self, effect: Effect) {
        let call = match effect {
            Effect::Raise(event) => {
                tracing::warn!("Unsettled event '{}' reached the runtime", event.name());
                return;
            }
            Effect::Journal(event) => {
                if let Some(journal) = &self.journal {
                    if journal.send(event).await.is_err() {
                        tracing::warn!("Mission journal is gone, dropping event");
                    }
                }
                return;
            }
            Effect::ReportMission(mission) => {
                match &mission {
                    Some(m) => self
                        .logger
                        .info(&format!("Mission {} reported as {:?}", m.id, m.state)),
                    None => self.logger.info("Mission cleared"),
                }
                PlatformCall::ReportMission(mission)
            }
            Effect::Alert { alarm, message } => {
                self.logger.warn(&format!("Alert {:?}: {}", alarm, message));
                PlatformCall::Alert { alarm, message }
            }
            Effect::CancelNavigation => PlatformCall::CancelNavigation,
            Effect::RecordVideo(on) => PlatformCall::RecordVideo(on),
            Effect::SetLid(lid) => PlatformCall::SetLid(lid),
            Effect::SetBrake(brake) => PlatformCall::SetBrake(brake),
        };
        self.queue_call(call);
    }

    fn queue_call(&self, call: PlatformCall) {
        if self.calls_tx.send(call).is_err() {
            tracing::warn!("Platform call worker is gone");
        }
    }

    fn reconcile_services(&mut self) {
        let wanted = self.machine.services();

        let (keep, stop): (Vec<_>, Vec<_>) = std::mem::take(&mut self.running)
            .into_iter()
            .partition(|s| wanted.contains(&s.spec));
        self.running = keep;
        for service in stop {
            self.stop_service(service);
        }

        for spec in wanted {
            if self.running.iter().any(|s| s.spec == spec) {
                continue;
            }
            let id = self.next_service_id;
            self.next_service_id += 1;
            tracing::debug!("Starting service {} ({})", spec.name(), id);
            let task = services::spawn(
                &spec,
                id,
                &self.machine.ctx,
                &self.platform,
                &self.settings,
                self.service_tx.clone(),
            );
            self.running.push(RunningService { id, spec, task });
        }
    }

    fn stop_service(&self, service: RunningService) {
        tracing::debug!("Stopping service {} ({})", service.spec.name(), service.id);
        service.task.abort();
        if let ServiceSpec::Sprayer { .. } = service.spec {
            self.queue_call(PlatformCall::Sprayer(false));
        }
    }

    fn publish(&self) {
        self.view.send_replace(StateView::of(&self.machine));
    }
}

async fn platform_worker(platform: DynPlatform, mut calls: mpsc::UnboundedReceiver<PlatformCall>) {
    while let Some(call) = calls.recv().await {
        let result = match &call {
            PlatformCall::ReportMission(mission) => platform.report_mission(mission.as_ref()).await,
            PlatformCall::Alert { alarm, message } => platform.alert(*alarm, message).await,
            PlatformCall::CancelNavigation => platform.nav_cancel().await,
            PlatformCall::RecordVideo(on) => platform.record_video(*on).await,
            PlatformCall::SetLid(lid) => platform.set_lid(*lid).await,
            PlatformCall::SetBrake(brake) => platform.set_ebrake(*brake).await,
            PlatformCall::Sprayer(on) => platform.set_disinfection(*on).await,
        };
        if let Err(e) = result {
            tracing::warn!("Platform call {:?} failed: {}", call, e);
        }
    }
}
