use super::context::Context;
use super::events::Event;
use super::runtime::RuntimeSettings;
use super::state::*;
use crate::domains::navigation::{NavigationController, NavigationRequest};
use crate::domains::robot::{
    AlarmType, DynPlatform, LidCommand, NavGoal, OutboundMessage, PlatformError, PlatformResult, Target,
};
use crate::domains::schedule::emit_due;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type ServiceId = u64;

pub(crate) type ServiceSender = mpsc::UnboundedSender<(ServiceId, Event)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayKind {
    PauseCooldown,
    DockedSettle,
    LidTestHold,
}

/// A background task scoped to a state. Two specs that compare equal are the
/// same running service; a changed spec means stop the old task and start a
/// new one.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceSpec {
    PollStatus,
    CallInit,
    OverridePosition { home: String },
    Lid { scope: String, command: LidCommand },
    Park { scope: String, charger: String, attempt: u32 },
    Countdown { scope: String, seconds: u64 },
    Scheduler { owner: &'static str },
    Navigation { scope: String, target: Target, timeout_secs: u64, round: u32, hop: usize },
    FetchMapImage,
    Sprayer { scope: &'static str },
    Delay { kind: DelayKind },
    SmsPassword { phone_number: String, password: String },
}

impl ServiceSpec {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceSpec::PollStatus => "pollStatus",
            ServiceSpec::CallInit => "callInit",
            ServiceSpec::OverridePosition { .. } => "overridePosition",
            ServiceSpec::Lid { .. } => "lid",
            ServiceSpec::Park { .. } => "park",
            ServiceSpec::Countdown { .. } => "timeoutTimer",
            ServiceSpec::Scheduler { .. } => "disinfectionScheduler",
            ServiceSpec::Navigation { .. } => "navigation",
            ServiceSpec::FetchMapImage => "fetchMapImage",
            ServiceSpec::Sprayer { .. } => "disinfect",
            ServiceSpec::Delay { .. } => "delay",
            ServiceSpec::SmsPassword { .. } => "sendPassword",
        }
    }
}

/// Services the given state runs.
pub(crate) fn derive(state: &State, ctx: &Context) -> Vec<ServiceSpec> {
    if state.is_terminal() {
        return Vec::new();
    }

    let scope = state.path();
    let params = &ctx.params;
    let countdown = |seconds: u64| ServiceSpec::Countdown {
        scope: scope.clone(),
        seconds,
    };
    let lid = |command: LidCommand| ServiceSpec::Lid {
        scope: scope.clone(),
        command,
    };
    let hop_target = |path_id: Option<&str>, hop: usize| {
        path_id
            .and_then(|id| ctx.path(id).get(hop))
            .map(|point| Target::coordinate(*point, -1.0))
    };

    let mut services = vec![ServiceSpec::PollStatus];
    match state {
        State::Init => services.push(ServiceSpec::CallInit),
        State::ConfirmPosition(PositionPhase::Overriding) => {
            if let Some(home) = &ctx.home_point {
                services.push(ServiceSpec::OverridePosition { home: home.clone() });
            }
        }
        State::IntegrationTest(phase) => match phase {
            TestPhase::RunPath { round, hop } => {
                if let Some(target) = hop_target(ctx.test.path_id.as_deref(), *hop) {
                    services.push(ServiceSpec::Navigation {
                        scope: scope.clone(),
                        target,
                        timeout_secs: params.nav_timeout_integration_test,
                        round: *round,
                        hop: *hop,
                    });
                }
                services.push(ServiceSpec::Sprayer { scope: "integrationTest" });
            }
            TestPhase::Docking { attempt } => services.extend(park(ctx, &scope, *attempt)),
            TestPhase::Docked => services.push(ServiceSpec::Delay {
                kind: DelayKind::DockedSettle,
            }),
            TestPhase::LidOpening => services.push(lid(LidCommand::Open)),
            TestPhase::LidDelay => services.push(ServiceSpec::Delay {
                kind: DelayKind::LidTestHold,
            }),
            TestPhase::LidClosing => services.push(lid(LidCommand::Close)),
            TestPhase::AwaitingSelection => {}
        },
        State::Idle(_) => {
            services.push(countdown(params.idle_timeout_standby));
            services.extend(scheduler(ctx, "standby"));
        }
        State::GetItem(_) => services.extend(scheduler(ctx, "standby")),
        State::Charging(phase) => {
            services.extend(scheduler(ctx, "charging"));
            if let ChargingPhase::Docking { attempt } = phase {
                services.extend(park(ctx, &scope, *attempt));
            }
        }
        State::Delivery(phase) => match phase {
            DeliveryPhase::EnterPasscodeInit
            | DeliveryPhase::PlaceItems(PlacePhase::ItemPlacing)
            | DeliveryPhase::ConfigRecipient
            | DeliveryPhase::ConfirmDetails => services.push(countdown(params.idle_timeout_item_place)),
            DeliveryPhase::PlaceItems(PlacePhase::LidOpening)
            | DeliveryPhase::CollectItems(CollectPhase::LidOpening) => services.push(lid(LidCommand::Open)),
            DeliveryPhase::PlaceItems(PlacePhase::LidClosing | PlacePhase::Cancelled)
            | DeliveryPhase::CollectItems(CollectPhase::LidClosing) => services.push(lid(LidCommand::Close)),
            DeliveryPhase::Delivering => {
                let destination = ctx.mission.as_ref().and_then(|m| m.meta.as_ref()?.to.clone());
                if let Some(to) = destination {
                    services.push(ServiceSpec::Navigation {
                        scope: scope.clone(),
                        target: Target::Waypoint(to),
                        timeout_secs: params.nav_timeout_deliver,
                        round: 0,
                        hop: 0,
                    });
                }
            }
            DeliveryPhase::WaitForRecipient => {
                services.push(countdown(params.idle_timeout_wait_recipient));
                let phone = ctx
                    .mission
                    .as_ref()
                    .and_then(|m| m.meta.as_ref()?.phone_number.clone());
                if let (true, Some(phone_number), Some(password)) =
                    (ctx.sms_pending, phone, ctx.delivery_password.clone())
                {
                    services.push(ServiceSpec::SmsPassword { phone_number, password });
                }
            }
            DeliveryPhase::EnterPasscodeCollect => services.push(countdown(params.idle_timeout_wait_recipient)),
            DeliveryPhase::CollectItems(CollectPhase::ItemCollection) => {
                services.push(countdown(params.idle_timeout_item_collect))
            }
        },
        State::Disinfection(phase) => {
            let path_id = ctx.mission.as_ref().and_then(|m| m.meta.as_ref()?.path_id.clone());
            match phase {
                DisinfectionPhase::FetchingMap => services.push(ServiceSpec::FetchMapImage),
                DisinfectionPhase::Navigating { round, hop } => {
                    if let Some(target) = hop_target(path_id.as_deref(), *hop) {
                        services.push(ServiceSpec::Navigation {
                            scope: scope.clone(),
                            target,
                            timeout_secs: params.nav_timeout_navigation,
                            round: *round,
                            hop: *hop,
                        });
                    }
                    services.push(ServiceSpec::Sprayer { scope: "disinfection" });
                }
                DisinfectionPhase::Paused { .. } => {
                    services.push(ServiceSpec::Sprayer { scope: "disinfection" });
                    services.push(ServiceSpec::Delay {
                        kind: DelayKind::PauseCooldown,
                    });
                }
            }
        }
        State::OpenLid(phase) | State::Refill(phase) => match phase {
            RefillPhase::LidOpening => services.push(lid(LidCommand::Open)),
            RefillPhase::LidClosing => services.push(lid(LidCommand::Close)),
            RefillPhase::Refilling => {}
        },
        State::ReturnHome => {
            if let Some(home) = &ctx.home_point {
                services.push(ServiceSpec::Navigation {
                    scope: scope.clone(),
                    target: Target::Waypoint(home.clone()),
                    timeout_secs: params.nav_timeout_return,
                    round: 0,
                    hop: 0,
                });
            }
        }
        State::EnterPasscode
        | State::ConfirmPosition(PositionPhase::AwaitingSelection)
        | State::FatalError => {}
    }
    services
}

fn scheduler(ctx: &Context, owner: &'static str) -> Option<ServiceSpec> {
    ctx.scheduler.as_ref().map(|_| ServiceSpec::Scheduler { owner })
}

fn park(ctx: &Context, scope: &str, attempt: u32) -> Option<ServiceSpec> {
    ctx.charger_point.as_ref().map(|charger| ServiceSpec::Park {
        scope: scope.to_string(),
        charger: charger.clone(),
        attempt,
    })
}

/// Tags every event a service emits with the service's id so that results of
/// a stopped service can be told apart and dropped.
#[derive(Clone)]
struct Emitter {
    id: ServiceId,
    tx: ServiceSender,
}

impl Emitter {
    fn emit(&self, event: Event) -> bool {
        self.tx.send((self.id, event)).is_ok()
    }
}

/// Start the task behind a spec. The context is read once, at start.
pub(crate) fn spawn(
    spec: &ServiceSpec,
    id: ServiceId,
    ctx: &Context,
    platform: &DynPlatform,
    settings: &RuntimeSettings,
    tx: ServiceSender,
) -> JoinHandle<()> {
    let out = Emitter { id, tx };
    let platform = platform.clone();
    let settings = settings.clone();

    match spec.clone() {
        ServiceSpec::PollStatus => tokio::spawn(poll_status(platform, settings.status_poll, out)),
        ServiceSpec::CallInit => tokio::spawn(async move {
            let capabilities = settings.capabilities;
            let data = retry_forever("init", settings.retry_backoff, || platform.init(capabilities)).await;
            out.emit(Event::InitCompleted(Box::new(data)));
        }),
        ServiceSpec::OverridePosition { home } => tokio::spawn(async move {
            retry_forever("position override", settings.retry_backoff, || platform.nav_position(&home)).await;
            out.emit(Event::PositionOverridden);
        }),
        ServiceSpec::Lid { command, .. } => tokio::spawn(async move {
            retry_forever("lid", settings.retry_backoff, || platform.set_lid(command)).await;
            out.emit(Event::LidMoved);
        }),
        ServiceSpec::Park { charger, attempt, .. } => tokio::spawn(async move {
            match park_at(&platform, &charger, settings.park_charge_await).await {
                Ok(()) => {
                    out.emit(Event::Parked);
                }
                Err(e) => {
                    tracing::warn!("Park attempt {} at '{}' failed: {}", attempt + 1, charger, e);
                    tokio::time::sleep(settings.retry_backoff).await;
                    out.emit(Event::ParkFailed);
                }
            }
        }),
        ServiceSpec::Countdown { seconds, .. } => {
            let seconds = if seconds == 0 {
                settings.default_countdown_secs
            } else {
                seconds
            };
            tokio::spawn(countdown(seconds, settings.tick, out))
        }
        ServiceSpec::Scheduler { .. } => match ctx.scheduler.clone() {
            Some(scheduler) => tokio::spawn(async move {
                let id = out.id;
                emit_due(scheduler, out.tx, move |index| (id, Event::StartDisinfection(index))).await;
            }),
            None => tokio::spawn(async {}),
        },
        ServiceSpec::Navigation { target, timeout_secs, .. } => {
            let request = NavigationRequest::new(target, ctx.map.clone())
                .with_timeout(Some(Duration::from_secs(timeout_secs)))
                .from_status(&ctx.status);
            tokio::spawn(navigate(platform, request, settings, out))
        }
        ServiceSpec::FetchMapImage => tokio::spawn(async move {
            let image = retry_forever("map image", settings.retry_backoff, || platform.map_image()).await;
            out.emit(Event::MapImageFetched(image));
        }),
        ServiceSpec::Sprayer { .. } => tokio::spawn(async move {
            if let Err(e) = platform.set_disinfection(true).await {
                tracing::warn!("Failed to switch sprayer on: {}", e);
            }
            std::future::pending::<()>().await;
        }),
        ServiceSpec::Delay { kind } => {
            let duration = match kind {
                DelayKind::PauseCooldown => settings.pause_cooldown,
                DelayKind::DockedSettle => settings.docked_settle,
                DelayKind::LidTestHold => settings.lid_test_hold,
            };
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                out.emit(Event::DelayElapsed);
            })
        }
        ServiceSpec::SmsPassword {
            phone_number,
            password,
        } => tokio::spawn(send_password(platform, phone_number, password, settings, out)),
    }
}

async fn retry_forever<T, F, Fut>(what: &str, backoff: Duration, mut call: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PlatformResult<T>>,
{
    loop {
        match call().await {
            Ok(value) => return value,
            Err(e) => {
                tracing::warn!("{} call failed, retrying: {}", what, e);
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Poll once per period. A poll still in flight when the next period starts
/// is dropped in favour of a fresh one.
async fn poll_status(platform: DynPlatform, period: Duration, out: Emitter) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            result = platform.status() => {
                match result {
                    Ok(status) => {
                        if !out.emit(Event::StatusUpdate(Box::new(status))) {
                            return;
                        }
                    }
                    Err(e) => tracing::debug!("Status poll failed: {}", e),
                }
                ticker.tick().await;
            }
            _ = ticker.tick() => {
                tracing::debug!("Status poll superseded");
            }
        }
    }
}

async fn park_at(platform: &DynPlatform, charger: &str, charge_await: Duration) -> PlatformResult<()> {
    let message = platform
        .nav_goal(&NavGoal::to(Target::Waypoint(charger.to_string())))
        .await?;
    if message != "success" {
        return Err(PlatformError::Rejected { reason: message });
    }
    platform.nav_park(charge_await).await
}

async fn countdown(seconds: u64, tick: Duration, out: Emitter) {
    let remain = i64::try_from(seconds).unwrap_or(i64::MAX);
    if !out.emit(Event::SetTickRemain(remain)) {
        return;
    }
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
    loop {
        ticker.tick().await;
        if !out.emit(Event::Tick) {
            return;
        }
    }
}

async fn navigate(platform: DynPlatform, request: NavigationRequest, settings: RuntimeSettings, out: Emitter) {
    let (notice_tx, mut notices) = mpsc::unbounded_channel();
    let controller = NavigationController::new(platform, request, settings.navigation).with_notices(notice_tx);
    let run = controller.run();
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            Some(notice) = notices.recv() => {
                out.emit(Event::NavigationRetrying(notice));
            }
        }
    };
    while let Ok(notice) = notices.try_recv() {
        out.emit(Event::NavigationRetrying(notice));
    }

    match result {
        Ok(outcome) => {
            tracing::debug!(
                "Navigation finished after {} attempt(s) in {:?}",
                outcome.attempts,
                outcome.elapsed
            );
            out.emit(Event::NavigationSucceeded);
        }
        Err(e) => {
            out.emit(Event::NavigationEscalated(e));
        }
    }
}

async fn send_password(
    platform: DynPlatform,
    phone_number: String,
    password: String,
    settings: RuntimeSettings,
    out: Emitter,
) {
    let message = OutboundMessage {
        platform: "sms".to_string(),
        phone_number: phone_number.clone(),
        sender_id: settings.sender_id.clone(),
        message: format!(
            "Hi, your delivery robot has arrived with items for you. Please meet it at your door with this password: {}",
            password
        ),
    };

    for attempt in 1..=settings.sms_attempts {
        match platform.send_message(&message).await {
            Ok(()) => {
                out.emit(Event::SmsFinished { delivered: true });
                return;
            }
            Err(e) => {
                tracing::warn!("SMS attempt {} to {} failed: {}", attempt, phone_number, e);
                let alert = format!("Recipient: {}; \nOriginal message: {}", phone_number, message.message);
                if let Err(e) = platform.alert(AlarmType::SmsFailure, &alert).await {
                    tracing::error!("Failed to raise sms-failure alert: {}", e);
                }
                if attempt < settings.sms_attempts {
                    tokio::time::sleep(settings.sms_retry_delay).await;
                }
            }
        }
    }
    out.emit(Event::SmsFinished { delivered: false });
}
