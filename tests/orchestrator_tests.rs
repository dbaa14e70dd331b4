use errand_app::adapters::outbound::demo_site;
use errand_app::domains::mission::{MissionEvent, MissionMeta, MissionState};
use errand_app::domains::navigation::{NavigationError, NavigationNotice};
use errand_app::domains::robot::*;
use errand_app::domains::orchestrator::*;
use errand_app::domains::schedule::{ScheduleEntry, StartTime, WeekdayMask};
use errand_app::domains::site::Path;
use std::sync::Arc;

const PHONE: &str = "+85291234567";

fn status(charge: f64) -> Event {
    Event::StatusUpdate(Box::new(RobotStatus {
        charge,
        online: true,
        ..Default::default()
    }))
}

fn run(machine: Machine, events: Vec<Event>) -> (Machine, Vec<Effect>) {
    let mut machine = machine;
    let mut all = Vec::new();
    for event in events {
        let (next, effects) = machine.settle(event);
        machine = next;
        all.extend(effects);
    }
    (machine, all)
}

fn boot_with(kind: RobotKind, debug_mode: bool) -> Machine {
    boot_on(demo_site(kind), debug_mode)
}

fn boot_on(init: InitData, debug_mode: bool) -> Machine {
    let (machine, _) = run(
        Machine::new(Context::new(debug_mode)),
        vec![
            Event::InitCompleted(Box::new(init)),
            status(80.0),
            Event::PasscodeEntered,
            Event::InitPosConfirmed {
                home: "home-1".to_string(),
                charger: "charger-1".to_string(),
            },
            Event::PositionOverridden,
        ],
    );
    machine
}

fn boot(kind: RobotKind) -> Machine {
    boot_with(kind, false)
}

fn reports(effects: &[Effect]) -> Vec<Option<MissionState>> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::ReportMission(mission) => Some(mission.as_ref().map(|m| m.state)),
            _ => None,
        })
        .collect()
}

fn journal(effects: &[Effect]) -> Vec<&MissionEvent> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Journal(event) => Some(event),
            _ => None,
        })
        .collect()
}

/// Delivery robot standing in `delivery.delivering` on its way to room-101.
fn delivering(debug_mode: bool) -> Machine {
    let (machine, _) = run(
        boot_with(RobotKind::Delivery, debug_mode),
        vec![
            Event::StartDelivery,
            Event::PasscodeEntered,
            Event::LidMoved,
            Event::ItemPlaced,
            Event::LidMoved,
            Event::RecipientConfigured(MissionMeta::delivery("room-101", PHONE)),
            Event::DetailsConfirmed,
        ],
    );
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::Delivering));
    machine
}

#[test]
fn test_boot_sequence_reaches_clean_idle() {
    let (machine, _) = run(
        Machine::new(Context::new(false)),
        vec![Event::InitCompleted(Box::new(demo_site(RobotKind::Delivery)))],
    );
    assert_eq!(machine.state, State::EnterPasscode);
    assert!(machine.services().contains(&ServiceSpec::PollStatus));

    let (machine, _) = run(machine, vec![Event::PasscodeEntered]);
    assert_eq!(machine.state.path(), "confirmPosition.init");

    // Unknown points are rejected.
    let (machine, _) = run(
        machine,
        vec![Event::InitPosConfirmed {
            home: "nowhere".to_string(),
            charger: "charger-1".to_string(),
        }],
    );
    assert_eq!(machine.state, State::ConfirmPosition(PositionPhase::AwaitingSelection));

    let (machine, _) = run(
        machine,
        vec![Event::InitPosConfirmed {
            home: "home-1".to_string(),
            charger: "charger-1".to_string(),
        }],
    );
    assert!(machine.services().contains(&ServiceSpec::OverridePosition {
        home: "home-1".to_string()
    }));

    let (machine, effects) = run(machine, vec![Event::PositionOverridden]);
    assert_eq!(machine.state, State::Idle(IdlePhase::Clean));
    assert_eq!(reports(&effects), vec![None]);
    assert!(machine.ctx.scheduler.is_some());

    let services = machine.services();
    assert!(services.contains(&ServiceSpec::Scheduler { owner: "standby" }));
    assert!(services.contains(&ServiceSpec::Countdown {
        scope: "idle.clean".to_string(),
        seconds: machine.ctx.params.idle_timeout_standby,
    }));
}

#[test]
fn test_empty_disinfection_path_never_starts_a_mission() {
    let mut init = demo_site(RobotKind::Disinfection);
    let map = Arc::make_mut(&mut init.site.map);
    map.paths.insert(
        "empty".to_string(),
        Path {
            geometry: Vec::new(),
            name: None,
        },
    );
    let schedule = map
        .points
        .get_mut("home-1")
        .and_then(|p| p.waypoint.as_mut())
        .and_then(|w| w.home.as_mut())
        .and_then(|h| h.schedule.as_mut())
        .unwrap();
    schedule.push(
        ScheduleEntry::new(StartTime { hour: 6, minute: 0 }, WeekdayMask::ALL)
            .with_disinfection("empty", 1_000_000),
    );
    let index = schedule.len() - 1;

    let (machine, effects) = run(
        boot_on(init, false),
        vec![
            Event::Parked,
            Event::StartDisinfection(index),
            Event::QuickStartDisinfection {
                path_id: "empty".to_string(),
            },
        ],
    );

    assert_eq!(machine.state, State::Charging(ChargingPhase::Docked));
    assert!(reports(&effects).is_empty());
    assert!(machine.ctx.mission.is_none());
}

#[test]
fn test_password_is_texted_once_per_delivery() {
    let (machine, _) = run(delivering(false), vec![Event::NavigationSucceeded]);
    let password = machine.ctx.delivery_password.clone().unwrap();
    assert!(machine.ctx.sms_pending);

    // The recipient shows up before the text went out, then steps back.
    let (machine, _) = run(machine, vec![Event::RecipientInteracted]);
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::EnterPasscodeCollect));
    assert!(!machine.ctx.sms_pending);

    let (machine, effects) = run(machine, vec![Event::Back]);
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::WaitForRecipient));
    assert_eq!(reports(&effects), vec![Some(MissionState::Code)]);
    assert_eq!(machine.ctx.delivery_password.as_deref(), Some(password.as_str()));
    assert!(!machine
        .services()
        .iter()
        .any(|s| matches!(s, ServiceSpec::SmsPassword { .. })));
}

#[test]
fn test_disinfection_robot_docks_after_position_confirmation() {
    let machine = boot(RobotKind::Disinfection);
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docking { attempt: 0 }));

    let (machine, _) = run(machine, vec![Event::ParkFailed]);
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docking { attempt: 1 }));
    assert!(machine.services().contains(&ServiceSpec::Park {
        scope: "charging.docking".to_string(),
        charger: "charger-1".to_string(),
        attempt: 1,
    }));

    let (machine, _) = run(machine, vec![Event::Parked]);
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docked));
}

#[test]
fn test_scheduled_disinfection_runs_every_repetition() {
    let (machine, effects) = run(
        boot(RobotKind::Disinfection),
        vec![Event::Parked, Event::StartDisinfection(0)],
    );
    assert_eq!(machine.state, State::Disinfection(DisinfectionPhase::FetchingMap));
    assert_eq!(reports(&effects), vec![Some(MissionState::Start)]);
    let mission = machine.ctx.mission.clone().unwrap();
    assert_eq!(mission.meta, Some(MissionMeta::disinfection("ward-a", 2)));

    let (mut machine, _) = run(machine, vec![Event::MapImageFetched(vec![1, 2, 3])]);
    let mut effects = Vec::new();

    // ward-a has three points, walked twice.
    for round in 0..2 {
        for hop in 0..3 {
            assert_eq!(
                machine.state,
                State::Disinfection(DisinfectionPhase::Navigating { round, hop })
            );
            let services = machine.services();
            assert!(services.contains(&ServiceSpec::Sprayer { scope: "disinfection" }));
            assert!(services.iter().any(|s| matches!(s, ServiceSpec::Navigation { hop: h, .. } if *h == hop)));

            let (next, fx) = machine.settle(Event::NavigationSucceeded);
            machine = next;
            effects.extend(fx);
        }
    }

    assert_eq!(machine.state, State::ReturnHome);
    assert_eq!(reports(&effects), vec![Some(MissionState::Return)]);
    let meta = machine.ctx.mission.as_ref().unwrap().meta.clone().unwrap();
    assert_eq!(meta.repetition, Some(0));

    let kinds: Vec<_> = journal(&effects)
        .into_iter()
        .map(|e| match e {
            MissionEvent::StateChanged { to, .. } => format!("state:{:?}", to),
            MissionEvent::MetaUpdated { .. } => "meta".to_string(),
            other => format!("{:?}", other),
        })
        .collect();
    assert_eq!(kinds, vec!["state:Move", "meta", "state:Return"]);

    let (machine, effects) = run(machine, vec![Event::NavigationSucceeded]);
    assert_eq!(reports(&effects), vec![Some(MissionState::End)]);
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docking { attempt: 0 }));
}

#[test]
fn test_disinfection_pause_and_resume_keep_the_hop() {
    let (machine, _) = run(
        boot(RobotKind::Disinfection),
        vec![
            Event::QuickStartDisinfection {
                path_id: "ward-b".to_string(),
            },
            Event::MapImageFetched(Vec::new()),
            Event::NavigationSucceeded,
        ],
    );
    assert_eq!(
        machine.state,
        State::Disinfection(DisinfectionPhase::Navigating { round: 0, hop: 1 })
    );

    let (machine, effects) = run(machine, vec![Event::Pause]);
    assert_eq!(
        machine.state,
        State::Disinfection(DisinfectionPhase::Paused { round: 0, hop: 1 })
    );
    assert!(effects.iter().any(|e| matches!(e, Effect::CancelNavigation)));
    let services = machine.services();
    assert!(services.contains(&ServiceSpec::Delay {
        kind: DelayKind::PauseCooldown
    }));
    assert!(!services.iter().any(|s| matches!(s, ServiceSpec::Navigation { .. })));

    let (machine, _) = run(machine, vec![Event::Resume]);
    assert_eq!(
        machine.state,
        State::Disinfection(DisinfectionPhase::Navigating { round: 0, hop: 1 })
    );

    // The cooldown resumes on its own.
    let (machine, _) = run(machine, vec![Event::Pause, Event::DelayElapsed]);
    assert_eq!(
        machine.state,
        State::Disinfection(DisinfectionPhase::Navigating { round: 0, hop: 1 })
    );
}

#[test]
fn test_blocked_disinfection_waypoint_counts_as_reached() {
    let (machine, _) = run(
        boot(RobotKind::Disinfection),
        vec![
            Event::QuickStartDisinfection {
                path_id: "ward-b".to_string(),
            },
            Event::MapImageFetched(Vec::new()),
            Event::NavigationEscalated(NavigationError::Blocked { attempts: 3 }),
            Event::NavigationEscalated(NavigationError::Blocked { attempts: 3 }),
        ],
    );
    assert_eq!(machine.state, State::ReturnHome);
}

#[test]
fn test_low_battery_skips_disinfection() {
    let (machine, effects) = run(
        boot(RobotKind::Disinfection),
        vec![Event::Parked, status(10.0), Event::StartDisinfection(0)],
    );
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docked));
    assert_eq!(reports(&effects), vec![Some(MissionState::Skip)]);
    assert!(machine.ctx.skipped_disinfection());

    let (machine, effects) = run(machine, vec![Event::Clear]);
    assert!(machine.ctx.mission.is_none());
    assert_eq!(reports(&effects), vec![None]);
}

#[test]
fn test_unknown_schedule_entry_is_ignored() {
    let (machine, effects) = run(
        boot(RobotKind::Disinfection),
        vec![Event::Parked, Event::StartDisinfection(7)],
    );
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docked));
    assert!(reports(&effects).is_empty());
}

#[test]
fn test_delivery_happy_path() {
    let machine = boot(RobotKind::Delivery);
    let (machine, effects) = run(
        machine,
        vec![
            Event::StartDelivery,
            Event::PasscodeEntered,
            Event::LidMoved,
            Event::ItemPlaced,
            Event::LidMoved,
        ],
    );
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::ConfigRecipient));
    assert_eq!(reports(&effects), vec![Some(MissionState::Start)]);

    let (machine, effects) = run(
        machine,
        vec![
            Event::RecipientConfigured(MissionMeta::delivery("room-101", PHONE)),
            Event::DetailsConfirmed,
        ],
    );
    assert_eq!(reports(&effects), vec![Some(MissionState::Move)]);
    assert!(machine.services().contains(&ServiceSpec::Navigation {
        scope: "delivery.delivering".to_string(),
        target: Target::Waypoint("room-101".to_string()),
        timeout_secs: machine.ctx.params.nav_timeout_deliver,
        round: 0,
        hop: 0,
    }));

    let (machine, effects) = run(machine, vec![Event::NavigationSucceeded]);
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::WaitForRecipient));
    assert_eq!(reports(&effects), vec![Some(MissionState::Code)]);

    let password = machine.ctx.delivery_password.clone().unwrap();
    assert_eq!(password.len(), 4);
    assert!(!password.starts_with('0'));
    assert!(machine.services().contains(&ServiceSpec::SmsPassword {
        phone_number: PHONE.to_string(),
        password: password.clone(),
    }));

    let (machine, _) = run(machine, vec![Event::SmsFinished { delivered: true }]);
    assert!(!machine.ctx.sms_pending);
    assert!(!machine
        .services()
        .iter()
        .any(|s| matches!(s, ServiceSpec::SmsPassword { .. })));

    let (machine, effects) = run(
        machine,
        vec![
            Event::RecipientInteracted,
            Event::PasscodeEntered,
            Event::LidMoved,
            Event::ItemCollected,
            Event::LidMoved,
        ],
    );
    assert_eq!(machine.state, State::ReturnHome);
    assert_eq!(reports(&effects), vec![Some(MissionState::Return)]);
    assert!(!machine.ctx.failed_delivery());

    let (machine, effects) = run(machine, vec![Event::NavigationSucceeded]);
    assert_eq!(machine.state, State::Idle(IdlePhase::Clean));
    assert_eq!(reports(&effects), vec![Some(MissionState::End), None]);
    assert!(machine.ctx.mission.is_none());
}

#[test]
fn test_confirm_details_requires_a_destination() {
    let (machine, _) = run(
        boot(RobotKind::Delivery),
        vec![
            Event::StartDelivery,
            Event::PasscodeEntered,
            Event::LidMoved,
            Event::ItemPlaced,
            Event::LidMoved,
            Event::RecipientConfigured(MissionMeta::default()),
            Event::DetailsConfirmed,
        ],
    );
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::ConfirmDetails));

    let (machine, _) = run(machine, vec![Event::Back]);
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::ConfigRecipient));
}

#[test]
fn test_navigation_retry_reports_error_and_keeps_delivering() {
    let (machine, effects) = run(
        delivering(false),
        vec![Event::NavigationRetrying(NavigationNotice {
            attempt: 1,
            reason: "blocked".to_string(),
        })],
    );
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::Delivering));
    assert_eq!(reports(&effects), vec![Some(MissionState::Error)]);
}

#[test]
fn test_delivery_escalation_is_fatal() {
    let (machine, _) = run(
        delivering(false),
        vec![Event::NavigationEscalated(NavigationError::Blocked { attempts: 5 })],
    );
    assert_eq!(machine.state, State::FatalError);
    assert!(machine.services().is_empty());

    let version = machine.version;
    let (machine, effects) = run(machine, vec![Event::Clear, Event::StartDelivery]);
    assert_eq!(machine.state, State::FatalError);
    assert!(effects.is_empty());
    assert_eq!(machine.version, version + 2);
}

#[test]
fn test_recipient_timeout_alerts_and_leaves_failed_delivery() {
    let (machine, effects) = run(
        delivering(false),
        vec![
            Event::NavigationSucceeded,
            Event::SetTickRemain(1),
            Event::Tick,
        ],
    );
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::WaitForRecipient));
    assert_eq!(machine.ctx.tick_remain, 0);
    assert!(!effects.iter().any(|e| matches!(e, Effect::Alert { .. })));

    let (machine, effects) = run(machine, vec![Event::Tick]);
    assert_eq!(machine.state, State::ReturnHome);
    let alerts: Vec<_> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Alert { alarm, message } => Some((*alarm, message.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        alerts,
        vec![(
            AlarmType::DeliveryFailure,
            format!("Recipient: {}; \nDestination name: room-101", PHONE)
        )]
    );

    let (machine, effects) = run(machine, vec![Event::NavigationSucceeded]);
    assert_eq!(machine.state, State::Idle(IdlePhase::FailedDelivery));
    assert!(machine.ctx.failed_delivery());
    assert!(reports(&effects).is_empty());

    let (machine, effects) = run(machine, vec![Event::Clear]);
    assert_eq!(machine.state, State::Idle(IdlePhase::Clean));
    assert_eq!(reports(&effects), vec![None]);
}

#[test]
fn test_debug_mode_suppresses_reports_and_password() {
    let (machine, effects) = run(delivering(true), vec![Event::NavigationSucceeded]);
    assert_eq!(machine.state, State::Delivery(DeliveryPhase::WaitForRecipient));
    assert!(reports(&effects).is_empty());
    assert!(!journal(&effects).is_empty());
    assert!(machine.ctx.delivery_password.is_none());
    assert!(!machine
        .services()
        .iter()
        .any(|s| matches!(s, ServiceSpec::SmsPassword { .. })));
}

#[test]
fn test_tick_timeouts_per_state() {
    // Idle times out into charging.
    let (machine, _) = run(boot(RobotKind::Delivery), vec![Event::SetTickRemain(0), Event::Tick]);
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docking { attempt: 0 }));

    // Item placement times out into the cancelled lid close, then idle.
    let (machine, _) = run(
        boot(RobotKind::Delivery),
        vec![
            Event::StartDelivery,
            Event::PasscodeEntered,
            Event::LidMoved,
            Event::SetTickRemain(0),
            Event::Tick,
        ],
    );
    assert_eq!(
        machine.state,
        State::Delivery(DeliveryPhase::PlaceItems(PlacePhase::Cancelled))
    );
    let (machine, _) = run(machine, vec![Event::LidMoved]);
    assert_eq!(machine.state, State::Idle(IdlePhase::Clean));

    // Anything else without a dedicated rule heads home.
    let (machine, _) = run(
        boot(RobotKind::Delivery),
        vec![Event::StartDelivery, Event::SetTickRemain(0), Event::Tick],
    );
    assert_eq!(machine.state, State::ReturnHome);

    // A running countdown only counts down.
    let (machine, _) = run(
        boot(RobotKind::Delivery),
        vec![Event::SetTickRemain(3), Event::Tick, Event::Tick],
    );
    assert_eq!(machine.state, State::Idle(IdlePhase::Clean));
    assert_eq!(machine.ctx.tick_remain, 1);
}

#[test]
fn test_item_collection_timeout_closes_the_lid() {
    let (machine, _) = run(
        delivering(false),
        vec![
            Event::NavigationSucceeded,
            Event::RecipientInteracted,
            Event::PasscodeEntered,
            Event::LidMoved,
            Event::SetTickRemain(0),
            Event::Tick,
        ],
    );
    assert_eq!(
        machine.state,
        State::Delivery(DeliveryPhase::CollectItems(CollectPhase::LidClosing))
    );
}

#[test]
fn test_charging_wake_rules() {
    // Idle goes straight to docking, without a return-home leg.
    let (docking, _) = run(boot(RobotKind::Delivery), vec![Event::ToCharging]);
    assert_eq!(docking.state, State::Charging(ChargingPhase::Docking { attempt: 0 }));

    let (docked, _) = run(docking, vec![Event::Parked]);
    assert_eq!(docked.state, State::Charging(ChargingPhase::Docked));

    let (machine, _) = run(docked.clone(), vec![status(10.0), Event::Wake]);
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docked));

    let (machine, _) = run(docked, vec![Event::Wake]);
    assert_eq!(machine.state, State::ReturnHome);

    // Disinfection robots ask for the passcode first.
    let (machine, _) = run(
        boot(RobotKind::Disinfection),
        vec![Event::Parked, Event::Wake],
    );
    assert_eq!(machine.state, State::Charging(ChargingPhase::EnterPasscode));
    let (machine, _) = run(machine, vec![Event::Back]);
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docked));
    let (machine, _) = run(machine, vec![Event::Wake, Event::PasscodeEntered]);
    assert_eq!(machine.state, State::ReturnHome);
}

#[test]
fn test_return_home_escalation_is_fatal() {
    let (machine, _) = run(
        boot(RobotKind::Delivery),
        vec![Event::StartDelivery, Event::SetTickRemain(0), Event::Tick],
    );
    assert_eq!(machine.state, State::ReturnHome);
    assert!(machine.services().contains(&ServiceSpec::Navigation {
        scope: "returnHome".to_string(),
        target: Target::Waypoint("home-1".to_string()),
        timeout_secs: machine.ctx.params.nav_timeout_return,
        round: 0,
        hop: 0,
    }));

    let (machine, _) = run(
        machine,
        vec![Event::NavigationEscalated(NavigationError::TimedOut {
            elapsed: std::time::Duration::from_secs(3600),
        })],
    );
    assert_eq!(machine.state, State::FatalError);
}

#[test]
fn test_refill_and_open_lid_cycles() {
    let (machine, _) = run(boot(RobotKind::Delivery), vec![Event::ToOpenLid]);
    assert_eq!(machine.state, State::OpenLid(RefillPhase::LidOpening));
    let (machine, _) = run(machine, vec![Event::LidMoved, Event::Filled, Event::LidMoved]);
    assert_eq!(machine.state, State::Idle(IdlePhase::Clean));

    // Refill is only reachable from getItem.
    let (machine, _) = run(machine, vec![Event::ToRefill]);
    assert_eq!(machine.state, State::Idle(IdlePhase::Clean));
}

#[test]
fn test_manual_controls_follow_latest_status() {
    let machine = boot(RobotKind::Delivery);
    let (machine, effects) = run(machine, vec![Event::LidFire, Event::EBrakeFire]);
    assert!(matches!(effects[..], [Effect::SetLid(LidCommand::Open), Effect::SetBrake(BrakeCommand::Freewheel)]));

    let flipped = RobotStatus {
        charge: 80.0,
        lid: LidState::Open,
        e_brake: BrakeState::Freewheel,
        ..Default::default()
    };
    let (machine, effects) = run(
        machine,
        vec![
            Event::StatusUpdate(Box::new(flipped)),
            Event::LidFire,
            Event::EBrakeFire,
        ],
    );
    assert!(matches!(effects[..], [Effect::SetLid(LidCommand::Close), Effect::SetBrake(BrakeCommand::Release)]));

    let (machine, _) = run(machine, vec![Event::ParkFire]);
    assert_eq!(machine.state, State::Charging(ChargingPhase::Docking { attempt: 0 }));
}

#[test]
fn test_integration_test_stages_run_in_order() {
    let mut init = demo_site(RobotKind::Delivery);
    init.params.integration_test = true;
    let (machine, _) = run(
        Machine::new(Context::new(false)),
        vec![
            Event::InitCompleted(Box::new(init)),
            status(80.0),
            Event::PasscodeEntered,
            Event::InitPosConfirmed {
                home: "home-1".to_string(),
                charger: "charger-1".to_string(),
            },
            Event::PositionOverridden,
        ],
    );
    assert_eq!(machine.state, State::IntegrationTest(TestPhase::AwaitingSelection));

    let (machine, effects) = run(
        machine,
        vec![Event::BeginTest {
            tests: TestSelection::ALL,
            path_id: "ward-b".to_string(),
        }],
    );
    assert!(effects.iter().any(|e| matches!(e, Effect::RecordVideo(true))));
    assert_eq!(
        machine.state,
        State::IntegrationTest(TestPhase::RunPath { round: 0, hop: 0 })
    );
    assert!(machine
        .services()
        .contains(&ServiceSpec::Sprayer { scope: "integrationTest" }));

    let (machine, _) = run(
        machine,
        vec![
            Event::NavigationSucceeded,
            Event::NavigationEscalated(NavigationError::Blocked { attempts: 1 }),
            Event::ParkFailed,
            Event::Parked,
        ],
    );
    assert_eq!(machine.state, State::IntegrationTest(TestPhase::Docked));
    assert_eq!((machine.ctx.test.park_attempts, machine.ctx.test.park_successes), (2, 1));

    let (machine, _) = run(
        machine,
        vec![
            Event::DelayElapsed,
            Event::LidMoved,
            Event::DelayElapsed,
            Event::LidMoved,
        ],
    );
    assert_eq!(
        machine.state,
        State::IntegrationTest(TestPhase::RunPath { round: 1, hop: 0 })
    );
    assert_eq!(machine.ctx.test.round, 1);
}

#[test]
fn test_state_paths_are_dotted() {
    assert_eq!(
        State::Delivery(DeliveryPhase::PlaceItems(PlacePhase::ItemPlacing)).path(),
        "delivery.placeItems.itemPlacing"
    );
    assert_eq!(
        State::Disinfection(DisinfectionPhase::Paused { round: 2, hop: 1 }).path(),
        "disinfection.performing.paused"
    );
    assert!(State::Delivery(DeliveryPhase::WaitForRecipient).matches("delivery"));
    assert!(!State::Delivery(DeliveryPhase::WaitForRecipient).matches("deliv"));
}
