use errand_app::adapters::inbound::InMemoryEventStore;
use errand_app::adapters::outbound::{init_noop_logger, Operation, SimCall, SimulatedPlatform};
use errand_app::application::RobotService;
use errand_app::domains::mission::{MissionJournalActor, MissionState, MissionType};
use errand_app::domains::orchestrator::*;
use errand_app::domains::robot::{AlarmType, DynPlatform, RobotKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const PHONE: &str = "+85291234567";

struct Harness {
    sim: SimulatedPlatform,
    service: RobotService,
    running: JoinHandle<State>,
}

fn start(kind: RobotKind) -> Harness {
    let sim = SimulatedPlatform::demo(kind);
    let platform: DynPlatform = Arc::new(sim.clone());
    let (orchestrator, handle) =
        Orchestrator::new(platform, init_noop_logger(), RuntimeSettings::default(), false);
    let running = tokio::spawn(orchestrator.run());
    Harness {
        sim,
        service: RobotService::new(handle),
        running,
    }
}

async fn reach(service: &RobotService, state: State) -> StateView {
    service.wait_for(|v| v.state == state).await.unwrap()
}

async fn eventually<F>(sim: &SimulatedPlatform, mut predicate: F) -> Vec<SimCall>
where
    F: FnMut(&[SimCall]) -> bool,
{
    for _ in 0..1000 {
        let calls = sim.calls().await;
        if predicate(&calls) {
            return calls;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("platform never saw the expected calls");
}

fn reported(calls: &[SimCall]) -> Vec<Option<MissionState>> {
    calls
        .iter()
        .filter_map(|c| match c {
            SimCall::Mission(m) => Some(m.as_ref().map(|m| m.state)),
            _ => None,
        })
        .collect()
}

async fn boot(service: &RobotService) {
    reach(service, State::EnterPasscode).await;
    service.enter_passcode().await.unwrap();
    reach(service, State::ConfirmPosition(PositionPhase::AwaitingSelection)).await;
    service.confirm_position("home-1", "charger-1").await.unwrap();
}

async fn deliver_to_room(service: &RobotService) {
    boot(service).await;
    reach(service, State::Idle(IdlePhase::Clean)).await;

    service.start_delivery().await.unwrap();
    service.enter_passcode().await.unwrap();
    reach(service, State::Delivery(DeliveryPhase::PlaceItems(PlacePhase::ItemPlacing))).await;
    service.send(Event::ItemPlaced).await.unwrap();
    reach(service, State::Delivery(DeliveryPhase::ConfigRecipient)).await;
    service.configure_recipient("room-101", PHONE).await.unwrap();
    service.send(Event::DetailsConfirmed).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_delivery_round_trip() {
    let Harness { sim, service, running } = start(RobotKind::Delivery);

    deliver_to_room(&service).await;
    let view = reach(&service, State::Delivery(DeliveryPhase::WaitForRecipient)).await;
    let password = view.delivery_password.clone().unwrap();
    assert_eq!(view.mission.as_ref().map(|m| m.state), Some(MissionState::Code));

    let calls = eventually(&sim, |calls| calls.iter().any(|c| matches!(c, SimCall::Message(_)))).await;
    let sms = calls
        .iter()
        .find_map(|c| match c {
            SimCall::Message(m) => Some(m.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(sms.phone_number, PHONE);
    assert_eq!(sms.platform, "sms");
    assert!(sms.message.ends_with(&password));

    service.send(Event::RecipientInteracted).await.unwrap();
    service.enter_passcode().await.unwrap();
    reach(
        &service,
        State::Delivery(DeliveryPhase::CollectItems(CollectPhase::ItemCollection)),
    )
    .await;
    service.send(Event::ItemCollected).await.unwrap();

    let view = service
        .wait_for(|v| v.state == State::Idle(IdlePhase::Clean) && v.mission.is_none())
        .await
        .unwrap();
    assert!(!view.failed_delivery);

    drop(service);
    assert_eq!(running.await.unwrap(), State::Idle(IdlePhase::Clean));

    let calls = sim.calls().await;
    assert_eq!(
        reported(&calls),
        vec![
            None,
            Some(MissionState::Start),
            Some(MissionState::Move),
            Some(MissionState::Code),
            Some(MissionState::Return),
            Some(MissionState::End),
            None,
        ]
    );
    // The lid opened and closed twice.
    let lids = calls.iter().filter(|c| matches!(c, SimCall::Lid(_))).count();
    assert_eq!(lids, 4);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_destination_ends_in_fatal_error() {
    let Harness { sim, service, running } = start(RobotKind::Delivery);

    boot(&service).await;
    reach(&service, State::Idle(IdlePhase::Clean)).await;
    sim.fail_always(Operation::NavGoal).await;

    service.start_delivery().await.unwrap();
    service.enter_passcode().await.unwrap();
    reach(&service, State::Delivery(DeliveryPhase::PlaceItems(PlacePhase::ItemPlacing))).await;
    service.send(Event::ItemPlaced).await.unwrap();
    reach(&service, State::Delivery(DeliveryPhase::ConfigRecipient)).await;
    service.configure_recipient("room-101", PHONE).await.unwrap();
    service.send(Event::DetailsConfirmed).await.unwrap();

    assert_eq!(running.await.unwrap(), State::FatalError);
    assert!(service.send(Event::Clear).await.is_err());

    let calls = sim.calls().await;
    assert!(calls.contains(&SimCall::Alert(AlarmType::NavBlocked, String::new())));
    let reports = reported(&calls);
    assert!(reports.contains(&Some(MissionState::Error)));
    assert_eq!(reports.last(), Some(&Some(MissionState::Error)));
}

#[tokio::test(start_paused = true)]
async fn test_failed_sms_raises_alert_per_attempt() {
    let Harness { sim, service, running } = start(RobotKind::Delivery);
    sim.fail_always(Operation::Message).await;

    deliver_to_room(&service).await;
    reach(&service, State::Delivery(DeliveryPhase::WaitForRecipient)).await;

    let calls = eventually(&sim, |calls| {
        calls
            .iter()
            .filter(|c| matches!(c, SimCall::Alert(AlarmType::SmsFailure, _)))
            .count()
            == 3
    })
    .await;
    assert_eq!(calls.iter().filter(|c| matches!(c, SimCall::Message(_))).count(), 3);
    let alert = calls
        .iter()
        .find_map(|c| match c {
            SimCall::Alert(AlarmType::SmsFailure, message) => Some(message.clone()),
            _ => None,
        })
        .unwrap();
    assert!(alert.starts_with(&format!("Recipient: {}; \nOriginal message: Hi,", PHONE)));

    // Nothing is sent again once the attempts are used up.
    tokio::time::sleep(Duration::from_secs(300)).await;
    let messages = sim
        .calls()
        .await
        .iter()
        .filter(|c| matches!(c, SimCall::Message(_)))
        .count();
    assert_eq!(messages, 3);
    assert_eq!(service.current().state, State::Delivery(DeliveryPhase::WaitForRecipient));

    drop(service);
    running.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_disinfection_round_trip_switches_sprayer_off() {
    let sim = SimulatedPlatform::demo(RobotKind::Disinfection);
    let platform: DynPlatform = Arc::new(sim.clone());

    let store = Arc::new(InMemoryEventStore::new());
    let (journal_tx, journal_rx) = mpsc::channel(100);
    let mut journal = MissionJournalActor::new(store.clone(), journal_rx);
    let projections = journal.projections();
    let journal_task = tokio::spawn(async move { journal.run().await });

    let (orchestrator, handle) =
        Orchestrator::new(platform, init_noop_logger(), RuntimeSettings::default(), false);
    let running = tokio::spawn(orchestrator.with_journal(journal_tx).run());
    let service = RobotService::new(handle).with_projections(projections.clone());

    boot(&service).await;
    reach(&service, State::Charging(ChargingPhase::Docked)).await;
    service.wait_for(|v| v.status.charge > 50.0).await.unwrap();

    service.quick_start_disinfection("ward-b").await.unwrap();
    service
        .wait_for(|v| {
            v.state == State::Charging(ChargingPhase::Docked)
                && v.mission.as_ref().is_some_and(|m| m.state == MissionState::End)
        })
        .await
        .unwrap();

    drop(service);
    running.await.unwrap();
    journal_task.await.unwrap();

    let calls = sim.calls().await;
    let sprayer: Vec<bool> = calls
        .iter()
        .filter_map(|c| match c {
            SimCall::Disinfection(on) => Some(*on),
            _ => None,
        })
        .collect();
    assert_eq!(sprayer, vec![true, false]);
    assert!(calls.contains(&SimCall::MapImage));
    assert_eq!(
        reported(&calls),
        vec![
            Some(MissionState::Start),
            Some(MissionState::Return),
            Some(MissionState::End),
        ]
    );

    let stats = projections.read().await.stats_for(Some(MissionType::Disinfection));
    assert_eq!((stats.started, stats.completed), (1, 1));
    assert_eq!(store.mission_count().await, 1);
}
