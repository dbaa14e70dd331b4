use chrono::{Datelike, TimeZone, Utc, Weekday};
use errand_app::domains::mission::*;
use errand_app::domains::robot::RobotKind;
use errand_app::domains::schedule::*;
use errand_app::domains::site::{is_same_floor, Position2D};

fn wednesday_noon() -> chrono::DateTime<Utc> {
    // 2024-01-03 is a Wednesday
    Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap()
}

fn mask(days: &[Weekday]) -> WeekdayMask {
    WeekdayMask(days.iter().fold(0, |acc, d| acc | 1 << d.num_days_from_sunday()))
}

#[test]
fn test_weekly_generator_is_strictly_increasing_on_active_days() {
    let days = [Weekday::Mon, Weekday::Wed, Weekday::Fri];
    let mut entry = ScheduleEntry::new(StartTime { hour: 9, minute: 0 }, mask(&days));
    let now = wednesday_noon();

    let first = entry.next_occurrence(&now).unwrap();
    // Today's 09:00 already passed, so the first hit is Friday.
    assert_eq!(first, Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap());

    let mut previous = first;
    for _ in 0..20 {
        let next = entry.next_occurrence(&now).unwrap();
        assert!(next > previous);
        assert!(days.contains(&next.weekday()));
        previous = next;
    }
}

#[test]
fn test_weekly_generator_anchor_never_starts_in_the_future() {
    let mut entry = ScheduleEntry::new(StartTime { hour: 18, minute: 30 }, WeekdayMask::ALL);
    let now = wednesday_noon();

    // 18:30 today lies ahead of noon, so it is the first occurrence.
    let first = entry.next_occurrence(&now).unwrap();
    assert_eq!(first, Utc.with_ymd_and_hms(2024, 1, 3, 18, 30, 0).unwrap());
    let second = entry.next_occurrence(&now).unwrap();
    assert_eq!(second, Utc.with_ymd_and_hms(2024, 1, 4, 18, 30, 0).unwrap());
}

#[test]
fn test_weekly_generator_empty_mask_yields_nothing() {
    let mut entry = ScheduleEntry::new(StartTime { hour: 9, minute: 0 }, WeekdayMask(0));
    assert!(entry.next_occurrence(&wednesday_noon()).is_none());
}

#[test]
fn test_nearest_due_returns_global_minimum_and_advances_one_entry() {
    let entries = vec![
        ScheduleEntry::new(StartTime { hour: 9, minute: 0 }, WeekdayMask::ALL),
        ScheduleEntry::new(StartTime { hour: 8, minute: 0 }, mask(&[Weekday::Thu, Weekday::Sat])),
        ScheduleEntry::new(StartTime { hour: 20, minute: 15 }, mask(&[Weekday::Sun])),
    ];
    let mut scheduler = DisinfectionScheduler::new(entries);
    let now = wednesday_noon();

    let first = scheduler.nearest_due(&now).unwrap();
    assert_eq!(first.index, 1);
    assert_eq!(first.at, Utc.with_ymd_and_hms(2024, 1, 4, 8, 0, 0).unwrap());

    for _ in 0..30 {
        let before: Vec<_> = scheduler.frontier().to_vec();
        let minimum = before.iter().flatten().min().copied().unwrap();

        let due = scheduler.nearest_due(&now).unwrap();
        assert_eq!(due.at, minimum);
        assert_eq!(before[due.index], Some(minimum));

        let after = scheduler.frontier();
        let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed, vec![due.index]);
    }
}

#[test]
fn test_nearest_due_tie_goes_to_lowest_index() {
    let entries = vec![
        ScheduleEntry::new(StartTime { hour: 7, minute: 0 }, WeekdayMask::ALL),
        ScheduleEntry::new(StartTime { hour: 7, minute: 0 }, WeekdayMask::ALL),
    ];
    let mut scheduler = DisinfectionScheduler::new(entries);
    let now = wednesday_noon();

    let first = scheduler.nearest_due(&now).unwrap();
    let second = scheduler.nearest_due(&now).unwrap();
    assert_eq!((first.index, second.index), (0, 1));
    assert_eq!(first.at, second.at);
}

#[tokio::test]
async fn test_emission_stream_ends_for_empty_schedule() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    emit_due(DisinfectionScheduler::shared(Vec::new()), tx, |i| i).await;
    assert!(rx.recv().await.is_none());
}

#[test]
fn test_same_floor_is_strict() {
    let bound_box = [
        Position2D::new(0.0, 0.0),
        Position2D::new(0.0, 10.0),
        Position2D::new(10.0, 10.0),
        Position2D::new(10.0, 0.0),
    ];
    assert!(is_same_floor(Position2D::new(5.0, 5.0), &bound_box));
    assert!(!is_same_floor(Position2D::new(0.0, 5.0), &bound_box));
    assert!(!is_same_floor(Position2D::new(5.0, 10.0), &bound_box));
    assert!(!is_same_floor(Position2D::new(11.0, 5.0), &bound_box));
    assert!(!is_same_floor(Position2D::new(5.0, 5.0), &bound_box[..3]));
}

#[test]
fn test_mission_assignment_rules() {
    let started = Mission::assign(
        None,
        &MissionUpdate::reported(MissionState::Start, None),
        RobotKind::Delivery,
    )
    .unwrap();
    assert_eq!(started.kind, Some(MissionType::Delivery));
    assert_eq!(started.state, MissionState::Start);

    // Meta-only update keeps id and state.
    let meta = MissionMeta::delivery("room-101", "+85200000000");
    let configured = Mission::assign(
        Some(&started),
        &MissionUpdate::new(None, Some(meta.clone()), false),
        RobotKind::Delivery,
    )
    .unwrap();
    assert_eq!(configured.id, started.id);
    assert_eq!(configured.state, MissionState::Start);
    assert_eq!(configured.meta, Some(meta.clone()));
    assert!(configured.is_dangling_delivery());

    let returning = Mission::assign(
        Some(&configured),
        &MissionUpdate::reported(MissionState::Return, Some(meta)),
        RobotKind::Delivery,
    )
    .unwrap();
    assert_eq!(returning.id, started.id);
    assert!(!returning.is_dangling_delivery());

    // A new start always gets a new id.
    let restarted = Mission::assign(
        Some(&returning),
        &MissionUpdate::reported(MissionState::Start, None),
        RobotKind::Delivery,
    )
    .unwrap();
    assert_ne!(restarted.id, started.id);

    assert!(Mission::assign(Some(&restarted), &MissionUpdate::clear(), RobotKind::Delivery).is_none());
}

#[test]
fn test_journal_events_and_stats() {
    let kind = RobotKind::Disinfection;
    let meta = Some(MissionMeta::disinfection("ward-a", 1));

    let start = Mission::assign(None, &MissionUpdate::reported(MissionState::Start, meta.clone()), kind);
    let moving = Mission::assign(start.as_ref(), &MissionUpdate::silent(MissionState::Move, meta.clone()), kind);
    let ended = Mission::assign(moving.as_ref(), &MissionUpdate::reported(MissionState::End, None), kind);

    let events: Vec<MissionEvent> = [
        MissionEvent::between(None, start.as_ref()),
        MissionEvent::between(start.as_ref(), moving.as_ref()),
        MissionEvent::between(moving.as_ref(), moving.as_ref()),
        MissionEvent::between(moving.as_ref(), ended.as_ref()),
        MissionEvent::between(ended.as_ref(), None),
    ]
    .into_iter()
    .flatten()
    .collect();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], MissionEvent::Started { .. }));
    assert!(matches!(events[3], MissionEvent::Cleared { last_state: MissionState::End, .. }));

    let mut store = MissionProjectionStore::new();
    events.iter().for_each(|e| store.apply_event(e));

    let stats = store.stats_for(Some(MissionType::Disinfection));
    assert_eq!(stats.started, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.abandoned, 0);

    let overview = &store.overviews[events[0].mission_id()];
    assert_eq!(
        overview.history,
        vec![MissionState::Start, MissionState::Move, MissionState::End]
    );
    assert!(overview.cleared);
}
