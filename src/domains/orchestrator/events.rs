use crate::domains::mission::{MissionMeta, MissionUpdate};
use crate::domains::navigation::{NavigationError, NavigationNotice};
use crate::domains::robot::{InitData, RobotStatus};
use serde::{Deserialize, Serialize};

/// Which integration-test stages run. Stages execute in a fixed order:
/// path run, park-and-charge, lid cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestSelection {
    pub run_path: bool,
    pub park_cycle: bool,
    pub lid_cycle: bool,
}

impl TestSelection {
    pub const ALL: TestSelection = TestSelection {
        run_path: true,
        park_cycle: true,
        lid_cycle: true,
    };

    /// Stage numbers as shown to operators: 1 path, 2 park, 3 lid.
    pub fn from_ids(ids: &[u8]) -> Self {
        Self {
            run_path: ids.contains(&1),
            park_cycle: ids.contains(&2),
            lid_cycle: ids.contains(&3),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.run_path || self.park_cycle || self.lid_cycle)
    }
}

/// Everything the orchestrator reacts to: results of its own services and
/// intents pushed by the presentation layer.
#[derive(Debug, Clone)]
pub enum Event {
    // service results
    InitCompleted(Box<InitData>),
    StatusUpdate(Box<RobotStatus>),
    PositionOverridden,
    LidMoved,
    Parked,
    ParkFailed,
    NavigationSucceeded,
    NavigationRetrying(NavigationNotice),
    NavigationEscalated(NavigationError),
    MapImageFetched(Vec<u8>),
    DelayElapsed,
    SmsFinished { delivered: bool },
    Tick,
    SetTickRemain(i64),
    StartDisinfection(usize),
    SendMission(MissionUpdate),

    // operator intents
    PasscodeEntered,
    InitPosConfirmed { home: String, charger: String },
    BeginTest { tests: TestSelection, path_id: String },
    StartDelivery,
    Back,
    ItemPlaced,
    RecipientConfigured(MissionMeta),
    DetailsConfirmed,
    RecipientInteracted,
    ItemCollected,
    Clear,
    QuickStartDisinfection { path_id: String },
    ToRefill,
    ToOpenLid,
    Filled,
    Pause,
    Resume,
    ToCharging,
    Wake,
    LidFire,
    EBrakeFire,
    ParkFire,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::InitCompleted(_) => "initCompleted",
            Event::StatusUpdate(_) => "statusUpdate",
            Event::PositionOverridden => "positionOverridden",
            Event::LidMoved => "lidMoved",
            Event::Parked => "parked",
            Event::ParkFailed => "parkFailed",
            Event::NavigationSucceeded => "navigationSucceeded",
            Event::NavigationRetrying(_) => "navError",
            Event::NavigationEscalated(_) => "navigationEscalated",
            Event::MapImageFetched(_) => "mapImageFetched",
            Event::DelayElapsed => "delayElapsed",
            Event::SmsFinished { .. } => "smsFinished",
            Event::Tick => "tick",
            Event::SetTickRemain(_) => "setTickRemain",
            Event::StartDisinfection(_) => "startDisinfection",
            Event::SendMission(_) => "sendMission",
            Event::PasscodeEntered => "passcodeEntered",
            Event::InitPosConfirmed { .. } => "initPosConfirmed",
            Event::BeginTest { .. } => "beginTest",
            Event::StartDelivery => "startDelivery",
            Event::Back => "back",
            Event::ItemPlaced => "itemPlaced",
            Event::RecipientConfigured(_) => "recipientConfigured",
            Event::DetailsConfirmed => "detailsConfirmed",
            Event::RecipientInteracted => "recipientInteracted",
            Event::ItemCollected => "itemCollected",
            Event::Clear => "clear",
            Event::QuickStartDisinfection { .. } => "quickStartDisinfection",
            Event::ToRefill => "toRefill",
            Event::ToOpenLid => "toOpenLid",
            Event::Filled => "filled",
            Event::Pause => "pause",
            Event::Resume => "resume",
            Event::ToCharging => "toCharging",
            Event::Wake => "wake",
            Event::LidFire => "lidFire",
            Event::EBrakeFire => "eBrakeFire",
            Event::ParkFire => "parkFire",
        }
    }
}
