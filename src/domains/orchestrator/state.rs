use serde::Serialize;
use std::fmt;

/// Every state the robot can be in. Nested enums mirror the sub-flows; data
/// carried by a variant (hop, round, attempt) tells two visits of the same
/// state apart so that their services restart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "phase", rename_all = "camelCase")]
pub enum State {
    #[default]
    Init,
    EnterPasscode,
    ConfirmPosition(PositionPhase),
    IntegrationTest(TestPhase),
    Idle(IdlePhase),
    GetItem(IdlePhase),
    Charging(ChargingPhase),
    Delivery(DeliveryPhase),
    Disinfection(DisinfectionPhase),
    OpenLid(RefillPhase),
    Refill(RefillPhase),
    ReturnHome,
    FatalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionPhase {
    AwaitingSelection,
    Overriding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TestPhase {
    AwaitingSelection,
    RunPath { round: u32, hop: usize },
    Docking { attempt: u32 },
    Docked,
    LidOpening,
    LidDelay,
    LidClosing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IdlePhase {
    Clean,
    FailedDelivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChargingPhase {
    Docking { attempt: u32 },
    Docked,
    EnterPasscode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryPhase {
    EnterPasscodeInit,
    PlaceItems(PlacePhase),
    ConfigRecipient,
    ConfirmDetails,
    Delivering,
    WaitForRecipient,
    EnterPasscodeCollect,
    CollectItems(CollectPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlacePhase {
    LidOpening,
    ItemPlacing,
    LidClosing,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectPhase {
    LidOpening,
    ItemCollection,
    LidClosing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisinfectionPhase {
    FetchingMap,
    Navigating { round: u32, hop: usize },
    Paused { round: u32, hop: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RefillPhase {
    LidOpening,
    Refilling,
    LidClosing,
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::FatalError)
    }

    /// Dotted path such as `delivery.placeItems.itemPlacing`.
    pub fn path(&self) -> String {
        let segments: Vec<&'static str> = match self {
            State::Init => vec!["init"],
            State::EnterPasscode => vec!["enterPasscode"],
            State::ConfirmPosition(p) => vec![
                "confirmPosition",
                match p {
                    PositionPhase::AwaitingSelection => "init",
                    PositionPhase::Overriding => "overriding",
                },
            ],
            State::IntegrationTest(p) => match p {
                TestPhase::AwaitingSelection => vec!["integrationTest", "init"],
                TestPhase::RunPath { .. } => vec!["integrationTest", "runAllWaypoints", "navigating"],
                TestPhase::Docking { .. } => vec!["integrationTest", "parkAndCharge", "docking"],
                TestPhase::Docked => vec!["integrationTest", "parkAndCharge", "docked"],
                TestPhase::LidOpening => vec!["integrationTest", "openAndCloseLid", "lidOpening"],
                TestPhase::LidDelay => vec!["integrationTest", "openAndCloseLid", "delay"],
                TestPhase::LidClosing => vec!["integrationTest", "openAndCloseLid", "lidClosing"],
            },
            State::Idle(p) => vec!["idle", p.segment()],
            State::GetItem(p) => vec!["getItem", p.segment()],
            State::Charging(p) => vec![
                "charging",
                match p {
                    ChargingPhase::Docking { .. } => "docking",
                    ChargingPhase::Docked => "docked",
                    ChargingPhase::EnterPasscode => "enterPasscode",
                },
            ],
            State::Delivery(p) => match p {
                DeliveryPhase::EnterPasscodeInit => vec!["delivery", "enterPasscodeInit"],
                DeliveryPhase::PlaceItems(sub) => vec![
                    "delivery",
                    "placeItems",
                    match sub {
                        PlacePhase::LidOpening => "lidOpening",
                        PlacePhase::ItemPlacing => "itemPlacing",
                        PlacePhase::LidClosing => "lidClosing",
                        PlacePhase::Cancelled => "cancelled",
                    },
                ],
                DeliveryPhase::ConfigRecipient => vec!["delivery", "configRecipient"],
                DeliveryPhase::ConfirmDetails => vec!["delivery", "confirmDetails"],
                DeliveryPhase::Delivering => vec!["delivery", "delivering"],
                DeliveryPhase::WaitForRecipient => vec!["delivery", "waitForRecipient"],
                DeliveryPhase::EnterPasscodeCollect => vec!["delivery", "enterPasscodeCollect"],
                DeliveryPhase::CollectItems(sub) => vec![
                    "delivery",
                    "collectItems",
                    match sub {
                        CollectPhase::LidOpening => "lidOpening",
                        CollectPhase::ItemCollection => "itemCollection",
                        CollectPhase::LidClosing => "lidClosing",
                    },
                ],
            },
            State::Disinfection(p) => match p {
                DisinfectionPhase::FetchingMap => vec!["disinfection", "init"],
                DisinfectionPhase::Navigating { .. } => vec!["disinfection", "performing", "navigating"],
                DisinfectionPhase::Paused { .. } => vec!["disinfection", "performing", "paused"],
            },
            State::OpenLid(p) => vec!["openLid", p.segment()],
            State::Refill(p) => vec!["refill", p.segment()],
            State::ReturnHome => vec!["returnHome"],
            State::FatalError => vec!["fatalError"],
        };
        segments.join(".")
    }

    /// Prefix match on the dotted path, e.g. `matches("delivery.placeItems")`.
    pub fn matches(&self, prefix: &str) -> bool {
        let path = self.path();
        path == prefix || path.starts_with(&format!("{}.", prefix))
    }
}

impl IdlePhase {
    fn segment(&self) -> &'static str {
        match self {
            IdlePhase::Clean => "clean",
            IdlePhase::FailedDelivery => "failedDelivery",
        }
    }
}

impl RefillPhase {
    fn segment(&self) -> &'static str {
        match self {
            RefillPhase::LidOpening => "lidOpening",
            RefillPhase::Refilling => "refilling",
            RefillPhase::LidClosing => "lidClosing",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
