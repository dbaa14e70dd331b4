use crate::common::{DomainError, DomainResult};
use crate::domains::mission::MissionMeta;
use crate::domains::orchestrator::{Event, TestSelection};

/// Operator commands understood by [`parse_intent`], for `help` output.
pub const COMMANDS: &[(&str, &str)] = &[
    ("passcode", "passcode accepted"),
    ("confirm <home> <charger>", "confirm initial position"),
    ("test <1,2,3> <path>", "start integration test stages"),
    ("deliver", "start a delivery"),
    ("placed", "items placed"),
    ("recipient <to> <phone>", "configure recipient"),
    ("details", "confirm delivery details"),
    ("interact", "recipient touched the screen"),
    ("collected", "items collected"),
    ("back", "go back"),
    ("clear", "clear mission / indicator"),
    ("disinfect <path>", "quick-start disinfection"),
    ("openlid | refill | filled", "lid flows"),
    ("pause | resume", "pause or resume disinfection"),
    ("charge | wake", "go to charger / wake up"),
    ("lid | ebrake | park", "debug controls"),
];

/// Parse one line typed by an operator into an orchestrator event.
pub fn parse_intent(line: &str) -> DomainResult<Event> {
    let mut words = line.split_whitespace();
    let command = words
        .next()
        .ok_or_else(|| invalid("empty command"))?
        .to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let event = match (command.as_str(), args.as_slice()) {
        ("passcode", []) => Event::PasscodeEntered,
        ("confirm", [home, charger]) => Event::InitPosConfirmed {
            home: home.to_string(),
            charger: charger.to_string(),
        },
        ("test", [stages, path_id]) => Event::BeginTest {
            tests: parse_stages(stages)?,
            path_id: path_id.to_string(),
        },
        ("deliver", []) => Event::StartDelivery,
        ("placed", []) => Event::ItemPlaced,
        ("recipient", [to, phone]) => Event::RecipientConfigured(MissionMeta::delivery(*to, *phone)),
        ("details", []) => Event::DetailsConfirmed,
        ("interact", []) => Event::RecipientInteracted,
        ("collected", []) => Event::ItemCollected,
        ("back", []) => Event::Back,
        ("clear", []) => Event::Clear,
        ("disinfect", [path_id]) => Event::QuickStartDisinfection {
            path_id: path_id.to_string(),
        },
        ("openlid", []) => Event::ToOpenLid,
        ("refill", []) => Event::ToRefill,
        ("filled", []) => Event::Filled,
        ("pause", []) => Event::Pause,
        ("resume", []) => Event::Resume,
        ("charge", []) => Event::ToCharging,
        ("wake", []) => Event::Wake,
        ("lid", []) => Event::LidFire,
        ("ebrake", []) => Event::EBrakeFire,
        ("park", []) => Event::ParkFire,
        (other, args) => {
            return Err(invalid(&format!(
                "unknown command '{}' with {} argument(s)",
                other,
                args.len()
            )))
        }
    };
    Ok(event)
}

fn parse_stages(raw: &str) -> DomainResult<TestSelection> {
    let ids = raw
        .split(',')
        .map(|s| s.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(&format!("bad test stage list '{}': {}", raw, e)))?;

    let selection = TestSelection::from_ids(&ids);
    if selection.is_empty() {
        return Err(invalid("no known test stage selected"));
    }
    Ok(selection)
}

fn invalid(reason: &str) -> DomainError {
    DomainError::InvalidCommand {
        reason: reason.to_string(),
    }
}
