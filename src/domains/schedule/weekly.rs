use chrono::{DateTime, Datelike, Days, NaiveDateTime, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Time of day an entry fires, serialized as `[hour, minute]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct StartTime {
    pub hour: u32,
    pub minute: u32,
}

impl From<[u32; 2]> for StartTime {
    fn from([hour, minute]: [u32; 2]) -> Self {
        Self { hour, minute }
    }
}

impl From<StartTime> for [u32; 2] {
    fn from(t: StartTime) -> Self {
        [t.hour, t.minute]
    }
}

/// Bit `i` set means weekday `i` is active, counting from Sunday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct WeekdayMask(pub u8);

impl WeekdayMask {
    pub const ALL: WeekdayMask = WeekdayMask(0b111_1111);

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 & Self::ALL.0 == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisinfectionTarget {
    pub path_id: String,
}

/// One recurring disinfection rule configured on a home point.
///
/// The entry owns its cursor: the local wall-clock instant of the most
/// recently produced occurrence. Only [`ScheduleEntry::next_occurrence`]
/// moves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub start_time: StartTime,
    #[serde(default = "default_repetition")]
    pub repetition: u32,
    pub weekdays: WeekdayMask,
    #[serde(default)]
    pub disinfection: Option<DisinfectionTarget>,
    #[serde(skip)]
    cursor: Option<NaiveDateTime>,
}

fn default_repetition() -> u32 {
    1
}

impl ScheduleEntry {
    pub fn new(start_time: StartTime, weekdays: WeekdayMask) -> Self {
        Self {
            start_time,
            repetition: default_repetition(),
            weekdays,
            disinfection: None,
            cursor: None,
        }
    }

    pub fn with_disinfection(mut self, path_id: impl Into<String>, repetition: u32) -> Self {
        self.disinfection = Some(DisinfectionTarget { path_id: path_id.into() });
        self.repetition = repetition;
        self
    }

    pub fn cursor(&self) -> Option<NaiveDateTime> {
        self.cursor
    }

    /// Produce the next occurrence after the previously returned one.
    ///
    /// On first use the cursor is anchored to today at the start time, moved
    /// back a day if that lies after `now`. Each call then steps the cursor a
    /// day at a time until it lands on an active weekday. Returns `None` for
    /// an empty weekday mask or an out-of-range start time.
    pub fn next_occurrence<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        if self.weekdays.is_empty() {
            return None;
        }

        let mut anchor = match self.cursor {
            Some(cursor) => cursor,
            None => {
                let local_now = now.naive_local();
                let today = local_now
                    .date()
                    .and_hms_opt(self.start_time.hour, self.start_time.minute, 0)?;
                if today > local_now {
                    today.checked_sub_days(Days::new(1))?
                } else {
                    today
                }
            }
        };

        loop {
            anchor = anchor.checked_add_days(Days::new(1))?;
            if self.weekdays.contains(anchor.weekday()) {
                break;
            }
        }
        self.cursor = Some(anchor);

        let tz = now.timezone();
        // Skipped local times (DST gaps) fire at the first valid instant after.
        tz.from_local_datetime(&anchor).earliest().or_else(|| {
            let shifted = anchor.with_minute(0)? + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted).earliest()
        })
    }
}
