use super::weekly::ScheduleEntry;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// A due disinfection: when it fires and which schedule entry produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Due {
    pub at: DateTime<Utc>,
    pub index: usize,
}

/// Merges one weekly generator per schedule entry into a single ordered
/// sequence of dues.
///
/// Each entry has a frontier: its next not-yet-emitted occurrence. Frontiers
/// are computed lazily on the first call so that anchoring uses the clock at
/// that moment.
#[derive(Debug, Clone)]
pub struct DisinfectionScheduler {
    entries: Vec<ScheduleEntry>,
    frontier: Vec<Option<DateTime<Utc>>>,
    primed: bool,
    upcoming: Option<Due>,
}

pub type SharedScheduler = Arc<Mutex<DisinfectionScheduler>>;

impl DisinfectionScheduler {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        let frontier = vec![None; entries.len()];
        Self {
            entries,
            frontier,
            primed: false,
            upcoming: None,
        }
    }

    pub fn shared(entries: Vec<ScheduleEntry>) -> SharedScheduler {
        Arc::new(Mutex::new(Self::new(entries)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn frontier(&self) -> &[Option<DateTime<Utc>>] {
        &self.frontier
    }

    fn prime<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        if self.primed {
            return;
        }
        for (slot, entry) in self.frontier.iter_mut().zip(self.entries.iter_mut()) {
            *slot = entry.next_occurrence(now).map(|t| t.with_timezone(&Utc));
        }
        self.primed = true;
    }

    /// Pop the globally earliest frontier (lowest index wins a tie) and
    /// advance only that entry's generator.
    pub fn nearest_due<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Option<Due> {
        self.prime(now);

        let (index, at) = self
            .frontier
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.map(|t| (i, t)))
            .min_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))?;

        self.frontier[index] = self.entries[index]
            .next_occurrence(now)
            .map(|t| t.with_timezone(&Utc));

        Some(Due { at, index })
    }

    /// The due the emission loop should wait for. A pending due survives a
    /// restarted loop until its instant has passed.
    pub fn next_emission<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Option<Due> {
        let now_utc = now.with_timezone(&Utc);
        match self.upcoming {
            Some(due) if due.at >= now_utc => Some(due),
            _ => {
                self.upcoming = self.nearest_due(now);
                self.upcoming
            }
        }
    }

    pub fn mark_emitted(&mut self) {
        self.upcoming = None;
    }
}

/// Sleep until each due instant and send the mapped entry index.
///
/// Returns immediately for an empty schedule, and when every entry has run out
/// of occurrences or the receiver is dropped.
pub async fn emit_due<E, F>(scheduler: SharedScheduler, sender: mpsc::UnboundedSender<E>, map: F)
where
    F: Fn(usize) -> E,
{
    loop {
        let due = {
            let mut guard = scheduler.lock().await;
            if guard.is_empty() {
                tracing::debug!("Disinfection schedule is empty, emission stream completes");
                return;
            }
            guard.next_emission(&Local::now())
        };
        let Some(due) = due else {
            return;
        };

        let wait = (due.at - Utc::now()).to_std().unwrap_or_default();
        tracing::debug!("Next disinfection due at {} (entry {})", due.at, due.index);
        tokio::time::sleep(wait).await;

        scheduler.lock().await.mark_emitted();
        if sender.send(map(due.index)).is_err() {
            return;
        }
    }
}
