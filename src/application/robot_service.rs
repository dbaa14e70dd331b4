use crate::common::{ApplicationError, ApplicationResult};
use crate::domains::mission::{MissionMeta, MissionStats, MissionType, SharedMissionProjections};
use crate::domains::orchestrator::{Event, OrchestratorHandle, StateView, TestSelection};
use tokio::sync::watch;

/// What the presentation layer talks to: typed intents in, state views out.
pub struct RobotService {
    handle: OrchestratorHandle,
    projections: Option<SharedMissionProjections>,
}

impl RobotService {
    pub fn new(handle: OrchestratorHandle) -> Self {
        Self {
            handle,
            projections: None,
        }
    }

    pub fn with_projections(mut self, projections: SharedMissionProjections) -> Self {
        self.projections = Some(projections);
        self
    }

    /// Push a raw event, e.g. one parsed from operator input.
    pub async fn send(&self, event: Event) -> ApplicationResult<()> {
        self.handle
            .intents
            .send(event)
            .await
            .map_err(|_| ApplicationError::ChannelClosed)
    }

    pub async fn enter_passcode(&self) -> ApplicationResult<()> {
        self.send(Event::PasscodeEntered).await
    }

    pub async fn confirm_position(&self, home: &str, charger: &str) -> ApplicationResult<()> {
        self.send(Event::InitPosConfirmed {
            home: home.to_string(),
            charger: charger.to_string(),
        })
        .await
    }

    pub async fn begin_test(&self, tests: TestSelection, path_id: &str) -> ApplicationResult<()> {
        self.send(Event::BeginTest {
            tests,
            path_id: path_id.to_string(),
        })
        .await
    }

    pub async fn start_delivery(&self) -> ApplicationResult<()> {
        self.send(Event::StartDelivery).await
    }

    pub async fn configure_recipient(&self, to: &str, phone_number: &str) -> ApplicationResult<()> {
        self.send(Event::RecipientConfigured(MissionMeta::delivery(to, phone_number)))
            .await
    }

    pub async fn quick_start_disinfection(&self, path_id: &str) -> ApplicationResult<()> {
        self.send(Event::QuickStartDisinfection {
            path_id: path_id.to_string(),
        })
        .await
    }

    pub async fn back(&self) -> ApplicationResult<()> {
        self.send(Event::Back).await
    }

    pub async fn clear(&self) -> ApplicationResult<()> {
        self.send(Event::Clear).await
    }

    pub fn current(&self) -> StateView {
        self.handle.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StateView> {
        self.handle.view.clone()
    }

    /// Wait until the published view satisfies `predicate`.
    pub async fn wait_for<F>(&self, predicate: F) -> ApplicationResult<StateView>
    where
        F: FnMut(&StateView) -> bool,
    {
        let mut view = self.subscribe();
        let found = view
            .wait_for(predicate)
            .await
            .map_err(|_| ApplicationError::ChannelClosed)?;
        Ok(found.clone())
    }

    pub async fn mission_stats(&self, kind: Option<MissionType>) -> Option<MissionStats> {
        let projections = self.projections.as_ref()?;
        Some(projections.read().await.stats_for(kind))
    }
}
