use super::events::TestSelection;
use crate::domains::mission::{Mission, MissionState};
use crate::domains::robot::{InitData, RobotIdentity, RobotKind, RobotParams, RobotStatus};
use crate::domains::schedule::{DisinfectionScheduler, SharedScheduler};
use crate::domains::site::{Position2D, SiteMap};
use std::sync::Arc;

/// Integration-test bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct IntegrationTestContext {
    pub selection: TestSelection,
    pub path_id: Option<String>,
    /// Completed passes over the enabled stages.
    pub round: u32,
    pub park_attempts: u32,
    pub park_successes: u32,
    pub recording: bool,
}

/// Everything the transition function reads and writes besides the state
/// itself. Only [`super::Machine`] mutates it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub site_id: Option<String>,
    pub locale: Option<String>,
    pub map: Arc<SiteMap>,
    pub robot: Option<RobotIdentity>,
    pub params: RobotParams,
    pub debug_mode: bool,
    pub status: RobotStatus,
    pub mission: Option<Mission>,
    pub tick_remain: i64,
    pub home_point: Option<String>,
    pub charger_point: Option<String>,
    pub scheduler: Option<SharedScheduler>,
    pub map_image: Option<Arc<Vec<u8>>>,
    pub delivery_password: Option<String>,
    /// The password still has to be texted to the recipient.
    pub sms_pending: bool,
    pub test: IntegrationTestContext,
}

impl Context {
    pub fn new(debug_mode: bool) -> Self {
        Self {
            debug_mode,
            ..Default::default()
        }
    }

    pub fn apply_init(&mut self, data: InitData) {
        tracing::info!("Platform parameters: {:?}", data.params);
        self.site_id = Some(data.site.id);
        self.locale = data.site.locale;
        self.map = data.site.map;
        self.debug_mode |= data.robot.debug_mode;
        self.robot = Some(data.robot);
        self.params = data.params;
    }

    pub fn robot_kind(&self) -> RobotKind {
        self.robot.as_ref().map(|r| r.kind).unwrap_or(RobotKind::Other)
    }

    /// Build the scheduler from the home point's schedule. No schedule, no
    /// scheduler.
    pub fn assign_scheduler(&mut self) {
        let entries = self
            .home_point
            .as_deref()
            .map(|home| self.map.home_schedule(home).to_vec())
            .unwrap_or_default();
        self.scheduler = (!entries.is_empty()).then(|| DisinfectionScheduler::shared(entries));
    }

    pub fn path(&self, path_id: &str) -> &[Position2D] {
        self.map.path_geometry(path_id).unwrap_or(&[])
    }

    pub fn failed_delivery(&self) -> bool {
        self.mission.as_ref().is_some_and(Mission::is_dangling_delivery)
    }

    pub fn skipped_disinfection(&self) -> bool {
        self.mission.as_ref().is_some_and(|m| m.state == MissionState::Skip)
    }
}
