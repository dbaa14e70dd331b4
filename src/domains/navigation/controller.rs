use super::elevator::ElevatorRide;
use super::request::{NavigationRequest, NavigationSettings};
use super::NavigationError;
use crate::domains::robot::{AlarmType, DynPlatform, NavGoal};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Non-fatal report sent to the parent after a failed move that is going to
/// be retried.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationNotice {
    pub attempt: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationOutcome {
    pub attempts: u32,
    pub elapsed: Duration,
    pub rode_elevator: bool,
}

/// Drives the robot to a single target, taking an elevator first when the
/// target is on another floor.
///
/// The controller lives exactly as long as its request. Dropping the future
/// returned by [`NavigationController::run`] is the only way to cancel it.
pub struct NavigationController {
    platform: DynPlatform,
    request: NavigationRequest,
    settings: NavigationSettings,
    notices: Option<mpsc::UnboundedSender<NavigationNotice>>,
}

impl NavigationController {
    pub fn new(platform: DynPlatform, request: NavigationRequest, settings: NavigationSettings) -> Self {
        Self {
            platform,
            request,
            settings,
            notices: None,
        }
    }

    pub fn with_notices(mut self, notices: mpsc::UnboundedSender<NavigationNotice>) -> Self {
        self.notices = Some(notices);
        self
    }

    /// Every escalation raises a `nav-blocked` alert before it reaches the
    /// parent.
    pub async fn run(self) -> Result<NavigationOutcome, NavigationError> {
        let result = self.drive().await;
        if let Err(escalation) = &result {
            tracing::error!("Navigation escalated: {}", escalation);
            if let Err(e) = self.platform.alert(AlarmType::NavBlocked, "").await {
                tracing::warn!("Failed to raise nav-blocked alert: {}", e);
            }
        }
        result
    }

    async fn drive(&self) -> Result<NavigationOutcome, NavigationError> {
        let started = Instant::now();
        let mut try_count: u32 = 0;

        let target = self.request.target_position()?;
        let rode_elevator = !self.request.target_on_current_floor(target);
        if rode_elevator {
            tracing::info!("Target {:?} is on another floor, taking elevator", self.request.target);
            ElevatorRide::new(
                self.platform.clone(),
                &self.request,
                &self.settings,
                target,
            )
            .run()
            .await?;
        }

        let goal = NavGoal::to(self.request.target.clone());
        loop {
            try_count += 1;
            match self.platform.nav_goal(&goal).await {
                Ok(message) => {
                    tracing::debug!("Navigation goal reached after {} attempt(s): {}", try_count, message);
                    return Ok(NavigationOutcome {
                        attempts: try_count,
                        elapsed: started.elapsed(),
                        rode_elevator,
                    });
                }
                Err(err) => {
                    tracing::warn!("Navigation attempt {} failed: {}", try_count, err);
                    tokio::time::sleep(self.settings.goal_backoff).await;

                    if let Some(escalation) = self.budget_exhausted(try_count, started.elapsed()) {
                        return Err(escalation);
                    }

                    if let Some(notices) = &self.notices {
                        let _ = notices.send(NavigationNotice {
                            attempt: try_count,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn budget_exhausted(&self, try_count: u32, elapsed: Duration) -> Option<NavigationError> {
        if self.request.max_retry.is_some_and(|max| try_count >= max) {
            return Some(NavigationError::Blocked { attempts: try_count });
        }
        if self.request.timeout.is_some_and(|timeout| elapsed >= timeout) {
            return Some(NavigationError::TimedOut { elapsed });
        }
        None
    }
}
