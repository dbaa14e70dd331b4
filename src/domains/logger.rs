use chrono::Utc;
use log::{error as log_error, info as log_info, warn as log_warn};
use std::sync::Arc;

/// Domain-level logging port.
/// State transitions, mission reports and escalations are narrated through it.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// Writes the domain narrative through `log`, backed by a `fast_log` file
/// appender. Every line is tagged with the robot it belongs to.
pub struct FileLogger {
    robot: String,
}

impl FileLogger {
    /// Install `fast_log` as the global `log` backend writing to `path`.
    /// Can only succeed once per process.
    pub fn init(path: &str, level: log::LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
        fast_log::init(fast_log::config::Config::new().file(path).level(level))?;
        Ok(())
    }

    pub fn new(robot: impl Into<String>) -> Self {
        Self {
            robot: robot.into(),
        }
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        log_info!("{} [{}] {}", Utc::now().to_rfc3339(), self.robot, msg);
    }

    fn warn(&self, msg: &str) {
        log_warn!("{} [{}] {}", Utc::now().to_rfc3339(), self.robot, msg);
    }

    fn error(&self, msg: &str) {
        log_error!("{} [{}] {}", Utc::now().to_rfc3339(), self.robot, msg);
    }
}

/// Parse a level name from configuration. Unknown names fall back to `Info`.
pub fn parse_level(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or(log::LevelFilter::Info)
}
