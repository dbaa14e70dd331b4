use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Forwards every message to all of its sinks, in order.
pub struct MultiLogger {
    sinks: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(sinks: Vec<DynLogger>) -> Self {
        Self { sinks }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.error(msg));
    }
}

/// File plus console. Falls back to console only when the file logger cannot
/// be initialised.
pub fn init_combined_logger(path: &str, level: &str, robot: &str) -> DynLogger {
    let console = super::init_console_logger(robot);
    match super::init_file_logger(path, level, robot) {
        Ok(file_logger) => Arc::new(MultiLogger::new(vec![file_logger, console])),
        Err(e) => {
            tracing::warn!("{}, logging to console only", e);
            console
        }
    }
}
