use crate::domains::logger::DomainLogger;
use std::sync::Arc;

struct ConsoleBridge {
    robot: String,
}

impl DomainLogger for ConsoleBridge {
    fn info(&self, msg: &str) {
        println!("[{}] {}", self.robot, msg);
    }
    fn warn(&self, msg: &str) {
        println!("[{}] WARN: {}", self.robot, msg);
    }
    fn error(&self, msg: &str) {
        eprintln!("[{}] ERROR: {}", self.robot, msg);
    }
}

/// Console-backed DomainLogger, also the fallback when the file logger cannot start.
pub fn init_console_logger(robot: &str) -> Arc<dyn DomainLogger> {
    Arc::new(ConsoleBridge {
        robot: robot.to_string(),
    })
}
