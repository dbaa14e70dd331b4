use crate::domains::logger::{DomainLogger, FileLogger};
use std::sync::Arc;

/// Start `fast_log` on `path` and return the domain logger to inject.
pub fn init_file_logger(path: &str, level: &str, robot: &str) -> Result<Arc<dyn DomainLogger>, String> {
    FileLogger::init(path, crate::domains::logger::parse_level(level))
        .map_err(|e| format!("Failed to initialize fast_log: {}", e))?;
    Ok(Arc::new(FileLogger::new(robot)))
}
