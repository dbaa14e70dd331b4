pub mod logger;
pub mod mission;
pub mod navigation;
pub mod orchestrator;
pub mod robot;
pub mod schedule;
pub mod site;

pub use logger::*;
