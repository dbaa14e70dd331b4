pub mod robot_service;

pub use robot_service::*;
