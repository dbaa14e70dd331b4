use thiserror::Error;

use crate::domains::robot::PlatformError;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown waypoint: {id}")]
    UnknownWaypoint { id: String },

    #[error("Unknown path: {id}")]
    UnknownPath { id: String },

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Event store error: {0}")]
    EventStore(String),

    #[error("Orchestrator is no longer running")]
    ChannelClosed,

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
