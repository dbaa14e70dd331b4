pub mod context;
pub mod events;
pub mod machine;
pub mod runtime;
pub mod services;
pub mod state;

pub use context::*;
pub use events::*;
pub use machine::*;
pub use runtime::*;
pub use services::{DelayKind, ServiceId, ServiceSpec};
pub use state::*;
