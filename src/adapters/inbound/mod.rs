pub mod console_intents;
pub mod event_store;
pub mod file_event_store;

pub use console_intents::*;
pub use event_store::*;
pub use file_event_store::*;
