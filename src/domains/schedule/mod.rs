pub mod scheduler;
pub mod weekly;

pub use scheduler::*;
pub use weekly::*;
