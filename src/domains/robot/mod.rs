pub mod info;
pub mod platform;
pub mod status;

pub use info::*;
pub use platform::*;
pub use status::*;
