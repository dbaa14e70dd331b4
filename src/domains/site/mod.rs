pub mod geometry;
pub mod map;

pub use geometry::*;
pub use map::*;
