use serde::{Deserialize, Serialize};

/// A point on the site map in metres. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Position2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position2D> for [f64; 2] {
    fn from(p: Position2D) -> Self {
        [p.x, p.y]
    }
}

/// Robot pose as reported by the platform. `theta` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose {
    pub fn position(&self) -> Position2D {
        Position2D::new(self.x, self.y)
    }
}

/// Strict point-in-rectangle test against a floor bound box given as
/// `[bottom_left, top_left, top_right, bottom_right]`.
///
/// A point lying exactly on an edge is *not* on the floor. Bound boxes with
/// fewer than four corners contain nothing.
pub fn is_same_floor(position: Position2D, bound_box: &[Position2D]) -> bool {
    let [bottom_left, top_left, top_right, bottom_right] = match bound_box {
        [a, b, c, d, ..] => [a, b, c, d],
        _ => return false,
    };

    bottom_left.x < position.x
        && bottom_left.y < position.y
        && top_left.x < position.x
        && position.y < top_left.y
        && position.x < top_right.x
        && position.y < top_right.y
        && position.x < bottom_right.x
        && bottom_right.y < position.y
}
