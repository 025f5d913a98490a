use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Vec3};

/// Control node of a curve or spline.
///
/// `direction` is the absolute position of the outgoing Bezier handle; the incoming handle is
/// its mirror through `position`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineNode {
    pub position: Point3,
    pub direction: Point3,
    pub up: Vec3,
    /// Lateral scale `[x, y]` at this node.
    pub scale: [f64; 2],
    /// Roll in degrees at this node.
    pub roll: f64,
}

impl SplineNode {
    #[must_use]
    pub const fn new(position: Point3, direction: Point3) -> Self {
        Self {
            position,
            direction,
            up: Vec3::Y,
            scale: [1.0, 1.0],
            roll: 0.0,
        }
    }

    #[must_use]
    pub const fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    #[must_use]
    pub const fn with_scale(mut self, x: f64, y: f64) -> Self {
        self.scale = [x, y];
        self
    }

    #[must_use]
    pub const fn with_roll(mut self, degrees: f64) -> Self {
        self.roll = degrees;
        self
    }

    /// Incoming handle position (the outgoing handle mirrored through the node).
    #[must_use]
    pub fn inverse_direction(&self) -> Point3 {
        self.position
            .add_vec(self.position.sub_point(self.direction))
    }
}

impl Default for SplineNode {
    fn default() -> Self {
        Self::new(Point3::ORIGIN, Point3::new(0.0, 0.0, 1.0))
    }
}
