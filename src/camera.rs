//! Fixed look-at camera.
//!
//! The overlay camera never moves during a session: it is described once by
//! an eye position, a target point and an up hint, and turned into a view
//! matrix when the [`Transform`](crate::transform::Transform) is built.

use crate::math::mat4::Mat4;
use crate::math::vec3::Vec3;

/// A right-handed look-at camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    eye: Vec3,
    center: Vec3,
    up: Vec3,
}

impl Default for Camera {
    /// Looks at the origin from slightly above and to the side, with +Z up.
    fn default() -> Self {
        Self::new(
            Vec3::new(2.0, 4.0, 1.2),
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 2.0),
        )
    }
}

impl Camera {
    /// Creates a camera at `eye` looking toward `center`.
    ///
    /// `up` only needs to be non-parallel to the viewing direction.
    pub fn new(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        Self { eye, center, up }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// The world → view transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }
}
