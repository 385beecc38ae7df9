//! Perspective projection parameters.
//!
//! The [`Projection`] struct is the single source of truth for the perspective
//! parameters (FOV, aspect ratio, near/far planes) and generates the OpenGL
//! style projection matrix from them.

use crate::math::mat4::Mat4;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees.
    fov_y_degrees: f32,
    /// Aspect ratio (width / height).
    aspect_ratio: f32,
    /// Near clipping plane distance.
    z_near: f32,
    /// Far clipping plane distance.
    z_far: f32,
}

impl Default for Projection {
    /// A narrow 30° square frustum reaching 10 units.
    ///
    /// The near plane sits at 0, so depth is degenerate; the overlay draws
    /// without depth testing and relies on back-face culling instead.
    fn default() -> Self {
        Self::new(30.0, 1.0, 0.0, 10.0)
    }
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `fov_y_degrees` - Vertical field of view in degrees
    /// * `aspect_ratio` - Width divided by height
    /// * `z_near` - Near clipping plane distance
    /// * `z_far` - Far clipping plane distance (must differ from `z_near`)
    pub fn new(fov_y_degrees: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y_degrees,
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Returns the vertical field of view in degrees.
    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y_degrees
    }

    /// Returns the aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// Generates the right-handed OpenGL projection matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_gl(
            self.fov_y_degrees,
            self.aspect_ratio,
            self.z_near,
            self.z_far,
        )
    }
}
