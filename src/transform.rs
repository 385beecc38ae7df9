//! Model, camera and projection state for the overlay.
//!
//! A [`Transform`] owns the three matrices that place the overlay mesh on
//! screen. The camera and projection are fixed when it is built; the model
//! matrix spins by a fixed step every rendered frame.

use crate::config::SceneConfig;
use crate::math::{mat4::Mat4, vec3::Vec3};

/// Matrix state for one overlay model.
///
/// ```ignore
/// let mut transform = Transform::from_scene(&SceneConfig::default());
/// transform.advance_model_rotation(1.0);
/// let mvp = transform.compose_mvp();
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    model: Mat4,
    camera: Mat4,
    projection: Mat4,
    spin_axis: Vec3,
}

impl Transform {
    /// Creates a transform from explicit matrices.
    ///
    /// `spin_axis` is the model-space axis used by
    /// [`advance_model_rotation`](Self::advance_model_rotation).
    pub fn new(model: Mat4, camera: Mat4, projection: Mat4, spin_axis: Vec3) -> Self {
        Self {
            model,
            camera,
            projection,
            spin_axis,
        }
    }

    /// Builds the session transform from scene parameters.
    pub fn from_scene(scene: &SceneConfig) -> Self {
        let model = Mat4::rotation_axis(
            scene.initial_rotation_degrees,
            scene.initial_rotation_axis,
        );
        Self::new(
            model,
            scene.camera.view_matrix(),
            scene.projection.matrix(),
            scene.spin_axis,
        )
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn camera(&self) -> Mat4 {
        self.camera
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn spin_axis(&self) -> Vec3 {
        self.spin_axis
    }

    /// Spins the model by `step_degrees` about the spin axis.
    ///
    /// The rotation is applied in model space, before the existing model
    /// transform: `model = model * R(step)`.
    pub fn advance_model_rotation(&mut self, step_degrees: f32) -> &mut Self {
        self.model = self.model * Mat4::rotation_axis(step_degrees, self.spin_axis);
        self
    }

    /// `projection * (camera * model)`.
    pub fn compose_mvp(&self) -> Mat4 {
        self.projection * (self.camera * self.model)
    }
}
