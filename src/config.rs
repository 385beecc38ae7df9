//! Compositor and scene configuration.
//!
//! Defaults reproduce the reference overlay: a small arrow tipped 90° about
//! X, spinning 1° per frame about its own Y axis, seen from `(2, 4, 1.2)`
//! through a 30° frustum, over a cyan clear colour.

use crate::camera::Camera;
use crate::math::vec3::Vec3;
use crate::projection::Projection;
use crate::shader::RenderMode;

/// What to do when the GPU reports errors after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuErrorPolicy {
    /// Log, report the error for this frame, keep rendering later frames.
    #[default]
    SkipFrame,
    /// Report the error and refuse to render any further frames.
    Fatal,
}

/// Fixed camera, projection and model motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub camera: Camera,
    pub projection: Projection,
    /// Rotation applied to the model once, at construction.
    pub initial_rotation_degrees: f32,
    pub initial_rotation_axis: Vec3,
    /// Model-space axis of the per-frame spin.
    pub spin_axis: Vec3,
    /// Degrees added every rendered frame (frame-rate dependent).
    pub spin_step_degrees: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            projection: Projection::default(),
            initial_rotation_degrees: 90.0,
            initial_rotation_axis: Vec3::X,
            spin_axis: Vec3::Y,
            spin_step_degrees: 1.0,
        }
    }
}

impl SceneConfig {
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_spin(mut self, axis: Vec3, step_degrees: f32) -> Self {
        self.spin_axis = axis;
        self.spin_step_degrees = step_degrees;
        self
    }
}

/// Everything the [`Compositor`](crate::compositor::Compositor) needs besides
/// the GPU and the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorConfig {
    pub scene: SceneConfig,
    /// RGBA colour the frame is cleared to before the background pass.
    pub clear_color: [f32; 4],
    /// Shader path used for the mesh pass.
    pub overlay_mode: RenderMode,
    pub error_policy: GpuErrorPolicy,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            clear_color: [0.0, 1.0, 1.0, 1.0],
            overlay_mode: RenderMode::LitDiffuse,
            error_policy: GpuErrorPolicy::SkipFrame,
        }
    }
}

impl CompositorConfig {
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn with_overlay_mode(mut self, overlay_mode: RenderMode) -> Self {
        self.overlay_mode = overlay_mode;
        self
    }

    pub fn with_error_policy(mut self, error_policy: GpuErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }
}
