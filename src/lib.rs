//! Composites a lit 3D model over a live camera feed with OpenGL ES.
//!
//! The camera image is drawn as a full-screen background texture, then a
//! mesh parsed from OBJ text is drawn over it, spinning in place and shaded
//! with a single diffuse light.
//!
//! # Quick Start
//!
//! ```ignore
//! use camoverlay::prelude::*;
//!
//! let mesh = Mesh::load_obj("arrow.obj")?;
//! let api = unsafe { GlowApi::new(gl) };
//! let mut compositor = Compositor::new(api, mesh, CompositorConfig::default())?;
//! let sink = compositor.frame_sink(); // hand to the capture thread
//! loop {
//!     compositor.render_frame()?;
//! }
//! ```

// Public API - exposed to library consumers
pub mod camera;
pub mod compositor;
pub mod config;
pub mod frame;
pub mod gpu;
pub mod light;
pub mod math;
pub mod mesh;
pub mod obj;
pub mod projection;
pub mod shader;
pub mod texture;
pub mod transform;
pub mod window;

// Re-export commonly needed types at crate root for convenience
pub use compositor::{Compositor, CompositorError, FrameStats, RenderError};
pub use config::{CompositorConfig, GpuErrorPolicy, SceneConfig};
pub use frame::{CameraFrame, Frame, FrameError, FrameSink, PixelFormat};
pub use mesh::{LoadError, Mesh, MeshError};
pub use obj::{FacePolicy, ParseError, ParseOptions};
pub use shader::{RenderMode, ShaderError, ShaderProgram};
pub use transform::Transform;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use camoverlay::prelude::*;
/// ```
pub mod prelude {
    // Compositor
    pub use crate::compositor::{Compositor, CompositorError, FrameStats, RenderError};
    pub use crate::config::{CompositorConfig, GpuErrorPolicy, SceneConfig};

    // Geometry
    pub use crate::mesh::{LoadError, Mesh};
    pub use crate::obj::{FacePolicy, ParseOptions};

    // Frames
    pub use crate::frame::{CameraFrame, FrameSink, PixelFormat};

    // Scene
    pub use crate::camera::Camera;
    pub use crate::light::DiffuseLight;
    pub use crate::projection::Projection;
    pub use crate::shader::RenderMode;
    pub use crate::transform::Transform;

    // Math
    pub use crate::math::mat4::Mat4;
    pub use crate::math::vec3::Vec3;
    pub use crate::math::vec4::Vec4;

    // GPU
    pub use crate::gpu::{GlowApi, GraphicsApi};

    // Window & Input
    pub use crate::window::{
        FrameLimiter, Window, WindowEvent, WINDOW_HEIGHT, WINDOW_WIDTH,
    };
}
