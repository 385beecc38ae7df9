//! The narrow slice of OpenGL ES the compositor drives.
//!
//! [`GraphicsApi`] lists exactly the calls the overlay needs. The production
//! implementation is [`GlowApi`]; tests use a recording implementation so
//! draw order, attribute state and object lifetimes can be checked without a
//! GPU.
//!
//! Every method must be called on the thread that owns the GL context.

mod glow_api;
#[cfg(test)]
pub(crate) mod recording;

use std::fmt;

pub use glow_api::GlowApi;

/// Value returned by [`GraphicsApi::get_error`] when the error queue is empty.
pub const NO_ERROR: u32 = 0;

/// Upper bound on error codes read from the GPU in one drain.
pub const MAX_DRAINED_ERRORS: usize = 32;

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Blend,
    CullFace,
}

/// Which framebuffer planes a clear touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearBuffers {
    pub color: bool,
    pub depth: bool,
}

impl ClearBuffers {
    pub const COLOR: Self = Self {
        color: true,
        depth: false,
    };
    pub const DEPTH: Self = Self {
        color: false,
        depth: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    ClampToEdge,
    Repeat,
}

/// Sampler state stored on a 2D texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSampling {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
}

impl TextureSampling {
    /// Linear filtering, clamped on both axes. Safe for non-power-of-two
    /// camera images on GLES 2.
    pub const LINEAR_CLAMP: Self = Self {
        min_filter: Filter::Linear,
        mag_filter: Filter::Linear,
        wrap_s: Wrap::ClampToEdge,
        wrap_t: Wrap::ClampToEdge,
    };
}

/// Symbolic name of a GL error code, for logs.
pub fn describe_error(code: u32) -> &'static str {
    match code {
        NO_ERROR => "GL_NO_ERROR",
        0x0500 => "GL_INVALID_ENUM",
        0x0501 => "GL_INVALID_VALUE",
        0x0502 => "GL_INVALID_OPERATION",
        0x0505 => "GL_OUT_OF_MEMORY",
        0x0506 => "GL_INVALID_FRAMEBUFFER_OPERATION",
        0x0507 => "GL_CONTEXT_LOST",
        _ => "unknown GL error",
    }
}

/// Pops queued error codes, oldest first, until the queue is empty or
/// [`MAX_DRAINED_ERRORS`] have been read.
pub fn drain_errors<G: GraphicsApi + ?Sized>(api: &G) -> Vec<u32> {
    let mut codes = Vec::new();
    while codes.len() < MAX_DRAINED_ERRORS {
        match api.get_error() {
            NO_ERROR => break,
            code => codes.push(code),
        }
    }
    codes
}

/// `width` and `height` as GL sizes, `None` if either exceeds `i32::MAX`.
pub fn gl_extent(width: u32, height: u32) -> Option<(i32, i32)> {
    Some((i32::try_from(width).ok()?, i32::try_from(height).ok()?))
}

/// GPU operations used by [`ShaderProgram`](crate::shader::ShaderProgram) and
/// [`Compositor`](crate::compositor::Compositor).
///
/// Handles are plain copies; the API does not track ownership, callers must
/// delete what they create.
pub trait GraphicsApi {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;
    type Texture: Copy + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    // ---- shaders and programs ----

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    /// Uploads `source` and compiles it. Returns the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Links and returns the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    /// Checks the program can run in the current state. Returns the status.
    fn validate_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn set_uniform_i32(&self, location: &Self::UniformLocation, value: i32);
    /// `columns` is column-major.
    fn set_uniform_mat4(&self, location: &Self::UniformLocation, columns: &[f32; 16]);

    // ---- textures ----

    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn delete_texture(&self, texture: Self::Texture);
    /// Makes `unit` active and binds `texture` to its 2D target.
    fn bind_texture_2d(&self, unit: u32, texture: Option<Self::Texture>);
    /// Sets sampler state on the currently bound 2D texture.
    fn set_texture_sampling(&self, sampling: TextureSampling);
    /// Replaces the bound 2D texture's level 0 with tightly packed RGBA8 rows.
    fn upload_rgba8(&self, width: u32, height: u32, pixels: &[u8]);

    // ---- vertex attributes ----

    fn enable_attribute(&self, index: u32);
    fn disable_attribute(&self, index: u32);
    /// Feeds attribute `index` with `components`-wide float tuples read from
    /// host memory. The data is consumed by the next draw call.
    fn attribute_from_host(&self, index: u32, components: i32, data: &[f32]);

    // ---- framebuffer and drawing ----

    fn bind_default_framebuffer(&self);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn set_clear_color(&self, rgba: [f32; 4]);
    fn clear(&self, buffers: ClearBuffers);
    fn enable(&self, capability: Capability);
    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32);
    /// Pops one code from the error queue, [`NO_ERROR`] when empty.
    fn get_error(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::recording::RecordingApi;
    use super::*;

    #[test]
    fn drain_empties_the_queue_in_order() {
        let api = RecordingApi::new();
        api.queue_errors(&[0x0502, 0x0500]);
        assert_eq!(drain_errors(&api), vec![0x0502, 0x0500]);
        assert_eq!(api.pending_errors(), 0);
        assert!(drain_errors(&api).is_empty());
    }

    #[test]
    fn drain_stops_at_the_bound() {
        let api = RecordingApi::new();
        api.queue_errors(&[0x0505; MAX_DRAINED_ERRORS + 1]);
        assert_eq!(drain_errors(&api).len(), MAX_DRAINED_ERRORS);
        assert_eq!(api.pending_errors(), 1);
    }

    #[test]
    fn extent_accepts_gl_range() {
        assert_eq!(gl_extent(640, 480), Some((640, 480)));
        assert_eq!(gl_extent(i32::MAX as u32, 1), Some((i32::MAX, 1)));
    }

    #[test]
    fn extent_rejects_sizes_past_i32() {
        assert_eq!(gl_extent(i32::MAX as u32 + 1, 1), None);
        assert_eq!(gl_extent(1, u32::MAX), None);
    }
}
