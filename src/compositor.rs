//! Two-pass frame compositor.
//!
//! Every [`Compositor::render_frame`] draws the latest camera image as a
//! full-screen background quad, clears depth, then draws the spinning mesh
//! over it with the overlay shader path. One GPU program serves both passes;
//! the `uMode` uniform selects the path.

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::{CompositorConfig, GpuErrorPolicy};
use crate::frame::{CameraFrame, FrameError, FrameSink};
use crate::gpu::{
    describe_error, drain_errors, gl_extent, Capability, ClearBuffers, GraphicsApi, Primitive,
};
use crate::light::DiffuseLight;
use crate::mesh::Mesh;
use crate::shader::{source, RenderMode, ShaderError, ShaderProgram};
use crate::texture::{CameraTexture, CAMERA_TEXTURE_UNIT};
use crate::transform::Transform;

pub use crate::gpu::MAX_DRAINED_ERRORS;

/// Full-screen quad in clip space, triangle-strip order.
const QUAD_POSITIONS: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
/// Texture coordinates for [`QUAD_POSITIONS`], V flipped for top-left image rows.
const QUAD_TEXCOORDS: [f32; 8] = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositorError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("failed to allocate GPU resource: {0}")]
    Resource(String),

    #[error("mesh has {0} vertices, more than one draw call can address")]
    MeshTooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("GPU reported errors: {}", describe_codes(.codes))]
    Gpu { codes: Vec<u32> },

    #[error("compositor stopped after an earlier fatal GPU error")]
    Poisoned,
}

fn describe_codes(codes: &[u32]) -> String {
    codes
        .iter()
        .map(|code| format!("{} (0x{code:04X})", describe_error(*code)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// What a successful [`Compositor::render_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// 1-based count of rendered frames.
    pub frame_index: u64,
    /// A new camera frame was uploaded this time.
    pub frame_uploaded: bool,
    /// Vertices submitted for the overlay.
    pub mesh_vertices: usize,
}

/// Draws camera frames with a mesh overlaid.
///
/// All methods except [`set_frame`](Self::set_frame) must run on the thread
/// that owns the GPU context. Capture threads deliver frames through a
/// [`FrameSink`] from [`frame_sink`](Self::frame_sink).
pub struct Compositor<G: GraphicsApi> {
    api: G,
    program: ShaderProgram<G>,
    texture: CameraTexture<G>,
    mesh: Mesh,
    mesh_vertices: i32,
    transform: Transform,
    frames: FrameSink,
    config: CompositorConfig,
    frame_index: u64,
    poisoned: bool,
}

impl<G: GraphicsApi> Compositor<G> {
    /// Compiles the overlay program and allocates the camera texture.
    pub fn new(api: G, mesh: Mesh, config: CompositorConfig) -> Result<Self, CompositorError> {
        let mesh_vertices = i32::try_from(mesh.vertex_count())
            .map_err(|_| CompositorError::MeshTooLarge(mesh.vertex_count()))?;

        let fragment = source::fragment_shader(&DiffuseLight::default());
        let program = ShaderProgram::compile(&api, source::VERTEX_SHADER, &fragment)?;
        let texture = match CameraTexture::new(&api) {
            Ok(texture) => texture,
            Err(err) => {
                program.destroy(&api);
                return Err(CompositorError::Resource(err));
            }
        };

        let interface = program.interface();
        if interface.position.is_none() {
            warn!("program has no `{}` attribute, nothing will be drawn", source::A_POSITION);
        }
        api.set_clear_color(config.clear_color);
        info!(
            "compositor ready: {} overlay vertices, overlay mode {:?}",
            mesh_vertices, config.overlay_mode
        );

        Ok(Self {
            api,
            program,
            texture,
            mesh,
            mesh_vertices,
            transform: Transform::from_scene(&config.scene),
            frames: FrameSink::new(),
            config,
            frame_index: 0,
            poisoned: false,
        })
    }

    /// Converts `frame` and makes it the next one to be shown.
    ///
    /// A frame still pending from an earlier call is dropped.
    pub fn set_frame(&self, frame: CameraFrame) -> Result<(), FrameError> {
        self.frames.set_frame(frame)
    }

    /// Handle for delivering frames from another thread.
    pub fn frame_sink(&self) -> FrameSink {
        self.frames.clone()
    }

    /// Adapts the viewport to a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some((width, height)) = gl_extent(width, height) else {
            warn!("surface of {width}x{height} exceeds GL size limits, viewport unchanged");
            return;
        };
        self.api.viewport(0, 0, width, height);
        self.api.set_clear_color(self.config.clear_color);
        debug!("viewport resized to {width}x{height}");
    }

    /// Draws one frame into the default framebuffer.
    pub fn render_frame(&mut self) -> Result<FrameStats, RenderError> {
        if self.poisoned {
            return Err(RenderError::Poisoned);
        }
        let api = &self.api;

        self.texture.bind(api);
        let frame_uploaded = match self.frames.slot().take() {
            Some(frame) => {
                self.texture.upload(api, &frame);
                true
            }
            None => false,
        };

        api.bind_default_framebuffer();
        api.use_program(Some(self.program.program()));
        api.enable(Capability::Blend);
        api.enable(Capability::CullFace);
        api.set_clear_color(self.config.clear_color);
        api.clear(ClearBuffers::COLOR);

        let interface = self.program.interface();
        let mut enabled = Vec::with_capacity(3);

        // Background.
        if let Some(sampler) = &interface.texture {
            api.set_uniform_i32(sampler, CAMERA_TEXTURE_UNIT as i32);
        }
        self.set_mode(RenderMode::Passthrough);
        self.feed_attribute(interface.position, 2, &QUAD_POSITIONS, &mut enabled);
        self.feed_attribute(interface.tex_position, 2, &QUAD_TEXCOORDS, &mut enabled);
        api.draw_arrays(Primitive::TriangleStrip, 0, 4);

        api.clear(ClearBuffers::DEPTH);

        // Overlay.
        self.transform
            .advance_model_rotation(self.config.scene.spin_step_degrees);
        if let Some(mvp) = &interface.mvp {
            api.set_uniform_mat4(mvp, &self.transform.compose_mvp().to_cols_array());
        }
        self.set_mode(self.config.overlay_mode);
        if !self.mesh.is_empty() {
            self.feed_attribute(interface.position, 3, self.mesh.positions(), &mut enabled);
            self.feed_attribute(interface.tex_position, 2, self.mesh.texcoords(), &mut enabled);
            self.feed_attribute(interface.normal, 3, self.mesh.normals(), &mut enabled);
            api.draw_arrays(Primitive::Triangles, 0, self.mesh_vertices);
        }

        for index in enabled {
            api.disable_attribute(index);
        }

        self.frame_index += 1;
        let codes = drain_errors(&self.api);
        if !codes.is_empty() {
            return Err(self.gpu_failure(codes));
        }

        Ok(FrameStats {
            frame_index: self.frame_index,
            frame_uploaded,
            mesh_vertices: self.mesh.vertex_count(),
        })
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn api(&self) -> &G {
        &self.api
    }

    fn set_mode(&self, mode: RenderMode) {
        if let Some(location) = &self.program.interface().mode {
            self.api.set_uniform_i32(location, mode.as_uniform());
        }
    }

    fn feed_attribute(
        &self,
        location: Option<u32>,
        components: i32,
        data: &[f32],
        enabled: &mut Vec<u32>,
    ) {
        let Some(index) = location else {
            return;
        };
        self.api.attribute_from_host(index, components, data);
        if !enabled.contains(&index) {
            self.api.enable_attribute(index);
            enabled.push(index);
        }
    }

    fn gpu_failure(&mut self, codes: Vec<u32>) -> RenderError {
        match self.config.error_policy {
            GpuErrorPolicy::SkipFrame => {
                warn!(
                    "frame {} skipped: {}",
                    self.frame_index,
                    describe_codes(&codes)
                );
            }
            GpuErrorPolicy::Fatal => {
                error!(
                    "frame {} failed, compositor stopped: {}",
                    self.frame_index,
                    describe_codes(&codes)
                );
                self.poisoned = true;
            }
        }
        RenderError::Gpu { codes }
    }
}

impl<G: GraphicsApi> Drop for Compositor<G> {
    fn drop(&mut self) {
        self.api.use_program(None);
        self.texture.destroy(&self.api);
        self.program.destroy(&self.api);
        if self.frames.slot().take().is_some() {
            debug!("discarded pending camera frame on teardown");
        }
    }
}
