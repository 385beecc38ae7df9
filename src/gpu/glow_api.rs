use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use glow::HasContext;

use super::{
    gl_extent, Capability, ClearBuffers, Filter, GraphicsApi, Primitive, ShaderStage,
    TextureSampling, Wrap,
};

/// [`GraphicsApi`] over a [`glow`] OpenGL ES 2.0 context.
///
/// GLES 2 allows client-side vertex arrays but glow exposes only buffer
/// objects, so each attribute index gets one `STREAM_DRAW` buffer that is
/// refilled on every [`attribute_from_host`](GraphicsApi::attribute_from_host).
pub struct GlowApi {
    gl: Arc<glow::Context>,
    streams: RefCell<HashMap<u32, glow::Buffer>>,
}

impl GlowApi {
    /// Wraps a loaded context.
    ///
    /// # Safety
    ///
    /// The context must be current on the calling thread for the whole
    /// lifetime of the returned value, including its drop.
    pub unsafe fn new(gl: Arc<glow::Context>) -> Self {
        Self {
            gl,
            streams: RefCell::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    fn stream_buffer(&self, index: u32) -> Option<glow::Buffer> {
        let mut streams = self.streams.borrow_mut();
        if let Some(buffer) = streams.get(&index) {
            return Some(*buffer);
        }
        match unsafe { self.gl.create_buffer() } {
            Ok(buffer) => {
                streams.insert(index, buffer);
                Some(buffer)
            }
            Err(err) => {
                log::error!("failed to create stream buffer for attribute {index}: {err}");
                None
            }
        }
    }
}

impl Drop for GlowApi {
    fn drop(&mut self) {
        for (_, buffer) in self.streams.get_mut().drain() {
            unsafe { self.gl.delete_buffer(buffer) };
        }
    }
}

fn filter_enum(filter: Filter) -> i32 {
    match filter {
        Filter::Nearest => glow::NEAREST as i32,
        Filter::Linear => glow::LINEAR as i32,
    }
}

fn wrap_enum(wrap: Wrap) -> i32 {
    match wrap {
        Wrap::ClampToEdge => glow::CLAMP_TO_EDGE as i32,
        Wrap::Repeat => glow::REPEAT as i32,
    }
}

// SAFETY (all methods): `GlowApi::new` requires the context to be current
// on this thread; handles passed in were produced by the same context.
impl GraphicsApi for GlowApi {
    type Shader = <glow::Context as HasContext>::Shader;
    type Program = <glow::Context as HasContext>::Program;
    type Texture = <glow::Context as HasContext>::Texture;
    type UniformLocation = <glow::Context as HasContext>::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(kind) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn validate_program(&self, program: Self::Program) -> bool {
        // glow has no glValidateProgram; the link status is the closest
        // equivalent it exposes.
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn set_uniform_i32(&self, location: &Self::UniformLocation, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    fn set_uniform_mat4(&self, location: &Self::UniformLocation, columns: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, columns)
        }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { self.gl.create_texture() }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn bind_texture_2d(&self, unit: u32, texture: Option<Self::Texture>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn set_texture_sampling(&self, sampling: TextureSampling) {
        unsafe {
            let gl = &self.gl;
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                filter_enum(sampling.min_filter),
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                filter_enum(sampling.mag_filter),
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap_enum(sampling.wrap_s));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap_enum(sampling.wrap_t));
        }
    }

    fn upload_rgba8(&self, width: u32, height: u32, pixels: &[u8]) {
        let Some((width, height)) = gl_extent(width, height) else {
            log::error!("texture of {width}x{height} exceeds GL size limits, upload skipped");
            return;
        };
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
        }
    }

    fn enable_attribute(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_attribute(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn attribute_from_host(&self, index: u32, components: i32, data: &[f32]) {
        let Some(buffer) = self.stream_buffer(index) else {
            return;
        };
        unsafe {
            let gl = &self.gl;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STREAM_DRAW,
            );
            gl.vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn bind_default_framebuffer(&self) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, None) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn set_clear_color(&self, [r, g, b, a]: [f32; 4]) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self, buffers: ClearBuffers) {
        let mut mask = 0;
        if buffers.color {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if buffers.depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if mask != 0 {
            unsafe { self.gl.clear(mask) }
        }
    }

    fn enable(&self, capability: Capability) {
        let cap = match capability {
            Capability::Blend => glow::BLEND,
            Capability::CullFace => glow::CULL_FACE,
        };
        unsafe { self.gl.enable(cap) }
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        let mode = match primitive {
            Primitive::Triangles => glow::TRIANGLES,
            Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
        };
        unsafe { self.gl.draw_arrays(mode, first, count) }
    }

    fn get_error(&self) -> u32 {
        unsafe { self.gl.get_error() }
    }
}
