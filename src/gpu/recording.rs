//! In-memory [`GraphicsApi`] that records every call.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::rc::Rc;

use super::{
    Capability, ClearBuffers, GraphicsApi, Primitive, ShaderStage, TextureSampling, NO_ERROR,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateShader(ShaderStage, u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    LinkProgram(u32),
    ValidateProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    UniformI32(String, i32),
    UniformMat4(String, [f32; 16]),
    CreateTexture(u32),
    DeleteTexture(u32),
    BindTexture(u32, Option<u32>),
    TextureSampling(TextureSampling),
    UploadRgba8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    EnableAttribute(u32),
    DisableAttribute(u32),
    AttributeFromHost {
        index: u32,
        components: i32,
        data: Vec<f32>,
    },
    BindDefaultFramebuffer,
    Viewport(i32, i32, i32, i32),
    ClearColor([f32; 4]),
    Clear(ClearBuffers),
    Enable(Capability),
    DrawArrays(Primitive, i32, i32),
}

#[derive(Default)]
struct State {
    next_id: u32,
    calls: Vec<Call>,
    live_shaders: HashSet<u32>,
    live_programs: HashSet<u32>,
    live_textures: HashSet<u32>,
    enabled: BTreeSet<u32>,
    fail_compile: Option<ShaderStage>,
    fail_create_program: bool,
    fail_create_texture: bool,
    fail_link: bool,
    fail_validate: bool,
    shader_stages: Vec<(u32, ShaderStage)>,
    missing_attributes: HashSet<String>,
    errors: VecDeque<u32>,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Attribute names resolve to fixed indices unless hidden with
/// [`without_attribute`](Self::without_attribute); every uniform resolves.
///
/// Clones share state, so a test can keep one handle while the code under
/// test owns another.
#[derive(Clone, Default)]
pub(crate) struct RecordingApi {
    state: Rc<RefCell<State>>,
}

impl RecordingApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_compile(self, stage: ShaderStage) -> Self {
        self.state.borrow_mut().fail_compile = Some(stage);
        self
    }

    pub(crate) fn fail_create_program(self) -> Self {
        self.state.borrow_mut().fail_create_program = true;
        self
    }

    pub(crate) fn fail_create_texture(self) -> Self {
        self.state.borrow_mut().fail_create_texture = true;
        self
    }

    pub(crate) fn fail_link(self) -> Self {
        self.state.borrow_mut().fail_link = true;
        self
    }

    pub(crate) fn fail_validate(self) -> Self {
        self.state.borrow_mut().fail_validate = true;
        self
    }

    pub(crate) fn without_attribute(self, name: &str) -> Self {
        self.state
            .borrow_mut()
            .missing_attributes
            .insert(name.to_string());
        self
    }

    /// Queues error codes to be returned by `get_error`, oldest first.
    pub(crate) fn queue_errors(&self, codes: &[u32]) {
        self.state.borrow_mut().errors.extend(codes.iter().copied());
    }

    pub(crate) fn pending_errors(&self) -> usize {
        self.state.borrow().errors.len()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Shaders, programs and textures created and not yet deleted.
    pub(crate) fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.live_shaders.len() + state.live_programs.len() + state.live_textures.len()
    }

    pub(crate) fn enabled_attributes(&self) -> Vec<u32> {
        self.state.borrow().enabled.iter().copied().collect()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GraphicsApi for RecordingApi {
    type Shader = u32;
    type Program = u32;
    type Texture = u32;
    type UniformLocation = String;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.live_shaders.insert(id);
        state.shader_stages.push((id, stage));
        state.calls.push(Call::CreateShader(stage, id));
        Ok(id)
    }

    fn compile_shader(&self, shader: u32, _source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::CompileShader(shader));
        let stage = state
            .shader_stages
            .iter()
            .find(|(id, _)| *id == shader)
            .map(|(_, stage)| *stage);
        state.fail_compile.is_none() || stage != state.fail_compile
    }

    fn shader_info_log(&self, shader: u32) -> String {
        format!("0:1: error in shader {shader}")
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.live_shaders.remove(&shader);
        state.calls.push(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        if state.fail_create_program {
            return Err("out of program objects".to_string());
        }
        let id = state.next();
        state.live_programs.insert(id);
        state.calls.push(Call::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader(program, shader));
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader(program, shader));
    }

    fn link_program(&self, program: u32) -> bool {
        self.record(Call::LinkProgram(program));
        !self.state.borrow().fail_link
    }

    fn validate_program(&self, program: u32) -> bool {
        self.record(Call::ValidateProgram(program));
        !self.state.borrow().fail_validate
    }

    fn program_info_log(&self, program: u32) -> String {
        format!("program {program}: link failed")
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.live_programs.remove(&program);
        state.calls.push(Call::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<String> {
        Some(name.to_string())
    }

    fn attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        if self.state.borrow().missing_attributes.contains(name) {
            return None;
        }
        match name {
            "aPosition" => Some(0),
            "aTexPosition" => Some(1),
            "aNormal" => Some(2),
            _ => None,
        }
    }

    fn set_uniform_i32(&self, location: &String, value: i32) {
        self.record(Call::UniformI32(location.clone(), value));
    }

    fn set_uniform_mat4(&self, location: &String, columns: &[f32; 16]) {
        self.record(Call::UniformMat4(location.clone(), *columns));
    }

    fn create_texture(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        if state.fail_create_texture {
            return Err("out of texture objects".to_string());
        }
        let id = state.next();
        state.live_textures.insert(id);
        state.calls.push(Call::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&self, texture: u32) {
        let mut state = self.state.borrow_mut();
        state.live_textures.remove(&texture);
        state.calls.push(Call::DeleteTexture(texture));
    }

    fn bind_texture_2d(&self, unit: u32, texture: Option<u32>) {
        self.record(Call::BindTexture(unit, texture));
    }

    fn set_texture_sampling(&self, sampling: TextureSampling) {
        self.record(Call::TextureSampling(sampling));
    }

    fn upload_rgba8(&self, width: u32, height: u32, pixels: &[u8]) {
        self.record(Call::UploadRgba8 {
            width,
            height,
            pixels: pixels.to_vec(),
        });
    }

    fn enable_attribute(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        state.enabled.insert(index);
        state.calls.push(Call::EnableAttribute(index));
    }

    fn disable_attribute(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        state.enabled.remove(&index);
        state.calls.push(Call::DisableAttribute(index));
    }

    fn attribute_from_host(&self, index: u32, components: i32, data: &[f32]) {
        self.record(Call::AttributeFromHost {
            index,
            components,
            data: data.to_vec(),
        });
    }

    fn bind_default_framebuffer(&self) {
        self.record(Call::BindDefaultFramebuffer);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn set_clear_color(&self, rgba: [f32; 4]) {
        self.record(Call::ClearColor(rgba));
    }

    fn clear(&self, buffers: ClearBuffers) {
        self.record(Call::Clear(buffers));
    }

    fn enable(&self, capability: Capability) {
        self.record(Call::Enable(capability));
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        self.record(Call::DrawArrays(primitive, first, count));
    }

    fn get_error(&self) -> u32 {
        self.state.borrow_mut().errors.pop_front().unwrap_or(NO_ERROR)
    }
}
