//! Compiled GPU program for the overlay.

pub mod source;

use std::fmt;

use log::{debug, error, warn};
use thiserror::Error;

use crate::gpu::{describe_error, drain_errors, GraphicsApi, ShaderStage};

pub use source::RenderMode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error("driver could not allocate a shader object: {0}")]
    CreateObject(String),

    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    Link { log: String },

    #[error("program failed validation: {log}")]
    Validate { log: String },
}

/// Locations of the fixed overlay interface, resolved once after link.
///
/// `None` means the driver reported the name as absent, usually because the
/// compiler optimized it out.
pub struct ProgramInterface<G: GraphicsApi> {
    pub mode: Option<G::UniformLocation>,
    pub mvp: Option<G::UniformLocation>,
    pub texture: Option<G::UniformLocation>,
    pub position: Option<u32>,
    pub tex_position: Option<u32>,
    pub normal: Option<u32>,
}

// Derives would demand `G: Debug + Clone`; only the handle types need it.
impl<G: GraphicsApi> fmt::Debug for ProgramInterface<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramInterface")
            .field("mode", &self.mode)
            .field("mvp", &self.mvp)
            .field("texture", &self.texture)
            .field("position", &self.position)
            .field("tex_position", &self.tex_position)
            .field("normal", &self.normal)
            .finish()
    }
}

impl<G: GraphicsApi> Clone for ProgramInterface<G> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode.clone(),
            mvp: self.mvp.clone(),
            texture: self.texture.clone(),
            position: self.position,
            tex_position: self.tex_position,
            normal: self.normal,
        }
    }
}

/// A linked and validated program.
///
/// The program object is not released on drop, that needs the API handle;
/// call [`destroy`](Self::destroy).
pub struct ShaderProgram<G: GraphicsApi> {
    program: G::Program,
    interface: ProgramInterface<G>,
}

impl<G: GraphicsApi> fmt::Debug for ShaderProgram<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .field("interface", &self.interface)
            .finish()
    }
}

impl<G: GraphicsApi> ShaderProgram<G> {
    /// Compiles both stages, links, validates and resolves the interface.
    ///
    /// Every object created along the way is deleted before an error is
    /// returned. On success the shader objects are detached and deleted.
    pub fn compile(api: &G, vertex_src: &str, fragment_src: &str) -> Result<Self, ShaderError> {
        let vertex = compile_stage(api, ShaderStage::Vertex, vertex_src)?;
        let fragment = match compile_stage(api, ShaderStage::Fragment, fragment_src) {
            Ok(fragment) => fragment,
            Err(err) => {
                api.delete_shader(vertex);
                return Err(err);
            }
        };

        let linked = link(api, vertex, fragment);
        api.delete_shader(vertex);
        api.delete_shader(fragment);
        let program = linked?;

        // Errors queued by earlier work say nothing about this program.
        for code in drain_errors(api) {
            warn!(
                "clearing earlier GPU error {} (0x{code:04X}) before validation",
                describe_error(code)
            );
        }
        if !api.validate_program(program) {
            let log = api.program_info_log(program);
            error!("program validation failed: {log}");
            api.delete_program(program);
            return Err(ShaderError::Validate { log });
        }

        let interface = ProgramInterface {
            mode: api.uniform_location(program, source::U_MODE),
            mvp: api.uniform_location(program, source::U_MVP),
            texture: api.uniform_location(program, source::U_TEXTURE),
            position: api.attrib_location(program, source::A_POSITION),
            tex_position: api.attrib_location(program, source::A_TEX_POSITION),
            normal: api.attrib_location(program, source::A_NORMAL),
        };
        debug!("linked program {program:?}: {interface:?}");

        Ok(Self { program, interface })
    }

    pub fn program(&self) -> G::Program {
        self.program
    }

    pub fn interface(&self) -> &ProgramInterface<G> {
        &self.interface
    }

    /// Looks up any uniform by name.
    pub fn uniform(&self, api: &G, name: &str) -> Option<G::UniformLocation> {
        api.uniform_location(self.program, name)
    }

    /// Looks up any vertex attribute by name.
    pub fn attribute(&self, api: &G, name: &str) -> Option<u32> {
        api.attrib_location(self.program, name)
    }

    /// Deletes the program object. The handle must not be used afterwards.
    pub fn destroy(&self, api: &G) {
        api.delete_program(self.program);
    }
}

fn compile_stage<G: GraphicsApi>(
    api: &G,
    stage: ShaderStage,
    src: &str,
) -> Result<G::Shader, ShaderError> {
    let shader = api.create_shader(stage).map_err(ShaderError::CreateObject)?;
    if api.compile_shader(shader, src) {
        return Ok(shader);
    }
    let log = api.shader_info_log(shader);
    error!("{stage} shader compile failed: {log}");
    api.delete_shader(shader);
    Err(ShaderError::Compile { stage, log })
}

/// Links the two stages; the shaders are left for the caller to delete.
fn link<G: GraphicsApi>(
    api: &G,
    vertex: G::Shader,
    fragment: G::Shader,
) -> Result<G::Program, ShaderError> {
    let program = api.create_program().map_err(ShaderError::CreateObject)?;
    api.attach_shader(program, vertex);
    api.attach_shader(program, fragment);
    let linked = api.link_program(program);
    api.detach_shader(program, vertex);
    api.detach_shader(program, fragment);

    if linked {
        return Ok(program);
    }
    let log = api.program_info_log(program);
    error!("program link failed: {log}");
    api.delete_program(program);
    Err(ShaderError::Link { log })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::recording::{Call, RecordingApi};
    use crate::light::DiffuseLight;

    fn compile(api: &RecordingApi) -> Result<ShaderProgram<RecordingApi>, ShaderError> {
        ShaderProgram::compile(
            api,
            source::VERTEX_SHADER,
            &source::fragment_shader(&DiffuseLight::default()),
        )
    }

    #[test]
    fn success_keeps_only_the_program() {
        let api = RecordingApi::new();
        let program = compile(&api).unwrap();
        assert_eq!(api.live_objects(), 1);

        let calls = api.calls();
        assert!(calls.contains(&Call::DetachShader(program.program(), 1)));
        assert!(calls.contains(&Call::DetachShader(program.program(), 2)));
        assert!(calls.contains(&Call::DeleteShader(1)));
        assert!(calls.contains(&Call::DeleteShader(2)));

        program.destroy(&api);
        assert_eq!(api.live_objects(), 0);
    }

    #[test]
    fn interface_is_resolved() {
        let api = RecordingApi::new();
        let program = compile(&api).unwrap();
        let interface = program.interface();
        assert_eq!(interface.mvp.as_deref(), Some("uMVP"));
        assert_eq!(interface.position, Some(0));
        assert_eq!(interface.tex_position, Some(1));
        assert_eq!(interface.normal, Some(2));
        assert_eq!(program.attribute(&api, "aBogus"), None);
        assert_eq!(program.uniform(&api, "uMode").as_deref(), Some("uMode"));
    }

    #[test]
    fn missing_attribute_is_none() {
        let api = RecordingApi::new().without_attribute("aNormal");
        let program = compile(&api).unwrap();
        assert_eq!(program.interface().normal, None);
    }

    #[test]
    fn vertex_compile_failure_releases_everything() {
        let api = RecordingApi::new().fail_compile(ShaderStage::Vertex);
        let err = compile(&api).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
        assert_eq!(api.live_objects(), 0);
    }

    #[test]
    fn fragment_compile_failure_releases_vertex_shader() {
        let api = RecordingApi::new().fail_compile(ShaderStage::Fragment);
        let err = compile(&api).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert_eq!(api.live_objects(), 0);
    }

    #[test]
    fn link_failure_releases_everything() {
        let api = RecordingApi::new().fail_link();
        let err = compile(&api).unwrap_err();
        match err {
            ShaderError::Link { log } => assert!(log.contains("link failed")),
            other => panic!("expected link error, got {other:?}"),
        }
        assert_eq!(api.live_objects(), 0);
    }

    #[test]
    fn validate_failure_releases_everything() {
        let api = RecordingApi::new().fail_validate();
        assert!(matches!(compile(&api), Err(ShaderError::Validate { .. })));
        assert_eq!(api.live_objects(), 0);
    }

    #[test]
    fn program_allocation_failure_releases_shaders() {
        let api = RecordingApi::new().fail_create_program();
        assert!(matches!(compile(&api), Err(ShaderError::CreateObject(_))));
        assert_eq!(api.live_objects(), 0);
    }

    #[test]
    fn earlier_errors_are_cleared_before_validation() {
        let api = RecordingApi::new();
        api.queue_errors(&[0x0501, 0x0502]);
        let program = compile(&api).unwrap();
        assert_eq!(api.pending_errors(), 0);
        let calls = api.calls();
        let validated = calls
            .iter()
            .position(|call| matches!(call, Call::ValidateProgram(_)))
            .unwrap();
        assert!(calls[..validated]
            .iter()
            .any(|call| matches!(call, Call::LinkProgram(_))));
        program.destroy(&api);
    }
}
