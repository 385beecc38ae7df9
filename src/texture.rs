use crate::frame::Frame;
use crate::gpu::{GraphicsApi, TextureSampling};

/// Texture unit the camera image is bound to; `uTexture` samples it.
pub const CAMERA_TEXTURE_UNIT: u32 = 0;

/// The GPU texture that receives camera frames.
///
/// Created once and re-filled with every new frame, so a frame that never
/// arrives leaves the previous image on screen.
pub struct CameraTexture<G: GraphicsApi> {
    texture: G::Texture,
    size: Option<(u32, u32)>, // Size of the last upload, `None` until the first.
}

impl<G: GraphicsApi> CameraTexture<G> {
    pub fn new(api: &G) -> Result<Self, String> {
        let texture = api.create_texture()?;
        api.bind_texture_2d(CAMERA_TEXTURE_UNIT, Some(texture));
        api.set_texture_sampling(TextureSampling::LINEAR_CLAMP);
        Ok(Self {
            texture,
            size: None,
        })
    }

    pub fn bind(&self, api: &G) {
        api.bind_texture_2d(CAMERA_TEXTURE_UNIT, Some(self.texture));
    }

    /// Uploads `frame` into the bound texture.
    pub fn upload(&mut self, api: &G, frame: &Frame) {
        api.upload_rgba8(frame.width(), frame.height(), frame.as_bytes());
        self.size = Some((frame.width(), frame.height()));
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    pub fn handle(&self) -> G::Texture {
        self.texture
    }

    /// Unbinds and deletes the texture. The handle must not be used afterwards.
    pub fn destroy(&self, api: &G) {
        api.bind_texture_2d(CAMERA_TEXTURE_UNIT, None);
        api.delete_texture(self.texture);
    }
}
