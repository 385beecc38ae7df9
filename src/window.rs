//! SDL2 window with an OpenGL ES 2.0 context, for the demo driver.

use std::sync::Arc;

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::video::{GLContext, GLProfile, SwapInterval};

pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;
pub const FPS: u64 = 60;
pub const FRAME_TARGET_TIME: f64 = 1000.0 / FPS as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    None,
    Quit,
    /// New drawable size in pixels.
    Resize(u32, u32),
}

pub struct FrameLimiter {
    previous_frame_time: u64,
}

impl FrameLimiter {
    pub fn new(window: &Window) -> Self {
        Self {
            previous_frame_time: window.timer().ticks64(),
        }
    }

    /// Waits if necessary to maintain frame rate and returns the delta time in milliseconds.
    ///
    /// With vsync active the swap already paces the loop and this rarely sleeps.
    pub fn wait_and_get_delta(&mut self, window: &Window) -> u64 {
        let mut current_time = window.timer().ticks64();
        let mut delta_time = current_time - self.previous_frame_time;

        if delta_time < FRAME_TARGET_TIME as u64 {
            let time_to_wait = (FRAME_TARGET_TIME as u64) - delta_time;
            std::thread::sleep(std::time::Duration::from_millis(time_to_wait));
            current_time = window.timer().ticks64();
            delta_time = current_time - self.previous_frame_time;
        }

        self.previous_frame_time = current_time;
        delta_time
    }
}

pub struct Window {
    // Dropped before `window`.
    gl_context: GLContext,
    window: sdl2::video::Window,
    video_subsystem: sdl2::VideoSubsystem,
    event_pump: sdl2::EventPump,
    timer_subsystem: sdl2::TimerSubsystem,
    _sdl_context: sdl2::Sdl,
}

impl Window {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;
        let timer_subsystem = sdl_context.timer()?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(GLProfile::GLES);
        gl_attr.set_context_version(2, 0);
        gl_attr.set_depth_size(16);
        gl_attr.set_double_buffer(true);

        let window = video_subsystem
            .window(title, width, height)
            .opengl()
            .position_centered()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;

        let gl_context = window.gl_create_context()?;
        window.gl_make_current(&gl_context)?;
        if let Err(err) = video_subsystem.gl_set_swap_interval(SwapInterval::VSync) {
            log::warn!("vsync unavailable: {err}");
        }
        let event_pump = sdl_context.event_pump()?;

        Ok(Self {
            gl_context,
            window,
            video_subsystem,
            event_pump,
            timer_subsystem,
            _sdl_context: sdl_context,
        })
    }

    /// Loads GL entry points for this window's context.
    ///
    /// # Safety
    ///
    /// The returned context is only valid while this window is alive and its
    /// context is current on the calling thread.
    pub unsafe fn load_gl(&self) -> Result<Arc<glow::Context>, String> {
        self.window.gl_make_current(&self.gl_context)?;
        let gl = glow::Context::from_loader_function(|name| {
            self.video_subsystem.gl_get_proc_address(name) as *const _
        });
        Ok(Arc::new(gl))
    }

    pub fn poll_events(&mut self) -> WindowEvent {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => return WindowEvent::Quit,
                Event::Window {
                    win_event: sdl2::event::WindowEvent::SizeChanged(..),
                    ..
                } => {
                    let (w, h) = self.window.drawable_size();
                    return WindowEvent::Resize(w, h);
                }
                _ => {}
            }
        }
        WindowEvent::None
    }

    /// Presents the back buffer.
    pub fn swap(&self) {
        self.window.gl_swap_window();
    }

    pub fn drawable_size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }

    pub fn timer(&self) -> &sdl2::TimerSubsystem {
        &self.timer_subsystem
    }
}
