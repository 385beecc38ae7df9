use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use camoverlay::prelude::*;
use log::{error, info, warn};

const BUILTIN_MESH: &str = include_str!("../assets/arrow.obj");

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;
/// Sensor-mounted cameras deliver landscape buffers that need a quarter turn.
const CAPTURE_ROTATION: i32 = 90;
const CAPTURE_INTERVAL: Duration = Duration::from_millis(33);

fn load_mesh() -> Result<Mesh, String> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("loading mesh from {path}");
            Mesh::load_obj(&path).map_err(|e| format!("{path}: {e}"))
        }
        None => Mesh::from_obj_str(BUILTIN_MESH).map_err(|e| e.to_string()),
    }
}

/// Moving colour bars standing in for a camera.
fn test_pattern(tick: u32) -> CameraFrame {
    let mut pixels = Vec::with_capacity((CAPTURE_WIDTH * CAPTURE_HEIGHT * 3) as usize);
    for y in 0..CAPTURE_HEIGHT {
        for x in 0..CAPTURE_WIDTH {
            let band = ((x + tick * 4) / 80) % 4;
            let shade = (y * 255 / CAPTURE_HEIGHT) as u8;
            let pixel = match band {
                0 => [shade, 40, 40],
                1 => [40, shade, 40],
                2 => [40, 40, shade],
                _ => [shade, shade, shade],
            };
            pixels.extend_from_slice(&pixel);
        }
    }
    CameraFrame::new(
        CAPTURE_WIDTH,
        CAPTURE_HEIGHT,
        PixelFormat::Rgb8,
        pixels,
        CAPTURE_ROTATION,
    )
}

fn spawn_capture(sink: FrameSink, running: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut tick = 0u32;
        while running.load(Ordering::Relaxed) {
            if let Err(err) = sink.set_frame(test_pattern(tick)) {
                warn!("capture frame rejected: {err}");
            }
            tick = tick.wrapping_add(1);
            thread::sleep(CAPTURE_INTERVAL);
        }
    })
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mesh = load_mesh()?;
    info!("mesh has {} triangles", mesh.triangle_count());

    let mut window = Window::new("camoverlay", WINDOW_WIDTH, WINDOW_HEIGHT)?;
    // SAFETY: the context stays current on this thread and `compositor`,
    // declared after `window`, is dropped first.
    let api = unsafe { GlowApi::new(window.load_gl()?) };
    let mut compositor =
        Compositor::new(api, mesh, CompositorConfig::default()).map_err(|e| e.to_string())?;
    let (width, height) = window.drawable_size();
    compositor.resize(width, height);

    let running = Arc::new(AtomicBool::new(true));
    let capture = spawn_capture(compositor.frame_sink(), Arc::clone(&running));

    let mut limiter = FrameLimiter::new(&window);
    let result = loop {
        match window.poll_events() {
            WindowEvent::Quit => break Ok(()),
            WindowEvent::Resize(w, h) => compositor.resize(w, h),
            WindowEvent::None => {}
        }

        match compositor.render_frame() {
            Ok(stats) if stats.frame_index % 600 == 0 => {
                info!("{} frames rendered", stats.frame_index);
            }
            Ok(_) => {}
            Err(RenderError::Poisoned) => break Err(RenderError::Poisoned.to_string()),
            // Already logged by the compositor.
            Err(RenderError::Gpu { .. }) => {}
        }

        window.swap();
        limiter.wait_and_get_delta(&window);
    };

    running.store(false, Ordering::Relaxed);
    if capture.join().is_err() {
        error!("capture thread panicked");
    }
    result
}
