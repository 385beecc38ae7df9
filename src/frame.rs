//! Camera frames and the single-slot mailbox between capture and render.
//!
//! A capture thread turns each raw buffer into an upright [`Frame`] and
//! hands it to a [`FrameSink`]. The render thread takes whatever is pending
//! once per frame. Writers never wait for the reader: a new frame replaces
//! the pending one and the replaced frame is dropped.

use std::sync::Arc;

use image::{imageops, DynamicImage, GrayImage, RgbImage, RgbaImage};
use log::trace;
use parking_lot::Mutex;
use thiserror::Error;

/// Pixel layout of a raw camera buffer. Rows are tightly packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
    Rgb8,
    /// Single luminance channel, e.g. the Y plane of a YUV frame.
    Luma8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Luma8 => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("pixel buffer holds {actual} bytes, {expected} expected")]
    BufferSize { expected: usize, actual: usize },

    #[error("rotation of {0} degrees is not a multiple of 90")]
    UnsupportedRotation(i32),
}

/// A frame as delivered by the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
    /// Clockwise rotation that makes the image upright.
    pub rotation_degrees: i32,
}

impl CameraFrame {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
        rotation_degrees: i32,
    ) -> Self {
        Self {
            width,
            height,
            format,
            pixels,
            rotation_degrees,
        }
    }

    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// An upright RGBA8 image ready for texture upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbaImage,
}

impl Frame {
    pub fn from_camera(camera: CameraFrame) -> Result<Self, FrameError> {
        let expected = camera.expected_len();
        if camera.pixels.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: camera.pixels.len(),
            });
        }
        let rotation = camera.rotation_degrees.rem_euclid(360);
        if rotation % 90 != 0 {
            return Err(FrameError::UnsupportedRotation(camera.rotation_degrees));
        }

        let CameraFrame {
            width,
            height,
            format,
            mut pixels,
            ..
        } = camera;
        // `from_raw` only fails on a length mismatch, already ruled out above.
        let size_error = FrameError::BufferSize {
            expected,
            actual: pixels.len(),
        };
        let rgba = match format {
            PixelFormat::Rgba8 => RgbaImage::from_raw(width, height, pixels),
            PixelFormat::Bgra8 => {
                for px in pixels.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
                RgbaImage::from_raw(width, height, pixels)
            }
            PixelFormat::Rgb8 => RgbImage::from_raw(width, height, pixels)
                .map(|img| DynamicImage::ImageRgb8(img).to_rgba8()),
            PixelFormat::Luma8 => GrayImage::from_raw(width, height, pixels)
                .map(|img| DynamicImage::ImageLuma8(img).to_rgba8()),
        }
        .ok_or(size_error)?;

        let image = match rotation {
            90 => imageops::rotate90(&rgba),
            180 => imageops::rotate180(&rgba),
            270 => imageops::rotate270(&rgba),
            _ => rgba,
        };
        Ok(Self { image })
    }

    /// Wraps an image that is already upright.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Tightly packed RGBA rows, top row first.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Holds at most one pending frame.
#[derive(Debug, Default)]
pub struct FrameSlot {
    pending: Mutex<Option<Frame>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame`, returning `true` if it replaced one that was never taken.
    pub fn put(&self, frame: Frame) -> bool {
        let displaced = self.pending.lock().replace(frame);
        // Dropped here, outside the lock.
        let replaced = displaced.is_some();
        if replaced {
            trace!("dropped unconsumed camera frame");
        }
        replaced
    }

    pub fn take(&self) -> Option<Frame> {
        self.pending.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

/// Cloneable, thread-safe handle for delivering frames to a
/// [`Compositor`](crate::compositor::Compositor).
#[derive(Debug, Clone, Default)]
pub struct FrameSink {
    slot: Arc<FrameSlot>,
}

impl FrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts `camera` to an upright frame and makes it the pending one.
    pub fn set_frame(&self, camera: CameraFrame) -> Result<(), FrameError> {
        let frame = Frame::from_camera(camera)?;
        self.slot.put(frame);
        Ok(())
    }

    pub fn slot(&self) -> &FrameSlot {
        &self.slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn solid(width: u32, height: u32, value: u8) -> Frame {
        Frame::from_camera(CameraFrame::new(
            width,
            height,
            PixelFormat::Luma8,
            vec![value; (width * height) as usize],
            0,
        ))
        .unwrap()
    }

    #[test]
    fn wrong_buffer_size_is_rejected() {
        let camera = CameraFrame::new(4, 4, PixelFormat::Rgb8, vec![0; 47], 0);
        assert_eq!(
            Frame::from_camera(camera),
            Err(FrameError::BufferSize {
                expected: 48,
                actual: 47
            })
        );
    }

    #[test]
    fn odd_rotation_is_rejected() {
        let camera = CameraFrame::new(1, 1, PixelFormat::Rgba8, vec![0; 4], 45);
        assert_eq!(
            Frame::from_camera(camera),
            Err(FrameError::UnsupportedRotation(45))
        );
    }

    #[test]
    fn bgra_is_swizzled() {
        let camera = CameraFrame::new(1, 1, PixelFormat::Bgra8, vec![10, 20, 30, 40], 0);
        let frame = Frame::from_camera(camera).unwrap();
        assert_eq!(frame.as_bytes(), &[30, 20, 10, 40]);
    }

    #[test]
    fn rgb_gains_opaque_alpha() {
        let camera = CameraFrame::new(1, 1, PixelFormat::Rgb8, vec![1, 2, 3], 0);
        let frame = Frame::from_camera(camera).unwrap();
        assert_eq!(frame.as_bytes(), &[1, 2, 3, 255]);
    }

    #[test]
    fn quarter_turn_swaps_dimensions_and_moves_clockwise() {
        // 2x1 image: [A B] becomes a 1x2 column with A on top.
        let pixels = vec![1, 1, 1, 255, 2, 2, 2, 255];
        let camera = CameraFrame::new(2, 1, PixelFormat::Rgba8, pixels, 90);
        let frame = Frame::from_camera(camera).unwrap();
        assert_eq!((frame.width(), frame.height()), (1, 2));
        assert_eq!(frame.image().get_pixel(0, 0).0, [1, 1, 1, 255]);
        assert_eq!(frame.image().get_pixel(0, 1).0, [2, 2, 2, 255]);
    }

    #[test]
    fn negative_rotation_is_normalized() {
        let pixels = vec![1, 1, 1, 255, 2, 2, 2, 255];
        let ccw = Frame::from_camera(CameraFrame::new(2, 1, PixelFormat::Rgba8, pixels.clone(), -90))
            .unwrap();
        let cw = Frame::from_camera(CameraFrame::new(2, 1, PixelFormat::Rgba8, pixels, 270))
            .unwrap();
        assert_eq!(ccw, cw);
        assert_eq!(ccw.image().get_pixel(0, 0).0, [2, 2, 2, 255]);
    }

    #[test]
    fn second_frame_replaces_first() {
        let slot = FrameSlot::new();
        assert!(!slot.put(solid(1, 1, 10)));
        assert!(slot.put(solid(1, 1, 20)));
        assert!(slot.is_pending());

        let frame = slot.take().unwrap();
        assert_eq!(frame.as_bytes()[0], 20);
        assert!(slot.take().is_none());
        assert!(!slot.is_pending());
    }

    #[test]
    fn sink_delivers_across_threads() {
        let sink = FrameSink::new();
        let producer = sink.clone();
        thread::spawn(move || {
            for value in 0..8u8 {
                producer
                    .set_frame(CameraFrame::new(1, 1, PixelFormat::Luma8, vec![value], 0))
                    .unwrap();
            }
        })
        .join()
        .unwrap();

        let frame = sink.slot().take().unwrap();
        assert_eq!(frame.as_bytes(), &[7, 7, 7, 255]);
    }
}
