//! Conversion of the session's buffers into 8-bit RGBA images.

use common::{Color, GBufferPixel, Vector3};
use image::{ImageBuffer, Rgba, RgbaImage};

/// Depth is spread over the 8-bit range with this scale.
pub const DEPTH_SCALE: f32 = 256.0;
/// Positions within 10 units of the origin map onto the 8-bit range.
pub const POSITION_SCALE: f32 = 25.5;

/// Which G-buffer attribute to visualise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GBufferView {
    Depth,
    Normal,
    Position,
    Color,
}
impl GBufferView {
    pub const ALL: [GBufferView; 4] = [
        GBufferView::Depth,
        GBufferView::Normal,
        GBufferView::Position,
        GBufferView::Color,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GBufferView::Depth => "depth",
            GBufferView::Normal => "normal",
            GBufferView::Position => "position",
            GBufferView::Color => "color",
        }
    }
}

#[inline]
fn pixel_index(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

#[inline]
fn channel(value: f32) -> u8 {
    // NaN casts to 0.
    (value * 255.0).max(0.0).min(255.0) as u8
}

pub trait ColorExt {
    fn to_rgba(&self) -> Rgba<u8>;
}
impl ColorExt for Color {
    fn to_rgba(&self) -> Rgba<u8> {
        Rgba([channel(self.red), channel(self.green), channel(self.blue), 255])
    }
}
impl ColorExt for Vector3 {
    fn to_rgba(&self) -> Rgba<u8> {
        Color::from_vector(*self).to_rgba()
    }
}

/// Accumulated sums divided by the iteration count. Nothing rendered yet gives black.
pub fn image_to_rgba(image: &[Color], width: u32, height: u32, iterations: u32) -> RgbaImage {
    let scale = if iterations == 0 {
        0.0
    } else {
        1.0 / iterations as f32
    };
    ImageBuffer::from_fn(width, height, |x, y| {
        image[pixel_index(x, y, width)].mul_s(scale).to_rgba()
    })
}

pub fn gbuffer_to_rgba(
    gbuffer: &[GBufferPixel],
    width: u32,
    height: u32,
    view: GBufferView,
) -> RgbaImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let g = &gbuffer[pixel_index(x, y, width)];
        if g.t <= 0.0 {
            return Rgba([0, 0, 0, 255]);
        }
        match view {
            GBufferView::Depth => {
                let d = (g.t * DEPTH_SCALE).max(0.0).min(255.0) as u8;
                Rgba([d, d, d, 255])
            }
            GBufferView::Normal => g.normal.abs().to_rgba(),
            GBufferView::Position => g.position.abs().mul_s(POSITION_SCALE / 255.0).to_rgba(),
            GBufferView::Color => g.color.to_rgba(),
        }
    })
}
