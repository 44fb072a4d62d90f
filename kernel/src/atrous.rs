//! Edge-avoiding à-trous wavelet filter.
//!
//! Each pass applies a fixed 5x5 B3-spline kernel whose taps are spread `step` pixels
//! apart, with `step` doubling between passes. Taps are weighted down when their color,
//! normal or position differs from the centre pixel, which keeps edges sharp while flat
//! regions are blurred over a wide footprint.

use common::{Color, GBufferPixel};

pub const KERNEL_RADIUS: i64 = 2;
pub const KERNEL_WIDTH: usize = 5;

const B3: [f32; KERNEL_WIDTH] = [1.0 / 16.0, 1.0 / 4.0, 3.0 / 8.0, 1.0 / 4.0, 1.0 / 16.0];

/// Outer product of the B3-spline taps, row major. Sums to one.
#[rustfmt::skip]
pub const KERNEL: [f32; KERNEL_WIDTH * KERNEL_WIDTH] = [
    B3[0] * B3[0], B3[0] * B3[1], B3[0] * B3[2], B3[0] * B3[3], B3[0] * B3[4],
    B3[1] * B3[0], B3[1] * B3[1], B3[1] * B3[2], B3[1] * B3[3], B3[1] * B3[4],
    B3[2] * B3[0], B3[2] * B3[1], B3[2] * B3[2], B3[2] * B3[3], B3[2] * B3[4],
    B3[3] * B3[0], B3[3] * B3[1], B3[3] * B3[2], B3[3] * B3[3], B3[3] * B3[4],
    B3[4] * B3[0], B3[4] * B3[1], B3[4] * B3[2], B3[4] * B3[3], B3[4] * B3[4],
];

/// Bandwidths of the three edge-stopping functions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStopping {
    pub color_phi: f32,
    pub normal_phi: f32,
    pub position_phi: f32,
}

/// Number of passes needed for the stencil to cover `filter_size` pixels:
/// `ceil(log2(filter_size^2 / 25)) / 2`, never negative.
pub fn pass_count(filter_size: u32) -> u32 {
    let ratio = (filter_size as f32 * filter_size as f32) / 25.0;
    if ratio <= 1.0 {
        return 0;
    }
    (ratio.log2().ceil() as u32) / 2
}

/// Gaussian falloff `min(exp(-dist2 / phi^2), 1)`. A zero bandwidth only accepts exact
/// matches and an infinite one accepts everything; NaN distances get no weight.
#[inline]
pub fn edge_stop(dist2: f32, phi: f32) -> f32 {
    if phi.is_infinite() {
        return 1.0;
    }
    let phi2 = phi * phi;
    if phi2 == 0.0 {
        return if dist2 == 0.0 { 1.0 } else { 0.0 };
    }
    let w = (-dist2 / phi2).exp();
    if w.is_nan() {
        0.0
    } else {
        w.min(1.0)
    }
}

/// Filters one pixel for one pass. `input` holds accumulated sums, so colors are divided
/// by `iterations` before differencing. Taps outside the image are skipped and the rest
/// renormalised; a zero total weight returns the centre value unchanged.
#[allow(clippy::too_many_arguments)]
pub fn filter_pixel(
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    step: u32,
    input: &[Color],
    gbuffer: &[GBufferPixel],
    phis: &EdgeStopping,
    iterations: u32,
) -> Color {
    let center_index = y as usize * width as usize + x as usize;
    let center = input[center_index];
    let center_g = &gbuffer[center_index];
    let inv_iterations = 1.0 / iterations.max(1) as f32;
    let center_scaled = center.mul_s(inv_iterations);
    let step_sq = (step as f32) * (step as f32);

    let mut sum = Color::default();
    let mut weight_sum = 0.0f32;

    for ky in -KERNEL_RADIUS..=KERNEL_RADIUS {
        let sy = y as i64 + ky * step as i64;
        if sy < 0 || sy >= height as i64 {
            continue;
        }
        for kx in -KERNEL_RADIUS..=KERNEL_RADIUS {
            let sx = x as i64 + kx * step as i64;
            if sx < 0 || sx >= width as i64 {
                continue;
            }

            let tap_index = sy as usize * width as usize + sx as usize;
            let tap = input[tap_index];
            let tap_g = &gbuffer[tap_index];

            let color_dist2 = center_scaled.sub(tap.mul_s(inv_iterations)).norm();
            let color_w = edge_stop(color_dist2, phis.color_phi);

            let normal_dist2 = (center_g.normal.sub(tap_g.normal).norm() / step_sq).max(0.0);
            let normal_w = edge_stop(normal_dist2, phis.normal_phi);

            let position_dist2 = center_g.position.sub(tap_g.position).norm();
            let position_w = edge_stop(position_dist2, phis.position_phi);

            let kernel_index =
                (ky + KERNEL_RADIUS) as usize * KERNEL_WIDTH + (kx + KERNEL_RADIUS) as usize;
            let weight = color_w * normal_w * position_w * KERNEL[kernel_index];

            sum = sum.add(tap.mul_s(weight));
            weight_sum += weight;
        }
    }

    if weight_sum > 0.0 {
        sum.mul_s(1.0 / weight_sum)
    } else {
        center
    }
}
