use crate::buffer::DeviceBuffer;
use crate::config::DenoiseSettings;
use crate::error::Result;
use common::{Color, GBufferPixel, BLACK};
use kernel::atrous;
use rayon::prelude::*;

/// Ping-pong pair for the à-trous passes. Each pass reads `buffers[current]` and writes the
/// other buffer, then the roles swap.
pub struct Denoiser {
    width: u32,
    height: u32,
    buffers: [DeviceBuffer<Color>; 2],
    current: usize,
}

impl Denoiser {
    pub fn new(width: u32, height: u32) -> Result<Denoiser> {
        let size = width as usize * height as usize;
        Ok(Denoiser {
            width,
            height,
            buffers: [
                DeviceBuffer::new("denoise_ping", size, BLACK)?,
                DeviceBuffer::new("denoise_pong", size, BLACK)?,
            ],
            current: 0,
        })
    }

    /// Filters `input` (accumulated sums over `iterations`) into `output`, guided by the
    /// frozen G-buffer. Returns the number of passes run.
    pub fn run(
        &mut self,
        input: &[Color],
        gbuffer: &[GBufferPixel],
        settings: &DenoiseSettings,
        iterations: u32,
        output: &mut [Color],
    ) -> u32 {
        let passes = atrous::pass_count(settings.filter_size);
        let phis = settings.edge_stopping();
        let (width, height) = (self.width, self.height);

        self.current = 0;
        self.buffers[self.current].copy_from(input);

        let mut step = 1u32;
        for pass in 0..passes {
            let _span = tracing::trace_span!("atrous_pass", pass, step).entered();

            let (first, second) = self.buffers.split_at_mut(1);
            let (src, dst) = if self.current == 0 {
                (&first[0], &mut second[0])
            } else {
                (&second[0], &mut first[0])
            };

            dst[..].par_iter_mut().enumerate().for_each(|(i, out)| {
                let x = (i % width as usize) as u32;
                let y = (i / width as usize) as u32;
                *out = atrous::filter_pixel(
                    x, y, width, height, step, src, gbuffer, &phis, iterations,
                );
            });

            self.current ^= 1;
            step *= 2;
        }

        self.buffers[self.current].copy_to(output);
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_passes_copies_input() {
        let mut denoiser = Denoiser::new(3, 2).unwrap();
        let input: Vec<Color> = (0..6).map(|i| Color::new(i as f32, 1.0, 2.0)).collect();
        let gbuffer = vec![GBufferPixel::default(); 6];
        let settings = DenoiseSettings {
            enabled: true,
            filter_size: 5,
            ..DenoiseSettings::default()
        };
        let mut output = vec![BLACK; 6];
        let passes = denoiser.run(&input, &gbuffer, &settings, 1, &mut output);
        assert_eq!(passes, 0);
        assert_eq!(output, input);
    }

    #[test]
    fn test_passes_alternate_buffers() {
        let mut denoiser = Denoiser::new(16, 16).unwrap();
        let input: Vec<Color> = (0..256)
            .map(|i| if i % 2 == 0 { Color::new(1.0, 1.0, 1.0) } else { BLACK })
            .collect();
        let gbuffer = vec![GBufferPixel::default(); 256];
        let settings = DenoiseSettings {
            enabled: true,
            filter_size: 20,
            color_phi: f32::INFINITY,
            normal_phi: f32::INFINITY,
            position_phi: f32::INFINITY,
        };
        let mut output = vec![BLACK; 256];
        let passes = denoiser.run(&input, &gbuffer, &settings, 1, &mut output);
        assert_eq!(passes, 2);
        assert_eq!(denoiser.current, 0);
        // Smoothing vertical stripes pulls every pixel towards the mean.
        for c in &output {
            assert!(c.red > 0.0 && c.red < 1.0);
        }
    }
}
