use atrous_tracer::denoise::Denoiser;
use atrous_tracer::DenoiseSettings;
use common::{Color, GBufferPixel, Vector3};
use kernel::atrous::{pass_count, KERNEL};

const WIDTH: u32 = 7;
const HEIGHT: u32 = 6;

fn noisy_image() -> Vec<Color> {
    (0..WIDTH * HEIGHT)
        .map(|i| {
            let h = kernel::hash(i);
            Color::new(
                (h & 0xff) as f32 / 255.0,
                ((h >> 8) & 0xff) as f32 / 255.0,
                ((h >> 16) & 0xff) as f32 / 255.0,
            )
        })
        .collect()
}

fn flat_gbuffer() -> Vec<GBufferPixel> {
    vec![
        GBufferPixel {
            t: 1.0,
            color: Color::new(0.5, 0.5, 0.5),
            normal: Vector3::new(0.0, 0.0, 1.0),
            position: Vector3::new(0.0, 0.0, -1.0),
        };
        (WIDTH * HEIGHT) as usize
    ]
}

fn settings(filter_size: u32, phi: f32) -> DenoiseSettings {
    DenoiseSettings {
        enabled: true,
        filter_size,
        color_phi: phi,
        normal_phi: phi,
        position_phi: phi,
    }
}

/// Plain B3 kernel average, renormalised over the taps that land inside the image.
fn kernel_average(image: &[Color], x: i64, y: i64) -> Color {
    let mut sum = Color::default();
    let mut weight = 0.0;
    for ky in -2..=2i64 {
        for kx in -2..=2i64 {
            let (sx, sy) = (x + kx, y + ky);
            if sx < 0 || sy < 0 || sx >= WIDTH as i64 || sy >= HEIGHT as i64 {
                continue;
            }
            let w = KERNEL[((ky + 2) * 5 + kx + 2) as usize];
            sum = sum.add(image[(sy * WIDTH as i64 + sx) as usize].mul_s(w));
            weight += w;
        }
    }
    sum.mul_s(1.0 / weight)
}

fn close(a: Color, b: Color) -> bool {
    a.sub(b).norm() < 1e-8
}

#[test]
fn wide_bandwidths_give_the_kernel_average() {
    let image = noisy_image();
    let gbuffer = flat_gbuffer();
    let mut output = vec![Color::default(); image.len()];

    let mut denoiser = Denoiser::new(WIDTH, HEIGHT).unwrap();
    let passes = denoiser.run(&image, &gbuffer, &settings(10, 1.0e6), 1, &mut output);
    assert_eq!(passes, 1);

    for y in 0..HEIGHT as i64 {
        for x in 0..WIDTH as i64 {
            let expected = kernel_average(&image, x, y);
            let got = output[(y * WIDTH as i64 + x) as usize];
            assert!(close(got, expected), "pixel ({}, {}): {:?} vs {:?}", x, y, got, expected);
        }
    }
}

#[test]
fn narrow_bandwidths_keep_the_input() {
    let image = noisy_image();
    let gbuffer = flat_gbuffer();
    let mut output = vec![Color::default(); image.len()];
    let mut denoiser = Denoiser::new(WIDTH, HEIGHT).unwrap();

    for phi in [0.0, 1.0e-6] {
        let s = DenoiseSettings {
            color_phi: phi,
            ..settings(80, 1.0)
        };
        let passes = denoiser.run(&image, &gbuffer, &s, 1, &mut output);
        assert_eq!(passes, 4);
        for (got, expected) in output.iter().zip(image.iter()) {
            assert!(close(*got, *expected), "{:?} vs {:?}", got, expected);
        }
    }
}

#[test]
fn normals_stop_blur_across_edges() {
    let mut image = vec![Color::default(); (WIDTH * HEIGHT) as usize];
    let mut gbuffer = flat_gbuffer();
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let i = (y * WIDTH + x) as usize;
            if x < 3 {
                image[i] = Color::new(1.0, 1.0, 1.0);
                gbuffer[i].normal = Vector3::new(1.0, 0.0, 0.0);
            }
        }
    }

    let s = DenoiseSettings {
        color_phi: f32::INFINITY,
        position_phi: f32::INFINITY,
        normal_phi: 0.01,
        ..settings(20, 1.0)
    };
    let mut output = vec![Color::default(); image.len()];
    let mut denoiser = Denoiser::new(WIDTH, HEIGHT).unwrap();
    denoiser.run(&image, &gbuffer, &s, 1, &mut output);

    for (i, c) in output.iter().enumerate() {
        let expected = if (i as u32 % WIDTH) < 3 { 1.0 } else { 0.0 };
        assert!((c.red - expected).abs() < 1e-5, "pixel {} = {:?}", i, c);
    }
}

#[test]
fn color_weights_scale_with_iterations() {
    // The same noise summed over more iterations is a smaller per-iteration difference,
    // so the filter smooths it more.
    let image: Vec<Color> = noisy_image().iter().map(|c| c.mul_s(8.0)).collect();
    let gbuffer = flat_gbuffer();
    let s = DenoiseSettings {
        color_phi: 0.5,
        ..settings(10, f32::INFINITY)
    };
    let mut denoiser = Denoiser::new(WIDTH, HEIGHT).unwrap();

    let mut few = vec![Color::default(); image.len()];
    let mut many = vec![Color::default(); image.len()];
    denoiser.run(&image, &gbuffer, &s, 1, &mut few);
    denoiser.run(&image, &gbuffer, &s, 64, &mut many);

    let deviation = |out: &[Color]| -> f32 {
        out.iter()
            .zip(image.iter())
            .map(|(o, i)| o.sub(*i).norm())
            .sum()
    };
    assert!(deviation(&many[..]) > deviation(&few[..]));
}

#[test]
fn pass_count_never_shrinks() {
    let mut last = pass_count(0);
    for size in 1..512 {
        let passes = pass_count(size);
        assert!(passes >= last);
        last = passes;
    }
}
