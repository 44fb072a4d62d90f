use crate::buffer::DeviceBuffer;
use crate::config::{DenoiseSettings, RenderSettings, Scene};
use crate::denoise::Denoiser;
use crate::error::{Error, Result, Stage};
use crate::present::{self, GBufferView};
use common::{
    Camera, Color, GBufferPixel, Geom, Intersection, Material, PathSegment, BLACK,
};
use image::RgbaImage;
use kernel::Rng;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Runs one parallel stage to completion. The return of the rayon iterator inside `f` is
/// the barrier; a panic in any worker is reported as a fault of `stage`.
pub(crate) fn run_stage<F: FnOnce()>(stage: Stage, iteration: u32, f: F) -> Result<()> {
    let _span = tracing::debug_span!("stage", %stage).entered();
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::error!(%stage, iteration, %message, "stage failed");
        Error::StageFault {
            stage,
            iteration,
            message,
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Moves unterminated paths to the front of `paths` and returns how many there are.
fn partition_active(paths: &mut [PathSegment]) -> usize {
    let mut active = 0;
    for i in 0..paths.len() {
        if !paths[i].is_terminated() {
            paths.swap(active, i);
            active += 1;
        }
    }
    active
}

/// Owns every per-frame buffer of the path tracer for the lifetime of one render.
pub struct RenderSession {
    camera: Camera,
    geoms: Vec<Geom>,
    materials: Vec<Material>,
    settings: RenderSettings,

    paths: DeviceBuffer<PathSegment>,
    intersections: DeviceBuffer<Intersection>,
    gbuffer: DeviceBuffer<GBufferPixel>,
    image: DeviceBuffer<Color>,
    denoised: DeviceBuffer<Color>,
    denoiser: Denoiser,

    iterations: u32,
    denoised_iteration: Option<u32>,
    fault: Option<Stage>,
}

impl RenderSession {
    /// Validates the scene and allocates the buffer pool.
    pub fn init(scene: Scene) -> Result<RenderSession> {
        scene.validate()?;
        let Scene {
            camera,
            materials,
            geoms,
            settings,
        } = scene;

        let pixel_count = camera.pixel_count();
        let session = RenderSession {
            paths: DeviceBuffer::new("paths", pixel_count, PathSegment::default())?,
            intersections: DeviceBuffer::new("intersections", pixel_count, Intersection::MISS)?,
            gbuffer: DeviceBuffer::new("gbuffer", pixel_count, GBufferPixel::default())?,
            image: DeviceBuffer::new("image", pixel_count, BLACK)?,
            denoised: DeviceBuffer::new("denoised", pixel_count, BLACK)?,
            denoiser: Denoiser::new(camera.width, camera.height)?,
            camera,
            geoms,
            materials,
            settings,
            iterations: 0,
            denoised_iteration: None,
            fault: None,
        };

        tracing::info!(
            width = session.camera.width,
            height = session.camera.height,
            geoms = session.geoms.len(),
            materials = session.materials.len(),
            trace_depth = session.settings.trace_depth,
            "render session initialised"
        );
        Ok(session)
    }

    /// Releases the buffer pool.
    pub fn teardown(self) {
        tracing::info!(iterations = self.iterations, "render session released");
    }

    /// Clears the accumulated image so rendering can restart at iteration 1.
    pub fn reset(&mut self) {
        self.image.fill(BLACK);
        self.denoised.fill(BLACK);
        self.iterations = 0;
        self.denoised_iteration = None;
        self.fault = None;
    }

    /// Traces one path per pixel and adds the result to the accumulated image, then
    /// optionally denoises. `iteration` counts from 1 and must follow the previous call.
    pub fn render_iteration(
        &mut self,
        frame: u32,
        iteration: u32,
        denoise: &DenoiseSettings,
    ) -> Result<()> {
        if let Some(stage) = self.fault {
            return Err(Error::Poisoned(stage));
        }
        let expected = self.iterations + 1;
        if iteration != expected {
            return Err(Error::IterationOutOfOrder {
                expected,
                got: iteration,
            });
        }

        let _span = tracing::debug_span!("render_iteration", frame, iteration).entered();
        let start = Instant::now();

        if let Err(e) = self.trace(iteration) {
            if let Error::StageFault { stage, .. } = &e {
                self.fault = Some(*stage);
            }
            return Err(e);
        }
        self.iterations = iteration;
        self.denoised_iteration = None;

        if denoise.enabled {
            let passes = self.denoise(denoise)?;
            tracing::debug!(passes, "denoised");
        }

        tracing::debug!(elapsed = ?start.elapsed(), "iteration complete");
        Ok(())
    }

    fn trace(&mut self, iteration: u32) -> Result<()> {
        let camera = &self.camera;
        let geoms = &self.geoms[..];
        let materials = &self.materials[..];
        let trace_depth = self.settings.trace_depth;
        let jitter = self.settings.jitter;

        run_stage(Stage::GenerateRays, iteration, || {
            self.paths[..].par_iter_mut().enumerate().for_each(|(i, path)| {
                let mut rng = if jitter {
                    Some(Rng::for_path(iteration, i, trace_depth))
                } else {
                    None
                };
                *path = kernel::generate_ray(camera, i, trace_depth, rng.as_mut());
            })
        })?;

        let mut active = self.paths.len();
        for depth in 0..trace_depth {
            let paths = &mut self.paths[..active];
            let intersections = &mut self.intersections[..active];

            run_stage(Stage::Intersect, iteration, || {
                intersections
                    .par_iter_mut()
                    .zip(paths.par_iter())
                    .for_each(|(intersection, path)| {
                        *intersection = if path.is_terminated() {
                            Intersection::MISS
                        } else {
                            kernel::intersect_scene(&path.ray, geoms)
                        };
                    })
            })?;

            if depth == 0 {
                // Nothing has been compacted yet, so slot i still belongs to pixel i.
                let gbuffer = &mut self.gbuffer[..];
                run_stage(Stage::CaptureGBuffer, iteration, || {
                    gbuffer
                        .par_iter_mut()
                        .zip(paths.par_iter().zip(intersections.par_iter()))
                        .for_each(|(g, (path, intersection))| {
                            *g = kernel::capture_gbuffer(path, intersection, materials);
                        })
                })?;
            }

            run_stage(Stage::Shade, iteration, || {
                paths
                    .par_iter_mut()
                    .zip(intersections.par_iter())
                    .for_each(|(path, intersection)| {
                        kernel::shade_path(path, intersection, materials, iteration);
                    })
            })?;

            if self.settings.compact_paths {
                run_stage(Stage::Compact, iteration, || {
                    active = partition_active(paths);
                })?;
                tracing::trace!(depth, active, "compacted paths");
            }
        }

        if self.settings.compact_paths {
            run_stage(Stage::Compact, iteration, || {
                self.paths[..].par_sort_unstable_by_key(|p| p.pixel_index);
            })?;
        }

        if let Some(path) = self.paths[..].par_iter().find_any(|p| !p.is_terminated()) {
            return Err(Error::StageFault {
                stage: Stage::BounceLoop,
                iteration,
                message: format!(
                    "path for pixel {} left the bounce loop with {} bounces remaining",
                    path.pixel_index, path.remaining_bounces
                ),
            });
        }

        let paths = &self.paths[..];
        let image = &mut self.image[..];
        run_stage(Stage::Accumulate, iteration, || {
            image
                .par_iter_mut()
                .zip(paths.par_iter())
                .for_each(|(pixel, path)| kernel::accumulate(pixel, path))
        })
    }

    fn denoise(&mut self, settings: &DenoiseSettings) -> Result<u32> {
        let mut passes = 0;
        let iteration = self.iterations;
        let denoiser = &mut self.denoiser;
        let image = &self.image[..];
        let gbuffer = &self.gbuffer[..];
        let denoised = &mut self.denoised[..];

        let result = run_stage(Stage::Denoise, iteration, || {
            passes = denoiser.run(image, gbuffer, settings, iteration, denoised);
        });
        if let Err(e) = result {
            self.fault = Some(Stage::Denoise);
            return Err(e);
        }
        if passes == 0 {
            tracing::warn!(
                filter_size = settings.filter_size,
                "filter size too small for any à-trous pass"
            );
        }
        self.denoised_iteration = Some(iteration);
        Ok(passes)
    }

    /// Accumulated image averaged over the iterations so far.
    pub fn show_image(&self) -> RgbaImage {
        present::image_to_rgba(
            &self.image,
            self.camera.width,
            self.camera.height,
            self.iterations,
        )
    }

    /// Denoised image for the latest iteration, or the plain average when that iteration
    /// was not denoised.
    pub fn show_denoised(&self) -> RgbaImage {
        let source = if self.denoised_iteration == Some(self.iterations) {
            &self.denoised[..]
        } else {
            &self.image[..]
        };
        present::image_to_rgba(
            source,
            self.camera.width,
            self.camera.height,
            self.iterations,
        )
    }

    pub fn show_gbuffer(&self, view: GBufferView) -> RgbaImage {
        present::gbuffer_to_rgba(&self.gbuffer, self.camera.width, self.camera.height, view)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn denoised_iteration(&self) -> Option<u32> {
        self.denoised_iteration
    }

    pub fn paths(&self) -> &[PathSegment] {
        &self.paths
    }

    pub fn gbuffer(&self) -> &[GBufferPixel] {
        &self.gbuffer
    }

    /// Running sum of every iteration's radiance, not yet divided.
    pub fn accumulation(&self) -> &[Color] {
        &self.image
    }

    pub fn denoised(&self) -> &[Color] {
        &self.denoised
    }
}
