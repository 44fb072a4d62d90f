//! Error types for the renderer.

use std::fmt;
use thiserror::Error;

/// Parallel stages of one iteration, used to locate faults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    GenerateRays,
    Intersect,
    CaptureGBuffer,
    Shade,
    Compact,
    BounceLoop,
    Accumulate,
    Denoise,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::GenerateRays => "generate_rays",
            Stage::Intersect => "intersect",
            Stage::CaptureGBuffer => "capture_gbuffer",
            Stage::Shade => "shade",
            Stage::Compact => "compact",
            Stage::BounceLoop => "bounce_loop",
            Stage::Accumulate => "accumulate",
            Stage::Denoise => "denoise",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// A per-session buffer could not be allocated
    #[error("Failed to allocate {buffer} buffer ({count} elements)")]
    Allocation { buffer: &'static str, count: usize },

    /// Scene description is unusable
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// A parallel stage panicked; the iteration's contribution is lost
    #[error("Stage {stage} failed in iteration {iteration}: {message}")]
    StageFault {
        stage: Stage,
        iteration: u32,
        message: String,
    },

    /// Iterations must be rendered in order, starting at 1
    #[error("Expected iteration {expected}, got {got}")]
    IterationOutOfOrder { expected: u32, got: u32 },

    /// An earlier stage fault left the buffers in an undefined state
    #[error("Session is unusable after a fault in stage {0}")]
    Poisoned(Stage),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
