//! Interactive Monte Carlo path tracer with an edge-avoiding à-trous denoiser.
//!
//! A [`RenderSession`] owns the per-pixel buffers; each call to
//! [`RenderSession::render_iteration`] traces one path per pixel, adds it to the running
//! image and, on request, filters the result using the first-bounce G-buffer.

pub mod buffer;
pub mod config;
pub mod denoise;
pub mod error;
pub mod present;
pub mod session;

pub use config::{DenoiseSettings, RenderSettings, Scene};
pub use error::{Error, Result, Stage};
pub use present::GBufferView;
pub use session::RenderSession;
