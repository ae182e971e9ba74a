//! sdfgen turns raster masks into signed distance fields.
//!
//! Each selected channel of a source image is thresholded into inside/outside, and the distance
//! from every pixel to the nearest inside/outside boundary is estimated with a jump-flood sweep:
//! one edge-detection pass followed by propagation passes at halving spreads, then a final pass
//! that encodes the signed distance into `[0, 1]` (0.5 on the boundary, larger inside).
//!
//! # Pipeline overview
//!
//! 1. **Select**: [`ChannelMode`] picks the channels, highest index first.
//! 2. **Solve**: [`solve_channel`] runs the passes for one channel on an [`SdfBackend`].
//! 3. **Composite**: [`composite_channels`] merges per-channel results into one buffer.
//! 4. **Resample + read back**: [`generate`] resizes if asked and returns a caller-owned [`Image`].
//!
//! Backends own all intermediate buffers. [`CpuBackend`] is a per-pixel reference backend that
//! needs no GPU.
#![forbid(unsafe_code)]

mod assets;
mod channel;
mod config;
mod foundation;
mod render;
mod solve;

pub use assets::decode::{decode_image, encode_png, load_image, save_png, sdf_output_path};
pub use channel::mode::ChannelMode;
pub use config::settings::GeneratorSettings;
pub use foundation::core::{ColorSpace, Image};
pub use foundation::error::{SdfError, SdfResult};
pub use render::backend::{
    BackendKind, BufferDesc, BufferHandle, FilterMode, PassInput, PassKind, PassUniforms,
    PixelFormat, RenderProgram, SdfBackend, create_backend,
};
pub use render::cpu::{CpuBackend, CpuBackendOpts, CpuBackendStats};
pub use solve::composite::composite_channels;
pub use solve::flood::{EDGE_SPREAD, propagation_spreads, solve_channel};
pub use solve::generate::{GenerateOpts, generate};
