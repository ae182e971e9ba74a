use crate::foundation::core::{ColorSpace, Image};
use crate::foundation::error::{SdfError, SdfResult};

/// Opaque handle to a backend-owned 2D render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

/// Storage format of a backend buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Four 16-bit normalized channels. Used for jump-flood scratch targets.
    Rgba16Unorm,
    /// Four 8-bit normalized channels. Used for distance results.
    Rgba8Unorm,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba16Unorm => 8,
            Self::Rgba8Unorm => 4,
        }
    }

    /// Largest integer a single channel stores exactly.
    pub fn max_value(self) -> f32 {
        match self {
            Self::Rgba16Unorm => 65535.0,
            Self::Rgba8Unorm => 255.0,
        }
    }
}

/// How a buffer is sampled when it is the source of a resampling blit.
///
/// Pass reads are always nearest-neighbor with clamped addressing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Point,
    Bilinear,
}

/// Allocation request for a backend buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub color_space: ColorSpace,
    pub filter: FilterMode,
}

impl BufferDesc {
    /// Ping/pong target for the flood passes: linear, point-filtered.
    pub fn scratch(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba16Unorm,
            color_space: ColorSpace::Linear,
            filter: FilterMode::Point,
        }
    }

    /// Per-channel distance result carrying the source's color space.
    pub fn result(width: u32, height: u32, color_space: ColorSpace) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8Unorm,
            color_space,
            filter: FilterMode::Point,
        }
    }

    /// Destination of a resize blit.
    pub fn resized(width: u32, height: u32, color_space: ColorSpace) -> Self {
        Self {
            filter: FilterMode::Bilinear,
            ..Self::result(width, height, color_space)
        }
    }

    pub fn byte_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.format.bytes_per_pixel())
    }
}

/// Program variants a distance-field program can expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Edge detection (with `first_pass`) and nearest-edge propagation.
    Flood,
    /// Converts nearest-edge data plus the source into a normalized distance.
    Final,
}

/// Description of the program a backend executes for each pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderProgram {
    /// Name used in diagnostics.
    pub label: String,
    /// Variants this program provides.
    pub passes: Vec<PassKind>,
    /// Half-width of the encoded distance range, as a fraction of the larger image side.
    pub feather: f32,
    /// Channel value at or above which a pixel counts as inside.
    pub threshold: f32,
}

impl RenderProgram {
    /// Upper bound applied by [`RenderProgram::from_gradient_px`].
    pub const MAX_FEATHER: f32 = 0.25;

    /// The standard jump-flood program with both variants.
    pub fn jump_flood(feather: f32) -> Self {
        Self {
            label: "jump_flood".to_string(),
            passes: vec![PassKind::Flood, PassKind::Final],
            feather,
            threshold: 0.5,
        }
    }

    /// Build a program whose gradient spans `gradient_px` pixels of a `width`x`height` source.
    pub fn from_gradient_px(gradient_px: f32, width: u32, height: u32) -> Self {
        let side = width.max(height).max(1) as f32;
        Self::jump_flood((gradient_px / side).min(Self::MAX_FEATHER))
    }

    pub fn has_pass(&self, kind: PassKind) -> bool {
        self.passes.contains(&kind)
    }

    pub fn validate(&self) -> SdfResult<()> {
        for kind in [PassKind::Flood, PassKind::Final] {
            if !self.has_pass(kind) {
                return Err(SdfError::validation(format!(
                    "program '{}' is missing the {kind:?} pass",
                    self.label
                )));
            }
        }
        if !self.feather.is_finite() || self.feather <= 0.0 {
            return Err(SdfError::validation("program feather must be finite and > 0"));
        }
        if !self.threshold.is_finite() {
            return Err(SdfError::validation("program threshold must be finite"));
        }
        Ok(())
    }
}

/// Per-pass uniform values.
#[derive(Clone, Copy, Debug)]
pub struct PassUniforms<'a> {
    /// Pixel offset between sampled neighbors.
    pub spread: f32,
    /// Channel treated as the mask, and the output channel of the final pass.
    pub channel: usize,
    /// Edge detection instead of propagation.
    pub first_pass: bool,
    /// Source image, sampled by the final pass.
    pub source: Option<&'a Image>,
}

/// What a pass reads from.
#[derive(Clone, Copy, Debug)]
pub enum PassInput<'a> {
    Image(&'a Image),
    Buffer(BufferHandle),
}

/// The rendering capability the generator needs.
///
/// Every call is synchronous: a pass has finished writing when `run_pass` returns.
pub trait SdfBackend {
    /// Allocate a buffer. Its contents are unspecified until written.
    fn allocate_buffer(&mut self, desc: &BufferDesc) -> SdfResult<BufferHandle>;

    /// Return a buffer to the backend.
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Execute one full-image pass of `program`, writing every texel of `write`.
    fn run_pass(
        &mut self,
        program: &RenderProgram,
        pass: PassKind,
        uniforms: &PassUniforms<'_>,
        read: PassInput<'_>,
        write: BufferHandle,
    ) -> SdfResult<()>;

    /// Resample `src` into `dst` using `dst`'s filter mode.
    fn blit(&mut self, src: BufferHandle, dst: BufferHandle) -> SdfResult<()>;

    /// Overwrite channel `channel` of every `dst` texel with the same channel of `src`.
    fn merge_channel(&mut self, src: BufferHandle, dst: BufferHandle, channel: usize)
    -> SdfResult<()>;

    /// Copy a buffer into a CPU image tagged with the buffer's color space.
    fn read_back(&mut self, buffer: BufferHandle) -> SdfResult<Image>;
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, Default)]
pub enum BackendKind {
    /// Per-pixel reference implementation.
    #[default]
    Cpu,
}

/// Create a backend implementation.
pub fn create_backend(
    kind: BackendKind,
    opts: crate::render::cpu::CpuBackendOpts,
) -> Box<dyn SdfBackend + Send> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuBackend::new(opts)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
