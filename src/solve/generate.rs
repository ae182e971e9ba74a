use crate::channel::mode::ChannelMode;
use crate::foundation::core::Image;
use crate::foundation::error::{SdfError, SdfResult};
use crate::render::backend::{BufferDesc, RenderProgram, SdfBackend};
use crate::render::scope::BufferScope;
use crate::solve::composite::composite_channels;
use crate::solve::resample::resample;

/// Output size overrides for [`generate`]. `None` keeps the source dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenerateOpts {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl GenerateOpts {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    fn resolve(self, source: &Image) -> SdfResult<(u32, u32)> {
        let w = self.width.unwrap_or(source.width);
        let h = self.height.unwrap_or(source.height);
        if w == 0 || h == 0 {
            return Err(SdfError::validation(format!(
                "target size must be non-zero, got {w}x{h}"
            )));
        }
        Ok((w, h))
    }
}

impl From<(u32, u32)> for GenerateOpts {
    fn from((width, height): (u32, u32)) -> Self {
        Self::with_size(width, height)
    }
}

impl From<Option<(u32, u32)>> for GenerateOpts {
    fn from(size: Option<(u32, u32)>) -> Self {
        size.map(Self::from).unwrap_or_default()
    }
}

/// Generate a distance field from `source`.
///
/// Each channel selected by `mode` is solved independently and written to the same channel of the
/// output; unselected channels are zero. The result is resized to the size in `opts` and read back
/// into an image owned by the caller. Backend buffers acquired along the way are released before
/// this returns, including when it fails.
#[tracing::instrument(
    skip(backend, source, program, opts),
    fields(w = source.width, h = source.height)
)]
pub fn generate<B: SdfBackend + ?Sized>(
    backend: &mut B,
    source: &Image,
    program: &RenderProgram,
    mode: ChannelMode,
    opts: impl Into<GenerateOpts>,
) -> SdfResult<Image> {
    let opts = opts.into();
    let channels = mode.channels_to_solve()?;
    source.validate()?;
    program.validate()?;
    let target = opts.resolve(source)?;

    if mode.touches_color() && source.color_space.is_srgb() {
        tracing::warn!(
            "color channels are generated from an sRGB source; consider loading it as linear"
        );
    }

    let full = BufferDesc::result(source.width, source.height, source.color_space);
    BufferScope::run(backend, |backend, scope| {
        let composed = scope.adopt(composite_channels(backend, program, source, &channels)?);
        let out = resample(backend, scope, composed, &full, target)?;
        let image = backend.read_back(out)?;
        tracing::debug!(w = image.width, h = image.height, "generated");
        Ok(image)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/solve/generate.rs"]
mod tests;
