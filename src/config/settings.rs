use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::channel::mode::ChannelMode;
use crate::foundation::core::{ColorSpace, Image};
use crate::foundation::error::{SdfError, SdfResult};
use crate::render::backend::RenderProgram;
use crate::solve::generate::GenerateOpts;

/// Persistent generator configuration.
///
/// Missing fields take their defaults, so `{}` is a valid settings document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    /// Channels to solve.
    pub mode: ChannelMode,
    /// Width of the distance gradient on each side of an edge, in source pixels.
    pub gradient_size_px: f32,
    /// Channel value at or above which a pixel counts as inside.
    pub threshold: f32,
    /// How source pixels are interpreted and how the result is tagged.
    pub source_color_space: ColorSpace,
    /// Output width; defaults to the source width.
    pub width: Option<u32>,
    /// Output height; defaults to the source height.
    pub height: Option<u32>,
    /// Images generated as one batch, each written to `<stem>.sdf.png` beside it.
    pub targets: Vec<PathBuf>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            mode: ChannelMode::A,
            gradient_size_px: 20.0,
            threshold: 0.5,
            source_color_space: ColorSpace::Srgb,
            width: None,
            height: None,
            targets: Vec::new(),
        }
    }
}

impl GeneratorSettings {
    pub fn from_json_str(s: &str) -> SdfResult<Self> {
        let settings: Self =
            serde_json::from_str(s).map_err(|e| SdfError::serde(format!("settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a settings file. Relative `targets` resolve against the file's directory.
    pub fn from_path(path: &Path) -> SdfResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        let mut settings = Self::from_json_str(&s)?;
        if let Some(dir) = path.parent() {
            for target in &mut settings.targets {
                *target = dir.join(&*target);
            }
        }
        Ok(settings)
    }

    pub fn to_json_pretty(&self) -> SdfResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SdfError::serde(e.to_string()))
    }

    pub fn validate(&self) -> SdfResult<()> {
        if self.mode.is_empty() {
            return Err(SdfError::InvalidMode);
        }
        if !self.gradient_size_px.is_finite() || self.gradient_size_px <= 0.0 {
            return Err(SdfError::validation("gradient_size_px must be finite and > 0"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SdfError::validation("threshold must be within [0, 1]"));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(SdfError::validation("output size must be non-zero"));
        }
        Ok(())
    }

    /// Program sized for `source`: the gradient is expressed relative to its larger side.
    pub fn program_for(&self, source: &Image) -> RenderProgram {
        RenderProgram {
            threshold: self.threshold,
            ..RenderProgram::from_gradient_px(self.gradient_size_px, source.width, source.height)
        }
    }

    pub fn generate_opts(&self) -> GenerateOpts {
        GenerateOpts {
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
