use crate::foundation::error::{SdfError, SdfResult};

/// Transfer encoding of an image's color values.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// Values are stored linearly.
    #[default]
    Linear,
    /// Values are gamma-encoded (sRGB).
    Srgb,
}

impl ColorSpace {
    pub fn is_srgb(self) -> bool {
        matches!(self, Self::Srgb)
    }
}

/// A CPU-side RGBA8 image.
///
/// Pixels are tightly packed, row-major, four bytes per pixel. A channel byte `v` stands for the
/// value `v / 255` in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
    /// Encoding of the stored values.
    pub color_space: ColorSpace,
}

impl Image {
    /// Allocate an image with every channel of every pixel set to zero.
    pub fn new(width: u32, height: u32, color_space: ColorSpace) -> SdfResult<Self> {
        Self::filled(width, height, [0, 0, 0, 0], color_space)
    }

    /// Allocate an image with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], color_space: ColorSpace) -> SdfResult<Self> {
        let len = rgba8_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            data.extend_from_slice(&rgba);
        }
        Ok(Self {
            width,
            height,
            data,
            color_space,
        })
    }

    /// Wrap existing RGBA8 bytes, checking the length against the dimensions.
    pub fn from_rgba8(
        width: u32,
        height: u32,
        data: Vec<u8>,
        color_space: ColorSpace,
    ) -> SdfResult<Self> {
        let img = Self {
            width,
            height,
            data,
            color_space,
        };
        img.validate()?;
        Ok(img)
    }

    /// Check that the image is non-empty and its data matches `width * height * 4`.
    pub fn validate(&self) -> SdfResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SdfError::validation(format!(
                "image must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        let expected = rgba8_len(self.width, self.height)?;
        if self.data.len() != expected {
            return Err(SdfError::validation(format!(
                "image data length {} does not match {}x{}x4",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// The larger of width and height.
    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Value of channel `c` (0 = R .. 3 = A) at `(x, y)`.
    pub fn channel(&self, x: u32, y: u32, c: usize) -> u8 {
        self.data[self.index(x, y) + c]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }
}

/// Byte length of a tightly packed RGBA8 buffer, guarding against overflow.
pub(crate) fn rgba8_len(width: u32, height: u32) -> SdfResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| SdfError::validation("image buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
