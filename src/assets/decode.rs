use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::{ColorSpace, Image};
use crate::foundation::error::{SdfError, SdfResult};

/// Decode encoded image bytes into RGBA8.
///
/// Gray images replicate luma into R, G and B; images without alpha become opaque.
pub fn decode_image(bytes: &[u8], color_space: ColorSpace) -> SdfResult<Image> {
    let dyn_img = image::load_from_memory(bytes).map_err(|e| SdfError::decode(e.to_string()))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Image::from_rgba8(width, height, rgba.into_raw(), color_space)
}

/// Read and decode an image file.
pub fn load_image(path: &Path, color_space: ColorSpace) -> SdfResult<Image> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes, color_space)
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &Image) -> SdfResult<Vec<u8>> {
    image.validate()?;
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.data.clone())
        .ok_or_else(|| SdfError::validation("image data does not fit its dimensions"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Encode an image as PNG and write it to `path`, creating parent directories.
pub fn save_png(image: &Image, path: &Path) -> SdfResult<()> {
    let bytes = encode_png(image)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

/// Default output location for a distance field: `<stem>.sdf.png` next to `input`.
pub fn sdf_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}.sdf.png"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
