//! Image capture: OS clipboard and image files

use crate::error::{AssistError, Result};
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use reading_companion_common::CapturedImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Read the current clipboard image.
///
/// Returns `CaptureEmpty` when the clipboard holds no image (text, files, nothing).
pub fn read_clipboard_image() -> Result<CapturedImage> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| AssistError::Clipboard(e.to_string()))?;

    let data = match clipboard.get_image() {
        Ok(data) => data,
        Err(arboard::Error::ContentNotAvailable) => return Err(AssistError::CaptureEmpty),
        Err(e) => return Err(AssistError::Clipboard(e.to_string())),
    };

    let image = CapturedImage::new(data.width, data.height, data.bytes.into_owned());
    if image.is_empty() {
        return Err(AssistError::CaptureEmpty);
    }
    debug!(width = image.width, height = image.height, "clipboard image captured");
    Ok(image)
}

/// Decode an image file (PNG, JPEG, ...) into RGBA pixels.
pub fn load_image_file(path: &Path) -> Result<CapturedImage> {
    if !path.exists() {
        return Err(AssistError::FileNotFound(path.display().to_string()));
    }
    let decoded = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| AssistError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    Ok(from_dynamic(decoded))
}

pub fn from_dynamic(image: DynamicImage) -> CapturedImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    CapturedImage::new(width as usize, height as usize, rgba.into_raw())
}

/// Encode captured pixels as PNG bytes.
pub fn encode_png(image: &CapturedImage) -> Result<Vec<u8>> {
    let buffer = RgbaImage::from_raw(image.width as u32, image.height as u32, image.rgba.clone())
        .ok_or_else(|| {
            AssistError::ImageLoad(format!(
                "pixel buffer does not match {}x{}",
                image.width, image.height
            ))
        })?;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| AssistError::ImageLoad(e.to_string()))?;
    Ok(bytes)
}
