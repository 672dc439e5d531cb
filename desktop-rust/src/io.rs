use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

use reading_companion::capture;
use reading_companion_common::CapturedImage;

const THUMB_WIDTH: u32 = 220;
const THUMB_HEIGHT: u32 = 160;

pub fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "webp"])
        .pick_file()
}

pub fn load_image(path: &Path) -> Result<CapturedImage> {
    capture::load_image_file(path).with_context(|| format!("load {}", path.display()))
}

/// Downscaled RGBA copy for the page list. `None` for an unusable buffer.
pub fn thumbnail(image: &CapturedImage) -> Option<([usize; 2], Vec<u8>)> {
    if image.is_empty() {
        return None;
    }
    let buffer = RgbaImage::from_raw(image.width as u32, image.height as u32, image.rgba.clone())?;
    let thumb = DynamicImage::ImageRgba8(buffer).thumbnail(THUMB_WIDTH, THUMB_HEIGHT);
    let size = [thumb.width() as usize, thumb.height() as usize];
    Some((size, thumb.to_rgba8().into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_fits_bounds() {
        let image = CapturedImage::new(880, 320, vec![128; 880 * 320 * 4]);
        let (size, pixels) = thumbnail(&image).unwrap();
        assert!(size[0] <= THUMB_WIDTH as usize);
        assert!(size[1] <= THUMB_HEIGHT as usize);
        assert_eq!(pixels.len(), size[0] * size[1] * 4);
    }

    #[test]
    fn test_thumbnail_of_empty_image() {
        assert!(thumbnail(&CapturedImage::new(0, 0, Vec::new())).is_none());
    }

    #[test]
    fn test_load_missing_image() {
        let err = load_image(Path::new("/nonexistent/page.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/page.png"));
    }
}
