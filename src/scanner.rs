//! Page image discovery for the command line

use crate::error::{AssistError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

/// Image files directly inside `folder`, sorted by file name.
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(AssistError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_image_path(path))
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Expand command-line inputs: folders are scanned, files are taken as given.
pub fn collect_pages(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for input in inputs {
        if input.is_dir() {
            pages.extend(scan_folder(input)?);
        } else if input.is_file() {
            pages.push(input.clone());
        } else {
            return Err(AssistError::FileNotFound(input.display().to_string()));
        }
    }
    Ok(pages)
}
