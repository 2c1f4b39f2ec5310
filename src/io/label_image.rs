//! Loading and saving grayscale label images

use crate::io::configuration::LABEL_IMAGE_EXTENSIONS;
use crate::io::error::{EnrichmentError, Result, WithFov, invalid_input};
use crate::spatial::labels::{FovId, LabeledImage};
use image::{DynamicImage, ImageBuffer, Luma};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Load one 8- or 16-bit grayscale label image
///
/// # Errors
///
/// Returns:
/// - `ImageLoad` if the file cannot be opened or decoded
/// - `InvalidInput` if the file does not exist or the image is not
///   single-channel integer grayscale
pub fn load_label_image(path: &Path) -> Result<LabeledImage> {
    if !path.is_file() {
        return Err(invalid_input(&format!(
            "label image '{}' does not exist",
            path.display()
        )));
    }
    let img = image::open(path).map_err(|source| EnrichmentError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    match img {
        DynamicImage::ImageLuma8(buffer) => to_labeled(path, height, width, buffer.into_raw()),
        DynamicImage::ImageLuma16(buffer) => to_labeled(path, height, width, buffer.into_raw()),
        other => Err(invalid_input(&format!(
            "label image '{}' must be 8- or 16-bit grayscale, found {:?}",
            path.display(),
            other.color()
        ))),
    }
}

fn to_labeled<T>(path: &Path, height: usize, width: usize, raw: Vec<T>) -> Result<LabeledImage>
where
    T: num_traits::PrimInt + num_traits::Unsigned,
{
    let pixels = Array2::from_shape_vec((height, width), raw).map_err(|e| {
        invalid_input(&format!(
            "label image '{}' has inconsistent dimensions: {e}",
            path.display()
        ))
    })?;
    LabeledImage::from_raw(&pixels)
}

/// Save a label image as 16-bit grayscale PNG
///
/// # Errors
///
/// Returns:
/// - `InvalidInput` if a label does not fit in 16 bits
/// - `ImageLoad` if encoding or writing fails
pub fn save_label_image(path: &Path, image: &LabeledImage) -> Result<()> {
    let (rows, cols) = image.dim();
    let raw: Vec<u16> = image
        .pixels()
        .iter()
        .map(|&label| {
            u16::try_from(label).map_err(|e| {
                invalid_input(&format!("label {label} does not fit in a 16-bit image: {e}"))
            })
        })
        .collect::<Result<_>>()?;
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(cols as u32, rows as u32, raw)
            .ok_or_else(|| invalid_input(&"label image buffer does not match its dimensions"))?;
    buffer
        .save(path)
        .map_err(|source| EnrichmentError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })
}

/// Label image files in a directory keyed by FOV id (the file stem)
///
/// # Errors
///
/// Returns `InvalidInput` if the directory does not exist, or `FileSystem`
/// if it cannot be read
pub fn scan_label_dir(dir: &Path) -> Result<BTreeMap<FovId, PathBuf>> {
    if !dir.is_dir() {
        return Err(invalid_input(&format!(
            "label directory '{}' does not exist",
            dir.display()
        )));
    }
    let entries = std::fs::read_dir(dir).map_err(|source| EnrichmentError::FileSystem {
        path: dir.to_path_buf(),
        operation: "read directory",
        source,
    })?;

    let mut found = BTreeMap::new();
    for entry in entries {
        let path = entry
            .map_err(|source| EnrichmentError::FileSystem {
                path: dir.to_path_buf(),
                operation: "read directory entry",
                source,
            })?
            .path();
        let is_label_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                LABEL_IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if !path.is_file() || !is_label_image {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) {
            found.insert(stem, path);
        }
    }
    Ok(found)
}

/// Load every label image of a directory
///
/// # Errors
///
/// Returns `FovFailed` for the first image that cannot be loaded, or the
/// errors of [`scan_label_dir`]
pub fn load_label_dir(dir: &Path) -> Result<BTreeMap<FovId, LabeledImage>> {
    scan_label_dir(dir)?
        .into_iter()
        .map(|(fov_id, path)| {
            let image = load_label_image(&path).with_fov(&fov_id)?;
            Ok((fov_id, image))
        })
        .collect()
}
