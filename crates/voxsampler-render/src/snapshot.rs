//! Writing sampled slices out as grayscale images.

use std::path::Path;

use image::{GrayImage, ImageFormat};
use voxsampler_core::SampledBlock;

/// Error type for snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Slice {z} out of range for a block of depth {depth}")]
    SliceOutOfRange { z: u32, depth: u32 },
}

/// Builds a grayscale image of slice `z` of `block`.
pub fn slice_image(block: &SampledBlock, z: u32) -> Result<GrayImage, SnapshotError> {
    let slice = block.slice(z).ok_or(SnapshotError::SliceOutOfRange {
        z,
        depth: block.depth(),
    })?;
    // Rows are y-major like image rows, so no flip.
    GrayImage::from_raw(block.width(), block.height(), slice.to_vec()).ok_or(
        SnapshotError::SliceOutOfRange {
            z,
            depth: block.depth(),
        },
    )
}

/// Saves slice `z` of `block` as an 8-bit grayscale image.
///
/// The format follows the extension of `path` (.png, .jpg/.jpeg, .pgm,
/// .tif/.tiff).
pub fn save_slice(
    block: &SampledBlock,
    z: u32,
    path: impl AsRef<Path>,
) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let format = match extension.as_str() {
        "png" => ImageFormat::Png,
        "jpg" | "jpeg" => ImageFormat::Jpeg,
        "pgm" => ImageFormat::Pnm,
        "tif" | "tiff" => ImageFormat::Tiff,
        _ => return Err(SnapshotError::UnsupportedFormat(extension)),
    };

    let img = slice_image(block, z)?;
    img.save_with_format(path, format)?;
    log::debug!("saved slice {z} to {}", path.display());
    Ok(())
}

/// Encodes slice `z` of `block` as PNG in memory.
pub fn slice_to_png(block: &SampledBlock, z: u32) -> Result<Vec<u8>, SnapshotError> {
    let img = slice_image(block, z)?;
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
