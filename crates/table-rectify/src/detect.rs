//! Helpers for `image` crate buffers.

use crate::{RectifiedTable, RectifyError, TableRectifier, TableRectifyParams};
use std::path::Path;
use table_rectify_core::{ColorImage, ColorImageView, PixelLayout};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the `image` helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid RGB image buffer length (expected {expected} bytes, got {got})")]
    InvalidRgbBuffer { expected: usize, got: usize },

    #[error("invalid RGB image dimensions (width={width}, height={height})")]
    InvalidRgbDimensions { width: u64, height: u64 },

    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    Rectify(#[from] RectifyError),
}

/// Borrow an `image::RgbImage` as a core color view.
pub fn color_view(img: &::image::RgbImage) -> ColorImageView<'_> {
    ColorImageView::new(
        img.width() as usize,
        img.height() as usize,
        PixelLayout::Rgb8,
        img.as_raw(),
    )
}

/// Build an `image::RgbImage` from a raw interleaved RGB buffer.
pub fn rgb_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::RgbImage, DetectError> {
    let dims_err = || DetectError::InvalidRgbDimensions {
        width: width.into(),
        height: height.into(),
    };
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(dims_err)?;
    if pixels.len() != expected {
        return Err(DetectError::InvalidRgbBuffer {
            expected,
            got: pixels.len(),
        });
    }
    ::image::RgbImage::from_raw(width, height, pixels.to_vec()).ok_or_else(dims_err)
}

/// Convert a core buffer into an `image::RgbImage`, swapping BGR input.
pub fn to_rgb_image(img: &ColorImage) -> Result<::image::RgbImage, DetectError> {
    let dims_err = || DetectError::InvalidRgbDimensions {
        width: img.width as u64,
        height: img.height as u64,
    };
    let width = u32::try_from(img.width).map_err(|_| dims_err())?;
    let height = u32::try_from(img.height).map_err(|_| dims_err())?;

    let data = match img.layout {
        PixelLayout::Rgb8 => img.data.clone(),
        PixelLayout::Bgr8 => img
            .data
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
    };
    rgb_image_from_slice(width, height, &data)
}

/// Decode any supported image file into RGB.
pub fn open_rgb(path: impl AsRef<Path>) -> Result<::image::RgbImage, DetectError> {
    Ok(::image::open(path)?.to_rgb8())
}

/// Detect and rectify the table in an `image::RgbImage`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn rectify_table_image(
    img: &::image::RgbImage,
    params: &TableRectifyParams,
) -> Result<(::image::RgbImage, RectifiedTable), DetectError> {
    let rectifier = TableRectifier::new(params.clone());
    let result = rectifier.rectify(&color_view(img))?;
    let out = to_rgb_image(&result.image)?;
    Ok((out, result))
}

/// Rectify a raw interleaved RGB buffer.
pub fn rectify_table_from_rgb_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    params: &TableRectifyParams,
) -> Result<(::image::RgbImage, RectifiedTable), DetectError> {
    let img = rgb_image_from_slice(width, height, pixels)?;
    rectify_table_image(&img, params)
}
