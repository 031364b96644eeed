//! Felt-color segmentation.

use crate::RectifyError;
use log::debug;
use table_rectify_core::{rgb_to_hsv, ColorImageView, HsvRange, Mask};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Reject views that cannot be interpreted as a 3-channel 8-bit image.
pub fn validate_image(image: &ColorImageView<'_>) -> Result<(), RectifyError> {
    if image.width == 0 || image.height == 0 {
        return Err(RectifyError::invalid_image(format!(
            "zero area ({}x{})",
            image.width, image.height
        )));
    }
    let expected = image.expected_len().ok_or_else(|| {
        RectifyError::invalid_image(format!(
            "dimensions overflow ({}x{})",
            image.width, image.height
        ))
    })?;
    if image.data.len() != expected {
        return Err(RectifyError::invalid_image(format!(
            "buffer length {} does not match {}x{}x3 = {}",
            image.data.len(),
            image.width,
            image.height,
            expected
        )));
    }
    Ok(())
}

/// Build a mask of the pixels whose HSV color lies inside `range` (inclusive
/// on all three channels). The mask has the image's dimensions.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(image, range), fields(width = image.width, height = image.height))
)]
pub fn segment_color(image: &ColorImageView<'_>, range: &HsvRange) -> Result<Mask, RectifyError> {
    validate_image(image)?;

    let mut mask = Mask::new(image.width, image.height);
    for (dst, px) in mask.data.iter_mut().zip(image.data.chunks_exact(3)) {
        let rgb = image.layout.to_rgb([px[0], px[1], px[2]]);
        if range.contains(rgb_to_hsv(rgb)) {
            *dst = 255;
        }
    }

    debug!(
        "felt mask covers {} of {} pixels",
        mask.count(),
        image.width * image.height
    );
    Ok(mask)
}
