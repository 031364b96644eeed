//! Projective rectification of the table quad to a fixed-size rectangle.

use crate::corners::{validate_quad, OrderedQuad};
use crate::segment::validate_image;
use crate::RectifyError;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use table_rectify_core::{homography_from_4pt, warp_perspective, ColorImage, ColorImageView, Homography};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Destination rectangle in output pixels: `length` along x, `width` along y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSize {
    pub length: usize,
    pub width: usize,
}

impl Default for TableSize {
    fn default() -> Self {
        Self {
            length: 1200,
            width: 600,
        }
    }
}

/// Largest accepted side of the destination rectangle, in pixels.
pub const MAX_TABLE_SIDE_PX: usize = 16_384;

impl TableSize {
    /// Check that an output image of this size can be allocated.
    pub fn validate(&self) -> Result<(), RectifyError> {
        let invalid = RectifyError::InvalidTableSize {
            length: self.length,
            width: self.width,
        };
        if self.length == 0 || self.width == 0 {
            return Err(invalid);
        }
        if self.length > MAX_TABLE_SIDE_PX || self.width > MAX_TABLE_SIDE_PX {
            return Err(invalid);
        }
        self.length
            .checked_mul(self.width)
            .and_then(|n| n.checked_mul(3))
            .map(|_| ())
            .ok_or(invalid)
    }

    /// Destination corners in canonical order.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let l = self.length as f64;
        let w = self.width as f64;
        [
            Point2::new(0.0, 0.0),
            Point2::new(l, 0.0),
            Point2::new(l, w),
            Point2::new(0.0, w),
        ]
    }
}

/// Both directions of the table homography.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableHomography {
    /// Image pixel -> rectified pixel.
    pub h_rect_from_img: Homography,
    /// Rectified pixel -> image pixel.
    pub h_img_from_rect: Homography,
}

/// Maximum deviation, in destination pixels, of a mapped corner.
const CORNER_TOLERANCE_PX: f64 = 1e-6;

/// Solve the homography sending `quad` onto the corners of `size`.
///
/// The solve is verified on the four correspondences; a singular or
/// inaccurate system is `HomographyFailed`. An unusable `size` is
/// `InvalidTableSize`.
pub fn table_homography(quad: &OrderedQuad, size: TableSize) -> Result<TableHomography, RectifyError> {
    size.validate()?;

    let src = quad.to_array();
    let dst = size.corners();
    let h_rect_from_img = homography_from_4pt(&src, &dst).ok_or(RectifyError::HomographyFailed)?;
    let h_img_from_rect = h_rect_from_img
        .inverse()
        .ok_or(RectifyError::HomographyFailed)?;

    let scale = (size.length.max(size.width) as f64).max(1.0);
    for (s, d) in src.iter().zip(dst.iter()) {
        let m = h_rect_from_img.apply(*s);
        let err = (m - d).norm();
        if !(err <= CORNER_TOLERANCE_PX * scale) {
            debug!("corner {:?} maps to {:?}, expected {:?}", s, m, d);
            return Err(RectifyError::HomographyFailed);
        }
    }

    Ok(TableHomography {
        h_rect_from_img,
        h_img_from_rect,
    })
}

/// Warp `image` so that `quad` fills a `size.length x size.width` output.
///
/// The quad is checked for convexity first; a buffer that does not match its
/// declared dimensions is `InvalidImage`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(image, quad), fields(length = size.length, width = size.width))
)]
pub fn rectify_quad(
    image: &ColorImageView<'_>,
    quad: &OrderedQuad,
    size: TableSize,
) -> Result<(ColorImage, TableHomography), RectifyError> {
    validate_image(image)?;
    validate_quad(quad, 0.0)?;
    let h = table_homography(quad, size)?;
    let out = warp_perspective(image, &h.h_img_from_rect, size.length, size.width);
    Ok((out, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use table_rectify_core::PixelLayout;

    fn rotated_quad() -> OrderedQuad {
        let (s, c) = 15f64.to_radians().sin_cos();
        OrderedQuad::from_array(
            [(-200.0, -100.0), (200.0, -100.0), (200.0, 100.0), (-200.0, 100.0)]
                .map(|(x, y)| Point2::new(320.0 + c * x - s * y, 240.0 + s * x + c * y)),
        )
    }

    #[test]
    fn corners_map_exactly_onto_destination() {
        let quad = rotated_quad();
        let size = TableSize::default();
        let h = table_homography(&quad, size).expect("homography");
        for (s, d) in quad.to_array().iter().zip(size.corners().iter()) {
            let m = h.h_rect_from_img.apply(*s);
            assert_abs_diff_eq!(m.x, d.x, epsilon = 1e-6);
            assert_abs_diff_eq!(m.y, d.y, epsilon = 1e-6);
            let back = h.h_img_from_rect.apply(*d);
            assert_abs_diff_eq!(back.x, s.x, epsilon = 1e-6);
            assert_abs_diff_eq!(back.y, s.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_sized_destination_is_rejected() {
        let size = TableSize {
            length: 0,
            width: 600,
        };
        assert_eq!(
            table_homography(&rotated_quad(), size),
            Err(RectifyError::InvalidTableSize {
                length: 0,
                width: 600
            })
        );
    }

    #[test]
    fn oversized_destination_is_rejected() {
        let huge = TableSize {
            length: 1 << 40,
            width: 1 << 40,
        };
        assert!(matches!(
            table_homography(&rotated_quad(), huge),
            Err(RectifyError::InvalidTableSize { .. })
        ));
        let long = TableSize {
            length: MAX_TABLE_SIDE_PX + 1,
            width: 10,
        };
        assert!(long.validate().is_err());
        let edge = TableSize {
            length: MAX_TABLE_SIDE_PX,
            width: 1,
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn short_buffer_is_an_invalid_image() {
        let data = vec![0u8; 10 * 10 * 3 - 1];
        let view = ColorImageView::new(10, 10, PixelLayout::Rgb8, &data);
        assert!(matches!(
            rectify_quad(&view, &rotated_quad(), TableSize::default()),
            Err(RectifyError::InvalidImage { .. })
        ));
    }

    #[test]
    fn concave_quad_is_not_warped() {
        let img = ColorImage::new(640, 480, PixelLayout::Rgb8);
        let p = |x: f64, y: f64| Point2::new(x, y);
        let quad = OrderedQuad::from_array([p(100.0, 100.0), p(500.0, 100.0), p(300.0, 400.0), p(300.0, 150.0)]);
        assert_eq!(
            rectify_quad(&img.view(), &quad, TableSize::default()).map(|_| ()),
            Err(RectifyError::DegenerateQuadrilateral)
        );
    }

    #[test]
    fn output_has_destination_size_and_layout() {
        let img = ColorImage::new(640, 480, PixelLayout::Bgr8);
        let size = TableSize {
            length: 300,
            width: 150,
        };
        let (out, _) = rectify_quad(&img.view(), &rotated_quad(), size).expect("rectify");
        assert_eq!((out.width, out.height), (300, 150));
        assert_eq!(out.layout, PixelLayout::Bgr8);
        assert_eq!(out.data.len(), 300 * 150 * 3);
    }

    #[test]
    fn rectified_center_samples_table_center() {
        let mut img = ColorImage::new(640, 480, PixelLayout::Rgb8);
        for y in 230..=250 {
            for x in 310..=330 {
                img.put_pixel(x, y, [255, 255, 255]);
            }
        }
        let size = TableSize::default();
        let (out, _) = rectify_quad(&img.view(), &rotated_quad(), size).expect("rectify");
        let i = (300 * out.width + 600) * 3;
        assert_eq!(&out.data[i..i + 3], &[255, 255, 255]);
    }
}
