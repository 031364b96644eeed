//! Core types and utilities for table rectification.
//!
//! This crate is intentionally small: color image views, binary masks,
//! 8-bit HSV, homogeneous lines and the planar homography. It knows nothing
//! about tables or felt; the detector lives in `table-rectify`.

mod color;
mod geometry;
mod homography;
mod image;
mod logger;

pub use color::{rgb_to_hsv, Hsv, HsvRange, HUE_MAX};
pub use geometry::{closed_perimeter, cross2, segments_intersect, signed_area, Line};
pub use homography::{homography_from_4pt, warp_perspective, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, ColorImage, ColorImageView, Mask, PixelLayout};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
