//! Find a snooker or pool table by its felt color and warp it to a top-down view.
//!
//! The pipeline runs one image at a time:
//! felt segmentation -> largest region -> quadrilateral outline ->
//! canonical corner order -> edge-line refinement -> homography and warp.
//! Every stage fails with its own [`RectifyError`] kind instead of guessing.
//!
//! ## Quickstart
//!
//! ```no_run
//! use table_rectify::{detect, TableRectifyParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = detect::open_rgb("table.jpg")?;
//! let (top_down, result) = detect::rectify_table_image(&img, &TableRectifyParams::default())?;
//! println!("corners: {:?}", result.detection.refined.corners);
//! top_down.save("table_rectified.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - [`TableRectifier`]: the detector object; `detect`, `rectify`, `rectify_from_corners`.
//! - Stage functions: [`segment_color`], [`extract_largest_region`],
//!   [`approximate_quad`], [`order_corners`], [`intersect_edges`] /
//!   [`refine_with_boundary`], [`rectify_quad`].
//! - [`rectify_frames`] with a [`FailurePolicy`] for frame sequences.
//! - [`RectifyConfig`] / [`RectifyReport`]: JSON config and per-image report.
//! - `detect` (feature `image`): helpers for `image::RgbImage`.

pub mod batch;
pub mod corners;
mod detector;
pub mod edges;
pub mod io;
pub mod polygon;
pub mod rectify;
pub mod region;
pub mod segment;

#[cfg(feature = "image")]
pub mod detect;

pub use table_rectify_core as core;

pub use batch::{rectify_frames, BatchError, FailurePolicy, FailureTracker, FrameOutcome, RectifyFrames};
pub use corners::{order_corners, validate_quad, CornerOrderParams, OrderedQuad};
pub use detector::{
    RectifiedTable, RectifyError, Segment, TableDetection, TableOverlay, TableRectifier,
    TableRectifyParams,
};
pub use edges::{intersect_edges, refine_with_boundary, EdgeRefineParams, RefinedQuad};
pub use io::{RectifyConfig, RectifyIoError, RectifyReport};
pub use polygon::{approximate_closed_polygon, approximate_quad};
pub use rectify::{rectify_quad, table_homography, TableHomography, TableSize, MAX_TABLE_SIDE_PX};
pub use region::{extract_largest_region, find_regions, Region};
pub use segment::segment_color;

/// Detect and rectify the table in `image` with `params`.
pub fn rectify_table(
    image: &table_rectify_core::ColorImageView<'_>,
    params: &TableRectifyParams,
) -> Result<RectifiedTable, RectifyError> {
    TableRectifier::new(params.clone()).rectify(image)
}
