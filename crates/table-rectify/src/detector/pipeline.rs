use super::{RectifiedTable, TableDetection, TableOverlay, TableRectifyParams};
use crate::corners::{order_corners, validate_quad, OrderedQuad};
use crate::edges::{edge_lines, intersect_lines, refine_with_boundary, RefinedQuad};
use crate::polygon::approximate_quad;
use crate::rectify::{table_homography, TableSize};
use crate::region::{extract_largest_region, Region};
use crate::segment::{segment_color, validate_image};
use crate::RectifyError;
use log::{debug, warn};
use nalgebra::Point2;
use table_rectify_core::{warp_perspective, ColorImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Finds a felt-colored table and rectifies it to a top-down view.
///
/// Holds only configuration; every call processes one image independently,
/// so a single rectifier can be shared across threads.
#[derive(Clone, Debug)]
pub struct TableRectifier {
    params: TableRectifyParams,
}

impl Default for TableRectifier {
    fn default() -> Self {
        Self::new(TableRectifyParams::default())
    }
}

impl TableRectifier {
    /// Create a rectifier, replacing out-of-range tolerances by their defaults.
    pub fn new(mut params: TableRectifyParams) -> Self {
        let defaults = TableRectifyParams::default();
        if !params.color.is_valid() {
            warn!(
                "felt color range {:?}..{:?} can never match some channels",
                params.color.lower, params.color.upper
            );
        }
        if !params.approx_epsilon_frac.is_finite() || params.approx_epsilon_frac < 0.0 {
            warn!(
                "approx_epsilon_frac {} is invalid, using {}",
                params.approx_epsilon_frac, defaults.approx_epsilon_frac
            );
            params.approx_epsilon_frac = defaults.approx_epsilon_frac;
        }
        if !params.edges.parallel_epsilon.is_finite() || params.edges.parallel_epsilon < 0.0 {
            params.edges.parallel_epsilon = defaults.edges.parallel_epsilon;
        }
        if !params.edges.band_px.is_finite() || params.edges.band_px <= 0.0 {
            params.edges.band_px = defaults.edges.band_px;
        }
        if !params.ordering.split_tolerance_px.is_finite() {
            params.ordering.split_tolerance_px = defaults.ordering.split_tolerance_px;
        }
        if !params.ordering.min_corner_angle_deg.is_finite() {
            params.ordering.min_corner_angle_deg = defaults.ordering.min_corner_angle_deg;
        }
        Self { params }
    }

    /// Rectifier parameters.
    #[inline]
    pub fn params(&self) -> &TableRectifyParams {
        &self.params
    }

    /// Locate the table and compute its homography without warping.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn detect(&self, image: &ColorImageView<'_>) -> Result<TableDetection, RectifyError> {
        let mask = segment_color(image, &self.params.color)?;
        let region = extract_largest_region(&mask)?;
        let polygon = approximate_quad(&region, self.params.approx_epsilon_frac)?;

        let points = polygon.map(|p| p.cast::<f64>());
        let corners = order_corners(&points, &self.params.ordering)?;

        let refined = if self.params.edges.enabled {
            refine_with_boundary(&corners, &region.boundary, &self.params.edges)?
        } else {
            self.two_point_refinement(&corners)?
        };

        self.finish(Some(region), Some(polygon), corners, refined)
    }

    /// Detect the table and warp it to `params.table` size.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn rectify(&self, image: &ColorImageView<'_>) -> Result<RectifiedTable, RectifyError> {
        let detection = self.detect(image)?;
        Ok(self.warp(image, detection))
    }

    /// Rectify using caller-supplied corners, in any order.
    ///
    /// Segmentation is skipped; the corners are ordered and refined from
    /// their own two-point edges.
    pub fn rectify_from_corners(
        &self,
        image: &ColorImageView<'_>,
        points: &[Point2<f64>; 4],
    ) -> Result<RectifiedTable, RectifyError> {
        validate_image(image)?;
        let corners = order_corners(points, &self.params.ordering)?;
        let refined = self.two_point_refinement(&corners)?;
        let detection = self.finish(None, None, corners, refined)?;
        Ok(self.warp(image, detection))
    }

    fn two_point_refinement(&self, corners: &OrderedQuad) -> Result<RefinedQuad, RectifyError> {
        let edges = edge_lines(corners)?;
        let refined = intersect_lines(&edges, self.params.edges.parallel_epsilon)?;
        Ok(RefinedQuad {
            corners: refined,
            edges,
            support: [0; 4],
        })
    }

    fn finish(
        &self,
        region: Option<Region>,
        polygon: Option<[Point2<i32>; 4]>,
        corners: OrderedQuad,
        refined: RefinedQuad,
    ) -> Result<TableDetection, RectifyError> {
        validate_quad(&refined.corners, self.params.ordering.min_corner_angle_deg)?;
        let homography = table_homography(&refined.corners, self.params.table)?;
        debug!(
            "table corners {:?}",
            refined.corners.to_array().map(|p| (p.x, p.y))
        );

        Ok(TableDetection {
            overlay: TableOverlay::new(&corners, &refined.corners),
            region,
            polygon,
            corners,
            refined,
            homography,
        })
    }

    fn warp(&self, image: &ColorImageView<'_>, detection: TableDetection) -> RectifiedTable {
        let TableSize { length, width } = self.params.table;
        let image = warp_perspective(image, &detection.homography.h_img_from_rect, length, width);
        RectifiedTable { image, detection }
    }
}
