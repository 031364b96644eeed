use crate::corners::OrderedQuad;
use crate::edges::RefinedQuad;
use crate::rectify::TableHomography;
use crate::region::Region;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use table_rectify_core::ColorImage;

/// Segment between two image points.
pub type Segment = [Point2<f64>; 2];

/// Geometry for drawing the detection over the source image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableOverlay {
    /// Edges through the ordered polygon corners.
    pub polygon_edges: [Segment; 4],
    /// Edges through the refined corners.
    pub refined_edges: [Segment; 4],
    /// Refined top-left to bottom-right, then top-right to bottom-left.
    pub diagonals: [Segment; 2],
}

impl TableOverlay {
    pub fn new(corners: &OrderedQuad, refined: &OrderedQuad) -> Self {
        let c = refined.to_array();
        Self {
            polygon_edges: closed_edges(corners),
            refined_edges: closed_edges(refined),
            diagonals: [[c[0], c[2]], [c[1], c[3]]],
        }
    }
}

fn closed_edges(quad: &OrderedQuad) -> [Segment; 4] {
    let c = quad.to_array();
    [[c[0], c[1]], [c[1], c[2]], [c[2], c[3]], [c[3], c[0]]]
}

/// Table geometry found in one image.
#[derive(Clone, Debug)]
pub struct TableDetection {
    /// Largest felt region; `None` when the corners were supplied by the caller.
    pub region: Option<Region>,
    /// Simplified outline in tracing order; `None` for supplied corners.
    pub polygon: Option<[Point2<i32>; 4]>,
    /// Polygon vertices in canonical order.
    pub corners: OrderedQuad,
    /// Corners recomputed from the edge lines; these define the homography.
    pub refined: RefinedQuad,
    pub overlay: TableOverlay,
    pub homography: TableHomography,
}

/// Rectified top-down view plus the detection that produced it.
#[derive(Clone, Debug)]
pub struct RectifiedTable {
    pub image: ColorImage,
    pub detection: TableDetection,
}
