//! Corner refinement by intersecting the table's edge lines.
//!
//! Each edge `i` runs from corner `i` to corner `i + 1` (cyclically, in the
//! order top-left, top-right, bottom-right, bottom-left). Corner `i` is
//! recomputed as the intersection of edge `i - 1` (ending at it) and edge `i`
//! (starting at it).

use crate::corners::OrderedQuad;
use crate::RectifyError;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use table_rectify_core::Line;

/// Parameters for edge-line refinement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeRefineParams {
    /// Fit edge lines to the region boundary; otherwise use two-point lines.
    pub enabled: bool,
    /// Maximum distance of a boundary point from the coarse edge, in pixels.
    pub band_px: f64,
    /// Fraction of each edge ignored at both ends, away from the corners.
    pub trim_frac: f64,
    /// Minimum number of supporting boundary points for a line fit.
    pub min_support: usize,
    /// Lines whose unit normals have `|sin(angle)|` below this are parallel.
    pub parallel_epsilon: f64,
}

impl Default for EdgeRefineParams {
    fn default() -> Self {
        Self {
            enabled: true,
            band_px: 3.0,
            trim_frac: 0.1,
            min_support: 5,
            parallel_epsilon: 1e-9,
        }
    }
}

/// Corners recomputed from four edge lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefinedQuad {
    pub corners: OrderedQuad,
    /// Edge lines, edge `i` from corner `i` to corner `i + 1`.
    pub edges: [Line; 4],
    /// Boundary points supporting each fitted edge; 0 for a two-point line.
    pub support: [usize; 4],
}

/// Two-point line for each edge of `quad`.
pub fn edge_lines(quad: &OrderedQuad) -> Result<[Line; 4], RectifyError> {
    let c = quad.to_array();
    let mut lines = [Line {
        a: 0.0,
        b: 0.0,
        c: 0.0,
    }; 4];
    for i in 0..4 {
        lines[i] =
            Line::through(c[i], c[(i + 1) % 4]).ok_or(RectifyError::DegenerateQuadrilateral)?;
    }
    Ok(lines)
}

/// Intersect adjacent edge lines; `ParallelEdges` names the first corner whose
/// two lines have no finite intersection.
pub fn intersect_lines(lines: &[Line; 4], parallel_epsilon: f64) -> Result<OrderedQuad, RectifyError> {
    let mut corners = [Point2::origin(); 4];
    for (i, corner) in corners.iter_mut().enumerate() {
        *corner = lines[(i + 3) % 4]
            .intersect(&lines[i], parallel_epsilon)
            .ok_or(RectifyError::ParallelEdges { corner: i })?;
    }
    Ok(OrderedQuad::from_array(corners))
}

/// Recompute every corner from the two-point lines through its neighbours.
///
/// On an exact quadrilateral this returns the input corners up to rounding.
pub fn intersect_edges(quad: &OrderedQuad, parallel_epsilon: f64) -> Result<OrderedQuad, RectifyError> {
    let lines = edge_lines(quad)?;
    intersect_lines(&lines, parallel_epsilon)
}

/// Fit each edge to the boundary points that support it, then intersect.
///
/// A boundary point supports edge `i` when its projection falls in the
/// middle `[trim_frac, 1 - trim_frac]` of the edge and it lies within
/// `band_px` of the two-point line. Edges with fewer than `min_support`
/// points keep the two-point line.
pub fn refine_with_boundary(
    quad: &OrderedQuad,
    boundary: &[Point2<i32>],
    params: &EdgeRefineParams,
) -> Result<RefinedQuad, RectifyError> {
    let c = quad.to_array();
    let coarse = edge_lines(quad)?;
    let mut edges = coarse;
    let mut support = [0usize; 4];

    let lo = params.trim_frac.clamp(0.0, 0.5);
    let hi = 1.0 - lo;
    let min_support = params.min_support.max(2);

    for i in 0..4 {
        let p0 = c[i];
        let d = c[(i + 1) % 4] - p0;
        let len2 = d.norm_squared();

        let pts: Vec<Point2<f64>> = boundary
            .iter()
            .map(|q| q.cast::<f64>())
            .filter(|q| {
                let t = (q - p0).dot(&d) / len2;
                t >= lo && t <= hi && coarse[i].signed_distance(*q).abs() <= params.band_px
            })
            .collect();

        if pts.len() < min_support {
            debug!(
                "edge {}: {} supporting points, keeping two-point line",
                i,
                pts.len()
            );
            continue;
        }
        if let Some(line) = Line::fit(&pts) {
            edges[i] = line;
            support[i] = pts.len();
        }
    }

    let corners = intersect_lines(&edges, params.parallel_epsilon)?;
    debug!("edge support {:?}", support);
    Ok(RefinedQuad {
        corners,
        edges,
        support,
    })
}
