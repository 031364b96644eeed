//! Canonical corner labelling.

use crate::RectifyError;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use table_rectify_core::{cross2, segments_intersect};

/// Four table corners in canonical order, clockwise on screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderedQuad {
    pub top_left: Point2<f64>,
    pub top_right: Point2<f64>,
    pub bottom_right: Point2<f64>,
    pub bottom_left: Point2<f64>,
}

impl OrderedQuad {
    /// Build from `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn from_array(c: [Point2<f64>; 4]) -> Self {
        Self {
            top_left: c[0],
            top_right: c[1],
            bottom_right: c[2],
            bottom_left: c[3],
        }
    }

    /// `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn to_array(&self) -> [Point2<f64>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Tolerances for [`order_corners`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerOrderParams {
    /// When the 2nd and 3rd smallest y differ by less than this, the top and
    /// bottom pairs are considered ambiguous and the x-split is tried.
    pub split_tolerance_px: f64,
    /// Minimum deviation from a straight angle at every corner, in degrees.
    pub min_corner_angle_deg: f64,
}

impl Default for CornerOrderParams {
    fn default() -> Self {
        Self {
            split_tolerance_px: 2.0,
            min_corner_angle_deg: 5.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Split {
    Vertical,
    Horizontal,
}

/// Assign `points` to top-left, top-right, bottom-right and bottom-left.
///
/// The two smallest-y points form the top pair, ordered by x; the bottom pair
/// is ordered the same way. When the pairs are ambiguous (a table seen almost
/// edge-on to a diagonal) the points are split into left/right pairs by x and
/// ordered by y instead. The result is rejected if it is collinear, has a
/// near-straight corner or has crossing opposite edges.
pub fn order_corners(
    points: &[Point2<f64>; 4],
    params: &CornerOrderParams,
) -> Result<OrderedQuad, RectifyError> {
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(RectifyError::DegenerateQuadrilateral);
    }

    let by_y = sorted_by(points, |p| (p.y, p.x));
    let by_x = sorted_by(points, |p| (p.x, p.y));
    let y_gap = by_y[2].y - by_y[1].y;
    let x_gap = by_x[2].x - by_x[1].x;

    let split = if y_gap < params.split_tolerance_px && x_gap >= params.split_tolerance_px {
        Split::Horizontal
    } else {
        Split::Vertical
    };

    let quad = match split {
        Split::Vertical => {
            let (top_left, top_right) = min_max_by(by_y[0], by_y[1], |p| p.x);
            let (bottom_left, bottom_right) = min_max_by(by_y[2], by_y[3], |p| p.x);
            OrderedQuad {
                top_left,
                top_right,
                bottom_right,
                bottom_left,
            }
        }
        Split::Horizontal => {
            let (top_left, bottom_left) = min_max_by(by_x[0], by_x[1], |p| p.y);
            let (top_right, bottom_right) = min_max_by(by_x[2], by_x[3], |p| p.y);
            OrderedQuad {
                top_left,
                top_right,
                bottom_right,
                bottom_left,
            }
        }
    };

    debug!(
        "ordered corners using {:?} split (y gap {:.2}, x gap {:.2})",
        split, y_gap, x_gap
    );
    validate_quad(&quad, params.min_corner_angle_deg)?;
    Ok(quad)
}

/// Reject quads with a near-straight or zero-length corner, a reflex
/// corner, or crossing opposite edges.
///
/// The image of a rectangle under a plane projective map is convex, so
/// anything else cannot be a table.
pub fn validate_quad(quad: &OrderedQuad, min_corner_angle_deg: f64) -> Result<(), RectifyError> {
    let c = quad.to_array();
    let min_sin = min_corner_angle_deg.to_radians().sin().max(0.0);
    let mut turns = [0.0; 4];

    for i in 0..4 {
        let prev = c[(i + 3) % 4];
        let next = c[(i + 1) % 4];
        let e_in = c[i] - prev;
        let e_out = next - c[i];
        let norms = e_in.norm() * e_out.norm();
        if !(norms > 1e-12) {
            return Err(RectifyError::DegenerateQuadrilateral);
        }
        turns[i] = cross2(e_in, e_out);
        let sin = turns[i].abs() / norms;
        if sin < min_sin || sin == 0.0 {
            debug!("corner {} is too flat (sin {:.4})", i, sin);
            return Err(RectifyError::DegenerateQuadrilateral);
        }
    }

    if !(turns.iter().all(|t| *t > 0.0) || turns.iter().all(|t| *t < 0.0)) {
        debug!("quad is not convex (turns {:?})", turns);
        return Err(RectifyError::DegenerateQuadrilateral);
    }

    if segments_intersect(c[0], c[1], c[2], c[3]) || segments_intersect(c[1], c[2], c[3], c[0]) {
        debug!("opposite edges cross");
        return Err(RectifyError::DegenerateQuadrilateral);
    }
    Ok(())
}

fn sorted_by(points: &[Point2<f64>; 4], key: impl Fn(&Point2<f64>) -> (f64, f64)) -> [Point2<f64>; 4] {
    let mut out = *points;
    out.sort_by(|a, b| {
        let (a0, a1) = key(a);
        let (b0, b1) = key(b);
        a0.total_cmp(&b0).then(a1.total_cmp(&b1))
    });
    out
}

/// `(smaller, larger)` by `key`; on a tie the first argument is the smaller.
fn min_max_by(
    a: Point2<f64>,
    b: Point2<f64>,
    key: impl Fn(&Point2<f64>) -> f64,
) -> (Point2<f64>, Point2<f64>) {
    if key(&b) < key(&a) {
        (b, a)
    } else {
        (a, b)
    }
}
