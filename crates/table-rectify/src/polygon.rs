//! Closed-contour simplification (Douglas-Peucker).

use crate::{RectifyError, Region};
use log::debug;
use nalgebra::Point2;
use table_rectify_core::closed_perimeter;

/// Simplify a closed contour so that no dropped point lies farther than
/// `epsilon` from the simplified outline.
///
/// The contour is split at two mutually distant points (an approximate
/// diameter), which are always kept; each half is then simplified on its own.
/// Vertex order follows the input order, starting at the first split point.
pub fn approximate_closed_polygon(boundary: &[Point2<i32>], epsilon: f64) -> Vec<Point2<i32>> {
    let n = boundary.len();
    if n < 3 {
        return boundary.to_vec();
    }
    let pts: Vec<Point2<f64>> = boundary.iter().map(|p| p.cast::<f64>()).collect();

    let a = farthest_from(&pts, pts[0]);
    let b = farthest_from(&pts, pts[a]);
    if a == b || pts[a] == pts[b] {
        return vec![boundary[0]];
    }
    let (i0, i1) = if a < b { (a, b) } else { (b, a) };

    // arc i0 -> i1, then arc i1 -> (wrap) -> i0
    let arc1: Vec<usize> = (i0..=i1).collect();
    let arc2: Vec<usize> = (i1..n).chain(0..=i0).collect();

    let mut out = Vec::new();
    for &k in &douglas_peucker(&pts, &arc1, epsilon) {
        out.push(boundary[arc1[k]]);
    }
    let kept2 = douglas_peucker(&pts, &arc2, epsilon);
    for &k in &kept2[1..kept2.len() - 1] {
        out.push(boundary[arc2[k]]);
    }
    out
}

/// Simplify the region outline with `epsilon = epsilon_frac * perimeter` and
/// require exactly four vertices.
pub fn approximate_quad(
    region: &Region,
    epsilon_frac: f64,
) -> Result<[Point2<i32>; 4], RectifyError> {
    let perimeter = closed_perimeter(&region.boundary);
    let epsilon = epsilon_frac * perimeter;
    let poly = approximate_closed_polygon(&region.boundary, epsilon);
    debug!(
        "outline of {} points (perimeter {:.1}) simplified to {} vertices at epsilon {:.2}",
        region.boundary.len(),
        perimeter,
        poly.len(),
        epsilon
    );

    <[Point2<i32>; 4]>::try_from(poly.as_slice()).map_err(|_| RectifyError::NotAQuadrilateral {
        vertices: poly.len(),
    })
}

fn farthest_from(pts: &[Point2<f64>], origin: Point2<f64>) -> usize {
    let mut best = 0;
    let mut best_d = -1.0;
    for (i, p) in pts.iter().enumerate() {
        let d = (p - origin).norm_squared();
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Open-polyline Douglas-Peucker over `pts[idx[..]]`; returns the kept
/// positions into `idx`, in order, always including both ends.
fn douglas_peucker(pts: &[Point2<f64>], idx: &[usize], epsilon: f64) -> Vec<usize> {
    let n = idx.len();
    if n < 3 {
        return (0..n).collect();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }

        let a = pts[idx[start]];
        let b = pts[idx[end]];
        let mut dmax = 0.0;
        let mut index = start;
        for i in start + 1..end {
            let d = perpendicular_distance(pts[idx[i]], a, b);
            if d > dmax {
                index = i;
                dmax = d;
            }
        }

        if dmax > epsilon {
            keep[index] = true;
            stack.push((start, index));
            stack.push((index, end));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

fn perpendicular_distance(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mag = (dx * dx + dy * dy).sqrt();
    if mag < 1e-9 {
        return (p - a).norm();
    }
    (dy * p.x - dx * p.y + b.x * a.y - b.y * a.x).abs() / mag
}
