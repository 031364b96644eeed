//! Homogeneous lines and small polygon helpers.

use nalgebra::{Matrix2, Point2, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// 2D cross product `a × b` (z component of the 3D cross).
#[inline]
pub fn cross2(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Line `a·x + b·y + c = 0`, kept with a unit normal `(a, b)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    /// Scale `(a, b, c)` so that `a² + b² = 1`. `None` for a null normal.
    pub fn from_coeffs(a: f64, b: f64, c: f64) -> Option<Self> {
        let n = (a * a + b * b).sqrt();
        if !(n > 1e-12) || !c.is_finite() {
            return None;
        }
        Some(Self {
            a: a / n,
            b: b / n,
            c: c / n,
        })
    }

    /// Line through two distinct points: `(x1, y1, 1) × (x2, y2, 1)`.
    pub fn through(p1: Point2<f64>, p2: Point2<f64>) -> Option<Self> {
        let h1 = Vector3::new(p1.x, p1.y, 1.0);
        let h2 = Vector3::new(p2.x, p2.y, 1.0);
        let l = h1.cross(&h2);
        Self::from_coeffs(l.x, l.y, l.z)
    }

    /// Total-least-squares fit: the line through the centroid along the
    /// principal axis of the point scatter.
    pub fn fit(points: &[Point2<f64>]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

        let mut cov = Matrix2::<f64>::zeros();
        for p in points {
            let d = Vector2::new(p.x - cx, p.y - cy);
            cov += d * d.transpose();
        }

        let eig = cov.symmetric_eigen();
        // normal = eigenvector of the smallest eigenvalue
        let k = if eig.eigenvalues[0] <= eig.eigenvalues[1] {
            0
        } else {
            1
        };
        let normal = eig.eigenvectors.column(k);
        Self::from_coeffs(normal[0], normal[1], -(normal[0] * cx + normal[1] * cy))
    }

    #[inline]
    pub fn coeffs(&self) -> Vector3<f64> {
        Vector3::new(self.a, self.b, self.c)
    }

    /// Signed distance of `p` from the line.
    #[inline]
    pub fn signed_distance(&self, p: Point2<f64>) -> f64 {
        self.a * p.x + self.b * p.y + self.c
    }

    /// Homogeneous intersection `l1 × l2 = (x, y, w)`.
    ///
    /// With unit normals `|w|` is the sine of the angle between the lines;
    /// returns `None` when it does not exceed `eps`.
    pub fn intersect(&self, other: &Line, eps: f64) -> Option<Point2<f64>> {
        let v = self.coeffs().cross(&other.coeffs());
        let w = v.z;
        if !(w.abs() > eps) {
            return None;
        }
        Some(Point2::new(v.x / w, v.y / w))
    }
}

/// Shoelace area of a closed polygon; positive when the vertices run
/// clockwise on screen (image coordinates, y down).
pub fn signed_area<T>(points: &[Point2<T>]) -> f64
where
    T: Copy + Into<f64> + nalgebra::Scalar,
{
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let (px, py): (f64, f64) = (points[i].x.into(), points[i].y.into());
        let (qx, qy): (f64, f64) = (points[(i + 1) % n].x.into(), points[(i + 1) % n].y.into());
        acc += px * qy - qx * py;
    }
    acc * 0.5
}

/// Length of a closed polyline, including the closing segment.
pub fn closed_perimeter<T>(points: &[Point2<T>]) -> f64
where
    T: Copy + Into<f64> + nalgebra::Scalar,
{
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let (px, py): (f64, f64) = (points[i].x.into(), points[i].y.into());
            let (qx, qy): (f64, f64) = (points[(i + 1) % n].x.into(), points[(i + 1) % n].y.into());
            ((qx - px).powi(2) + (qy - py).powi(2)).sqrt()
        })
        .sum()
}

/// `true` if the closed segments `p1-p2` and `q1-q2` share at least one point.
pub fn segments_intersect(
    p1: Point2<f64>,
    p2: Point2<f64>,
    q1: Point2<f64>,
    q2: Point2<f64>,
) -> bool {
    fn orient(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
        cross2(b - a, c - a)
    }
    fn on_segment(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>) -> bool {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    }

    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
