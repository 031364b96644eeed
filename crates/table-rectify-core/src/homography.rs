use crate::{sample_bilinear_u8, ColorImage, ColorImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector2, Vector3};

/// Planar projective transform, `dst ~ H * src`, scaled so `h[(2, 2)] == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    /// Build from row-major entries, as stored in reports.
    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    /// Row-major entries.
    pub fn to_array(&self) -> [[f64; 3]; 3] {
        std::array::from_fn(|r| std::array::from_fn(|c| self.h[(r, c)]))
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v.x / v.z, v.y / v.z)
    }

    /// Inverse transform, or `None` when `h` is singular or maps the origin
    /// to infinity.
    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().and_then(unit_scale).map(Self::new)
    }
}

/// Similarity moving four points to their centroid with mean radius sqrt(2).
struct Conditioning {
    t: Matrix3<f64>,
}

impl Conditioning {
    fn for_points(pts: &[Point2<f64>; 4]) -> Self {
        let centroid = pts.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / 4.0;
        let (cx, cy) = (centroid.x, centroid.y);
        let radius = pts.iter().map(|p| (p.x - cx).hypot(p.y - cy)).sum::<f64>() / 4.0;
        let s = if radius > 1e-12 {
            std::f64::consts::SQRT_2 / radius
        } else {
            1.0
        };
        Self {
            t: Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0),
        }
    }

    fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.t * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v.x, v.y)
    }
}

fn unit_scale(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let w = h[(2, 2)];
    (w.abs() >= 1e-12).then(|| h / w)
}

/// Two DLT rows for `(x, y) -> (u, v)` with `h33` fixed at one.
fn dlt_rows(src: Point2<f64>, dst: Point2<f64>) -> ([f64; 8], f64, [f64; 8], f64) {
    let (x, y, u, v) = (src.x, src.y, dst.x, dst.y);
    (
        [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y],
        u,
        [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y],
        v,
    )
}

/// Compute H such that `dst ~ H * src` from exactly 4 point correspondences.
///
/// Both point sets are conditioned before solving. Corner order must match
/// between `src` and `dst`. Returns `None` when the system is singular,
/// which happens when three of the points are collinear.
pub fn homography_from_4pt(src: &[Point2<f64>; 4], dst: &[Point2<f64>; 4]) -> Option<Homography> {
    let cs = Conditioning::for_points(src);
    let cd = Conditioning::for_points(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for (k, (s, d)) in src.iter().zip(dst).enumerate() {
        let (ru, u, rv, v) = dlt_rows(cs.apply(*s), cd.apply(*d));
        for (c, (eu, ev)) in ru.iter().zip(rv.iter()).enumerate() {
            a[(2 * k, c)] = *eu;
            a[(2 * k + 1, c)] = *ev;
        }
        b[2 * k] = u;
        b[2 * k + 1] = v;
    }

    let x = a.lu().solve(&b)?;
    if !x.iter().all(|v| v.is_finite()) {
        return None;
    }
    let hn = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);

    let h = cd.t.try_inverse()? * hn * cs.t;
    unit_scale(h).map(Homography::new)
}

/// Warp into the destination frame: for each dst pixel, map to src via
/// `h_src_from_dst` and sample bilinearly. Pixels that land outside the
/// source are black; the source channel layout is kept.
pub fn warp_perspective(
    src: &ColorImageView<'_>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
) -> ColorImage {
    let mut out = ColorImage::new(out_w, out_h, src.layout);

    for y in 0..out_h {
        for x in 0..out_w {
            let ps = h_src_from_dst.apply(Point2::new(x as f64, y as f64));
            if !ps.x.is_finite() || !ps.y.is_finite() {
                continue;
            }
            let px = sample_bilinear_u8(src, ps.x as f32, ps.y as f32);
            out.put_pixel(x, y, px);
        }
    }

    out
}
