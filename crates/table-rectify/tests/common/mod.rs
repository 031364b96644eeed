#![allow(dead_code)]

use nalgebra::Point2;
use table_rectify::core::{ColorImage, PixelLayout};

/// Felt green in RGB; HSV (65, 200, 140).
pub const FELT: [u8; 3] = [30, 140, 50];
/// Brown floor, well outside the felt hue range.
pub const FLOOR: [u8; 3] = [90, 60, 40];

pub fn blank(width: usize, height: usize, color: [u8; 3]) -> ColorImage {
    let mut img = ColorImage::new(width, height, PixelLayout::Rgb8);
    for px in img.data.chunks_exact_mut(3) {
        px.copy_from_slice(&color);
    }
    img
}

/// Fill every pixel whose center lies inside the convex polygon `poly`
/// (clockwise on screen), edges included.
pub fn fill_convex(img: &mut ColorImage, poly: &[Point2<f64>], color: [u8; 3]) {
    let n = poly.len();
    for y in 0..img.height {
        for x in 0..img.width {
            let p = Point2::new(x as f64, y as f64);
            let inside = (0..n).all(|i| {
                let a = poly[i];
                let b = poly[(i + 1) % n];
                let e = b - a;
                let v = p - a;
                e.x * v.y - e.y * v.x >= -1e-9
            });
            if inside {
                let px = img.layout.to_rgb(color);
                img.put_pixel(x, y, px);
            }
        }
    }
}

/// Axis-aligned rectangle with inclusive pixel bounds.
pub fn fill_rect(img: &mut ColorImage, x0: usize, y0: usize, x1: usize, y1: usize, color: [u8; 3]) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            img.put_pixel(x, y, color);
        }
    }
}

/// Corners of a `w x h` rectangle centred on `(cx, cy)` and rotated by `deg`,
/// in the order top-left, top-right, bottom-right, bottom-left.
pub fn rotated_rect(cx: f64, cy: f64, w: f64, h: f64, deg: f64) -> [Point2<f64>; 4] {
    let (s, c) = deg.to_radians().sin_cos();
    [(-w, -h), (w, -h), (w, h), (-w, h)].map(|(x, y)| {
        let (x, y) = (x / 2.0, y / 2.0);
        Point2::new(cx + c * x - s * y, cy + s * x + c * y)
    })
}

/// 640x480 frame with a 400x200 felt rectangle rotated by 15 degrees.
pub fn rotated_table() -> (ColorImage, [Point2<f64>; 4]) {
    let corners = rotated_rect(320.0, 240.0, 400.0, 200.0, 15.0);
    let mut img = blank(640, 480, FLOOR);
    fill_convex(&mut img, &corners, FELT);
    (img, corners)
}

pub fn assert_near(a: Point2<f64>, b: Point2<f64>, tol: f64) {
    let d = (a - b).norm();
    assert!(
        d <= tol,
        "expected ({:.3}, {:.3}) within {} of ({:.3}, {:.3}), off by {:.3}",
        a.x,
        a.y,
        tol,
        b.x,
        b.y,
        d
    );
}
