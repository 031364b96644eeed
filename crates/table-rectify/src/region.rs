//! Connected foreground regions and their outer boundaries.
//!
//! Components are 8-connected and discovered in raster scan order. The outer
//! boundary of each one is traced with Moore-neighbour following (Jacob's
//! stopping criterion), starting at the component's first pixel in scan order
//! and running clockwise on screen (y pointing down).

use crate::RectifyError;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use table_rectify_core::{signed_area, Mask};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Moore neighbourhood, clockwise on screen starting from west.
const DIRS: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];
const EAST: usize = 4;

/// Outer contour of one connected foreground component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Boundary pixels in tracing order, not closed (last != first).
    pub boundary: Vec<Point2<i32>>,
    /// Shoelace area enclosed by `boundary`, used for selection.
    pub area: f64,
    /// Number of pixels in the component.
    pub pixel_count: usize,
}

/// Enumerate all 8-connected components of `mask` in raster discovery order.
pub fn find_regions(mask: &Mask) -> Vec<Region> {
    let w = mask.width;
    let h = mask.height;
    let mut visited = vec![false; w * h];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut regions = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if visited[idx] || !mask.is_set(x, y) {
                continue;
            }

            // flood fill to mark and count the component
            let mut pixel_count = 0usize;
            visited[idx] = true;
            stack.push((x, y));
            while let Some((cx, cy)) = stack.pop() {
                pixel_count += 1;
                for (dx, dy) in DIRS {
                    let nx = cx as i32 + dx;
                    let ny = cy as i32 + dy;
                    if !mask.is_set_i(nx, ny) {
                        continue;
                    }
                    let nidx = ny as usize * w + nx as usize;
                    if !visited[nidx] {
                        visited[nidx] = true;
                        stack.push((nx as usize, ny as usize));
                    }
                }
            }

            let start = Point2::new(x as i32, y as i32);
            let boundary = trace_outer_boundary(mask, start, pixel_count);
            let area = signed_area(&boundary).abs();
            regions.push(Region {
                boundary,
                area,
                pixel_count,
            });
        }
    }

    regions
}

/// Return the region with strictly maximum enclosed area. On equal areas the
/// first one discovered in raster scan order wins.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask), fields(width = mask.width, height = mask.height))
)]
pub fn extract_largest_region(mask: &Mask) -> Result<Region, RectifyError> {
    let regions = find_regions(mask);
    let count = regions.len();

    let mut best: Option<Region> = None;
    for region in regions {
        let better = best.as_ref().is_none_or(|b| region.area > b.area);
        if better {
            best = Some(region);
        }
    }

    let best = best.ok_or(RectifyError::NoRegionFound)?;
    debug!(
        "largest of {} regions: area {:.1}, {} boundary points",
        count,
        best.area,
        best.boundary.len()
    );
    Ok(best)
}

/// Trace the outer boundary of the component containing `start`, which must be
/// the component's first pixel in raster order (so its west and northern
/// neighbours are background).
fn trace_outer_boundary(mask: &Mask, start: Point2<i32>, pixel_count: usize) -> Vec<Point2<i32>> {
    let mut boundary = vec![start];
    let mut cur = start;
    let mut dir = EAST;
    let mut first_move: Option<usize> = None;

    // each boundary pixel is entered at most 4 times
    let max_steps = 4 * pixel_count + 8;
    for _ in 0..max_steps {
        let next = (0..8)
            .map(|i| (dir + 6 + i) % 8)
            .find(|&d| mask.is_set_i(cur.x + DIRS[d].0, cur.y + DIRS[d].1));

        let Some(d) = next else {
            break; // isolated pixel
        };

        if cur == start {
            match first_move {
                None => first_move = Some(d),
                Some(f) if f == d => break,
                Some(_) => {}
            }
        }

        cur = Point2::new(cur.x + DIRS[d].0, cur.y + DIRS[d].1);
        dir = d;
        boundary.push(cur);
    }

    if boundary.len() > 1 && boundary.last() == Some(&start) {
        boundary.pop();
    }
    boundary
}
