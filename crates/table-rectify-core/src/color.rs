//! 8-bit HSV conversion and range tests.
//!
//! Hue is stored halved, in `[0, 180)`, so that it fits a byte; saturation
//! and value span `[0, 255]`. This is the encoding most vision toolkits use
//! for 8-bit images, which keeps felt-color bounds portable between tools.

use serde::{Deserialize, Serialize};

/// Exclusive upper bound of the 8-bit hue channel.
pub const HUE_MAX: u8 = 180;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert an `[r, g, b]` triple to 8-bit HSV.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    let mut h = (h_deg / 2.0).round() as u16;
    if h >= HUE_MAX as u16 {
        h -= HUE_MAX as u16;
    }

    Hsv {
        h: h as u8,
        s: s.round().clamp(0.0, 255.0) as u8,
        v: max as u8,
    }
}

/// Inclusive lower/upper bounds in 8-bit HSV space.
///
/// When `lower[0] > upper[0]` the hue interval wraps through zero, which is
/// how reddish cloth is expressed. Saturation and value never wrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Typical green baize under indoor lighting.
    pub fn green_felt() -> Self {
        Self::new([30, 100, 100], [85, 255, 255])
    }

    #[inline]
    pub fn hue_wraps(&self) -> bool {
        self.lower[0] > self.upper[0]
    }

    #[inline]
    pub fn contains(&self, hsv: Hsv) -> bool {
        let hue_ok = if self.hue_wraps() {
            hsv.h >= self.lower[0] || hsv.h <= self.upper[0]
        } else {
            hsv.h >= self.lower[0] && hsv.h <= self.upper[0]
        };
        hue_ok
            && hsv.s >= self.lower[1]
            && hsv.s <= self.upper[1]
            && hsv.v >= self.lower[2]
            && hsv.v <= self.upper[2]
    }

    /// `false` when a saturation/value bound is inverted or hue leaves `[0, 180)`.
    pub fn is_valid(&self) -> bool {
        self.lower[0] < HUE_MAX
            && self.upper[0] < HUE_MAX
            && self.lower[1] <= self.upper[1]
            && self.lower[2] <= self.upper[2]
    }
}

impl Default for HsvRange {
    fn default() -> Self {
        Self::green_felt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_map_to_expected_hues() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv([0, 255, 0]), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv([0, 0, 255]), Hsv { h: 120, s: 255, v: 255 });
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        let hsv = rgb_to_hsv([128, 128, 128]);
        assert_eq!(hsv, Hsv { h: 0, s: 0, v: 128 });
        assert_eq!(rgb_to_hsv([0, 0, 0]), Hsv { h: 0, s: 0, v: 0 });
    }

    #[test]
    fn near_red_hue_wraps_to_zero() {
        // 359.x degrees rounds to 180, which must fold back to 0.
        let hsv = rgb_to_hsv([255, 0, 1]);
        assert!(hsv.h == 0 || hsv.h == 179, "got {}", hsv.h);
    }

    #[test]
    fn green_felt_accepts_baize_and_rejects_wood() {
        let range = HsvRange::green_felt();
        assert!(range.contains(rgb_to_hsv([20, 140, 40])));
        assert!(!range.contains(rgb_to_hsv([120, 70, 30])));
        assert!(!range.contains(rgb_to_hsv([0, 0, 0])));
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = HsvRange::new([60, 255, 255], [60, 255, 255]);
        assert!(range.contains(Hsv { h: 60, s: 255, v: 255 }));
        assert!(!range.contains(Hsv { h: 61, s: 255, v: 255 }));
    }

    #[test]
    fn wrapped_hue_range_covers_both_ends() {
        let red = HsvRange::new([170, 50, 50], [10, 255, 255]);
        assert!(red.hue_wraps());
        assert!(red.contains(Hsv { h: 175, s: 200, v: 200 }));
        assert!(red.contains(Hsv { h: 5, s: 200, v: 200 }));
        assert!(!red.contains(Hsv { h: 60, s: 200, v: 200 }));
    }

    #[test]
    fn validity_rejects_inverted_saturation() {
        assert!(HsvRange::green_felt().is_valid());
        assert!(!HsvRange::new([30, 200, 0], [85, 100, 255]).is_valid());
        assert!(!HsvRange::new([30, 0, 0], [190, 255, 255]).is_valid());
    }
}
