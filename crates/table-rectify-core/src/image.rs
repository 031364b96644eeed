use serde::{Deserialize, Serialize};

/// Channel order of an interleaved 8-bit, 3-channel buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    #[default]
    Rgb8,
    Bgr8,
}

impl PixelLayout {
    /// Reorder a stored pixel into `[r, g, b]`.
    #[inline]
    pub fn to_rgb(self, px: [u8; 3]) -> [u8; 3] {
        match self {
            PixelLayout::Rgb8 => px,
            PixelLayout::Bgr8 => [px[2], px[1], px[0]],
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ColorImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub data: &'a [u8], // row-major, interleaved, len = w*h*3
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorImage {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl<'a> ColorImageView<'a> {
    pub fn new(width: usize, height: usize, layout: PixelLayout, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            layout,
            data,
        }
    }

    /// Expected buffer length for the declared dimensions, `None` on overflow.
    pub fn expected_len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)?.checked_mul(3)
    }

    /// Stored pixel at `(x, y)` in the buffer's own channel order.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

impl ColorImage {
    /// Black image of the given size.
    pub fn new(width: usize, height: usize, layout: PixelLayout) -> Self {
        Self {
            width,
            height,
            layout,
            data: vec![0u8; width * height * 3],
        }
    }

    pub fn view(&self) -> ColorImageView<'_> {
        ColorImageView {
            width: self.width,
            height: self.height,
            layout: self.layout,
            data: &self.data,
        }
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, px: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&px);
    }
}

/// Binary membership field, one byte per pixel (0 or 255).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    /// Signed lookup; anything outside the mask is background.
    #[inline]
    pub fn is_set_i(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.is_set(x as usize, y as usize)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        self.data[y * self.width + x] = if on { 255 } else { 0 };
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

#[inline]
fn get_px(src: &ColorImageView<'_>, x: i32, y: i32) -> [f32; 3] {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return [0.0; 3];
    }
    let p = src.pixel(x as usize, y as usize);
    [p[0] as f32, p[1] as f32, p[2] as f32]
}

/// Bilinear sample of all three channels, in the buffer's channel order.
///
/// Coordinates more than one pixel outside the image, or not finite, are
/// black.
#[inline]
pub fn sample_bilinear(src: &ColorImageView<'_>, x: f32, y: f32) -> [f32; 3] {
    let inside = x >= -1.0 && y >= -1.0 && x <= src.width as f32 && y <= src.height as f32;
    if !inside {
        return [0.0; 3];
    }
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_px(src, x0, y0);
    let p10 = get_px(src, x0 + 1, y0);
    let p01 = get_px(src, x0, y0 + 1);
    let p11 = get_px(src, x0 + 1, y0 + 1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let a = p00[c] + fx * (p10[c] - p00[c]);
        let b = p01[c] + fx * (p11[c] - p01[c]);
        out[c] = a + fy * (b - a);
    }
    out
}

#[inline]
pub fn sample_bilinear_u8(src: &ColorImageView<'_>, x: f32, y: f32) -> [u8; 3] {
    sample_bilinear(src, x, y).map(|v| v.round().clamp(0.0, 255.0) as u8)
}
