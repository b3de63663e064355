//! Row-major image buffers used across the lane finder.
//!
//! Owned buffers (`RgbImage`, `GrayImage`, `BinaryMask`) and borrowed views
//! (`RgbImageView`, `GrayImageView`). Views carry no invariants of their own;
//! call [`RgbImageView::check`] before trusting `data.len()`.

/// Errors for image buffers whose shape does not match their data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageBufferError {
    #[error("empty image (width={width}, height={height})")]
    Empty { width: usize, height: usize },
    #[error("image buffer length mismatch (expected {expected} bytes, got {got})")]
    Length { expected: usize, got: usize },
}

fn check_shape(
    width: usize,
    height: usize,
    channels: usize,
    len: usize,
) -> Result<(), ImageBufferError> {
    if width == 0 || height == 0 {
        return Err(ImageBufferError::Empty { width, height });
    }
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(ImageBufferError::Empty { width, height })?;
    if len != expected {
        return Err(ImageBufferError::Length { expected, got: len });
    }
    Ok(())
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn check(&self) -> Result<(), ImageBufferError> {
        check_shape(self.width, self.height, 1, self.data.len())
    }
}

/// Interleaved 8-bit RGB view, `len = w*h*3`.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

#[derive(Clone, Debug, PartialEq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    /// Black image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn from_pixel(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        self.view().get(x, y)
    }

    #[inline]
    pub fn put(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Bounds-checked `put` for signed drawing coordinates.
    #[inline]
    pub fn put_clipped(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.put(x as usize, y as usize, rgb);
        }
    }

    /// Fill an axis-aligned rectangle `[x0, x1) × [y0, y1)`, clipped to the image.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, rgb: [u8; 3]) {
        let x0 = x0.clamp(0, self.width as i64) as usize;
        let x1 = x1.clamp(0, self.width as i64) as usize;
        let y0 = y0.clamp(0, self.height as i64) as usize;
        let y1 = y1.clamp(0, self.height as i64) as usize;
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, rgb);
            }
        }
    }

    /// Per-pixel `self * alpha + other * beta`, saturated to `u8`.
    ///
    /// Returns `None` when the two images differ in size.
    pub fn blend(&self, other: &RgbImage, alpha: f32, beta: f32) -> Option<RgbImage> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| (a as f32 * alpha + b as f32 * beta).round().clamp(0.0, 255.0) as u8)
            .collect();
        Some(RgbImage {
            width: self.width,
            height: self.height,
            data,
        })
    }
}

impl RgbImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn check(&self) -> Result<(), ImageBufferError> {
        check_shape(self.width, self.height, 3, self.data.len())
    }

    pub fn to_owned_image(&self) -> RgbImage {
        RgbImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

#[inline]
fn get_rgb(src: &RgbImageView<'_>, x: i32, y: i32) -> [f32; 3] {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return [0.0; 3];
    }
    let [r, g, b] = src.get(x as usize, y as usize);
    [r as f32, g as f32, b as f32]
}

/// Bilinear RGB sample; pixels outside the image read as black.
#[inline]
pub fn sample_bilinear_rgb(src: &RgbImageView<'_>, x: f32, y: f32) -> [u8; 3] {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_rgb(src, x0, y0);
    let p10 = get_rgb(src, x0 + 1, y0);
    let p01 = get_rgb(src, x0, y0 + 1);
    let p11 = get_rgb(src, x0 + 1, y0 + 1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let a = p00[c] + fx * (p10[c] - p00[c]);
        let b = p01[c] + fx * (p11[c] - p01[c]);
        out[c] = (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Boolean pixel grid; `true` marks a candidate lane pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    data: Vec<bool>,
}

impl BinaryMask {
    /// All-clear mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        self.data[y * self.width + x] = value;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[bool] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Render as a 0/255 grayscale image.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| if v { 255 } else { 0 }).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_rejects_empty_and_short_buffers() {
        let empty = RgbImageView {
            width: 0,
            height: 4,
            data: &[],
        };
        assert!(matches!(
            empty.check(),
            Err(ImageBufferError::Empty { width: 0, height: 4 })
        ));

        let data = vec![0u8; 11];
        let short = RgbImageView {
            width: 2,
            height: 2,
            data: &data,
        };
        assert_eq!(
            short.check(),
            Err(ImageBufferError::Length {
                expected: 12,
                got: 11
            })
        );
    }

    #[test]
    fn bilinear_sample_hits_pixel_centres_exactly() {
        let mut img = RgbImage::new(3, 2);
        img.put(1, 1, [10, 20, 30]);
        assert_eq!(sample_bilinear_rgb(&img.view(), 1.0, 1.0), [10, 20, 30]);
        assert_eq!(sample_bilinear_rgb(&img.view(), -5.0, 0.0), [0, 0, 0]);
        assert_eq!(sample_bilinear_rgb(&img.view(), 1.5, 1.0), [5, 10, 15]);
    }

    #[test]
    fn blend_saturates() {
        let a = RgbImage::from_pixel(2, 1, [200, 10, 0]);
        let b = RgbImage::from_pixel(2, 1, [0, 60, 0]);
        let out = a.blend(&b, 1.0, 4.0).expect("same size");
        assert_eq!(out.get(0, 0), [200, 250, 0]);
        assert!(a.blend(&RgbImage::new(1, 1), 1.0, 1.0).is_none());
    }

    #[test]
    fn mask_rows_and_counts() {
        let mask = BinaryMask::from_fn(4, 3, |x, y| x == y);
        assert_eq!(mask.count_set(), 3);
        assert_eq!(mask.row(1), &[false, true, false, false]);
        assert_eq!(mask.to_gray().data[0], 255);
    }
}
