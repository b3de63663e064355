//! Colour-space conversion and gradient primitives.
//!
//! HSV uses the common 8-bit convention: hue in `[0, 180)` (degrees / 2),
//! saturation and value in `[0, 255]`.

use crate::{GrayImage, GrayImageView, RgbImageView};

/// Exclusive upper bound of the 8-bit hue channel.
pub const HUE_RANGE: u8 = 180;

const SOBEL_KERNEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];

/// Convert one RGB pixel to 8-bit HSV.
#[inline]
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { diff / v * 255.0 } else { 0.0 };

    let h_deg = if diff <= 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };
    let h = (h_deg / 2.0).round() as u32 % HUE_RANGE as u32;

    [h as u8, s.round() as u8, v as u8]
}

/// Convert a whole frame; output is interleaved HSV with the input's layout.
pub fn rgb_to_hsv_image(src: &RgbImageView<'_>) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.data.len());
    for px in src.data.chunks_exact(3) {
        out.extend_from_slice(&rgb_to_hsv([px[0], px[1], px[2]]));
    }
    out
}

/// The HSV value channel (`max(r, g, b)`) as a grayscale image.
pub fn value_channel(src: &RgbImageView<'_>) -> GrayImage {
    GrayImage {
        width: src.width,
        height: src.height,
        data: src
            .data
            .chunks_exact(3)
            .map(|px| px[0].max(px[1]).max(px[2]))
            .collect(),
    }
}

/// Absolute horizontal Sobel response, scaled so the strongest edge maps to 255.
///
/// Borders are clamped. A flat image yields all zeros.
pub fn scaled_sobel_x(src: &GrayImageView<'_>) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let mut mag = vec![0u32; w * h];
    let mut max_mag = 0u32;
    for y in 0..h {
        let ys = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        for x in 0..w {
            let xs = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
            let mut sum = 0i32;
            for (ky, &yy) in ys.iter().enumerate() {
                for (kx, &xx) in xs.iter().enumerate() {
                    sum += SOBEL_KERNEL_X[ky][kx] * src.get(xx, yy) as i32;
                }
            }
            let m = sum.unsigned_abs();
            max_mag = max_mag.max(m);
            mag[y * w + x] = m;
        }
    }

    if max_mag == 0 {
        return out;
    }
    for (dst, &m) in out.data.iter_mut().zip(&mag) {
        *dst = ((m as u64 * 255 + max_mag as u64 / 2) / max_mag as u64) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RgbImage;

    #[test]
    fn primary_and_marking_colours() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([255, 255, 255]), [0, 0, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);

        let [h, s, v] = rgb_to_hsv([255, 210, 0]);
        assert_eq!(h, 25);
        assert_eq!(s, 255);
        assert_eq!(v, 255);
    }

    #[test]
    fn sobel_responds_only_at_vertical_edges() {
        let mut img = RgbImage::from_pixel(8, 4, [20, 20, 20]);
        for y in 0..4 {
            for x in 4..8 {
                img.put(x, y, [220, 220, 220]);
            }
        }
        let v = value_channel(&img.view());
        let g = scaled_sobel_x(&v.view());
        assert_eq!(g.data[2 * 8 + 3], 255);
        assert_eq!(g.data[2 * 8 + 4], 255);
        assert_eq!(g.data[2 * 8], 0);
        assert_eq!(g.data[2 * 8 + 7], 0);
    }

    #[test]
    fn flat_image_has_no_gradient() {
        let v = GrayImage {
            width: 5,
            height: 5,
            data: vec![90; 25],
        };
        assert!(scaled_sobel_x(&v.view()).data.iter().all(|&g| g == 0));
    }
}
