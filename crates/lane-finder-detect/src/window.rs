//! Sliding-window lane tracking.
//!
//! The mask is cut into `count` horizontal bands. Each lane walks one window
//! per band from the bottom up, collecting set pixels; a window with at least
//! `min_pixels` hits moves the next window to the mean x of those hits,
//! otherwise the next window keeps the current centre.

use lane_finder_core::BinaryMask;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{LanePeaks, WindowParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSide {
    Left,
    Right,
}

impl LaneSide {
    pub const BOTH: [LaneSide; 2] = [LaneSide::Left, LaneSide::Right];
}

/// One search rectangle: rows `[y_top, y_bottom)`, columns `[x_start, x_end)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// 0 is the bottom band.
    pub band: usize,
    pub center_x: f64,
    pub half_width: usize,
    pub y_top: usize,
    pub y_bottom: usize,
    pub x_start: usize,
    pub x_end: usize,
    /// Set pixels found inside the window.
    pub pixel_count: usize,
}

/// Windows and collected pixels of one lane in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    pub side: LaneSide,
    /// Bottom band first.
    pub windows: Vec<Window>,
    pub pixels: Vec<Point2<u32>>,
}

impl Lane {
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Top row of the highest window that collected any pixel.
    pub fn top_detected_row(&self) -> Option<usize> {
        self.windows
            .iter()
            .filter(|w| w.pixel_count > 0)
            .map(|w| w.y_top)
            .min()
    }
}

/// Rows `[top, bottom)` of band `band` (0 = bottom) out of `count` bands.
///
/// Band heights differ by at most one row and together cover the mask.
pub fn band_rows(height: usize, count: usize, band: usize) -> (usize, usize) {
    let bottom = height - band * height / count;
    let top = height - (band + 1) * height / count;
    (top, bottom)
}

/// Columns `x` with `center - half_width <= x < center + half_width`, clamped.
fn window_columns(center: f64, half_width: usize, width: usize) -> (usize, usize) {
    let lo = (center - half_width as f64).ceil();
    let hi = (center + half_width as f64).ceil();
    let clamp = |v: f64| v.clamp(0.0, width as f64) as usize;
    (clamp(lo), clamp(hi))
}

/// Walk the windows of one lane upward from `start_x`.
pub fn track_lane(
    mask: &BinaryMask,
    side: LaneSide,
    start_x: f64,
    params: &WindowParams,
) -> Lane {
    let mut windows = Vec::with_capacity(params.count);
    let mut pixels = Vec::new();
    let mut center = start_x;

    for band in 0..params.count {
        let (y_top, y_bottom) = band_rows(mask.height, params.count, band);
        let (x_start, x_end) = window_columns(center, params.half_width, mask.width);

        let mut count = 0usize;
        let mut sum_x = 0u64;
        for y in y_top..y_bottom {
            let row = &mask.row(y)[x_start..x_end];
            for (dx, &set) in row.iter().enumerate() {
                if set {
                    let x = x_start + dx;
                    pixels.push(Point2::new(x as u32, y as u32));
                    sum_x += x as u64;
                    count += 1;
                }
            }
        }

        windows.push(Window {
            band,
            center_x: center,
            half_width: params.half_width,
            y_top,
            y_bottom,
            x_start,
            x_end,
            pixel_count: count,
        });

        if count > 0 && count >= params.min_pixels {
            center = sum_x as f64 / count as f64;
        }
    }

    log::debug!(
        "{side:?} lane: {} pixels over {} windows from x={start_x}",
        pixels.len(),
        windows.len()
    );
    Lane {
        side,
        windows,
        pixels,
    }
}

/// Track both lanes from their histogram seeds. The mask is only read.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, peaks, params), fields(windows = params.count))
)]
pub fn track_lanes(mask: &BinaryMask, peaks: &LanePeaks, params: &WindowParams) -> [Lane; 2] {
    let run = |side: LaneSide| track_lane(mask, side, peaks.seed(side) as f64, params);

    #[cfg(feature = "rayon")]
    {
        let (left, right) = rayon::join(|| run(LaneSide::Left), || run(LaneSide::Right));
        [left, right]
    }
    #[cfg(not(feature = "rayon"))]
    {
        [run(LaneSide::Left), run(LaneSide::Right)]
    }
}
