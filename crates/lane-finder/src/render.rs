//! Top-down lane overlay and its projection onto the camera frame.
//!
//! Overlay colours are kept dark: the default blend scales the overlay by 4
//! before adding it to the frame.

use lane_finder_core::RgbImage;
use lane_finder_detect::{FrameDetection, LaneSide, MetricFrame, WaypointParams, Window};

use crate::{BlendWeights, Rectifier};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub lane_area: [u8; 3],
    pub left_pixels: [u8; 3],
    pub right_pixels: [u8; 3],
    pub windows: [u8; 3],
    pub waypoints: [u8; 3],
    pub waypoint_radius: i64,
    /// Draw every n-th waypoint.
    pub waypoint_step: usize,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            lane_area: [0, 40, 0],
            left_pixels: [63, 0, 0],
            right_pixels: [0, 0, 63],
            windows: [30, 30, 30],
            waypoints: [63, 63, 0],
            waypoint_radius: 3,
            waypoint_step: 20,
        }
    }
}

fn draw_window_outline(img: &mut RgbImage, w: &Window, rgb: [u8; 3]) {
    let (x0, x1) = (w.x_start as i64, w.x_end as i64);
    let (y0, y1) = (w.y_top as i64, w.y_bottom as i64);
    img.fill_rect(x0, y0, x1, y0 + 1, rgb);
    img.fill_rect(x0, y1 - 1, x1, y1, rgb);
    img.fill_rect(x0, y0, x0 + 1, y1, rgb);
    img.fill_rect(x1 - 1, y0, x1, y1, rgb);
}

/// Black top-down image with the lane area, windows, lane pixels and
/// waypoints of `det` drawn in.
pub fn render_overlay(
    det: &FrameDetection,
    waypoint_params: &WaypointParams,
    style: &OverlayStyle,
) -> RgbImage {
    let (w, h) = (det.mask.width, det.mask.height);
    let mut img = RgbImage::new(w, h);

    // Lane area exists only where both curves are sampled.
    if let (Some(l), Some(r)) = (det.left.fit(), det.right.fit()) {
        for y in l.y_top.max(r.y_top)..l.y_end().min(r.y_end()) {
            let (Some(xl), Some(xr)) = (l.x_at_row(y), r.x_at_row(y)) else {
                continue;
            };
            if !(xl.is_finite() && xr.is_finite()) {
                continue;
            }
            let (a, b) = (xl.min(xr).round() as i64, xl.max(xr).round() as i64);
            img.fill_rect(a, y as i64, b + 1, y as i64 + 1, style.lane_area);
        }
    }

    for side in LaneSide::BOTH {
        let result = det.lane(side);
        let rgb = match side {
            LaneSide::Left => style.left_pixels,
            LaneSide::Right => style.right_pixels,
        };
        for win in &result.lane.windows {
            draw_window_outline(&mut img, win, style.windows);
        }
        for p in &result.lane.pixels {
            img.put_clipped(p.x as i64, p.y as i64, rgb);
        }
    }

    let frame = MetricFrame::new(w, h, waypoint_params);
    let r = style.waypoint_radius;
    for wp in det.waypoints.iter().step_by(style.waypoint_step.max(1)) {
        let p = frame.to_pixel(*wp);
        let (cx, cy) = (p.x.round() as i64, p.y.round() as i64);
        img.fill_rect(cx - r, cy - r, cx + r + 1, cy + r + 1, style.waypoints);
    }
    img
}

/// Warp `overlay` back into the camera view and blend it onto `frame`.
pub fn annotate_frame<R: Rectifier + ?Sized>(
    frame: &RgbImage,
    overlay: &RgbImage,
    rectifier: &R,
    blend: &BlendWeights,
) -> RgbImage {
    let projected = rectifier.inverse_rectify(&overlay.view(), frame.width, frame.height);
    frame
        .blend(&projected, blend.frame_weight, blend.overlay_weight)
        .unwrap_or_else(|| frame.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_finder_core::{BinaryMask, PerspectiveWarp};
    use lane_finder_detect::{LaneFinder, LaneFinderParams};

    fn detection() -> FrameDetection {
        let finder = LaneFinder::new(LaneFinderParams::default()).expect("finder");
        finder.detect_mask(BinaryMask::from_fn(1280, 720, |x, _| x == 300 || x == 900))
    }

    #[test]
    fn overlay_marks_area_pixels_and_waypoints() {
        let det = detection();
        let style = OverlayStyle::default();
        let img = render_overlay(&det, &WaypointParams::default(), &style);
        assert_eq!((img.width, img.height), (1280, 720));
        assert_eq!(img.get(300, 500), style.left_pixels);
        assert_eq!(img.get(900, 500), style.right_pixels);
        assert_eq!(img.get(450, 500), style.lane_area);
        // First waypoint sits on the bottom row at the centreline.
        assert_eq!(img.get(600, 719), style.waypoints);
        assert_eq!(img.get(100, 500), [0, 0, 0]);
    }

    #[test]
    fn empty_detection_renders_black_overlay() {
        let finder = LaneFinder::new(LaneFinderParams::default()).expect("finder");
        let det = finder.detect_mask(BinaryMask::new(64, 48));
        let img = render_overlay(&det, &WaypointParams::default(), &OverlayStyle::default());
        // Only window outlines remain.
        assert!(img.data.iter().all(|&v| v == 0 || v == 30));
    }

    #[test]
    fn identity_annotation_adds_scaled_overlay() {
        let frame = RgbImage::from_pixel(8, 6, [10, 20, 30]);
        let mut overlay = RgbImage::new(8, 6);
        overlay.put(2, 3, [0, 40, 0]);
        let out = annotate_frame(
            &frame,
            &overlay,
            &PerspectiveWarp::identity(8, 6),
            &BlendWeights::default(),
        );
        assert_eq!(out.get(2, 3), [10, 180, 30]);
        assert_eq!(out.get(0, 0), [10, 20, 30]);
    }
}
