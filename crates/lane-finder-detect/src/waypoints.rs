//! Centreline path between the fitted lanes, in metres.
//!
//! Vehicle frame: origin at the bottom-centre of the rectified view, lateral
//! axis to the right, forward axis up the image.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{LaneFit, WaypointParams};

/// Point on the intended path relative to the vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lateral_m: f64,
    pub forward_m: f64,
}

/// Pixel <-> metre conversion for a rectified frame of `width × height`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricFrame {
    pub origin_x: f64,
    pub bottom_row: f64,
    pub px_per_m_lateral: f64,
    pub px_per_m_forward: f64,
}

impl MetricFrame {
    pub fn new(width: usize, height: usize, params: &WaypointParams) -> Self {
        Self {
            origin_x: width as f64 / 2.0,
            bottom_row: height.saturating_sub(1) as f64,
            px_per_m_lateral: params.px_per_m_lateral,
            px_per_m_forward: params.px_per_m_forward,
        }
    }

    pub fn to_metric(&self, p: Point2<f64>) -> Waypoint {
        Waypoint {
            lateral_m: (p.x - self.origin_x) / self.px_per_m_lateral,
            forward_m: (self.bottom_row - p.y) / self.px_per_m_forward,
        }
    }

    pub fn to_pixel(&self, w: Waypoint) -> Point2<f64> {
        Point2::new(
            self.origin_x + w.lateral_m * self.px_per_m_lateral,
            self.bottom_row - w.forward_m * self.px_per_m_forward,
        )
    }
}

/// Pixel-space centreline, nearest row first.
///
/// With both lanes the centre is their midpoint over the rows both curves
/// cover. With one lane it is that curve shifted half a lane width towards
/// the other side. Non-finite points are dropped.
pub fn centerline_pixels(
    left: Option<&LaneFit>,
    right: Option<&LaneFit>,
    params: &WaypointParams,
) -> Vec<Point2<f64>> {
    let half_lane = params.lane_width_px() / 2.0;
    let (y_top, y_end) = match (left, right) {
        (Some(l), Some(r)) => (l.y_top.max(r.y_top), l.y_end().min(r.y_end())),
        (Some(f), None) | (None, Some(f)) => (f.y_top, f.y_end()),
        (None, None) => return Vec::new(),
    };

    let center_at = |y: usize| -> Option<f64> {
        match (left, right) {
            (Some(l), Some(r)) => Some((l.x_at_row(y)? + r.x_at_row(y)?) / 2.0),
            (Some(l), None) => Some(l.x_at_row(y)? + half_lane),
            (None, Some(r)) => Some(r.x_at_row(y)? - half_lane),
            (None, None) => None,
        }
    };

    (y_top..y_end)
        .rev()
        .step_by(params.stride_px.max(1))
        .filter_map(|y| {
            let x = center_at(y)?;
            x.is_finite().then(|| Point2::new(x, y as f64))
        })
        .collect()
}

/// Metric waypoints, strictly increasing in forward distance.
pub fn generate_waypoints(
    left: Option<&LaneFit>,
    right: Option<&LaneFit>,
    width: usize,
    height: usize,
    params: &WaypointParams,
) -> Vec<Waypoint> {
    let frame = MetricFrame::new(width, height, params);
    centerline_pixels(left, right, params)
        .into_iter()
        .map(|p| frame.to_metric(p))
        .collect()
}
