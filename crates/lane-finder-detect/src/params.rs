use std::fmt;

use lane_finder_core::HUE_RANGE;
use serde::{Deserialize, Serialize};

use crate::InvalidInput;

/// Lane marking colour a threshold set is tuned for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marking {
    Yellow,
    White,
}

impl fmt::Display for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Marking::Yellow => "yellow",
            Marking::White => "white",
        })
    }
}

/// Inclusive range on the scaled horizontal gradient (0..=255).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientRange {
    pub min: u8,
    pub max: u8,
    /// Minimal HSV value for a gradient hit to count; keeps dark pavement
    /// texture out of the mask.
    #[serde(default)]
    pub min_value: u8,
}

impl GradientRange {
    #[inline]
    pub fn contains(&self, gradient: u8, value: u8) -> bool {
        (self.min..=self.max).contains(&gradient) && value >= self.min_value
    }
}

/// Colour box plus optional gradient test for one marking colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingThresholds {
    /// Inclusive lower HSV bound (H in `[0, 180)`).
    pub hsv_min: [u8; 3],
    /// Inclusive upper HSV bound.
    pub hsv_max: [u8; 3],
    #[serde(default)]
    pub gradient: Option<GradientRange>,
}

impl MarkingThresholds {
    pub fn yellow() -> Self {
        Self {
            hsv_min: [15, 80, 100],
            hsv_max: [35, 255, 255],
            gradient: None,
        }
    }

    pub fn white() -> Self {
        Self {
            hsv_min: [0, 0, 200],
            hsv_max: [179, 40, 255],
            gradient: Some(GradientRange {
                min: 50,
                max: 255,
                min_value: 160,
            }),
        }
    }

    #[inline]
    pub fn contains_hsv(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|k| self.hsv_min[k] <= hsv[k] && hsv[k] <= self.hsv_max[k])
    }

    /// Colour test OR gradient test; `gradient` is `None` when not computed.
    #[inline]
    pub fn accepts(&self, hsv: [u8; 3], gradient: Option<u8>) -> bool {
        if self.contains_hsv(hsv) {
            return true;
        }
        match (self.gradient, gradient) {
            (Some(range), Some(g)) => range.contains(g, hsv[2]),
            _ => false,
        }
    }

    pub fn validate(&self, marking: Marking) -> Result<(), InvalidInput> {
        for value in [self.hsv_min[0], self.hsv_max[0]] {
            if value >= HUE_RANGE {
                return Err(InvalidInput::HueOutOfRange { marking, value });
            }
        }
        for channel in 0..3 {
            let (min, max) = (self.hsv_min[channel], self.hsv_max[channel]);
            if min > max {
                return Err(InvalidInput::InvertedHsvRange {
                    marking,
                    channel,
                    min,
                    max,
                });
            }
        }
        if let Some(g) = self.gradient {
            if g.min > g.max {
                return Err(InvalidInput::InvertedGradientRange {
                    marking,
                    min: g.min,
                    max: g.max,
                });
            }
        }
        Ok(())
    }
}

/// The two per-colour threshold sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdParams {
    pub yellow: MarkingThresholds,
    pub white: MarkingThresholds,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            yellow: MarkingThresholds::yellow(),
            white: MarkingThresholds::white(),
        }
    }
}

impl ThresholdParams {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        self.yellow.validate(Marking::Yellow)?;
        self.white.validate(Marking::White)
    }

    pub fn uses_gradient(&self) -> bool {
        self.yellow.gradient.is_some() || self.white.gradient.is_some()
    }
}

/// Sliding-window search settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParams {
    /// Number of vertical bands (one window per band).
    pub count: usize,
    /// Window half-width in pixels.
    pub half_width: usize,
    /// Pixels a window must collect before the next one is recentred.
    pub min_pixels: usize,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            count: 9,
            half_width: 100,
            min_pixels: 75,
        }
    }
}

impl WindowParams {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.count == 0 {
            return Err(InvalidInput::NoWindows);
        }
        if self.half_width == 0 {
            return Err(InvalidInput::ZeroHalfWidth);
        }
        Ok(())
    }
}

/// Pixel-to-metre conversion and path sampling.
///
/// The rectified view is not isotropic, so the lateral and forward axes have
/// separate scales.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointParams {
    /// Rectified pixels per metre across the road.
    pub px_per_m_lateral: f64,
    /// Rectified pixels per metre along the road.
    pub px_per_m_forward: f64,
    /// Lane width used to project a centreline from a single lane curve.
    pub lane_width_m: f64,
    /// Row step between consecutive waypoints.
    pub stride_px: usize,
}

impl Default for WaypointParams {
    fn default() -> Self {
        Self {
            px_per_m_lateral: 700.0 / 3.7,
            px_per_m_forward: 720.0 / 30.0,
            lane_width_m: 3.7,
            stride_px: 1,
        }
    }
}

impl WaypointParams {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        for (name, value) in [
            ("px_per_m_lateral", self.px_per_m_lateral),
            ("px_per_m_forward", self.px_per_m_forward),
            ("lane_width_m", self.lane_width_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(InvalidInput::NonPositive { name, value });
            }
        }
        if self.stride_px == 0 {
            return Err(InvalidInput::ZeroStride);
        }
        Ok(())
    }

    /// Lane width in lateral pixels.
    pub fn lane_width_px(&self) -> f64 {
        self.lane_width_m * self.px_per_m_lateral
    }
}

/// Everything the per-frame lane finder is configured with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneFinderParams {
    #[serde(default)]
    pub thresholds: ThresholdParams,
    #[serde(default)]
    pub windows: WindowParams,
    #[serde(default)]
    pub waypoints: WaypointParams,
}

impl LaneFinderParams {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        self.thresholds.validate()?;
        self.windows.validate()?;
        self.waypoints.validate()
    }
}
