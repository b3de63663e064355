use lane_finder_core::ImageBufferError;

use crate::params::Marking;

/// Malformed frame or configuration. Fatal to a run.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    #[error("invalid frame: {0}")]
    Frame(#[from] ImageBufferError),

    #[error("{marking} thresholds: hsv_min[{channel}]={min} exceeds hsv_max[{channel}]={max}")]
    InvertedHsvRange {
        marking: Marking,
        channel: usize,
        min: u8,
        max: u8,
    },

    #[error("{marking} thresholds: hue bound {value} outside [0, 180)")]
    HueOutOfRange { marking: Marking, value: u8 },

    #[error("{marking} thresholds: gradient min {min} exceeds max {max}")]
    InvertedGradientRange { marking: Marking, min: u8, max: u8 },

    #[error("window count must be at least 1")]
    NoWindows,

    #[error("window half-width must be at least 1 pixel")]
    ZeroHalfWidth,

    #[error("{name} must be finite and positive (got {value})")]
    NonPositive { name: &'static str, value: f64 },

    #[error("waypoint stride must be at least 1 pixel")]
    ZeroStride,
}
