//! Sliding-window lane finder for rectified (bird's-eye) road frames.
//!
//! ## Quickstart
//!
//! ```
//! use lane_finder_core::BinaryMask;
//! use lane_finder_detect::{LaneFinder, LaneFinderParams, LaneStatus};
//!
//! let finder = LaneFinder::new(LaneFinderParams::default()).unwrap();
//! let mask = BinaryMask::from_fn(1280, 720, |x, _| x == 300 || x == 900);
//! let det = finder.detect_mask(mask);
//! assert_eq!(det.left.status(), LaneStatus::Fitted);
//! assert_eq!(det.waypoints.len(), 720);
//! ```
//!
//! Stages, each usable on its own:
//! 1. [`threshold_frame`]: colour + gradient tests for yellow and white markings.
//! 2. [`find_lane_peaks`]: column histogram of the lower half, one peak per half.
//! 3. [`track_lanes`]: a stack of windows per lane, recentred on dense bands.
//! 4. [`fit_lane`]: least-squares `x = a·y² + b·y + c` per lane.
//! 5. [`generate_waypoints`]: centreline between the curves, in metres.
//!
//! Every frame is independent: no lane state survives between calls.

mod error;
mod finder;
mod histogram;
mod params;
mod polyfit;
mod threshold;
mod waypoints;
mod window;

pub use error::InvalidInput;
pub use finder::{FrameDetection, LaneFinder, LaneOutcome, LaneResult, LaneStatus};
pub use histogram::{column_histogram, find_lane_peaks, half_columns, half_midpoint, LanePeaks, Peak};
pub use params::{
    GradientRange, LaneFinderParams, Marking, MarkingThresholds, ThresholdParams, WaypointParams,
    WindowParams,
};
pub use polyfit::{fit_lane, fit_quadratic, LaneFit, Quadratic, MIN_DISTINCT_ROWS};
pub use threshold::threshold_frame;
pub use waypoints::{centerline_pixels, generate_waypoints, MetricFrame, Waypoint};
pub use window::{band_rows, track_lane, track_lanes, Lane, LaneSide, Window};
