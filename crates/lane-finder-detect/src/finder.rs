use lane_finder_core::{BinaryMask, RgbImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    find_lane_peaks, fit_lane, generate_waypoints, threshold_frame, track_lanes, InvalidInput,
    Lane, LaneFinderParams, LaneFit, LanePeaks, LaneSide, Peak, Waypoint,
};

/// Per-lane detection status. Degraded states are values, not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneStatus {
    Fitted,
    /// Tracking collected no pixels.
    NoDetection,
    /// Pixels were found but their geometry does not define a quadratic.
    FitUndefined,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LaneOutcome {
    Fitted(LaneFit),
    NoDetection,
    FitUndefined,
}

/// Everything known about one lane in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LaneResult {
    pub side: LaneSide,
    /// Histogram peak the lane was seeded from (`None` = midpoint fallback).
    pub peak: Option<Peak>,
    pub lane: Lane,
    pub outcome: LaneOutcome,
}

impl LaneResult {
    pub fn fit(&self) -> Option<&LaneFit> {
        match &self.outcome {
            LaneOutcome::Fitted(fit) => Some(fit),
            _ => None,
        }
    }

    pub fn status(&self) -> LaneStatus {
        match self.outcome {
            LaneOutcome::Fitted(_) => LaneStatus::Fitted,
            LaneOutcome::NoDetection => LaneStatus::NoDetection,
            LaneOutcome::FitUndefined => LaneStatus::FitUndefined,
        }
    }
}

/// Result of one frame. Nothing in it is carried into the next frame.
#[derive(Clone, Debug)]
pub struct FrameDetection {
    pub mask: BinaryMask,
    pub peaks: LanePeaks,
    pub left: LaneResult,
    pub right: LaneResult,
    /// Nearest first; empty when neither lane could be fitted.
    pub waypoints: Vec<Waypoint>,
}

impl FrameDetection {
    pub fn lane(&self, side: LaneSide) -> &LaneResult {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }

    pub fn fitted_lanes(&self) -> usize {
        [&self.left, &self.right]
            .iter()
            .filter(|l| l.fit().is_some())
            .count()
    }
}

/// Per-frame lane finder: threshold -> peaks -> windows -> fits -> waypoints.
#[derive(Clone, Debug)]
pub struct LaneFinder {
    params: LaneFinderParams,
}

impl LaneFinder {
    /// Validate `params` once; a finder never holds malformed configuration.
    pub fn new(params: LaneFinderParams) -> Result<Self, InvalidInput> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &LaneFinderParams {
        &self.params
    }

    /// Run the full pipeline on a rectified (top-down) colour frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn process_frame(&self, frame: &RgbImageView<'_>) -> Result<FrameDetection, InvalidInput> {
        let mask = threshold_frame(frame, &self.params.thresholds)?;
        Ok(self.detect_mask(mask))
    }

    /// Run every stage after thresholding on an existing mask.
    pub fn detect_mask(&self, mask: BinaryMask) -> FrameDetection {
        let peaks = find_lane_peaks(&mask);
        let [left_lane, right_lane] = track_lanes(&mask, &peaks, &self.params.windows);

        let left = resolve_lane(left_lane, peaks.left, mask.height);
        let right = resolve_lane(right_lane, peaks.right, mask.height);

        let waypoints = generate_waypoints(
            left.fit(),
            right.fit(),
            mask.width,
            mask.height,
            &self.params.waypoints,
        );
        log::debug!(
            "frame lanes: left={:?} right={:?}, {} waypoints",
            left.status(),
            right.status(),
            waypoints.len()
        );

        FrameDetection {
            mask,
            peaks,
            left,
            right,
            waypoints,
        }
    }
}

fn resolve_lane(lane: Lane, peak: Option<Peak>, height: usize) -> LaneResult {
    let outcome = if lane.is_empty() {
        LaneOutcome::NoDetection
    } else {
        match fit_lane(&lane, height) {
            Some(fit) => LaneOutcome::Fitted(fit),
            None => LaneOutcome::FitUndefined,
        }
    };
    LaneResult {
        side: lane.side,
        peak,
        lane,
        outcome,
    }
}
