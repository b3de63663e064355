//! JSON configuration and run reports.

use std::{
    fs,
    path::{Path, PathBuf},
};

use lane_finder_core::{PerspectiveWarp, WarpError};
use lane_finder_detect::{
    FrameDetection, InvalidInput, LaneFinder, LaneFinderParams, LaneSide, LaneStatus, Marking,
    MarkingThresholds, Quadratic, Waypoint,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error(transparent)]
    Warp(#[from] WarpError),
    #[error("blend weights must be finite and non-negative (frame={frame}, overlay={overlay})")]
    InvalidBlend { frame: f32, overlay: f32 },
}

fn default_rectified_width() -> usize {
    1280
}

fn default_rectified_height() -> usize {
    720
}

/// Four road points in the camera image and where they land in the
/// rectified view. Pixel coordinates, `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveConfig {
    pub source_points: [[f32; 2]; 4],
    pub destination_points: [[f32; 2]; 4],
}

impl PerspectiveConfig {
    pub fn build(&self, width: usize, height: usize) -> Result<PerspectiveWarp, WarpError> {
        let to_points = |pts: &[[f32; 2]; 4]| pts.map(|[x, y]| Point2::new(x, y));
        PerspectiveWarp::from_points(
            &to_points(&self.source_points),
            &to_points(&self.destination_points),
            width,
            height,
        )
    }
}

/// `frame * frame_weight + overlay * overlay_weight`, saturated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub frame_weight: f32,
    pub overlay_weight: f32,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            frame_weight: 1.0,
            overlay_weight: 4.0,
        }
    }
}

/// Configuration for a lane-finding run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneFinderConfig {
    /// `None` means input frames are already top-down.
    #[serde(default)]
    pub perspective: Option<PerspectiveConfig>,
    #[serde(default = "default_rectified_width")]
    pub rectified_width: usize,
    #[serde(default = "default_rectified_height")]
    pub rectified_height: usize,
    #[serde(default)]
    pub finder: LaneFinderParams,
    #[serde(default)]
    pub blend: BlendWeights,
    #[serde(default)]
    pub frames_dir: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub report_path: Option<String>,
}

impl Default for LaneFinderConfig {
    fn default() -> Self {
        Self {
            perspective: None,
            rectified_width: default_rectified_width(),
            rectified_height: default_rectified_height(),
            finder: LaneFinderParams::default(),
            blend: BlendWeights::default(),
            frames_dir: None,
            output_dir: None,
            report_path: None,
        }
    }
}

impl LaneFinderConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Replace the thresholds for `marking` with a set stored in its own file.
    pub fn load_thresholds(
        &mut self,
        marking: Marking,
        path: impl AsRef<Path>,
    ) -> Result<(), ConfigError> {
        let thresholds = load_marking_thresholds(path)?;
        thresholds.validate(marking)?;
        match marking {
            Marking::Yellow => self.finder.thresholds.yellow = thresholds,
            Marking::White => self.finder.thresholds.white = thresholds,
        }
        Ok(())
    }

    /// Resolve the report path.
    pub fn report_path(&self) -> PathBuf {
        self.report_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("lane_finder_report.json"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.finder.validate()?;
        let BlendWeights {
            frame_weight,
            overlay_weight,
        } = self.blend;
        let ok = |w: f32| w.is_finite() && w >= 0.0;
        if !ok(frame_weight) || !ok(overlay_weight) {
            return Err(ConfigError::InvalidBlend {
                frame: frame_weight,
                overlay: overlay_weight,
            });
        }
        self.build_warp()?;
        Ok(())
    }

    /// Camera -> top-down warp; identity when no perspective is configured.
    pub fn build_warp(&self) -> Result<PerspectiveWarp, ConfigError> {
        let (w, h) = (self.rectified_width, self.rectified_height);
        match &self.perspective {
            Some(p) => Ok(p.build(w, h)?),
            None if w == 0 || h == 0 => Err(WarpError::EmptyTarget {
                width: w,
                height: h,
            }
            .into()),
            None => Ok(PerspectiveWarp::identity(w, h)),
        }
    }

    pub fn build_finder(&self) -> Result<LaneFinder, ConfigError> {
        Ok(LaneFinder::new(self.finder.clone())?)
    }
}

/// Read a single marking threshold set from JSON.
pub fn load_marking_thresholds(path: impl AsRef<Path>) -> Result<MarkingThresholds, ConfigError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneReport {
    pub side: LaneSide,
    pub status: LaneStatus,
    #[serde(default)]
    pub peak_column: Option<usize>,
    pub pixel_count: usize,
    #[serde(default)]
    pub curve: Option<Quadratic>,
    #[serde(default)]
    pub rms_px: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub index: usize,
    pub left: LaneReport,
    pub right: LaneReport,
    /// Waypoints produced for the frame, kept or not.
    #[serde(default)]
    pub waypoint_count: usize,
    /// Empty when the run did not keep waypoints.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl FrameReport {
    /// Summarise `det`; its waypoints are copied only when `keep_waypoints`.
    pub fn from_detection(index: usize, det: &FrameDetection, keep_waypoints: bool) -> Self {
        let lane = |side| {
            let r = det.lane(side);
            LaneReport {
                side,
                status: r.status(),
                peak_column: r.peak.map(|p| p.column),
                pixel_count: r.lane.pixels.len(),
                curve: r.fit().map(|f| f.curve),
                rms_px: r.fit().map(|f| f.rms_px),
            }
        };
        Self {
            index,
            left: lane(LaneSide::Left),
            right: lane(LaneSide::Right),
            waypoint_count: det.waypoints.len(),
            waypoints: if keep_waypoints {
                det.waypoints.clone()
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub config_path: Option<String>,
    pub num_frames: usize,
    pub processing_seconds: f64,
    /// `None` when no time was measured.
    #[serde(default)]
    pub fps: Option<f64>,
    pub frames: Vec<FrameReport>,
}

impl RunReport {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
