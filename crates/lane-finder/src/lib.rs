//! High-level facade crate for the `lane-finder-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core image/geometry crate and the lane detector
//! - JSON configuration and run reports ([`LaneFinderConfig`], [`RunReport`])
//! - a frame-at-a-time driver ([`run`]) over pluggable frame sources, sinks
//!   and perspective rectifiers
//! - (feature `image`) directory-backed frame I/O built on the `image` crate
//!
//! ## Quickstart
//!
//! ```
//! use lane_finder::core::RgbImage;
//! use lane_finder::{run, LaneFinderConfig, RunOptions, VecSink, VecSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LaneFinderConfig {
//!     rectified_width: 320,
//!     rectified_height: 240,
//!     ..LaneFinderConfig::default()
//! };
//! let finder = cfg.build_finder()?;
//! let warp = cfg.build_warp()?;
//!
//! let mut road = RgbImage::from_pixel(320, 240, [90, 92, 96]);
//! road.fill_rect(74, 0, 86, 240, [245, 245, 245]);
//! road.fill_rect(234, 0, 246, 240, [245, 245, 245]);
//!
//! let mut sink = VecSink::default();
//! let summary = run(&finder, &warp, &mut VecSource::new([road]), &mut sink, &RunOptions::default())?;
//! assert_eq!(sink.frames.len(), 1);
//! assert!(!summary.frames[0].waypoints.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `lane_finder::core`: image buffers, HSV/gradient primitives, homographies.
//! - `lane_finder::detect`: thresholding, peaks, windows, fits, waypoints.
//! - `lane_finder::image_io` (feature `image`): `image` conversions, frame directories.

pub use lane_finder_core as core;
pub use lane_finder_detect as detect;

pub use lane_finder_detect::{
    FrameDetection, InvalidInput, LaneFinder, LaneFinderParams, LaneSide, LaneStatus, Waypoint,
};

mod frames;
mod io;
mod render;
mod run;

#[cfg(feature = "image")]
pub mod image_io;

pub use frames::{FrameSink, FrameSource, NullSink, Rectifier, VecSink, VecSource};
pub use io::{
    load_marking_thresholds, BlendWeights, ConfigError, FrameReport, LaneFinderConfig,
    LaneReport, PerspectiveConfig, RunReport,
};
pub use render::{annotate_frame, render_overlay, OverlayStyle};
pub use run::{run, BoxError, RunError, RunOptions, RunSummary};
