//! Frame sources, sinks and the perspective seam of a run.

use std::collections::VecDeque;
use std::convert::Infallible;

use lane_finder_core::{PerspectiveWarp, RgbImage, RgbImageView};

/// Lazy, finite sequence of camera frames.
pub trait FrameSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Next frame, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, Self::Error>;
}

/// Receives one annotated frame per processed input frame, in source order.
pub trait FrameSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn write_frame(&mut self, index: usize, frame: &RgbImage) -> Result<(), Self::Error>;
}

/// Camera view <-> top-down view.
pub trait Rectifier {
    fn rectify(&self, frame: &RgbImageView<'_>) -> RgbImage;

    /// Map a top-down overlay back into a camera frame of `out_w × out_h`.
    fn inverse_rectify(&self, overlay: &RgbImageView<'_>, out_w: usize, out_h: usize)
        -> RgbImage;
}

impl Rectifier for PerspectiveWarp {
    fn rectify(&self, frame: &RgbImageView<'_>) -> RgbImage {
        PerspectiveWarp::rectify(self, frame)
    }

    fn inverse_rectify(
        &self,
        overlay: &RgbImageView<'_>,
        out_w: usize,
        out_h: usize,
    ) -> RgbImage {
        PerspectiveWarp::inverse_rectify(self, overlay, out_w, out_h)
    }
}

/// In-memory frame source.
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    frames: VecDeque<RgbImage>,
}

impl VecSource {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for VecSource {
    type Error = Infallible;

    fn next_frame(&mut self) -> Result<Option<RgbImage>, Infallible> {
        Ok(self.frames.pop_front())
    }
}

/// Collects annotated frames in memory.
#[derive(Clone, Debug, Default)]
pub struct VecSink {
    pub frames: Vec<(usize, RgbImage)>,
}

impl FrameSink for VecSink {
    type Error = Infallible;

    fn write_frame(&mut self, index: usize, frame: &RgbImage) -> Result<(), Infallible> {
        self.frames.push((index, frame.clone()));
        Ok(())
    }
}

/// Sink that drops every frame; for report-only and benchmark runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    type Error = Infallible;

    fn write_frame(&mut self, _index: usize, _frame: &RgbImage) -> Result<(), Infallible> {
        Ok(())
    }
}
