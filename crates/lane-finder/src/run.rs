//! Frame-at-a-time driver: source -> rectify -> detect -> overlay -> sink.

use std::time::{Duration, Instant};

use lane_finder_detect::{InvalidInput, LaneFinder, LaneStatus};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    annotate_frame, render_overlay, BlendWeights, FrameReport, FrameSink, FrameSource,
    OverlayStyle, Rectifier, RunReport,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("frame source failed after {frames} frames: {source}")]
    FrameSource {
        frames: usize,
        #[source]
        source: BoxError,
    },
    #[error("frame sink failed at frame {index}: {source}")]
    FrameSink {
        index: usize,
        #[source]
        source: BoxError,
    },
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub blend: BlendWeights,
    pub style: OverlayStyle,
    /// Log running processing time and FPS after every frame.
    pub progress: bool,
    /// Keep each frame's waypoints in the summary. When off, only statuses,
    /// counts and timing outlive a frame.
    pub keep_waypoints: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            blend: BlendWeights::default(),
            style: OverlayStyle::default(),
            progress: false,
            keep_waypoints: true,
        }
    }
}

/// Outcome of a completed run.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub frames: Vec<FrameReport>,
    /// Time spent processing frames, excluding source and sink I/O.
    pub processing: Duration,
}

impl RunSummary {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// `None` until some processing time has been measured.
    pub fn fps(&self) -> Option<f64> {
        let secs = self.processing.as_secs_f64();
        (secs > 0.0).then(|| self.frames.len() as f64 / secs)
    }

    pub fn into_report(self, config_path: Option<String>) -> RunReport {
        RunReport {
            config_path,
            num_frames: self.frames.len(),
            processing_seconds: self.processing.as_secs_f64(),
            fps: self.fps(),
            frames: self.frames,
        }
    }
}

/// Process every frame of `source` and push one annotated frame per input
/// frame to `sink`, in order.
///
/// Frames where one or both lanes are missing are still annotated and
/// written. Malformed frames and source/sink failures stop the run; frames
/// already written stay written.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn run<S, K, R>(
    finder: &LaneFinder,
    rectifier: &R,
    source: &mut S,
    sink: &mut K,
    options: &RunOptions,
) -> Result<RunSummary, RunError>
where
    S: FrameSource,
    K: FrameSink,
    R: Rectifier + ?Sized,
{
    let mut summary = RunSummary::default();

    loop {
        let index = summary.frames.len();
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                return Err(RunError::FrameSource {
                    frames: index,
                    source: Box::new(e),
                })
            }
        };

        let start = Instant::now();
        frame.view().check().map_err(InvalidInput::from)?;
        let rectified = rectifier.rectify(&frame.view());
        let det = finder.process_frame(&rectified.view())?;
        let overlay = render_overlay(&det, &finder.params().waypoints, &options.style);
        let annotated = annotate_frame(&frame, &overlay, rectifier, &options.blend);
        summary.processing += start.elapsed();

        let report = FrameReport::from_detection(index, &det, options.keep_waypoints);
        if report.left.status != LaneStatus::Fitted || report.right.status != LaneStatus::Fitted {
            log::warn!(
                "frame {index}: left={:?} right={:?}",
                report.left.status,
                report.right.status
            );
        }
        summary.frames.push(report);

        sink.write_frame(index, &annotated)
            .map_err(|e| RunError::FrameSink {
                index,
                source: Box::new(e),
            })?;

        if options.progress {
            log::info!(
                "Total time (seconds): {:.3}\tFPS: {:.2}",
                summary.processing.as_secs_f64(),
                summary.fps().unwrap_or(f64::INFINITY)
            );
        }
    }

    log::info!(
        "processed {} frames in {:.3}s",
        summary.num_frames(),
        summary.processing.as_secs_f64()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NullSink, VecSink, VecSource};
    use lane_finder_core::{PerspectiveWarp, RgbImage};
    use lane_finder_detect::LaneFinderParams;
    use std::fmt;

    fn finder() -> LaneFinder {
        LaneFinder::new(LaneFinderParams::default()).expect("finder")
    }

    fn road(width: usize, height: usize, lanes: &[usize]) -> RgbImage {
        let mut img = RgbImage::from_pixel(width, height, [90, 92, 96]);
        for &x in lanes {
            img.fill_rect(x as i64 - 6, 0, x as i64 + 6, height as i64, [245, 245, 245]);
        }
        img
    }

    #[derive(Debug)]
    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("broken pipe")
        }
    }

    impl std::error::Error for Broken {}

    struct FailingSource {
        good: usize,
    }

    impl FrameSource for FailingSource {
        type Error = Broken;

        fn next_frame(&mut self) -> Result<Option<RgbImage>, Broken> {
            if self.good == 0 {
                return Err(Broken);
            }
            self.good -= 1;
            Ok(Some(road(160, 120, &[40, 120])))
        }
    }

    #[test]
    fn every_frame_reaches_the_sink_in_order() {
        let frames = vec![
            road(320, 240, &[80, 240]),
            road(320, 240, &[]),
            road(320, 240, &[80]),
        ];
        let mut source = VecSource::new(frames);
        let mut sink = VecSink::default();
        let warp = PerspectiveWarp::identity(320, 240);
        let summary =
            run(&finder(), &warp, &mut source, &mut sink, &RunOptions::default()).expect("run");

        assert_eq!(summary.num_frames(), 3);
        let indices: Vec<usize> = sink.frames.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(sink
            .frames
            .iter()
            .all(|(_, f)| (f.width, f.height) == (320, 240)));

        assert_eq!(summary.frames[0].left.status, LaneStatus::Fitted);
        assert_eq!(summary.frames[0].right.status, LaneStatus::Fitted);
        assert!(!summary.frames[0].waypoints.is_empty());
    }

    // A frame without lanes is a degraded frame, not a failed run.
    #[test]
    fn frame_without_lanes_does_not_abort_the_run() {
        let mut source = VecSource::new([road(320, 240, &[]), road(320, 240, &[80, 240])]);
        let mut sink = VecSink::default();
        let warp = PerspectiveWarp::identity(320, 240);
        let summary =
            run(&finder(), &warp, &mut source, &mut sink, &RunOptions::default()).expect("run");

        assert_eq!(sink.frames.len(), 2);
        let blank = &summary.frames[0];
        assert_eq!(blank.left.status, LaneStatus::NoDetection);
        assert_eq!(blank.right.status, LaneStatus::NoDetection);
        assert!(blank.waypoints.is_empty());
        assert_eq!(summary.frames[1].left.status, LaneStatus::Fitted);
    }

    #[test]
    fn malformed_frame_aborts_the_run() {
        let bad = RgbImage {
            width: 10,
            height: 10,
            data: vec![0; 7],
        };
        let mut source = VecSource::new([road(64, 48, &[16, 48]), bad, road(64, 48, &[])]);
        let mut sink = VecSink::default();
        let warp = PerspectiveWarp::identity(64, 48);
        let err = run(&finder(), &warp, &mut source, &mut sink, &RunOptions::default())
            .expect_err("malformed frame");

        assert!(matches!(err, RunError::InvalidInput(InvalidInput::Frame(_))));
        assert_eq!(sink.frames.len(), 1);
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn source_failure_is_reported_with_frame_count() {
        let mut source = FailingSource { good: 2 };
        let warp = PerspectiveWarp::identity(160, 120);
        let err = run(&finder(), &warp, &mut source, &mut NullSink, &RunOptions::default())
            .expect_err("source error");
        match err {
            RunError::FrameSource { frames, source } => {
                assert_eq!(frames, 2);
                assert_eq!(source.to_string(), "broken pipe");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn long_run_without_waypoints_keeps_only_counts() {
        let frames = (0..40).map(|_| road(320, 240, &[80, 240]));
        let options = RunOptions {
            keep_waypoints: false,
            ..RunOptions::default()
        };
        let warp = PerspectiveWarp::identity(320, 240);
        let summary = run(
            &finder(),
            &warp,
            &mut VecSource::new(frames),
            &mut NullSink,
            &options,
        )
        .expect("run");

        assert_eq!(summary.num_frames(), 40);
        for f in &summary.frames {
            assert!(f.waypoints.is_empty());
            assert_eq!(f.waypoints.capacity(), 0);
            assert!(f.waypoint_count > 0);
            assert_eq!(f.left.status, LaneStatus::Fitted);
        }
    }

    #[test]
    fn kept_waypoints_match_their_count() {
        let warp = PerspectiveWarp::identity(320, 240);
        let summary = run(
            &finder(),
            &warp,
            &mut VecSource::new([road(320, 240, &[80, 240])]),
            &mut NullSink,
            &RunOptions::default(),
        )
        .expect("run");
        let f = &summary.frames[0];
        assert_eq!(f.waypoints.len(), f.waypoint_count);
        assert!(f.waypoint_count > 0);
    }

    #[test]
    fn empty_source_is_an_empty_run() {
        let warp = PerspectiveWarp::identity(8, 8);
        let summary = run(
            &finder(),
            &warp,
            &mut VecSource::default(),
            &mut NullSink,
            &RunOptions::default(),
        )
        .expect("run");
        assert_eq!(summary.num_frames(), 0);
        assert_eq!(summary.fps(), None);
        let report = summary.into_report(None);
        assert!(report.frames.is_empty());
        assert_eq!(report.fps, None);
    }
}
