use crate::{homography_from_4pt, warp_perspective_rgb, Homography, RgbImage, RgbImageView};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WarpError {
    #[error("perspective points are degenerate (no homography through them)")]
    DegeneratePoints,
    #[error("rectified size must be non-zero (width={width}, height={height})")]
    EmptyTarget { width: usize, height: usize },
}

/// Fixed camera-to-top-down warp and its inverse.
///
/// `src_points` are four road points in the camera frame, `dst_points` their
/// positions in the rectified (bird's-eye) frame of `width × height` pixels.
#[derive(Clone, Debug)]
pub struct PerspectiveWarp {
    src_from_rect: Homography,
    rect_from_src: Homography,
    pub width: usize,
    pub height: usize,
}

impl PerspectiveWarp {
    pub fn from_points(
        src_points: &[Point2<f32>; 4],
        dst_points: &[Point2<f32>; 4],
        width: usize,
        height: usize,
    ) -> Result<Self, WarpError> {
        if width == 0 || height == 0 {
            return Err(WarpError::EmptyTarget { width, height });
        }
        let src_from_rect =
            homography_from_4pt(dst_points, src_points).ok_or(WarpError::DegeneratePoints)?;
        let rect_from_src = src_from_rect.inverse().ok_or(WarpError::DegeneratePoints)?;
        Ok(Self {
            src_from_rect,
            rect_from_src,
            width,
            height,
        })
    }

    /// A warp that leaves frames untouched (input already top-down).
    pub fn identity(width: usize, height: usize) -> Self {
        Self {
            src_from_rect: Homography::identity(),
            rect_from_src: Homography::identity(),
            width,
            height,
        }
    }

    /// Camera frame -> rectified frame of `self.width × self.height`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn rectify(&self, frame: &RgbImageView<'_>) -> RgbImage {
        warp_perspective_rgb(frame, &self.src_from_rect, self.width, self.height)
    }

    /// Rectified overlay -> camera perspective at `out_w × out_h`.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, overlay)))]
    pub fn inverse_rectify(
        &self,
        overlay: &RgbImageView<'_>,
        out_w: usize,
        out_h: usize,
    ) -> RgbImage {
        warp_perspective_rgb(overlay, &self.rect_from_src, out_w, out_h)
    }

    pub fn rect_to_src(&self, p: Point2<f32>) -> Point2<f32> {
        self.src_from_rect.apply(p)
    }

    pub fn src_to_rect(&self, p: Point2<f32>) -> Point2<f32> {
        self.rect_from_src.apply(p)
    }
}
