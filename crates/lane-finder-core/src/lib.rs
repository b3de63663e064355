//! Core image types and geometry for the lane finder.
//!
//! Nothing here knows about lanes: owned/borrowed RGB, grayscale and binary
//! buffers, the colour and gradient primitives the thresholder builds on, and
//! the homography-based perspective warp used to produce top-down frames.

mod color;
mod homography;
mod image;
mod logger;
mod rectify;

pub use color::{rgb_to_hsv, rgb_to_hsv_image, scaled_sobel_x, value_channel, HUE_RANGE};
pub use homography::{homography_from_4pt, warp_perspective_rgb, Homography};
pub use image::{
    sample_bilinear_rgb, BinaryMask, GrayImage, GrayImageView, ImageBufferError, RgbImage,
    RgbImageView,
};
pub use rectify::{PerspectiveWarp, WarpError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, log_level};
