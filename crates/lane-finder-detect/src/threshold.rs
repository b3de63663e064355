//! Rectified colour frame -> binary mask of candidate lane pixels.

use lane_finder_core::{rgb_to_hsv_image, scaled_sobel_x, value_channel, BinaryMask, RgbImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{InvalidInput, ThresholdParams};

/// Mark every pixel accepted by the yellow or the white threshold set.
///
/// The frame is read only. Fails with [`InvalidInput`] on an empty or
/// mis-sized frame, or on malformed threshold sets.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, params), fields(width = frame.width, height = frame.height))
)]
pub fn threshold_frame(
    frame: &RgbImageView<'_>,
    params: &ThresholdParams,
) -> Result<BinaryMask, InvalidInput> {
    frame.check()?;
    params.validate()?;

    let hsv = rgb_to_hsv_image(frame);
    let gradient = params
        .uses_gradient()
        .then(|| scaled_sobel_x(&value_channel(frame).view()));

    let w = frame.width;
    let mask = BinaryMask::from_fn(w, frame.height, |x, y| {
        let i = y * w + x;
        let px = [hsv[3 * i], hsv[3 * i + 1], hsv[3 * i + 2]];
        let g = gradient.as_ref().map(|g| g.data[i]);
        params.yellow.accepts(px, g) || params.white.accepts(px, g)
    });

    log::debug!(
        "thresholded {}x{} frame: {} candidate pixels",
        mask.width,
        mask.height,
        mask.count_set()
    );
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MarkingThresholds;
    use lane_finder_core::{ImageBufferError, RgbImage};

    const PAVEMENT: [u8; 3] = [95, 95, 100];
    const YELLOW: [u8; 3] = [240, 200, 30];
    const WHITE: [u8; 3] = [235, 235, 235];

    fn road_with_markings() -> RgbImage {
        let mut img = RgbImage::from_pixel(120, 40, PAVEMENT);
        img.fill_rect(20, 0, 30, 40, YELLOW);
        img.fill_rect(90, 0, 100, 40, WHITE);
        img
    }

    #[test]
    fn yellow_and_white_markings_pass_pavement_does_not() {
        let img = road_with_markings();
        let mask = threshold_frame(&img.view(), &ThresholdParams::default()).expect("mask");
        assert_eq!((mask.width, mask.height), (120, 40));
        for y in [0, 20, 39] {
            assert!(mask.get(25, y), "yellow at y={y}");
            assert!(mask.get(95, y), "white at y={y}");
            assert!(!mask.get(5, y));
            assert!(!mask.get(60, y));
            assert!(!mask.get(110, y));
        }
    }

    #[test]
    fn gradient_hits_on_dark_side_of_an_edge_are_suppressed() {
        let img = road_with_markings();
        let mask = threshold_frame(&img.view(), &ThresholdParams::default()).expect("mask");
        // Pavement column right next to the white marking has a strong gradient
        // but a low value.
        assert!(!mask.get(89, 10));
        assert!(!mask.get(100, 10));
    }

    #[test]
    fn gradient_test_accepts_bright_edges_outside_the_colour_box() {
        let params = ThresholdParams {
            yellow: MarkingThresholds::yellow(),
            white: MarkingThresholds {
                hsv_min: [0, 0, 255],
                hsv_max: [0, 0, 255],
                ..MarkingThresholds::white()
            },
        };
        let mut img = RgbImage::from_pixel(16, 4, [20, 20, 20]);
        img.fill_rect(8, 0, 16, 4, [200, 200, 200]);
        let mask = threshold_frame(&img.view(), &params).expect("mask");
        assert!(mask.get(8, 1), "bright edge pixel");
        assert!(!mask.get(7, 1), "dark edge pixel");
        assert!(!mask.get(12, 1), "flat interior");
    }

    #[test]
    fn frame_is_left_untouched() {
        let img = road_with_markings();
        let before = img.clone();
        let _ = threshold_frame(&img.view(), &ThresholdParams::default()).expect("mask");
        assert_eq!(img, before);
    }

    #[test]
    fn empty_frame_is_invalid_input() {
        let view = RgbImageView {
            width: 0,
            height: 0,
            data: &[],
        };
        assert_eq!(
            threshold_frame(&view, &ThresholdParams::default()).unwrap_err(),
            InvalidInput::Frame(ImageBufferError::Empty {
                width: 0,
                height: 0
            })
        );
    }

    #[test]
    fn malformed_thresholds_fail_instead_of_returning_an_empty_mask() {
        let img = road_with_markings();
        let mut params = ThresholdParams::default();
        params.yellow.hsv_min[1] = 255;
        params.yellow.hsv_max[1] = 0;
        assert!(matches!(
            threshold_frame(&img.view(), &params),
            Err(InvalidInput::InvertedHsvRange { .. })
        ));
    }
}
