//! Helpers bridging `image` buffers and files into the pipeline.
//!
//! Only compiled with the `image` feature; the tracking core itself never
//! depends on an image codec.

use std::path::Path;

use hue_pointer_core::{
    hsv_from_rgb, Centroid, ColorModel, FrameSegmenter, MarkerLocalizer, RgbFrame, SegmentParams,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors from reading image files into frames.
#[derive(Debug, thiserror::Error)]
pub enum ImageFrameError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Convert an `image::RgbImage` into the pipeline's frame type.
pub fn rgb_frame_from_image(img: &image::RgbImage) -> RgbFrame {
    RgbFrame {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Load an image file and convert it to an RGB frame.
pub fn load_rgb_frame(path: impl AsRef<Path>) -> Result<RgbFrame, ImageFrameError> {
    let img = image::ImageReader::open(path)?.decode()?.to_rgb8();
    Ok(rgb_frame_from_image(&img))
}

/// End-to-end helper: segment one frame against a color model and localize
/// the marker.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, model, params), fields(width = frame.width, height = frame.height))
)]
pub fn locate_marker(frame: &RgbFrame, model: &ColorModel, params: SegmentParams) -> Centroid {
    let hsv = hsv_from_rgb(frame);
    let seg = FrameSegmenter::new(params).segment(&hsv.view(), model);
    MarkerLocalizer::new().localize(&seg.regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_marker_finds_painted_blob() {
        let mut frame = RgbFrame::filled(64, 64, [30, 30, 30]);
        for y in 20..26 {
            for x in 40..46 {
                frame.set_pixel(x, y, [0, 255, 0]);
            }
        }
        // Green sits at hue 60 in halved degrees.
        let model = ColorModel::from_bounds([50, 100, 100], [70, 255, 255]);
        let c = locate_marker(&frame, &model, SegmentParams::default());
        assert!(c.valid);
        assert_eq!((c.x, c.y), (42.5, 22.5));
    }

    #[test]
    fn locate_marker_reports_absence() {
        let frame = RgbFrame::filled(64, 64, [30, 30, 30]);
        let model = ColorModel::from_bounds([50, 100, 100], [70, 255, 255]);
        assert!(!locate_marker(&frame, &model, SegmentParams::default()).valid);
    }
}
