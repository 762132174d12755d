//! Colored-marker pointer control.
//!
//! Tracks two user-calibrated colored markers in a live camera feed and
//! drives the OS pointer from marker A's position; marker B is tracked as a
//! reserved second control signal. Device access (camera, preview window,
//! pointer, input events) stays behind traits so the whole pipeline runs
//! against synthetic frames in tests.
//!
//! ## Quickstart
//!
//! ```
//! use hue_pointer::{CoordinateMapper, MapperParams, Resolution};
//! use hue_pointer::core::Centroid;
//!
//! let mapper = CoordinateMapper::new(
//!     MapperParams::default(),
//!     Resolution::new(640, 480),
//!     Resolution::new(1920, 1080),
//! );
//! let point = mapper.map(Centroid::at(320.0, 240.0), None).unwrap();
//! assert_eq!((point.x, point.y), (960, 540));
//! ```
//!
//! ## API map
//! - `hue_pointer::core`: frame buffers, HSV conversion, `ColorModel`,
//!   segmentation, and centroid localization (re-export of
//!   `hue-pointer-core`).
//! - [`Calibrator`]: interactive two-slot color-bounds calibration.
//! - [`JsonCalibrationStore`]: persisted calibration records.
//! - [`CoordinateMapper`]: camera→screen rescaling with smoothing.
//! - [`TrackingLoop`]: the `Calibrating`/`Tracking`/`Stopped` state machine.
//! - `hue_pointer::detect` (feature `image`): image-file helpers used by
//!   the CLI and offline runs.

pub use hue_pointer_core as core;

mod calibrate;
mod io;
mod mapper;
mod store;
mod tracker;

#[cfg(feature = "image")]
pub mod detect;

pub use calibrate::{CalibrationSet, Calibrator, CalibratorParams, MarkerSlot};
pub use io::{
    BoundAdjustment, CaptureError, ControlEvent, ControlInput, FramePreview, FrameSource,
    NullPreview, PointerDevice,
};
pub use mapper::{CoordinateMapper, MapperParams, Resolution, ScreenPoint};
pub use store::{CalibrationStore, JsonCalibrationStore, StoreError};
pub use tracker::{LoopParams, TrackError, TrackerState, TrackingLoop, TrackingState};

pub use hue_pointer_core::{
    Centroid, ColorModel, FrameSegmenter, HsvChannel, MarkerLocalizer, RangeBound, SegmentParams,
};
