//! Collaborator seams: camera, preview display, pointer, and user input.
//!
//! The tracking core never talks to devices directly; everything behind
//! these traits is supplied by the embedding process (or by scripted fakes
//! in tests).

use hue_pointer_core::{HsvChannel, Mask, RangeBound, RgbFrame};

/// The frame source could not deliver a frame.
///
/// Fatal by contract: calibration aborts and the tracking loop terminates.
/// There are no automatic retries.
#[derive(Debug, thiserror::Error)]
#[error("frame capture failed: {reason}")]
pub struct CaptureError {
    reason: String,
}

impl CaptureError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Blocking frame acquisition (camera device or file playback).
pub trait FrameSource {
    fn capture_frame(&mut self) -> Result<RgbFrame, CaptureError>;
}

/// Preview display used for visual feedback during calibration only.
/// Nothing in the pipeline observes a return value.
pub trait FramePreview {
    fn show(&mut self, name: &str, mask: &Mask);
}

/// Preview that discards everything; for headless and scripted runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPreview;

impl FramePreview for NullPreview {
    fn show(&mut self, _name: &str, _mask: &Mask) {}
}

/// OS pointer primitive. Coordinates are screen pixels, origin top-left;
/// the call is assumed to always succeed.
pub trait PointerDevice {
    fn move_to(&mut self, x: i32, y: i32);
}

/// One live adjustment of a calibration bound (e.g. a trackbar change).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BoundAdjustment {
    pub channel: HsvChannel,
    pub bound: RangeBound,
    pub value: u8,
}

/// User input consumed by the state machine.
///
/// `Advance` is the single binary advance/terminate signal: while
/// calibrating it commits the current slot, while tracking it terminates
/// the loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlEvent {
    Adjust(BoundAdjustment),
    Advance,
}

/// Non-blocking input poll, checked once per loop iteration.
pub trait ControlInput {
    fn poll(&mut self) -> Option<ControlEvent>;
}
