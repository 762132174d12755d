//! Interactive color-bounds calibration.
//!
//! Calibration runs once per marker slot: frames are captured and segmented
//! against the in-progress [`ColorModel`], the mask is shown as feedback,
//! and bound adjustments are applied until the user advances. Two committed
//! slots form a [`CalibrationSet`].

use log::{info, warn};
use serde::{Deserialize, Serialize};

use hue_pointer_core::{hsv_from_rgb, ColorModel, FrameSegmenter, SegmentParams, HUE_MAX};

use crate::io::{CaptureError, ControlEvent, ControlInput, FramePreview, FrameSource};

/// The two marker slots, calibrated in order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MarkerSlot {
    A,
    B,
}

impl MarkerSlot {
    pub const ALL: [MarkerSlot; 2] = [MarkerSlot::A, MarkerSlot::B];

    pub fn index(self) -> usize {
        match self {
            MarkerSlot::A => 0,
            MarkerSlot::B => 1,
        }
    }
}

/// Frozen calibration for both markers, order-significant (A then B).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSet {
    pub marker_a: ColorModel,
    pub marker_b: ColorModel,
}

impl CalibrationSet {
    pub fn new(marker_a: ColorModel, marker_b: ColorModel) -> Self {
        Self { marker_a, marker_b }
    }

    pub fn model(&self, slot: MarkerSlot) -> &ColorModel {
        match slot {
            MarkerSlot::A => &self.marker_a,
            MarkerSlot::B => &self.marker_b,
        }
    }

    /// Well-formedness check applied when loading persisted sets: both
    /// models normalized and hue bounds inside the 0–179 convention.
    pub fn is_well_formed(&self) -> bool {
        [self.marker_a, self.marker_b]
            .iter()
            .all(|m| m.is_normalized() && m.hue_max <= HUE_MAX)
    }
}

fn default_preview_window() -> String {
    "calibration".to_owned()
}

/// Calibrator settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibratorParams {
    /// Window name handed to the preview collaborator.
    #[serde(default = "default_preview_window")]
    pub preview_window: String,
    /// Iteration cap for scripted and offline runs; reaching it commits the
    /// slot as if the user had advanced. `None` runs until advanced.
    #[serde(default)]
    pub max_iterations: Option<u64>,
    #[serde(default)]
    pub segment: SegmentParams,
}

impl Default for CalibratorParams {
    fn default() -> Self {
        Self {
            preview_window: default_preview_window(),
            max_iterations: None,
            segment: SegmentParams::default(),
        }
    }
}

/// Interactive calibration procedure.
///
/// Known limitation: nothing prevents the two slots from committing
/// overlapping ranges. A blob matching both models is reported by both
/// markers; no disambiguation is attempted.
pub struct Calibrator {
    params: CalibratorParams,
}

impl Calibrator {
    pub fn new(params: CalibratorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CalibratorParams {
        &self.params
    }

    /// Calibrate one marker slot.
    ///
    /// Starts from the empty model and loops capture → segment → preview →
    /// apply adjustments until the advance signal, then commits the model
    /// with inverted channels collapsed ([`ColorModel::normalized`]). An
    /// all-zero result is accepted; a capture failure aborts.
    pub fn run_slot(
        &self,
        slot: MarkerSlot,
        source: &mut impl FrameSource,
        preview: &mut impl FramePreview,
        input: &mut impl ControlInput,
    ) -> Result<ColorModel, CaptureError> {
        let segmenter = FrameSegmenter::new(self.params.segment);
        let mut model = ColorModel::EMPTY;
        let mut iterations = 0u64;

        info!("calibrating marker slot {slot:?}");
        loop {
            if let Some(cap) = self.params.max_iterations {
                if iterations >= cap {
                    warn!("calibration iteration cap {cap} reached for slot {slot:?}, committing");
                    return Ok(self.commit(slot, model));
                }
            }

            let frame = source.capture_frame()?;
            let hsv = hsv_from_rgb(&frame);
            let seg = segmenter.segment(&hsv.view(), &model);
            preview.show(&self.params.preview_window, &seg.mask);

            while let Some(event) = input.poll() {
                match event {
                    ControlEvent::Adjust(adj) => {
                        model.set_bound(adj.channel, adj.bound, adj.value);
                    }
                    ControlEvent::Advance => return Ok(self.commit(slot, model)),
                }
            }

            iterations += 1;
        }
    }

    /// Calibrate both slots in order and assemble the set.
    pub fn run(
        &self,
        source: &mut impl FrameSource,
        preview: &mut impl FramePreview,
        input: &mut impl ControlInput,
    ) -> Result<CalibrationSet, CaptureError> {
        let marker_a = self.run_slot(MarkerSlot::A, source, preview, input)?;
        let marker_b = self.run_slot(MarkerSlot::B, source, preview, input)?;
        Ok(CalibrationSet::new(marker_a, marker_b))
    }

    fn commit(&self, slot: MarkerSlot, model: ColorModel) -> ColorModel {
        let committed = model.normalized();
        if committed != model {
            warn!("slot {slot:?} committed with inverted channels collapsed");
        }
        info!(
            "slot {slot:?} committed: h [{}, {}] s [{}, {}] v [{}, {}]",
            committed.hue_min,
            committed.hue_max,
            committed.sat_min,
            committed.sat_max,
            committed.val_min,
            committed.val_max
        );
        committed
    }
}
