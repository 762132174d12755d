//! Per-marker HSV acceptance range.

use serde::{Deserialize, Serialize};

use crate::image::HsvPixel;

/// Largest representable hue in the halved-degrees convention.
pub const HUE_MAX: u8 = 179;

/// The three HSV channels, addressable during calibration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum HsvChannel {
    Hue,
    Saturation,
    Value,
}

/// Which end of a channel range an adjustment targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RangeBound {
    Lower,
    Upper,
}

/// Inclusive HSV bounds accepted for one marker's color.
///
/// During interactive calibration a channel may transiently hold an inverted
/// range (`min > max`); such a channel matches no pixel until corrected.
/// [`ColorModel::normalized`] is applied on calibration commit, after which
/// `min <= max` holds on every channel.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColorModel {
    pub hue_min: u8,
    pub hue_max: u8,
    pub sat_min: u8,
    pub sat_max: u8,
    pub val_min: u8,
    pub val_max: u8,
}

impl ColorModel {
    /// The empty model every calibration slot starts from: all bounds zero,
    /// which accepts only pure-black pixels.
    pub const EMPTY: Self = Self {
        hue_min: 0,
        hue_max: 0,
        sat_min: 0,
        sat_max: 0,
        val_min: 0,
        val_max: 0,
    };

    /// Build a model from `[h, s, v]` lower and upper bound triples.
    /// Hue bounds are clamped to [`HUE_MAX`].
    pub fn from_bounds(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            hue_min: lower[0].min(HUE_MAX),
            hue_max: upper[0].min(HUE_MAX),
            sat_min: lower[1],
            sat_max: upper[1],
            val_min: lower[2],
            val_max: upper[2],
        }
    }

    /// Boundary-inclusive membership test. A pixel is accepted only if all
    /// three channels fall inside their ranges; an inverted channel accepts
    /// nothing.
    #[inline]
    pub fn contains(&self, px: HsvPixel) -> bool {
        px.h >= self.hue_min
            && px.h <= self.hue_max
            && px.s >= self.sat_min
            && px.s <= self.sat_max
            && px.v >= self.val_min
            && px.v <= self.val_max
    }

    /// True when `min <= max` holds on all channels.
    pub fn is_normalized(&self) -> bool {
        self.hue_min <= self.hue_max
            && self.sat_min <= self.sat_max
            && self.val_min <= self.val_max
    }

    /// Collapse each inverted channel to the zero-width range at its lower
    /// bound. Applied when a calibration slot is committed.
    pub fn normalized(mut self) -> Self {
        if self.hue_min > self.hue_max {
            self.hue_max = self.hue_min;
        }
        if self.sat_min > self.sat_max {
            self.sat_max = self.sat_min;
        }
        if self.val_min > self.val_max {
            self.val_max = self.val_min;
        }
        self
    }

    /// Apply one live adjustment. Hue values are clamped to [`HUE_MAX`];
    /// the resulting range may be transiently inverted.
    pub fn set_bound(&mut self, channel: HsvChannel, bound: RangeBound, value: u8) {
        let slot = match (channel, bound) {
            (HsvChannel::Hue, RangeBound::Lower) => &mut self.hue_min,
            (HsvChannel::Hue, RangeBound::Upper) => &mut self.hue_max,
            (HsvChannel::Saturation, RangeBound::Lower) => &mut self.sat_min,
            (HsvChannel::Saturation, RangeBound::Upper) => &mut self.sat_max,
            (HsvChannel::Value, RangeBound::Lower) => &mut self.val_min,
            (HsvChannel::Value, RangeBound::Upper) => &mut self.val_max,
        };
        *slot = match channel {
            HsvChannel::Hue => value.min(HUE_MAX),
            _ => value,
        };
    }
}
