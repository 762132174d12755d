//! Reduction of candidate regions to one marker centroid per frame.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::segment::Region;

/// Marker position in camera pixel coordinates for one frame.
///
/// `valid == false` means no sufficiently large region was found this frame;
/// the coordinates are zero and must not be consumed. This is the normal
/// marker-not-visible outcome, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f32,
    pub y: f32,
    pub valid: bool,
}

impl Centroid {
    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y, valid: true }
    }

    pub fn none() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            valid: false,
        }
    }

    /// The position as a point, or `None` when the marker was not seen.
    pub fn position(&self) -> Option<Point2<f32>> {
        self.valid.then(|| Point2::new(self.x, self.y))
    }
}

/// Policy choosing the marker region among surviving candidates.
///
/// Kept behind a trait so alternative strategies (e.g. closest to the
/// previous centroid) can be substituted without touching segmentation.
pub trait RegionSelector {
    fn select<'a>(&self, regions: &'a [Region]) -> Option<&'a Region>;
}

/// Default policy: the single largest region by pixel area. The true marker
/// is assumed to produce the largest contiguous blob of its color, with
/// reflections and noise smaller. Ties keep the first-encountered region,
/// which is deterministic because candidates arrive in scan order.
#[derive(Clone, Copy, Debug, Default)]
pub struct LargestArea;

impl RegionSelector for LargestArea {
    fn select<'a>(&self, regions: &'a [Region]) -> Option<&'a Region> {
        let mut best: Option<&Region> = None;
        for region in regions {
            match best {
                Some(b) if region.area <= b.area => {}
                _ => best = Some(region),
            }
        }
        best
    }
}

/// Turns a candidate list into a [`Centroid`] via the configured policy.
pub struct MarkerLocalizer<S: RegionSelector = LargestArea> {
    selector: S,
}

impl MarkerLocalizer<LargestArea> {
    pub fn new() -> Self {
        Self {
            selector: LargestArea,
        }
    }
}

impl Default for MarkerLocalizer<LargestArea> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RegionSelector> MarkerLocalizer<S> {
    pub fn with_selector(selector: S) -> Self {
        Self { selector }
    }

    pub fn localize(&self, regions: &[Region]) -> Centroid {
        match self.selector.select(regions) {
            Some(region) => {
                let c = region.centroid();
                Centroid::at(c.x, c.y)
            }
            None => Centroid::none(),
        }
    }
}
