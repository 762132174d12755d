//! HSV thresholding and connected-region extraction.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::color_model::ColorModel;
use crate::image::HsvFrameView;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Binary foreground mask; pixels are 0 or 255 (render-friendly).
#[derive(Clone, Debug)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Mask {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize) {
        self.data[y * self.width + x] = 255;
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&p| p != 0).count()
    }
}

/// One 4-connected foreground component.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub area: usize,
    /// Sums of member pixel coordinates, kept for the centroid.
    pub sum_x: u64,
    pub sum_y: u64,
    /// Bounding box `[min_x, min_y, max_x, max_y]`, inclusive.
    pub bbox: [usize; 4],
}

impl Region {
    fn seed(x: usize, y: usize) -> Self {
        Self {
            area: 1,
            sum_x: x as u64,
            sum_y: y as u64,
            bbox: [x, y, x, y],
        }
    }

    fn absorb(&mut self, x: usize, y: usize) {
        self.area += 1;
        self.sum_x += x as u64;
        self.sum_y += y as u64;
        self.bbox[0] = self.bbox[0].min(x);
        self.bbox[1] = self.bbox[1].min(y);
        self.bbox[2] = self.bbox[2].max(x);
        self.bbox[3] = self.bbox[3].max(y);
    }

    /// Area-weighted geometric center of the region.
    pub fn centroid(&self) -> Point2<f32> {
        Point2::new(
            self.sum_x as f32 / self.area as f32,
            self.sum_y as f32 / self.area as f32,
        )
    }
}

fn default_min_region_area() -> usize {
    16
}

/// Noise-suppression settings for region extraction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SegmentParams {
    /// Components smaller than this many pixels are discarded. The default
    /// rejects single-pixel sensor noise while keeping marker-sized blobs at
    /// typical working distance.
    #[serde(default = "default_min_region_area")]
    pub min_region_area: usize,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            min_region_area: default_min_region_area(),
        }
    }
}

/// Output of one segmentation pass: the binary mask plus the surviving
/// candidate regions in scan order (top-left first).
#[derive(Clone, Debug)]
pub struct Segmentation {
    pub mask: Mask,
    pub regions: Vec<Region>,
}

/// Thresholds frames against a [`ColorModel`] and extracts candidate regions.
pub struct FrameSegmenter {
    params: SegmentParams,
}

impl FrameSegmenter {
    pub fn new(params: SegmentParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    /// Segment one frame. An empty candidate list is a normal outcome
    /// (marker not visible), never an error.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame, model), fields(width = frame.width, height = frame.height))
    )]
    pub fn segment(&self, frame: &HsvFrameView<'_>, model: &ColorModel) -> Segmentation {
        let mut mask = Mask::zeros(frame.width, frame.height);
        for y in 0..frame.height {
            for x in 0..frame.width {
                if model.contains(frame.pixel(x, y)) {
                    mask.set(x, y);
                }
            }
        }

        let regions = extract_regions(&mask, self.params.min_region_area);
        Segmentation { mask, regions }
    }
}

/// Collect 4-connected components of `mask` with at least `min_area` pixels.
///
/// Components are seeded in row-major scan order, which makes the output
/// order (and any downstream tie-breaking) deterministic.
fn extract_regions(mask: &Mask, min_area: usize) -> Vec<Region> {
    let mut visited = vec![false; mask.width * mask.height];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for y in 0..mask.height {
        for x in 0..mask.width {
            let idx = y * mask.width + x;
            if visited[idx] || !mask.is_set(x, y) {
                continue;
            }

            visited[idx] = true;
            let mut region = Region::seed(x, y);
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                // wrapping_sub sends x=0 neighbors past the bounds check.
                let neighbors = [
                    (cx.wrapping_sub(1), cy),
                    (cx + 1, cy),
                    (cx, cy.wrapping_sub(1)),
                    (cx, cy + 1),
                ];
                for (nx, ny) in neighbors {
                    if nx >= mask.width || ny >= mask.height {
                        continue;
                    }
                    let nidx = ny * mask.width + nx;
                    if !visited[nidx] && mask.is_set(nx, ny) {
                        visited[nidx] = true;
                        region.absorb(nx, ny);
                        stack.push((nx, ny));
                    }
                }
            }

            if region.area >= min_area {
                regions.push(region);
            }
        }
    }

    regions
}
