//! Core types and algorithms for colored-marker tracking.
//!
//! This crate is intentionally small and purely algorithmic. It does *not*
//! touch the camera, the display, or the OS pointer; it only turns pixel
//! buffers into marker centroids. Device I/O lives behind traits in the
//! `hue-pointer` facade crate.

mod color_model;
mod image;
mod localize;
mod logger;
mod segment;

pub use color_model::{ColorModel, HsvChannel, RangeBound, HUE_MAX};
pub use image::{hsv_from_rgb, rgb_to_hsv, HsvFrame, HsvFrameView, HsvPixel, RgbFrame};
pub use localize::{Centroid, LargestArea, MarkerLocalizer, RegionSelector};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
pub use segment::{FrameSegmenter, Mask, Region, SegmentParams, Segmentation};
