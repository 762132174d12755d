//! Camera-space to screen-space mapping with temporal smoothing.

use serde::{Deserialize, Serialize};

use hue_pointer_core::Centroid;

/// Pixel dimensions of a camera frame or screen.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Final pointer position in screen pixels, origin top-left.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

fn default_smoothing() -> f32 {
    0.5
}

/// Mapping configuration. All fields are fixed for a session; nothing here
/// is auto-detected.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MapperParams {
    /// Exponential-moving-average weight of the new sample, in (0, 1].
    /// 1.0 disables smoothing; smaller values trade latency for smoothness.
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    /// Mirror the x axis so a mirrored camera matches natural hand motion.
    #[serde(default)]
    pub invert_x: bool,
    #[serde(default)]
    pub invert_y: bool,
    /// Smoothed moves shorter than this many screen pixels keep the previous
    /// point, suppressing sub-pixel jitter. 0 disables the deadzone.
    #[serde(default)]
    pub deadzone_px: f32,
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            smoothing: default_smoothing(),
            invert_x: false,
            invert_y: false,
            deadzone_px: 0.0,
        }
    }
}

/// Rescales camera-space centroids into screen space and smooths them
/// against the previous output. Stateless: the previous point lives in the
/// caller's tracking context.
#[derive(Clone, Copy, Debug)]
pub struct CoordinateMapper {
    params: MapperParams,
    camera: Resolution,
    screen: Resolution,
}

impl CoordinateMapper {
    pub fn new(params: MapperParams, camera: Resolution, screen: Resolution) -> Self {
        Self {
            params,
            camera,
            screen,
        }
    }

    /// Map one centroid. Returns `None` for an invalid centroid (no pointer
    /// update this frame; the caller keeps its last position).
    pub fn map(&self, centroid: Centroid, prev: Option<ScreenPoint>) -> Option<ScreenPoint> {
        let pos = centroid.position()?;

        let mut sx = pos.x * self.screen.width as f32 / self.camera.width.max(1) as f32;
        let mut sy = pos.y * self.screen.height as f32 / self.camera.height.max(1) as f32;
        if self.params.invert_x {
            sx = (self.screen.width.saturating_sub(1)) as f32 - sx;
        }
        if self.params.invert_y {
            sy = (self.screen.height.saturating_sub(1)) as f32 - sy;
        }

        let (tx, ty) = match prev {
            Some(p) => {
                let alpha = self.params.smoothing.clamp(0.0, 1.0);
                (
                    p.x as f32 + alpha * (sx - p.x as f32),
                    p.y as f32 + alpha * (sy - p.y as f32),
                )
            }
            None => (sx, sy),
        };

        if let Some(p) = prev {
            let dx = tx - p.x as f32;
            let dy = ty - p.y as f32;
            if self.params.deadzone_px > 0.0
                && (dx * dx + dy * dy).sqrt() < self.params.deadzone_px
            {
                return Some(p);
            }
        }

        Some(ScreenPoint {
            x: (tx.round() as i32).clamp(0, self.screen.width.saturating_sub(1) as i32),
            y: (ty.round() as i32).clamp(0, self.screen.height.saturating_sub(1) as i32),
        })
    }
}
