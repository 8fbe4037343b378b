use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound of every percentage coordinate.
pub const FULL_SURFACE: f64 = 100.0;

/// A point on the video surface in percent (0.0 = top/left, 100.0 = bottom/right).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
}

impl SurfacePoint {
    /// Create a point, clamping both coordinates onto the surface.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    /// Convert a surface-relative pixel position into percentages.
    ///
    /// Pointers dragged outside the surface are clamped to its edge. A
    /// zero-sized surface maps everything to the origin.
    pub fn from_pixels(px: f64, py: f64, surface_width: f64, surface_height: f64) -> Self {
        let x = if surface_width > 0.0 {
            px / surface_width * FULL_SURFACE
        } else {
            0.0
        };
        let y = if surface_height > 0.0 {
            py / surface_height * FULL_SURFACE
        } else {
            0.0
        };
        Self::new(x, y)
    }
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, FULL_SURFACE)
}

/// A rectangle over a video frame, every field a percentage of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedRegion {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRegion {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Axis-aligned bounding box of two corner points, independent of drag direction.
    pub fn from_corners(anchor: SurfacePoint, current: SurfacePoint) -> Self {
        Self {
            left: anchor.x.min(current.x),
            top: anchor.y.min(current.y),
            width: (current.x - anchor.x).abs(),
            height: (current.y - anchor.y).abs(),
        }
    }

    /// True when both extents are strictly larger than `min_size`.
    pub fn exceeds(&self, min_size: f64) -> bool {
        self.width > min_size && self.height > min_size
    }

    /// Check the expected (not enforced) invariant that the region stays on the surface.
    pub fn is_within_bounds(&self) -> bool {
        self.top >= 0.0
            && self.left >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.bottom() <= FULL_SURFACE + 0.001 // float slack
            && self.right() <= FULL_SURFACE + 0.001
    }

    /// Right edge, in percent of surface width.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge, in percent of surface height.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}
