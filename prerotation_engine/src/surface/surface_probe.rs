/// SurfaceSnapshot - one answer of the presentable surface probe

use crate::surface::pre_transform::{PreTransform, SurfaceTransformFlags};

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Same extent with width and height exchanged
    pub const fn transposed(self) -> Self {
        Self { width: self.height, height: self.width }
    }

    /// No drawable area (a minimized window reports this)
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Current extent and transform of the surface
///
/// Never cached: the presentation loop asks the device for a fresh snapshot every time it
/// needs one, the platform is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    /// Logical extent (as reported, not rotated)
    pub extent: Extent2D,
    /// Resolved rotation
    pub transform: PreTransform,
    /// Mask exactly as reported, kept for the swapchain pre-transform
    pub raw_transform: SurfaceTransformFlags,
}

impl SurfaceSnapshot {
    /// Build a snapshot from the platform answer, applying the transform fallback
    pub fn from_raw(extent: Extent2D, raw_transform: SurfaceTransformFlags) -> Self {
        Self {
            extent,
            transform: PreTransform::resolve(raw_transform),
            raw_transform,
        }
    }

    /// Snapshot for one of the four rotations
    pub fn new(extent: Extent2D, transform: PreTransform) -> Self {
        Self {
            extent,
            transform,
            raw_transform: transform.to_flags(),
        }
    }

    /// Extent the swapchain images must be allocated with
    pub fn physical_extent(&self) -> Extent2D {
        if self.transform.swaps_extent() {
            self.extent.transposed()
        } else {
            self.extent
        }
    }
}
