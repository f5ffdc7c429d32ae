/// PreTransform - physical orientation of the presentation surface

use bitflags::bitflags;

bitflags! {
    /// Raw surface transform mask as reported by the platform
    ///
    /// Bit layout matches `VkSurfaceTransformFlagBitsKHR`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceTransformFlags: u32 {
        const IDENTITY = 0x0000_0001;
        const ROTATE_90 = 0x0000_0002;
        const ROTATE_180 = 0x0000_0004;
        const ROTATE_270 = 0x0000_0008;
        const HORIZONTAL_MIRROR = 0x0000_0010;
        const HORIZONTAL_MIRROR_ROTATE_90 = 0x0000_0020;
        const HORIZONTAL_MIRROR_ROTATE_180 = 0x0000_0040;
        const HORIZONTAL_MIRROR_ROTATE_270 = 0x0000_0080;
        const INHERIT = 0x0000_0100;
    }
}

/// One of the four rotations the presentation loop corrects for
///
/// Mirrored transforms are not handled: [`resolve`](PreTransform::resolve) maps anything
/// that is not exactly one of the four rotation bits to `Identity`, i.e. no correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PreTransform {
    #[default]
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl PreTransform {
    /// All four rotations, in increasing angle
    pub const ALL: [PreTransform; 4] = [
        PreTransform::Identity,
        PreTransform::Rotate90,
        PreTransform::Rotate180,
        PreTransform::Rotate270,
    ];

    /// Exact mapping, `None` for mirrored, inherit, empty or multi-bit masks
    pub fn from_flags(flags: SurfaceTransformFlags) -> Option<Self> {
        if flags == SurfaceTransformFlags::IDENTITY {
            Some(PreTransform::Identity)
        } else if flags == SurfaceTransformFlags::ROTATE_90 {
            Some(PreTransform::Rotate90)
        } else if flags == SurfaceTransformFlags::ROTATE_180 {
            Some(PreTransform::Rotate180)
        } else if flags == SurfaceTransformFlags::ROTATE_270 {
            Some(PreTransform::Rotate270)
        } else {
            None
        }
    }

    /// Mapping with the documented fallback: unmatched masks become `Identity`
    pub fn resolve(flags: SurfaceTransformFlags) -> Self {
        Self::from_flags(flags).unwrap_or_else(|| {
            crate::engine_warn!(
                "prerotation::surface",
                "Unhandled surface transform {:#x}, presenting without rotation correction",
                flags.bits()
            );
            PreTransform::Identity
        })
    }

    /// The single flag bit for this rotation
    pub fn to_flags(self) -> SurfaceTransformFlags {
        match self {
            PreTransform::Identity => SurfaceTransformFlags::IDENTITY,
            PreTransform::Rotate90 => SurfaceTransformFlags::ROTATE_90,
            PreTransform::Rotate180 => SurfaceTransformFlags::ROTATE_180,
            PreTransform::Rotate270 => SurfaceTransformFlags::ROTATE_270,
        }
    }

    /// Rotation angle in degrees
    pub fn degrees(self) -> f32 {
        match self {
            PreTransform::Identity => 0.0,
            PreTransform::Rotate90 => 90.0,
            PreTransform::Rotate180 => 180.0,
            PreTransform::Rotate270 => 270.0,
        }
    }

    /// Whether physical images have width and height swapped
    pub fn swaps_extent(self) -> bool {
        matches!(self, PreTransform::Rotate90 | PreTransform::Rotate270)
    }

    /// Whether `self` and `other` differ by exactly 180°
    ///
    /// A half turn keeps the image aspect, so the swap for it is never debounced.
    pub fn is_half_turn_from(self, other: PreTransform) -> bool {
        matches!(
            (self, other),
            (PreTransform::Identity, PreTransform::Rotate180)
                | (PreTransform::Rotate180, PreTransform::Identity)
                | (PreTransform::Rotate90, PreTransform::Rotate270)
                | (PreTransform::Rotate270, PreTransform::Rotate90)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "pre_transform_tests.rs"]
mod tests;
