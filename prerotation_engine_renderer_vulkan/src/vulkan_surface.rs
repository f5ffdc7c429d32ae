/// Surface helpers - conversions between the platform answers and the engine types
///
/// Everything here is pure so it can be checked without a GPU.

use prerotation_engine::prerotation::Error;
use prerotation_engine::prerotation::present::{Extent2D, SurfaceSnapshot, SurfaceTransformFlags};
use ash::vk;

/// Reported by `currentExtent` when the window decides the size (desktop compositors)
pub const UNDEFINED_EXTENT: u32 = u32::MAX;

pub fn to_vk_extent(extent: Extent2D) -> vk::Extent2D {
    vk::Extent2D {
        width: extent.width,
        height: extent.height,
    }
}

pub fn from_vk_extent(extent: vk::Extent2D) -> Extent2D {
    Extent2D::new(extent.width, extent.height)
}

pub fn to_vk_transform(flags: SurfaceTransformFlags) -> vk::SurfaceTransformFlagsKHR {
    vk::SurfaceTransformFlagsKHR::from_raw(flags.bits())
}

pub fn from_vk_transform(flags: vk::SurfaceTransformFlagsKHR) -> SurfaceTransformFlags {
    SurfaceTransformFlags::from_bits_retain(flags.as_raw())
}

/// Build the probe answer from the surface capabilities
///
/// `window_extent` is only used when the surface leaves the size to the window; it is
/// clamped into the supported range.
pub fn snapshot_from_capabilities(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: Extent2D,
) -> SurfaceSnapshot {
    let current = capabilities.current_extent;
    let extent = if current.width == UNDEFINED_EXTENT || current.height == UNDEFINED_EXTENT {
        let min = capabilities.min_image_extent;
        let max = capabilities.max_image_extent;
        Extent2D::new(
            window_extent.width.clamp(min.width, max.width.max(min.width)),
            window_extent.height.clamp(min.height, max.height.max(min.height)),
        )
    } else {
        from_vk_extent(current)
    };

    SurfaceSnapshot::from_raw(extent, from_vk_transform(capabilities.current_transform))
}

/// Prefer `R8G8B8A8_UNORM`, otherwise take the first reported format
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| f.format == vk::Format::R8G8B8A8_UNORM)
        .or_else(|| formats.first())
        .copied()
}

/// INHERIT when supported, otherwise the lowest supported bit
pub fn choose_composite_alpha(supported: vk::CompositeAlphaFlagsKHR) -> vk::CompositeAlphaFlagsKHR {
    if supported.contains(vk::CompositeAlphaFlagsKHR::INHERIT) {
        return vk::CompositeAlphaFlagsKHR::INHERIT;
    }
    [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
    ]
    .into_iter()
    .find(|&bit| supported.contains(bit))
    .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}

/// Clamp the requested image count into `[minImageCount, maxImageCount]` (0 = unbounded)
pub fn clamp_image_count(requested: u32, capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = requested.max(capabilities.min_image_count);
    if capabilities.max_image_count == 0 {
        count
    } else {
        count.min(capabilities.max_image_count)
    }
}

/// Map a failed device call to the fatal error taxonomy
pub fn map_vk_error(result: vk::Result, operation: &str) -> Error {
    match result {
        vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost(operation.to_string()),
        vk::Result::TIMEOUT => Error::Timeout(operation.to_string()),
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            Error::OutOfMemory
        }
        other => Error::BackendError(format!("{}: {:?}", operation, other)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "vulkan_surface_tests.rs"]
mod tests;
