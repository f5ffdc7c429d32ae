/// SwapchainGeneration - one swapchain and the views/framebuffers built over its images

use crate::device::{
    FramebufferHandle, ImageHandle, ImageViewHandle, PresentationDevice, SwapchainDesc,
    SwapchainHandle,
};
use crate::error::{Error, Result};
use crate::surface::{Extent2D, PreTransform, SurfaceSnapshot};

/// Swapchain resource set built for one surface snapshot
///
/// Image views and framebuffers are created on the first use of each image index and
/// cached until the generation is destroyed. The three per-image sequences always have
/// the same length, fixed at creation.
///
/// A generation is destroyed exactly once through [`destroy`](Self::destroy), which
/// consumes it.
#[derive(Debug)]
pub struct SwapchainGeneration {
    handle: SwapchainHandle,
    surface: SurfaceSnapshot,
    physical_extent: Extent2D,
    images: Vec<ImageHandle>,
    views: Vec<Option<ImageViewHandle>>,
    framebuffers: Vec<Option<FramebufferHandle>>,
}

impl SwapchainGeneration {
    /// Build a generation for `surface`
    ///
    /// `old` is only forwarded to the device as a reuse hint, its images are not read.
    pub fn build<D: PresentationDevice>(
        device: &mut D,
        surface: SurfaceSnapshot,
        min_image_count: u32,
        old: Option<&SwapchainGeneration>,
    ) -> Result<Self> {
        let physical_extent = surface.physical_extent();
        let desc = SwapchainDesc {
            surface,
            physical_extent,
            min_image_count,
        };

        let created = device.create_swapchain(&desc, old.map(|g| g.handle))?;
        if created.images.is_empty() {
            device.destroy_swapchain(created.handle);
            return Err(Error::InitializationFailed(
                "swapchain was created without images".to_string(),
            ));
        }

        let image_count = created.images.len();
        crate::engine_debug!(
            "prerotation::swapchain",
            "Swapchain created: surface {}x{}, transform {:?}, images {}x{}, {} images",
            surface.extent.width,
            surface.extent.height,
            surface.transform,
            physical_extent.width,
            physical_extent.height,
            image_count
        );

        Ok(Self {
            handle: created.handle,
            surface,
            physical_extent,
            images: created.images,
            views: vec![None; image_count],
            framebuffers: vec![None; image_count],
        })
    }

    pub fn handle(&self) -> SwapchainHandle {
        self.handle
    }

    pub fn transform(&self) -> PreTransform {
        self.surface.transform
    }

    pub fn surface(&self) -> &SurfaceSnapshot {
        &self.surface
    }

    /// Surface extent as reported (unrotated)
    pub fn logical_extent(&self) -> Extent2D {
        self.surface.extent
    }

    /// Extent the images are allocated with
    pub fn physical_extent(&self) -> Extent2D {
        self.physical_extent
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn images(&self) -> &[ImageHandle] {
        &self.images
    }

    pub fn view(&self, index: u32) -> Option<ImageViewHandle> {
        self.views.get(index as usize).copied().flatten()
    }

    pub fn framebuffer(&self, index: u32) -> Option<FramebufferHandle> {
        self.framebuffers.get(index as usize).copied().flatten()
    }

    /// Number of images whose framebuffer exists
    pub fn materialized_count(&self) -> usize {
        self.framebuffers.iter().filter(|f| f.is_some()).count()
    }

    /// Framebuffer for `index`, creating the view and framebuffer on first use
    pub fn materialize<D: PresentationDevice>(
        &mut self,
        device: &mut D,
        index: u32,
    ) -> Result<FramebufferHandle> {
        let slot = index as usize;
        let image = *self.images.get(slot).ok_or_else(|| {
            Error::InvalidResource(format!(
                "image index {} out of range ({} images)",
                index,
                self.images.len()
            ))
        })?;

        if let Some(framebuffer) = self.framebuffers[slot] {
            return Ok(framebuffer);
        }

        let view = match self.views[slot] {
            Some(view) => view,
            None => {
                let view = device.create_image_view(image)?;
                self.views[slot] = Some(view);
                view
            }
        };

        let framebuffer = device.create_framebuffer(view, self.physical_extent)?;
        self.framebuffers[slot] = Some(framebuffer);

        crate::engine_trace!(
            "prerotation::swapchain",
            "Materialized framebuffer for image {} of swapchain {}",
            index,
            self.handle.0
        );

        Ok(framebuffer)
    }

    /// Destroy framebuffers, then views, then the swapchain itself
    ///
    /// No submitted work may still reference this generation.
    pub fn destroy<D: PresentationDevice>(self, device: &mut D) {
        for framebuffer in self.framebuffers.into_iter().flatten() {
            device.destroy_framebuffer(framebuffer);
        }
        for view in self.views.into_iter().flatten() {
            device.destroy_image_view(view);
        }
        device.destroy_swapchain(self.handle);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "generation_tests.rs"]
mod tests;
