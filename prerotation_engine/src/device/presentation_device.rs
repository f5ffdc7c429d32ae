/// PresentationDevice trait - the only seam between the presentation loop and the GPU
///
/// Handles crossing this boundary are opaque 64-bit values; the backend maps them to its
/// own objects. Every method that can fail returns a fatal [`Error`](crate::error::Error):
/// the only recoverable condition, a suboptimal presentation, is a successful
/// [`PresentOutcome`].

use std::time::Duration;
use crate::asset::AssetSource;
use crate::config::PresenterConfig;
use crate::error::Result;
use crate::frame::FrameSlot;
use crate::rotation::PushConstantBlock;
use crate::surface::{Extent2D, SurfaceSnapshot};

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u64);

        impl $name {
            pub const NULL: $name = $name(0);

            pub fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

define_handle!(
    /// Presentable image chain
    SwapchainHandle
);
define_handle!(
    /// Image owned by a swapchain
    ImageHandle
);
define_handle!(
    /// View over one swapchain image
    ImageViewHandle
);
define_handle!(
    /// Framebuffer wrapping one image view
    FramebufferHandle
);
define_handle!(
    /// CPU-visible completion signal
    FenceHandle
);
define_handle!(
    /// GPU-side ordering signal
    SemaphoreHandle
);
define_handle!(
    /// Primary command buffer owned by a frame slot
    CommandBufferHandle
);

/// Parameters of one swapchain generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainDesc {
    /// Probe answer the generation is built for
    pub surface: SurfaceSnapshot,
    /// Allocation size of the images (logical extent, transposed for quarter turns)
    pub physical_extent: Extent2D,
    /// Requested minimum number of images
    pub min_image_count: u32,
}

/// What the backend hands back for a new swapchain
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedSwapchain {
    pub handle: SwapchainHandle,
    pub images: Vec<ImageHandle>,
}

/// Everything needed to record one frame's command buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRecording {
    pub command_buffer: CommandBufferHandle,
    pub framebuffer: FramebufferHandle,
    /// Render area, viewport and scissor
    pub physical_extent: Extent2D,
    pub push_constants: PushConstantBlock,
    pub clear_color: [f32; 4],
}

/// Result of a successful presentation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Success,
    /// Image was presented, but the surface no longer matches the swapchain
    Suboptimal,
}

/// GPU capability set used by the presentation loop
///
/// Implementations own the instance, surface, device, queue and every piece of fixed
/// render state (render pass, pipeline, descriptors, texture, vertex buffer, command pool).
/// Per-generation and per-slot objects are created and destroyed on request so that the
/// loop alone decides their lifetime.
pub trait PresentationDevice: Send {
    /// Native window the surface is created from
    type Window: ?Sized;

    /// Bring up the device for `window`, loading shaders and texture from `assets`
    fn open(window: &Self::Window, assets: &dyn AssetSource, config: &PresenterConfig) -> Result<Self>
    where
        Self: Sized;

    /// Current extent and transform of the surface (never cached)
    fn probe_surface(&mut self) -> Result<SurfaceSnapshot>;

    /// Native size of the displayed texture
    fn content_extent(&self) -> Extent2D;

    /// Latest window size reported by the host
    ///
    /// Only used when the surface leaves its extent to the window; backends whose
    /// surface always reports a size can ignore it.
    fn set_window_extent(&mut self, _extent: Extent2D) {}

    // ===== SWAPCHAIN GENERATIONS =====

    /// Create a swapchain; `old` is only a hint for driver-side reuse
    fn create_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        old: Option<SwapchainHandle>,
    ) -> Result<CreatedSwapchain>;

    fn create_image_view(&mut self, image: ImageHandle) -> Result<ImageViewHandle>;

    fn create_framebuffer(
        &mut self,
        view: ImageViewHandle,
        extent: Extent2D,
    ) -> Result<FramebufferHandle>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle);

    fn destroy_image_view(&mut self, view: ImageViewHandle);

    fn destroy_swapchain(&mut self, swapchain: SwapchainHandle);

    // ===== FRAME SLOTS =====

    /// Create a slot whose fence starts signaled
    fn create_frame_slot(&mut self) -> Result<FrameSlot>;

    fn destroy_frame_slot(&mut self, slot: FrameSlot);

    /// Block until `fence` signals or `timeout` elapses (`Error::Timeout`)
    fn wait_for_fence(&mut self, fence: FenceHandle, timeout: Duration) -> Result<()>;

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()>;

    // ===== PER FRAME =====

    /// Index of the next presentable image; `signal` fires when it may be written
    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainHandle,
        signal: SemaphoreHandle,
    ) -> Result<u32>;

    fn record_frame(&mut self, recording: &FrameRecording) -> Result<()>;

    /// Submit the slot's command buffer: wait on its acquire signal, signal its render
    /// signal and its fence
    fn submit(&mut self, slot: &FrameSlot) -> Result<()>;

    fn present(
        &mut self,
        swapchain: SwapchainHandle,
        image_index: u32,
        wait: SemaphoreHandle,
    ) -> Result<PresentOutcome>;

    // ===== TEARDOWN =====

    fn wait_idle(&mut self) -> Result<()>;

    /// Destroy the fixed render state (command pool, vertex buffer, pipeline,
    /// render pass, descriptors, texture), in that order
    fn release_render_resources(&mut self);

    /// Destroy surface, device and instance
    fn close(&mut self);
}
