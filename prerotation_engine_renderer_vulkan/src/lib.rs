/*!
# PreRotation Engine - Vulkan Backend

Vulkan implementation of [`PresentationDevice`](prerotation_engine::prerotation::PresentationDevice).

Uses Ash for the Vulkan bindings, ash-window for surface creation and gpu-allocator for
memory. Swapchains are created with the surface's current transform as pre-transform, so
the content rotation happens in the vertex stage instead of the compositor.

# Example

```no_run
use prerotation_engine::prerotation::PresentationEngine;
use prerotation_engine::prerotation::asset::DirectoryAssetSource;
use prerotation_engine::prerotation::config::PresenterConfig;
use prerotation_engine_renderer_vulkan::VulkanPresentationDevice;

# fn run(window: &winit::window::Window) -> prerotation_engine::prerotation::Result<()> {
let engine = PresentationEngine::<VulkanPresentationDevice>::new(PresenterConfig::default());
engine.initialize(window, &DirectoryAssetSource::new("assets"))?;
engine.draw_frame()?;
engine.terminate()?;
# Ok(())
# }
```
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_context;
mod vulkan_surface;
mod vulkan_swapchain;
mod vulkan_texture;
mod vulkan_buffer;
mod vulkan_pipeline;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanPresentationDevice;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
