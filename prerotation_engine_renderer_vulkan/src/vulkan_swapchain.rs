/// Swapchain objects - one generation's swapchain, its image views and framebuffers
///
/// Lifetime decisions (when to build, when to retire) belong to the presentation loop;
/// these functions only create what they are asked for.

use prerotation_engine::prerotation::Result;
use prerotation_engine::prerotation::device::SwapchainDesc;
use prerotation_engine::prerotation::present::Extent2D;
use prerotation_engine::{engine_debug, engine_err, engine_error};
use ash::vk;

use crate::vulkan_context::GpuContext;
use crate::vulkan_surface::{choose_composite_alpha, clamp_image_count, map_vk_error, to_vk_extent, to_vk_transform};

const SOURCE: &str = "prerotation::vulkan";

/// Create a swapchain in the physical orientation of `desc`
///
/// The pre-transform is the raw mask the probe reported, so the compositor skips its
/// own rotation. `old` may be null.
pub fn create_swapchain(
    ctx: &GpuContext,
    surface_format: vk::SurfaceFormatKHR,
    desc: &SwapchainDesc,
    old: vk::SwapchainKHR,
) -> Result<(vk::SwapchainKHR, Vec<vk::Image>)> {
    unsafe {
        let capabilities = ctx.surface_loader
            .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
            .map_err(|e| engine_err!(SOURCE, "Failed to get surface capabilities: {:?}", e))?;

        let min_image_count = clamp_image_count(desc.min_image_count, &capabilities);
        let queue_family_indices = [ctx.queue_family];

        let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(ctx.surface)
            .min_image_count(min_image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(to_vk_extent(desc.physical_extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(&queue_family_indices)
            .pre_transform(to_vk_transform(desc.surface.raw_transform))
            .composite_alpha(choose_composite_alpha(capabilities.supported_composite_alpha))
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(false)
            .old_swapchain(old);

        let swapchain = ctx.swapchain_loader
            .create_swapchain(&swapchain_create_info, None)
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to create swapchain: {:?}", e);
                map_vk_error(e, "create_swapchain")
            })?;

        let images = match ctx.swapchain_loader.get_swapchain_images(swapchain) {
            Ok(images) => images,
            Err(e) => {
                ctx.swapchain_loader.destroy_swapchain(swapchain, None);
                return Err(engine_err!(SOURCE, "Failed to get swapchain images: {:?}", e));
            }
        };

        engine_debug!(
            SOURCE,
            "Swapchain created: {}x{}, {} images (requested {})",
            desc.physical_extent.width,
            desc.physical_extent.height,
            images.len(),
            min_image_count
        );

        Ok((swapchain, images))
    }
}

pub fn create_image_view(device: &ash::Device, image: vk::Image, format: vk::Format) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::R,
            g: vk::ComponentSwizzle::G,
            b: vk::ComponentSwizzle::B,
            a: vk::ComponentSwizzle::A,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe { device.create_image_view(&create_info, None) }
        .map_err(|e| engine_err!(SOURCE, "Failed to create swapchain image view: {:?}", e))
}

pub fn create_framebuffer(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    view: vk::ImageView,
    extent: Extent2D,
) -> Result<vk::Framebuffer> {
    let attachments = [view];
    let create_info = vk::FramebufferCreateInfo::default()
        .render_pass(render_pass)
        .attachments(&attachments)
        .width(extent.width)
        .height(extent.height)
        .layers(1);

    unsafe { device.create_framebuffer(&create_info, None) }
        .map_err(|e| engine_err!(SOURCE, "Failed to create framebuffer: {:?}", e))
}
