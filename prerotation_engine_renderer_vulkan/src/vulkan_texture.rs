/// Texture - the sampled quad texture, decoded from PNG and uploaded once

use prerotation_engine::prerotation::{Error, Result};
use prerotation_engine::prerotation::present::Extent2D;
use prerotation_engine::{engine_debug, engine_err, engine_error};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "prerotation::vulkan";

/// Decoded RGBA8 pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode PNG bytes to tightly packed RGBA8
pub fn decode_rgba8(bytes: &[u8]) -> Result<DecodedImage> {
    let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| {
            engine_error!(SOURCE, "Failed to decode texture: {}", e);
            Error::InvalidResource(format!("Failed to decode texture: {}", e))
        })?
        .to_rgba8();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidResource("Texture has a zero dimension".to_string()));
    }

    Ok(DecodedImage {
        width,
        height,
        pixels: image.into_raw(),
    })
}

/// Optimal-tiling `R8G8B8A8_UNORM` image with its view and sampler
pub struct Texture {
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    pub(crate) sampler: vk::Sampler,
    allocation: Option<Allocation>,
    extent: Extent2D,
}

impl Texture {
    /// Decode `png` and upload it through a staging buffer
    pub fn from_png(ctx: &GpuContext, png: &[u8]) -> Result<Self> {
        let decoded = decode_rgba8(png)?;
        let mut texture = Self::create_image(ctx, decoded.width, decoded.height)?;

        if let Err(e) = texture.upload(ctx, &decoded.pixels) {
            texture.destroy(ctx);
            return Err(e);
        }

        engine_debug!(SOURCE, "Texture uploaded ({}x{})", decoded.width, decoded.height);
        Ok(texture)
    }

    /// Native size of the texture
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    fn create_image(ctx: &GpuContext, width: u32, height: u32) -> Result<Self> {
        unsafe {
            let device = &ctx.device;

            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(vk::Format::R8G8B8A8_UNORM)
                .extent(vk::Extent3D { width, height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture image: {:?}", e))?;

            let requirements = device.get_image_memory_requirements(image);
            let allocation = ctx.allocator()?.allocate(&AllocationCreateDesc {
                name: "texture",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_) => {
                    engine_error!(SOURCE, "Out of GPU memory for texture ({}x{})", width, height);
                    device.destroy_image(image, None);
                    return Err(Error::OutOfMemory);
                }
            };

            let mut texture = Self {
                image,
                view: vk::ImageView::null(),
                sampler: vk::Sampler::null(),
                allocation: Some(allocation),
                extent: Extent2D::new(width, height),
            };

            if let Err(e) = texture.create_view_and_sampler(ctx) {
                texture.destroy(ctx);
                return Err(e);
            }
            Ok(texture)
        }
    }

    fn create_view_and_sampler(&mut self, ctx: &GpuContext) -> Result<()> {
        unsafe {
            let device = &ctx.device;
            if let Some(allocation) = &self.allocation {
                device.bind_image_memory(self.image, allocation.memory(), allocation.offset())
                    .map_err(|e| engine_err!(SOURCE, "Failed to bind texture image memory: {:?}", e))?;
            }

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(self.image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(vk::Format::R8G8B8A8_UNORM)
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
            self.view = device.create_image_view(&view_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture image view: {:?}", e))?;

            let sampler_create_info = vk::SamplerCreateInfo::default()
                .mag_filter(vk::Filter::NEAREST)
                .min_filter(vk::Filter::NEAREST)
                .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
                .address_mode_u(vk::SamplerAddressMode::REPEAT)
                .address_mode_v(vk::SamplerAddressMode::REPEAT)
                .address_mode_w(vk::SamplerAddressMode::REPEAT)
                .mip_lod_bias(0.0)
                .anisotropy_enable(false)
                .max_anisotropy(1.0)
                .compare_enable(false)
                .compare_op(vk::CompareOp::NEVER)
                .min_lod(0.0)
                .max_lod(0.0)
                .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
                .unnormalized_coordinates(false);
            self.sampler = device.create_sampler(&sampler_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture sampler: {:?}", e))?;

            Ok(())
        }
    }

    fn upload(&self, ctx: &GpuContext, pixels: &[u8]) -> Result<()> {
        unsafe {
            let device = &ctx.device;
            let buffer_size = pixels.len() as u64;

            // Staging buffer
            let staging_buffer_create_info = vk::BufferCreateInfo::default()
                .size(buffer_size)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let staging_buffer = device.create_buffer(&staging_buffer_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create texture staging buffer: {:?}", e))?;

            let staging_requirements = device.get_buffer_memory_requirements(staging_buffer);
            let staging_allocation = match ctx.allocator()?.allocate(&AllocationCreateDesc {
                name: "texture_staging_buffer",
                requirements: staging_requirements,
                location: MemoryLocation::CpuToGpu,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            }) {
                Ok(allocation) => allocation,
                Err(_) => {
                    let size_mb = staging_requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(SOURCE, "Out of GPU memory for texture staging buffer ({:.2} MB)", size_mb);
                    device.destroy_buffer(staging_buffer, None);
                    return Err(Error::OutOfMemory);
                }
            };

            let result = self.record_upload(ctx, staging_buffer, &staging_allocation, pixels);

            if let Ok(mut allocator) = ctx.allocator() {
                allocator.free(staging_allocation).ok();
            }
            device.destroy_buffer(staging_buffer, None);
            result
        }
    }

    unsafe fn record_upload(
        &self,
        ctx: &GpuContext,
        staging_buffer: vk::Buffer,
        staging_allocation: &Allocation,
        pixels: &[u8],
    ) -> Result<()> {
        let device = &ctx.device;

        device.bind_buffer_memory(staging_buffer, staging_allocation.memory(), staging_allocation.offset())
            .map_err(|e| engine_err!(SOURCE, "Failed to bind staging buffer memory: {:?}", e))?;

        let mapped_ptr = staging_allocation.mapped_ptr()
            .ok_or_else(|| engine_err!(SOURCE, "Texture staging buffer is not mapped"))?
            .as_ptr() as *mut u8;
        std::ptr::copy_nonoverlapping(pixels.as_ptr(), mapped_ptr, pixels.len());

        // One-shot command buffer
        let command_pool_create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.queue_family)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);
        let command_pool = device.create_command_pool(&command_pool_create_info, None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create command pool for texture upload: {:?}", e))?;

        let result = self.submit_copy(ctx, command_pool, staging_buffer);
        device.destroy_command_pool(command_pool, None);
        result
    }

    unsafe fn submit_copy(
        &self,
        ctx: &GpuContext,
        command_pool: vk::CommandPool,
        staging_buffer: vk::Buffer,
    ) -> Result<()> {
        let device = &ctx.device;

        let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = device.allocate_command_buffers(&command_buffer_allocate_info)
            .map_err(|e| engine_err!(SOURCE, "Failed to allocate command buffer for texture upload: {:?}", e))?
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!(SOURCE, "No command buffer allocated for texture upload"))?;

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        device.begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| engine_err!(SOURCE, "Failed to begin command buffer for texture upload: {:?}", e))?;

        let subresource_range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };

        // UNDEFINED -> TRANSFER_DST_OPTIMAL
        let barrier_to_transfer = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(subresource_range)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier_to_transfer],
        );

        let region = vk::BufferImageCopy::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(vk::Extent3D {
                width: self.extent.width,
                height: self.extent.height,
                depth: 1,
            });
        device.cmd_copy_buffer_to_image(
            command_buffer,
            staging_buffer,
            self.image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );

        // TRANSFER_DST_OPTIMAL -> SHADER_READ_ONLY_OPTIMAL
        let barrier_to_shader = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(subresource_range)
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ);
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier_to_shader],
        );

        device.end_command_buffer(command_buffer)
            .map_err(|e| engine_err!(SOURCE, "Failed to end command buffer for texture upload: {:?}", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        device.queue_submit(ctx.queue, &[submit_info], vk::Fence::null())
            .map_err(|e| engine_err!(SOURCE, "Failed to submit texture upload: {:?}", e))?;
        device.queue_wait_idle(ctx.queue)
            .map_err(|e| engine_err!(SOURCE, "Failed to wait for texture upload: {:?}", e))?;

        Ok(())
    }

    /// Destroy sampler, view and image, and free the memory
    pub fn destroy(&mut self, ctx: &GpuContext) {
        unsafe {
            let device = &ctx.device;
            if self.sampler != vk::Sampler::null() {
                device.destroy_sampler(self.sampler, None);
                self.sampler = vk::Sampler::null();
            }
            if self.view != vk::ImageView::null() {
                device.destroy_image_view(self.view, None);
                self.view = vk::ImageView::null();
            }
            if self.image != vk::Image::null() {
                device.destroy_image(self.image, None);
                self.image = vk::Image::null();
            }
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - the image is already gone
                if let Ok(mut allocator) = ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "vulkan_texture_tests.rs"]
mod tests;
