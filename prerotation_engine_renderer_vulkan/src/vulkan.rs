/// VulkanPresentationDevice - Vulkan implementation of the PresentationDevice trait

use prerotation_engine::prerotation::{Error, PresentationDevice, Result};
use prerotation_engine::prerotation::asset::{
    AssetSource, FRAGMENT_SHADER_ASSET, TEXTURE_ASSET, VERTEX_SHADER_ASSET,
};
use prerotation_engine::prerotation::config::{timeout_nanos, PresenterConfig};
use prerotation_engine::prerotation::device::{
    CommandBufferHandle, CreatedSwapchain, FenceHandle, FrameRecording, FramebufferHandle,
    ImageHandle, ImageViewHandle, PresentOutcome, SemaphoreHandle, SwapchainDesc,
    SwapchainHandle,
};
use prerotation_engine::prerotation::present::{Extent2D, FrameSlot, SurfaceSnapshot};
use prerotation_engine::{engine_debug, engine_err, engine_error, engine_info, engine_trace};
use ash::vk::{self, Handle};
use std::time::Duration;
use winit::window::Window;

use crate::vulkan_buffer::{VertexBuffer, QUAD_VERTEX_COUNT};
use crate::vulkan_context::GpuContext;
use crate::vulkan_pipeline::RenderState;
use crate::vulkan_surface::{choose_surface_format, map_vk_error, snapshot_from_capabilities, to_vk_extent};
use crate::vulkan_swapchain;
use crate::vulkan_texture::Texture;

const SOURCE: &str = "prerotation::vulkan";

fn to_raw<H: Handle>(handle: H) -> u64 {
    handle.as_raw()
}

fn from_raw<H: Handle>(raw: u64) -> H {
    H::from_raw(raw)
}

/// Vulkan presentation backend
///
/// Owns the [`GpuContext`] and the fixed render state. Swapchains, views, framebuffers
/// and frame slot objects are handed out as raw handles and only destroyed on request.
pub struct VulkanPresentationDevice {
    ctx: GpuContext,
    surface_format: vk::SurfaceFormatKHR,

    // Fixed render state, taken by release_render_resources
    render: Option<RenderState>,
    texture: Option<Texture>,
    vertex_buffer: Option<VertexBuffer>,
    command_pool: vk::CommandPool,

    content_extent: Extent2D,
    fence_timeout: Duration,
}

impl VulkanPresentationDevice {
    /// Color format of every swapchain image
    pub fn surface_format(&self) -> vk::Format {
        self.surface_format.format
    }

    fn device(&self) -> &ash::Device {
        &self.ctx.device
    }

    fn render_state(&self) -> Result<&RenderState> {
        self.render
            .as_ref()
            .ok_or_else(|| engine_err!(SOURCE, "Render state already released"))
    }

    /// Build the fixed render state on an opened context
    ///
    /// Whatever was created before a failure is left in `self` for
    /// `release_render_resources` to collect.
    fn create_render_resources(&mut self, assets: &dyn AssetSource) -> Result<()> {
        let vertex_spirv = assets.read(VERTEX_SHADER_ASSET)?;
        let fragment_spirv = assets.read(FRAGMENT_SHADER_ASSET)?;
        let png = assets.read(TEXTURE_ASSET)?;

        let texture = Texture::from_png(&self.ctx, &png)?;
        self.content_extent = texture.extent();
        let texture = self.texture.insert(texture);

        self.render = Some(RenderState::new(
            &self.ctx.device,
            self.surface_format.format,
            &vertex_spirv,
            &fragment_spirv,
            texture,
        )?);

        self.vertex_buffer = Some(VertexBuffer::quad(&self.ctx)?);

        let pool_create_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(self.ctx.queue_family);
        self.command_pool = unsafe { self.ctx.device.create_command_pool(&pool_create_info, None) }
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to create command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
            })?;

        Ok(())
    }
}

impl PresentationDevice for VulkanPresentationDevice {
    type Window = Window;

    fn open(window: &Window, assets: &dyn AssetSource, config: &PresenterConfig) -> Result<Self> {
        let size = window.inner_size();
        let ctx = GpuContext::new(window, Extent2D::new(size.width, size.height), config)?;

        let formats = unsafe {
            ctx.surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
        }
        .map_err(|e| {
            engine_error!(SOURCE, "Failed to get surface formats: {:?}", e);
            Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
        })?;
        let surface_format = choose_surface_format(&formats).ok_or_else(|| {
            engine_error!(SOURCE, "Surface reports no formats");
            Error::InitializationFailed("Surface reports no formats".to_string())
        })?;

        let mut device = Self {
            ctx,
            surface_format,
            render: None,
            texture: None,
            vertex_buffer: None,
            command_pool: vk::CommandPool::null(),
            content_extent: Extent2D::new(0, 0),
            fence_timeout: config.fence_timeout,
        };

        if let Err(e) = device.create_render_resources(assets) {
            device.release_render_resources();
            device.close();
            return Err(e);
        }

        engine_info!(
            SOURCE,
            "Presentation device opened (format {:?}, content {}x{}, fence timeout {:?})",
            surface_format.format,
            device.content_extent.width,
            device.content_extent.height,
            device.fence_timeout
        );

        Ok(device)
    }

    fn probe_surface(&mut self) -> Result<SurfaceSnapshot> {
        let capabilities = unsafe {
            self.ctx
                .surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.ctx.surface)
        }
        .map_err(|e| map_vk_error(e, "get_physical_device_surface_capabilities"))?;

        Ok(snapshot_from_capabilities(&capabilities, self.ctx.window_extent))
    }

    fn content_extent(&self) -> Extent2D {
        self.content_extent
    }

    fn set_window_extent(&mut self, extent: Extent2D) {
        self.ctx.window_extent = extent;
    }

    // ===== SWAPCHAIN GENERATIONS =====

    fn create_swapchain(
        &mut self,
        desc: &SwapchainDesc,
        old: Option<SwapchainHandle>,
    ) -> Result<CreatedSwapchain> {
        let old = old.map_or(vk::SwapchainKHR::null(), |h| from_raw(h.0));
        let (swapchain, images) =
            vulkan_swapchain::create_swapchain(&self.ctx, self.surface_format, desc, old)?;

        Ok(CreatedSwapchain {
            handle: SwapchainHandle(to_raw(swapchain)),
            images: images.into_iter().map(|image| ImageHandle(to_raw(image))).collect(),
        })
    }

    fn create_image_view(&mut self, image: ImageHandle) -> Result<ImageViewHandle> {
        let view = vulkan_swapchain::create_image_view(
            self.device(),
            from_raw(image.0),
            self.surface_format.format,
        )?;
        Ok(ImageViewHandle(to_raw(view)))
    }

    fn create_framebuffer(
        &mut self,
        view: ImageViewHandle,
        extent: Extent2D,
    ) -> Result<FramebufferHandle> {
        let render_pass = self.render_state()?.render_pass;
        let framebuffer =
            vulkan_swapchain::create_framebuffer(self.device(), render_pass, from_raw(view.0), extent)?;
        Ok(FramebufferHandle(to_raw(framebuffer)))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if framebuffer.is_null() {
            return;
        }
        unsafe {
            self.device().destroy_framebuffer(from_raw(framebuffer.0), None);
        }
    }

    fn destroy_image_view(&mut self, view: ImageViewHandle) {
        if view.is_null() {
            return;
        }
        unsafe {
            self.device().destroy_image_view(from_raw(view.0), None);
        }
    }

    fn destroy_swapchain(&mut self, swapchain: SwapchainHandle) {
        if swapchain.is_null() {
            return;
        }
        unsafe {
            self.ctx.swapchain_loader.destroy_swapchain(from_raw(swapchain.0), None);
        }
        engine_debug!(SOURCE, "Swapchain {:#x} destroyed", swapchain.0);
    }

    // ===== FRAME SLOTS =====

    fn create_frame_slot(&mut self) -> Result<FrameSlot> {
        unsafe {
            let device = &self.ctx.device;
            let semaphore_info = vk::SemaphoreCreateInfo::default();
            let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

            let acquire_signal = device.create_semaphore(&semaphore_info, None)
                .map_err(|e| map_vk_error(e, "create_semaphore"))?;

            let render_signal = match device.create_semaphore(&semaphore_info, None) {
                Ok(semaphore) => semaphore,
                Err(e) => {
                    device.destroy_semaphore(acquire_signal, None);
                    return Err(map_vk_error(e, "create_semaphore"));
                }
            };

            let in_flight = match device.create_fence(&fence_info, None) {
                Ok(fence) => fence,
                Err(e) => {
                    device.destroy_semaphore(render_signal, None);
                    device.destroy_semaphore(acquire_signal, None);
                    return Err(map_vk_error(e, "create_fence"));
                }
            };

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = match device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) if !buffers.is_empty() => buffers[0],
                Ok(_) => {
                    device.destroy_fence(in_flight, None);
                    device.destroy_semaphore(render_signal, None);
                    device.destroy_semaphore(acquire_signal, None);
                    return Err(engine_err!(SOURCE, "Command buffer allocation returned nothing"));
                }
                Err(e) => {
                    device.destroy_fence(in_flight, None);
                    device.destroy_semaphore(render_signal, None);
                    device.destroy_semaphore(acquire_signal, None);
                    return Err(map_vk_error(e, "allocate_command_buffers"));
                }
            };

            Ok(FrameSlot {
                acquire_signal: SemaphoreHandle(to_raw(acquire_signal)),
                render_signal: SemaphoreHandle(to_raw(render_signal)),
                in_flight: FenceHandle(to_raw(in_flight)),
                command_buffer: CommandBufferHandle(to_raw(command_buffer)),
            })
        }
    }

    fn destroy_frame_slot(&mut self, slot: FrameSlot) {
        unsafe {
            let device = &self.ctx.device;
            if !slot.command_buffer.is_null() && self.command_pool != vk::CommandPool::null() {
                device.free_command_buffers(self.command_pool, &[from_raw(slot.command_buffer.0)]);
            }
            if !slot.in_flight.is_null() {
                device.destroy_fence(from_raw(slot.in_flight.0), None);
            }
            if !slot.render_signal.is_null() {
                device.destroy_semaphore(from_raw(slot.render_signal.0), None);
            }
            if !slot.acquire_signal.is_null() {
                device.destroy_semaphore(from_raw(slot.acquire_signal.0), None);
            }
        }
    }

    fn wait_for_fence(&mut self, fence: FenceHandle, timeout: Duration) -> Result<()> {
        let nanos = timeout_nanos(timeout);
        unsafe {
            self.device()
                .wait_for_fences(&[from_raw(fence.0)], true, nanos)
                .map_err(|e| map_vk_error(e, "wait_for_fences"))
        }
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        unsafe {
            self.device()
                .reset_fences(&[from_raw(fence.0)])
                .map_err(|e| map_vk_error(e, "reset_fences"))
        }
    }

    // ===== PER FRAME =====

    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainHandle,
        signal: SemaphoreHandle,
    ) -> Result<u32> {
        // The suboptimal flag is ignored here; present reports it once the frame is out
        let (image_index, _suboptimal) = unsafe {
            self.ctx.swapchain_loader.acquire_next_image(
                from_raw(swapchain.0),
                u64::MAX,
                from_raw(signal.0),
                vk::Fence::null(),
            )
        }
        .map_err(|e| map_vk_error(e, "acquire_next_image"))?;

        Ok(image_index)
    }

    fn record_frame(&mut self, recording: &FrameRecording) -> Result<()> {
        let render = self.render_state()?;
        let vertex_buffer = self
            .vertex_buffer
            .as_ref()
            .ok_or_else(|| engine_err!(SOURCE, "Vertex buffer already released"))?;
        let device = &self.ctx.device;
        let command_buffer: vk::CommandBuffer = from_raw(recording.command_buffer.0);
        let extent = to_vk_extent(recording.physical_extent);

        unsafe {
            device.reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| map_vk_error(e, "reset_command_buffer"))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device.begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| map_vk_error(e, "begin_command_buffer"))?;

            let clear_values = [vk::ClearValue {
                color: vk::ClearColorValue { float32: recording.clear_color },
            }];
            let render_area = vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            };
            let render_pass_begin = vk::RenderPassBeginInfo::default()
                .render_pass(render.render_pass)
                .framebuffer(from_raw(recording.framebuffer.0))
                .render_area(render_area)
                .clear_values(&clear_values);
            device.cmd_begin_render_pass(command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);

            let viewport = vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            };
            device.cmd_set_viewport(command_buffer, 0, &[viewport]);
            device.cmd_set_scissor(command_buffer, 0, &[render_area]);

            device.cmd_push_constants(
                command_buffer,
                render.pipeline_layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                recording.push_constants.as_bytes(),
            );

            device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, render.pipeline);
            device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                render.pipeline_layout,
                0,
                &[render.descriptor_set],
                &[],
            );
            device.cmd_bind_vertex_buffers(command_buffer, 0, &[vertex_buffer.buffer], &[0]);
            device.cmd_draw(command_buffer, QUAD_VERTEX_COUNT, 1, 0, 0);

            device.cmd_end_render_pass(command_buffer);
            device.end_command_buffer(command_buffer)
                .map_err(|e| map_vk_error(e, "end_command_buffer"))?;
        }

        Ok(())
    }

    fn submit(&mut self, slot: &FrameSlot) -> Result<()> {
        let wait_semaphores = [from_raw::<vk::Semaphore>(slot.acquire_signal.0)];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [from_raw::<vk::CommandBuffer>(slot.command_buffer.0)];
        let signal_semaphores = [from_raw::<vk::Semaphore>(slot.render_signal.0)];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device()
                .queue_submit(self.ctx.queue, &[submit_info], from_raw(slot.in_flight.0))
                .map_err(|e| map_vk_error(e, "queue_submit"))
        }
    }

    fn present(
        &mut self,
        swapchain: SwapchainHandle,
        image_index: u32,
        wait: SemaphoreHandle,
    ) -> Result<PresentOutcome> {
        let wait_semaphores = [from_raw::<vk::Semaphore>(wait.0)];
        let swapchains = [from_raw::<vk::SwapchainKHR>(swapchain.0)];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.ctx.swapchain_loader.queue_present(self.ctx.queue, &present_info) } {
            Ok(false) => Ok(PresentOutcome::Success),
            Ok(true) => {
                engine_trace!(SOURCE, "Present reported a suboptimal swapchain");
                Ok(PresentOutcome::Suboptimal)
            }
            Err(e) => Err(map_vk_error(e, "queue_present")),
        }
    }

    // ===== TEARDOWN =====

    fn wait_idle(&mut self) -> Result<()> {
        unsafe {
            self.device()
                .device_wait_idle()
                .map_err(|e| map_vk_error(e, "device_wait_idle"))
        }
    }

    fn release_render_resources(&mut self) {
        if self.ctx.is_destroyed() {
            return;
        }

        unsafe {
            if self.command_pool != vk::CommandPool::null() {
                self.ctx.device.destroy_command_pool(self.command_pool, None);
                self.command_pool = vk::CommandPool::null();
            }
        }
        if let Some(mut vertex_buffer) = self.vertex_buffer.take() {
            vertex_buffer.destroy(&self.ctx);
        }
        if let Some(mut render) = self.render.take() {
            render.destroy(&self.ctx.device);
        }
        if let Some(mut texture) = self.texture.take() {
            texture.destroy(&self.ctx);
        }
    }

    fn close(&mut self) {
        self.ctx.destroy();
    }
}

impl Drop for VulkanPresentationDevice {
    fn drop(&mut self) {
        if self.ctx.is_destroyed() {
            return;
        }

        // 1. Let in-flight work retire
        self.wait_idle().ok();

        // 2. Fixed render state (command pool, vertex buffer, pipeline, texture)
        self.release_render_resources();

        // 3. Allocator, device, surface, instance
        self.ctx.destroy();
    }
}
