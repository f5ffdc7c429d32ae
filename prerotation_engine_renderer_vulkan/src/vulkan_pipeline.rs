/// Fixed render state - render pass, texture descriptors and the quad pipeline
///
/// Built once at open. The pipeline reads two push-constant matrices in the vertex stage
/// (`mat4 mvp`, `mat2 preRotate`) and samples one texture in the fragment stage.

use prerotation_engine::prerotation::{Error, Result};
use prerotation_engine::prerotation::present::PushConstantBlock;
use prerotation_engine::{engine_debug, engine_err, engine_error};
use ash::vk;
use std::io::Cursor;

use crate::vulkan_buffer::VERTEX_STRIDE;
use crate::vulkan_texture::Texture;

const SOURCE: &str = "prerotation::vulkan";

/// Parse SPIR-V bytes into words
pub fn read_spirv(bytes: &[u8], name: &str) -> Result<Vec<u32>> {
    ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|e| {
        engine_error!(SOURCE, "Invalid SPIR-V in {}: {}", name, e);
        Error::InvalidResource(format!("Invalid SPIR-V in {}: {}", name, e))
    })
}

/// Push-constant range shared by pipeline layout and recording
pub fn push_constant_range() -> vk::PushConstantRange {
    vk::PushConstantRange {
        stage_flags: vk::ShaderStageFlags::VERTEX,
        offset: 0,
        size: PushConstantBlock::SIZE,
    }
}

pub struct RenderState {
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) descriptor_set_layout: vk::DescriptorSetLayout,
    pub(crate) descriptor_pool: vk::DescriptorPool,
    pub(crate) descriptor_set: vk::DescriptorSet,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    pub(crate) pipeline: vk::Pipeline,
}

impl RenderState {
    /// Create every fixed object; on failure the partially built state is destroyed
    pub fn new(
        device: &ash::Device,
        color_format: vk::Format,
        vertex_spirv: &[u8],
        fragment_spirv: &[u8],
        texture: &Texture,
    ) -> Result<Self> {
        let mut state = Self {
            render_pass: vk::RenderPass::null(),
            descriptor_set_layout: vk::DescriptorSetLayout::null(),
            descriptor_pool: vk::DescriptorPool::null(),
            descriptor_set: vk::DescriptorSet::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
        };

        match state.build(device, color_format, vertex_spirv, fragment_spirv, texture) {
            Ok(()) => {
                engine_debug!(SOURCE, "Render state created (format {:?})", color_format);
                Ok(state)
            }
            Err(e) => {
                state.destroy(device);
                Err(e)
            }
        }
    }

    fn build(
        &mut self,
        device: &ash::Device,
        color_format: vk::Format,
        vertex_spirv: &[u8],
        fragment_spirv: &[u8],
        texture: &Texture,
    ) -> Result<()> {
        self.create_render_pass(device, color_format)?;
        self.create_descriptors(device, texture)?;
        self.create_pipeline(device, vertex_spirv, fragment_spirv)
    }

    fn create_render_pass(&mut self, device: &ash::Device, color_format: vk::Format) -> Result<()> {
        let color_attachment = vk::AttachmentDescription::default()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

        let color_attachment_ref = vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(std::slice::from_ref(&color_attachment_ref));

        // Image layout transition waits for the acquire semaphore stage
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(std::slice::from_ref(&color_attachment))
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        self.render_pass = unsafe { device.create_render_pass(&render_pass_info, None) }
            .map_err(|e| engine_err!(SOURCE, "Failed to create render pass: {:?}", e))?;
        Ok(())
    }

    fn create_descriptors(&mut self, device: &ash::Device, texture: &Texture) -> Result<()> {
        unsafe {
            let binding = vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT);
            let layout_create = vk::DescriptorSetLayoutCreateInfo::default()
                .bindings(std::slice::from_ref(&binding));
            self.descriptor_set_layout = device.create_descriptor_set_layout(&layout_create, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create descriptor set layout: {:?}", e))?;

            let pool_sizes = [vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 1,
            }];
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&pool_sizes)
                .max_sets(1);
            self.descriptor_pool = device.create_descriptor_pool(&pool_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create descriptor pool: {:?}", e))?;

            let set_layouts = [self.descriptor_set_layout];
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(self.descriptor_pool)
                .set_layouts(&set_layouts);
            self.descriptor_set = device.allocate_descriptor_sets(&allocate_info)
                .map_err(|e| engine_err!(SOURCE, "Failed to allocate descriptor set: {:?}", e))?
                .into_iter()
                .next()
                .ok_or_else(|| engine_err!(SOURCE, "No descriptor set allocated"))?;

            let image_info = vk::DescriptorImageInfo::default()
                .sampler(texture.sampler)
                .image_view(texture.view)
                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
            let write = vk::WriteDescriptorSet::default()
                .dst_set(self.descriptor_set)
                .dst_binding(0)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(std::slice::from_ref(&image_info));
            device.update_descriptor_sets(&[write], &[]);

            Ok(())
        }
    }

    fn create_pipeline(&mut self, device: &ash::Device, vertex_spirv: &[u8], fragment_spirv: &[u8]) -> Result<()> {
        unsafe {
            let set_layouts = [self.descriptor_set_layout];
            let push_constant_ranges = [push_constant_range()];
            let layout_create_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(&set_layouts)
                .push_constant_ranges(&push_constant_ranges);
            self.pipeline_layout = device.create_pipeline_layout(&layout_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create pipeline layout: {:?}", e))?;

            let vertex_code = read_spirv(vertex_spirv, "vertex shader")?;
            let fragment_code = read_spirv(fragment_spirv, "fragment shader")?;

            let vertex_module = device
                .create_shader_module(&vk::ShaderModuleCreateInfo::default().code(&vertex_code), None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create vertex shader module: {:?}", e))?;
            let fragment_module = match device
                .create_shader_module(&vk::ShaderModuleCreateInfo::default().code(&fragment_code), None)
            {
                Ok(module) => module,
                Err(e) => {
                    device.destroy_shader_module(vertex_module, None);
                    return Err(engine_err!(SOURCE, "Failed to create fragment shader module: {:?}", e));
                }
            };

            let result = self.create_graphics_pipeline(device, vertex_module, fragment_module);

            // Modules are only needed during pipeline creation
            device.destroy_shader_module(vertex_module, None);
            device.destroy_shader_module(fragment_module, None);

            self.pipeline = result?;
            Ok(())
        }
    }

    unsafe fn create_graphics_pipeline(
        &self,
        device: &ash::Device,
        vertex_module: vk::ShaderModule,
        fragment_module: vk::ShaderModule,
    ) -> Result<vk::Pipeline> {
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(c"main"),
        ];

        // vec2 position, vec2 uv
        let vertex_bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: VERTEX_STRIDE,
            input_rate: vk::VertexInputRate::VERTEX,
        }];
        let vertex_attributes = [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 2 * std::mem::size_of::<f32>() as u32,
            },
        ];
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_STRIP)
            .primitive_restart_enable(false);

        // Viewport state (dynamic)
        let viewports = [vk::Viewport::default()];
        let scissors = [vk::Rect2D::default()];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false)
            .line_width(1.0);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .sample_shading_enable(false);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(
                vk::ColorComponentFlags::R
                    | vk::ColorComponentFlags::G
                    | vk::ColorComponentFlags::B
                    | vk::ColorComponentFlags::A,
            );
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment));

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(self.pipeline_layout)
            .render_pass(self.render_pass)
            .subpass(0);

        let pipelines = device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
            .map_err(|e| engine_err!(SOURCE, "Failed to create graphics pipeline: {:?}", e.1))?;

        pipelines
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!(SOURCE, "No graphics pipeline created"))
    }

    /// Destroy pipeline, render pass and descriptors; safe on a partially built state
    pub fn destroy(&mut self, device: &ash::Device) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                device.destroy_pipeline(self.pipeline, None);
                self.pipeline = vk::Pipeline::null();
            }
            if self.pipeline_layout != vk::PipelineLayout::null() {
                device.destroy_pipeline_layout(self.pipeline_layout, None);
                self.pipeline_layout = vk::PipelineLayout::null();
            }
            if self.render_pass != vk::RenderPass::null() {
                device.destroy_render_pass(self.render_pass, None);
                self.render_pass = vk::RenderPass::null();
            }
            // Freed with the pool
            self.descriptor_set = vk::DescriptorSet::null();
            if self.descriptor_pool != vk::DescriptorPool::null() {
                device.destroy_descriptor_pool(self.descriptor_pool, None);
                self.descriptor_pool = vk::DescriptorPool::null();
            }
            if self.descriptor_set_layout != vk::DescriptorSetLayout::null() {
                device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
                self.descriptor_set_layout = vk::DescriptorSetLayout::null();
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
