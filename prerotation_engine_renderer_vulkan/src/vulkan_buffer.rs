/// VertexBuffer - host-visible vertex buffer holding the textured quad

use prerotation_engine::prerotation::{Error, Result};
use prerotation_engine::{engine_err, engine_error};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;

use crate::vulkan_context::GpuContext;

const SOURCE: &str = "prerotation::vulkan";

/// Four vertices drawn as a triangle strip: vec2 position, vec2 uv
pub const QUAD_VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0, // left top
    -1.0, 1.0, 0.0, 1.0, // left bottom
    1.0, -1.0, 1.0, 0.0, // right top
    1.0, 1.0, 1.0, 1.0, // right bottom
];

/// Bytes per vertex
pub const VERTEX_STRIDE: u32 = 4 * std::mem::size_of::<f32>() as u32;

pub const QUAD_VERTEX_COUNT: u32 = (QUAD_VERTICES.len() as u32 * 4) / VERTEX_STRIDE;

pub struct VertexBuffer {
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl VertexBuffer {
    /// Allocate and fill the quad buffer
    pub fn quad(ctx: &GpuContext) -> Result<Self> {
        let data: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES);
        let mut buffer = Self::new(ctx, data.len() as u64)?;
        if let Err(e) = buffer.update(0, data) {
            buffer.destroy(ctx);
            return Err(e);
        }
        Ok(buffer)
    }

    fn new(ctx: &GpuContext, size: u64) -> Result<Self> {
        unsafe {
            let device = &ctx.device;

            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(vk::BufferUsageFlags::VERTEX_BUFFER)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = device.create_buffer(&buffer_create_info, None)
                .map_err(|e| engine_err!(SOURCE, "Failed to create vertex buffer of size {} bytes: {:?}", size, e))?;

            let requirements = device.get_buffer_memory_requirements(buffer);
            let allocation = ctx.allocator().and_then(|mut allocator| {
                allocator
                    .allocate(&AllocationCreateDesc {
                        name: "vertex_buffer",
                        requirements,
                        location: MemoryLocation::CpuToGpu,
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_e| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        engine_error!(SOURCE, "Out of GPU memory for vertex buffer (required: {:.2} MB)", size_mb);
                        Error::OutOfMemory
                    })
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            let mut vertex_buffer = Self {
                buffer,
                allocation: Some(allocation),
                size,
            };

            if let Some(allocation) = &vertex_buffer.allocation {
                if let Err(e) = device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                    vertex_buffer.destroy(ctx);
                    return Err(engine_err!(SOURCE, "Failed to bind vertex buffer memory: {:?}", e));
                }
            }

            Ok(vertex_buffer)
        }
    }

    /// Copy `data` into the mapped buffer at `offset`
    pub fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "Vertex buffer update out of range ({} + {} > {})",
                offset,
                data.len(),
                self.size
            )));
        }

        unsafe {
            if let Some(allocation) = &self.allocation {
                let mapped_ptr = allocation
                    .mapped_ptr()
                    .ok_or_else(|| Error::BackendError("Vertex buffer is not CPU-accessible".to_string()))?
                    .as_ptr() as *mut u8;

                std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
                Ok(())
            } else {
                engine_error!(SOURCE, "Vertex buffer update failed: no GPU allocation");
                Err(Error::BackendError("Vertex buffer has no allocation".to_string()))
            }
        }
    }

    pub fn destroy(&mut self, ctx: &GpuContext) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            if self.buffer != vk::Buffer::null() {
                ctx.device.destroy_buffer(self.buffer, None);
                self.buffer = vk::Buffer::null();
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "vulkan_buffer_tests.rs"]
mod tests;
