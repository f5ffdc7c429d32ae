/// FrameRing - fixed set of frame slots cycled by frame count

use crate::device::{
    CommandBufferHandle, FenceHandle, PresentationDevice, SemaphoreHandle,
};
use crate::error::{Error, Result};

/// Synchronization objects and command buffer of one in-flight frame
///
/// The fence is the only thing preventing the CPU from re-recording a command buffer the
/// GPU is still reading: it must be waited on before any other member is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSlot {
    /// Signaled when the acquired image may be rendered to
    pub acquire_signal: SemaphoreHandle,
    /// Signaled when rendering finished, waited on by present
    pub render_signal: SemaphoreHandle,
    /// Signaled when the submitted command buffer retired
    pub in_flight: FenceHandle,
    pub command_buffer: CommandBufferHandle,
}

/// Exactly `frames_in_flight` slots, created once and destroyed once
#[derive(Debug)]
pub struct FrameRing {
    slots: Vec<FrameSlot>,
}

impl FrameRing {
    /// Create `count` slots
    ///
    /// On failure the slots already created are destroyed before returning.
    pub fn create<D: PresentationDevice>(device: &mut D, count: u32) -> Result<Self> {
        if count == 0 {
            return Err(Error::InvariantViolation(
                "frame ring needs at least one slot".to_string(),
            ));
        }

        let mut slots = Vec::with_capacity(count as usize);
        for _ in 0..count {
            match device.create_frame_slot() {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    for slot in slots.drain(..).rev() {
                        device.destroy_frame_slot(slot);
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot used by frame `frame_count`
    pub fn slot_index(&self, frame_count: u64) -> usize {
        (frame_count % self.slots.len() as u64) as usize
    }

    pub fn slot(&self, frame_count: u64) -> &FrameSlot {
        &self.slots[self.slot_index(frame_count)]
    }

    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }

    /// Destroy every slot; the GPU must be idle
    pub fn destroy<D: PresentationDevice>(mut self, device: &mut D) {
        for slot in self.slots.drain(..) {
            device.destroy_frame_slot(slot);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
