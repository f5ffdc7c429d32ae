/// RetireSchedule - deferred destruction of the superseded generation

use crate::error::{Error, Result};
use crate::swapchain::SwapchainGeneration;

#[derive(Debug)]
struct Retiree {
    generation: SwapchainGeneration,
    target_frame: u64,
}

/// Holds at most one retiring generation until every frame slot has cycled past the swap
///
/// The target is the swap frame plus the number of frames in flight: by then each slot's
/// fence has been waited on at least once after the swap, so no command buffer still
/// references the outgoing images.
#[derive(Debug, Default)]
pub struct RetireSchedule {
    pending: Option<Retiree>,
}

impl RetireSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn target_frame(&self) -> Option<u64> {
        self.pending.as_ref().map(|r| r.target_frame)
    }

    pub fn generation(&self) -> Option<&SwapchainGeneration> {
        self.pending.as_ref().map(|r| &r.generation)
    }

    /// Fail if a generation is already retiring
    pub fn ensure_vacant(&self) -> Result<()> {
        match &self.pending {
            Some(retiree) => Err(Error::InvariantViolation(format!(
                "swapchain {} is still retiring (target frame {})",
                retiree.generation.handle().0,
                retiree.target_frame
            ))),
            None => Ok(()),
        }
    }

    /// Schedule `generation` for destruction at `target_frame`
    ///
    /// # Errors
    ///
    /// `Error::InvariantViolation` if a generation is already retiring; `generation` is
    /// handed back untouched so the caller can still destroy it.
    pub fn schedule(
        &mut self,
        generation: SwapchainGeneration,
        target_frame: u64,
    ) -> std::result::Result<(), (Error, SwapchainGeneration)> {
        if let Err(e) = self.ensure_vacant() {
            return Err((e, generation));
        }
        self.pending = Some(Retiree { generation, target_frame });
        Ok(())
    }

    /// Take the retiring generation once `frame_count` reaches its target
    pub fn take_due(&mut self, frame_count: u64) -> Option<SwapchainGeneration> {
        match &self.pending {
            Some(retiree) if retiree.target_frame == frame_count => {
                self.pending.take().map(|r| r.generation)
            }
            _ => None,
        }
    }

    /// Take the retiring generation regardless of its target (shutdown)
    pub fn take(&mut self) -> Option<SwapchainGeneration> {
        self.pending.take().map(|r| r.generation)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "retire_schedule_tests.rs"]
mod tests;
