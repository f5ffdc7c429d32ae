/// Presenter - the per-frame presentation state machine
///
/// Owns the device, the current swapchain generation, the optional retiring generation
/// and the frame ring. One call to [`draw_frame`](Presenter::draw_frame) runs one frame
/// through wait, reset, acquire, materialize, record, submit, present, retire check and
/// swap check, in that order.

use crate::config::PresenterConfig;
use crate::device::{FrameRecording, PresentOutcome, PresentationDevice};
use crate::error::{Error, Result};
use crate::frame::FrameRing;
use crate::rotation::RotationCorrection;
use crate::surface::{Extent2D, SurfaceSnapshot};
use crate::swapchain::{RetireSchedule, SwapDecision, SwapScheduler, SwapchainGeneration};

pub struct Presenter<D: PresentationDevice> {
    device: D,
    config: PresenterConfig,
    /// Native size of the displayed texture
    content_extent: Extent2D,
    /// `None` only after shutdown
    current: Option<SwapchainGeneration>,
    retiring: RetireSchedule,
    scheduler: SwapScheduler,
    /// `None` only after shutdown
    ring: Option<FrameRing>,
    frame_count: u64,
    swap_count: u64,
    /// Set while the host reports a zero-area window
    paused: bool,
}

impl<D: PresentationDevice> Presenter<D> {
    /// Build the first generation and the frame ring on an opened device
    ///
    /// The surface is probed once here, before any swapchain exists.
    pub fn new(mut device: D, config: PresenterConfig) -> Result<Self> {
        config.validate()?;

        let content_extent = device.content_extent();
        let surface = device.probe_surface()?;
        let current = SwapchainGeneration::build(
            &mut device,
            surface,
            config.required_image_count,
            None,
        )?;

        let ring = match FrameRing::create(&mut device, config.frames_in_flight) {
            Ok(ring) => ring,
            Err(e) => {
                current.destroy(&mut device);
                device.release_render_resources();
                device.close();
                return Err(e);
            }
        };

        crate::engine_info!(
            "prerotation::Presenter",
            "Presenter ready: surface {}x{} ({:?}), content {}x{}, {} frames in flight",
            surface.extent.width,
            surface.extent.height,
            surface.transform,
            content_extent.width,
            content_extent.height,
            ring.len()
        );

        let scheduler = SwapScheduler::new(config.pre_rotation_latency);
        Ok(Self {
            device,
            config,
            content_extent,
            current: Some(current),
            retiring: RetireSchedule::new(),
            scheduler,
            ring: Some(ring),
            frame_count: 0,
            swap_count: 0,
            paused: false,
        })
    }

    // ===== ACCESSORS =====

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Number of swaps executed since creation
    pub fn swap_count(&self) -> u64 {
        self.swap_count
    }

    /// True while frames are skipped because the window has no area
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current(&self) -> Option<&SwapchainGeneration> {
        self.current.as_ref()
    }

    pub fn retiring(&self) -> &RetireSchedule {
        &self.retiring
    }

    pub fn scheduler(&self) -> &SwapScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn is_shut_down(&self) -> bool {
        self.current.is_none()
    }

    /// Correction the next frame will push
    pub fn correction(&self) -> Option<RotationCorrection> {
        self.current.as_ref().map(|g| {
            RotationCorrection::compute(g.logical_extent(), self.content_extent, g.transform())
        })
    }

    // ===== HOST NOTIFICATIONS =====

    /// Record a resize; consumed by the next frame's swap check
    ///
    /// A zero-area size pauses presentation until a non-zero size arrives. Never
    /// touches swapchain resources.
    pub fn notify_resized(&mut self, width: u32, height: u32) {
        let Some(current) = self.current.as_ref() else {
            return;
        };

        let requested = Extent2D::new(width, height);
        if requested.is_empty() {
            if !self.paused {
                crate::engine_debug!(
                    "prerotation::Presenter",
                    "Window has no area, presentation paused at frame {}",
                    self.frame_count
                );
            }
            self.paused = true;
            return;
        }
        if self.paused {
            crate::engine_debug!(
                "prerotation::Presenter",
                "Presentation resumed at {}x{}",
                width,
                height
            );
            self.paused = false;
        }

        self.device.set_window_extent(requested);
        if self.scheduler.notify_resize(width, height, current.logical_extent()) {
            crate::engine_debug!(
                "prerotation::Presenter",
                "Resize to {}x{} requested (current {}x{})",
                width,
                height,
                current.logical_extent().width,
                current.logical_extent().height
            );
        }
    }

    // ===== FRAME =====

    /// Run one frame
    ///
    /// # Errors
    ///
    /// Any device failure is fatal; the presenter must then be shut down.
    pub fn draw_frame(&mut self) -> Result<()> {
        let (Some(ring), Some(current)) = (self.ring.as_ref(), self.current.as_mut()) else {
            return Err(Error::InvariantViolation(
                "draw_frame called after shutdown".to_string(),
            ));
        };
        if self.paused {
            return Ok(());
        }
        let slot = *ring.slot(self.frame_count);

        // 1. Wait: the slot's previous command buffer has retired
        self.device.wait_for_fence(slot.in_flight, self.config.fence_timeout)?;
        // 2. Reset
        self.device.reset_fence(slot.in_flight)?;
        // 3. Acquire
        let image_index = self
            .device
            .acquire_next_image(current.handle(), slot.acquire_signal)?;
        // 4. Materialize
        let framebuffer = current.materialize(&mut self.device, image_index)?;
        // 5. Record
        let correction = RotationCorrection::compute(
            current.logical_extent(),
            self.content_extent,
            current.transform(),
        );
        self.device.record_frame(&FrameRecording {
            command_buffer: slot.command_buffer,
            framebuffer,
            physical_extent: current.physical_extent(),
            push_constants: correction.push_constants(),
            clear_color: self.config.clear_color,
        })?;
        // 6. Submit
        self.device.submit(&slot)?;
        // 7. Present
        let outcome = self
            .device
            .present(current.handle(), image_index, slot.render_signal)?;
        // 8. Retire check
        self.retire_due();
        // 9. Swap check
        self.check_swap(outcome)?;
        // 10. Advance
        self.frame_count += 1;
        if self.frame_count % self.config.log_interval == 0 {
            crate::engine_trace!(
                "prerotation::Presenter",
                "Frame {} ({:?})",
                self.frame_count,
                outcome
            );
        }

        Ok(())
    }

    fn retire_due(&mut self) {
        if let Some(retired) = self.retiring.take_due(self.frame_count) {
            let handle = retired.handle();
            retired.destroy(&mut self.device);
            crate::engine_debug!(
                "prerotation::Presenter",
                "Retired swapchain {} at frame {}",
                handle.0,
                self.frame_count
            );
        }
    }

    fn check_swap(&mut self, outcome: PresentOutcome) -> Result<()> {
        let suboptimal = outcome == PresentOutcome::Suboptimal;
        if !self.scheduler.is_triggered(suboptimal) {
            return Ok(());
        }

        let current_transform = match self.current.as_ref() {
            Some(current) => current.transform(),
            None => return Ok(()),
        };

        let surface = self.device.probe_surface()?;
        if surface.extent.is_empty() {
            // Triggers stay armed until the surface has area again
            crate::engine_trace!(
                "prerotation::Presenter",
                "Swap skipped at frame {}: surface has no area",
                self.frame_count
            );
            return Ok(());
        }
        let half_turn = surface.transform.is_half_turn_from(current_transform);

        match self.scheduler.decide(half_turn, self.retiring.is_pending()) {
            SwapDecision::Swap => self.swap(surface, outcome),
            SwapDecision::Countdown(remaining) => {
                crate::engine_trace!(
                    "prerotation::Presenter",
                    "Swap deferred at frame {}: {} triggers left",
                    self.frame_count,
                    remaining
                );
                Ok(())
            }
            SwapDecision::BlockedByRetirement => {
                crate::engine_debug!(
                    "prerotation::Presenter",
                    "Swap deferred at frame {}: previous swapchain still retiring",
                    self.frame_count
                );
                Ok(())
            }
        }
    }

    /// Replace the current generation and schedule the outgoing one for retirement
    fn swap(&mut self, surface: SurfaceSnapshot, outcome: PresentOutcome) -> Result<()> {
        self.retiring.ensure_vacant()?;

        let new = SwapchainGeneration::build(
            &mut self.device,
            surface,
            self.config.required_image_count,
            self.current.as_ref(),
        )?;
        let Some(old) = self.current.replace(new) else {
            return Ok(());
        };

        let target = self.frame_count + u64::from(self.config.frames_in_flight);
        if let Err((e, old)) = self.retiring.schedule(old, target) {
            old.destroy(&mut self.device);
            return Err(e);
        }
        self.swap_count += 1;

        crate::engine_debug!(
            "prerotation::Presenter",
            "Swapchain recreated at frame {} ({:?}): {:?}, old one retires at frame {}",
            self.frame_count,
            outcome,
            surface.transform,
            target
        );

        Ok(())
    }

    // ===== SHUTDOWN =====

    /// Destroy everything in reverse-dependency order
    ///
    /// Frame slots, then the fixed render state, then the retiring and current
    /// generations, then surface, device and instance. Idempotent. Destruction continues
    /// even if waiting for the device fails; that error is returned at the end.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.current.is_none() && self.ring.is_none() {
            return Ok(());
        }

        let idle = self.device.wait_idle();
        if let Err(e) = &idle {
            crate::engine_error!(
                "prerotation::Presenter",
                "wait_idle failed during shutdown: {}",
                e
            );
        }

        // 1. Frame slots (fences, semaphores, command buffers)
        if let Some(ring) = self.ring.take() {
            ring.destroy(&mut self.device);
        }
        // 2. Command pool, pipeline, render pass, descriptors, textures
        self.device.release_render_resources();
        // 3. Swapchain generations
        if let Some(retiring) = self.retiring.take() {
            retiring.destroy(&mut self.device);
        }
        if let Some(current) = self.current.take() {
            current.destroy(&mut self.device);
        }
        // 4. Surface, device, instance
        self.device.close();

        crate::engine_info!(
            "prerotation::Presenter",
            "Presenter shut down after {} frames",
            self.frame_count
        );

        idle
    }
}

impl<D: PresentationDevice> Drop for Presenter<D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            crate::engine_error!("prerotation::Presenter", "Shutdown on drop failed: {}", e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "presenter_tests.rs"]
mod tests;
