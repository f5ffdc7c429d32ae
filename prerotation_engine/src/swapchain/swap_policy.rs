/// SwapScheduler - decides when a swap trigger turns into a swapchain rebuild
///
/// A trigger is either a suboptimal presentation or a pending resize. Quarter-turn
/// rotations emit suboptimal results for several frames while the platform settles, so
/// those are debounced by a countdown; a half turn cannot distort the picture and a resize
/// is explicit, both swap at once. A swap is never started while the previous generation
/// is still retiring: the trigger stays armed and fires on the next frame that allows it.

use crate::surface::Extent2D;

/// Verdict for one triggered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDecision {
    /// Rebuild now
    Swap,
    /// Debounced; this many further triggers are needed before a swap
    Countdown(u32),
    /// Due, but a retiring generation still occupies the single retirement slot
    BlockedByRetirement,
}

#[derive(Debug, Clone)]
pub struct SwapScheduler {
    latency: u32,
    countdown: u32,
    resize_pending: bool,
}

impl SwapScheduler {
    pub fn new(latency: u32) -> Self {
        let latency = latency.max(1);
        Self {
            latency,
            countdown: latency,
            resize_pending: false,
        }
    }

    pub fn latency(&self) -> u32 {
        self.latency
    }

    /// Triggers left before a debounced swap fires
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Record a resize notification
    ///
    /// Only arms the trigger when the size differs from `current`, the logical extent of
    /// the generation being presented. A zero-area size never arms it. Repeated
    /// notifications coalesce. Returns whether the trigger is armed.
    pub fn notify_resize(&mut self, width: u32, height: u32, current: Extent2D) -> bool {
        let requested = Extent2D::new(width, height);
        if !requested.is_empty() && requested != current {
            self.resize_pending = true;
        }
        self.resize_pending
    }

    /// Whether this frame's present result needs a decision at all
    pub fn is_triggered(&self, suboptimal: bool) -> bool {
        suboptimal || self.resize_pending
    }

    /// Decide for a triggered frame
    ///
    /// `half_turn` is true when the surface now reports the transform opposite to the
    /// current generation's. On `Swap` the countdown is re-seeded and the resize trigger
    /// is consumed.
    pub fn decide(&mut self, half_turn: bool, retire_pending: bool) -> SwapDecision {
        let due = half_turn || self.resize_pending || self.countdown <= 1;
        if !due {
            self.countdown -= 1;
            return SwapDecision::Countdown(self.countdown);
        }

        if retire_pending {
            return SwapDecision::BlockedByRetirement;
        }

        self.countdown = self.latency;
        self.resize_pending = false;
        SwapDecision::Swap
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "swap_policy_tests.rs"]
mod tests;
