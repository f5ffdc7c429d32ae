/// PresenterConfig - tuning constants of the presentation loop

use std::time::Duration;
use crate::error::{Error, Result};

/// Presentation loop configuration
///
/// The defaults are the values the swap protocol was designed around; only change them
/// together (see [`validate`](PresenterConfig::validate)).
#[derive(Debug, Clone)]
pub struct PresenterConfig {
    /// Number of frame slots (fence + two semaphores + command buffer)
    pub frames_in_flight: u32,
    /// Frames a 90°/270° rotation is debounced before the swapchain is rebuilt
    pub pre_rotation_latency: u32,
    /// Upper bound on a frame slot fence wait
    pub fence_timeout: Duration,
    /// minImageCount requested for every swapchain generation
    pub required_image_count: u32,
    /// Clear value of the color attachment
    pub clear_color: [f32; 4],
    /// Delay returned by `next_callback_delay`
    pub callback_delay: Duration,
    /// A trace line is emitted every `log_interval` frames
    pub log_interval: u64,
    /// Application name reported to the instance
    pub app_name: String,
    /// Request the validation layer (only honored with the `vulkan-validation` feature)
    pub enable_validation: bool,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            pre_rotation_latency: 30,
            fence_timeout: Duration::from_secs(30),
            required_image_count: 3,
            clear_color: [0.5, 0.5, 0.5, 1.0],
            callback_delay: Duration::from_millis(13),
            log_interval: 100,
            app_name: "PreRotation".to_string(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl PresenterConfig {
    /// Check the constants against each other
    ///
    /// # Errors
    ///
    /// Returns `Error::InitializationFailed` if a count is zero, or if the rotation latency
    /// does not exceed the number of frames in flight. In that case a second swap could be
    /// triggered while the previous generation is still retiring.
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InitializationFailed(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }
        if self.required_image_count == 0 {
            return Err(Error::InitializationFailed(
                "required_image_count must be at least 1".to_string(),
            ));
        }
        if self.pre_rotation_latency <= self.frames_in_flight {
            return Err(Error::InitializationFailed(format!(
                "pre_rotation_latency ({}) must exceed frames_in_flight ({})",
                self.pre_rotation_latency, self.frames_in_flight
            )));
        }
        if self.log_interval == 0 {
            return Err(Error::InitializationFailed(
                "log_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Timeout in nanoseconds, saturated to `u64`, as device wait calls take it
pub fn timeout_nanos(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
