/// Device module - GPU capability trait used by the presentation loop

pub mod presentation_device;

pub use presentation_device::*;

// Mock device for tests (no GPU required)
#[cfg(test)]
pub mod mock_presentation_device;
