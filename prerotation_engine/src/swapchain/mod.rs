/// Swapchain module - generations, swap policy and retirement

pub mod generation;
pub mod retire_schedule;
pub mod swap_policy;

pub use generation::*;
pub use retire_schedule::*;
pub use swap_policy::*;
