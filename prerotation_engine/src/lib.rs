/*!
# PreRotation Engine

Backend-agnostic core of a pre-rotated presentation loop for mobile surfaces.

Instead of letting the compositor rotate every frame, swapchain images are allocated in
the display's physical orientation and the vertex stage rotates the content. This crate
holds everything that does not touch a GPU API directly; a backend implements
[`PresentationDevice`](device::PresentationDevice).

## Architecture

- **Surface**: probe answers ([`SurfaceSnapshot`](surface::SurfaceSnapshot)) and the four
  handled rotations ([`PreTransform`](surface::PreTransform))
- **Swapchain**: generations with lazily built views/framebuffers, the swap scheduler
  (debounce) and the single-slot retirement schedule
- **Frame**: the ring of in-flight frame slots
- **Rotation**: 2×2 correction and 4×4 aspect-fit matrices, sent as one push-constant block
- **Presenter**: the per-frame state machine
- **Engine**: host lifecycle entry points behind one lock, and the global logger
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod asset;
pub mod config;
pub mod device;
pub mod extensions;
pub mod frame;
pub mod presenter;
pub mod rotation;
pub mod surface;
pub mod swapchain;

// Main prerotation namespace module
pub mod prerotation {
    // Error types
    pub use crate::error::{Error, ExtensionKind, Result};

    // Logger access and host facade
    pub use crate::engine::{Engine, PresentationEngine};

    // Device capability trait
    pub use crate::device::PresentationDevice;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod asset {
        pub use crate::asset::*;
    }

    pub mod config {
        pub use crate::config::*;
    }

    pub mod device {
        pub use crate::device::*;
    }

    pub mod extensions {
        pub use crate::extensions::*;
    }

    // Presentation loop building blocks
    pub mod present {
        pub use crate::frame::*;
        pub use crate::presenter::*;
        pub use crate::rotation::*;
        pub use crate::surface::*;
        pub use crate::swapchain::*;
    }
}

// Re-export math library at crate root
pub use glam;
