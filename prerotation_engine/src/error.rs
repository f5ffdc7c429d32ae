//! Error types for the PreRotation engine
//!
//! Every value of [`Error`] is fatal: the presentation loop never retries on it and the
//! facade tears the presenter down before handing it to the host. The two recoverable
//! conditions (a suboptimal present and a resize notification) are not errors at all,
//! they are modelled by `PresentOutcome::Suboptimal` and the pending-resize flag.

use std::fmt;

/// Result type for PreRotation engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which extension list a [`Error::MissingExtensions`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    /// Instance-level extensions (surface, platform surface, debug utils)
    Instance,
    /// Device-level extensions (swapchain)
    Device,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionKind::Instance => write!(f, "instance"),
            ExtensionKind::Device => write!(f, "device"),
        }
    }
}

/// PreRotation engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (a failed graphics-device call)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, shader, asset, ...)
    InvalidResource(String),

    /// Initialization failed (engine, device, subsystems)
    InitializationFailed(String),

    /// The graphics device was lost
    DeviceLost(String),

    /// A bounded wait expired (hung GPU)
    Timeout(String),

    /// Required extensions are not supported by the platform
    MissingExtensions {
        kind: ExtensionKind,
        missing: Vec<String>,
    },

    /// An internal protocol invariant was broken
    InvariantViolation(String),
}

impl Error {
    /// Whether the error must stop the presentation loop
    ///
    /// Always true: recoverable conditions never travel as `Error`.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::DeviceLost(msg) => write!(f, "Device lost: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::MissingExtensions { kind, missing } => {
                write!(f, "Missing {} extensions: {}", kind, missing.join(", "))
            }
            Error::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
