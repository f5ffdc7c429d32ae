/// Rotation module - shader-side pre-rotation correction

pub mod corrector;

pub use corrector::*;
