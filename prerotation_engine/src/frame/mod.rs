/// Frame module - in-flight frame slots

pub mod frame_ring;

pub use frame_ring::*;
