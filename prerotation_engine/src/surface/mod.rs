/// Surface module - orientation and extent of the presentable surface

pub mod pre_transform;
pub mod surface_probe;

pub use pre_transform::*;
pub use surface_probe::*;
