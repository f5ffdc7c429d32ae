/// Presenter module - the presentation loop

pub mod presenter;

pub use presenter::*;
