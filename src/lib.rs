//! Ridgeline - a patch-based height-field terrain renderer

pub mod core;
pub mod math;
pub mod heightfield;
pub mod render;
pub mod terrain;
pub mod texture;
