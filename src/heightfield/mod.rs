//! Height field storage, raw grid I/O and vertex lighting

pub mod heightmap;
pub use heightmap::{HeightField, DEFAULT_HEIGHT};

pub mod lighting;
pub use lighting::{LightingMode, SlopeLight, pack_color};

pub mod generator;
pub use generator::{HeightmapGenerator, HeightmapParams};
