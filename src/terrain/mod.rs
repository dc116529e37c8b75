//! Patch-based terrain surface

pub mod bounds;
pub use bounds::{BoundsNode, BoundsTree, NodeId};

pub mod config;
pub use config::TerrainConfig;

pub mod indices;
pub use indices::{FanVariant, IndicesInfo, PatchIndexBuilder};

pub mod lod;

pub mod patch;
pub use patch::Patch;

pub mod pick;
pub use pick::{pick_fan_vertex, ray_intersects_patch, PickRegion};

pub mod surface;
pub use surface::TerrainSurface;
