//! Texture map generation from height-banded tiles

pub mod blend;
pub use blend::{TextureTileBlend, TileRegion, MAX_TILES};

pub mod tile;
pub use tile::{load_tile_image, save_texture_map};
