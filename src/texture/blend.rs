//! Height-banded blending of up to four texture tiles into one texture map.
//!
//! Loaded tiles split the 0-255 height range into equal bands in level order.
//! A tile is fully present on its band's plateau and fades out linearly over
//! one band width on either side. The lowest band stays saturated down to 0
//! and the highest up to 255.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::core::types::Result;
use crate::core::Error;
use crate::heightfield::HeightField;
use super::tile::load_tile_image;

/// Number of tile slots
pub const MAX_TILES: usize = 4;

/// Height band of one tile
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileRegion {
    pub lowest: f32,
    pub optimal_low: f32,
    pub optimal_high: f32,
    pub highest: f32,
}

impl TileRegion {
    /// Weight of the tile at `height`, in [0, 1]
    pub fn presence(&self, height: f32) -> f32 {
        if height < self.lowest || height > self.highest {
            0.0
        } else if height < self.optimal_low {
            (height - self.lowest) / (self.optimal_low - self.lowest)
        } else if height > self.optimal_high {
            (self.highest - height) / (self.highest - self.optimal_high)
        } else {
            1.0
        }
    }
}

/// Tile slots plus their lazily computed height bands
#[derive(Clone, Debug, Default)]
pub struct TextureTileBlend {
    tiles: [Option<RgbImage>; MAX_TILES],
    regions: [Option<TileRegion>; MAX_TILES],
    is_updated: bool,
}

fn check_level(level: usize) -> Result<()> {
    if level >= MAX_TILES {
        return Err(Error::OutOfRange(format!("tile level {} (max {})", level, MAX_TILES - 1)));
    }
    Ok(())
}

impl TextureTileBlend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the tile for `level` from an image file, replacing any previous one
    pub fn load_tile(&mut self, level: usize, path: impl AsRef<Path>) -> Result<()> {
        check_level(level)?;
        let path = path.as_ref();
        let image = load_tile_image(path)?;
        log::info!(
            "Loaded tile {} ({}x{}) from {}",
            level,
            image.width(),
            image.height(),
            path.display()
        );
        self.set_tile(level, image)
    }

    pub fn set_tile(&mut self, level: usize, image: RgbImage) -> Result<()> {
        check_level(level)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::InvalidParameter(format!("tile {} has no pixels", level)));
        }
        self.tiles[level] = Some(image);
        self.is_updated = false;
        Ok(())
    }

    pub fn unload_tile(&mut self, level: usize) -> Result<()> {
        check_level(level)?;
        if self.tiles[level].take().is_some() {
            self.is_updated = false;
        }
        Ok(())
    }

    pub fn unload_all(&mut self) {
        self.tiles = Default::default();
        self.is_updated = false;
    }

    pub fn tile(&self, level: usize) -> Option<&RgbImage> {
        self.tiles.get(level).and_then(|t| t.as_ref())
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }

    /// Recompute the height bands if a tile changed since the last call
    pub fn update_regions(&mut self) {
        if self.is_updated {
            return;
        }

        self.regions = [None; MAX_TILES];
        let count = self.tile_count();
        if count > 0 {
            let width = 255.0 / count as f32;
            let loaded = self.tiles.iter().enumerate().filter(|(_, t)| t.is_some()).map(|(l, _)| l);
            for (band, level) in loaded.enumerate() {
                let optimal = width * (band as f32 + 0.5);
                let mut region = TileRegion {
                    lowest: optimal - width,
                    optimal_low: optimal,
                    optimal_high: optimal,
                    highest: optimal + width,
                };
                if band == 0 {
                    region.lowest = 0.0;
                    region.optimal_low = 0.0;
                }
                if band == count - 1 {
                    region.optimal_high = 255.0;
                    region.highest = 255.0;
                }
                self.regions[level] = Some(region);
            }
        }

        self.is_updated = true;
        log::debug!("Updated height bands for {} tiles", count);
    }

    pub fn is_updated(&self) -> bool {
        self.is_updated
    }

    /// Band of tile `level`; `None` when the slot is empty
    pub fn region(&mut self, level: usize) -> Result<Option<TileRegion>> {
        check_level(level)?;
        self.update_regions();
        Ok(self.regions[level])
    }

    /// Weight of tile `level` at `height`; 0 for empty slots
    pub fn presence(&mut self, level: usize, height: f32) -> Result<f32> {
        Ok(self.region(level)?.map_or(0.0, |r| r.presence(height)))
    }

    /// Blend the tiles into a `size × size` texture map over `heightfield`
    pub fn generate(&mut self, heightfield: &HeightField, size: u32) -> Result<RgbImage> {
        if !heightfield.is_loaded() {
            return Err(Error::NotReady("texture generation requires a heightmap"));
        }
        if size == 0 {
            return Err(Error::InvalidParameter("texture map size must be positive".into()));
        }
        self.update_regions();

        let hf_size = heightfield.size();
        let ratio = hf_size as f32 / size as f32;
        let heights = heightfield.heights();
        let sample = |x: u32, z: u32| heights[(z * hf_size + x) as usize] as f32;

        let mut image = RgbImage::new(size, size);
        for (px, pz, pixel) in image.enumerate_pixels_mut() {
            let fx = px as f32 * ratio;
            let fz = pz as f32 * ratio;
            let ix = (fx as u32).min(hf_size - 1);
            let iz = (fz as u32).min(hf_size - 1);

            let base = sample(ix, iz);
            let along_x = if ix + 1 < hf_size {
                base + (sample(ix + 1, iz) - base) * (fx - ix as f32)
            } else {
                base
            };
            let along_z = if iz + 1 < hf_size {
                base + (sample(ix, iz + 1) - base) * (fz - iz as f32)
            } else {
                base
            };
            let height = (along_x + along_z) * 0.5;

            let mut color = [0.0f32; 3];
            for (tile, region) in self.tiles.iter().zip(&self.regions) {
                let (Some(tile), Some(region)) = (tile, region) else {
                    continue;
                };
                let weight = region.presence(height);
                if weight <= 0.0 {
                    continue;
                }
                let texel = tile.get_pixel(px % tile.width(), pz % tile.height());
                for (c, &t) in color.iter_mut().zip(texel.0.iter()) {
                    *c += weight * t as f32;
                }
            }
            *pixel = Rgb(color.map(|c| c.min(255.0) as u8));
        }

        log::info!(
            "Generated {}x{} texture map from {} tiles",
            size,
            size,
            self.tile_count()
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(4, 4, Rgb(color))
    }

    fn flat_field(size: u32, height: u8) -> HeightField {
        let mut hf = HeightField::new();
        hf.new_heightmap(size).expect("heightmap");
        for z in 0..size {
            for x in 0..size {
                hf.set_height(x, z, height).expect("in range");
            }
        }
        hf
    }

    #[test]
    fn test_single_tile_covers_everything() {
        let mut blend = TextureTileBlend::new();
        blend.set_tile(2, solid([1, 2, 3])).expect("tile");
        for h in [0.0, 64.0, 127.5, 200.0, 255.0] {
            assert_eq!(blend.presence(2, h).expect("presence"), 1.0);
        }
        assert_eq!(blend.presence(0, 100.0).expect("presence"), 0.0);
    }

    #[test]
    fn test_two_tiles_cross_fade() {
        let mut blend = TextureTileBlend::new();
        blend.set_tile(0, solid([0; 3])).expect("tile");
        blend.set_tile(1, solid([0; 3])).expect("tile");

        assert_eq!(blend.presence(0, 127.5).expect("presence"), 0.5);
        assert_eq!(blend.presence(1, 127.5).expect("presence"), 0.5);
        assert_eq!(blend.presence(0, 10.0).expect("presence"), 1.0);
        assert_eq!(blend.presence(1, 10.0).expect("presence"), 0.0);
        assert_eq!(blend.presence(1, 250.0).expect("presence"), 1.0);
        assert_eq!(blend.presence(0, 250.0).expect("presence"), 0.0);
    }

    #[test]
    fn test_four_tile_bands() {
        let mut blend = TextureTileBlend::new();
        for level in 0..MAX_TILES {
            blend.set_tile(level, solid([0; 3])).expect("tile");
        }
        let second = blend.region(1).expect("level").expect("loaded");
        assert_eq!(second.optimal_low, 95.625);
        assert_eq!(second.lowest, 31.875);
        assert_eq!(second.highest, 159.375);
        // Outside the band
        assert_eq!(blend.presence(1, 200.0).expect("presence"), 0.0);
    }

    #[test]
    fn test_bands_follow_loaded_levels() {
        let mut blend = TextureTileBlend::new();
        blend.set_tile(0, solid([0; 3])).expect("tile");
        blend.set_tile(3, solid([0; 3])).expect("tile");
        assert!(blend.region(1).expect("level").is_none());
        assert_eq!(blend.presence(3, 255.0).expect("presence"), 1.0);
        assert_eq!(blend.presence(3, 0.0).expect("presence"), 0.0);
    }

    #[test]
    fn test_regions_recomputed_lazily() {
        let mut blend = TextureTileBlend::new();
        blend.set_tile(0, solid([0; 3])).expect("tile");
        assert!(!blend.is_updated());
        blend.update_regions();
        assert!(blend.is_updated());

        blend.set_tile(1, solid([0; 3])).expect("tile");
        assert!(!blend.is_updated());
        assert_eq!(blend.presence(0, 127.5).expect("presence"), 0.5);

        blend.unload_tile(1).expect("unload");
        assert_eq!(blend.presence(0, 127.5).expect("presence"), 1.0);
    }

    #[test]
    fn test_level_out_of_range() {
        let mut blend = TextureTileBlend::new();
        assert!(matches!(blend.set_tile(4, solid([0; 3])), Err(Error::OutOfRange(_))));
        assert!(matches!(blend.presence(4, 0.0), Err(Error::OutOfRange(_))));
        assert!(matches!(blend.unload_tile(7), Err(Error::OutOfRange(_))));
        assert!(matches!(blend.load_tile(4, "tile.tga"), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn test_load_tile_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut blend = TextureTileBlend::new();
        let err = blend.load_tile(0, dir.path().join("grass.tga"));
        assert!(matches!(err, Err(Error::FileNotFound(_))));
        assert_eq!(blend.tile_count(), 0);
    }

    #[test]
    fn test_load_tile_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rock.tga");
        crate::texture::save_texture_map(&solid([9, 8, 7]), &path).expect("save");

        let mut blend = TextureTileBlend::new();
        blend.load_tile(1, &path).expect("load");
        assert_eq!(blend.tile_count(), 1);
        assert_eq!(blend.tile(1).expect("tile").get_pixel(0, 0), &Rgb([9, 8, 7]));
    }

    #[test]
    fn test_generate_single_solid_tile() {
        let hf = flat_field(16, 77);
        let mut blend = TextureTileBlend::new();
        blend.set_tile(0, solid([200, 100, 50])).expect("tile");

        let image = blend.generate(&hf, 32).expect("generate");
        assert_eq!(image.dimensions(), (32, 32));
        assert!(image.pixels().all(|p| *p == Rgb([200, 100, 50])));
    }

    #[test]
    fn test_generate_without_tiles_is_black() {
        let hf = flat_field(8, 200);
        let mut blend = TextureTileBlend::new();
        let image = blend.generate(&hf, 8).expect("generate");
        assert!(image.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_generate_picks_tile_by_height() {
        let mut hf = flat_field(8, 0);
        for z in 0..8 {
            for x in 4..8 {
                hf.set_height(x, z, 255).expect("in range");
            }
        }
        let mut blend = TextureTileBlend::new();
        blend.set_tile(0, solid([255, 0, 0])).expect("tile");
        blend.set_tile(1, solid([0, 0, 255])).expect("tile");

        let image = blend.generate(&hf, 8).expect("generate");
        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(7, 7), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_texels_repeat_across_map() {
        let hf = flat_field(4, 128);
        let mut tile = RgbImage::new(2, 1);
        tile.put_pixel(0, 0, Rgb([10, 10, 10]));
        tile.put_pixel(1, 0, Rgb([20, 20, 20]));
        let mut blend = TextureTileBlend::new();
        blend.set_tile(0, tile).expect("tile");

        let image = blend.generate(&hf, 4).expect("generate");
        assert_eq!(image.get_pixel(0, 3), &Rgb([10, 10, 10]));
        assert_eq!(image.get_pixel(3, 0), &Rgb([20, 20, 20]));
        assert_eq!(image.get_pixel(2, 1), &Rgb([10, 10, 10]));
    }

    #[test]
    fn test_generate_preconditions() {
        let mut blend = TextureTileBlend::new();
        assert!(matches!(blend.generate(&HeightField::new(), 8), Err(Error::NotReady(_))));
        let hf = flat_field(4, 0);
        assert!(matches!(blend.generate(&hf, 0), Err(Error::InvalidParameter(_))));
    }
}
