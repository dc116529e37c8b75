//! Noise-based procedural heightmap generation

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::core::Error;
use super::heightmap::HeightField;

/// Parameters controlling heightmap generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapParams {
    pub seed: u32,
    pub scale: f32,       // Samples per noise period (larger = smoother)
    pub octaves: u32,     // FBM octaves (detail levels)
    pub persistence: f32, // FBM persistence (0.5 typical)
    pub lacunarity: f32,  // FBM lacunarity (2.0 typical)
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 64.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Procedural heightmap generator using fractal Brownian motion (FBM)
pub struct HeightmapGenerator {
    params: HeightmapParams,
    noise: Fbm<Perlin>,
}

impl HeightmapGenerator {
    pub fn new(params: HeightmapParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }

    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }

    /// Raw height (0-255) at grid position (x, z)
    pub fn height_at(&self, x: u32, z: u32) -> u8 {
        let nx = (x as f32 / self.params.scale) as f64;
        let nz = (z as f32 / self.params.scale) as f64;

        // Noise is roughly in [-1, 1]
        let normalized = ((self.noise.get([nx, nz]) + 1.0) * 0.5).clamp(0.0, 1.0);
        (normalized * 255.0).round() as u8
    }

    /// Generate a `size × size` height field
    pub fn generate(&self, size: u32) -> Result<HeightField> {
        if !(self.params.scale > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "noise scale {} must be positive",
                self.params.scale
            )));
        }
        let mut field = HeightField::new();
        field.new_heightmap(size)?;
        for z in 0..size {
            for x in 0..size {
                field.set_height(x, z, self.height_at(x, z))?;
            }
        }
        log::info!("Generated {}x{} heightmap (seed {})", size, size, self.params.seed);
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_default() {
        let params = HeightmapParams::default();
        assert_eq!(params.seed, 12345);
        assert_eq!(params.octaves, 5);
        assert_eq!(params.persistence, 0.5);
        assert_eq!(params.lacunarity, 2.0);
    }

    #[test]
    fn test_height_at_consistency() {
        let generator = HeightmapGenerator::new(HeightmapParams::default());
        for (x, z) in [(0, 0), (10, 50), (100, 100), (255, 3)] {
            assert_eq!(generator.height_at(x, z), generator.height_at(x, z));
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let gen1 = HeightmapGenerator::new(HeightmapParams { seed: 1, ..Default::default() });
        let gen2 = HeightmapGenerator::new(HeightmapParams { seed: 2, ..Default::default() });
        let a = gen1.generate(32).expect("generate");
        let b = gen2.generate(32).expect("generate");
        assert_ne!(a.heights(), b.heights());
    }

    #[test]
    fn test_generate_size() {
        let generator = HeightmapGenerator::new(HeightmapParams::default());
        let field = generator.generate(17).expect("generate");
        assert_eq!(field.size(), 17);
        assert_eq!(field.heights().len(), 17 * 17);
    }

    #[test]
    fn test_generate_rejects_bad_scale() {
        let generator = HeightmapGenerator::new(HeightmapParams { scale: 0.0, ..Default::default() });
        assert!(matches!(generator.generate(8), Err(Error::InvalidParameter(_))));
    }
}
