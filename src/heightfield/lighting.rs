//! Per-sample vertex colour from height, slope or lightmap lighting

use serde::{Deserialize, Serialize};

use crate::core::types::{IVec2, Result};
use crate::core::Error;
use super::heightmap::{alloc_grid, HeightField};

/// How vertex colours are derived
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightingMode {
    /// Brightness follows the raw height
    #[default]
    Height,
    /// Brightness from the height gradient along a light direction, baked into the lightmap
    Slope,
    /// Brightness read from the lightmap
    Lightmap,
}

/// Slope lighting parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlopeLight {
    /// Light direction in grid steps (x, z)
    pub direction: IVec2,
    /// Lower clamp for the shade factor (0-1)
    pub min_brightness: f32,
    /// Upper clamp for the shade factor (0-1)
    pub max_brightness: f32,
    /// Height difference that darkens a sample from full to zero shade
    pub softness: f32,
}

impl Default for SlopeLight {
    fn default() -> Self {
        Self {
            direction: IVec2::new(1, 1),
            min_brightness: 0.2,
            max_brightness: 0.9,
            softness: 15.0,
        }
    }
}

/// Pack an RGB triple as opaque `0xAARRGGBB`
pub fn pack_color(rgb: [u8; 3]) -> u32 {
    0xFF00_0000 | (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32
}

/// Scale each light channel by `value / 255`
fn shade(light: [u8; 3], value: u8) -> [u8; 3] {
    light.map(|c| (c as u32 * value as u32 / 255) as u8)
}

impl HeightField {
    pub fn lighting_mode(&self) -> LightingMode {
        self.lighting
    }

    pub fn light_color(&self) -> [u8; 3] {
        self.light_color
    }

    pub fn set_light_color(&mut self, rgb: [u8; 3]) {
        self.light_color = rgb;
    }

    pub fn slope_light(&self) -> &SlopeLight {
        &self.slope
    }

    pub fn set_height_lighting(&mut self) {
        self.lighting = LightingMode::Height;
    }

    /// Shade from the stored lightmap
    pub fn set_lightmap_lighting(&mut self) -> Result<()> {
        if self.lightmap.is_none() {
            return Err(Error::NotReady("lightmap lighting requires a lightmap"));
        }
        self.lighting = LightingMode::Lightmap;
        Ok(())
    }

    /// Switch to slope lighting, allocating a lightmap to bake into when none exists
    pub fn set_slope_lighting(&mut self, slope: SlopeLight) -> Result<()> {
        if !self.is_loaded() {
            return Err(Error::NotReady("slope lighting requires a heightmap"));
        }
        if !(slope.softness > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "slope softness {} must be positive",
                slope.softness
            )));
        }
        if !(0.0..=1.0).contains(&slope.min_brightness)
            || !(0.0..=1.0).contains(&slope.max_brightness)
            || slope.min_brightness > slope.max_brightness
        {
            return Err(Error::InvalidParameter(format!(
                "slope brightness range [{}, {}] must lie within [0, 1]",
                slope.min_brightness, slope.max_brightness
            )));
        }

        let expected = self.size as usize * self.size as usize;
        if self.lightmap.as_ref().is_none_or(|l| l.len() != expected) {
            self.lightmap = Some(alloc_grid(self.size, u8::MAX)?);
        }
        self.slope = slope;
        self.lighting = LightingMode::Slope;
        Ok(())
    }

    /// Vertex colour of sample (x, z) as `0xAARRGGBB`.
    ///
    /// In slope mode the computed brightness is written into the lightmap first,
    /// then shaded like lightmap mode.
    pub fn color(&mut self, x: u32, z: u32) -> Result<u32> {
        let idx = self.sample_index(x, z)?;
        let rgb = match self.lighting {
            LightingMode::Height => shade(self.light_color, self.heights[idx]),
            LightingMode::Slope => {
                let value = self.slope_brightness(x, z, idx);
                let lightmap = self.lightmap.as_mut().ok_or(Error::NotReady("no lightmap loaded"))?;
                lightmap[idx] = value;
                shade(self.light_color, value)
            }
            LightingMode::Lightmap => {
                let lightmap = self.lightmap.as_ref().ok_or(Error::NotReady("no lightmap loaded"))?;
                shade(self.light_color, lightmap[idx])
            }
        };
        Ok(pack_color(rgb))
    }

    fn slope_brightness(&self, x: u32, z: u32, idx: usize) -> u8 {
        let sx = x as i64 - self.slope.direction.x as i64;
        let sz = z as i64 - self.slope.direction.y as i64;
        let size = self.size as i64;

        let shade = if sx >= 0 && sz >= 0 && sx < size && sz < size {
            let upstream = self.heights[(sz * size + sx) as usize] as f32;
            let here = self.heights[idx] as f32;
            1.0 - (upstream - here) / self.slope.softness
        } else {
            1.0
        };

        let shade = shade.clamp(self.slope.min_brightness, self.slope.max_brightness);
        (shade * 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(size: u32) -> HeightField {
        let mut hf = HeightField::new();
        hf.new_heightmap(size).expect("heightmap");
        hf
    }

    #[test]
    fn test_pack_color() {
        assert_eq!(pack_color([0x12, 0x34, 0x56]), 0xFF12_3456);
        assert_eq!(pack_color([0, 0, 0]), 0xFF00_0000);
    }

    #[test]
    fn test_height_lighting() {
        let mut hf = field(4);
        hf.set_height(0, 0, 255).expect("in range");
        hf.set_height(1, 0, 0).expect("in range");
        assert_eq!(hf.color(0, 0).expect("color"), 0xFFFF_FFFF);
        assert_eq!(hf.color(1, 0).expect("color"), 0xFF00_0000);

        hf.set_light_color([255, 0, 128]);
        // 128 * 255 / 255 = 128 red, 128 * 128 / 255 = 64 blue
        assert_eq!(hf.color(2, 2).expect("color"), pack_color([128, 0, 64]));
    }

    #[test]
    fn test_lightmap_lighting_requires_lightmap() {
        let mut hf = field(4);
        assert!(matches!(hf.set_lightmap_lighting(), Err(Error::NotReady(_))));
    }

    #[test]
    fn test_slope_lighting_flat_terrain_clamps_to_max() {
        let mut hf = field(8);
        hf.set_slope_lighting(SlopeLight {
            max_brightness: 0.8,
            ..SlopeLight::default()
        })
        .expect("valid slope light");
        assert!(hf.has_lightmap());

        let color = hf.color(4, 4).expect("color");
        let expected = (0.8f32 * 255.0) as u8;
        assert_eq!(color, pack_color([expected; 3]));
        assert_eq!(hf.brightness(4, 4).expect("baked"), expected);
    }

    #[test]
    fn test_slope_lighting_shadowed_sample() {
        let mut hf = field(8);
        // A tall sample upstream of (4, 4) along direction (1, 1)
        hf.set_height(3, 3, 228).expect("in range");
        hf.set_slope_lighting(SlopeLight::default()).expect("valid slope light");

        let _ = hf.color(4, 4).expect("color");
        let min = (SlopeLight::default().min_brightness * 255.0) as u8;
        assert_eq!(hf.brightness(4, 4).expect("baked"), min);
    }

    #[test]
    fn test_slope_lighting_edge_uses_full_shade() {
        let mut hf = field(4);
        hf.set_slope_lighting(SlopeLight {
            max_brightness: 1.0,
            ..SlopeLight::default()
        })
        .expect("valid slope light");
        // (0, 0) has no upstream neighbour along (1, 1)
        let _ = hf.color(0, 0).expect("color");
        assert_eq!(hf.brightness(0, 0).expect("baked"), 255);
    }

    #[test]
    fn test_slope_lighting_rejects_bad_parameters() {
        let mut hf = field(4);
        let bad = [
            SlopeLight { softness: 0.0, ..SlopeLight::default() },
            SlopeLight { min_brightness: 0.9, max_brightness: 0.1, ..SlopeLight::default() },
            SlopeLight { max_brightness: 1.5, ..SlopeLight::default() },
        ];
        for slope in bad {
            assert!(matches!(hf.set_slope_lighting(slope), Err(Error::InvalidParameter(_))));
        }
        assert_eq!(hf.lighting_mode(), LightingMode::Height);
    }

    #[test]
    fn test_lightmap_lighting_reads_brightness() {
        let mut hf = field(4);
        hf.set_slope_lighting(SlopeLight::default()).expect("valid slope light");
        hf.set_brightness(1, 1, 51).expect("in range");
        hf.set_lightmap_lighting().expect("lightmap present");
        assert_eq!(hf.color(1, 1).expect("color"), pack_color([51; 3]));
    }
}
