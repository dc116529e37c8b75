//! Terrain configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::core::Error;
use crate::render::VertexFormat;
use super::lod::LOD_DISTANCES;

/// Configuration for a terrain surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Vertices per patch edge (2^n + 1 gives full fan coverage)
    pub patch_size: u32,
    /// Vertex layout for patch storage
    pub vertex_format: VertexFormat,
    /// Repetitions of the detail texture across the terrain (detail layout only)
    pub detail_density: f32,
    /// Render every visible patch at LOD 0, ignoring camera distance
    pub brute_force: bool,
    /// Distance thresholds for LOD 0, 1 and 2
    pub lod_distances: [f32; 3],
    /// Edge length of the baked texture map in pixels
    pub texture_size: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            patch_size: 17,
            vertex_format: VertexFormat::Plain,
            detail_density: 16.0,
            brute_force: true,
            lod_distances: LOD_DISTANCES,
            texture_size: 256,
        }
    }
}

impl TerrainConfig {
    /// Read a JSON config; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;
        let config: TerrainConfig = serde_json::from_str(&text)
            .map_err(|e| Error::BadFile(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.patch_size < 2 {
            return Err(Error::InvalidParameter(format!(
                "patch size {} must be at least 2",
                self.patch_size
            )));
        }
        if !(self.detail_density > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "detail density {} must be positive",
                self.detail_density
            )));
        }
        let [near, mid, far] = self.lod_distances;
        if !self.lod_distances.iter().all(|d| d.is_finite() && *d >= 0.0) || !(near < mid && mid < far) {
            return Err(Error::InvalidParameter(format!(
                "LOD distances {:?} must be finite, non-negative and ascending",
                self.lod_distances
            )));
        }
        if self.texture_size == 0 {
            return Err(Error::InvalidParameter("texture size must be positive".into()));
        }
        Ok(())
    }
}
