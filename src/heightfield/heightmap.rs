//! Square 8-bit height and brightness grids with raw file I/O

use std::path::{Path, PathBuf};

use crate::core::types::{Result, Vec3};
use crate::core::Error;
use super::lighting::{LightingMode, SlopeLight};

/// Height value used to fill a freshly created heightmap
pub const DEFAULT_HEIGHT: u8 = 128;

/// Square height field with an optional co-sized brightness grid (lightmap).
///
/// Samples are addressed as `(x, z)` and stored row-major (`z * size + x`).
#[derive(Clone, Debug)]
pub struct HeightField {
    pub(crate) size: u32,
    pub(crate) heights: Vec<u8>,
    pub(crate) lightmap: Option<Vec<u8>>,
    pub(crate) scale: Vec3,
    pub(crate) heightmap_path: Option<PathBuf>,
    pub(crate) lightmap_path: Option<PathBuf>,
    pub(crate) lighting: LightingMode,
    pub(crate) light_color: [u8; 3],
    pub(crate) slope: SlopeLight,
}

impl Default for HeightField {
    fn default() -> Self {
        Self::new()
    }
}

impl HeightField {
    /// Create an empty height field (no heightmap loaded, unit scale)
    pub fn new() -> Self {
        Self {
            size: 0,
            heights: Vec::new(),
            lightmap: None,
            scale: Vec3::ONE,
            heightmap_path: None,
            lightmap_path: None,
            lighting: LightingMode::Height,
            light_color: [255, 255, 255],
            slope: SlopeLight::default(),
        }
    }

    /// Build a height field from existing samples (`samples.len()` must be `size²`)
    pub fn from_samples(size: u32, samples: Vec<u8>) -> Result<Self> {
        if size == 0 || samples.len() != (size as usize) * (size as usize) {
            return Err(Error::InvalidParameter(format!(
                "{} samples do not form a {}x{} grid",
                samples.len(), size, size
            )));
        }
        let mut field = Self::new();
        field.size = size;
        field.heights = samples;
        Ok(field)
    }

    /// Whether a heightmap is present
    pub fn is_loaded(&self) -> bool {
        self.size > 0
    }

    /// Edge length of the grid in samples (0 when nothing is loaded)
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Raw height samples, row-major
    pub fn heights(&self) -> &[u8] {
        &self.heights
    }

    /// Path of the last loaded or saved heightmap file
    pub fn heightmap_path(&self) -> Option<&Path> {
        self.heightmap_path.as_deref()
    }

    /// Path of the last loaded or saved lightmap file
    pub fn lightmap_path(&self) -> Option<&Path> {
        self.lightmap_path.as_deref()
    }

    /// Allocate a `size × size` heightmap filled with mid-gray, replacing any existing data
    pub fn new_heightmap(&mut self, size: u32) -> Result<()> {
        if size == 0 {
            return Err(Error::InvalidParameter("heightmap size must be positive".into()));
        }
        let heights = alloc_grid(size, DEFAULT_HEIGHT)?;
        self.unload_heightmap();
        self.size = size;
        self.heights = heights;
        log::info!("Created {}x{} heightmap", size, size);
        Ok(())
    }

    /// Load a raw square heightmap, replacing any existing data
    pub fn load_heightmap(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (size, heights) = read_square_grid(path)?;
        self.unload_heightmap();
        self.size = size;
        self.heights = heights;
        self.heightmap_path = Some(path.to_path_buf());
        log::info!("Loaded {}x{} heightmap from {}", size, size, path.display());
        Ok(())
    }

    /// Write the heightmap as a raw byte grid
    pub fn save_heightmap(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_loaded() {
            return Err(Error::NotReady("no heightmap loaded"));
        }
        let path = path.as_ref();
        write_grid(path, &self.heights)?;
        self.heightmap_path = Some(path.to_path_buf());
        log::debug!("Saved heightmap to {}", path.display());
        Ok(())
    }

    /// Drop the heightmap together with its lightmap and fall back to height lighting
    pub fn unload_heightmap(&mut self) {
        if self.is_loaded() {
            log::debug!("Unloading {}x{} heightmap", self.size, self.size);
        }
        self.size = 0;
        self.heights = Vec::new();
        self.heightmap_path = None;
        self.unload_lightmap();
    }

    pub(crate) fn sample_index(&self, x: u32, z: u32) -> Result<usize> {
        if !self.is_loaded() {
            return Err(Error::NotReady("no heightmap loaded"));
        }
        if x >= self.size || z >= self.size {
            return Err(Error::OutOfRange(format!(
                "sample ({}, {}) outside {}x{} heightmap",
                x, z, self.size, self.size
            )));
        }
        Ok(z as usize * self.size as usize + x as usize)
    }

    /// Raw height at (x, z)
    pub fn height(&self, x: u32, z: u32) -> Result<u8> {
        let idx = self.sample_index(x, z)?;
        Ok(self.heights[idx])
    }

    pub fn set_height(&mut self, x: u32, z: u32, value: u8) -> Result<()> {
        let idx = self.sample_index(x, z)?;
        self.heights[idx] = value;
        Ok(())
    }

    /// Height at (x, z) multiplied by the Y scale
    pub fn scaled_height(&self, x: u32, z: u32) -> Result<f32> {
        Ok(self.height(x, z)? as f32 * self.scale.y)
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// One scale component (0 = x, 1 = y, 2 = z)
    pub fn scale_axis(&self, axis: usize) -> Result<f32> {
        if axis > 2 {
            return Err(Error::OutOfRange(format!("scale axis {} (expected 0-2)", axis)));
        }
        Ok(self.scale[axis])
    }

    /// Set the per-axis scale; every component must be positive
    pub fn set_scale(&mut self, sx: f32, sy: f32, sz: f32) -> Result<()> {
        if !(sx > 0.0 && sy > 0.0 && sz > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "scale ({}, {}, {}) must be positive",
                sx, sy, sz
            )));
        }
        self.scale = Vec3::new(sx, sy, sz);
        Ok(())
    }

    pub fn has_lightmap(&self) -> bool {
        self.lightmap.is_some()
    }

    /// Load a raw brightness grid; its size must match the heightmap
    pub fn load_lightmap(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_loaded() {
            return Err(Error::NotReady("lightmap requires a heightmap"));
        }
        let path = path.as_ref();
        let (size, samples) = read_square_grid(path)?;
        if size != self.size {
            return Err(Error::BadFile(format!(
                "{}: lightmap is {}x{}, heightmap is {}x{}",
                path.display(), size, size, self.size, self.size
            )));
        }
        self.lightmap = Some(samples);
        self.lightmap_path = Some(path.to_path_buf());
        log::info!("Loaded {}x{} lightmap from {}", size, size, path.display());
        Ok(())
    }

    pub fn save_lightmap(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let lightmap = self.lightmap.as_ref().ok_or(Error::NotReady("no lightmap loaded"))?;
        write_grid(path, lightmap)?;
        self.lightmap_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Drop the lightmap; lightmap-based lighting falls back to height lighting
    pub fn unload_lightmap(&mut self) {
        self.lightmap = None;
        self.lightmap_path = None;
        self.lighting = LightingMode::Height;
    }

    /// Stored brightness at (x, z)
    pub fn brightness(&self, x: u32, z: u32) -> Result<u8> {
        let idx = self.sample_index(x, z)?;
        let lightmap = self.lightmap.as_ref().ok_or(Error::NotReady("no lightmap loaded"))?;
        Ok(lightmap[idx])
    }

    pub fn set_brightness(&mut self, x: u32, z: u32, value: u8) -> Result<()> {
        let idx = self.sample_index(x, z)?;
        let lightmap = self.lightmap.as_mut().ok_or(Error::NotReady("no lightmap loaded"))?;
        lightmap[idx] = value;
        Ok(())
    }
}

/// Allocate a `size × size` grid filled with `fill`
pub(crate) fn alloc_grid(size: u32, fill: u8) -> Result<Vec<u8>> {
    let len = (size as usize)
        .checked_mul(size as usize)
        .ok_or(Error::OutOfMemory)?;
    let mut grid = Vec::new();
    grid.try_reserve_exact(len)?;
    grid.resize(len, fill);
    Ok(grid)
}

/// Read a raw grid whose byte length must be a perfect square
fn read_square_grid(path: &Path) -> Result<(u32, Vec<u8>)> {
    let data = std::fs::read(path).map_err(|e| Error::from_io(e, path))?;
    let size = data.len().isqrt();
    if data.is_empty() || size * size != data.len() {
        return Err(Error::BadFile(format!(
            "{}: {} bytes is not a square grid",
            path.display(), data.len()
        )));
    }
    let size = u32::try_from(size)
        .map_err(|_| Error::BadFile(format!("{}: grid too large", path.display())))?;
    Ok((size, data))
}

fn write_grid(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|e| Error::from_io(e, path))
}
