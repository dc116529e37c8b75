//! Headless render device that records submissions

use std::path::{Path, PathBuf};

use crate::core::types::{Mat4, Result};
use crate::core::Error;
use super::device::{BufferId, DrawCall, PrimitiveType, RenderDevice, SkinId};
use super::vertex::VertexFormat;

/// A draw call as seen by the device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedDraw {
    pub primitive: PrimitiveType,
    pub format: VertexFormat,
    pub vertex_count: usize,
    pub index_buffer: BufferId,
    pub index_offset: u32,
    pub primitive_count: u32,
    pub skin: SkinId,
}

/// [`RenderDevice`] without a GPU: keeps index buffers in memory and logs every draw.
///
/// Used by the offline tools and for exercising the terrain without a window.
pub struct RecordingDevice {
    index_buffers: Vec<Option<Vec<u32>>>,
    draws: Vec<RecordedDraw>,
    skins: Vec<PathBuf>,
    world: Mat4,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            index_buffers: Vec::new(),
            draws: Vec::new(),
            skins: Vec::new(),
            world: Mat4::IDENTITY,
        }
    }

    /// Draws recorded since the last [`clear_draws`](Self::clear_draws)
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    /// Contents of a live index buffer
    pub fn index_buffer(&self, id: BufferId) -> Option<&[u32]> {
        self.index_buffers
            .get(id.0 as usize)
            .and_then(|b| b.as_deref())
    }

    /// Number of index buffers not yet released
    pub fn live_index_buffers(&self) -> usize {
        self.index_buffers.iter().filter(|b| b.is_some()).count()
    }

    pub fn skin_path(&self, id: SkinId) -> Option<&Path> {
        self.skins.get(id.0 as usize).map(|p| p.as_path())
    }
}

impl RenderDevice for RecordingDevice {
    fn create_static_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId> {
        let mut data = Vec::new();
        data.try_reserve_exact(indices.len())?;
        data.extend_from_slice(indices);

        let id = BufferId(self.index_buffers.len() as u32);
        self.index_buffers.push(Some(data));
        log::debug!("Created index buffer {} ({} indices)", id.0, indices.len());
        Ok(id)
    }

    fn release_index_buffer(&mut self, id: BufferId) {
        if let Some(slot) = self.index_buffers.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    fn draw_indexed(&mut self, call: &DrawCall<'_>) -> Result<()> {
        let buffer = self.index_buffer(call.index_buffer).ok_or_else(|| {
            Error::InvalidParameter(format!("index buffer {} is not live", call.index_buffer.0))
        })?;

        let end = call.index_offset as usize + call.primitive.index_count(call.primitive_count) as usize;
        if end > buffer.len() {
            return Err(Error::OutOfRange(format!(
                "draw reads indices up to {} of {}",
                end,
                buffer.len()
            )));
        }

        self.draws.push(RecordedDraw {
            primitive: call.primitive,
            format: call.format(),
            vertex_count: call.vertex_count(),
            index_buffer: call.index_buffer,
            index_offset: call.index_offset,
            primitive_count: call.primitive_count,
            skin: call.skin,
        });
        Ok(())
    }

    fn world_transform(&self) -> Mat4 {
        self.world
    }

    fn set_world_transform(&mut self, transform: Mat4) {
        self.world = transform;
    }

    fn register_skin(&mut self, path: &Path) -> Result<SkinId> {
        if let Some(idx) = self.skins.iter().position(|p| p == path) {
            return Ok(SkinId(idx as u32));
        }
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let id = SkinId(self.skins.len() as u32);
        self.skins.push(path.to_path_buf());
        log::info!("Registered skin {} -> {}", path.display(), id.0);
        Ok(id)
    }
}
