//! Render device capability consumed by the terrain

use std::path::Path;

use crate::core::types::{Mat4, Result};
use super::vertex::{VertexFormat, VertexSlice};

/// Handle to a device-side buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Handle to a registered texture (skin)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SkinId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

impl PrimitiveType {
    /// Indices read when drawing `primitives` primitives
    pub fn index_count(self, primitives: u32) -> u32 {
        match self {
            PrimitiveType::TriangleList => primitives * 3,
            PrimitiveType::TriangleStrip if primitives == 0 => 0,
            PrimitiveType::TriangleStrip => primitives + 2,
            PrimitiveType::LineList => primitives * 2,
            PrimitiveType::PointList => primitives,
        }
    }
}

/// One indexed draw submission
#[derive(Clone, Copy, Debug)]
pub struct DrawCall<'a> {
    pub primitive: PrimitiveType,
    /// Vertex source, read by the device during the call
    pub vertices: VertexSlice<'a>,
    pub index_buffer: BufferId,
    /// First index within the index buffer
    pub index_offset: u32,
    pub primitive_count: u32,
    pub skin: SkinId,
}

impl DrawCall<'_> {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn format(&self) -> VertexFormat {
        self.vertices.format()
    }
}

/// Graphics device operations the terrain needs.
///
/// Implementations own all device-side resources; the terrain only holds ids.
pub trait RenderDevice {
    /// Upload an immutable index buffer
    fn create_static_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId>;

    fn release_index_buffer(&mut self, id: BufferId);

    fn draw_indexed(&mut self, call: &DrawCall<'_>) -> Result<()>;

    /// Transform applied to terrain-local geometry
    fn world_transform(&self) -> Mat4;

    fn set_world_transform(&mut self, transform: Mat4);

    /// Register a texture file and return its id (same path, same id)
    fn register_skin(&mut self, path: &Path) -> Result<SkinId>;
}
