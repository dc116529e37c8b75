//! Terrain vertex layouts
//!
//! Two layouts are supported: a plain coloured vertex with one UV set and a
//! detail-mapped vertex that carries a second, tiled UV set. The layout is
//! chosen once at terrain init and carried by [`PatchVertices`].

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::core::types::{Result, Vec2, Vec3};
use crate::core::Error;

/// Vertex layout selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexFormat {
    /// Position, colour, one UV set
    #[default]
    Plain,
    /// Position, colour, base UV and detail UV
    Detail,
}

impl VertexFormat {
    /// Numeric id used by hosts that select formats by number
    pub fn id(self) -> u32 {
        match self {
            VertexFormat::Plain => 0,
            VertexFormat::Detail => 1,
        }
    }

    /// Size of one vertex in bytes
    pub fn stride(self) -> usize {
        match self {
            VertexFormat::Plain => std::mem::size_of::<TerrainVertex>(),
            VertexFormat::Detail => std::mem::size_of::<DetailVertex>(),
        }
    }
}

impl TryFrom<u32> for VertexFormat {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self> {
        match id {
            0 => Ok(VertexFormat::Plain),
            1 => Ok(VertexFormat::Detail),
            other => Err(Error::UnknownVertexFormat(other)),
        }
    }
}

/// Plain terrain vertex (24 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    /// Packed 0xAARRGGBB
    pub color: u32,
    pub uv: [f32; 2],
}

/// Detail-mapped terrain vertex (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DetailVertex {
    pub position: [f32; 3],
    /// Packed 0xAARRGGBB
    pub color: u32,
    pub uv: [f32; 2],
    pub detail_uv: [f32; 2],
}

/// Borrowed vertex block of either layout
#[derive(Clone, Copy, Debug)]
pub enum VertexSlice<'a> {
    Plain(&'a [TerrainVertex]),
    Detail(&'a [DetailVertex]),
}

impl<'a> VertexSlice<'a> {
    pub fn format(&self) -> VertexFormat {
        match self {
            VertexSlice::Plain(_) => VertexFormat::Plain,
            VertexSlice::Detail(_) => VertexFormat::Detail,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VertexSlice::Plain(v) => v.len(),
            VertexSlice::Detail(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            VertexSlice::Plain(v) => bytemuck::cast_slice(v),
            VertexSlice::Detail(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Owned vertex block of one patch
#[derive(Clone, Debug)]
pub enum PatchVertices {
    Plain(Vec<TerrainVertex>),
    Detail(Vec<DetailVertex>),
}

impl PatchVertices {
    /// Empty block with room for `count` vertices
    pub fn with_capacity(format: VertexFormat, count: usize) -> Result<Self> {
        Ok(match format {
            VertexFormat::Plain => {
                let mut v = Vec::new();
                v.try_reserve_exact(count)?;
                PatchVertices::Plain(v)
            }
            VertexFormat::Detail => {
                let mut v = Vec::new();
                v.try_reserve_exact(count)?;
                PatchVertices::Detail(v)
            }
        })
    }

    pub fn format(&self) -> VertexFormat {
        self.as_slice().format()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vertex; the detail UV is `uv * detail_density`
    pub fn push(&mut self, position: Vec3, color: u32, uv: Vec2, detail_density: f32) {
        match self {
            PatchVertices::Plain(v) => v.push(TerrainVertex {
                position: position.to_array(),
                color,
                uv: uv.to_array(),
            }),
            PatchVertices::Detail(v) => v.push(DetailVertex {
                position: position.to_array(),
                color,
                uv: uv.to_array(),
                detail_uv: (uv * detail_density).to_array(),
            }),
        }
    }

    /// Position of vertex `index`
    pub fn position(&self, index: usize) -> Vec3 {
        match self {
            PatchVertices::Plain(v) => Vec3::from_array(v[index].position),
            PatchVertices::Detail(v) => Vec3::from_array(v[index].position),
        }
    }

    pub fn color(&self, index: usize) -> u32 {
        match self {
            PatchVertices::Plain(v) => v[index].color,
            PatchVertices::Detail(v) => v[index].color,
        }
    }

    /// Overwrite colour and height of vertex `index`, leaving X/Z and UVs alone
    pub fn refresh(&mut self, index: usize, color: u32, height: f32) {
        match self {
            PatchVertices::Plain(v) => {
                v[index].color = color;
                v[index].position[1] = height;
            }
            PatchVertices::Detail(v) => {
                v[index].color = color;
                v[index].position[1] = height;
            }
        }
    }

    pub fn as_slice(&self) -> VertexSlice<'_> {
        match self {
            PatchVertices::Plain(v) => VertexSlice::Plain(v),
            PatchVertices::Detail(v) => VertexSlice::Detail(v),
        }
    }
}
