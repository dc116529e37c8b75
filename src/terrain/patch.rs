//! A square block of terrain vertices rendered as one draw

use crate::core::types::{Result, UVec2, Vec2, Vec3};
use crate::heightfield::HeightField;
use crate::math::Aabb;
use crate::render::{PatchVertices, VertexFormat};
use super::bounds::BoundsTree;

/// Patch state: vertex block, bounds and the per-frame visibility written by `update`
#[derive(Clone, Debug)]
pub struct Patch {
    /// Position in the patch grid
    pub coord: UVec2,
    /// Heightmap sample under local vertex (0, 0)
    pub origin: UVec2,
    patch_size: u32,
    pub(crate) lod: u32,
    pub(crate) culled: bool,
    pub(crate) distance: f32,
    vertices: PatchVertices,
    aabb: Aabb,
    bounds: BoundsTree,
}

impl Patch {
    /// Build patch `coord`; neighbours share their edge row/column of samples
    pub fn build(
        heightfield: &mut HeightField,
        coord: UVec2,
        patch_size: u32,
        format: VertexFormat,
        detail_density: f32,
    ) -> Result<Self> {
        let cells = patch_size - 1;
        let origin = coord * cells;
        let scale = heightfield.scale();
        let uv_step = 1.0 / heightfield.size().saturating_sub(1).max(1) as f32;

        let mut vertices = PatchVertices::with_capacity(format, (patch_size * patch_size) as usize)?;
        for z in 0..patch_size {
            for x in 0..patch_size {
                let gx = origin.x + x;
                let gz = origin.y + z;
                let height = heightfield.scaled_height(gx, gz)?;
                let color = heightfield.color(gx, gz)?;
                let position = Vec3::new(gx as f32 * scale.x, height, gz as f32 * scale.z);
                let uv = Vec2::new(gx as f32, gz as f32) * uv_step;
                vertices.push(position, color, uv, detail_density);
            }
        }

        // Y spans the whole 8-bit range regardless of the actual samples
        let aabb = Aabb::footprint(origin, cells, scale);
        let bounds = BoundsTree::build(aabb, cells)?;

        Ok(Self {
            coord,
            origin,
            patch_size,
            lod: 0,
            culled: false,
            distance: 0.0,
            vertices,
            aabb,
            bounds,
        })
    }

    /// Re-read colour and scaled height of every vertex
    pub fn refresh(&mut self, heightfield: &mut HeightField) -> Result<()> {
        for z in 0..self.patch_size {
            for x in 0..self.patch_size {
                let gx = self.origin.x + x;
                let gz = self.origin.y + z;
                let color = heightfield.color(gx, gz)?;
                let height = heightfield.scaled_height(gx, gz)?;
                self.vertices.refresh(self.vertex_index(x, z), color, height);
            }
        }
        Ok(())
    }

    pub fn vertex_index(&self, x: u32, z: u32) -> usize {
        (z * self.patch_size + x) as usize
    }

    /// Heightmap coordinate of local vertex index `index`
    pub fn grid_coord(&self, index: u32) -> UVec2 {
        self.origin + UVec2::new(index % self.patch_size, index / self.patch_size)
    }

    pub fn patch_size(&self) -> u32 {
        self.patch_size
    }

    pub fn lod(&self) -> u32 {
        self.lod
    }

    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Camera distance from the last distance-driven update
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn vertices(&self) -> &PatchVertices {
        &self.vertices
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn bounds(&self) -> &BoundsTree {
        &self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> HeightField {
        let mut hf = HeightField::new();
        hf.new_heightmap(9).expect("heightmap");
        hf.set_scale(2.0, 0.5, 3.0).expect("scale");
        hf
    }

    #[test]
    fn test_patch_shares_edges() {
        let mut hf = field();
        let patch = Patch::build(&mut hf, UVec2::new(1, 0), 5, VertexFormat::Plain, 1.0).expect("build");
        assert_eq!(patch.origin, UVec2::new(4, 0));
        assert_eq!(patch.vertices().len(), 25);
        // Local (0, 0) sits on sample (4, 0)
        assert_eq!(patch.vertices().position(0), Vec3::new(8.0, 64.0, 0.0));
        assert_eq!(patch.grid_coord(24), UVec2::new(8, 4));
    }

    #[test]
    fn test_patch_aabb_uses_full_height_range() {
        let mut hf = field();
        let patch = Patch::build(&mut hf, UVec2::new(0, 1), 5, VertexFormat::Plain, 1.0).expect("build");
        assert_eq!(patch.aabb().min, Vec3::new(0.0, 0.0, 12.0));
        assert_eq!(patch.aabb().max, Vec3::new(8.0, 127.5, 24.0));
        assert_eq!(patch.bounds().node(0).aabb, *patch.aabb());
    }

    #[test]
    fn test_refresh_picks_up_height_edits() {
        let mut hf = field();
        let mut patch = Patch::build(&mut hf, UVec2::ZERO, 5, VertexFormat::Detail, 4.0).expect("build");
        hf.set_height(2, 3, 200).expect("in range");
        patch.refresh(&mut hf).expect("refresh");

        let idx = patch.vertex_index(2, 3);
        assert_eq!(patch.vertices().position(idx).y, 100.0);
        assert_eq!(patch.vertices().color(idx), crate::heightfield::pack_color([200; 3]));
        assert_eq!(patch.vertices().format(), VertexFormat::Detail);
    }
}
