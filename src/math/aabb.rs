//! Axis-aligned boxes for patch and bounds-node extents

use crate::core::types::{UVec2, Vec3};

/// Box spanning `min..=max` on every axis
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// World box over `cells × cells` grid cells starting at sample `origin`.
    ///
    /// Y always spans the full 8-bit height range `[0, 255 · scale.y]`.
    pub fn footprint(origin: UVec2, cells: u32, scale: Vec3) -> Self {
        let end = origin + UVec2::splat(cells);
        Self {
            min: Vec3::new(origin.x as f32 * scale.x, 0.0, origin.y as f32 * scale.z),
            max: Vec3::new(end.x as f32 * scale.x, 255.0 * scale.y, end.y as f32 * scale.z),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn half_extent(&self) -> Vec3 {
        self.extent() * 0.5
    }

    /// Sub-box over `size × size` cells starting at cell `origin`, for a box
    /// spanning `cells × cells` cells in X/Z. Y is kept whole.
    pub fn cell_square(&self, cells: u32, origin: UVec2, size: u32) -> Aabb {
        let extent = self.extent();
        let cell_x = extent.x / cells as f32;
        let cell_z = extent.z / cells as f32;
        let end = origin + UVec2::splat(size);
        Aabb {
            min: Vec3::new(
                self.min.x + origin.x as f32 * cell_x,
                self.min.y,
                self.min.z + origin.y as f32 * cell_z,
            ),
            max: Vec3::new(
                self.min.x + end.x as f32 * cell_x,
                self.max.y,
                self.min.z + end.y as f32 * cell_z,
            ),
        }
    }
}
