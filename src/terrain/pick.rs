//! Ray picking against patch bounds and fan triangles

use crate::core::types::{Result, UVec2, Vec3};
use crate::core::Error;
use crate::math::Ray;
use super::bounds::{BoundsTree, NodeId};
use super::indices::PatchIndexBuilder;
use super::patch::Patch;

/// A leaf bounds region of one patch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PickRegion {
    /// Index into the surface's patch list
    pub patch: usize,
    pub node: NodeId,
}

/// Collect every leaf under `node` whose bounds the ray passes through.
///
/// Returns true if at least one leaf was hit. All intersected leaves are
/// appended, not only the nearest one.
pub fn ray_intersects_patch(tree: &BoundsTree, node: NodeId, ray: &Ray, hits: &mut Vec<NodeId>) -> bool {
    let Some(bounds) = tree.get(node) else {
        return false;
    };
    if ray.intersects_aabb(&bounds.aabb).is_none() {
        return false;
    }

    match bounds.children() {
        None => {
            hits.push(node);
            true
        }
        Some(children) => {
            let mut hit = false;
            for child in children {
                hit |= ray_intersects_patch(tree, child, ray, hits);
            }
            hit
        }
    }
}

/// Hit-test the LOD 0 fans covering leaf `node` of `patch`.
///
/// A leaf of a `2^n + 1` patch is exactly one fan; other patch sizes give
/// leaves that straddle fans or lie in the last cell row/column, which no fan
/// covers. Every fan overlapping the leaf is tested, and a leaf with none
/// yields `None`. Among triangle hits the one closest to `view_point` wins;
/// the result is the heightmap coordinate of that triangle's vertex nearest
/// to the hit point.
pub fn pick_fan_vertex(
    patch: &Patch,
    indices: &PatchIndexBuilder,
    node: NodeId,
    ray: &Ray,
    view_point: Vec3,
) -> Result<Option<UVec2>> {
    let leaf = patch
        .bounds()
        .get(node)
        .ok_or_else(|| Error::OutOfRange(format!("bounds node {} does not exist", node)))?;
    if !leaf.is_leaf() {
        return Err(Error::InvalidParameter(format!("bounds node {} is not a leaf", node)));
    }

    let fans_per_row = indices.fans_per_row();
    let last_cell = leaf.origin + UVec2::splat(leaf.size.max(1) - 1);
    let first_fan = leaf.origin / 2;
    let last_fan = (last_cell / 2).min(UVec2::splat(fans_per_row.saturating_sub(1)));
    if fans_per_row == 0 || first_fan.x >= fans_per_row || first_fan.y >= fans_per_row {
        return Ok(None);
    }

    let vertices = patch.vertices();
    let mut best: Option<(f32, Vec3, [u32; 3])> = None;
    for fz in first_fan.y..=last_fan.y {
        for fx in first_fan.x..=last_fan.x {
            let fan = fz * fans_per_row + fx;
            let fan_indices = indices
                .fan_range(fan)
                .ok_or_else(|| Error::OutOfRange(format!("fan {} was not generated", fan)))?;

            for tri in fan_indices.chunks_exact(3) {
                let corners = [tri[0], tri[1], tri[2]];
                let [a, b, c] = corners.map(|i| vertices.position(i as usize));
                if let Some(hit) = ray.intersects_triangle(a, b, c) {
                    let dist = hit.point.distance_squared(view_point);
                    if best.is_none_or(|(best_dist, _, _)| dist < best_dist) {
                        best = Some((dist, hit.point, corners));
                    }
                }
            }
        }
    }

    Ok(best.map(|(_, point, corners)| {
        let nearest = corners
            .into_iter()
            .min_by(|&a, &b| {
                let da = vertices.position(a as usize).distance_squared(point);
                let db = vertices.position(b as usize).distance_squared(point);
                da.total_cmp(&db)
            })
            .unwrap_or(corners[0]);
        patch.grid_coord(nearest)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::HeightField;
    use crate::render::VertexFormat;

    fn flat_patch_of(patch_size: u32, height: u8) -> (Patch, PatchIndexBuilder) {
        let mut hf = HeightField::new();
        hf.new_heightmap(patch_size).expect("heightmap");
        for z in 0..patch_size {
            for x in 0..patch_size {
                hf.set_height(x, z, height).expect("in range");
            }
        }
        let patch = Patch::build(&mut hf, UVec2::ZERO, patch_size, VertexFormat::Plain, 1.0).expect("patch");
        let indices = PatchIndexBuilder::build(patch_size).expect("indices");
        (patch, indices)
    }

    fn flat_patch(height: u8) -> (Patch, PatchIndexBuilder) {
        flat_patch_of(5, height)
    }

    /// Pick through every leaf the ray crosses, keeping the first hit
    fn pick_all(patch: &Patch, indices: &PatchIndexBuilder, ray: &Ray) -> Vec<Option<UVec2>> {
        let mut hits = Vec::new();
        ray_intersects_patch(patch.bounds(), 0, ray, &mut hits);
        hits.into_iter()
            .map(|leaf| pick_fan_vertex(patch, indices, leaf, ray, ray.origin).expect("pick"))
            .collect()
    }

    fn down(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 500.0, z), -Vec3::Y)
    }

    #[test]
    fn test_vertical_ray_hits_one_leaf() {
        let (patch, _) = flat_patch(100);
        let tree = patch.bounds();
        let mut hits = Vec::new();
        assert!(ray_intersects_patch(tree, tree.root(), &down(1.5, 1.5), &mut hits));
        assert_eq!(hits.len(), 1);
        let leaf = tree.node(hits[0]);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.origin, UVec2::ZERO);
    }

    #[test]
    fn test_grazing_ray_collects_multiple_leaves() {
        let (patch, _) = flat_patch(100);
        let tree = patch.bounds();
        let mut hits = Vec::new();
        let ray = Ray::new(Vec3::new(-10.0, 100.0, 1.0), Vec3::X);
        assert!(ray_intersects_patch(tree, tree.root(), &ray, &mut hits));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_ray_above_bounds_misses() {
        let (patch, _) = flat_patch(100);
        let tree = patch.bounds();
        let mut hits = Vec::new();
        // Parallel to X above the 255 ceiling: fails the Y slab
        let ray = Ray::new(Vec3::new(-10.0, 300.0, 1.0), Vec3::X);
        assert!(!ray_intersects_patch(tree, tree.root(), &ray, &mut hits));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ray_outside_footprint_misses() {
        let (patch, _) = flat_patch(100);
        let tree = patch.bounds();
        let mut hits = Vec::new();
        assert!(!ray_intersects_patch(tree, tree.root(), &down(9.0, 1.0), &mut hits));
    }

    #[test]
    fn test_pick_fan_vertex_nearest_corner() {
        let (patch, indices) = flat_patch(100);
        let ray = down(1.8, 0.3);
        let mut hits = Vec::new();
        ray_intersects_patch(patch.bounds(), 0, &ray, &mut hits);
        assert_eq!(hits.len(), 1);

        let picked = pick_fan_vertex(&patch, &indices, hits[0], &ray, ray.origin).expect("pick");
        assert_eq!(picked, Some(UVec2::new(2, 0)));

        let ray = down(1.2, 0.9);
        let picked = pick_fan_vertex(&patch, &indices, hits[0], &ray, ray.origin).expect("pick");
        assert_eq!(picked, Some(UVec2::new(1, 1)));
    }

    #[test]
    fn test_pick_fan_vertex_second_fan() {
        let (patch, indices) = flat_patch(50);
        let ray = down(3.9, 3.8);
        let mut hits = Vec::new();
        ray_intersects_patch(patch.bounds(), 0, &ray, &mut hits);
        assert_eq!(hits.len(), 1);
        assert_eq!(patch.bounds().node(hits[0]).origin, UVec2::new(2, 2));

        let picked = pick_fan_vertex(&patch, &indices, hits[0], &ray, ray.origin).expect("pick");
        assert_eq!(picked, Some(UVec2::new(4, 4)));
    }

    #[test]
    fn test_pick_fan_vertex_miss_returns_none() {
        let (patch, indices) = flat_patch(100);
        // Leaf 1 covers x 0..2, z 0..2; ray passes outside its triangles
        let ray = down(3.0, 3.0);
        let leaf = patch.bounds().leaves().next().expect("leaf");
        let picked = pick_fan_vertex(&patch, &indices, leaf, &ray, ray.origin).expect("pick");
        assert_eq!(picked, None);
    }

    #[test]
    fn test_two_vertex_patch_has_no_fans() {
        let (patch, indices) = flat_patch_of(2, 100);
        let picked = pick_all(&patch, &indices, &down(0.4, 0.6));
        assert_eq!(picked, vec![None]);
    }

    #[test]
    fn test_four_vertex_patch_overlapping_leaves() {
        let (patch, indices) = flat_patch_of(4, 100);
        // x = 1.2 lies in both the (0, 0) and (1, 0) leaves; both map to fan 0
        let picked = pick_all(&patch, &indices, &down(1.2, 0.9));
        assert_eq!(picked, vec![Some(UVec2::new(1, 1)), Some(UVec2::new(1, 1))]);

        // Last cell column has no fan: a miss, not an error
        let picked = pick_all(&patch, &indices, &down(2.5, 0.5));
        assert_eq!(picked, vec![None]);
    }

    #[test]
    fn test_seven_vertex_patch_straddling_leaf() {
        let (patch, indices) = flat_patch_of(7, 100);
        let picked = pick_all(&patch, &indices, &down(4.8, 2.2));
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|&p| p == Some(UVec2::new(5, 2))));
    }

    #[test]
    fn test_pick_fan_vertex_rejects_inner_node() {
        let (patch, indices) = flat_patch(100);
        let ray = down(1.0, 1.0);
        let err = pick_fan_vertex(&patch, &indices, 0, &ray, ray.origin);
        assert!(matches!(err, Err(Error::InvalidParameter(_))));
    }
}
