//! Level of detail (LOD) selection for terrain patches
//!
//! LOD 0 is the finest tessellation. Distance-based selection uses three
//! thresholds; anything beyond the last one gets LOD 3. The selected level is
//! never coarser than what the patch size supports.

/// Default distance thresholds for LOD 0, 1 and 2
pub const LOD_DISTANCES: [f32; 3] = [100.0, 200.0, 500.0];

/// Index variants reserved per LOD level in the shared index table
pub const VARIANTS_PER_LOD: u32 = 16;

/// Calculate LOD level from camera distance
///
/// # Examples
/// ```
/// use ridgeline::terrain::lod::{lod_from_distance, LOD_DISTANCES};
///
/// assert_eq!(lod_from_distance(50.0, &LOD_DISTANCES), 0);
/// assert_eq!(lod_from_distance(150.0, &LOD_DISTANCES), 1);
/// assert_eq!(lod_from_distance(499.0, &LOD_DISTANCES), 2);
/// assert_eq!(lod_from_distance(5000.0, &LOD_DISTANCES), 3);
/// ```
pub fn lod_from_distance(distance: f32, thresholds: &[f32; 3]) -> u32 {
    for (level, &max_dist) in thresholds.iter().enumerate() {
        if distance < max_dist {
            return level as u32;
        }
    }
    thresholds.len() as u32
}

/// Coarsest LOD a patch of `patch_size` vertices per edge supports: ⌊log2(patch_size − 1)⌋
///
/// # Examples
/// ```
/// use ridgeline::terrain::lod::max_lod_for_patch;
///
/// assert_eq!(max_lod_for_patch(17), 4);
/// assert_eq!(max_lod_for_patch(33), 5);
/// assert_eq!(max_lod_for_patch(2), 0);
/// ```
pub fn max_lod_for_patch(patch_size: u32) -> u32 {
    patch_size.saturating_sub(1).max(1).ilog2()
}

/// Slot of a (LOD, variant) pair in the shared index table
pub fn index_slot(lod: u32, variant: u32) -> usize {
    (lod * VARIANTS_PER_LOD + variant) as usize
}
