//! Shared triangle-fan index sequence for patch rendering.
//!
//! Every patch has the same interior topology, so one index sequence serves
//! all of them. Fans are centred on odd local vertices and triangulate the
//! eight neighbours around the centre. Ranges are recorded per
//! (LOD, variant) slot; only the LOD 0 full-fan range is generated today, the
//! seam variants exist for stitching against coarser neighbours but nothing
//! selects them yet.

use crate::core::types::Result;
use crate::core::Error;
use super::lod::{index_slot, max_lod_for_patch, VARIANTS_PER_LOD};

/// Indices in a full fan (8 triangles)
pub const FULL_FAN_INDICES: u32 = 24;

/// Indices in a seam fan (7 triangles)
pub const SEAM_FAN_INDICES: u32 = 21;

/// Offset and length of a range in the shared index sequence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndicesInfo {
    pub offset: u32,
    pub count: u32,
}

/// Fan shape; the seam variants drop the neighbour on one side
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FanVariant {
    #[default]
    Full = 0,
    NoLeft = 1,
    NoRight = 2,
    NoTop = 3,
    NoBottom = 4,
}

impl FanVariant {
    pub fn index_count(self) -> u32 {
        match self {
            FanVariant::Full => FULL_FAN_INDICES,
            _ => SEAM_FAN_INDICES,
        }
    }
}

/// Builds the shared index sequence and its per-slot bookkeeping
#[derive(Clone, Debug)]
pub struct PatchIndexBuilder {
    patch_size: u32,
    max_lod: u32,
    indices: Vec<u32>,
    infos: Vec<IndicesInfo>,
    /// `lod * 16 + variant` -> position in `infos`
    slots: Vec<Option<usize>>,
}

impl PatchIndexBuilder {
    /// Empty builder with every (LOD, variant) slot reserved
    pub fn new(patch_size: u32) -> Self {
        let max_lod = max_lod_for_patch(patch_size);
        Self {
            patch_size,
            max_lod,
            indices: Vec::new(),
            infos: Vec::new(),
            slots: vec![None; index_slot(max_lod + 1, 0)],
        }
    }

    /// Generate the LOD 0 full-fan range covering a whole patch
    pub fn build(patch_size: u32) -> Result<Self> {
        let mut builder = Self::new(patch_size);
        builder.begin_range(0, FanVariant::Full)?;

        let last = patch_size.saturating_sub(1);
        for cz in (1..last).step_by(2) {
            for cx in (1..last).step_by(2) {
                builder.add_fan(cx, cz, 1, FanVariant::Full)?;
            }
        }

        log::debug!(
            "Built fan indices for patch size {}: {} fans, {} indices",
            patch_size,
            builder.fan_count(),
            builder.indices.len()
        );
        Ok(builder)
    }

    /// Open a new range and bind it to the (lod, variant) slot
    pub fn begin_range(&mut self, lod: u32, variant: FanVariant) -> Result<()> {
        if lod > self.max_lod {
            return Err(Error::OutOfRange(format!(
                "LOD {} exceeds max LOD {} for patch size {}",
                lod, self.max_lod, self.patch_size
            )));
        }
        self.infos.try_reserve(1)?;
        self.infos.push(IndicesInfo {
            offset: self.indices.len() as u32,
            count: 0,
        });
        self.slots[index_slot(lod, variant as u32)] = Some(self.infos.len() - 1);
        Ok(())
    }

    /// Append one fan around local vertex (cx, cz) to the open range.
    ///
    /// `step` is the distance to the neighbour vertices.
    pub fn add_fan(&mut self, cx: u32, cz: u32, step: u32, variant: FanVariant) -> Result<()> {
        if self.infos.is_empty() {
            return Err(Error::NotReady("no index range open"));
        }
        if cx < step || cz < step || cx + step >= self.patch_size || cz + step >= self.patch_size {
            return Err(Error::OutOfRange(format!(
                "fan at ({}, {}) with step {} leaves a {}-vertex patch",
                cx, cz, step, self.patch_size
            )));
        }

        let size = self.patch_size;
        let vertex = |x: u32, z: u32| z * size + x;
        let centre = vertex(cx, cz);

        // Clockwise ring starting at NW: NW, N, NE, E, SE, S, SW, W
        let ring = [
            vertex(cx - step, cz - step),
            vertex(cx, cz - step),
            vertex(cx + step, cz - step),
            vertex(cx + step, cz),
            vertex(cx + step, cz + step),
            vertex(cx, cz + step),
            vertex(cx - step, cz + step),
            vertex(cx - step, cz),
        ];
        let skipped = match variant {
            FanVariant::Full => None,
            FanVariant::NoTop => Some(1),
            FanVariant::NoRight => Some(3),
            FanVariant::NoBottom => Some(5),
            FanVariant::NoLeft => Some(7),
        };

        let mut spokes = [0u32; 8];
        let mut len = 0;
        for (i, &v) in ring.iter().enumerate() {
            if Some(i) != skipped {
                spokes[len] = v;
                len += 1;
            }
        }

        self.indices.try_reserve(len * 3)?;
        for i in 0..len {
            self.indices.extend_from_slice(&[centre, spokes[i], spokes[(i + 1) % len]]);
        }

        if let Some(info) = self.infos.last_mut() {
            info.count += variant.index_count();
        }
        Ok(())
    }

    /// Range bound to (lod, variant), if generated
    pub fn lookup(&self, lod: u32, variant: FanVariant) -> Option<IndicesInfo> {
        let slot = self.slots.get(index_slot(lod, variant as u32))?;
        slot.map(|i| self.infos[i])
    }

    /// The 24 indices of LOD 0 fan `fan` (row-major over fan centres)
    pub fn fan_range(&self, fan: u32) -> Option<&[u32]> {
        let info = self.lookup(0, FanVariant::Full)?;
        let start = info.offset + fan * FULL_FAN_INDICES;
        let end = start + FULL_FAN_INDICES;
        if end > info.offset + info.count {
            return None;
        }
        self.indices.get(start as usize..end as usize)
    }

    /// Fan centres per patch row at LOD 0
    pub fn fans_per_row(&self) -> u32 {
        self.patch_size.saturating_sub(1) / 2
    }

    /// Number of LOD 0 full fans generated
    pub fn fan_count(&self) -> u32 {
        self.lookup(0, FanVariant::Full)
            .map_or(0, |info| info.count / FULL_FAN_INDICES)
    }

    pub fn patch_size(&self) -> u32 {
        self.patch_size
    }

    pub fn max_lod(&self) -> u32 {
        self.max_lod
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn infos(&self) -> &[IndicesInfo] {
        &self.infos
    }

    /// Number of reserved (LOD, variant) slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

const _: () = assert!(FanVariant::NoBottom as u32 + 1 <= VARIANTS_PER_LOD);
