//! Per-patch bounding quadtree used for ray picking.
//!
//! Nodes live in a flat arena and refer to their children by index. Each node
//! covers a square of `size` cells in X/Z and the patch's full Y range; nodes
//! of 2 cells or fewer are leaves, otherwise the node splits into four
//! children of `⌈size / 2⌉` cells. For odd sizes the upper children overlap
//! the lower ones by one cell, so every cell is covered by some leaf.

use crate::core::types::{Result, UVec2};
use crate::math::Aabb;

/// Index of a node inside its [`BoundsTree`]
pub type NodeId = u32;

/// Largest node size (in cells) that is never subdivided
pub const LEAF_CELLS: u32 = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct BoundsNode {
    pub aabb: Aabb,
    /// Local cell of the node's min corner inside the patch
    pub origin: UVec2,
    /// Edge length in cells
    pub size: u32,
    children: Option<[NodeId; 4]>,
}

impl BoundsNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn children(&self) -> Option<[NodeId; 4]> {
        self.children
    }
}

/// Arena-backed bounds quadtree; the root is node 0
#[derive(Clone, Debug, Default)]
pub struct BoundsTree {
    nodes: Vec<BoundsNode>,
}

impl BoundsTree {
    /// Build the tree for a patch spanning `cells × cells` with world bounds `aabb`
    pub fn build(aabb: Aabb, cells: u32) -> Result<Self> {
        let mut tree = Self { nodes: Vec::new() };
        tree.nodes.try_reserve(node_count_for(cells))?;
        tree.nodes.push(BoundsNode {
            aabb,
            origin: UVec2::ZERO,
            size: cells,
            children: None,
        });
        tree.subdivide(0)?;
        Ok(tree)
    }

    fn subdivide(&mut self, id: NodeId) -> Result<()> {
        let (origin, size) = {
            let node = &self.nodes[id as usize];
            (node.origin, node.size)
        };
        if size <= LEAF_CELLS {
            return Ok(());
        }

        let (root_aabb, root_cells) = {
            let root = &self.nodes[0];
            (root.aabb, root.size)
        };
        let half = size.div_ceil(2);
        let upper = size - half;
        self.nodes.try_reserve(4)?;
        let mut children = [0; 4];
        for (quadrant, child) in children.iter_mut().enumerate() {
            let offset = UVec2::new(
                if quadrant & 1 != 0 { upper } else { 0 },
                if quadrant & 2 != 0 { upper } else { 0 },
            );
            let child_origin = origin + offset;
            *child = self.nodes.len() as NodeId;
            self.nodes.push(BoundsNode {
                aabb: root_aabb.cell_square(root_cells, child_origin, half),
                origin: child_origin,
                size: half,
                children: None,
            });
        }
        self.nodes[id as usize].children = Some(children);

        for child in children {
            self.subdivide(child)?;
        }
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &BoundsNode {
        &self.nodes[id as usize]
    }

    pub fn get(&self, id: NodeId) -> Option<&BoundsNode> {
        self.nodes.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over leaf node ids
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| i as NodeId)
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

/// Number of nodes a tree over `cells` will hold
fn node_count_for(cells: u32) -> usize {
    let mut count = 1usize;
    let mut level = 1usize;
    let mut size = cells;
    while size > LEAF_CELLS {
        level *= 4;
        count += level;
        size = size.div_ceil(2);
    }
    count
}
