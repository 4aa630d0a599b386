use crate::octree::Octree;
use pde_mesh::UnifiedElements;
use pde_table::Table;

/// Computes neighbourhoods of a minimum size around a given element by
/// ring-expanding octree lookups.
pub struct StencilComputerOcttree<'a> {
    octree: &'a Octree,
}

impl<'a> StencilComputerOcttree<'a> {
    pub fn new(octree: &'a Octree) -> Self {
        Self { octree }
    }

    /// Neighbours of unified element `unified_idx`, including itself,
    /// ring-order then cell-insertion order, until `min_stencil_size` is
    /// reached or the whole grid has been consumed.
    pub fn compute(&self, unified_idx: usize, unified: &UnifiedElements<'_>, node_coords: &Table<f64>, min_stencil_size: usize) -> Vec<usize> {
        let (entities, local) = unified.get(unified_idx);
        let centroid = entities.centroid(local, node_coords);
        let Some(cell) = self.octree.find_octtree_cell(&centroid) else {
            return Vec::new();
        };
        self.octree.gather_ring_expanding(cell, min_stencil_size)
    }
}
