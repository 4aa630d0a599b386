use crate::bbox::BoundingBox;
use pde_mesh::{Mesh, UnifiedElements};
use pde_table::Table;

/// Tolerance used when deciding whether a point falls just outside the
/// bounding box but should still be clamped into the grid.
const OUTSIDE_TOLERANCE: f64 = 100.0 * f64::EPSILON;

/// Uniform `N[XX] x N[YY] x N[ZZ]` grid over a mesh's bounding box; each cell
/// holds the unified indices of the volume elements whose centroid falls
/// inside it.
pub struct Octree {
    pub dim: usize,
    pub dims: [usize; 3],
    pub bbox: BoundingBox,
    cell_size: [f64; 3],
    cells: Vec<Vec<usize>>,
}

/// How the per-axis cell counts are chosen.
pub enum CellCounts {
    Explicit([usize; 3]),
    ElemsPerCell(usize),
}

impl Octree {
    pub fn build(mesh: &Mesh, dim: usize, counts: CellCounts) -> Self {
        let unified = mesh.unified_volume_elements();
        Self::build_from(&unified, &mesh.geometry.coordinates, dim, counts)
    }

    pub fn build_from(unified: &UnifiedElements<'_>, node_coords: &Table<f64>, dim: usize, counts: CellCounts) -> Self {
        let centroids: Vec<[f64; 3]> = (0..unified.len()).map(|i| unified.centroid(i, node_coords)).collect();
        // Bounding box is the hull of the mesh vertices, not the element
        // centroids: a coarse octree can otherwise shrink the box below the
        // true mesh extent and clip boundary elements out.
        let padded_nodes: Vec<[f64; 3]> = node_coords
            .rows()
            .map(|row| {
                let mut p = [0.0; 3];
                for (d, v) in row.iter().enumerate().take(3) {
                    p[d] = *v;
                }
                p
            })
            .collect();
        let bbox = BoundingBox::from_points(padded_nodes.iter());

        let extents = bbox.extents();
        let dims = match counts {
            CellCounts::Explicit(n) => n,
            CellCounts::ElemsPerCell(k) => {
                let n_elems = (unified.len().max(1)) as f64;
                let volume = bbox.volume(dim).max(f64::EPSILON);
                let d1 = (volume / n_elems).cbrt() * k as f64;
                let d1 = d1.max(f64::EPSILON);
                let mut n = [1usize; 3];
                for d in 0..dim {
                    n[d] = ((extents[d] / d1).ceil() as usize).max(1);
                }
                n
            }
        };

        let mut cell_size = [1.0; 3];
        for d in 0..dim {
            cell_size[d] = if dims[d] > 0 { (extents[d] / dims[d] as f64).max(f64::EPSILON) } else { 1.0 };
        }

        let mut cells = vec![Vec::new(); dims[0] * dims[1] * dims[2]];
        let mut tree = Octree { dim, dims, bbox, cell_size, cells: Vec::new() };
        for (idx, centroid) in centroids.iter().enumerate() {
            if let Some(cell) = tree.cell_index_unclamped(centroid) {
                cells[tree.flatten(cell)].push(idx);
            }
        }
        tree.cells = cells;
        tracing::debug!(dims = ?tree.dims, elements = unified.len(), "octree built");
        tree
    }

    fn flatten(&self, cell: [usize; 3]) -> usize {
        cell[0] + self.dims[0] * (cell[1] + self.dims[1] * cell[2])
    }

    /// Cell index for a point already known to lie in the bounding box,
    /// clamping into `[0, N-1]` per axis.
    fn cell_index_unclamped(&self, p: &[f64; 3]) -> Option<[usize; 3]> {
        let mut idx = [0usize; 3];
        for d in 0..3 {
            let raw = ((p[d] - self.bbox.min[d]) / self.cell_size[d]).floor();
            let raw = if raw.is_finite() { raw } else { 0.0 };
            let clamped = raw.max(0.0) as usize;
            idx[d] = clamped.min(self.dims[d].saturating_sub(1));
        }
        Some(idx)
    }

    /// `None` if `p` is farther than the tolerance from the bounding box in
    /// any dimension, else the clamped cell index.
    pub fn find_octtree_cell(&self, p: &[f64; 3]) -> Option<[usize; 3]> {
        for d in 0..3 {
            if p[d] < self.bbox.min[d] - OUTSIDE_TOLERANCE || p[d] > self.bbox.max[d] + OUTSIDE_TOLERANCE {
                return None;
            }
        }
        self.cell_index_unclamped(p)
    }

    pub fn cell_elements(&self, cell: [usize; 3]) -> &[usize] {
        &self.cells[self.flatten(cell)]
    }

    /// Cells on the cube surface at Chebyshev distance exactly `r` from
    /// `center`, clipped to the grid bounds. `r == 0` returns only `center`.
    pub fn ring_cells(&self, center: [usize; 3], r: usize) -> Vec<[usize; 3]> {
        if r == 0 {
            return vec![center];
        }
        let r = r as isize;
        let mut out = Vec::new();
        let lo = [-r, -r, -r];
        let hi = [r, r, r];
        for di in lo[0]..=hi[0] {
            for dj in lo[1]..=hi[1] {
                for dk in lo[2]..=hi[2] {
                    if di.abs().max(dj.abs()).max(dk.abs()) != r {
                        continue;
                    }
                    let deltas = [di, dj, dk];
                    let mut cell = [0usize; 3];
                    let mut in_bounds = true;
                    for d in 0..3 {
                        let v = center[d] as isize + deltas[d];
                        if v < 0 || v as usize >= self.dims[d] {
                            in_bounds = false;
                            break;
                        }
                        cell[d] = v as usize;
                    }
                    if in_bounds {
                        out.push(cell);
                    }
                }
            }
        }
        out
    }

    fn max_ring(&self) -> usize {
        self.dims[0].max(self.dims[1]).max(self.dims[2])
    }

    /// Searches the containing cell's own elements (ring 0), falling back to
    /// ring 1 to absorb centroids that landed just outside the true
    /// containing cell. Returns the unified element index.
    pub fn find_element(&self, p: &[f64; 3], unified: &UnifiedElements<'_>, node_coords: &Table<f64>) -> Option<usize> {
        let cell = self.find_octtree_cell(p)?;
        for r in [0usize, 1usize] {
            for rc in self.ring_cells(cell, r) {
                for &idx in self.cell_elements(rc) {
                    let (entities, local) = unified.get(idx);
                    let coords = entities.element_coords(local, node_coords);
                    if entities.shape.is_coord_in_element(p, &coords) {
                        return Some(idx);
                    }
                }
            }
        }
        None
    }

    /// Ring-expanding neighbour gather used by [`crate::stencil`]: appends
    /// rings until `min_size` elements are accumulated or the grid is
    /// exhausted. Returns unified indices in ring order, then cell-insertion
    /// order.
    pub fn gather_ring_expanding(&self, center: [usize; 3], min_size: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for r in 0..=self.max_ring() {
            for rc in self.ring_cells(center, r) {
                out.extend_from_slice(self.cell_elements(rc));
            }
            if out.len() >= min_size {
                break;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pde_mesh::{BilinearQuad, Entities};
    use std::sync::Arc;

    /// Builds the 5x5 rectangle mesh used across the octree scenarios: 36
    /// nodes on a regular grid over `[0,10]^2`, 25 unit-square-ish quads.
    fn grid_5x5() -> Mesh {
        let mut mesh = Mesh::new(2, 0);
        let n = 6;
        mesh.geometry.resize(n * n);
        for j in 0..n {
            for i in 0..n {
                let row = mesh.geometry.coordinates.get_row_mut(j * n + i).unwrap();
                row[0] = i as f64 * 2.0;
                row[1] = j as f64 * 2.0;
            }
        }
        let mut quads = Entities::new("quads", Arc::new(BilinearQuad), true);
        quads.resize(25);
        for j in 0..5 {
            for i in 0..5 {
                let local = j * 5 + i;
                let n0 = j * n + i;
                let row = quads.node_connectivity.get_row_mut(local).unwrap();
                row[0] = n0 as u64;
                row[1] = (n0 + 1) as u64;
                row[2] = (n0 + n + 1) as u64;
                row[3] = (n0 + n) as u64;
            }
        }
        mesh.topology.add_entities(quads);
        mesh
    }

    #[test]
    fn find_element_locates_points_in_a_5x5_grid() {
        let mesh = grid_5x5();
        let unified = mesh.unified_volume_elements();
        let octree = Octree::build_from(&unified, &mesh.geometry.coordinates, 2, CellCounts::Explicit([5, 5, 1]));

        assert_eq!(octree.find_element(&[1.0, 1.0, 0.0], &unified, &mesh.geometry.coordinates), Some(0));
        assert_eq!(octree.find_element(&[3.0, 1.0, 0.0], &unified, &mesh.geometry.coordinates), Some(1));
        assert_eq!(octree.find_element(&[1.0, 3.0, 0.0], &unified, &mesh.geometry.coordinates), Some(5));
        assert_eq!(octree.find_element(&[11.0, 11.0, 0.0], &unified, &mesh.geometry.coordinates), None);
    }

    #[test]
    fn ring_cells_at_distance_zero_is_just_the_center() {
        let mesh = grid_5x5();
        let unified = mesh.unified_volume_elements();
        let octree = Octree::build_from(&unified, &mesh.geometry.coordinates, 2, CellCounts::Explicit([5, 5, 1]));
        assert_eq!(octree.ring_cells([2, 2, 0], 0), vec![[2, 2, 0]]);
        assert!(octree.ring_cells([2, 2, 0], 1).len() == 8);
    }
}
