use crate::error::MeshError;
use crate::shape::ShapeFunction;
use pde_table::{List, Table};
use std::sync::Arc;

/// A homogeneous group of mesh elements sharing a shape.
///
/// Invariant: `size() == glb_idx.size() == rank.size()`.
pub struct Entities {
    pub name: String,
    pub shape: Arc<dyn ShapeFunction>,
    pub is_volume: bool,
    pub glb_idx: List<u64>,
    pub rank: List<u64>,
    /// Element -> node index, row_size == shape.nb_nodes().
    pub node_connectivity: Table<u64>,
    pub cell2face: Option<Table<i64>>,
    pub face2cell: Option<Table<i64>>,
    pub cell2cell: Option<Table<i64>>,
}

impl Entities {
    pub fn new(name: impl Into<String>, shape: Arc<dyn ShapeFunction>, is_volume: bool) -> Self {
        let node_connectivity = Table::with_row_size(shape.nb_nodes());
        Self {
            name: name.into(),
            shape,
            is_volume,
            glb_idx: List::new(),
            rank: List::new(),
            node_connectivity,
            cell2face: None,
            face2cell: None,
            cell2cell: None,
        }
    }

    pub fn size(&self) -> usize {
        self.glb_idx.size()
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        let n = self.glb_idx.size();
        if self.rank.size() != n || self.node_connectivity.size() != n {
            return Err(MeshError::SizeMismatch {
                name: self.name.clone(),
                glb_idx: n,
                rank: self.rank.size(),
                connectivity: self.node_connectivity.size(),
            });
        }
        Ok(())
    }

    pub fn resize(&mut self, n: usize) {
        self.glb_idx.resize(n);
        self.rank.resize(n);
        self.node_connectivity.resize(n);
    }

    pub fn is_ghost(&self, local_idx: usize, my_rank: u64) -> bool {
        *self.rank.get(local_idx).expect("local index in range") != my_rank
    }

    /// Gathers the element's node coordinates from `node_coords` (the mesh
    /// geometry dictionary's coordinate table), padding to 3-D.
    pub fn element_coords(&self, local_idx: usize, node_coords: &Table<f64>) -> Vec<[f64; 3]> {
        let row = self.node_connectivity.get_row(local_idx).expect("local index in range");
        row.iter()
            .map(|&node| {
                let coord = node_coords.get_row(node as usize).expect("node index in range");
                let mut p = [0.0; 3];
                for (d, v) in coord.iter().enumerate().take(3) {
                    p[d] = *v;
                }
                p
            })
            .collect()
    }

    pub fn centroid(&self, local_idx: usize, node_coords: &Table<f64>) -> [f64; 3] {
        self.shape.centroid(&self.element_coords(local_idx, node_coords))
    }
}
