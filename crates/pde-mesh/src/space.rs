use crate::shape::ShapeFunction;
use pde_table::Table;
use std::sync::Arc;

/// Connectivity from one [`crate::Entities`]'s elements to DoF indices in one
/// [`crate::Dictionary`], plus the shape function used for reconstruction.
pub struct Space {
    pub shape: Arc<dyn ShapeFunction>,
    /// Element -> DoF index, row_size == shape.nb_nodes().
    pub connectivity: Table<u64>,
}

impl Space {
    pub fn new(shape: Arc<dyn ShapeFunction>) -> Self {
        let connectivity = Table::with_row_size(shape.nb_nodes());
        Self { shape, connectivity }
    }

    pub fn dof_indices(&self, local_elem: usize) -> &[u64] {
        self.connectivity.get_row(local_elem).expect("local element index in range")
    }
}
