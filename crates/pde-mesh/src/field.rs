use crate::variables::VariablesDescriptor;
use pde_table::Table;

/// A [`Table<f64>`] with an attached variables descriptor. Row count equals
/// the owning [`crate::Dictionary`]'s DoF count; column count equals the
/// descriptor's total width.
pub struct Field {
    pub name: String,
    pub descriptor: VariablesDescriptor,
    pub data: Table<f64>,
}

impl Field {
    pub fn new(name: impl Into<String>, nb_dofs: usize, descriptor: VariablesDescriptor) -> Self {
        let mut data = Table::with_row_size(descriptor.total_width());
        data.resize(nb_dofs);
        Self { name: name.into(), descriptor, data }
    }

    pub fn nb_dofs(&self) -> usize {
        self.data.size()
    }

    pub fn var(&self, dof: usize, name: &str) -> Option<&[f64]> {
        let row = self.data.get_row(dof).ok()?;
        let offset = self.descriptor.offset_of(name)?;
        let width = self.descriptor.width_of(name)?;
        Some(&row[offset..offset + width])
    }
}
