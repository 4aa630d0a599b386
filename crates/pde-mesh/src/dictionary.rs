use crate::error::MeshError;
use crate::field::Field;
use crate::space::Space;
use crate::variables::VariablesDescriptor;
use pde_table::{List, Table};
use std::collections::HashMap;

/// A set of degrees-of-freedom sharing a layout (continuous or
/// discontinuous) over a collection of Entities.
pub struct Dictionary {
    pub name: String,
    pub continuous: bool,
    pub my_rank: u64,
    /// Row size == mesh spatial dimension.
    pub coordinates: Table<f64>,
    pub glb_idx: List<u64>,
    pub rank: List<u64>,
    fields: HashMap<String, Field>,
    spaces: HashMap<String, Space>,
}

impl Dictionary {
    pub fn new(name: impl Into<String>, dim: usize, continuous: bool, my_rank: u64) -> Self {
        Self {
            name: name.into(),
            continuous,
            my_rank,
            coordinates: Table::with_row_size(dim),
            glb_idx: List::new(),
            rank: List::new(),
            fields: HashMap::new(),
            spaces: HashMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.coordinates.size()
    }

    pub fn resize(&mut self, n: usize) {
        self.coordinates.resize(n);
        self.glb_idx.resize(n);
        self.rank.resize(n);
        for field in self.fields.values_mut() {
            field.data.resize(n);
        }
    }

    pub fn is_ghost(&self, dof: usize) -> bool {
        *self.rank.get(dof).expect("dof index in range") != self.my_rank
    }

    pub fn create_field(&mut self, name: impl Into<String>, descriptor: VariablesDescriptor) -> &mut Field {
        let name = name.into();
        let field = Field::new(name.clone(), self.size(), descriptor);
        self.fields.insert(name.clone(), field);
        self.fields.get_mut(&name).unwrap()
    }

    pub fn field(&self, name: &str) -> Result<&Field, MeshError> {
        self.fields.get(name).ok_or_else(|| MeshError::NoSuchField(name.to_string()))
    }

    pub fn field_mut(&mut self, name: &str) -> Result<&mut Field, MeshError> {
        self.fields.get_mut(name).ok_or_else(|| MeshError::NoSuchField(name.to_string()))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Guarantees exactly one Space per (Entities, Dictionary) pair.
    pub fn add_space(&mut self, entities_name: impl Into<String>, space: Space) {
        let entities_name = entities_name.into();
        if self.spaces.contains_key(&entities_name) {
            tracing::debug!(dictionary = %self.name, entities = %entities_name, "replacing existing space binding");
        }
        self.spaces.insert(entities_name, space);
    }

    pub fn space(&self, entities_name: &str) -> Result<&Space, MeshError> {
        self.spaces.get(entities_name).ok_or_else(|| MeshError::NoSuchSpace(entities_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::Dimensionality;

    #[test]
    fn fields_created_on_a_dictionary_match_its_dof_count() {
        let mut dict = Dictionary::new("fields", 2, true, 0);
        dict.resize(10);
        let mut descriptor = VariablesDescriptor::new();
        descriptor.push("rho", Dimensionality::Scalar);
        descriptor.push("velocity", Dimensionality::Vector(2));
        let field = dict.create_field("solution", descriptor);
        assert_eq!(field.nb_dofs(), 10);
        assert_eq!(field.data.row_size(), 3);
    }

    #[test]
    fn resizing_a_dictionary_resizes_its_fields_too() {
        let mut dict = Dictionary::new("fields", 1, true, 0);
        dict.resize(2);
        let mut descriptor = VariablesDescriptor::new();
        descriptor.push("u", Dimensionality::Scalar);
        dict.create_field("solution", descriptor);
        dict.resize(5);
        assert_eq!(dict.field("solution").unwrap().nb_dofs(), 5);
    }
}
