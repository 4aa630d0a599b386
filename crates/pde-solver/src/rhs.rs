//! Assembles the right-hand side of a PDE from an ordered list of term
//! computers and boundary conditions.

use crate::bc::NonReflectiveBc;
use crate::term::{TermComputer, TermResult};
use pde_mesh::{Dictionary, Region};

/// Owns every [`TermComputer`] that contributes to the residual, plus the
/// boundary corrections applied after the interior sum.
pub struct ComputeRhs {
    pub term_computers: Vec<TermComputer>,
    pub boundary_conditions: Vec<NonReflectiveBc>,
}

impl ComputeRhs {
    pub fn new() -> Self {
        Self { term_computers: Vec::new(), boundary_conditions: Vec::new() }
    }

    pub fn add_term(&mut self, computer: TermComputer) {
        self.term_computers.push(computer);
    }

    pub fn add_bc(&mut self, bc: NonReflectiveBc) {
        self.boundary_conditions.push(bc);
    }

    /// Sums every term computer's contribution (their own scatter-add over
    /// their Entities), takes the pointwise maximum of their wave speeds,
    /// then applies boundary corrections in registration order.
    pub fn assemble(&self, dictionary: &Dictionary, topology: &Region, nb_eqs: usize, my_rank: u64) -> TermResult {
        let nb_dofs = dictionary.size();
        let mut assembled = TermResult::zeroed(nb_dofs, nb_eqs);

        for computer in &self.term_computers {
            let contribution = computer.compute(dictionary, topology, &dictionary.coordinates, my_rank);
            for i in 0..assembled.term.len() {
                assembled.term[i] += contribution.term[i];
            }
            for dof in 0..nb_dofs {
                assembled.wave_speed[dof] = assembled.wave_speed[dof].max(contribution.wave_speed[dof]);
            }
        }

        for bc in &self.boundary_conditions {
            bc.apply(dictionary, topology, &mut assembled.term, nb_eqs, my_rank);
        }

        assembled
    }
}

impl Default for ComputeRhs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::ElementContribution;
    use crate::term::Term as TermTrait;
    use pde_mesh::{BilinearQuad, Dimensionality, Entities, Mesh, Space as MeshSpace, VariablesDescriptor};
    use std::sync::Arc;

    struct Advection;
    impl TermTrait for Advection {
        fn entities_name(&self) -> &str {
            "quads"
        }
        fn nb_eqs(&self) -> usize {
            1
        }
        fn compute_element(&self, entities: &Entities, _local_idx: usize, _elem_coords: &[[f64; 3]]) -> ElementContribution {
            let n = entities.shape.nb_nodes();
            ElementContribution { term: vec![1.0; n], wave_speed: vec![1.0; n] }
        }
    }

    struct Diffusion;
    impl TermTrait for Diffusion {
        fn entities_name(&self) -> &str {
            "quads"
        }
        fn nb_eqs(&self) -> usize {
            1
        }
        fn compute_element(&self, entities: &Entities, _local_idx: usize, _elem_coords: &[[f64; 3]]) -> ElementContribution {
            let n = entities.shape.nb_nodes();
            ElementContribution { term: vec![0.5; n], wave_speed: vec![3.0; n] }
        }
    }

    fn single_quad_mesh() -> Mesh {
        let mut mesh = Mesh::new(2, 0);
        mesh.geometry.resize(4);
        let mut descriptor = VariablesDescriptor::new();
        descriptor.push("u", Dimensionality::Scalar);
        mesh.geometry.create_field("solution", descriptor);

        let mut quads = Entities::new("quads", Arc::new(BilinearQuad), true);
        quads.resize(1);
        quads.node_connectivity.set_row(0, &[0, 1, 2, 3]).unwrap();
        let mut space = MeshSpace::new(Arc::new(BilinearQuad));
        space.connectivity.resize(1);
        space.connectivity.set_row(0, &[0, 1, 2, 3]).unwrap();
        mesh.geometry.add_space("quads", space);
        mesh.topology.add_entities(quads);
        mesh
    }

    /// Residual equals the sum of every term's contribution, and wave speed
    /// equals their pointwise maximum.
    #[test]
    fn residual_sums_terms_and_wave_speed_takes_their_maximum() {
        let mesh = single_quad_mesh();
        let mut rhs = ComputeRhs::new();
        rhs.add_term(TermComputer::new("advection", Box::new(Advection)));
        rhs.add_term(TermComputer::new("diffusion", Box::new(Diffusion)));

        let result = rhs.assemble(&mesh.geometry, &mesh.topology, 1, 0);
        assert!(result.term.iter().all(|&v| (v - 1.5).abs() < 1e-12));
        assert!(result.wave_speed.iter().all(|&v| (v - 3.0).abs() < 1e-12));
    }
}
