//! Boundary conditions as actions applied to an assembled residual, after the
//! interior terms have been summed.

use pde_mesh::{Dictionary, Region};

/// Plugs the characteristic-variable correction into a non-reflective
/// boundary. Concrete flux physics decide what "correct" means; this crate
/// only owns the correction-then-reinterpolate control flow around it.
pub trait CharacteristicCorrection: Send + Sync {
    /// Overwrites the incoming-characteristic component of `residual_at_dof`
    /// (length `nb_eqs`) in place, given the boundary's outward normal.
    fn correct(&self, residual_at_dof: &mut [f64], outward_normal: &[f64; 3]);
}

/// Applies [`CharacteristicCorrection::correct`] to every non-ghost DoF of a
/// boundary Entities group, then leaves the corrected value in place for the
/// next residual reinterpolation pass (solution points double as flux points
/// under the shape functions this crate ships).
pub struct NonReflectiveBc {
    pub entities_name: String,
    pub correction: Box<dyn CharacteristicCorrection>,
}

/// Normal to a boundary face built from its node coordinates: the first
/// triangle's cross product for faces with 3+ nodes, the in-plane
/// perpendicular for 2-node edges.
fn face_normal(coords: &[[f64; 3]]) -> [f64; 3] {
    let n = if coords.len() >= 3 {
        let (a, b, c) = (coords[0], coords[1], coords[2]);
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        [u[1] * v[2] - u[2] * v[1], u[2] * v[0] - u[0] * v[2], u[0] * v[1] - u[1] * v[0]]
    } else if coords.len() == 2 {
        let (a, b) = (coords[0], coords[1]);
        [b[1] - a[1], a[0] - b[0], 0.0]
    } else {
        [0.0, 0.0, 0.0]
    };
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 { [n[0] / len, n[1] / len, n[2] / len] } else { n }
}

/// Slip-wall / symmetry correction: treats the trailing three equations of
/// each DoF as a velocity vector and removes its outward-normal component,
/// leaving the tangential part untouched. DoFs with fewer than three
/// trailing equations (pure scalar transport) are left unmodified.
pub struct SlipWallCorrection;

impl CharacteristicCorrection for SlipWallCorrection {
    fn correct(&self, residual_at_dof: &mut [f64], outward_normal: &[f64; 3]) {
        if residual_at_dof.len() < 3 {
            return;
        }
        let offset = residual_at_dof.len() - 3;
        let velocity = [residual_at_dof[offset], residual_at_dof[offset + 1], residual_at_dof[offset + 2]];
        let normal_component = velocity[0] * outward_normal[0] + velocity[1] * outward_normal[1] + velocity[2] * outward_normal[2];
        for i in 0..3 {
            residual_at_dof[offset + i] -= normal_component * outward_normal[i];
        }
    }
}

impl NonReflectiveBc {
    pub fn new(entities_name: impl Into<String>, correction: Box<dyn CharacteristicCorrection>) -> Self {
        Self { entities_name: entities_name.into(), correction }
    }

    /// Corrects `residual` (row-major, `nb_eqs` wide) in place at every DoF
    /// reached through this boundary's face Entities.
    pub fn apply(&self, dictionary: &Dictionary, topology: &Region, residual: &mut [f64], nb_eqs: usize, my_rank: u64) {
        topology.for_each_entities(&|e| e.name == self.entities_name, &mut |entities| {
            let Ok(space) = dictionary.space(&entities.name) else { return };
            for local in 0..entities.size() {
                if entities.is_ghost(local, my_rank) {
                    continue;
                }
                let normal = face_normal(&entities.element_coords(local, &dictionary.coordinates));
                for &dof in space.dof_indices(local) {
                    let dof = dof as usize;
                    let slice = &mut residual[dof * nb_eqs..(dof + 1) * nb_eqs];
                    self.correction.correct(slice, &normal);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pde_mesh::{BilinearQuad, Entities, Space as MeshSpace};
    use std::sync::Arc;

    struct ZeroOutFirstEquation;
    impl CharacteristicCorrection for ZeroOutFirstEquation {
        fn correct(&self, residual_at_dof: &mut [f64], _outward_normal: &[f64; 3]) {
            residual_at_dof[0] = 0.0;
        }
    }

    #[test]
    fn correction_runs_only_on_the_named_boundary_entities() {
        let mut dictionary = Dictionary::new("fields", 2, true, 0);
        dictionary.resize(4);

        let mut topology = Region::new("domain");
        let mut wall = Entities::new("wall", Arc::new(BilinearQuad), false);
        wall.resize(1);
        wall.node_connectivity.set_row(0, &[0, 1, 2, 3]).unwrap();
        let mut space = MeshSpace::new(Arc::new(BilinearQuad));
        space.connectivity.resize(1);
        space.connectivity.set_row(0, &[0, 1, 2, 3]).unwrap();
        dictionary.add_space("wall", space);
        topology.add_entities(wall);

        let bc = NonReflectiveBc::new("wall", Box::new(ZeroOutFirstEquation));
        let mut residual = vec![5.0; 4];
        bc.apply(&dictionary, &topology, &mut residual, 1, 0);
        assert_eq!(residual, vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn slip_wall_correction_removes_only_the_normal_velocity_component() {
        let correction = SlipWallCorrection;
        let normal = [1.0, 0.0, 0.0];
        let mut residual = vec![3.0, 4.0, 0.0]; // [vx, vy, vz]
        correction.correct(&mut residual, &normal);
        assert_eq!(residual, vec![0.0, 4.0, 0.0]);
    }

    #[test]
    fn slip_wall_correction_leaves_scalar_equations_untouched() {
        let correction = SlipWallCorrection;
        let mut residual = vec![7.0];
        correction.correct(&mut residual, &[1.0, 0.0, 0.0]);
        assert_eq!(residual, vec![7.0]);
    }
}
