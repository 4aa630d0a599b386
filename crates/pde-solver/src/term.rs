//! Flux terms, evaluated per element and scattered into per-DoF residual and
//! wave-speed arrays.

use pde_mesh::{Dictionary, Entities};
use pde_table::Table;
use std::cell::RefCell;
use std::collections::HashMap;

/// One element's contribution: `term` is `nb_dofs_in_element * nb_eqs` values
/// in the same order as the element's DoF connectivity, `wave_speed` is one
/// value per DoF in that element.
pub struct ElementContribution {
    pub term: Vec<f64>,
    pub wave_speed: Vec<f64>,
}

/// Physics plugged into a [`TermComputer`]. Only the Entities named by
/// [`Term::entities_name`] are looped.
pub trait Term: Send + Sync {
    fn entities_name(&self) -> &str;
    fn nb_eqs(&self) -> usize;
    fn compute_element(&self, entities: &Entities, local_idx: usize, elem_coords: &[[f64; 3]]) -> ElementContribution;
}

/// The result of assembling one [`Term`] (or the sum of several, in
/// [`crate::ComputeRHS`]) over a dictionary's DoFs.
#[derive(Clone)]
pub struct TermResult {
    pub term: Vec<f64>,
    pub wave_speed: Vec<f64>,
}

impl TermResult {
    pub fn zeroed(nb_dofs: usize, nb_eqs: usize) -> Self {
        Self { term: vec![0.0; nb_dofs * nb_eqs], wave_speed: vec![0.0; nb_dofs] }
    }
}

/// Owns a [`Term`] and caches, per Entities name, whether this term loops it.
pub struct TermComputer {
    pub name: String,
    term: Box<dyn Term>,
    loop_cache: RefCell<HashMap<String, bool>>,
}

impl TermComputer {
    pub fn new(name: impl Into<String>, term: Box<dyn Term>) -> Self {
        Self { name: name.into(), term, loop_cache: RefCell::new(HashMap::new()) }
    }

    fn should_loop(&self, entities: &Entities) -> bool {
        if let Some(&cached) = self.loop_cache.borrow().get(&entities.name) {
            return cached;
        }
        let decision = entities.name == self.term.entities_name();
        self.loop_cache.borrow_mut().insert(entities.name.clone(), decision);
        decision
    }

    /// Zeroes a fresh result, then scatter-adds every non-ghost element of
    /// every matching Entities block into it. A DoF shared by several
    /// elements of this term accumulates their sum; its wave speed is their
    /// running maximum.
    pub fn compute(&self, dictionary: &Dictionary, topology: &pde_mesh::Region, node_coords: &Table<f64>, my_rank: u64) -> TermResult {
        let nb_eqs = self.term.nb_eqs();
        let mut result = TermResult::zeroed(dictionary.size(), nb_eqs);

        topology.for_each_entities(&|e| self.should_loop(e), &mut |entities| {
            let Ok(space) = dictionary.space(&entities.name) else { return };
            for local in 0..entities.size() {
                if entities.is_ghost(local, my_rank) {
                    continue;
                }
                let elem_coords = entities.element_coords(local, node_coords);
                let contribution = self.term.compute_element(entities, local, &elem_coords);
                let dofs = space.dof_indices(local);
                for (i, &dof) in dofs.iter().enumerate() {
                    let dof = dof as usize;
                    for eq in 0..nb_eqs {
                        result.term[dof * nb_eqs + eq] += contribution.term[i * nb_eqs + eq];
                    }
                    result.wave_speed[dof] = result.wave_speed[dof].max(contribution.wave_speed[i]);
                }
            }
        });

        result
    }
}
