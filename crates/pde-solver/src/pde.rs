//! Bundles a dictionary of solution fields with the machinery that computes
//! its right-hand side.

use crate::error::SolverError;
use crate::rhs::ComputeRhs;
use crate::time::Time;
use pde_mesh::{Dictionary, Dimensionality, Region, VariablesDescriptor};

pub const SOLUTION: &str = "solution";
pub const RHS: &str = "rhs";
pub const WAVE_SPEED: &str = "wave_speed";

/// One PDE being solved: its DoF layout, the equation count, the RHS
/// assembler, and (for time-dependent problems) a clock.
pub struct Pde {
    pub fields: Dictionary,
    pub nb_eqs: usize,
    pub compute_rhs: ComputeRhs,
    pub time: Option<Time>,
}

impl Pde {
    pub fn new(fields: Dictionary, nb_eqs: usize) -> Self {
        Self { fields, nb_eqs, compute_rhs: ComputeRhs::new(), time: None }
    }

    pub fn with_time(mut self, time_accurate: bool) -> Self {
        self.time = Some(Time { time_accurate, ..Time::default() });
        self
    }

    /// Creates `solution`, `rhs` and `wave_speed` fields sized to `nb_eqs`
    /// (wave speed is always scalar) if they don't already exist.
    pub fn ensure_fields(&mut self) {
        for name in [SOLUTION, RHS] {
            if !self.fields.has_field(name) {
                let mut descriptor = VariablesDescriptor::new();
                descriptor.push("value", Dimensionality::Vector(self.nb_eqs));
                self.fields.create_field(name, descriptor);
            }
        }
        if !self.fields.has_field(WAVE_SPEED) {
            let mut descriptor = VariablesDescriptor::new();
            descriptor.push("value", Dimensionality::Scalar);
            self.fields.create_field(WAVE_SPEED, descriptor);
        }
    }

    /// Assembles `rhs` and `wave_speed` from the registered term computers
    /// and boundary conditions. Ghost DoFs are left untouched (zero, unless a
    /// parallel update already wrote them).
    pub fn compute_residual(&mut self, topology: &Region, my_rank: u64) -> Result<(), SolverError> {
        let result = self.compute_rhs.assemble(&self.fields, topology, self.nb_eqs, my_rank);
        let rhs = self.fields.field_mut(RHS)?;
        for dof in 0..rhs.nb_dofs() {
            rhs.data.set_row(dof, &result.term[dof * self.nb_eqs..(dof + 1) * self.nb_eqs]).map_err(pde_mesh::MeshError::from)?;
        }
        let ws = self.fields.field_mut(WAVE_SPEED)?;
        for dof in 0..ws.nb_dofs() {
            ws.data.set_row(dof, &[result.wave_speed[dof]]).map_err(pde_mesh::MeshError::from)?;
        }
        Ok(())
    }

    /// Forward-Euler update: `solution += dt * rhs`, at every non-ghost DoF.
    pub fn advance_solution(&mut self, dt: f64) -> Result<(), SolverError> {
        let nb_eqs = self.nb_eqs;
        let rhs_rows: Vec<Vec<f64>> = {
            let rhs = self.fields.field(RHS)?;
            (0..rhs.nb_dofs()).map(|dof| rhs.data.get_row(dof).expect("dof in range").to_vec()).collect()
        };
        let ghost_flags: Vec<bool> = (0..self.fields.size()).map(|dof| self.fields.is_ghost(dof)).collect();
        let solution = self.fields.field_mut(SOLUTION)?;
        for dof in 0..solution.nb_dofs() {
            if ghost_flags[dof] {
                continue;
            }
            let row = solution.data.get_row_mut(dof).map_err(pde_mesh::MeshError::from)?;
            for eq in 0..nb_eqs {
                row[eq] += dt * rhs_rows[dof][eq];
            }
        }
        Ok(())
    }
}
