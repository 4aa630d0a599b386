//! Wall-clock-independent simulation time tracking and time-step selection.

use crate::error::SolverError;
use pde_comm::Comm;
use pde_mesh::Dictionary;

/// A PDE's simulation clock: current time, step count, and (once set) the
/// step size last used.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    pub current_time: f64,
    pub iteration: u64,
    pub dt: f64,
    pub end_time: f64,
    pub time_accurate: bool,
}

impl Time {
    pub fn advance(&mut self, dt: f64) {
        self.current_time += dt;
        self.dt = dt;
        self.iteration += 1;
    }
}

pub enum TimeStepMode {
    /// One global step, the CFL-limited minimum over every DoF, synchronized
    /// across ranks.
    TimeAccurate,
    /// Per-DoF local time stepping: convergence acceleration for steady
    /// problems, no cross-rank synchronization beyond reading the field.
    Local,
}

/// Turns a wave-speed field into a step size under a CFL limit.
pub struct TimeStepComputer {
    pub cfl: f64,
    pub mode: TimeStepMode,
}

impl TimeStepComputer {
    pub fn new(cfl: f64, mode: TimeStepMode) -> Self {
        Self { cfl, mode }
    }

    /// In [`TimeStepMode::TimeAccurate`], returns the CFL-limited minimum
    /// step over every non-ghost DoF with positive wave speed, reduced to the
    /// global minimum across ranks. In [`TimeStepMode::Local`], writes a
    /// per-DoF step into `dt_field` and returns the domain-local minimum
    /// (for reporting only; it is not synchronized).
    pub fn compute(&self, dictionary: &mut Dictionary, wave_speed_field: &str, dt_field: &str, comm: &dyn Comm) -> Result<f64, SolverError> {
        let nb_dofs = dictionary.size();
        let mut local_min = f64::INFINITY;
        let mut per_dof = vec![f64::INFINITY; nb_dofs];
        {
            let ws = dictionary.field(wave_speed_field)?;
            for dof in 0..nb_dofs {
                let speed = ws.data.get_row(dof).map_err(pde_mesh::MeshError::from)?[0];
                if speed > 0.0 {
                    let step = self.cfl / speed;
                    per_dof[dof] = step;
                    if !dictionary.is_ghost(dof) {
                        local_min = local_min.min(step);
                    }
                }
            }
        }

        match self.mode {
            TimeStepMode::TimeAccurate => Ok(comm.all_reduce_min_f64(local_min)),
            TimeStepMode::Local => {
                let dt = dictionary.field_mut(dt_field)?;
                for dof in 0..nb_dofs {
                    let step = if per_dof[dof].is_finite() { per_dof[dof] } else { 0.0 };
                    dt.data.set_row(dof, &[step]).map_err(pde_mesh::MeshError::from)?;
                }
                Ok(local_min)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pde_comm::LocalCluster;
    use pde_mesh::{Dimensionality, VariablesDescriptor};

    fn dictionary_with_wave_speed(values: &[f64]) -> Dictionary {
        let mut dict = Dictionary::new("fields", 1, true, 0);
        dict.resize(values.len());
        let mut ws_descriptor = VariablesDescriptor::new();
        ws_descriptor.push("ws", Dimensionality::Scalar);
        let ws = dict.create_field("wave_speed", ws_descriptor);
        for (i, &v) in values.iter().enumerate() {
            ws.data.set_row(i, &[v]).unwrap();
        }
        dict
    }

    #[test]
    fn time_accurate_step_is_the_cfl_limited_minimum() {
        let mut dict = dictionary_with_wave_speed(&[2.0, 4.0, 1.0]);
        let computer = TimeStepComputer::new(1.0, TimeStepMode::TimeAccurate);
        let cluster = LocalCluster::new(1);
        let comm = cluster.comm(0);
        let dt = computer.compute(&mut dict, "wave_speed", "dt", &comm).unwrap();
        assert!((dt - 1.0).abs() < 1e-12);
    }

    #[test]
    fn local_mode_writes_a_per_dof_step_field() {
        let mut dict = dictionary_with_wave_speed(&[2.0, 4.0]);
        let mut dt_descriptor = VariablesDescriptor::new();
        dt_descriptor.push("dt", Dimensionality::Scalar);
        dict.create_field("dt", dt_descriptor);
        let computer = TimeStepComputer::new(1.0, TimeStepMode::Local);
        let cluster = LocalCluster::new(1);
        let comm = cluster.comm(0);
        computer.compute(&mut dict, "wave_speed", "dt", &comm).unwrap();
        assert!((dict.field("dt").unwrap().data.get_row(0).unwrap()[0] - 0.5).abs() < 1e-12);
        assert!((dict.field("dt").unwrap().data.get_row(1).unwrap()[0] - 0.25).abs() < 1e-12);
    }
}
