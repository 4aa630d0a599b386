//! Drives a single [`Pde`] through repeated explicit time steps, picking a
//! CFL-limited step each iteration and recording history as it goes.

use crate::error::SolverError;
use crate::pde::{Pde, WAVE_SPEED};
use crate::time::TimeStepComputer;
use pde_comm::Comm;
use pde_history::History;
use pde_mesh::Region;

/// Owns one PDE, its topology, its time-step policy, and an optional history
/// recorder flushed when the run stops.
pub struct PdeSolver {
    pub pde: Pde,
    pub topology: Region,
    pub time_step: TimeStepComputer,
    pub max_iteration: u64,
    pub history: Option<History>,
    my_rank: u64,
    iterations_run: u64,
}

impl PdeSolver {
    pub fn new(pde: Pde, topology: Region, time_step: TimeStepComputer, max_iteration: u64, my_rank: u64) -> Self {
        Self { pde, topology, time_step, max_iteration, history: None, my_rank, iterations_run: 0 }
    }

    pub fn setup(&mut self) {
        self.pde.ensure_fields();
    }

    pub fn iterations_run(&self) -> u64 {
        self.iterations_run
    }

    /// True once `end_time` is reached (time-accurate mode) or
    /// `max_iteration` steps have run.
    pub fn stop_condition(&self) -> bool {
        if let Some(time) = &self.pde.time {
            if time.time_accurate && time.current_time >= time.end_time {
                return true;
            }
        }
        self.iterations_run >= self.max_iteration
    }

    /// Assembles the residual and wave speed, picks a CFL-limited step,
    /// advances the solution and clock, then records one history entry.
    pub fn do_iteration(&mut self, comm: &dyn Comm) -> Result<(), SolverError> {
        self.pde.compute_residual(&self.topology, self.my_rank)?;
        let mut dt = self.time_step.compute(&mut self.pde.fields, WAVE_SPEED, "dt", comm)?;
        if let Some(time) = &self.pde.time {
            if time.time_accurate {
                dt = dt.min((time.end_time - time.current_time).max(0.0));
            }
        }
        self.pde.advance_solution(dt)?;
        if let Some(time) = self.pde.time.as_mut() {
            time.advance(dt);
        }
        self.iterations_run += 1;

        if let Some(history) = &mut self.history {
            history.set("iteration", self.iterations_run as f64);
            if let Some(time) = &self.pde.time {
                history.set("time", time.current_time);
                history.set("dt", time.dt);
            }
            history.save_entry(comm)?;
        }
        Ok(())
    }

    pub fn solve_iterations(&mut self, n: u64, comm: &dyn Comm) -> Result<(), SolverError> {
        for _ in 0..n {
            if self.stop_condition() {
                break;
            }
            self.do_iteration(comm)?;
        }
        if !self.stop_condition() {
            tracing::info!(iterations_run = self.iterations_run, "requested iteration count exhausted before stop condition");
        }
        self.flush_history()?;
        Ok(())
    }

    /// Runs to `current_time + dt`, in time-accurate mode, regardless of the
    /// clock's previous mode.
    pub fn solve_time_step(&mut self, dt: f64, comm: &dyn Comm) -> Result<(), SolverError> {
        let time = self.pde.time.get_or_insert_with(Default::default);
        time.time_accurate = true;
        time.end_time = time.current_time + dt;

        while !self.stop_condition() {
            if let Err(e) = self.do_iteration(comm) {
                tracing::warn!(error = %e, iterations_run = self.iterations_run, "iteration failed, flushing history before returning");
                self.flush_history().ok();
                return Err(e);
            }
        }
        self.flush_history()?;
        Ok(())
    }

    fn flush_history(&mut self) -> Result<(), SolverError> {
        if let Some(history) = &mut self.history {
            history.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pde::Pde;
    use crate::term::{ElementContribution, Term, TermComputer};
    use crate::time::TimeStepMode;
    use pde_comm::LocalCluster;
    use pde_mesh::{BilinearQuad, Dictionary, Entities, Space as MeshSpace};
    use std::sync::Arc;

    struct UnitWaveSpeed;
    impl Term for UnitWaveSpeed {
        fn entities_name(&self) -> &str {
            "quad"
        }
        fn nb_eqs(&self) -> usize {
            1
        }
        fn compute_element(&self, entities: &Entities, _local_idx: usize, _elem_coords: &[[f64; 3]]) -> ElementContribution {
            let n = entities.shape.nb_nodes();
            ElementContribution { term: vec![1.0; n], wave_speed: vec![1.0; n] }
        }
    }

    fn single_quad_pde() -> (Pde, Region) {
        let mut fields = Dictionary::new("fields", 2, true, 0);
        fields.resize(4);

        let mut topology = Region::new("domain");
        let mut quad = Entities::new("quad", Arc::new(BilinearQuad), true);
        quad.resize(1);
        quad.node_connectivity.set_row(0, &[0, 1, 2, 3]).unwrap();
        let mut space = MeshSpace::new(Arc::new(BilinearQuad));
        space.connectivity.resize(1);
        space.connectivity.set_row(0, &[0, 1, 2, 3]).unwrap();
        fields.add_space("quad", space);
        topology.add_entities(quad);

        let mut pde = Pde::new(fields, 1).with_time(true);
        pde.compute_rhs.add_term(TermComputer::new("wave", Box::new(UnitWaveSpeed)));
        pde.time.as_mut().unwrap().end_time = 0.0;
        (pde, topology)
    }

    /// A single unit-wave-speed term, cfl=1, time_accurate, end_time=0.5
    /// completes with current_time >= 0.5 and at least one recorded
    /// iteration per dt_min step.
    #[test]
    fn solve_time_step_reaches_the_requested_end_time() {
        let (pde, topology) = single_quad_pde();
        let time_step = TimeStepComputer::new(1.0, TimeStepMode::TimeAccurate);
        let mut solver = PdeSolver::new(pde, topology, time_step, 10_000, 0);
        solver.setup();
        let dir = tempfile::tempdir().unwrap();
        solver.history = Some(History::new(dir.path().join("run.tsv")));

        let cluster = LocalCluster::new(1);
        let comm = cluster.comm(0);
        solver.solve_time_step(0.5, &comm).unwrap();

        let time = solver.pde.time.unwrap();
        assert!(time.current_time >= 0.5 - 1e-9);
        assert!(solver.iterations_run() <= 10_000);
        assert!(solver.iterations_run() >= 1);
    }
}
