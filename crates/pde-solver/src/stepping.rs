//! Composites several PDEs' clocks under one outer loop and records wall-time
//! per iteration, independent of any single PDE's own history.

use crate::error::SolverError;
use crate::time::Time;
use pde_comm::Comm;
use pde_history::History;

/// Drives a shared iteration count across every composed [`Time`], firing a
/// callback after each step so subscribers (e.g. a post-processing hook) can
/// react once the clocks have moved.
pub struct TimeStepping {
    pub times: Vec<Time>,
    pub history: History,
    on_iteration_done: Vec<Box<dyn FnMut(&[Time])>>,
}

impl TimeStepping {
    pub fn new(history_path: impl Into<std::path::PathBuf>) -> Self {
        Self { times: Vec::new(), history: History::new(history_path), on_iteration_done: Vec::new() }
    }

    pub fn add_time(&mut self, time: Time) -> usize {
        self.times.push(time);
        self.times.len() - 1
    }

    pub fn on_iteration_done(&mut self, callback: Box<dyn FnMut(&[Time])>) {
        self.on_iteration_done.push(callback);
    }

    /// Advances every composed clock by `dt`, records elapsed wall time, and
    /// runs the `iteration_done` callbacks.
    pub fn advance(&mut self, dt: f64, wall_seconds: f64, comm: &dyn Comm) -> Result<(), SolverError> {
        for time in &mut self.times {
            time.advance(dt);
        }
        self.history.set("walltime", wall_seconds);
        if let Some(first) = self.times.first() {
            self.history.set("time", first.current_time);
        }
        self.history.save_entry(comm)?;
        for callback in &mut self.on_iteration_done {
            callback(&self.times);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pde_comm::LocalCluster;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn every_composed_clock_advances_and_the_callback_fires() {
        let dir = tempfile::tempdir().unwrap();
        let mut stepping = TimeStepping::new(dir.path().join("stepping.tsv"));
        stepping.add_time(Time::default());
        stepping.add_time(Time::default());

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        stepping.on_iteration_done(Box::new(move |_times| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let cluster = LocalCluster::new(1);
        let comm = cluster.comm(0);
        stepping.advance(0.1, 0.002, &comm).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(stepping.times.iter().all(|t| (t.current_time - 0.1).abs() < 1e-12));
    }
}
