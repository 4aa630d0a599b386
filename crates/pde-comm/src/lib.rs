//! The message-passing transport collaborator.
//!
//! The core only ever needs four collectives: `barrier`, `all_reduce`,
//! `gather` and `broadcast`, all of which block the caller and must be
//! entered in the same order by every rank. [`Comm`] is the abstract
//! interface; [`LocalComm`] is a same-process, multi-thread implementation
//! (a shared-slot rendezvous gated by a pair of barriers) used so the
//! parallel octree lookup, the partitioner driver and the interpolation
//! fallback path can be exercised by tests without an MPI installation.

use std::sync::{Arc, Barrier, Mutex};

/// Abstract collective-operations interface. All methods block the caller.
pub trait Comm: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    fn barrier(&self);

    /// Every rank contributes `value`; every rank receives the minimum.
    fn all_reduce_min_u64(&self, value: u64) -> u64;
    /// Every rank contributes `value`; every rank receives the minimum.
    fn all_reduce_min_f64(&self, value: f64) -> f64;

    /// Every rank contributes `values`; `root` receives the concatenation in
    /// rank order, everyone else receives `None`.
    fn gather_u64(&self, values: &[u64], root: usize) -> Option<Vec<u64>>;

    /// Every rank contributes `values`; `root` receives the concatenation in
    /// rank order, everyone else receives `None`.
    fn gather_f64(&self, values: &[f64], root: usize) -> Option<Vec<f64>>;

    /// `root` contributes `data`; every rank (including `root`) receives it.
    fn broadcast_f64(&self, data: &[f64], root: usize) -> Vec<f64>;
}

struct ClusterState {
    size: usize,
    barrier: Barrier,
    // One slot per rank, written by that rank, read by everyone once all have written.
    slots: Mutex<Vec<Option<Vec<u8>>>>,
}

/// Shared state for an in-process simulated cluster. Create one, then spawn
/// one [`LocalComm`] per simulated rank (e.g. via `std::thread::scope`).
pub struct LocalCluster {
    state: Arc<ClusterState>,
}

impl LocalCluster {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "a cluster needs at least one rank");
        Self {
            state: Arc::new(ClusterState {
                size,
                barrier: Barrier::new(size),
                slots: Mutex::new(vec![None; size]),
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.state.size
    }

    pub fn comm(&self, rank: usize) -> LocalComm {
        assert!(rank < self.state.size);
        LocalComm { rank, state: self.state.clone() }
    }
}

/// One rank's handle into a [`LocalCluster`].
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    state: Arc<ClusterState>,
}

impl LocalComm {
    /// All-to-all byte exchange: every rank's payload becomes visible to
    /// every rank, in rank order. The two barriers bound the critical
    /// section so a fast rank can't start the next collective before a slow
    /// rank has read this one's results.
    fn exchange(&self, payload: Vec<u8>) -> Vec<Vec<u8>> {
        {
            let mut slots = self.state.slots.lock().unwrap();
            slots[self.rank] = Some(payload);
        }
        self.state.barrier.wait();
        let result: Vec<Vec<u8>> = {
            let slots = self.state.slots.lock().unwrap();
            slots.iter().map(|s| s.clone().expect("all ranks must write before read")).collect()
        };
        self.state.barrier.wait();
        result
    }
}

impl Comm for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.state.size
    }

    fn barrier(&self) {
        tracing::trace!(rank = self.rank, "barrier");
        let _ = self.exchange(Vec::new());
    }

    fn all_reduce_min_u64(&self, value: u64) -> u64 {
        let replies = self.exchange(value.to_le_bytes().to_vec());
        replies
            .iter()
            .map(|b| u64::from_le_bytes(b.as_slice().try_into().unwrap()))
            .min()
            .unwrap()
    }

    fn all_reduce_min_f64(&self, value: f64) -> f64 {
        let replies = self.exchange(value.to_le_bytes().to_vec());
        replies
            .iter()
            .map(|b| f64::from_le_bytes(b.as_slice().try_into().unwrap()))
            .fold(f64::INFINITY, f64::min)
    }

    fn gather_u64(&self, values: &[u64], root: usize) -> Option<Vec<u64>> {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let replies = self.exchange(payload);
        if self.rank != root {
            return None;
        }
        let mut out = Vec::new();
        for reply in replies {
            out.extend(reply.chunks_exact(8).map(|c| u64::from_le_bytes(c.try_into().unwrap())));
        }
        Some(out)
    }

    fn gather_f64(&self, values: &[f64], root: usize) -> Option<Vec<f64>> {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let replies = self.exchange(payload);
        if self.rank != root {
            return None;
        }
        let mut out = Vec::new();
        for reply in replies {
            out.extend(reply.chunks_exact(8).map(|c| f64::from_le_bytes(c.try_into().unwrap())));
        }
        Some(out)
    }

    fn broadcast_f64(&self, data: &[f64], root: usize) -> Vec<f64> {
        let payload: Vec<u8> = if self.rank == root {
            data.iter().flat_map(|v| v.to_le_bytes()).collect()
        } else {
            Vec::new()
        };
        let replies = self.exchange(payload);
        replies[root].chunks_exact(8).map(|c| f64::from_le_bytes(c.try_into().unwrap())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn barrier_releases_all_ranks() {
        let cluster = LocalCluster::new(3);
        thread::scope(|scope| {
            for rank in 0..3 {
                let comm = cluster.comm(rank);
                scope.spawn(move || comm.barrier());
            }
        });
    }

    #[test]
    fn all_reduce_min_returns_the_global_minimum() {
        let cluster = LocalCluster::new(4);
        let results: Vec<u64> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|rank| {
                    let comm = cluster.comm(rank);
                    scope.spawn(move || comm.all_reduce_min_u64(rank as u64 + 1))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|&r| r == 1));
    }

    #[test]
    fn gather_concatenates_in_rank_order_only_on_root() {
        let cluster = LocalCluster::new(3);
        let results: Vec<Option<Vec<u64>>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|rank| {
                    let comm = cluster.comm(rank);
                    scope.spawn(move || comm.gather_u64(&[rank as u64], 0))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results[0], Some(vec![0, 1, 2]));
        assert_eq!(results[1], None);
        assert_eq!(results[2], None);
    }

    #[test]
    fn gather_f64_concatenates_in_rank_order_only_on_root() {
        let cluster = LocalCluster::new(3);
        let results: Vec<Option<Vec<f64>>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|rank| {
                    let comm = cluster.comm(rank);
                    scope.spawn(move || comm.gather_f64(&[rank as f64 + 0.5], 1))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results[1], Some(vec![0.5, 1.5, 2.5]));
        assert_eq!(results[0], None);
        assert_eq!(results[2], None);
    }

    #[test]
    fn broadcast_delivers_roots_payload_to_everyone() {
        let cluster = LocalCluster::new(3);
        let results: Vec<Vec<f64>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|rank| {
                    let comm = cluster.comm(rank);
                    scope.spawn(move || comm.broadcast_f64(&[1.0, 2.0, 3.0], 1))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for r in results {
            assert_eq!(r, vec![1.0, 2.0, 3.0]);
        }
    }
}
