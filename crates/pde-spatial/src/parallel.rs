use crate::octree::Octree;
use pde_comm::Comm;
use pde_mesh::UnifiedElements;
use pde_table::Table;

/// Sentinel meaning "this rank does not contain the point" in the
/// min-reduction reply.
const NOT_FOUND: u64 = u64::MAX;

/// `find_cell_ranks` resolves, for every point this rank asked about, which
/// rank owns it. Points found locally are assigned to this
/// rank outright; points missing locally are resolved by a broadcast loop
/// where each rank in turn broadcasts its missing points and every other
/// rank replies with its own rank id (or [`NOT_FOUND`]), the minimum of
/// which breaks overlap ties deterministically in favour of the lowest
/// rank.
pub fn find_cell_ranks(
    local_points: &[[f64; 3]],
    octree: &Octree,
    unified: &UnifiedElements<'_>,
    node_coords: &Table<f64>,
    comm: &dyn Comm,
) -> Vec<u64> {
    let my_rank = comm.rank() as u64;
    let mut ranks = vec![NOT_FOUND; local_points.len()];
    let mut missing_indices = Vec::new();
    for (i, p) in local_points.iter().enumerate() {
        if octree.find_element(p, unified, node_coords).is_some() {
            ranks[i] = my_rank;
        } else {
            missing_indices.push(i);
        }
    }

    for r in 0..comm.size() {
        let my_missing_flat: Vec<f64> = if comm.rank() == r {
            missing_indices.iter().flat_map(|&i| local_points[i]).collect()
        } else {
            Vec::new()
        };
        let flat = comm.broadcast_f64(&my_missing_flat, r);
        let n_points = flat.len() / 3;

        let replies: Vec<u64> = (0..n_points)
            .map(|i| {
                let p = [flat[3 * i], flat[3 * i + 1], flat[3 * i + 2]];
                if octree.find_element(&p, unified, node_coords).is_some() {
                    my_rank
                } else {
                    NOT_FOUND
                }
            })
            .collect();

        if let Some(gathered) = comm.gather_u64(&replies, r) {
            for (local_i, &missing_i) in missing_indices.iter().enumerate() {
                let owner = (0..comm.size()).map(|k| gathered[k * n_points + local_i]).min().unwrap_or(NOT_FOUND);
                ranks[missing_i] = owner;
            }
        }
    }

    tracing::debug!(rank = comm.rank(), resolved = ranks.iter().filter(|&&r| r != NOT_FOUND).count(), "find_cell_ranks done");
    ranks
}
