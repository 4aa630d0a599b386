use pde_comm::LocalCluster;
use pde_mesh::{BilinearQuad, Entities, Mesh};
use pde_spatial::{find_cell_ranks, CellCounts, Octree};
use std::sync::Arc;

fn strip_mesh(rank: usize, nb_cells: usize) -> Mesh {
    let offset = (rank * nb_cells) as f64;
    let mut mesh = Mesh::new(2, rank as u64);
    mesh.geometry.resize(2 * (nb_cells + 1));
    for i in 0..=nb_cells {
        let x = offset + i as f64;
        let bottom = mesh.geometry.coordinates.get_row_mut(2 * i).unwrap();
        bottom[0] = x;
        bottom[1] = 0.0;
        let top = mesh.geometry.coordinates.get_row_mut(2 * i + 1).unwrap();
        top[0] = x;
        top[1] = 1.0;
    }
    let mut quads = Entities::new("quads", Arc::new(BilinearQuad), true);
    quads.resize(nb_cells);
    for i in 0..nb_cells {
        let row = quads.node_connectivity.get_row_mut(i).unwrap();
        row[0] = 2 * i as u64;
        row[1] = 2 * i as u64 + 2;
        row[2] = 2 * i as u64 + 3;
        row[3] = 2 * i as u64 + 1;
    }
    mesh.topology.add_entities(quads);
    mesh
}

/// Three ranks each own a disjoint strip of the same domain; a query point
/// that falls in rank 2's strip, asked from rank 0, must resolve to rank 2
/// and nowhere else.
#[test]
fn three_rank_domain_resolves_a_remote_query_point_to_its_sole_owner() {
    let cluster = LocalCluster::new(3);
    let results: Vec<Vec<u64>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..3)
            .map(|rank| {
                let comm = cluster.comm(rank);
                scope.spawn(move || {
                    let mesh = strip_mesh(rank, 2);
                    let unified = mesh.unified_volume_elements();
                    let octree =
                        Octree::build_from(&unified, &mesh.geometry.coordinates, 2, CellCounts::ElemsPerCell(1));
                    let query = if rank == 0 { vec![[4.5, 0.5, 0.0]] } else { vec![] };
                    find_cell_ranks(&query, &octree, &unified, &mesh.geometry.coordinates, &comm)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results[0], vec![2]);
    assert!(results[1].is_empty());
    assert!(results[2].is_empty());
}
