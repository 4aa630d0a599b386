use crate::hash::MixedHash;
use std::collections::BTreeMap;

/// One object's adjacency: neighbouring global ids and the rank each
/// currently resides on.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    pub neighbours: Vec<(u64, u64)>,
}

/// The callbacks an external graph partitioner queries: objects owned by
/// this rank, and their adjacency.
pub struct PartitionerDriver {
    objects: Vec<u64>,
    adjacency: BTreeMap<u64, Adjacency>,
}

impl PartitionerDriver {
    pub fn new() -> Self {
        Self { objects: Vec::new(), adjacency: BTreeMap::new() }
    }

    pub fn add_object(&mut self, global_id: u64, neighbours: Vec<(u64, u64)>) {
        self.objects.push(global_id);
        self.adjacency.insert(global_id, Adjacency { neighbours });
    }

    pub fn num_obj(&self) -> usize {
        self.objects.len()
    }

    pub fn obj_list(&self) -> &[u64] {
        &self.objects
    }

    pub fn num_edges_multi(&self) -> Vec<usize> {
        self.objects.iter().map(|g| self.adjacency.get(g).map(|a| a.neighbours.len()).unwrap_or(0)).collect()
    }

    pub fn edge_list_multi(&self) -> Vec<&[(u64, u64)]> {
        self.objects.iter().map(|g| self.adjacency.get(g).map(|a| a.neighbours.as_slice()).unwrap_or(&[])).collect()
    }
}

impl Default for PartitionerDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// One object's assigned destination part, as returned by a [`GraphPartitioner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjExport {
    pub global_id: u64,
    pub dest_part: usize,
}

/// GRAPH partitioning, EXPORT lists only, unweighted edges — the
/// configuration the driver calls an external partitioner with. Zoltan
/// itself is out of scope; this is the abstract seam plus one reference
/// implementation.
pub trait GraphPartitioner {
    fn call(&self, driver: &PartitionerDriver, nb_parts: usize) -> Vec<ObjExport>;
}

/// Assigns each owned object to a destination part by simple round robin
/// over its position in `obj_list()`, ignoring edge weights entirely.
pub struct RoundRobinPartitioner;

impl GraphPartitioner for RoundRobinPartitioner {
    fn call(&self, driver: &PartitionerDriver, nb_parts: usize) -> Vec<ObjExport> {
        driver
            .obj_list()
            .iter()
            .enumerate()
            .map(|(i, &global_id)| ObjExport { global_id, dest_part: i % nb_parts.max(1) })
            .collect()
    }
}

/// Pivots (object, destination-part) pairs into per-species, per-destination
/// export lists ("nodes-to-export", "elements-to-export").
pub fn pivot_by_species(exports: &[ObjExport], hash: &MixedHash) -> BTreeMap<(usize, usize), Vec<u64>> {
    let mut out: BTreeMap<(usize, usize), Vec<u64>> = BTreeMap::new();
    for export in exports {
        if let Ok(species) = hash.species_of(export.global_id) {
            out.entry((species, export.dest_part)).or_default().push(export.global_id);
        } else {
            tracing::warn!(global_id = export.global_id, "export references an id outside every registered species");
        }
    }
    tracing::debug!(nb_exports = exports.len(), nb_groups = out.len(), "pivoted exports by species and destination");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_partitioner_spreads_objects_across_parts() {
        let mut driver = PartitionerDriver::new();
        for g in 0..6 {
            driver.add_object(g, vec![]);
        }
        let exports = RoundRobinPartitioner.call(&driver, 3);
        assert_eq!(exports.len(), 6);
        assert_eq!(exports[0].dest_part, 0);
        assert_eq!(exports[3].dest_part, 0);
        assert_eq!(exports[1].dest_part, 1);
    }

    #[test]
    fn pivot_groups_exports_by_species_and_destination() {
        let mut hash = MixedHash::new(2, 2);
        hash.add_species("nodes", 4);
        hash.add_species("cells", 4);

        let exports = vec![
            ObjExport { global_id: 0, dest_part: 0 },
            ObjExport { global_id: 1, dest_part: 0 },
            ObjExport { global_id: 4, dest_part: 1 },
        ];
        let pivoted = pivot_by_species(&exports, &hash);
        assert_eq!(pivoted.get(&(0, 0)), Some(&vec![0, 1]));
        assert_eq!(pivoted.get(&(1, 1)), Some(&vec![4]));
    }
}
