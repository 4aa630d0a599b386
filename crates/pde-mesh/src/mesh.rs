use crate::dictionary::Dictionary;
use crate::entities::Entities;
use crate::region::Region;

/// Top-level mesh: a region topology plus the geometry dictionary holding
/// node coordinates.
pub struct Mesh {
    pub topology: Region,
    pub geometry: Dictionary,
}

impl Mesh {
    pub fn new(dim: usize, my_rank: u64) -> Self {
        Self { topology: Region::new("domain"), geometry: Dictionary::new("geometry", dim, true, my_rank) }
    }

    /// Flattens all volume Entities into a single unified index space, in
    /// depth-first, then per-Entities, insertion order: every (Entities,
    /// local index) pair gets exactly one unified index, used by the octree
    /// and the partitioner driver.
    pub fn unified_volume_elements(&self) -> UnifiedElements<'_> {
        let mut entries = Vec::new();
        self.topology.for_each_entities(&|e| e.is_volume, &mut |e: &Entities| {
            for local in 0..e.size() {
                entries.push((e, local));
            }
        });
        UnifiedElements { entries }
    }
}

pub struct UnifiedElements<'a> {
    entries: Vec<(&'a Entities, usize)>,
}

impl<'a> UnifiedElements<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, unified_idx: usize) -> (&'a Entities, usize) {
        self.entries[unified_idx]
    }

    pub fn centroid(&self, unified_idx: usize, node_coords: &pde_table::Table<f64>) -> [f64; 3] {
        let (entities, local) = self.get(unified_idx);
        entities.centroid(local, node_coords)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a Entities, usize)> + '_ {
        self.entries.iter().enumerate().map(|(u, &(e, l))| (u, e, l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::BilinearQuad;
    use std::sync::Arc;

    #[test]
    fn unified_index_covers_every_volume_element_exactly_once() {
        let mut mesh = Mesh::new(2, 0);
        let mut a = Entities::new("a", Arc::new(BilinearQuad), true);
        a.resize(3);
        let mut b = Entities::new("b", Arc::new(BilinearQuad), true);
        b.resize(2);
        mesh.topology.add_entities(a);
        mesh.topology.add_entities(b);

        let unified = mesh.unified_volume_elements();
        assert_eq!(unified.len(), 5);
    }
}
