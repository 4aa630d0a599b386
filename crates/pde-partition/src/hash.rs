use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HashError {
    #[error("global id {0} does not belong to any registered species")]
    UnknownGlobalId(u64),
}

/// Contiguous range of global ids belonging to one "species" of object
/// (nodes, or one Entities block), range-partitioned into `nb_parts` parts.
struct SubHash {
    name: String,
    base: u64,
    count: u64,
}

impl SubHash {
    fn part_of(&self, local_id: u64, nb_parts: u64) -> u64 {
        if self.count == 0 {
            return 0;
        }
        ((local_id * nb_parts) / self.count).min(nb_parts.saturating_sub(1))
    }
}

/// Assigns a contiguous, fixed-order range of global ids to each species,
/// and maps global ids to parts and owning ranks.
pub struct MixedHash {
    species: Vec<SubHash>,
    nb_parts: u64,
    nb_procs: u64,
}

impl MixedHash {
    pub fn new(nb_parts: u64, nb_procs: u64) -> Self {
        Self { species: Vec::new(), nb_parts, nb_procs }
    }

    /// Registers a species with `count` objects; its global-id range starts
    /// right after the previously registered species.
    pub fn add_species(&mut self, name: impl Into<String>, count: u64) -> usize {
        let base = self.species.last().map(|s| s.base + s.count).unwrap_or(0);
        self.species.push(SubHash { name: name.into(), base, count });
        self.species.len() - 1
    }

    pub fn species_name(&self, species: usize) -> &str {
        &self.species[species].name
    }

    pub fn species_of(&self, global_id: u64) -> Result<usize, HashError> {
        self.species
            .iter()
            .position(|s| global_id >= s.base && global_id < s.base + s.count)
            .ok_or(HashError::UnknownGlobalId(global_id))
    }

    pub fn part_of_obj(&self, global_id: u64) -> Result<u64, HashError> {
        let s = self.species_of(global_id)?;
        let sub = &self.species[s];
        Ok(sub.part_of(global_id - sub.base, self.nb_parts))
    }

    pub fn proc_of_part(&self, part: u64) -> u64 {
        (part * self.nb_procs) / self.nb_parts.max(1)
    }

    pub fn proc_of_obj(&self, global_id: u64) -> Result<u64, HashError> {
        Ok(self.proc_of_part(self.part_of_obj(global_id)?))
    }

    pub fn rank_owns(&self, global_id: u64, my_rank: u64) -> Result<bool, HashError> {
        Ok(self.proc_of_obj(global_id)? == my_rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_ids_resolve_to_the_species_that_declared_their_range() {
        let mut hash = MixedHash::new(4, 4);
        let nodes = hash.add_species("nodes", 10);
        let cells = hash.add_species("cells", 6);
        assert_eq!(hash.species_of(0).unwrap(), nodes);
        assert_eq!(hash.species_of(9).unwrap(), nodes);
        assert_eq!(hash.species_of(10).unwrap(), cells);
        assert_eq!(hash.species_of(15).unwrap(), cells);
        assert!(hash.species_of(16).is_err());
    }

    #[test]
    fn proc_of_part_distributes_parts_evenly_over_procs() {
        let hash = MixedHash::new(4, 2);
        assert_eq!(hash.proc_of_part(0), 0);
        assert_eq!(hash.proc_of_part(1), 0);
        assert_eq!(hash.proc_of_part(2), 1);
        assert_eq!(hash.proc_of_part(3), 1);
    }

    #[test]
    fn rank_owns_matches_the_object_derived_processor() {
        let mut hash = MixedHash::new(2, 2);
        hash.add_species("cells", 10);
        let owner = hash.proc_of_obj(7).unwrap();
        assert!(hash.rank_owns(7, owner).unwrap());
        assert!(!hash.rank_owns(7, 1 - owner).unwrap());
    }
}
