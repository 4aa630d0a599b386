mod driver;
mod hash;

pub use driver::{pivot_by_species, Adjacency, GraphPartitioner, ObjExport, PartitionerDriver, RoundRobinPartitioner};
pub use hash::{HashError, MixedHash};
