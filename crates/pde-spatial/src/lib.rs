mod bbox;
mod octree;
mod parallel;
mod stencil;

pub use bbox::BoundingBox;
pub use octree::{CellCounts, Octree};
pub use parallel::find_cell_ranks;
pub use stencil::StencilComputerOcttree;
