use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("entities '{name}' has mismatched sizes: glb_idx={glb_idx}, rank={rank}, connectivity={connectivity}")]
    SizeMismatch { name: String, glb_idx: usize, rank: usize, connectivity: usize },
    #[error("no field named '{0}' in this dictionary")]
    NoSuchField(String),
    #[error("no space for entities '{0}' in this dictionary")]
    NoSuchSpace(String),
    #[error(transparent)]
    Table(#[from] pde_table::TableError),
}
