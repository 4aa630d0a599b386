use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("setup error: {0}")]
    Setup(String),
    #[error("unknown key: {0}")]
    InvalidKey(String),
    #[error("no value stored for key: {0}")]
    ValueNotFound(String),
    #[error("bad value for {name}: {reason}")]
    BadValue { name: String, reason: String },
    #[error("illegal call: {0}")]
    IllegalCall(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("parallel error: {0}")]
    Parallel(String),
    #[error("failed to converge after {iterations} iterations")]
    FailedToConverge { iterations: u64 },
    #[error(transparent)]
    Mesh(#[from] pde_mesh::MeshError),
    #[error(transparent)]
    History(#[from] pde_history::HistoryError),
}
