use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error writing {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("XML manifest error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("writer was already closed")]
    AlreadyClosed,
}

impl From<std::io::Error> for PersistError {
    fn from(source: std::io::Error) -> Self {
        PersistError::Io { path: String::new(), source }
    }
}
