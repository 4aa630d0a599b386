use thiserror::Error;

/// Error kinds that apply to the component tree.
#[derive(Debug, Error, PartialEq)]
pub enum ComponentError {
    #[error("no option named '{0}'")]
    InvalidKey(String),
    #[error("no child or property named '{0}'")]
    ValueNotFound(String),
    #[error("option '{key}' holds a {actual} value, not {requested}")]
    CastError { key: String, requested: &'static str, actual: &'static str },
    #[error("could not resolve uri '{0}'")]
    BadUri(String),
    #[error("handle into the component tree has expired")]
    NullReference,
    #[error("a child named '{0}' already exists in this parent")]
    DuplicateName(String),
    #[error("no type '{0}' registered in the component factory")]
    UnknownType(String),
}
