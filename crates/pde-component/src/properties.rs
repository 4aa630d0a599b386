use crate::error::ComponentError;
use crate::options::Value;
use std::collections::HashMap;

/// Typed, runtime-computed values queryable by name (e.g. `cputime`).
/// Unlike options, properties have no triggers and are commonly overwritten
/// every iteration by the component itself.
#[derive(Default)]
pub struct PropertyList {
    entries: HashMap<String, Value>,
    order: Vec<String>,
}

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, value.into());
    }

    pub fn check(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn value<T>(&self, name: &str) -> Result<T, ComponentError>
    where
        T: for<'a> TryFrom<&'a Value, Error = ComponentError>,
    {
        let v = self.entries.get(name).ok_or_else(|| ComponentError::ValueNotFound(name.to_string()))?;
        T::try_from(v).map_err(|e| match e {
            ComponentError::CastError { requested, actual, .. } => {
                ComponentError::CastError { key: name.to_string(), requested, actual }
            }
            other => other,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }
}
