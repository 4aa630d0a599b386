use crate::error::ComponentError;
use std::rc::Rc;

/// A typed configuration value: a closed set of scalar and array kinds
/// rather than a fully generic `Any`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Uint(u64),
    Real(f64),
    Str(String),
    UintVec(Vec<u64>),
    RealVec(Vec<f64>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Uint(_) => "uint",
            Value::Real(_) => "real",
            Value::Str(_) => "str",
            Value::UintVec(_) => "uint[]",
            Value::RealVec(_) => "real[]",
        }
    }
}

macro_rules! value_conversion {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
        impl TryFrom<&Value> for $ty {
            type Error = ComponentError;
            fn try_from(v: &Value) -> Result<Self, Self::Error> {
                match v {
                    Value::$variant(inner) => Ok(inner.clone()),
                    other => Err(ComponentError::CastError {
                        key: String::new(),
                        requested: $name,
                        actual: other.kind(),
                    }),
                }
            }
        }
    };
}

value_conversion!(bool, Bool, "bool");
value_conversion!(u64, Uint, "uint");
value_conversion!(f64, Real, "real");
value_conversion!(String, Str, "str");
value_conversion!(Vec<u64>, UintVec, "uint[]");
value_conversion!(Vec<f64>, RealVec, "real[]");

pub type Trigger = Rc<dyn Fn(&Value)>;

/// One named, typed, constrained configuration entry.
pub struct Option_ {
    pub name: String,
    pub pretty_name: String,
    pub description: String,
    value: Value,
    pub basic: bool,
    triggers: Vec<Trigger>,
}

impl Option_ {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        Self {
            pretty_name: name.clone(),
            name,
            description: String::new(),
            value: value.into(),
            basic: false,
            triggers: Vec::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn attach_trigger(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }
}

/// Ordered set of options belonging to a component. Insertion order is
/// preserved for stable iteration (scripting/UI listing).
#[derive(Default)]
pub struct OptionList {
    order: Vec<String>,
    entries: std::collections::HashMap<String, Option_>,
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Option_ {
        let name = name.into();
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name.clone(), Option_::new(name.clone(), value));
        self.entries.get_mut(&name).unwrap()
    }

    pub fn get(&self, name: &str) -> Result<&Option_, ComponentError> {
        self.entries.get(name).ok_or_else(|| ComponentError::InvalidKey(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Option_, ComponentError> {
        self.entries.get_mut(name).ok_or_else(|| ComponentError::InvalidKey(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Commits a new value (after the type conversion succeeds) and fires
    /// triggers in registration order, after the value has landed.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ComponentError> {
        let opt = self.get_mut(name)?;
        opt.value = value.into();
        // Clone handles out before invoking, so a trigger can re-borrow the
        // option list (e.g. to read the value it just set) without aliasing.
        let triggers = opt.triggers.clone();
        let snapshot = opt.value.clone();
        for trigger in &triggers {
            trigger(&snapshot);
        }
        Ok(())
    }

    pub fn value<T>(&self, name: &str) -> Result<T, ComponentError>
    where
        T: for<'a> TryFrom<&'a Value, Error = ComponentError>,
    {
        let opt = self.get(name)?;
        T::try_from(opt.value()).map_err(|e| match e {
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
