use crate::error::ComponentError;
use serde_json::Value as Frame;

/// A named callable entry point. Generic over the context type it operates
/// on (e.g. a `PDE`, a `History`) so each owning crate can register signals
/// without pde-component depending on every domain type.
///
/// Signals communicate via the argument/return frame only; they must never
/// hand back a reference into the context's interior.
pub struct Signal<Ctx> {
    pub name: String,
    pub pretty_name: String,
    pub description: String,
    pub hidden: bool,
    handler: Box<dyn Fn(&mut Ctx, &Frame) -> Result<Frame, ComponentError>>,
}

impl<Ctx> Signal<Ctx> {
    pub fn call(&self, ctx: &mut Ctx, args: &Frame) -> Result<Frame, ComponentError> {
        (self.handler)(ctx, args)
    }
}

#[derive(Default)]
pub struct SignalRegistry<Ctx> {
    order: Vec<String>,
    entries: std::collections::HashMap<String, Signal<Ctx>>,
}

impl<Ctx> SignalRegistry<Ctx> {
    pub fn new() -> Self {
        Self { order: Vec::new(), entries: std::collections::HashMap::new() }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut Ctx, &Frame) -> Result<Frame, ComponentError> + 'static,
    ) -> &mut Signal<Ctx> {
        let name = name.into();
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(
            name.clone(),
            Signal {
                pretty_name: name.clone(),
                name: name.clone(),
                description: String::new(),
                hidden: false,
                handler: Box::new(handler),
            },
        );
        self.entries.get_mut(&name).unwrap()
    }

    /// Invokes a registered signal. Propagates the handler's error to the
    /// caller unchanged; the dispatcher never swallows it.
    pub fn call(&self, name: &str, ctx: &mut Ctx, args: &Frame) -> Result<Frame, ComponentError> {
        let signal = self.entries.get(name).ok_or_else(|| ComponentError::ValueNotFound(name.to_string()))?;
        signal.call(ctx, args)
    }

    /// Names exposed to a UI/scripting layer (hidden signals excluded).
    pub fn visible_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().filter(move |n| !self.entries[n.as_str()].hidden).map(|s| s.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }
}
