use crate::error::ComponentError;
use crate::options::OptionList;
use crate::properties::PropertyList;
use pde_handle::{Arena, Handle};
use std::collections::HashSet;

pub type ComponentId = Handle<Node>;

/// A named node in the single-rooted component tree.
pub struct Node {
    pub name: String,
    pub type_name: String,
    parent: Option<ComponentId>,
    children: Vec<ComponentId>,
    pub options: OptionList,
    pub properties: PropertyList,
    tags: HashSet<String>,
}

impl Node {
    fn new(name: impl Into<String>, type_name: impl Into<String>, parent: Option<ComponentId>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            parent,
            children: Vec::new(),
            options: OptionList::new(),
            properties: PropertyList::new(),
            tags: HashSet::new(),
        }
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }
}

/// Single-rooted tree of [`Node`]s. Each node exclusively owns its children;
/// cross-tree references use [`ComponentId`] (a [`Handle`]), never ownership.
pub struct ComponentTree {
    arena: Arena<Node>,
    root: ComponentId,
}

impl ComponentTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Node::new(root_name, "Root", None));
        Self { arena, root }
    }

    pub fn root(&self) -> ComponentId {
        self.root
    }

    pub fn node(&self, id: ComponentId) -> Result<&Node, ComponentError> {
        self.arena.get(id).ok_or(ComponentError::NullReference)
    }

    pub fn node_mut(&mut self, id: ComponentId) -> Result<&mut Node, ComponentError> {
        self.arena.get_mut(id).ok_or(ComponentError::NullReference)
    }

    /// Creates a new child of `parent`. Names are unique within one parent.
    pub fn create_component(
        &mut self,
        parent: ComponentId,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Result<ComponentId, ComponentError> {
        let name = name.into();
        {
            let parent_node = self.node(parent)?;
            if parent_node.children.iter().any(|&c| self.arena.get(c).unwrap().name == name) {
                return Err(ComponentError::DuplicateName(name));
            }
        }
        let child = self.arena.insert(Node::new(name, type_name, Some(parent)));
        self.node_mut(parent)?.children.push(child);
        tracing::trace!(name = %self.node(child)?.name, "created component");
        Ok(child)
    }

    pub fn destroy_component(&mut self, id: ComponentId) -> Result<(), ComponentError> {
        let children: Vec<ComponentId> = self.node(id)?.children().to_vec();
        for child in children {
            self.destroy_component(child)?;
        }
        if let Some(parent) = self.node(id)?.parent() {
            self.node_mut(parent)?.children.retain(|&c| c != id);
        }
        self.arena.remove(id);
        Ok(())
    }

    /// `/`-joined path from the root down to `id`.
    pub fn uri(&self, id: ComponentId) -> Result<String, ComponentError> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur)?;
            segments.push(node.name.clone());
            current = node.parent();
        }
        segments.reverse();
        Ok(format!("/{}", segments[1..].join("/")))
    }

    /// Resolves a URI relative to `base`. Absolute paths start with `/` and
    /// are resolved from the root; `..` walks up one level.
    pub fn access_component(&self, base: ComponentId, uri: &str) -> Result<ComponentId, ComponentError> {
        let (mut current, path) = if let Some(rest) = uri.strip_prefix('/') {
            (self.root, rest)
        } else {
            (base, uri)
        };
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." {
                current = self.node(current)?.parent().ok_or_else(|| ComponentError::BadUri(uri.to_string()))?;
                continue;
            }
            let node = self.node(current)?;
            let found = node
                .children()
                .iter()
                .find(|&&c| self.node(c).map(|n| n.name == segment).unwrap_or(false))
                .copied();
            current = found.ok_or_else(|| ComponentError::BadUri(uri.to_string()))?;
        }
        Ok(current)
    }
}

/// Maps a registered type string to a component initializer, implementing
/// `Create(name, type)`.
#[derive(Default)]
pub struct Factory {
    constructors: std::collections::HashMap<String, Box<dyn Fn(&mut Node)>>,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: impl Into<String>, init: impl Fn(&mut Node) + 'static) {
        self.constructors.insert(type_name.into(), Box::new(init));
    }

    pub fn create(
        &self,
        tree: &mut ComponentTree,
        parent: ComponentId,
        name: impl Into<String>,
        type_name: &str,
    ) -> Result<ComponentId, ComponentError> {
        let init = self
            .constructors
            .get(type_name)
            .ok_or_else(|| ComponentError::UnknownType(type_name.to_string()))?;
        let id = tree.create_component(parent, name, type_name)?;
        init(tree.node_mut(id)?);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_within_one_parent() {
        let mut tree = ComponentTree::new("root");
        let root = tree.root();
        tree.create_component(root, "mesh", "Mesh").unwrap();
        assert!(tree.create_component(root, "mesh", "Mesh").is_err());
    }

    #[test]
    fn uri_resolves_absolute_and_relative_paths() {
        let mut tree = ComponentTree::new("root");
        let root = tree.root();
        let a = tree.create_component(root, "a", "Group").unwrap();
        let b = tree.create_component(a, "b", "Group").unwrap();
        let c = tree.create_component(b, "c", "Leaf").unwrap();

        assert_eq!(tree.uri(c).unwrap(), "/a/b/c");
        assert_eq!(tree.access_component(root, "/a/b/c").unwrap(), c);
        assert_eq!(tree.access_component(c, "../..").unwrap(), a);
        assert_eq!(tree.access_component(c, "..").unwrap(), b);
    }

    #[test]
    fn destroying_a_component_expires_handles_to_it_and_its_children() {
        let mut tree = ComponentTree::new("root");
        let root = tree.root();
        let a = tree.create_component(root, "a", "Group").unwrap();
        let b = tree.create_component(a, "b", "Group").unwrap();

        tree.destroy_component(a).unwrap();
        assert!(tree.node(a).is_err());
        assert!(tree.node(b).is_err());
    }

    #[test]
    fn factory_creates_components_from_a_registered_type_string() {
        let mut tree = ComponentTree::new("root");
        let root = tree.root();
        let mut factory = Factory::new();
        factory.register("Mesh", |node: &mut Node| node.add_tag("mesh"));

        let id = factory.create(&mut tree, root, "mesh1", "Mesh").unwrap();
        assert!(tree.node(id).unwrap().has_tag("mesh"));
        assert!(factory.create(&mut tree, root, "mesh2", "Unknown").is_err());
    }
}
