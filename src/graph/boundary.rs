//! Boundaries: named scopes holding nodes, links and nested boundaries.

use crate::core::error::{BoundaryId, LinkId, NodeId};
use crate::graph::link::Link;
use crate::graph::structure::StructureNode;
use indexmap::IndexMap;

/// A named scope in a model system's boundary tree.
///
/// Nodes and links are stored in insertion order; that order is what the
/// document writer visits. Children are handles into the owning model
/// system's boundary arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    id: BoundaryId,
    name: String,
    description: Option<String>,
    parent: Option<BoundaryId>,
    children: Vec<BoundaryId>,
    nodes: IndexMap<NodeId, StructureNode>,
    links: IndexMap<LinkId, Link>,
}

impl Boundary {
    pub(crate) fn new(id: BoundaryId, name: impl Into<String>, parent: Option<BoundaryId>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            parent,
            children: Vec::new(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    pub fn id(&self) -> BoundaryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Parent boundary; `None` for the global boundary.
    pub fn parent(&self) -> Option<BoundaryId> {
        self.parent
    }

    /// Nested boundaries, in order.
    pub fn children(&self) -> &[BoundaryId] {
        &self.children
    }

    /// Nodes placed directly in this boundary, in order.
    pub fn nodes(&self) -> impl Iterator<Item = &StructureNode> {
        self.nodes.values()
    }

    /// Start nodes placed directly in this boundary.
    pub fn starts(&self) -> impl Iterator<Item = &StructureNode> {
        self.nodes.values().filter(|n| n.is_start())
    }

    /// Module nodes placed directly in this boundary.
    pub fn modules(&self) -> impl Iterator<Item = &StructureNode> {
        self.nodes.values().filter(|n| !n.is_start())
    }

    pub fn node(&self, id: NodeId) -> Option<&StructureNode> {
        self.nodes.get(&id)
    }

    /// Position of a node within this boundary.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Links whose origin lives in this boundary, in order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Position of a link within this boundary.
    pub fn link_index(&self, id: LinkId) -> Option<usize> {
        self.links.get_index_of(&id)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Check whether the boundary holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty() && self.children.is_empty()
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut StructureNode> {
        self.nodes.get_mut(&id)
    }

    /// Insert a node at a position (clamped to the end).
    pub(crate) fn insert_node(&mut self, position: usize, node: StructureNode) -> usize {
        let position = position.min(self.nodes.len());
        self.nodes.shift_insert(position, node.id(), node);
        position
    }

    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<(usize, StructureNode)> {
        self.nodes
            .shift_remove_full(&id)
            .map(|(position, _, node)| (position, node))
    }

    /// Insert a link at a position (clamped to the end).
    pub(crate) fn insert_link(&mut self, position: usize, link: Link) -> usize {
        let position = position.min(self.links.len());
        self.links.shift_insert(position, link.id, link);
        position
    }

    pub(crate) fn remove_link(&mut self, id: LinkId) -> Option<(usize, Link)> {
        self.links
            .shift_remove_full(&id)
            .map(|(position, _, link)| (position, link))
    }

    pub(crate) fn insert_child(&mut self, position: usize, child: BoundaryId) -> usize {
        let position = position.min(self.children.len());
        self.children.insert(position, child);
        position
    }

    pub(crate) fn remove_child(&mut self, child: BoundaryId) -> Option<usize> {
        let position = self.children.iter().position(|c| *c == child)?;
        self.children.remove(position);
        Some(position)
    }
}
