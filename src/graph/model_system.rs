//! The model system: an arena of boundaries rooted at the global boundary.
//!
//! Nodes and links are owned by the boundary they live in. Everything else
//! refers to them by handle, resolved through this arena.

use crate::core::error::{BoundaryId, GraphError, GraphResult, LinkId, ModelSystemId, NodeId};
use crate::core::hook::Hook;
use crate::graph::boundary::Boundary;
use crate::graph::link::Link;
use crate::graph::structure::StructureNode;
use indexmap::IndexMap;

/// Name of the root boundary of every model system.
pub const GLOBAL_BOUNDARY: &str = "global";

/// A model system's boundary tree.
#[derive(Debug, Clone)]
pub struct ModelSystem {
    id: ModelSystemId,
    global: BoundaryId,
    boundaries: IndexMap<BoundaryId, Boundary>,
    next_boundary: u32,
    next_node: u32,
    next_link: u32,
}

impl ModelSystem {
    /// Create an empty model system with a fresh identifier.
    pub fn new() -> Self {
        Self::with_id(ModelSystemId::new())
    }

    /// Create an empty model system with the given identifier.
    pub fn with_id(id: ModelSystemId) -> Self {
        let global = BoundaryId(0);
        let mut boundaries = IndexMap::new();
        boundaries.insert(global, Boundary::new(global, GLOBAL_BOUNDARY, None));
        Self {
            id,
            global,
            boundaries,
            next_boundary: 1,
            next_node: 0,
            next_link: 0,
        }
    }

    pub fn id(&self) -> ModelSystemId {
        self.id
    }

    /// Handle of the global boundary.
    pub fn global_boundary(&self) -> BoundaryId {
        self.global
    }

    /// The global boundary itself.
    pub fn global(&self) -> &Boundary {
        &self.boundaries[&self.global]
    }

    /// Check whether the tree holds no nodes, links or nested boundaries.
    pub fn is_empty(&self) -> bool {
        self.global().is_empty()
    }

    // ========================================================================
    // Boundaries
    // ========================================================================

    pub fn boundary(&self, id: BoundaryId) -> GraphResult<&Boundary> {
        self.boundaries.get(&id).ok_or(GraphError::BoundaryNotFound(id))
    }

    pub fn contains_boundary(&self, id: BoundaryId) -> bool {
        self.boundaries.contains_key(&id)
    }

    /// Boundary handles in pre-order, starting at the global boundary.
    pub fn boundary_ids(&self) -> Vec<BoundaryId> {
        self.subtree(self.global)
    }

    /// Boundaries in pre-order, starting at the global boundary.
    pub fn boundaries(&self) -> Vec<&Boundary> {
        self.boundary_ids()
            .into_iter()
            .filter_map(|id| self.boundaries.get(&id))
            .collect()
    }

    /// Handles of a boundary and all its descendants, in pre-order.
    pub fn subtree(&self, root: BoundaryId) -> Vec<BoundaryId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(boundary) = self.boundaries.get(&id) else {
                continue;
            };
            order.push(id);
            stack.extend(boundary.children().iter().rev().copied());
        }
        order
    }

    /// Dotted path of a boundary from the global boundary, e.g. `global.Zones`.
    pub fn full_path(&self, id: BoundaryId) -> GraphResult<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(boundary_id) = current {
            let boundary = self.boundary(boundary_id)?;
            names.push(boundary.name());
            current = boundary.parent();
        }
        names.reverse();
        Ok(names.join("."))
    }

    /// Find a direct child boundary by name.
    pub fn child_named(&self, parent: BoundaryId, name: &str) -> Option<&Boundary> {
        self.boundaries.get(&parent)?.children().iter().find_map(|child| {
            self.boundaries.get(child).filter(|b| b.name() == name)
        })
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    pub fn node(&self, id: NodeId) -> GraphResult<&StructureNode> {
        self.boundaries
            .values()
            .find_map(|b| b.node(id))
            .ok_or(GraphError::NodeNotFound(id))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.boundaries.values().any(|b| b.contains_node(id))
    }

    /// Boundary that owns a node.
    pub fn node_boundary(&self, id: NodeId) -> GraphResult<BoundaryId> {
        self.boundaries
            .values()
            .find(|b| b.contains_node(id))
            .map(Boundary::id)
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// All nodes, boundary by boundary in pre-order.
    pub fn nodes(&self) -> Vec<&StructureNode> {
        self.boundaries().into_iter().flat_map(Boundary::nodes).collect()
    }

    pub fn node_count(&self) -> usize {
        self.boundaries.values().map(Boundary::node_count).sum()
    }

    /// First node with the given name, in pre-order.
    pub fn find_node(&self, name: &str) -> Option<&StructureNode> {
        self.nodes().into_iter().find(|n| n.name() == name)
    }

    // ========================================================================
    // Links
    // ========================================================================

    pub fn link(&self, id: LinkId) -> GraphResult<&Link> {
        self.boundaries
            .values()
            .find_map(|b| b.link(id))
            .ok_or(GraphError::LinkNotFound(id))
    }

    /// Boundary that owns a link.
    pub fn link_boundary(&self, id: LinkId) -> GraphResult<BoundaryId> {
        self.boundaries
            .values()
            .find(|b| b.link(id).is_some())
            .map(Boundary::id)
            .ok_or(GraphError::LinkNotFound(id))
    }

    /// All links, boundary by boundary in pre-order.
    pub fn links(&self) -> Vec<&Link> {
        self.boundaries().into_iter().flat_map(Boundary::links).collect()
    }

    pub fn link_count(&self) -> usize {
        self.boundaries.values().map(Boundary::link_count).sum()
    }

    /// Links leaving a node through the given hook.
    pub fn links_from(&self, node_id: NodeId, hook: &str) -> Vec<&Link> {
        self.boundaries
            .values()
            .flat_map(Boundary::links)
            .filter(|l| l.origin.node_id == node_id && l.origin.hook_name == hook)
            .collect()
    }

    /// Links starting or ending at a node.
    pub fn links_touching(&self, node_id: NodeId) -> Vec<&Link> {
        self.boundaries
            .values()
            .flat_map(Boundary::links)
            .filter(|l| l.touches(node_id))
            .collect()
    }

    /// Links ending at a node.
    pub fn links_into(&self, node_id: NodeId) -> Vec<&Link> {
        self.boundaries
            .values()
            .flat_map(Boundary::links)
            .filter(|l| l.destination == node_id)
            .collect()
    }

    /// Check that a link from `origin.hook` to `destination` may be added.
    ///
    /// Returns the boundary that would own the link.
    pub fn check_link(&self, origin: NodeId, hook: &str, destination: NodeId) -> GraphResult<BoundaryId> {
        let boundary = self.node_boundary(origin)?;
        let hook_decl = self.check_endpoints(origin, hook, destination)?;
        if hook_decl.is_single_valued() && !self.links_from(origin, hook).is_empty() {
            return Err(GraphError::DuplicateLink {
                node_id: origin,
                hook: hook.to_string(),
            });
        }
        Ok(boundary)
    }

    /// Check that a link already in the tree still type-checks and is the
    /// only occupant of a single-valued hook.
    pub fn check_existing_link(&self, link: &Link) -> GraphResult<()> {
        let origin = link.origin.node_id;
        let hook = &link.origin.hook_name;
        let hook_decl = self.check_endpoints(origin, hook, link.destination)?;
        if hook_decl.is_single_valued()
            && self
                .links_from(origin, hook)
                .iter()
                .any(|other| other.id != link.id)
        {
            return Err(GraphError::DuplicateLink {
                node_id: origin,
                hook: hook.clone(),
            });
        }
        Ok(())
    }

    fn check_endpoints(&self, origin: NodeId, hook: &str, destination: NodeId) -> GraphResult<&Hook> {
        let origin_node = self.node(origin)?;
        let destination_node = self.node(destination)?;
        let hook_decl = origin_node.hook(hook).ok_or_else(|| GraphError::HookNotFound {
            node_id: origin,
            hook: hook.to_string(),
        })?;

        if !destination_node.satisfies(hook_decl) {
            return Err(GraphError::TypeMismatch {
                hook: hook.to_string(),
                expected: hook_decl.constraint.clone(),
                found: destination_node
                    .type_name()
                    .map_or_else(|| "a Start node".to_string(), |t| format!("'{}'", t)),
            });
        }
        Ok(hook_decl)
    }

    // ========================================================================
    // Primitive mutations, used by commands and the document reader
    // ========================================================================

    pub(crate) fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub(crate) fn allocate_link_id(&mut self) -> LinkId {
        let id = LinkId(self.next_link);
        self.next_link += 1;
        id
    }

    pub(crate) fn allocate_boundary_id(&mut self) -> BoundaryId {
        let id = BoundaryId(self.next_boundary);
        self.next_boundary += 1;
        id
    }

    pub(crate) fn boundary_mut(&mut self, id: BoundaryId) -> GraphResult<&mut Boundary> {
        self.boundaries
            .get_mut(&id)
            .ok_or(GraphError::BoundaryNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut StructureNode> {
        self.boundaries
            .values_mut()
            .find_map(|b| b.node_mut(id))
            .ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn insert_node(&mut self, boundary: BoundaryId, position: usize, node: StructureNode) -> GraphResult<usize> {
        Ok(self.boundary_mut(boundary)?.insert_node(position, node))
    }

    /// Detach a node. Links touching it must already be gone.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> GraphResult<(BoundaryId, usize, StructureNode)> {
        let boundary = self.node_boundary(id)?;
        let (position, node) = self
            .boundary_mut(boundary)?
            .remove_node(id)
            .ok_or(GraphError::NodeNotFound(id))?;
        Ok((boundary, position, node))
    }

    pub(crate) fn insert_link(&mut self, boundary: BoundaryId, position: usize, link: Link) -> GraphResult<usize> {
        Ok(self.boundary_mut(boundary)?.insert_link(position, link))
    }

    pub(crate) fn remove_link(&mut self, id: LinkId) -> GraphResult<(BoundaryId, usize, Link)> {
        let boundary = self.link_boundary(id)?;
        let (position, link) = self
            .boundary_mut(boundary)?
            .remove_link(id)
            .ok_or(GraphError::LinkNotFound(id))?;
        Ok((boundary, position, link))
    }

    /// Attach a detached subtree (root first, pre-order) under its parent.
    pub(crate) fn attach_subtree(&mut self, position: usize, subtree: Vec<Boundary>) -> GraphResult<usize> {
        let Some(root) = subtree.first() else {
            return Err(GraphError::BoundaryNotFound(self.global));
        };
        let root_id = root.id();
        let parent = root.parent().ok_or(GraphError::GlobalBoundary)?;
        let position = self.boundary_mut(parent)?.insert_child(position, root_id);
        for boundary in subtree {
            self.boundaries.insert(boundary.id(), boundary);
        }
        Ok(position)
    }

    /// Detach a boundary and its descendants with their contents.
    ///
    /// Links from outside the subtree that point into it must already be gone.
    pub(crate) fn detach_subtree(&mut self, root: BoundaryId) -> GraphResult<(usize, Vec<Boundary>)> {
        if root == self.global {
            return Err(GraphError::GlobalBoundary);
        }
        let parent = self
            .boundary(root)?
            .parent()
            .ok_or(GraphError::GlobalBoundary)?;
        let position = self
            .boundary_mut(parent)?
            .remove_child(root)
            .ok_or(GraphError::BoundaryNotFound(root))?;
        let subtree = self
            .subtree(root)
            .into_iter()
            .filter_map(|id| self.boundaries.shift_remove(&id))
            .collect();
        Ok((position, subtree))
    }
}

impl Default for ModelSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ModelSystem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.global == other.global && self.boundaries == other.boundaries
    }
}
