//! Reversible commands and command batches.
//!
//! Each command variant carries exactly the data needed to apply and reverse
//! it, captured when it was first built. Undo and redo replay the recorded
//! data; they never look at the catalog. A replay that no longer fits the
//! tree (a pending redo after an unrelated edit, for instance) fails and
//! leaves the tree untouched.

use crate::core::error::{BoundaryId, GraphError, GraphResult, LinkId, NodeId};
use crate::core::module::ModuleType;
use crate::core::types::Position;
use crate::editing::events::{ChangeEvent, NodeProperty};
use crate::graph::{Boundary, Link, ModelSystem, StructureNode};
use log::warn;
use std::collections::HashSet;
use std::sync::Arc;

/// A link taken out of the tree, with the place it was taken from.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedLink {
    pub boundary: BoundaryId,
    pub position: usize,
    pub link: Link,
}

/// Plan the removal of a set of links.
///
/// Links are ordered so that removing them front to back and reinserting them
/// back to front puts every link at its original position.
pub(crate) fn detach_plan(
    model_system: &ModelSystem,
    ids: impl IntoIterator<Item = LinkId>,
) -> GraphResult<Vec<DetachedLink>> {
    let mut seen = HashSet::new();
    let mut plan = Vec::new();
    for id in ids {
        if !seen.insert(id) {
            continue;
        }
        let boundary = model_system.link_boundary(id)?;
        let position = model_system
            .boundary(boundary)?
            .link_index(id)
            .ok_or(GraphError::LinkNotFound(id))?;
        plan.push(DetachedLink {
            boundary,
            position,
            link: model_system.link(id)?.clone(),
        });
    }
    plan.sort_by(|a, b| {
        a.boundary
            .cmp(&b.boundary)
            .then_with(|| b.position.cmp(&a.position))
    });
    Ok(plan)
}

/// A plain node attribute with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAttribute {
    Name(String),
    Description(Option<String>),
    Location(Position),
    Disabled(bool),
    Parameter(Option<String>),
}

impl NodeAttribute {
    /// Read the current value of the same attribute from a node.
    pub fn current(&self, node: &StructureNode) -> Self {
        match self {
            NodeAttribute::Name(_) => NodeAttribute::Name(node.name().to_string()),
            NodeAttribute::Description(_) => {
                NodeAttribute::Description(node.description().map(str::to_string))
            }
            NodeAttribute::Location(_) => NodeAttribute::Location(node.position()),
            NodeAttribute::Disabled(_) => NodeAttribute::Disabled(node.is_disabled()),
            NodeAttribute::Parameter(_) => {
                NodeAttribute::Parameter(node.parameter().map(str::to_string))
            }
        }
    }

    pub fn property(&self) -> NodeProperty {
        match self {
            NodeAttribute::Name(_) => NodeProperty::Name,
            NodeAttribute::Description(_) => NodeProperty::Description,
            NodeAttribute::Location(_) => NodeProperty::Location,
            NodeAttribute::Disabled(_) => NodeProperty::Disabled,
            NodeAttribute::Parameter(_) => NodeProperty::Parameter,
        }
    }

    fn write(&self, node: &mut StructureNode) {
        match self {
            NodeAttribute::Name(name) => node.set_name(name.clone()),
            NodeAttribute::Description(description) => node.set_description(description.clone()),
            NodeAttribute::Location(position) => node.set_position(*position),
            NodeAttribute::Disabled(disabled) => node.set_disabled(*disabled),
            NodeAttribute::Parameter(parameter) => node.set_parameter(parameter.clone()),
        }
    }
}

/// One reversible graph mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode {
        boundary: BoundaryId,
        position: usize,
        node: StructureNode,
    },
    /// Removes a node and every link touching it.
    RemoveNode {
        boundary: BoundaryId,
        position: usize,
        node: StructureNode,
        links: Vec<DetachedLink>,
    },
    SetAttribute {
        node: NodeId,
        previous: NodeAttribute,
        next: NodeAttribute,
    },
    /// Retypes a node, severing links the new type no longer allows.
    SetType {
        node: NodeId,
        previous: Arc<ModuleType>,
        next: Arc<ModuleType>,
        severed: Vec<DetachedLink>,
        cleared_parameter: Option<String>,
    },
    AddLink {
        boundary: BoundaryId,
        position: usize,
        link: Link,
    },
    RemoveLink {
        detached: DetachedLink,
    },
    AddBoundary {
        position: usize,
        boundary: Boundary,
    },
    /// Removes a nested boundary with everything in it, plus links from
    /// outside that point into it.
    RemoveBoundary {
        position: usize,
        subtree: Vec<Boundary>,
        links: Vec<DetachedLink>,
    },
}

impl Command {
    /// Short name for log messages.
    pub fn label(&self) -> &'static str {
        match self {
            Command::AddNode { .. } => "add node",
            Command::RemoveNode { .. } => "remove node",
            Command::SetAttribute { .. } => "set attribute",
            Command::SetType { .. } => "set type",
            Command::AddLink { .. } => "add link",
            Command::RemoveLink { .. } => "remove link",
            Command::AddBoundary { .. } => "add boundary",
            Command::RemoveBoundary { .. } => "remove boundary",
        }
    }

    /// Perform the command.
    pub fn apply(&self, model_system: &mut ModelSystem) -> GraphResult<Vec<ChangeEvent>> {
        match self {
            Command::AddNode {
                boundary,
                position,
                node,
            } => insert_node(model_system, *boundary, *position, node),
            Command::RemoveNode {
                boundary,
                node,
                links,
                ..
            } => {
                if model_system.node(node.id())? != node {
                    return Err(out_of_date(self));
                }
                ensure_attached(model_system, links)?;
                ensure_only_links(model_system, node.id(), links, self)?;
                let mut events = detach_links(model_system, links)?;
                model_system.remove_node(node.id())?;
                events.push(ChangeEvent::NodeRemoved {
                    boundary: *boundary,
                    node: node.id(),
                });
                Ok(events)
            }
            Command::SetAttribute { node, next, .. } => write_attribute(model_system, *node, next),
            Command::SetType {
                node,
                previous,
                next,
                severed,
                cleared_parameter,
            } => {
                model_system.node(*node)?;
                ensure_attached(model_system, severed)?;
                let mut events = detach_links(model_system, severed)?;
                let target = model_system.node_mut(*node)?;
                target.set_module_type(Arc::clone(next));
                if cleared_parameter.is_some() {
                    target.set_parameter(None);
                }
                if let Err(error) = ensure_links_hold(model_system, *node) {
                    let target = model_system.node_mut(*node)?;
                    target.set_module_type(Arc::clone(previous));
                    if cleared_parameter.is_some() {
                        target.set_parameter(cleared_parameter.clone());
                    }
                    restore_links(model_system, severed)?;
                    return Err(error);
                }
                if cleared_parameter.is_some() {
                    events.push(changed(*node, NodeProperty::Parameter));
                }
                events.push(changed(*node, NodeProperty::Type));
                Ok(events)
            }
            Command::AddLink {
                boundary,
                position,
                link,
            } => {
                relink(model_system, *boundary, *position, link)?;
                Ok(vec![ChangeEvent::LinkAdded { link: link.id }])
            }
            Command::RemoveLink { detached } => {
                model_system.link(detached.link.id)?;
                detach_links(model_system, std::slice::from_ref(detached))
            }
            Command::AddBoundary { position, boundary } => {
                attach(model_system, *position, vec![boundary.clone()])
            }
            Command::RemoveBoundary {
                subtree, links, ..
            } => {
                let root = subtree_root(subtree)?;
                ensure_same_subtree(model_system, subtree, self)?;
                ensure_attached(model_system, links)?;
                ensure_incoming(model_system, subtree, links, self)?;
                let mut events = detach_links(model_system, links)?;
                events.extend(detach(model_system, root)?);
                Ok(events)
            }
        }
    }

    /// Undo the command. Must only be called on the state `apply` left behind.
    pub fn reverse(&self, model_system: &mut ModelSystem) -> GraphResult<Vec<ChangeEvent>> {
        match self {
            Command::AddNode { boundary, node, .. } => {
                model_system.remove_node(node.id())?;
                Ok(vec![ChangeEvent::NodeRemoved {
                    boundary: *boundary,
                    node: node.id(),
                }])
            }
            Command::RemoveNode {
                boundary,
                position,
                node,
                links,
            } => {
                ensure_restorable(model_system, links)?;
                let mut events = insert_node(model_system, *boundary, *position, node)?;
                match restore_links(model_system, links) {
                    Ok(restored) => events.extend(restored),
                    Err(error) => {
                        model_system.remove_node(node.id())?;
                        return Err(error);
                    }
                }
                Ok(events)
            }
            Command::SetAttribute { node, previous, .. } => {
                write_attribute(model_system, *node, previous)
            }
            Command::SetType {
                node,
                previous,
                next,
                severed,
                cleared_parameter,
            } => {
                ensure_restorable(model_system, severed)?;
                let target = model_system.node_mut(*node)?;
                target.set_module_type(Arc::clone(previous));
                let mut events = vec![changed(*node, NodeProperty::Type)];
                if cleared_parameter.is_some() {
                    target.set_parameter(cleared_parameter.clone());
                    events.push(changed(*node, NodeProperty::Parameter));
                }
                match restore_links(model_system, severed) {
                    Ok(restored) => events.extend(restored),
                    Err(error) => {
                        let target = model_system.node_mut(*node)?;
                        target.set_module_type(Arc::clone(next));
                        if cleared_parameter.is_some() {
                            target.set_parameter(None);
                        }
                        return Err(error);
                    }
                }
                Ok(events)
            }
            Command::AddLink { link, .. } => {
                model_system.remove_link(link.id)?;
                Ok(vec![ChangeEvent::LinkRemoved { link: link.id }])
            }
            Command::RemoveLink { detached } => {
                ensure_restorable(model_system, std::slice::from_ref(detached))?;
                restore_links(model_system, std::slice::from_ref(detached))
            }
            Command::AddBoundary { boundary, .. } => detach(model_system, boundary),
            Command::RemoveBoundary {
                position,
                subtree,
                links,
            } => {
                let root = subtree_root(subtree)?;
                let mut events = attach(model_system, *position, subtree.clone())?;
                match restore_links(model_system, links) {
                    Ok(restored) => events.extend(restored),
                    Err(error) => {
                        model_system.detach_subtree(root.id())?;
                        return Err(error);
                    }
                }
                Ok(events)
            }
        }
    }
}

fn changed(node: NodeId, property: NodeProperty) -> ChangeEvent {
    ChangeEvent::NodeChanged { node, property }
}

fn insert_node(
    model_system: &mut ModelSystem,
    boundary: BoundaryId,
    position: usize,
    node: &StructureNode,
) -> GraphResult<Vec<ChangeEvent>> {
    model_system.insert_node(boundary, position, node.clone())?;
    Ok(vec![ChangeEvent::NodeAdded {
        boundary,
        node: node.id(),
    }])
}

fn write_attribute(
    model_system: &mut ModelSystem,
    node: NodeId,
    attribute: &NodeAttribute,
) -> GraphResult<Vec<ChangeEvent>> {
    attribute.write(model_system.node_mut(node)?);
    Ok(vec![changed(node, attribute.property())])
}

fn subtree_root(subtree: &[Boundary]) -> GraphResult<&Boundary> {
    subtree
        .first()
        .ok_or_else(|| GraphError::InvalidType("empty boundary subtree".to_string()))
}

fn attach(
    model_system: &mut ModelSystem,
    position: usize,
    subtree: Vec<Boundary>,
) -> GraphResult<Vec<ChangeEvent>> {
    let root = subtree_root(&subtree)?;
    let boundary = root.id();
    let parent = root.parent().ok_or(GraphError::GlobalBoundary)?;
    if model_system.child_named(parent, root.name()).is_some() {
        return Err(GraphError::DuplicateBoundary {
            parent: model_system.full_path(parent)?,
            name: root.name().to_string(),
        });
    }
    model_system.attach_subtree(position, subtree)?;
    Ok(vec![ChangeEvent::BoundaryAdded { parent, boundary }])
}

fn detach(model_system: &mut ModelSystem, root: &Boundary) -> GraphResult<Vec<ChangeEvent>> {
    let parent = root.parent().ok_or(GraphError::GlobalBoundary)?;
    model_system.detach_subtree(root.id())?;
    Ok(vec![ChangeEvent::BoundaryRemoved {
        parent,
        boundary: root.id(),
    }])
}

/// Every link must still be in the tree.
fn ensure_attached(model_system: &ModelSystem, links: &[DetachedLink]) -> GraphResult<()> {
    for detached in links {
        model_system.link(detached.link.id)?;
    }
    Ok(())
}

/// Every link's owning boundary must exist.
fn ensure_restorable(model_system: &ModelSystem, links: &[DetachedLink]) -> GraphResult<()> {
    for detached in links {
        model_system.boundary(detached.boundary)?;
    }
    Ok(())
}

fn detach_links(model_system: &mut ModelSystem, links: &[DetachedLink]) -> GraphResult<Vec<ChangeEvent>> {
    let mut events = Vec::with_capacity(links.len());
    for detached in links {
        model_system.remove_link(detached.link.id)?;
        events.push(ChangeEvent::LinkRemoved {
            link: detached.link.id,
        });
    }
    Ok(events)
}

/// Put links back, each checked against the tree as it is now. Either all
/// of them are restored or none are.
fn restore_links(model_system: &mut ModelSystem, links: &[DetachedLink]) -> GraphResult<Vec<ChangeEvent>> {
    let mut restored = Vec::with_capacity(links.len());
    for detached in links.iter().rev() {
        if let Err(error) = relink(model_system, detached.boundary, detached.position, &detached.link) {
            for id in restored.iter().rev() {
                model_system.remove_link(*id)?;
            }
            return Err(error);
        }
        restored.push(detached.link.id);
    }
    Ok(restored
        .into_iter()
        .map(|link| ChangeEvent::LinkAdded { link })
        .collect())
}

/// Insert a recorded link if its endpoints, hook and constraint still hold
/// and a single-valued hook is still free.
fn relink(model_system: &mut ModelSystem, boundary: BoundaryId, position: usize, link: &Link) -> GraphResult<()> {
    let owner = model_system.check_link(link.origin.node_id, &link.origin.hook_name, link.destination)?;
    if owner != boundary {
        return Err(GraphError::BoundaryNotFound(boundary));
    }
    model_system.insert_link(boundary, position, link.clone())?;
    Ok(())
}

fn out_of_date(command: &Command) -> GraphError {
    GraphError::OutOfDate(command.label().to_string())
}

/// Every link touching a retyped node must still type-check.
fn ensure_links_hold(model_system: &ModelSystem, node: NodeId) -> GraphResult<()> {
    for link in model_system.links_touching(node) {
        model_system.check_existing_link(link)?;
    }
    Ok(())
}

/// The recorded links must be all of the links touching the node.
fn ensure_only_links(
    model_system: &ModelSystem,
    node: NodeId,
    links: &[DetachedLink],
    command: &Command,
) -> GraphResult<()> {
    let recorded: HashSet<LinkId> = links.iter().map(|d| d.link.id).collect();
    if model_system
        .links_touching(node)
        .iter()
        .any(|link| !recorded.contains(&link.id))
    {
        return Err(out_of_date(command));
    }
    Ok(())
}

/// The boundary subtree must hold exactly what was recorded.
fn ensure_same_subtree(model_system: &ModelSystem, subtree: &[Boundary], command: &Command) -> GraphResult<()> {
    let root = subtree_root(subtree)?;
    model_system.boundary(root.id())?;
    let current = model_system.subtree(root.id());
    if current.len() != subtree.len() {
        return Err(out_of_date(command));
    }
    for (id, recorded) in current.iter().zip(subtree) {
        if model_system.boundary(*id)? != recorded {
            return Err(out_of_date(command));
        }
    }
    Ok(())
}

/// The recorded links must be all of the links entering the subtree from
/// outside.
fn ensure_incoming(
    model_system: &ModelSystem,
    subtree: &[Boundary],
    links: &[DetachedLink],
    command: &Command,
) -> GraphResult<()> {
    let inside: HashSet<NodeId> = subtree
        .iter()
        .flat_map(|b| b.nodes().map(StructureNode::id))
        .collect();
    let recorded: HashSet<LinkId> = links.iter().map(|d| d.link.id).collect();
    let stray = model_system.links().into_iter().any(|link| {
        !inside.contains(&link.origin.node_id)
            && inside.contains(&link.destination)
            && !recorded.contains(&link.id)
    });
    if stray {
        return Err(out_of_date(command));
    }
    Ok(())
}

// ============================================================================
// Batches
// ============================================================================

/// An atomic group of commands; undo and redo move by whole batches.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBatch {
    commands: Vec<Command>,
}

impl CommandBatch {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Wrap a single command.
    pub fn single(command: Command) -> Self {
        Self {
            commands: vec![command],
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Apply every command in order. On failure the commands already applied
    /// are reversed, leaving the tree as it was.
    pub fn apply(&self, model_system: &mut ModelSystem) -> GraphResult<Vec<ChangeEvent>> {
        let mut events = Vec::new();
        for (done, command) in self.commands.iter().enumerate() {
            match command.apply(model_system) {
                Ok(applied) => events.extend(applied),
                Err(error) => {
                    rewind(model_system, &self.commands[..done]);
                    return Err(error);
                }
            }
        }
        Ok(events)
    }

    /// Reverse every command, last first. On failure the commands already
    /// reversed are applied again.
    pub fn reverse(&self, model_system: &mut ModelSystem) -> GraphResult<Vec<ChangeEvent>> {
        let mut events = Vec::new();
        for (done, command) in self.commands.iter().rev().enumerate() {
            match command.reverse(model_system) {
                Ok(reversed) => events.extend(reversed),
                Err(error) => {
                    replay(model_system, &self.commands[self.commands.len() - done..]);
                    return Err(error);
                }
            }
        }
        Ok(events)
    }
}

/// Reverse applied commands, last first.
pub(crate) fn rewind(model_system: &mut ModelSystem, applied: &[Command]) {
    for command in applied.iter().rev() {
        if let Err(error) = command.reverse(model_system) {
            warn!("Failed to roll back '{}': {}", command.label(), error);
        }
    }
}

fn replay(model_system: &mut ModelSystem, reversed: &[Command]) {
    for command in reversed {
        if let Err(error) = command.apply(model_system) {
            warn!("Failed to restore '{}': {}", command.label(), error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HookCatalog;
    use crate::graph::link::Endpoint;

    fn add_node(ms: &mut ModelSystem, node: StructureNode) -> Command {
        let command = Command::AddNode {
            boundary: ms.global_boundary(),
            position: usize::MAX,
            node,
        };
        command.apply(ms).unwrap();
        command
    }

    fn linked_pair(catalog: &HookCatalog) -> (ModelSystem, NodeId, NodeId, LinkId) {
        let mut ms = ModelSystem::new();
        let entry = ms.allocate_node_id();
        add_node(&mut ms, StructureNode::start(entry, "Entry", None, Position::default()));
        let work = ms.allocate_node_id();
        add_node(
            &mut ms,
            StructureNode::module(work, "Work", catalog.get("modelgraph.Execute").unwrap()),
        );
        let link_id = ms.allocate_link_id();
        Command::AddLink {
            boundary: ms.global_boundary(),
            position: 0,
            link: Link::new(link_id, Endpoint::new(entry, "ToExecute"), work),
        }
        .apply(&mut ms)
        .unwrap();
        (ms, entry, work, link_id)
    }

    #[test]
    fn test_add_node_reverse() {
        let mut ms = ModelSystem::new();
        let empty = ms.clone();
        let id = ms.allocate_node_id();
        let command = add_node(&mut ms, StructureNode::start(id, "Entry", None, Position::default()));
        assert_eq!(ms.node_count(), 1);

        let events = command.reverse(&mut ms).unwrap();
        assert_eq!(ms, empty);
        assert!(matches!(events[0], ChangeEvent::NodeRemoved { .. }));
    }

    #[test]
    fn test_remove_node_restores_links() {
        let catalog = HookCatalog::with_builtins();
        let (mut ms, _, work, link_id) = linked_pair(&catalog);
        let before = ms.clone();

        let boundary = ms.node_boundary(work).unwrap();
        let position = ms.boundary(boundary).unwrap().node_index(work).unwrap();
        let links = detach_plan(&ms, ms.links_touching(work).iter().map(|l| l.id)).unwrap();
        let command = Command::RemoveNode {
            boundary,
            position,
            node: ms.node(work).unwrap().clone(),
            links,
        };

        command.apply(&mut ms).unwrap();
        assert_eq!(ms.node_count(), 1);
        assert!(ms.link(link_id).is_err());

        command.reverse(&mut ms).unwrap();
        assert_eq!(ms, before);
    }

    #[test]
    fn test_detach_plan_restores_positions() {
        let catalog = HookCatalog::with_builtins();
        let execute = catalog.get("modelgraph.Execute").unwrap();
        let mut ms = ModelSystem::new();
        let group = ms.allocate_node_id();
        add_node(&mut ms, StructureNode::module(group, "Group", Arc::clone(&execute)));

        let mut link_ids = Vec::new();
        for name in ["A", "B", "C", "D"] {
            let id = ms.allocate_node_id();
            add_node(&mut ms, StructureNode::module(id, name, Arc::clone(&execute)));
            let link_id = ms.allocate_link_id();
            let global = ms.global_boundary();
            ms.insert_link(global, usize::MAX, Link::new(link_id, Endpoint::new(group, "ToExecute"), id))
                .unwrap();
            link_ids.push(link_id);
        }
        let before = ms.clone();

        let plan = detach_plan(&ms, [link_ids[0], link_ids[2], link_ids[3]]).unwrap();
        let positions: Vec<usize> = plan.iter().map(|d| d.position).collect();
        assert_eq!(positions, vec![3, 2, 0]);

        detach_links(&mut ms, &plan).unwrap();
        assert_eq!(ms.link_count(), 1);
        restore_links(&mut ms, &plan).unwrap();
        let order: Vec<LinkId> = ms.links().iter().map(|l| l.id).collect();
        assert_eq!(order, link_ids);
        assert_eq!(ms, before);
    }

    #[test]
    fn test_add_link_replay_requires_endpoints() {
        let catalog = HookCatalog::with_builtins();
        let (mut ms, entry, work, link_id) = linked_pair(&catalog);
        let command = Command::AddLink {
            boundary: ms.global_boundary(),
            position: 0,
            link: ms.link(link_id).unwrap().clone(),
        };
        command.reverse(&mut ms).unwrap();
        ms.remove_node(work).unwrap();
        let before = ms.clone();

        assert_eq!(command.apply(&mut ms), Err(GraphError::NodeNotFound(work)));
        assert_eq!(ms, before);
        assert!(ms.links_from(entry, "ToExecute").is_empty());
    }

    #[test]
    fn test_add_link_replay_respects_single_valued_hook() {
        let catalog = HookCatalog::with_builtins();
        let (mut ms, entry, _, link_id) = linked_pair(&catalog);
        let command = Command::AddLink {
            boundary: ms.global_boundary(),
            position: 0,
            link: ms.link(link_id).unwrap().clone(),
        };
        command.reverse(&mut ms).unwrap();

        let other = ms.allocate_node_id();
        add_node(
            &mut ms,
            StructureNode::module(other, "Other", catalog.get("modelgraph.Execute").unwrap()),
        );
        let taken = Link::new(ms.allocate_link_id(), Endpoint::new(entry, "ToExecute"), other);
        let global = ms.global_boundary();
        ms.insert_link(global, 0, taken).unwrap();

        assert!(matches!(
            command.apply(&mut ms),
            Err(GraphError::DuplicateLink { .. })
        ));
        assert_eq!(ms.link_count(), 1);
    }

    #[test]
    fn test_remove_node_undo_is_all_or_nothing() {
        let catalog = HookCatalog::with_builtins();
        let (mut ms, entry, work, _) = linked_pair(&catalog);
        let boundary = ms.node_boundary(work).unwrap();
        let position = ms.boundary(boundary).unwrap().node_index(work).unwrap();
        let links = detach_plan(&ms, ms.links_touching(work).iter().map(|l| l.id)).unwrap();
        let command = Command::RemoveNode {
            boundary,
            position,
            node: ms.node(work).unwrap().clone(),
            links,
        };
        command.apply(&mut ms).unwrap();

        // Another link now occupies the Start hook the removed node used.
        let other = ms.allocate_node_id();
        add_node(
            &mut ms,
            StructureNode::module(other, "Other", catalog.get("modelgraph.Execute").unwrap()),
        );
        let global = ms.global_boundary();
        let taken = Link::new(ms.allocate_link_id(), Endpoint::new(entry, "ToExecute"), other);
        ms.insert_link(global, 0, taken).unwrap();
        let before = ms.clone();

        assert!(command.reverse(&mut ms).is_err());
        assert_eq!(ms, before);
        assert!(!ms.contains_node(work));
    }

    #[test]
    fn test_remove_node_replay_refuses_new_links() {
        let catalog = HookCatalog::with_builtins();
        let (mut ms, _, work, _) = linked_pair(&catalog);
        let boundary = ms.node_boundary(work).unwrap();
        let position = ms.boundary(boundary).unwrap().node_index(work).unwrap();
        let links = detach_plan(&ms, ms.links_touching(work).iter().map(|l| l.id)).unwrap();
        let command = Command::RemoveNode {
            boundary,
            position,
            node: ms.node(work).unwrap().clone(),
            links,
        };
        command.apply(&mut ms).unwrap();
        command.reverse(&mut ms).unwrap();

        let child = ms.allocate_node_id();
        add_node(
            &mut ms,
            StructureNode::module(child, "Child", catalog.get("modelgraph.Execute").unwrap()),
        );
        let global = ms.global_boundary();
        let added = Link::new(ms.allocate_link_id(), Endpoint::new(work, "ToExecute"), child);
        ms.insert_link(global, usize::MAX, added).unwrap();
        let before = ms.clone();

        assert_eq!(
            command.apply(&mut ms),
            Err(GraphError::OutOfDate("remove node".to_string()))
        );
        assert_eq!(ms, before);
    }

    #[test]
    fn test_set_attribute_round_trip() {
        let mut ms = ModelSystem::new();
        let id = ms.allocate_node_id();
        add_node(&mut ms, StructureNode::start(id, "Entry", None, Position::default()));

        let next = NodeAttribute::Location(Position::new(5.0, 6.0));
        let command = Command::SetAttribute {
            node: id,
            previous: next.current(ms.node(id).unwrap()),
            next,
        };
        command.apply(&mut ms).unwrap();
        assert_eq!(ms.node(id).unwrap().position(), Position::new(5.0, 6.0));

        command.reverse(&mut ms).unwrap();
        assert_eq!(ms.node(id).unwrap().position(), Position::default());
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut ms = ModelSystem::new();
        let before = ms.clone();
        let id = ms.allocate_node_id();
        let batch = CommandBatch::new(vec![
            Command::AddNode {
                boundary: ms.global_boundary(),
                position: 0,
                node: StructureNode::start(id, "Entry", None, Position::default()),
            },
            Command::SetAttribute {
                node: NodeId(99),
                previous: NodeAttribute::Disabled(false),
                next: NodeAttribute::Disabled(true),
            },
        ]);

        assert_eq!(
            batch.apply(&mut ms),
            Err(GraphError::NodeNotFound(NodeId(99)))
        );
        assert_eq!(ms, before);
    }

    #[test]
    fn test_batch_reverse_order() {
        let mut ms = ModelSystem::new();
        let before = ms.clone();
        let id = ms.allocate_node_id();
        let batch = CommandBatch::new(vec![
            Command::AddNode {
                boundary: ms.global_boundary(),
                position: 0,
                node: StructureNode::start(id, "Entry", None, Position::default()),
            },
            Command::SetAttribute {
                node: id,
                previous: NodeAttribute::Name("Entry".to_string()),
                next: NodeAttribute::Name("Main".to_string()),
            },
        ]);

        batch.apply(&mut ms).unwrap();
        assert_eq!(ms.node(id).unwrap().name(), "Main");
        batch.reverse(&mut ms).unwrap();
        assert_eq!(ms, before);
    }
}
