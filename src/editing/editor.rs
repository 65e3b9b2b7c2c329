//! Validated graph operations.
//!
//! An [`Editor`] is handed out by [`EditingSession::batch`] while the session
//! lock is held. Every operation validates its input, builds the command that
//! performs it, and applies it. The commands applied through one editor form
//! a single undoable batch.
//!
//! [`EditingSession::batch`]: crate::editing::EditingSession::batch

use crate::catalog::HookCatalog;
use crate::core::error::{BoundaryId, GraphError, GraphResult, LinkId, NodeId};
use crate::core::module::{ModuleType, TypeDescriptor};
use crate::core::types::Position;
use crate::editing::command::{detach_plan, rewind, Command, NodeAttribute};
use crate::editing::events::ChangeEvent;
use crate::graph::{Boundary, Endpoint, Link, ModelSystem, StructureNode};
use std::collections::HashSet;
use std::sync::Arc;

fn type_required() -> GraphError {
    GraphError::InvalidType("a module type is required".to_string())
}

fn valid_name(name: &str) -> GraphResult<String> {
    if name.trim().is_empty() {
        Err(GraphError::InvalidName)
    } else {
        Ok(name.to_string())
    }
}

fn valid_position(position: Position) -> GraphResult<Position> {
    if position.is_finite() {
        Ok(position)
    } else {
        Err(GraphError::InvalidPosition {
            x: position.x,
            y: position.y,
        })
    }
}

/// Mutation handle over one model system for the duration of a batch.
pub struct Editor<'a> {
    model_system: &'a mut ModelSystem,
    catalog: &'a HookCatalog,
    applied: Vec<Command>,
    events: Vec<ChangeEvent>,
}

impl<'a> Editor<'a> {
    pub(crate) fn new(model_system: &'a mut ModelSystem, catalog: &'a HookCatalog) -> Self {
        Self {
            model_system,
            catalog,
            applied: Vec::new(),
            events: Vec::new(),
        }
    }

    /// The tree as it stands, including edits made earlier in this batch.
    pub fn model_system(&self) -> &ModelSystem {
        &*self.model_system
    }

    pub fn catalog(&self) -> &HookCatalog {
        self.catalog
    }

    /// Commands applied so far.
    pub fn applied(&self) -> &[Command] {
        &self.applied
    }

    fn execute(&mut self, command: Command) -> GraphResult<()> {
        let events = command.apply(self.model_system)?;
        self.events.extend(events);
        self.applied.push(command);
        Ok(())
    }

    /// Keep everything applied; return the commands and their events.
    pub(crate) fn commit(self) -> (Vec<Command>, Vec<ChangeEvent>) {
        (self.applied, self.events)
    }

    /// Undo everything applied through this editor.
    pub(crate) fn rollback(self) {
        rewind(self.model_system, &self.applied);
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Place a Start node.
    pub fn add_start(
        &mut self,
        boundary: BoundaryId,
        name: &str,
        description: Option<&str>,
        position: Position,
    ) -> GraphResult<NodeId> {
        let name = valid_name(name)?;
        let position = valid_position(position)?;
        let index = self.model_system.boundary(boundary)?.node_count();
        let id = self.model_system.allocate_node_id();
        let node = StructureNode::start(id, name, description.map(str::to_string), position);
        self.execute(Command::AddNode {
            boundary,
            position: index,
            node,
        })?;
        Ok(id)
    }

    /// Place a module node. The type is validated and registered with the
    /// catalog on first use.
    pub fn add_node(
        &mut self,
        boundary: BoundaryId,
        name: &str,
        module_type: Option<&TypeDescriptor>,
    ) -> GraphResult<NodeId> {
        let descriptor = module_type.ok_or_else(type_required)?;
        let module_type = self.catalog.describe(descriptor)?;
        self.place_module(boundary, name, module_type)
    }

    /// Place a module node of a type already in the catalog.
    pub fn add_registered_node(&mut self, boundary: BoundaryId, name: &str, type_name: &str) -> GraphResult<NodeId> {
        let module_type = self.registered(type_name)?;
        self.place_module(boundary, name, module_type)
    }

    fn registered(&self, type_name: &str) -> GraphResult<Arc<ModuleType>> {
        self.catalog
            .get(type_name)
            .ok_or_else(|| GraphError::InvalidType(format!("'{}' is not registered", type_name)))
    }

    fn place_module(&mut self, boundary: BoundaryId, name: &str, module_type: Arc<ModuleType>) -> GraphResult<NodeId> {
        let name = valid_name(name)?;
        let index = self.model_system.boundary(boundary)?.node_count();
        let id = self.model_system.allocate_node_id();
        self.execute(Command::AddNode {
            boundary,
            position: index,
            node: StructureNode::module(id, name, module_type),
        })?;
        Ok(id)
    }

    /// Remove a node together with every link touching it.
    pub fn remove_node(&mut self, node: NodeId) -> GraphResult<()> {
        let boundary = self.model_system.node_boundary(node)?;
        let position = self
            .model_system
            .boundary(boundary)?
            .node_index(node)
            .ok_or(GraphError::NodeNotFound(node))?;
        let touching: Vec<LinkId> = self
            .model_system
            .links_touching(node)
            .iter()
            .map(|l| l.id)
            .collect();
        let links = detach_plan(self.model_system, touching)?;
        let removed = self.model_system.node(node)?.clone();
        self.execute(Command::RemoveNode {
            boundary,
            position,
            node: removed,
            links,
        })
    }

    /// Change a module node's type.
    ///
    /// Hooks are recomputed only if the type actually differs. Links that
    /// the new type no longer allows are severed, and a parameter literal the
    /// new type cannot hold is cleared.
    pub fn set_type(&mut self, node: NodeId, module_type: Option<&TypeDescriptor>) -> GraphResult<()> {
        let descriptor = module_type.ok_or_else(type_required)?;
        let next = self.catalog.describe(descriptor)?;
        self.retype(node, next)
    }

    /// Change a module node's type to one already in the catalog.
    pub fn set_registered_type(&mut self, node: NodeId, type_name: &str) -> GraphResult<()> {
        let next = self.registered(type_name)?;
        self.retype(node, next)
    }

    fn retype(&mut self, node: NodeId, next: Arc<ModuleType>) -> GraphResult<()> {
        let current = self.model_system.node(node)?;
        let previous = current
            .module_type()
            .cloned()
            .ok_or_else(|| GraphError::InvalidType("a Start node cannot be given a type".to_string()))?;
        if *previous == *next {
            return Ok(());
        }

        let cleared_parameter = current
            .parameter()
            .filter(|literal| {
                next.parameter
                    .as_ref()
                    .map_or(true, |value_type| !value_type.accepts(literal))
            })
            .map(str::to_string);

        let mut filled = HashSet::new();
        let mut severed = Vec::new();
        for link in self.model_system.links_touching(node) {
            let keep = if link.origin.node_id == node {
                match next.hook(&link.origin.hook_name) {
                    Some(hook) => {
                        let accepted = if link.destination == node {
                            hook.accepts(&next)
                        } else {
                            self.model_system
                                .node(link.destination)
                                .is_ok_and(|d| d.satisfies(hook))
                        };
                        accepted && (!hook.is_single_valued() || filled.insert(hook.name.clone()))
                    }
                    None => false,
                }
            } else {
                self.model_system
                    .node(link.origin.node_id)
                    .ok()
                    .and_then(|origin| origin.hook(&link.origin.hook_name))
                    .is_some_and(|hook| hook.accepts(&next))
            };
            if !keep {
                severed.push(link.id);
            }
        }
        let severed = detach_plan(self.model_system, severed)?;

        self.execute(Command::SetType {
            node,
            previous,
            next,
            severed,
            cleared_parameter,
        })
    }

    /// Assign a parameter literal, parsed against the node's declared
    /// parameter type. An empty literal clears the parameter.
    pub fn set_parameter_value(&mut self, node: NodeId, literal: &str) -> GraphResult<()> {
        let target = self.model_system.node(node)?;
        if target.parameter_type().is_none() {
            return Err(GraphError::NotParameterizable(node));
        }
        let next = if literal.is_empty() {
            None
        } else {
            target.check_parameter(literal)?;
            Some(literal.to_string())
        };
        self.set_attribute(node, NodeAttribute::Parameter(next))
    }

    pub fn rename(&mut self, node: NodeId, name: &str) -> GraphResult<()> {
        let name = valid_name(name)?;
        self.set_attribute(node, NodeAttribute::Name(name))
    }

    pub fn set_description(&mut self, node: NodeId, description: Option<&str>) -> GraphResult<()> {
        self.set_attribute(node, NodeAttribute::Description(description.map(str::to_string)))
    }

    pub fn set_disabled(&mut self, node: NodeId, disabled: bool) -> GraphResult<()> {
        self.set_attribute(node, NodeAttribute::Disabled(disabled))
    }

    /// Move a node. Placement is authoring metadata only, but it must be
    /// finite to be written to a document.
    pub fn move_node(&mut self, node: NodeId, x: f64, y: f64) -> GraphResult<()> {
        self.model_system.node(node)?;
        let position = valid_position(Position::new(x, y))?;
        self.set_attribute(node, NodeAttribute::Location(position))
    }

    fn set_attribute(&mut self, node: NodeId, next: NodeAttribute) -> GraphResult<()> {
        let previous = next.current(self.model_system.node(node)?);
        self.execute(Command::SetAttribute {
            node,
            previous,
            next,
        })
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Link a hook of `origin` to `destination`.
    pub fn add_link(&mut self, origin: NodeId, hook: &str, destination: NodeId) -> GraphResult<LinkId> {
        let boundary = self.model_system.check_link(origin, hook, destination)?;
        let position = self.model_system.boundary(boundary)?.link_count();
        let id = self.model_system.allocate_link_id();
        self.execute(Command::AddLink {
            boundary,
            position,
            link: Link::new(id, Endpoint::new(origin, hook), destination),
        })?;
        Ok(id)
    }

    pub fn remove_link(&mut self, link: LinkId) -> GraphResult<()> {
        let detached = detach_plan(self.model_system, [link])?
            .pop()
            .ok_or(GraphError::LinkNotFound(link))?;
        self.execute(Command::RemoveLink { detached })
    }

    // ========================================================================
    // Boundaries
    // ========================================================================

    /// Add a nested boundary. Sibling names must be unique.
    pub fn add_boundary(&mut self, parent: BoundaryId, name: &str) -> GraphResult<BoundaryId> {
        let name = valid_name(name)?;
        let position = self.model_system.boundary(parent)?.children().len();
        if self.model_system.child_named(parent, &name).is_some() {
            return Err(GraphError::DuplicateBoundary {
                parent: self.model_system.full_path(parent)?,
                name,
            });
        }
        let id = self.model_system.allocate_boundary_id();
        self.execute(Command::AddBoundary {
            position,
            boundary: Boundary::new(id, name, Some(parent)),
        })?;
        Ok(id)
    }

    /// Remove a nested boundary with everything inside it, plus the links
    /// from outside that point into it.
    pub fn remove_boundary(&mut self, boundary: BoundaryId) -> GraphResult<()> {
        if boundary == self.model_system.global_boundary() {
            return Err(GraphError::GlobalBoundary);
        }
        let parent = self
            .model_system
            .boundary(boundary)?
            .parent()
            .ok_or(GraphError::GlobalBoundary)?;
        let position = self
            .model_system
            .boundary(parent)?
            .children()
            .iter()
            .position(|child| *child == boundary)
            .ok_or(GraphError::BoundaryNotFound(boundary))?;

        let mut subtree = Vec::new();
        for id in self.model_system.subtree(boundary) {
            subtree.push(self.model_system.boundary(id)?.clone());
        }
        let inside: HashSet<NodeId> = subtree
            .iter()
            .flat_map(|b| b.nodes().map(StructureNode::id))
            .collect();
        let incoming: Vec<LinkId> = self
            .model_system
            .links()
            .iter()
            .filter(|l| !inside.contains(&l.origin.node_id) && inside.contains(&l.destination))
            .map(|l| l.id)
            .collect();
        let links = detach_plan(self.model_system, incoming)?;

        self.execute(Command::RemoveBoundary {
            position,
            subtree,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin::{parameter_descriptor, Execute, IgnoreResult};
    use crate::core::module::ModuleDefinition;
    use crate::core::types::ValueType;
    use crate::graph::START_HOOK;

    fn with_editor<T>(
        ms: &mut ModelSystem,
        catalog: &HookCatalog,
        f: impl FnOnce(&mut Editor<'_>) -> GraphResult<T>,
    ) -> GraphResult<T> {
        let mut editor = Editor::new(ms, catalog);
        match f(&mut editor) {
            Ok(value) => {
                editor.commit();
                Ok(value)
            }
            Err(error) => {
                editor.rollback();
                Err(error)
            }
        }
    }

    #[test]
    fn test_add_node_requires_type() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let result = with_editor(&mut ms, &catalog, |e| e.add_node(global, "X", None));

        assert_eq!(result, Err(type_required()));
        assert!(ms.is_empty());
    }

    #[test]
    fn test_blank_names_rejected() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let result = with_editor(&mut ms, &catalog, |e| {
            e.add_start(global, "  ", None, Position::default())
        });
        assert_eq!(result, Err(GraphError::InvalidName));

        let entry = with_editor(&mut ms, &catalog, |e| {
            e.add_start(global, "Entry", None, Position::default())
        })
        .unwrap();
        let result = with_editor(&mut ms, &catalog, |e| e.rename(entry, "\t"));
        assert_eq!(result, Err(GraphError::InvalidName));
        assert_eq!(ms.node(entry).unwrap().name(), "Entry");
    }

    #[test]
    fn test_duplicate_link_leaves_tree_unchanged() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let execute = Execute::descriptor();
        let (entry, first, second) = with_editor(&mut ms, &catalog, |e| {
            let entry = e.add_start(global, "Entry", None, Position::default())?;
            let first = e.add_node(global, "First", Some(&execute))?;
            let second = e.add_node(global, "Second", Some(&execute))?;
            e.add_link(entry, START_HOOK, first)?;
            Ok((entry, first, second))
        })
        .unwrap();
        let before = ms.clone();

        let result = with_editor(&mut ms, &catalog, |e| e.add_link(entry, START_HOOK, second));
        assert_eq!(
            result,
            Err(GraphError::DuplicateLink {
                node_id: entry,
                hook: START_HOOK.to_string()
            })
        );
        assert_eq!(ms, before);
        assert_eq!(ms.links_from(entry, START_HOOK)[0].destination, first);
    }

    #[test]
    fn test_failure_rolls_back_whole_batch() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let result = with_editor(&mut ms, &catalog, |e| {
            let entry = e.add_start(global, "Entry", None, Position::default())?;
            let other = e.add_start(global, "Other", None, Position::default())?;
            e.add_link(entry, START_HOOK, other)
        });

        assert!(matches!(result, Err(GraphError::TypeMismatch { .. })));
        assert!(ms.is_empty());
    }

    #[test]
    fn test_set_parameter_value() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let float = parameter_descriptor(ValueType::Float);
        let (count, entry) = with_editor(&mut ms, &catalog, |e| {
            let count = e.add_node(global, "Rate", Some(&float))?;
            let entry = e.add_start(global, "Entry", None, Position::default())?;
            e.set_parameter_value(count, "0.25")?;
            Ok((count, entry))
        })
        .unwrap();
        assert_eq!(ms.node(count).unwrap().parameter(), Some("0.25"));

        let result = with_editor(&mut ms, &catalog, |e| e.set_parameter_value(count, "fast"));
        assert!(matches!(result, Err(GraphError::ParseError { .. })));
        assert_eq!(ms.node(count).unwrap().parameter(), Some("0.25"));

        let result = with_editor(&mut ms, &catalog, |e| e.set_parameter_value(entry, "1"));
        assert_eq!(result, Err(GraphError::NotParameterizable(entry)));

        with_editor(&mut ms, &catalog, |e| e.set_parameter_value(count, "")).unwrap();
        assert_eq!(ms.node(count).unwrap().parameter(), None);
    }

    #[test]
    fn test_retype_severs_invalid_links() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let execute = Execute::descriptor();
        let ignore = IgnoreResult::descriptor();
        let text = parameter_descriptor(ValueType::String);
        let (entry, work, label) = with_editor(&mut ms, &catalog, |e| {
            let entry = e.add_start(global, "Entry", None, Position::default())?;
            let work = e.add_node(global, "Work", Some(&ignore))?;
            let label = e.add_node(global, "Label", Some(&text))?;
            e.add_link(entry, START_HOOK, work)?;
            e.add_link(work, "ToGet", label)?;
            Ok((entry, work, label))
        })
        .unwrap();
        let before = ms.clone();

        // Execute is still an action, but has no ToGet hook.
        let mut editor = Editor::new(&mut ms, &catalog);
        editor.set_type(work, Some(&execute)).unwrap();
        let (commands, events) = editor.commit();
        assert_eq!(ms.link_count(), 1);
        assert_eq!(ms.links_from(entry, START_HOOK).len(), 1);
        assert!(ms.links_into(label).is_empty());
        assert!(events.contains(&ChangeEvent::NodeChanged {
            node: work,
            property: crate::editing::events::NodeProperty::Type
        }));

        for command in commands.iter().rev() {
            command.reverse(&mut ms).unwrap();
        }
        assert_eq!(ms, before);
    }

    #[test]
    fn test_retype_same_type_is_noop() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let execute = Execute::descriptor();
        let work = with_editor(&mut ms, &catalog, |e| e.add_node(global, "Work", Some(&execute))).unwrap();

        let mut editor = Editor::new(&mut ms, &catalog);
        editor.set_type(work, Some(&execute)).unwrap();
        assert!(editor.applied().is_empty());
        assert_eq!(editor.set_type(work, None), Err(type_required()));
    }

    #[test]
    fn test_start_cannot_be_typed() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let result = with_editor(&mut ms, &catalog, |e| {
            let entry = e.add_start(global, "Entry", None, Position::default())?;
            e.set_registered_type(entry, "modelgraph.Execute")
        });
        assert!(matches!(result, Err(GraphError::InvalidType(_))));
    }

    #[test]
    fn test_remove_node_cascades_links() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let work = with_editor(&mut ms, &catalog, |e| {
            let entry = e.add_start(global, "Entry", None, Position::default())?;
            let work = e.add_registered_node(global, "Work", "modelgraph.Execute")?;
            let next = e.add_registered_node(global, "Next", "modelgraph.Execute")?;
            e.add_link(entry, START_HOOK, work)?;
            e.add_link(work, "ToExecute", next)?;
            Ok(work)
        })
        .unwrap();
        assert_eq!(ms.link_count(), 2);

        with_editor(&mut ms, &catalog, |e| e.remove_node(work)).unwrap();
        assert_eq!(ms.node_count(), 2);
        assert_eq!(ms.link_count(), 0);
    }

    #[test]
    fn test_boundaries() {
        let catalog = HookCatalog::with_builtins();
        let mut ms = ModelSystem::new();
        let global = ms.global_boundary();
        let (zone, entry) = with_editor(&mut ms, &catalog, |e| {
            let zone = e.add_boundary(global, "Zone")?;
            let entry = e.add_start(global, "Entry", None, Position::default())?;
            let work = e.add_registered_node(zone, "Work", "modelgraph.Execute")?;
            e.add_link(entry, START_HOOK, work)?;
            Ok((zone, entry))
        })
        .unwrap();
        assert_eq!(ms.full_path(zone).unwrap(), "global.Zone");

        let result = with_editor(&mut ms, &catalog, |e| e.add_boundary(global, "Zone"));
        assert!(matches!(result, Err(GraphError::DuplicateBoundary { .. })));

        let result = with_editor(&mut ms, &catalog, |e| e.remove_boundary(global));
        assert_eq!(result, Err(GraphError::GlobalBoundary));

        with_editor(&mut ms, &catalog, |e| e.remove_boundary(zone)).unwrap();
        assert!(!ms.contains_boundary(zone));
        assert!(ms.links_from(entry, START_HOOK).is_empty());
        assert_eq!(ms.node_count(), 1);
    }
}
