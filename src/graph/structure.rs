//! Structure nodes: placed module instances and Start entry points.

use crate::catalog::builtin::ACTION_INTERFACE;
use crate::core::error::{GraphError, GraphResult, NodeId};
use crate::core::hook::Hook;
use crate::core::module::ModuleType;
use crate::core::types::{ParameterValue, Position, ValueType};
use std::sync::Arc;

/// Name of the single hook every Start node exposes.
pub const START_HOOK: &str = "ToExecute";

/// The implicit output hook of a Start node.
pub fn start_hook() -> Hook {
    Hook::sub_module(START_HOOK, ACTION_INTERFACE, true)
}

/// What a node is an instance of.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Untyped entry point with one implicit hook.
    Start { hook: Hook },
    /// Instance of a module type; hooks come from the type.
    Module(Arc<ModuleType>),
}

/// A node placed within a boundary.
///
/// The hook list is owned by the node's kind, so it can never disagree with
/// the node's current type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureNode {
    id: NodeId,
    name: String,
    description: Option<String>,
    position: Position,
    disabled: bool,
    parameter: Option<String>,
    kind: NodeKind,
}

impl StructureNode {
    /// Create a Start node.
    pub(crate) fn start(id: NodeId, name: impl Into<String>, description: Option<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            description,
            position,
            disabled: false,
            parameter: None,
            kind: NodeKind::Start { hook: start_hook() },
        }
    }

    /// Create a module node of the given type.
    pub(crate) fn module(id: NodeId, name: impl Into<String>, module_type: Arc<ModuleType>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            position: Position::default(),
            disabled: false,
            parameter: None,
            kind: NodeKind::Module(module_type),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// The stored parameter literal, if any.
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_start(&self) -> bool {
        matches!(self.kind, NodeKind::Start { .. })
    }

    /// The node's module type; `None` for Start nodes.
    pub fn module_type(&self) -> Option<&Arc<ModuleType>> {
        match &self.kind {
            NodeKind::Module(module_type) => Some(module_type),
            NodeKind::Start { .. } => None,
        }
    }

    /// Fully-qualified name of the node's type; `None` for Start nodes.
    pub fn type_name(&self) -> Option<&str> {
        self.module_type().map(|t| t.name.as_str())
    }

    /// Declared value type of the node's parameter, if it is a parameter module.
    pub fn parameter_type(&self) -> Option<&ValueType> {
        self.module_type().and_then(|t| t.parameter.as_ref())
    }

    /// Parse the stored literal against the declared parameter type.
    pub fn parameter_value(&self) -> Option<Result<ParameterValue, String>> {
        let literal = self.parameter.as_deref()?;
        let value_type = self.parameter_type()?;
        Some(value_type.parse(literal))
    }

    /// Check that a literal parses as this node's parameter type.
    pub fn check_parameter(&self, literal: &str) -> GraphResult<()> {
        let value_type = self
            .parameter_type()
            .ok_or(GraphError::NotParameterizable(self.id))?;
        value_type
            .parse(literal)
            .map(|_| ())
            .map_err(|reason| GraphError::ParseError {
                value: literal.to_string(),
                expected: value_type.clone(),
                reason,
            })
    }

    /// Ordered hooks exposed by this node.
    pub fn hooks(&self) -> &[Hook] {
        match &self.kind {
            NodeKind::Start { hook } => std::slice::from_ref(hook),
            NodeKind::Module(module_type) => &module_type.hooks,
        }
    }

    /// Find a hook by name.
    pub fn hook(&self, name: &str) -> Option<&Hook> {
        self.hooks().iter().find(|h| h.name == name)
    }

    /// Check whether this node can be the destination of the given hook.
    pub fn satisfies(&self, hook: &Hook) -> bool {
        self.module_type().is_some_and(|t| hook.accepts(t))
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub(crate) fn set_parameter(&mut self, parameter: Option<String>) {
        self.parameter = parameter.filter(|p| !p.is_empty());
    }

    /// Replace the module type. Start nodes keep their kind.
    pub(crate) fn set_module_type(&mut self, module_type: Arc<ModuleType>) {
        if let NodeKind::Module(current) = &mut self.kind {
            *current = module_type;
        }
    }
}
