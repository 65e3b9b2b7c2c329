//! Identifiers and error types for modelgraph.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Carry a human-readable reason for every expected validation failure
//! - Name the entity that caused them (node, hook, boundary, record index)
//! - Separate data errors from contract violations by the calling code

use crate::core::types::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Handle of a structure node inside one model system.
///
/// Handles are allocated from a per-model-system counter and are never reused,
/// so a handle recorded by a command stays valid across undo and redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Handle of a link inside one model system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub u32);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// Handle of a boundary inside one model system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoundaryId(pub u32);

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Identifier of a model system, used by the ownership controller and stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSystemId(pub Uuid);

impl ModelSystemId {
    /// Create a new random model system ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a model system ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ModelSystemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModelSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Defects in a module type's capability declaration.
///
/// These are raised when a type is registered with the catalog. They describe
/// mistakes in the module's code, not problems with graph data.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityError {
    #[error("Type '{type_name}' does not implement the module interface")]
    NotAModule { type_name: String },

    #[error("Type '{type_name}': missing capability tag on module slot '{slot}'")]
    MissingTag { type_name: String, slot: String },

    #[error("Type '{type_name}': ambiguous capability tag on module slot '{slot}', only one is allowed")]
    AmbiguousTag { type_name: String, slot: String },

    #[error("Type '{type_name}': slot '{slot}' must be read/write")]
    NotReadWrite { type_name: String, slot: String },

    #[error("Type '{type_name}': slot '{slot}' is declared more than once")]
    DuplicateSlot { type_name: String, slot: String },

    #[error("A module type must have a non-empty name")]
    EmptyTypeName,
}

/// Errors related to graph structure and editing operations.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphError {
    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid module type: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Node {0} has no parameter type to assign a value to")]
    NotParameterizable(NodeId),

    #[error("Unable to parse '{value}' as {expected}: {reason}")]
    ParseError {
        value: String,
        expected: ValueType,
        reason: String,
    },

    #[error("Hook '{hook}' expects {expected}, but the destination is {found}")]
    TypeMismatch {
        hook: String,
        expected: String,
        found: String,
    },

    #[error("Hook '{hook}' on node {node_id} already has a link")]
    DuplicateLink { node_id: NodeId, hook: String },

    #[error("Hook '{hook}' not found on node {node_id}")]
    HookNotFound { node_id: NodeId, hook: String },

    #[error("A name cannot be blank or whitespace")]
    InvalidName,

    #[error("Coordinates ({x}, {y}) are not finite")]
    InvalidPosition { x: f64, y: f64 },

    #[error("A boundary named '{name}' already exists in {parent}")]
    DuplicateBoundary { parent: String, name: String },

    #[error("The global boundary cannot be removed")]
    GlobalBoundary,

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Link {0} not found")]
    LinkNotFound(LinkId),

    #[error("Boundary {0} not found")]
    BoundaryNotFound(BoundaryId),

    #[error("Cannot {0}: the model system no longer matches the recorded state")]
    OutOfDate(String),
}

impl GraphError {
    /// Check if this error means the caller used a handle that does not belong
    /// to the tree being edited (stale, or taken from another model system).
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            GraphError::NodeNotFound(_)
                | GraphError::LinkNotFound(_)
                | GraphError::BoundaryNotFound(_)
                | GraphError::Capability(_)
        )
    }

    /// Get list of affected node IDs.
    pub fn affected_nodes(&self) -> Vec<NodeId> {
        match self {
            GraphError::NotParameterizable(node_id)
            | GraphError::NodeNotFound(node_id)
            | GraphError::DuplicateLink { node_id, .. }
            | GraphError::HookNotFound { node_id, .. } => vec![*node_id],
            _ => vec![],
        }
    }
}

/// Errors raised while reading or writing a model system document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unsupported document version {found}, expected {expected}")]
    UnsupportedVersion { found: String, expected: String },

    #[error("Index {0} already exists")]
    DuplicateIndex(i64),

    #[error("Undefined name for a record in boundary {boundary}")]
    MissingName { boundary: String },

    #[error("Unable to read a valid index for {boundary}.{name}")]
    InvalidIndex { boundary: String, name: String },

    #[error("Invalid type for {boundary}.{name}: {reason}")]
    InvalidType {
        boundary: String,
        name: String,
        reason: String,
    },

    #[error("Type '{0}' is not registered with the catalog")]
    UnresolvedType(String),

    #[error("Position of {boundary}.{name} is not finite")]
    InvalidPosition { boundary: String, name: String },

    #[error("Unknown field '{field}' in {record} record")]
    UnknownField { record: String, field: String },

    #[error("Missing field '{field}' in {record} record")]
    MissingField { record: String, field: String },

    #[error("Link references index {0}, which does not exist")]
    UnresolvedReference(i64),

    #[error("Graph error while loading: {0}")]
    Graph(#[from] GraphError),
}

impl From<serde_json::Error> for CodecError {
    fn from(error: serde_json::Error) -> Self {
        CodecError::Malformed(error.to_string())
    }
}

/// Errors from the persistence collaborator.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("No document stored for model system {0}")]
    NotFound(ModelSystemId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session-level error returned by every editing operation.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("{0}")]
    Graph(#[from] GraphError),

    #[error("No command to undo")]
    NothingToUndo,

    #[error("No command to redo")]
    NothingToRedo,

    #[error("Model system {0} is currently being edited")]
    SessionBusy(ModelSystemId),

    #[error("The model system is not valid: {0}")]
    InvalidGraph(String),

    #[error("Document error: {0}")]
    Codec(#[from] CodecError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl EditError {
    /// Check if this is a normal outcome the user should just be told about
    /// (nothing to undo/redo, or the model system is busy).
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            EditError::NothingToUndo | EditError::NothingToRedo | EditError::SessionBusy(_)
        )
    }
}

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for session operations.
pub type EditResult<T> = Result<T, EditError>;

/// Result type alias for document operations.
pub type CodecResult<T> = Result<T, CodecError>;

// ============================================================================
// Validation Report
// ============================================================================

/// Errors found by the pre-save validation pipeline.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Node '{name}' ({node_id}) holds an invalid parameter: {reason}")]
    InvalidParameter {
        node_id: NodeId,
        name: String,
        reason: String,
    },

    #[error("Node '{name}' ({node_id}) uses type '{type_name}', which is not registered")]
    UnresolvedType {
        node_id: NodeId,
        name: String,
        type_name: String,
    },

    #[error("Node '{name}' ({node_id}) has hooks that no longer match type '{type_name}'")]
    StaleHooks {
        node_id: NodeId,
        name: String,
        type_name: String,
    },

    #[error("Link {link_id} is broken: {reason}")]
    BrokenLink { link_id: LinkId, reason: String },

    #[error("{0}")]
    Other(String),
}

impl ValidationError {
    /// Get list of affected node IDs.
    pub fn affected_nodes(&self) -> Vec<NodeId> {
        match self {
            ValidationError::InvalidParameter { node_id, .. }
            | ValidationError::UnresolvedType { node_id, .. }
            | ValidationError::StaleHooks { node_id, .. } => vec![*node_id],
            _ => vec![],
        }
    }
}

/// Non-fatal validation warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    /// Warning message.
    pub message: String,
    /// Node that triggered the warning, if applicable.
    pub node_id: Option<NodeId>,
}

/// Comprehensive validation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether validation passed without errors.
    pub success: bool,
    /// List of errors found.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Create a new empty report (success).
    pub fn new() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error to the report.
    pub fn add_error(&mut self, error: ValidationError) {
        self.success = false;
        self.errors.push(error);
    }

    /// Add a warning to the report.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Check if the model system can be saved.
    pub fn can_save(&self) -> bool {
        self.success
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.success {
            if self.warnings.is_empty() {
                "✓ Model system is valid".to_string()
            } else {
                format!("✓ Model system is valid with {} warning(s)", self.warnings.len())
            }
        } else {
            let details: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
            format!(
                "✗ Validation failed with {} error(s): {}",
                self.errors.len(),
                details.join("; ")
            )
        }
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(NodeId(3).to_string(), "n3");
        assert_eq!(LinkId(0).to_string(), "l0");
        assert_eq!(BoundaryId(12).to_string(), "b12");
    }

    #[test]
    fn test_contract_violation_classification() {
        assert!(GraphError::NodeNotFound(NodeId(1)).is_contract_violation());
        assert!(!GraphError::InvalidName.is_contract_violation());
        assert!(!GraphError::DuplicateLink {
            node_id: NodeId(1),
            hook: "ToExecute".to_string()
        }
        .is_contract_violation());
    }

    #[test]
    fn test_benign_edit_errors() {
        assert!(EditError::NothingToUndo.is_benign());
        assert!(EditError::SessionBusy(ModelSystemId::new()).is_benign());
        assert!(!EditError::Graph(GraphError::InvalidName).is_benign());
    }

    #[test]
    fn test_validation_report() {
        let mut report = ValidationReport::new();
        assert!(report.can_save());

        report.add_error(ValidationError::Other("broken".to_string()));
        assert!(!report.can_save());
        assert_eq!(report.errors.len(), 1);
        assert!(report.summary().contains("broken"));
    }
}
