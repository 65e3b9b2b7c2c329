//! # Modelgraph - Transactional Model System Authoring
//!
//! Modelgraph is the authoring engine behind a model-system editor. A model
//! system is a tree of named boundaries holding Start nodes and module nodes,
//! wired together by typed links from a node's hooks to other modules.
//!
//! ## Features
//!
//! - **Hook Catalog**: Module types declare their hooks once; declarations are
//!   validated and cached per type
//! - **Type-checked Links**: A link is only accepted if its destination satisfies
//!   the hook's interface constraint
//! - **Undo/Redo**: Every edit is a reversible command; batches undo as one step
//! - **Change Events**: Observers subscribe to a session and receive every change
//! - **Versioned Documents**: Model systems round-trip through a JSON document
//!   with a shared type table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modelgraph::prelude::*;
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(HookCatalog::with_builtins());
//! let controller = SessionController::new_shared();
//! let session = EditingSession::open(
//!     ModelSystem::new(),
//!     catalog,
//!     &controller,
//!     EngineConfig::default(),
//! )?;
//!
//! let global = session.global_boundary();
//! session.batch(|editor| {
//!     let entry = editor.add_start(global, "Entry", None, Position::default())?;
//!     let work = editor.add_registered_node(global, "Work", Execute::NAME)?;
//!     editor.add_link(entry, START_HOOK, work)
//! })?;
//!
//! let store = FileStore::new("model-systems");
//! session.save(&store)?;
//! # Ok::<(), modelgraph::core::error::EditError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Value types, hooks, module declarations, errors and configuration
//! - [`catalog`]: The hook catalog and the built-in module types
//! - [`graph`]: Model systems, boundaries, nodes, links and the document codec
//! - [`editing`]: Commands, history, sessions, events and persistence
//! - [`validation`]: Multi-stage checks run before saving

#![warn(clippy::all)]

pub mod catalog;
pub mod core;
pub mod editing;
pub mod graph;
pub mod validation;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use modelgraph::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::config::EngineConfig;
    pub use crate::core::hook::{Cardinality, Hook, HookKind};
    pub use crate::core::module::{ModuleDefinition, ModuleType, TypeDescriptor};
    pub use crate::core::types::{ParameterValue, Position, ValueType};

    // Errors
    pub use crate::core::error::{
        BoundaryId, CapabilityError, CodecError, EditError, GraphError, LinkId, ModelSystemId,
        NodeId, PersistenceError, ValidationError, ValidationReport, ValidationWarning,
    };

    // Catalog
    pub use crate::catalog::builtin::{Execute, IgnoreResult};
    pub use crate::catalog::HookCatalog;

    // Graph
    pub use crate::graph::{
        Boundary, Endpoint, GraphCodec, Link, ModelSystem, ModelSystemDocument, StructureNode,
        GLOBAL_BOUNDARY, START_HOOK,
    };

    // Editing
    pub use crate::editing::{
        ChangeEvent, Command, CommandBatch, CommandBuffer, EditingSession, Editor, FileStore,
        MemoryStore, NodeProperty, Persistence, SessionController,
    };

    // Validation
    pub use crate::validation::{ValidationPipeline, ValidationStage};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
