//! Core types for the modelgraph authoring engine.
//!
//! This module contains the foundational types shared by every component:
//! - Parameter value types and their parsing rules
//! - Hooks and module type declarations
//! - Identifiers and error types
//! - Engine configuration

pub mod config;
pub mod error;
pub mod hook;
pub mod module;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{CapabilityError, CodecError, EditError, GraphError, PersistenceError};
pub use hook::{Cardinality, Hook, HookKind};
pub use module::{ModuleDefinition, ModuleType, TypeDescriptor, MODULE_INTERFACE};
pub use types::{ParameterValue, Position, ValueType};
