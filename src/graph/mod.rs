//! Graph module for model systems.
//!
//! A model system is a tree of boundaries. Each boundary holds structure nodes
//! (module instances and Start entry points) and the links leaving them.

pub mod boundary;
pub mod link;
pub mod model_system;
pub mod serialization;
pub mod structure;

// Re-export commonly used types
pub use boundary::Boundary;
pub use link::{Endpoint, Link};
pub use model_system::{ModelSystem, GLOBAL_BOUNDARY};
pub use serialization::{GraphCodec, ModelSystemDocument, FORMAT_VERSION};
pub use structure::{start_hook, NodeKind, StructureNode, START_HOOK};
