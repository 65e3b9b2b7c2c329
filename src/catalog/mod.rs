//! Catalog module.
//!
//! Contains the hook catalog and the built-in module types.

pub mod builtin;
pub mod registry;

pub use registry::{analyze, HookCatalog};
