//! Validation module for pre-save checking.
//!
//! The validation pipeline runs before a model system is saved to catch
//! structural problems early.

pub mod pipeline;
pub mod stages;

pub use pipeline::ValidationPipeline;
pub use stages::{LinkIntegrity, ParameterValues, RequiredHooks, TypeResolution, ValidationStage};
