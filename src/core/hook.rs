//! Hooks: the typed capability slots a module type exposes.
//!
//! A hook is either a parameter slot or a sub-module slot. Hooks are ordered
//! (declaration order is the stable hook index) but links address them by
//! name so documents survive reordering.

use crate::core::module::ModuleType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a hook.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Holds a literal value supplied by a parameter module. Always mandatory.
    Parameter,
    /// Accepts a link to another module.
    SubModule,
}

/// How many links a hook may hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one link.
    Single,
    /// Any number of links (collection-typed slot).
    Multiple,
}

/// One typed capability slot of a module type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hook {
    /// Name of the slot, unique within the module type
    pub name: String,
    /// Parameter or sub-module
    pub kind: HookKind,
    /// Whether a link is required before the model system can run
    pub required: bool,
    /// Type name the destination module must satisfy
    pub constraint: String,
    /// Single or multi-valued
    pub cardinality: Cardinality,
}

impl Hook {
    /// Create a sub-module hook.
    pub fn sub_module(name: impl Into<String>, constraint: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            kind: HookKind::SubModule,
            required,
            constraint: constraint.into(),
            cardinality: Cardinality::Single,
        }
    }

    /// Create a parameter hook. Parameters are always required.
    pub fn parameter(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: HookKind::Parameter,
            required: true,
            constraint: constraint.into(),
            cardinality: Cardinality::Single,
        }
    }

    /// Allow any number of links on this hook.
    pub fn multiple(mut self) -> Self {
        self.cardinality = Cardinality::Multiple;
        self
    }

    /// Check whether this hook holds at most one link.
    pub fn is_single_valued(&self) -> bool {
        self.cardinality == Cardinality::Single
    }

    /// Check whether a module of the given type may be linked to this hook.
    pub fn accepts(&self, module_type: &ModuleType) -> bool {
        module_type.satisfies(&self.constraint)
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let many = if self.is_single_valued() { "" } else { "[]" };
        let required = if self.required { "" } else { "?" };
        write!(f, "{}: {}{}{}", self.name, self.constraint, many, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_hooks_are_required() {
        let hook = Hook::parameter("Value", "IFunction<Integer>");
        assert!(hook.required);
        assert_eq!(hook.kind, HookKind::Parameter);
        assert!(hook.is_single_valued());
    }

    #[test]
    fn test_display() {
        let hook = Hook::sub_module("Children", "IAction", false).multiple();
        assert_eq!(hook.to_string(), "Children: IAction[]?");
    }
}
