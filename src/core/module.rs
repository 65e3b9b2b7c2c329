//! Module type declarations.
//!
//! A module type states its capabilities explicitly: the list of public slots
//! it declares, the type of each slot, and the capability tag on each slot.
//! The [`HookCatalog`](crate::catalog::HookCatalog) validates a declaration
//! once and caches the resulting [`ModuleType`].

use crate::core::hook::Hook;
use crate::core::types::ValueType;
use serde::{Deserialize, Serialize};

/// The interface every module type implements. Any module satisfies it.
pub const MODULE_INTERFACE: &str = "IModule";

/// Which group a slot was declared in. Fields come before properties in the
/// hook order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotGroup {
    Field,
    Property,
}

/// Declared value type of a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotType {
    /// A module-typed slot. Only these become hooks.
    Module {
        /// Type name a linked module must satisfy
        constraint: String,
        /// Whether the slot is a collection of modules
        multiple: bool,
    },
    /// Any other value; ignored by the catalog.
    Value { type_name: String },
}

/// Capability tag attached to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum CapabilityTag {
    /// The slot is fed by a parameter module. Always required.
    Parameter,
    /// The slot is a sub-module port.
    SubModule { required: bool },
}

/// One declared slot of a module type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDeclaration {
    pub name: String,
    pub group: SlotGroup,
    pub slot_type: SlotType,
    pub public: bool,
    pub readable: bool,
    pub writable: bool,
    pub tags: Vec<CapabilityTag>,
}

impl SlotDeclaration {
    /// Declare a public, read/write field.
    pub fn field(name: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            name: name.into(),
            group: SlotGroup::Field,
            slot_type,
            public: true,
            readable: true,
            writable: true,
            tags: Vec::new(),
        }
    }

    /// Declare a public, read/write property.
    pub fn property(name: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            group: SlotGroup::Property,
            ..Self::field(name, slot_type)
        }
    }

    /// Attach a capability tag.
    pub fn tagged(mut self, tag: CapabilityTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Make the slot readable only.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Make the slot writable only.
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Hide the slot from the catalog.
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    /// Check whether the slot's declared type is a module type.
    pub fn is_module_typed(&self) -> bool {
        matches!(self.slot_type, SlotType::Module { .. })
    }
}

/// Declaration of a type offered to the catalog.
///
/// Plugins hand the catalog one descriptor per exported type; descriptors of
/// types that are not modules are skipped by
/// [`register_if_capable`](crate::catalog::HookCatalog::register_if_capable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully-qualified type name
    pub name: String,
    /// Short description for listings
    pub description: String,
    /// Whether the type implements the module interface
    pub is_module: bool,
    /// Interfaces and base types this type can be assigned to
    pub implements: Vec<String>,
    /// Declared value type, for parameter modules
    pub parameter: Option<ValueType>,
    /// Declared slots, in declaration order
    pub slots: Vec<SlotDeclaration>,
}

impl TypeDescriptor {
    /// Start declaring a module type.
    pub fn module(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder::new(name, true)
    }

    /// Start declaring a type that does not implement the module interface.
    pub fn plain(name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder::new(name, false)
    }
}

/// Builder for TypeDescriptor.
pub struct TypeDescriptorBuilder {
    descriptor: TypeDescriptor,
}

impl TypeDescriptorBuilder {
    fn new(name: impl Into<String>, is_module: bool) -> Self {
        Self {
            descriptor: TypeDescriptor {
                name: name.into(),
                description: String::new(),
                is_module,
                implements: Vec::new(),
                parameter: None,
                slots: Vec::new(),
            },
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = description.into();
        self
    }

    /// Declare an interface this type can be assigned to.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.descriptor.implements.push(interface.into());
        self
    }

    /// Declare the value type of a parameter module.
    pub fn parameter_type(mut self, value_type: ValueType) -> Self {
        self.descriptor.parameter = Some(value_type);
        self
    }

    /// Declare a single-valued sub-module field.
    pub fn sub_module(self, name: impl Into<String>, constraint: impl Into<String>, required: bool) -> Self {
        self.slot(
            SlotDeclaration::field(
                name,
                SlotType::Module {
                    constraint: constraint.into(),
                    multiple: false,
                },
            )
            .tagged(CapabilityTag::SubModule { required }),
        )
    }

    /// Declare a multi-valued sub-module field.
    pub fn sub_modules(self, name: impl Into<String>, constraint: impl Into<String>, required: bool) -> Self {
        self.slot(
            SlotDeclaration::field(
                name,
                SlotType::Module {
                    constraint: constraint.into(),
                    multiple: true,
                },
            )
            .tagged(CapabilityTag::SubModule { required }),
        )
    }

    /// Declare a parameter field.
    pub fn parameter(self, name: impl Into<String>, constraint: impl Into<String>) -> Self {
        self.slot(
            SlotDeclaration::field(
                name,
                SlotType::Module {
                    constraint: constraint.into(),
                    multiple: false,
                },
            )
            .tagged(CapabilityTag::Parameter),
        )
    }

    /// Declare an arbitrary slot.
    pub fn slot(mut self, slot: SlotDeclaration) -> Self {
        self.descriptor.slots.push(slot);
        self
    }

    /// Build the descriptor.
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

/// Implemented by Rust types that are module types.
pub trait ModuleDefinition {
    /// Declare the module's type and capabilities.
    fn descriptor() -> TypeDescriptor;
}

/// A validated module type with its cached, ordered hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleType {
    /// Fully-qualified type name
    pub name: String,
    /// Short description for listings
    pub description: String,
    /// Interfaces and base types this type can be assigned to
    pub implements: Vec<String>,
    /// Declared value type, for parameter modules
    pub parameter: Option<ValueType>,
    /// Hooks in hook-index order
    pub hooks: Vec<Hook>,
}

impl ModuleType {
    /// Check whether this type can be assigned to the given type name.
    pub fn satisfies(&self, constraint: &str) -> bool {
        constraint == MODULE_INTERFACE
            || self.name == constraint
            || self.implements.iter().any(|i| i == constraint)
    }

    /// Find a hook by name.
    pub fn hook(&self, name: &str) -> Option<&Hook> {
        self.hooks.iter().find(|h| h.name == name)
    }

    /// Get all hook names.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_declaration_order() {
        let descriptor = TypeDescriptor::module("Tests.Pipeline")
            .implements("IAction")
            .sub_module("First", "IAction", true)
            .parameter("Count", "IFunction<Integer>")
            .build();

        assert!(descriptor.is_module);
        let names: Vec<_> = descriptor.slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Count"]);
    }

    #[test]
    fn test_satisfies() {
        let module = ModuleType {
            name: "Tests.Work".to_string(),
            description: String::new(),
            implements: vec!["IAction".to_string()],
            parameter: None,
            hooks: Vec::new(),
        };
        assert!(module.satisfies("IAction"));
        assert!(module.satisfies("Tests.Work"));
        assert!(module.satisfies(MODULE_INTERFACE));
        assert!(!module.satisfies("IFunction<String>"));
    }
}
