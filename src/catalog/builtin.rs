//! Built-in module types.
//!
//! These cover the pieces every model system needs regardless of plugins:
//! parameter modules for the basic value types, and a couple of control
//! modules that Start nodes can drive.

use crate::catalog::registry::HookCatalog;
use crate::core::module::{ModuleDefinition, TypeDescriptor};
use crate::core::types::ValueType;
use log::warn;

/// Interface of modules that can be executed.
pub const ACTION_INTERFACE: &str = "IAction";

/// Name of the interface implemented by modules that produce a value.
pub fn function_interface(value_type: &ValueType) -> String {
    format!("IFunction<{}>", value_type)
}

/// Name of the built-in parameter module for a value type.
pub fn parameter_type_name(value_type: &ValueType) -> String {
    format!("modelgraph.BasicParameter<{}>", value_type)
}

/// Declare a parameter module holding a literal of the given type.
pub fn parameter_descriptor(value_type: ValueType) -> TypeDescriptor {
    TypeDescriptor::module(parameter_type_name(&value_type))
        .description(format!("A literal {} value", value_type))
        .implements(function_interface(&value_type))
        .parameter_type(value_type)
        .build()
}

/// Runs each linked action in order.
pub struct Execute;

impl Execute {
    pub const NAME: &'static str = "modelgraph.Execute";
}

impl ModuleDefinition for Execute {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::module(Self::NAME)
            .description("Runs each linked action in order")
            .implements(ACTION_INTERFACE)
            .sub_modules("ToExecute", ACTION_INTERFACE, false)
            .build()
    }
}

/// Evaluates a string function and discards the result.
pub struct IgnoreResult;

impl IgnoreResult {
    pub const NAME: &'static str = "modelgraph.IgnoreResult<String>";
}

impl ModuleDefinition for IgnoreResult {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::module(Self::NAME)
            .description("Evaluates a function and discards the result")
            .implements(ACTION_INTERFACE)
            .sub_module("ToGet", function_interface(&ValueType::String), true)
            .build()
    }
}

/// Declarations of every built-in module type.
pub fn descriptors() -> Vec<TypeDescriptor> {
    vec![
        parameter_descriptor(ValueType::Integer),
        parameter_descriptor(ValueType::Float),
        parameter_descriptor(ValueType::Boolean),
        parameter_descriptor(ValueType::String),
        Execute::descriptor(),
        IgnoreResult::descriptor(),
    ]
}

/// Register all built-in module types.
pub fn register_all(catalog: &HookCatalog) {
    for descriptor in descriptors() {
        if let Err(error) = catalog.register(&descriptor) {
            warn!("Built-in module type '{}' failed to register: {}", descriptor.name, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_register() {
        let catalog = HookCatalog::with_builtins();
        assert_eq!(catalog.len(), descriptors().len());
        assert!(catalog.contains("modelgraph.Execute"));
        assert!(catalog.contains("modelgraph.BasicParameter<Integer>"));
    }

    #[test]
    fn test_parameter_module_satisfies_function_interface() {
        let catalog = HookCatalog::with_builtins();
        let string_param = catalog.get("modelgraph.BasicParameter<String>").unwrap();
        let ignore = catalog.describe_module::<IgnoreResult>().unwrap();
        assert!(ignore.hook("ToGet").unwrap().accepts(&string_param));

        let int_param = catalog.get("modelgraph.BasicParameter<Integer>").unwrap();
        assert!(!ignore.hook("ToGet").unwrap().accepts(&int_param));
    }

    #[test]
    fn test_execute_hook_is_multi_valued() {
        let catalog = HookCatalog::with_builtins();
        let execute = catalog.describe_module::<Execute>().unwrap();
        assert!(!execute.hook("ToExecute").unwrap().is_single_valued());
    }
}
