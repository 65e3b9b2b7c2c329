//! Individual validation stages.
//!
//! Each stage checks for a specific category of errors.

use crate::catalog::HookCatalog;
use crate::core::error::{ValidationError, ValidationWarning};
use crate::graph::ModelSystem;

/// Trait for validation stages.
pub trait ValidationStage: Send + Sync {
    /// Name of this validation stage.
    fn name(&self) -> &str;

    /// Validate the model system.
    ///
    /// Returns Ok with warnings, or Err with errors.
    fn validate(
        &self,
        model_system: &ModelSystem,
        catalog: &HookCatalog,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>>;
}

/// Type resolution - checks every module node against the catalog.
///
/// Verifies:
/// - Each node's type is still registered
/// - Each node's hooks match the registered declaration
pub struct TypeResolution;

impl ValidationStage for TypeResolution {
    fn name(&self) -> &str {
        "Type Resolution"
    }

    fn validate(
        &self,
        model_system: &ModelSystem,
        catalog: &HookCatalog,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let mut errors = Vec::new();

        for node in model_system.nodes() {
            let Some(module_type) = node.module_type() else {
                continue;
            };
            match catalog.get(&module_type.name) {
                None => errors.push(ValidationError::UnresolvedType {
                    node_id: node.id(),
                    name: node.name().to_string(),
                    type_name: module_type.name.clone(),
                }),
                Some(registered) if registered.hooks != module_type.hooks => {
                    errors.push(ValidationError::StaleHooks {
                        node_id: node.id(),
                        name: node.name().to_string(),
                        type_name: module_type.name.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            Ok(Vec::new())
        } else {
            Err(errors)
        }
    }
}

/// Link integrity - checks every link still type-checks.
///
/// Verifies:
/// - Both endpoints exist and the origin hook exists
/// - The destination satisfies the hook's constraint
/// - Single-valued hooks hold at most one link
/// - The link lives in its origin's boundary
pub struct LinkIntegrity;

impl ValidationStage for LinkIntegrity {
    fn name(&self) -> &str {
        "Link Integrity"
    }

    fn validate(
        &self,
        model_system: &ModelSystem,
        _catalog: &HookCatalog,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let mut errors = Vec::new();

        for boundary in model_system.boundaries() {
            for link in boundary.links() {
                let broken = |reason: String| ValidationError::BrokenLink {
                    link_id: link.id,
                    reason,
                };
                let origin = match model_system.node(link.origin.node_id) {
                    Ok(node) => node,
                    Err(e) => {
                        errors.push(broken(e.to_string()));
                        continue;
                    }
                };
                let destination = match model_system.node(link.destination) {
                    Ok(node) => node,
                    Err(e) => {
                        errors.push(broken(e.to_string()));
                        continue;
                    }
                };
                let Some(hook) = origin.hook(&link.origin.hook_name) else {
                    errors.push(broken(format!(
                        "'{}' has no hook '{}'",
                        origin.name(),
                        link.origin.hook_name
                    )));
                    continue;
                };

                if !destination.satisfies(hook) {
                    errors.push(broken(format!(
                        "'{}' does not satisfy {}",
                        destination.name(),
                        hook
                    )));
                }
                if !boundary.contains_node(origin.id()) {
                    errors.push(broken(format!(
                        "stored outside the boundary of '{}'",
                        origin.name()
                    )));
                }
                if hook.is_single_valued()
                    && model_system.links_from(origin.id(), &hook.name).len() > 1
                {
                    errors.push(broken(format!(
                        "hook '{}' on '{}' holds more than one link",
                        hook.name,
                        origin.name()
                    )));
                }
            }
        }

        if errors.is_empty() {
            Ok(Vec::new())
        } else {
            Err(errors)
        }
    }
}

/// Required hooks - warns about mandatory hooks left unlinked.
///
/// Disabled nodes are skipped.
pub struct RequiredHooks;

impl ValidationStage for RequiredHooks {
    fn name(&self) -> &str {
        "Required Hooks"
    }

    fn validate(
        &self,
        model_system: &ModelSystem,
        _catalog: &HookCatalog,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let mut warnings = Vec::new();

        for node in model_system.nodes() {
            if node.is_disabled() {
                continue;
            }
            for hook in node.hooks().iter().filter(|h| h.required) {
                if model_system.links_from(node.id(), &hook.name).is_empty() {
                    warnings.push(ValidationWarning {
                        message: format!("Required hook '{}' on '{}' is not linked", hook.name, node.name()),
                        node_id: Some(node.id()),
                    });
                }
            }
        }

        Ok(warnings)
    }
}

/// Parameter values - checks parameter modules hold a usable literal.
///
/// A missing value is a warning; a value that no longer parses is an error.
pub struct ParameterValues;

impl ValidationStage for ParameterValues {
    fn name(&self) -> &str {
        "Parameter Values"
    }

    fn validate(
        &self,
        model_system: &ModelSystem,
        _catalog: &HookCatalog,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for node in model_system.nodes() {
            match node.parameter_value() {
                Some(Ok(_)) => {}
                Some(Err(reason)) => errors.push(ValidationError::InvalidParameter {
                    node_id: node.id(),
                    name: node.name().to_string(),
                    reason,
                }),
                None if node.parameter_type().is_some() => warnings.push(ValidationWarning {
                    message: format!("Parameter '{}' has no value", node.name()),
                    node_id: Some(node.id()),
                }),
                None => {}
            }
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors)
        }
    }
}
