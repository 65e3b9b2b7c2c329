//! Hook catalog for managing available module types.

use crate::core::error::CapabilityError;
use crate::core::hook::{Cardinality, Hook, HookKind};
use crate::core::module::{
    CapabilityTag, ModuleDefinition, ModuleType, SlotGroup, SlotType, TypeDescriptor,
};
use indexmap::IndexMap;
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Registry of module types and their cached hooks.
///
/// The catalog validates each type's capability declaration once, derives the
/// ordered hook list from it, and hands out shared references to the result.
/// It is safe to share between sessions; lookups take a read lock.
pub struct HookCatalog {
    /// Validated module types indexed by their fully-qualified name.
    types: RwLock<IndexMap<String, Arc<ModuleType>>>,
}

impl HookCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self {
            types: RwLock::new(IndexMap::new()),
        }
    }

    /// Create a catalog pre-populated with the built-in module types.
    pub fn with_builtins() -> Self {
        let catalog = Self::new();
        crate::catalog::builtin::register_all(&catalog);
        catalog
    }

    /// Register a module type, replacing any previous entry with the same name.
    ///
    /// Fails if the type is not a module or its declaration is defective; in
    /// that case nothing is cached for the type.
    pub fn register(&self, descriptor: &TypeDescriptor) -> Result<Arc<ModuleType>, CapabilityError> {
        if !descriptor.is_module {
            return Err(CapabilityError::NotAModule {
                type_name: descriptor.name.clone(),
            });
        }
        let module_type = match analyze(descriptor) {
            Ok(module_type) => Arc::new(module_type),
            Err(error) => {
                warn!("Rejected module type '{}': {}", descriptor.name, error);
                return Err(error);
            }
        };
        debug!(
            "Registered module type '{}' with {} hook(s)",
            module_type.name,
            module_type.hooks.len()
        );
        self.types
            .write()
            .insert(module_type.name.clone(), Arc::clone(&module_type));
        Ok(module_type)
    }

    /// Register a type if it implements the module interface; otherwise do
    /// nothing and return `Ok(None)`.
    pub fn register_if_capable(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Arc<ModuleType>>, CapabilityError> {
        if !descriptor.is_module {
            return Ok(None);
        }
        self.register(descriptor).map(Some)
    }

    /// Scan every type exported by a plugin and register the module types.
    ///
    /// Returns the number of module types registered. Stops at the first
    /// defective declaration.
    pub fn register_plugin(&self, descriptors: &[TypeDescriptor]) -> Result<usize, CapabilityError> {
        let mut registered = 0;
        for descriptor in descriptors {
            if self.register_if_capable(descriptor)?.is_some() {
                registered += 1;
            }
        }
        Ok(registered)
    }

    /// Get the validated type for a declaration, registering it on first use.
    pub fn describe(&self, descriptor: &TypeDescriptor) -> Result<Arc<ModuleType>, CapabilityError> {
        if let Some(module_type) = self.get(descriptor.name.trim()) {
            return Ok(module_type);
        }
        self.register(descriptor)
    }

    /// Get the validated type of a Rust module definition.
    pub fn describe_module<M: ModuleDefinition>(&self) -> Result<Arc<ModuleType>, CapabilityError> {
        self.describe(&M::descriptor())
    }

    /// Look up a registered type by name.
    pub fn get(&self, name: &str) -> Option<Arc<ModuleType>> {
        self.types.read().get(name).cloned()
    }

    /// Check if a type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Get all registered type names, in registration order.
    pub fn type_names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }

    /// Get all registered types, in registration order.
    pub fn types(&self) -> Vec<Arc<ModuleType>> {
        self.types.read().values().cloned().collect()
    }

    /// Get every registered type that can be linked to a hook with the given
    /// constraint.
    pub fn implementors(&self, constraint: &str) -> Vec<Arc<ModuleType>> {
        self.types
            .read()
            .values()
            .filter(|t| t.satisfies(constraint))
            .cloned()
            .collect()
    }

    /// Search types by name or description.
    pub fn search(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        self.types
            .read()
            .values()
            .filter(|t| {
                t.name.to_lowercase().contains(&query)
                    || t.description.to_lowercase().contains(&query)
            })
            .map(|t| t.name.clone())
            .collect()
    }

    /// Unregister a type.
    pub fn unregister(&self, name: &str) -> bool {
        self.types.write().shift_remove(name).is_some()
    }

    /// Get the total number of registered types.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Check if catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl Default for HookCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Validate a capability declaration and derive its ordered hooks.
///
/// Public, module-typed slots become hooks: fields first, then properties,
/// each group in declaration order. Every such slot must carry exactly one
/// capability tag and be both readable and writable.
pub fn analyze(descriptor: &TypeDescriptor) -> Result<ModuleType, CapabilityError> {
    let type_name = descriptor.name.trim();
    if type_name.is_empty() {
        return Err(CapabilityError::EmptyTypeName);
    }

    let mut seen = HashSet::new();
    for slot in &descriptor.slots {
        if !seen.insert(slot.name.as_str()) {
            return Err(CapabilityError::DuplicateSlot {
                type_name: type_name.to_string(),
                slot: slot.name.clone(),
            });
        }
    }

    let mut hooks = Vec::new();
    for group in [SlotGroup::Field, SlotGroup::Property] {
        for slot in descriptor.slots.iter().filter(|s| s.group == group) {
            let (constraint, multiple) = match &slot.slot_type {
                SlotType::Module { constraint, multiple } if slot.public => (constraint, *multiple),
                _ => continue,
            };
            let tag = match slot.tags.as_slice() {
                [] => {
                    return Err(CapabilityError::MissingTag {
                        type_name: type_name.to_string(),
                        slot: slot.name.clone(),
                    })
                }
                [tag] => *tag,
                _ => {
                    return Err(CapabilityError::AmbiguousTag {
                        type_name: type_name.to_string(),
                        slot: slot.name.clone(),
                    })
                }
            };
            if !(slot.readable && slot.writable) {
                return Err(CapabilityError::NotReadWrite {
                    type_name: type_name.to_string(),
                    slot: slot.name.clone(),
                });
            }
            let (kind, required) = match tag {
                CapabilityTag::Parameter => (HookKind::Parameter, true),
                CapabilityTag::SubModule { required } => (HookKind::SubModule, required),
            };
            hooks.push(Hook {
                name: slot.name.clone(),
                kind,
                required,
                constraint: constraint.clone(),
                cardinality: if multiple {
                    Cardinality::Multiple
                } else {
                    Cardinality::Single
                },
            });
        }
    }

    Ok(ModuleType {
        name: type_name.to_string(),
        description: descriptor.description.clone(),
        implements: descriptor.implements.clone(),
        parameter: descriptor.parameter.clone(),
        hooks,
    })
}
