//! Type names for `$type` tags.
//!
//! A [`TypeNameStrategy`] turns a type into the name written on the wire
//! and back. The [`TypeNameTable`] memoizes both directions and accepts
//! explicit registrations, which is how types become resolvable under the
//! default strategy: Rust cannot load a type from its name, so a name can
//! only be resolved once the table has seen the type.

use std::sync::Arc;

use parking_lot::RwLock;

use super::section::RegistrySection;
use crate::error::{JsonError, JsonResult};
use crate::reflect::{Shape, TypeHandle, Typed};

/// Maps types to wire names and back.
pub trait TypeNameStrategy: Send + Sync {
    /// Name written for `handle`. An empty name is rejected by the table.
    fn name_for(&self, handle: &TypeHandle) -> String;

    /// Type for a name read from the wire.
    fn resolve(&self, name: &str) -> Option<TypeHandle>;
}

/// Names types by their full Rust type path.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualifiedTypeNames;

impl TypeNameStrategy for QualifiedTypeNames {
    fn name_for(&self, handle: &TypeHandle) -> String {
        handle.name().to_string()
    }

    fn resolve(&self, _name: &str) -> Option<TypeHandle> {
        None
    }
}

/// Names types by their declared contract, `Namespace/Name` or `Name`,
/// falling back to the type path. Resolves among the listed types.
#[derive(Debug, Clone, Default)]
pub struct ContractTypeNames {
    types: Vec<TypeHandle>,
}

impl ContractTypeNames {
    /// Strategy without any resolvable types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `T` to the resolvable types.
    pub fn with<T: Typed>(mut self) -> Self {
        self.push(TypeHandle::of::<T>());
        self
    }

    /// Add a type to the resolvable types.
    pub fn push(&mut self, handle: TypeHandle) {
        if !self.types.contains(&handle) {
            self.types.push(handle);
        }
    }

    fn contract_name(handle: &TypeHandle) -> String {
        match handle.shape() {
            Shape::Object(object) => match object.contract {
                Some(contract) => contract.qualified(),
                None => handle.name().to_string(),
            },
            _ => handle.name().to_string(),
        }
    }
}

impl TypeNameStrategy for ContractTypeNames {
    fn name_for(&self, handle: &TypeHandle) -> String {
        Self::contract_name(handle)
    }

    fn resolve(&self, name: &str) -> Option<TypeHandle> {
        self.types
            .iter()
            .find(|handle| Self::contract_name(handle) == name)
            .copied()
    }
}

/// Memoized two-way mapping between types and names.
pub struct TypeNameTable {
    strategy: RwLock<Arc<dyn TypeNameStrategy>>,
    names: RegistrySection<TypeHandle, String>,
    types: RegistrySection<String, TypeHandle>,
}

impl TypeNameTable {
    /// Table driven by `strategy`.
    pub fn new(strategy: Arc<dyn TypeNameStrategy>) -> Self {
        Self {
            strategy: RwLock::new(strategy),
            names: RegistrySection::new("type names"),
            types: RegistrySection::new("named types"),
        }
    }

    fn strategy(&self) -> Arc<dyn TypeNameStrategy> {
        Arc::clone(&self.strategy.read())
    }

    /// Name for `handle`; the type becomes resolvable under that name.
    pub fn name_for(&self, handle: TypeHandle) -> JsonResult<String> {
        let name = self.names.get_or_try_insert(handle, || {
            let name = self.strategy().name_for(&handle);
            if name.is_empty() {
                return Err(empty_name(handle));
            }
            Ok(name)
        })?;
        if !self.types.contains(name.as_str()) {
            self.types.insert(name.clone(), handle);
        }
        Ok(name)
    }

    /// Type registered or seen under `name`, asking the strategy on a miss.
    pub fn try_resolve(&self, name: &str) -> Option<TypeHandle> {
        if name.is_empty() {
            return None;
        }
        if let Some(handle) = self.types.get(name) {
            return Some(handle);
        }

        let handle = self.strategy().resolve(name)?;
        self.types.insert(name.to_string(), handle);
        if !self.names.contains(&handle) {
            self.names.insert(handle, name.to_string());
        }
        tracing::debug!(name, type_name = handle.name(), "type name resolved");
        Some(handle)
    }

    /// Register `handle` under the strategy's name for it.
    pub fn register(&self, handle: TypeHandle) -> JsonResult<String> {
        let name = self.strategy().name_for(&handle);
        self.register_as(handle, &name)?;
        Ok(name)
    }

    /// Register `handle` under `name`. Binding a type to a second name, or a
    /// name to a second type, is a [`JsonError::TypeNameConflict`].
    pub fn register_as(&self, handle: TypeHandle, name: &str) -> JsonResult<()> {
        if name.is_empty() {
            return Err(empty_name(handle));
        }
        if let Some(existing) = self.names.get(&handle) {
            if existing != name {
                return Err(JsonError::TypeNameConflict {
                    name: name.to_string(),
                    type_name: handle.name(),
                });
            }
        }
        if let Some(bound) = self.types.get(name) {
            if bound != handle {
                return Err(JsonError::TypeNameConflict {
                    name: name.to_string(),
                    type_name: bound.name(),
                });
            }
        }

        self.names.insert(handle, name.to_string());
        self.types.insert(name.to_string(), handle);
        tracing::debug!(name, type_name = handle.name(), "type name registered");
        Ok(())
    }

    /// Swap the strategy and forget every name.
    pub fn reset(&self, strategy: Arc<dyn TypeNameStrategy>) {
        *self.strategy.write() = strategy;
        self.names.clear();
        self.types.clear();
        tracing::debug!("type name strategy replaced");
    }
}

fn empty_name(handle: TypeHandle) -> JsonError {
    JsonError::InvalidFormat {
        text: handle.name().to_string(),
        target: "type name",
    }
}
