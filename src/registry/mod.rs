//! Per-type metadata, computed once and cached.
//!
//! # Architecture
//!
//! - [`section`] - Lazily populated cache with its own lock
//! - [`descriptor`] - Member metadata ([`FieldDescriptor`])
//! - [`custom`] - Custom type handlers
//! - [`type_names`] - `$type` naming strategies and the name table
//!
//! Every cache is keyed by [`TypeHandle`] and filled on first use. Caches
//! never contend with each other, so building the descriptors of one type
//! does not block reading the constructor of another.

pub mod custom;
pub mod descriptor;
pub mod section;
pub mod type_names;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{JsonError, JsonResult};
use crate::reflect::shape::Marker;
use crate::reflect::{Member, Reflect, SequenceKind, Shape, TypeHandle, Typed};
use crate::serializer::WriteStrategy;
use crate::settings::{MemberSelection, Settings};

pub use custom::{CustomEntry, CustomType, CustomTypeSerializer};
pub use descriptor::{FieldDescriptor, FieldFlags, SerializationInfo};
pub use section::RegistrySection;
pub use type_names::{ContractTypeNames, QualifiedTypeNames, TypeNameStrategy, TypeNameTable};

/// Creates a default instance of one type.
pub type Constructor = Arc<dyn Fn() -> JsonResult<Box<dyn Reflect>> + Send + Sync>;

/// Field descriptors of one type, keyed by wire name in declaration order.
pub type Descriptors = Arc<IndexMap<String, FieldDescriptor>>;

/// Metadata caches of one [`Json`](crate::Json) context.
pub struct Registry {
    selection: MemberSelection,
    include_read_only: bool,
    shapes: RegistrySection<TypeHandle, Arc<Shape>>,
    descriptors: RegistrySection<TypeHandle, Descriptors>,
    getters: RegistrySection<TypeHandle, Arc<[FieldDescriptor]>>,
    constructors: RegistrySection<TypeHandle, Constructor>,
    strategies: RegistrySection<TypeHandle, WriteStrategy>,
    custom: RegistrySection<TypeHandle, CustomEntry>,
    type_names: TypeNameTable,
}

impl Registry {
    /// Empty registry for the given settings, naming types by type path.
    pub fn new(settings: &Settings) -> Self {
        Self {
            selection: settings.member_selection,
            include_read_only: settings.include_read_only,
            shapes: RegistrySection::new("shapes"),
            descriptors: RegistrySection::new("field descriptors"),
            getters: RegistrySection::new("getters"),
            constructors: RegistrySection::new("constructors"),
            strategies: RegistrySection::new("write strategies"),
            custom: RegistrySection::new("custom types"),
            type_names: TypeNameTable::new(Arc::new(QualifiedTypeNames)),
        }
    }

    /// Member selection policy.
    pub fn member_selection(&self) -> MemberSelection {
        self.selection
    }

    /// The `$type` name table.
    pub fn type_names(&self) -> &TypeNameTable {
        &self.type_names
    }

    /// Cached shape of a type.
    pub fn shape(&self, handle: TypeHandle) -> Arc<Shape> {
        if let Some(shape) = self.shapes.get(&handle) {
            return shape;
        }
        let shape = Arc::new(handle.shape());
        self.shapes.insert(handle, Arc::clone(&shape));
        shape
    }

    /// Selected members of a type keyed by wire name. Types without declared
    /// members have none.
    pub fn field_descriptors(&self, handle: TypeHandle) -> JsonResult<Descriptors> {
        self.descriptors
            .get_or_try_insert(handle, || self.discover(handle))
    }

    /// Descriptors of the members that can be read, in declaration order.
    pub fn getters(&self, handle: TypeHandle) -> JsonResult<Arc<[FieldDescriptor]>> {
        self.getters.get_or_try_insert(handle, || {
            let descriptors = self.field_descriptors(handle)?;
            Ok(descriptors
                .values()
                .filter(|descriptor| descriptor.can_read())
                .cloned()
                .collect())
        })
    }

    /// Public summary of the members written for a type.
    pub fn serialization_members(&self, handle: TypeHandle) -> JsonResult<Vec<SerializationInfo>> {
        Ok(self
            .getters(handle)?
            .iter()
            .map(FieldDescriptor::info)
            .collect())
    }

    fn is_selected(&self, member: &Member) -> bool {
        match (member.marker, self.selection) {
            (Marker::Ignore, _) => false,
            (Marker::Include, _) => true,
            (Marker::Unmarked, MemberSelection::OptOut) => true,
            (Marker::Unmarked, MemberSelection::OptIn) => false,
        }
    }

    fn discover(&self, handle: TypeHandle) -> JsonResult<Descriptors> {
        let shape = self.shape(handle);
        let Shape::Object(object) = &*shape else {
            return Ok(Arc::new(IndexMap::new()));
        };

        let mut descriptors = IndexMap::with_capacity(object.members.len());
        for member in object.members.iter().filter(|member| self.is_selected(member)) {
            if member.getter.is_none() && member.setter.is_none() {
                tracing::warn!(
                    type_name = handle.name(),
                    member = member.name(),
                    "member has neither getter nor setter, skipped"
                );
                continue;
            }
            if member.setter.is_none() && !self.include_read_only {
                continue;
            }

            let wire_name = member.wire_name();
            if descriptors.contains_key(wire_name) {
                return Err(JsonError::DuplicateWireName {
                    name: wire_name.to_string(),
                    type_name: handle.name(),
                });
            }

            let declared = self.shape(member.declared);
            let inner = match &*declared {
                Shape::Optional(optional) => Some(optional.inner),
                _ => None,
            };
            let inner_shape = inner.map(|inner| self.shape(inner));
            let is_custom = self.is_custom_type(inner.unwrap_or(member.declared));
            let descriptor = FieldDescriptor::new(
                handle,
                member,
                &declared,
                inner.zip(inner_shape.as_deref()),
                is_custom,
            );
            descriptors.insert(wire_name.to_string(), descriptor);
        }

        Ok(Arc::new(descriptors))
    }

    /// Cached constructor of a type's default value.
    pub fn default_constructor(&self, handle: TypeHandle) -> JsonResult<Constructor> {
        self.constructors
            .get_or_try_insert(handle, || self.make_constructor(handle))
    }

    /// A new default instance of a type.
    pub fn create_instance(&self, handle: TypeHandle) -> JsonResult<Box<dyn Reflect>> {
        let constructor = self.default_constructor(handle)?;
        constructor()
    }

    fn make_constructor(&self, handle: TypeHandle) -> JsonResult<Constructor> {
        let no_constructor = || JsonError::NoDefaultConstructor {
            type_name: handle.name(),
        };

        let constructor: Constructor = match &*self.shape(handle) {
            Shape::Primitive(primitive) => {
                let default = primitive.default;
                Arc::new(move || Ok(default()))
            }
            Shape::Enum(shape) => {
                let first = shape.from_index;
                Arc::new(move || {
                    first(0)
                        .map(|value| value.replicate())
                        .ok_or(JsonError::NoDefaultConstructor {
                            type_name: handle.name(),
                        })
                })
            }
            Shape::Optional(optional) => {
                let none = optional.none;
                Arc::new(move || Ok(none()))
            }
            Shape::Shared(shared) => {
                let inner = self.default_constructor(shared.inner)?;
                let wrap = shared.wrap;
                Arc::new(move || {
                    wrap(inner()?).ok_or(JsonError::NoDefaultConstructor {
                        type_name: handle.name(),
                    })
                })
            }
            Shape::Sequence(sequence) => {
                if matches!(sequence.kind, SequenceKind::Fixed(Some(length)) if length > 0) {
                    return Err(no_constructor());
                }
                let build = sequence.build;
                Arc::new(move || build(Vec::new()))
            }
            Shape::Map(map) => {
                let build = map.build;
                Arc::new(move || build(Vec::new()))
            }
            Shape::Object(object) => match object.constructor {
                Some(construct) => Arc::new(move || Ok(construct())),
                None => return Err(no_constructor()),
            },
            Shape::Abstract(_) => {
                return Err(JsonError::CannotConstructAbstractType {
                    type_name: handle.name(),
                })
            }
            Shape::Opaque => return Err(no_constructor()),
        };
        Ok(constructor)
    }

    /// Register custom handlers for `T`.
    ///
    /// Built-in scalars and collections cannot be overridden, and at least
    /// one handler is required. Cached descriptors and write strategies are
    /// dropped so later lookups see the new classification.
    pub fn register_custom_type<T: Typed + Clone>(&self, custom: CustomType<T>) -> JsonResult<()> {
        let handle = TypeHandle::of::<T>();
        if self.shape(handle).is_builtin() {
            return Err(JsonError::CannotOverrideBuiltinType {
                type_name: handle.name(),
            });
        }

        let entry = custom.into_entry();
        if !entry.can_serialize() && !entry.can_deserialize() {
            return Err(JsonError::InvalidCustomType {
                type_name: handle.name(),
            });
        }

        tracing::debug!(
            type_name = handle.name(),
            serialize = entry.can_serialize(),
            deserialize = entry.can_deserialize(),
            "custom type registered"
        );
        self.custom.insert(handle, entry);
        self.descriptors.clear();
        self.getters.clear();
        self.strategies.clear();
        Ok(())
    }

    /// Whether a type has custom handlers.
    pub fn is_custom_type(&self, handle: TypeHandle) -> bool {
        self.custom.contains(&handle)
    }

    /// Custom handlers of a type.
    pub fn custom_entry(&self, handle: TypeHandle) -> Option<CustomEntry> {
        self.custom.get(&handle)
    }

    /// Cached write strategy of a runtime type.
    pub(crate) fn write_strategy(
        &self,
        handle: TypeHandle,
        compute: impl FnOnce() -> JsonResult<WriteStrategy>,
    ) -> JsonResult<WriteStrategy> {
        self.strategies.get_or_try_insert(handle, compute)
    }
}
