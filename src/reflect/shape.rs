//! Static type descriptions.
//!
//! A [`Shape`] tells the registry, builder and serializer what a type is:
//! a scalar kind, an enum, a wrapper, a collection, an object with declared
//! members, an abstract trait object, or an opaque value that only a custom
//! handler understands.

use std::any::{Any, TypeId};
use std::sync::Arc;

use super::{downcast_box, FieldRef, Reflect, Replicate, TypeHandle, Typed};
use crate::error::JsonResult;
use crate::time::{DateOptions, DateTimeKind};

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `String`
    String,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `rust_decimal::Decimal`
    Decimal,
    /// [`crate::DateTime`]
    DateTime,
    /// [`crate::TimeSpan`]
    TimeSpan,
    /// `uuid::Uuid`
    Guid,
}

/// Description of a type.
pub enum Shape {
    /// Built-in scalar.
    Primitive(PrimitiveShape),
    /// Fieldless enum written by member name.
    Enum(EnumShape),
    /// `Option<T>`.
    Optional(OptionalShape),
    /// `Box<T>` of a concrete type.
    Shared(SharedShape),
    /// Sequence or set.
    Sequence(SequenceShape),
    /// Dictionary.
    Map(MapShape),
    /// Object with declared members.
    Object(ObjectShape),
    /// Trait object that needs a concrete type tag to be built.
    Abstract(AbstractShape),
    /// Only usable through a custom type registration.
    Opaque,
}

impl Shape {
    /// Whether the shape is one of the internally managed kinds that custom
    /// handlers may not replace.
    pub fn is_builtin(&self) -> bool {
        matches!(
            self,
            Shape::Primitive(_) | Shape::Sequence(_) | Shape::Map(_)
        )
    }
}

/// Scalar description.
pub struct PrimitiveShape {
    /// The scalar kind.
    pub kind: PrimitiveKind,
    pub(crate) default: fn() -> Box<dyn Reflect>,
    pub(crate) is_default: fn(&dyn Any) -> bool,
}

impl PrimitiveShape {
    /// Describe scalar `T` of the given kind.
    pub fn of<T: Typed + Default + PartialEq>(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            default: || Box::new(T::default()) as Box<dyn Reflect>,
            is_default: |value| value.downcast_ref::<T>().is_some_and(|v| *v == T::default()),
        }
    }
}

/// Enum description: member names in declaration order.
pub struct EnumShape {
    /// Member names.
    pub variants: &'static [&'static str],
    pub(crate) from_index: fn(usize) -> Option<Box<dyn Replicate>>,
}

impl EnumShape {
    /// Describe an enum from its member names and a constructor by index.
    pub fn new(
        variants: &'static [&'static str],
        from_index: fn(usize) -> Option<Box<dyn Replicate>>,
    ) -> Self {
        Self {
            variants,
            from_index,
        }
    }

    /// Case-insensitive member lookup.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variants
            .iter()
            .position(|variant| variant.eq_ignore_ascii_case(name))
    }
}

/// `Option<T>` description.
pub struct OptionalShape {
    /// The payload type.
    pub inner: TypeHandle,
    pub(crate) none: fn() -> Box<dyn Reflect>,
    pub(crate) some: fn(Box<dyn Reflect>) -> Option<Box<dyn Reflect>>,
}

impl OptionalShape {
    /// Describe `Option<T>`.
    pub fn of<T: Typed>() -> Self {
        Self {
            inner: TypeHandle::of::<T>(),
            none: || Box::new(None::<T>) as Box<dyn Reflect>,
            some: |value| downcast_box::<T>(value).map(|v| Box::new(Some(v)) as Box<dyn Reflect>),
        }
    }
}

/// `Box<T>` description.
pub struct SharedShape {
    /// The boxed type.
    pub inner: TypeHandle,
    pub(crate) wrap: fn(Box<dyn Reflect>) -> Option<Box<dyn Reflect>>,
}

impl SharedShape {
    /// Describe `Box<T>`.
    pub fn of<T: Typed>() -> Self {
        Self {
            inner: TypeHandle::of::<T>(),
            wrap: |value| {
                downcast_box::<T>(value).map(|v| Box::new(Box::new(v)) as Box<dyn Reflect>)
            },
        }
    }
}

/// How a sequence is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// Growable list.
    Growable,
    /// Allocated once at the final length; `Some(n)` when the length is fixed by the type.
    Fixed(Option<usize>),
    /// Set semantics.
    Set,
}

pub(crate) type BuildSequence = fn(Vec<Box<dyn Reflect>>) -> JsonResult<Box<dyn Reflect>>;
pub(crate) type ExtendSequence = fn(&mut dyn Any, Vec<Box<dyn Reflect>>) -> JsonResult<()>;
pub(crate) type BuildMap = fn(Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>) -> JsonResult<Box<dyn Reflect>>;

/// Sequence description.
pub struct SequenceShape {
    /// Element type.
    pub element: TypeHandle,
    /// Allocation kind.
    pub kind: SequenceKind,
    pub(crate) build: BuildSequence,
    pub(crate) extend: Option<ExtendSequence>,
}

impl SequenceShape {
    /// Describe a sequence of `T`.
    pub fn of<T: Typed>(kind: SequenceKind, build: BuildSequence, extend: Option<ExtendSequence>) -> Self {
        Self {
            element: TypeHandle::of::<T>(),
            kind,
            build,
            extend,
        }
    }

    /// Sequences of `u8` travel as base64.
    pub fn is_bytes(&self) -> bool {
        self.element.id() == TypeId::of::<u8>()
    }
}

/// Dictionary description.
pub struct MapShape {
    /// Key type.
    pub key: TypeHandle,
    /// Value type.
    pub value: TypeHandle,
    pub(crate) build: BuildMap,
}

impl MapShape {
    /// Describe a map from `K` to `V`.
    pub fn of<K: Typed, V: Typed>(build: BuildMap) -> Self {
        Self {
            key: TypeHandle::of::<K>(),
            value: TypeHandle::of::<V>(),
            build,
        }
    }

    /// String-keyed maps are written as JSON objects.
    pub fn is_string_keyed(&self) -> bool {
        self.key.id() == TypeId::of::<String>()
    }
}

/// Trait object description.
pub struct AbstractShape {
    pub(crate) upcast: fn(Box<dyn Reflect>) -> Option<Box<dyn Reflect>>,
}

impl AbstractShape {
    /// Describe a trait object by the conversion from a built concrete value
    /// into the boxed trait object; `None` when the concrete type does not
    /// implement the trait.
    pub fn new(upcast: fn(Box<dyn Reflect>) -> Option<Box<dyn Reflect>>) -> Self {
        Self { upcast }
    }
}

pub(crate) type Getter =
    Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<FieldRef<'a>> + Send + Sync>;
pub(crate) type Setter = Arc<dyn Fn(&mut dyn Any, Box<dyn Reflect>) -> bool + Send + Sync>;

fn getter<F>(f: F) -> Getter
where
    F: for<'a> Fn(&'a dyn Any) -> Option<FieldRef<'a>> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn setter<F>(f: F) -> Setter
where
    F: Fn(&mut dyn Any, Box<dyn Reflect>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Explicit selection marker on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    /// No marker.
    #[default]
    Unmarked,
    /// Explicitly included.
    Include,
    /// Explicitly excluded.
    Ignore,
}

/// One declared member of an object.
#[derive(Clone)]
pub struct Member {
    pub(crate) name: &'static str,
    pub(crate) wire_name: Option<&'static str>,
    pub(crate) marker: Marker,
    pub(crate) date: DateOptions,
    pub(crate) declared: TypeHandle,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl Member {
    fn declare<V: Typed>(name: &'static str) -> Self {
        Self {
            name,
            wire_name: None,
            marker: Marker::Unmarked,
            date: DateOptions::default(),
            declared: TypeHandle::of::<V>(),
            getter: None,
            setter: None,
        }
    }

    /// A readable and writable field.
    pub fn field<T, V, G, S>(name: &'static str, get: G, set: S) -> Self
    where
        T: Any,
        V: Typed,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::read_only(name, get).with_setter(set)
    }

    /// A field without a setter.
    pub fn read_only<T, V, G>(name: &'static str, get: G) -> Self
    where
        T: Any,
        V: Typed,
        G: Fn(&T) -> &V + Send + Sync + 'static,
    {
        let mut member = Self::declare::<V>(name);
        member.getter = Some(getter(move |owner| {
            owner
                .downcast_ref::<T>()
                .map(|owner| FieldRef::Borrowed(get(owner) as &dyn Reflect))
        }));
        member
    }

    /// A member whose value is computed on every read.
    pub fn computed<T, V, G>(name: &'static str, get: G) -> Self
    where
        T: Any,
        V: Typed,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let mut member = Self::declare::<V>(name);
        member.getter = Some(getter(move |owner| {
            owner
                .downcast_ref::<T>()
                .map(|owner| FieldRef::Owned(Box::new(get(owner))))
        }));
        member
    }

    /// A member that can only be written.
    pub fn write_only<T, V, S>(name: &'static str, set: S) -> Self
    where
        T: Any,
        V: Typed,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::declare::<V>(name).with_setter(set)
    }

    /// A declared member with no accessible getter or setter.
    pub fn inaccessible<V: Typed>(name: &'static str) -> Self {
        Self::declare::<V>(name)
    }

    fn with_setter<T, V, S>(mut self, set: S) -> Self
    where
        T: Any,
        V: Typed,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.setter = Some(setter(move |owner, value| {
            match (owner.downcast_mut::<T>(), downcast_box::<V>(value)) {
                (Some(owner), Some(value)) => {
                    set(owner, value);
                    true
                }
                _ => false,
            }
        }));
        self
    }

    /// Override the wire name; this also marks the member as included.
    pub fn rename(mut self, wire_name: &'static str) -> Self {
        self.wire_name = Some(wire_name);
        self.marker = Marker::Include;
        self
    }

    /// Mark for inclusion under opt-in selection.
    pub fn include(mut self) -> Self {
        self.marker = Marker::Include;
        self
    }

    /// Exclude from serialization.
    pub fn ignore(mut self) -> Self {
        self.marker = Marker::Ignore;
        self
    }

    /// Expected kind for date members.
    pub fn date_kind(mut self, kind: DateTimeKind) -> Self {
        self.date.kind = kind;
        self
    }

    /// Custom chrono format for date members.
    pub fn date_format(mut self, format: &'static str, kind: DateTimeKind) -> Self {
        self.date = DateOptions::format(format, kind);
        self
    }

    /// Member name as declared.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Name used on the wire.
    pub fn wire_name(&self) -> &'static str {
        self.wire_name.unwrap_or(self.name)
    }
}

/// Declared contract name used by [`ContractTypeNames`](crate::ContractTypeNames).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contract {
    /// Optional namespace.
    pub namespace: Option<&'static str>,
    /// Contract name.
    pub name: &'static str,
}

impl Contract {
    /// `Namespace/Name`, or `Name` without a namespace.
    pub fn qualified(&self) -> String {
        match self.namespace {
            Some(namespace) if !namespace.is_empty() => format!("{}/{}", namespace, self.name),
            _ => self.name.to_string(),
        }
    }
}

/// Object description: members in declaration order.
pub struct ObjectShape {
    pub(crate) members: Vec<Member>,
    pub(crate) constructor: Option<fn() -> Box<dyn Reflect>>,
    pub(crate) contract: Option<Contract>,
}

impl ObjectShape {
    /// Object built through `T::default()`.
    pub fn new<T: Typed + Default>() -> Self {
        Self {
            members: Vec::new(),
            constructor: Some(|| Box::new(T::default()) as Box<dyn Reflect>),
            contract: None,
        }
    }

    /// Object with no default constructor; it can be written but not read.
    pub fn without_constructor() -> Self {
        Self {
            members: Vec::new(),
            constructor: None,
            contract: None,
        }
    }

    /// Append a member.
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Declare a contract name.
    pub fn contract(mut self, namespace: Option<&'static str>, name: &'static str) -> Self {
        self.contract = Some(Contract { namespace, name });
        self
    }

    /// Declared members.
    pub fn members(&self) -> &[Member] {
        &self.members
    }
}

impl From<ObjectShape> for Shape {
    fn from(shape: ObjectShape) -> Self {
        Shape::Object(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_lookup_ignores_case() {
        let shape = EnumShape::new(&["Red", "Green"], |_| None);
        assert_eq!(shape.index_of("green"), Some(1));
        assert_eq!(shape.index_of("RED"), Some(0));
        assert_eq!(shape.index_of("blue"), None);
    }

    #[test]
    fn test_contract_qualified_name() {
        let with_ns = Contract {
            namespace: Some("zoo"),
            name: "Dog",
        };
        let without = Contract {
            namespace: None,
            name: "Dog",
        };
        assert_eq!(with_ns.qualified(), "zoo/Dog");
        assert_eq!(without.qualified(), "Dog");
    }

    #[test]
    fn test_member_markers() {
        let member = Member::inaccessible::<i32>("Age").rename("age");
        assert_eq!(member.wire_name(), "age");
        assert_eq!(member.marker, Marker::Include);
        assert_eq!(Member::inaccessible::<i32>("X").ignore().marker, Marker::Ignore);
    }

    #[test]
    fn test_primitive_default_detection() {
        let shape = PrimitiveShape::of::<i32>(PrimitiveKind::I32);
        assert!((shape.is_default)(&0_i32));
        assert!(!(shape.is_default)(&3_i32));
        assert!(!(shape.is_default)(&0_i64));
    }
}
