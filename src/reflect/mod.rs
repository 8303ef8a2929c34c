//! Type descriptions that replace runtime reflection.
//!
//! Every type the mapper touches implements [`Reflect`] (object safe, used on
//! values) and [`Typed`] (static, describes the type as a [`Shape`]). Built-in
//! scalars, options, boxes and the standard collections are covered here;
//! user types opt in through the macros in this module together with a
//! hand-written [`Typed::shape`].
//!
//! # Architecture
//!
//! - [`TypeHandle`] - copyable runtime identity of a described type
//! - [`shape`] - the [`Shape`] description and member declarations
//! - [`impls`] - descriptions of std, chrono, uuid and decimal types
//!
//! Registry caches are keyed by [`TypeHandle`], so a description is
//! interpreted once per type and reused afterwards.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::time::{DateTime, TimeSpan};

pub mod impls;
mod macros;
pub mod shape;

pub use shape::{
    AbstractShape, EnumShape, MapShape, Member, ObjectShape, OptionalShape, PrimitiveKind,
    PrimitiveShape, SequenceKind, SequenceShape, Shape, SharedShape,
};

/// Runtime identity of a described type.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    name: &'static str,
    shape: fn() -> Shape,
}

impl TypeHandle {
    /// Handle of `T`.
    pub fn of<T: Typed>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape: T::shape,
        }
    }

    /// Rust type identity.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type path, e.g. `alloc::vec::Vec<i32>`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build the type's shape.
    pub fn shape(&self) -> Shape {
        (self.shape)()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHandle").field(&self.name).finish()
    }
}

/// Object-safe access to a described value.
///
/// `as_any`, `handle` and `view` see through boxes to the concrete value
/// behind them. `into_any` keeps the declared type, so a boxed trait object
/// comes back as the box.
pub trait Reflect: Any {
    /// Handle of the concrete runtime type.
    fn handle(&self) -> TypeHandle;

    /// Read-only view used by the serializer.
    fn view(&self) -> View<'_>;

    /// The concrete value as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// The concrete value as mutable `Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The value itself, boxed as `Any`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// The concrete value as a `Reflect` trait object.
    fn as_reflect(&self) -> &dyn Reflect;
}

/// Static description of a type.
pub trait Typed: Reflect + Sized {
    /// Describe the type.
    fn shape() -> Shape;
}

/// What a value looks like to the serializer.
pub enum View<'a> {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Single character.
    Char(char),
    /// String.
    Str(&'a str),
    /// Any signed integer.
    Signed(i64),
    /// Any unsigned integer.
    Unsigned(u64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// Decimal.
    Decimal(Decimal),
    /// Date and time.
    DateTime(DateTime),
    /// Duration.
    TimeSpan(TimeSpan),
    /// Guid.
    Guid(Uuid),
    /// Contiguous bytes.
    Bytes(&'a [u8]),
    /// Enum member name.
    Enum(&'static str),
    /// Elements of a sequence.
    Sequence(Box<dyn Iterator<Item = &'a dyn Reflect> + 'a>),
    /// Entries of a map.
    Map(Box<dyn Iterator<Item = (&'a dyn Reflect, &'a dyn Reflect)> + 'a>),
    /// A described object; members are read through the registry.
    Object(&'a dyn Reflect),
    /// A value only a custom handler understands.
    Opaque(&'a dyn Reflect),
}

impl View<'_> {
    /// Short label for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            View::Null => "null",
            View::Bool(_) => "bool",
            View::Char(_) => "char",
            View::Str(_) => "string",
            View::Signed(_) | View::Unsigned(_) => "integer",
            View::Float(_) | View::Double(_) | View::Decimal(_) => "number",
            View::DateTime(_) => "date",
            View::TimeSpan(_) => "time span",
            View::Guid(_) => "guid",
            View::Bytes(_) => "bytes",
            View::Enum(_) => "enum",
            View::Sequence(_) => "sequence",
            View::Map(_) => "map",
            View::Object(_) => "object",
            View::Opaque(_) => "opaque",
        }
    }
}

/// A member value returned by a getter: a borrowed field or a computed value.
pub enum FieldRef<'a> {
    /// Borrowed from the owning object.
    Borrowed(&'a dyn Reflect),
    /// Produced by a computed getter.
    Owned(Box<dyn Reflect>),
}

impl Deref for FieldRef<'_> {
    type Target = dyn Reflect;

    fn deref(&self) -> &Self::Target {
        match self {
            FieldRef::Borrowed(value) => *value,
            FieldRef::Owned(value) => value.as_ref(),
        }
    }
}

/// A value that can be cloned behind a trait object.
///
/// Conversion caches keep converted scalars in this form and hand out
/// fresh copies.
pub trait Replicate: Any {
    /// Clone into a new box.
    fn replicate(&self) -> Box<dyn Reflect>;

    /// The stored value as `Any`.
    fn stored(&self) -> &dyn Any;
}

impl<T: Reflect + Clone> Replicate for T {
    fn replicate(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn stored(&self) -> &dyn Any {
        self
    }
}

/// Move a boxed value out as its declared type.
pub fn downcast_box<T: Any>(value: Box<dyn Reflect>) -> Option<T> {
    value.into_any().downcast::<T>().ok().map(|boxed| *boxed)
}
