//! Per-member metadata derived from an object's declared members.

use std::any::Any;
use std::fmt;

use crate::reflect::shape::{Getter, Setter};
use crate::reflect::{FieldRef, Member, PrimitiveKind, Reflect, SequenceKind, Shape, TypeHandle, View};
use crate::time::DateOptions;

/// Classification of a member's declared type, after unwrapping `Option`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    /// Map of any key type.
    pub is_dictionary: bool,
    /// Map keyed by `String`, written as a JSON object.
    pub is_string_keyed_dictionary: bool,
    /// Ordered sequence other than bytes.
    pub is_array: bool,
    /// Set.
    pub is_set: bool,
    /// `u8` sequence, written as base64.
    pub is_byte_array: bool,
    /// Fieldless enum.
    pub is_enum: bool,
    /// Date and time.
    pub is_date: bool,
    /// Guid.
    pub is_guid: bool,
    /// Has a custom type registration.
    pub is_custom_type: bool,
    /// Scalar or enum other than `String`.
    pub is_value_type: bool,
    /// Anything that is not a value type.
    pub is_class: bool,
}

impl FieldFlags {
    /// Classify a shape.
    pub fn classify(shape: &Shape, is_custom_type: bool) -> Self {
        let mut flags = FieldFlags {
            is_custom_type,
            ..FieldFlags::default()
        };

        match shape {
            Shape::Primitive(primitive) => {
                flags.is_date = primitive.kind == PrimitiveKind::DateTime;
                flags.is_guid = primitive.kind == PrimitiveKind::Guid;
                flags.is_value_type = primitive.kind != PrimitiveKind::String;
            }
            Shape::Enum(_) => {
                flags.is_enum = true;
                flags.is_value_type = true;
            }
            Shape::Sequence(sequence) => {
                flags.is_byte_array = sequence.is_bytes();
                flags.is_set = sequence.kind == SequenceKind::Set;
                flags.is_array = !flags.is_byte_array && !flags.is_set;
            }
            Shape::Map(map) => {
                flags.is_dictionary = true;
                flags.is_string_keyed_dictionary = map.is_string_keyed();
            }
            Shape::Optional(_)
            | Shape::Shared(_)
            | Shape::Object(_)
            | Shape::Abstract(_)
            | Shape::Opaque => {}
        }

        flags.is_class = !flags.is_value_type;
        flags
    }
}

/// How to recognize a member's default value for null suppression.
#[derive(Clone, Copy)]
pub(crate) enum DefaultCheck {
    /// Reference-like members: only absence counts.
    Absent,
    /// Scalars compare against `Default::default()`.
    Scalar(fn(&dyn Any) -> bool),
    /// Enums compare against their first member.
    Enum(&'static str),
}

/// Metadata for one serializable member.
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Type declaring the member.
    pub owner: TypeHandle,
    /// Member name as declared.
    pub name: &'static str,
    /// Name used on the wire.
    pub wire_name: &'static str,
    /// Declared member type.
    pub declared: TypeHandle,
    /// Payload type when the declared type is `Option<T>`.
    pub nullable_inner: Option<TypeHandle>,
    /// Element type of a sequence, value type of a map.
    pub element: Option<TypeHandle>,
    /// Key type of a map.
    pub key: Option<TypeHandle>,
    /// Classification of the declared type.
    pub flags: FieldFlags,
    /// Date options for date members.
    pub date: DateOptions,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
    pub(crate) default: DefaultCheck,
}

impl FieldDescriptor {
    /// Describe `member` of `owner`. `declared` is the shape of the member
    /// type; `inner` the unwrapped handle and shape when that is `Option<T>`.
    pub(crate) fn new(
        owner: TypeHandle,
        member: &Member,
        declared: &Shape,
        inner: Option<(TypeHandle, &Shape)>,
        is_custom_type: bool,
    ) -> Self {
        let effective = inner.map_or(declared, |(_, shape)| shape);
        let (element, key) = match effective {
            Shape::Sequence(sequence) => (Some(sequence.element), None),
            Shape::Map(map) => (Some(map.value), Some(map.key)),
            _ => (None, None),
        };
        let default = match declared {
            Shape::Primitive(primitive) => DefaultCheck::Scalar(primitive.is_default),
            Shape::Enum(shape) => shape
                .variants
                .first()
                .map_or(DefaultCheck::Absent, |first| DefaultCheck::Enum(*first)),
            _ => DefaultCheck::Absent,
        };

        Self {
            owner,
            name: member.name,
            wire_name: member.wire_name(),
            declared: member.declared,
            nullable_inner: inner.map(|(handle, _)| handle),
            element,
            key,
            flags: FieldFlags::classify(effective, is_custom_type),
            date: member.date.clone(),
            getter: member.getter.clone(),
            setter: member.setter.clone(),
            default,
        }
    }

    /// Whether the member can be read.
    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether the member can be written.
    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the member from `owner`; `None` without a getter or for a
    /// foreign owner.
    pub fn get<'a>(&self, owner: &'a dyn Reflect) -> Option<FieldRef<'a>> {
        let getter = self.getter.as_ref()?;
        getter(owner.as_any())
    }

    /// Write the member on `owner`; `false` without a setter or when the
    /// value or owner has the wrong type.
    pub fn set(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> bool {
        match &self.setter {
            Some(setter) => setter(owner.as_any_mut(), value),
            None => false,
        }
    }

    /// Whether `value` is absent or equal to the member's default.
    pub fn is_default_value(&self, value: &dyn Reflect) -> bool {
        if matches!(value.view(), View::Null) {
            return true;
        }
        match self.default {
            DefaultCheck::Absent => false,
            DefaultCheck::Scalar(is_default) => is_default(value.as_any()),
            DefaultCheck::Enum(first) => matches!(value.view(), View::Enum(name) if name == first),
        }
    }

    /// Public summary of this member.
    pub fn info(&self) -> SerializationInfo {
        SerializationInfo {
            member_name: self.name,
            wire_name: self.wire_name,
            member_type: self.declared.name(),
            declaring_type: self.owner.name(),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("declared", &self.declared)
            .field("flags", &self.flags)
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .finish()
    }
}

/// Summary of a serializable member, for hosts building column lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationInfo {
    /// Member name as declared.
    pub member_name: &'static str,
    /// Name used on the wire.
    pub wire_name: &'static str,
    /// Declared member type.
    pub member_type: &'static str,
    /// Type declaring the member.
    pub declaring_type: &'static str,
}
