//! Value tree to object graph.
//!
//! The builder walks a parsed [`Value`] against a target type's [`Shape`].
//! Object members are matched by wire name in declaration order; JSON keys
//! without a matching member are ignored. A JSON `null` writes the member
//! type's default value, or `None` for optional members.
//!
//! # Polymorphism
//!
//! With type extension enabled, an object's `$type` tag picks the concrete
//! type built for an abstract (boxed trait object) target. Concrete targets
//! are always built as declared.

use crate::error::{JsonError, JsonResult};
use crate::json::{Array, Object, Primitive, Value};
use crate::reflect::{
    AbstractShape, MapShape, Reflect, SequenceKind, SequenceShape, Shape, TypeHandle,
};
use crate::registry::Registry;
use crate::settings::Settings;
use crate::time::DateOptions;

/// Builds values of described types from a value tree.
pub struct ObjectBuilder<'a> {
    registry: &'a Registry,
    settings: &'a Settings,
}

impl<'a> ObjectBuilder<'a> {
    /// Builder bound to a registry and settings.
    pub fn new(registry: &'a Registry, settings: &'a Settings) -> Self {
        Self { registry, settings }
    }

    /// Build a new value of `target`; `None` is JSON `null`.
    pub fn build_new(&self, target: &TypeHandle, value: Option<&Value>) -> JsonResult<Box<dyn Reflect>> {
        self.convert(*target, value, &DateOptions::default())
    }

    /// Fill an existing instance.
    ///
    /// An object value sets the matching members. An array value is
    /// appended to a growable sequence instance.
    pub fn build_into(&self, instance: &mut dyn Reflect, value: &Value) -> JsonResult<()> {
        let handle = instance.handle();
        match value {
            Value::Object(object) => self.populate(handle, instance, object),
            Value::Array(array) => match &*self.registry.shape(handle) {
                Shape::Sequence(sequence) => {
                    let Some(extend) = sequence.extend else {
                        return Err(JsonError::unsupported(
                            handle.name(),
                            "fixed-size sequences cannot be extended",
                        ));
                    };
                    let items = self.elements(sequence, array)?;
                    extend(instance.as_any_mut(), items)
                }
                _ => Err(JsonError::unsupported(handle.name(), "cannot fill from an array")),
            },
            Value::Primitive(_) => Err(JsonError::unsupported(
                handle.name(),
                "cannot fill from a primitive",
            )),
        }
    }

    /// Convert a value to `target`. `options` apply to date targets.
    pub fn convert(
        &self,
        target: TypeHandle,
        value: Option<&Value>,
        options: &DateOptions,
    ) -> JsonResult<Box<dyn Reflect>> {
        let shape = self.registry.shape(target);
        let Some(value) = value else {
            return self.null_value(target, &shape);
        };

        if let Value::Primitive(primitive) = value {
            if let Some(deserialize) = self
                .registry
                .custom_entry(target)
                .and_then(|entry| entry.deserialize)
            {
                return primitive.cached_erased(target, options, |raw| deserialize(raw));
            }
        }

        match &*shape {
            Shape::Primitive(scalar) => expect_primitive(target, value)?.convert_kind(scalar.kind, options),
            Shape::Enum(enumeration) => expect_primitive(target, value)?.convert_enum(target, enumeration),
            Shape::Optional(optional) => {
                let inner = self.convert(optional.inner, Some(value), options)?;
                (optional.some)(inner).ok_or_else(|| built_wrong_type(target))
            }
            Shape::Shared(shared) => {
                let inner = self.convert(shared.inner, Some(value), options)?;
                (shared.wrap)(inner).ok_or_else(|| built_wrong_type(target))
            }
            Shape::Sequence(sequence) => self.sequence(target, sequence, value),
            Shape::Map(map) => self.map(target, map, value),
            Shape::Object(_) => {
                let Value::Object(object) = value else {
                    return Err(expected(target, "an object", value));
                };
                let mut instance = self.registry.create_instance(target)?;
                self.populate(target, instance.as_mut(), object)?;
                Ok(instance)
            }
            Shape::Abstract(shape) => self.polymorphic(target, shape, value, options),
            Shape::Opaque => Err(JsonError::unsupported(
                target.name(),
                "no custom deserializer is registered for this type",
            )),
        }
    }

    fn null_value(&self, target: TypeHandle, shape: &Shape) -> JsonResult<Box<dyn Reflect>> {
        match shape {
            Shape::Optional(optional) => Ok((optional.none)()),
            _ => self.registry.create_instance(target),
        }
    }

    fn populate(&self, handle: TypeHandle, instance: &mut dyn Reflect, object: &Object) -> JsonResult<()> {
        let descriptors = self.registry.field_descriptors(handle)?;
        for descriptor in descriptors.values() {
            if !object.contains_key(descriptor.wire_name) {
                continue;
            }
            if !descriptor.can_write() {
                return Err(JsonError::NotWritable {
                    member: descriptor.name.to_string(),
                    type_name: handle.name(),
                });
            }

            let value = self.convert(
                descriptor.declared,
                object.get(descriptor.wire_name),
                &descriptor.date,
            )?;
            if !descriptor.set(instance, value) {
                return Err(JsonError::unsupported(
                    descriptor.declared.name(),
                    format!("member {} rejected the built value", descriptor.name),
                ));
            }
        }
        Ok(())
    }

    fn elements(&self, sequence: &SequenceShape, array: &Array) -> JsonResult<Vec<Box<dyn Reflect>>> {
        let options = DateOptions::default();
        array
            .iter()
            .map(|item| self.convert(sequence.element, item, &options))
            .collect()
    }

    fn sequence(&self, target: TypeHandle, sequence: &SequenceShape, value: &Value) -> JsonResult<Box<dyn Reflect>> {
        let array = match value {
            Value::Array(array) => array,
            Value::Primitive(primitive) if sequence.is_bytes() => {
                let items = primitive
                    .as_bytes()?
                    .into_iter()
                    .map(|byte| Box::new(byte) as Box<dyn Reflect>)
                    .collect();
                return (sequence.build)(items);
            }
            other => return Err(expected(target, "an array", other)),
        };

        if let SequenceKind::Fixed(Some(length)) = sequence.kind {
            if array.len() != length {
                return Err(JsonError::unsupported(
                    target.name(),
                    format!("expected {} elements, found {}", length, array.len()),
                ));
            }
        }
        (sequence.build)(self.elements(sequence, array)?)
    }

    fn map(&self, target: TypeHandle, map: &MapShape, value: &Value) -> JsonResult<Box<dyn Reflect>> {
        let options = DateOptions::default();
        let mut pairs = Vec::new();
        match value {
            Value::Object(object) => {
                for (key, item) in object.iter() {
                    let key = Value::from(Primitive::from_raw(key));
                    pairs.push((
                        self.convert(map.key, Some(&key), &options)?,
                        self.convert(map.value, item, &options)?,
                    ));
                }
            }
            Value::Array(array) => {
                for entry in array.iter() {
                    let Some(entry) = entry.and_then(Value::as_object) else {
                        return Err(JsonError::unsupported(
                            target.name(),
                            "expected an array of {\"k\":..,\"v\":..} objects",
                        ));
                    };
                    pairs.push((
                        self.convert(map.key, entry.get("k"), &options)?,
                        self.convert(map.value, entry.get("v"), &options)?,
                    ));
                }
            }
            other => return Err(expected(target, "an object or an array", other)),
        }
        (map.build)(pairs)
    }

    fn polymorphic(
        &self,
        target: TypeHandle,
        shape: &AbstractShape,
        value: &Value,
        options: &DateOptions,
    ) -> JsonResult<Box<dyn Reflect>> {
        let cannot_construct = || JsonError::CannotConstructAbstractType {
            type_name: target.name(),
        };
        if !self.settings.use_type_extension {
            return Err(cannot_construct());
        }

        let concrete = value
            .as_object()
            .and_then(Object::type_name)
            .and_then(|name| self.registry.type_names().try_resolve(name))
            .filter(|concrete| *concrete != target)
            .ok_or_else(cannot_construct)?;

        let built = self.convert(concrete, Some(value), options)?;
        (shape.upcast)(built).ok_or_else(|| {
            JsonError::unsupported(
                target.name(),
                format!("{} cannot be used as this type", concrete.name()),
            )
        })
    }
}

fn expect_primitive<'v>(target: TypeHandle, value: &'v Value) -> JsonResult<&'v Primitive> {
    value
        .as_primitive()
        .ok_or_else(|| expected(target, "a primitive", value))
}

fn expected(target: TypeHandle, wanted: &str, found: &Value) -> JsonError {
    JsonError::unsupported(
        target.name(),
        format!("expected {}, found {}", wanted, found.kind_name()),
    )
}

fn built_wrong_type(target: TypeHandle) -> JsonError {
    JsonError::unsupported(target.name(), "inner value built with the wrong type")
}
