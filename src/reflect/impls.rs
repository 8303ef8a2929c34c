//! Descriptions of scalars, wrappers and standard collections.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::shape::{
    MapShape, OptionalShape, PrimitiveKind, PrimitiveShape, SequenceKind, SequenceShape, Shape,
    SharedShape,
};
use super::{downcast_box, Reflect, TypeHandle, Typed, View};
use crate::error::{JsonError, JsonResult};
use crate::time::{DateTime, TimeSpan};

macro_rules! primitive {
    ($ty:ty, $kind:ident, |$v:ident| $view:expr) => {
        impl Reflect for $ty {
            fn handle(&self) -> TypeHandle {
                TypeHandle::of::<Self>()
            }

            fn view(&self) -> View<'_> {
                let $v = self;
                $view
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }

            fn as_reflect(&self) -> &dyn Reflect {
                self
            }
        }

        impl Typed for $ty {
            fn shape() -> Shape {
                Shape::Primitive(PrimitiveShape::of::<$ty>(PrimitiveKind::$kind))
            }
        }
    };
}

primitive!(bool, Bool, |v| View::Bool(*v));
primitive!(char, Char, |v| View::Char(*v));
primitive!(String, String, |v| View::Str(v.as_str()));
primitive!(i8, I8, |v| View::Signed(i64::from(*v)));
primitive!(i16, I16, |v| View::Signed(i64::from(*v)));
primitive!(i32, I32, |v| View::Signed(i64::from(*v)));
primitive!(i64, I64, |v| View::Signed(*v));
primitive!(u8, U8, |v| View::Unsigned(u64::from(*v)));
primitive!(u16, U16, |v| View::Unsigned(u64::from(*v)));
primitive!(u32, U32, |v| View::Unsigned(u64::from(*v)));
primitive!(u64, U64, |v| View::Unsigned(*v));
primitive!(f32, F32, |v| View::Float(*v));
primitive!(f64, F64, |v| View::Double(*v));
primitive!(Decimal, Decimal, |v| View::Decimal(*v));
primitive!(DateTime, DateTime, |v| View::DateTime(*v));
primitive!(TimeSpan, TimeSpan, |v| View::TimeSpan(*v));
primitive!(Uuid, Guid, |v| View::Guid(*v));

impl Default for DateTime {
    fn default() -> Self {
        let wall = chrono::NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        DateTime::new(wall, crate::time::DateTimeKind::Unspecified)
    }
}

impl<T: Typed> Reflect for Option<T> {
    fn handle(&self) -> TypeHandle {
        match self {
            Some(value) => value.handle(),
            None => TypeHandle::of::<Self>(),
        }
    }

    fn view(&self) -> View<'_> {
        match self {
            Some(value) => value.view(),
            None => View::Null,
        }
    }

    fn as_any(&self) -> &dyn Any {
        match self {
            Some(value) => value.as_any(),
            None => self,
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_reflect(&self) -> &dyn Reflect {
        match self {
            Some(value) => value.as_reflect(),
            None => self,
        }
    }
}

impl<T: Typed> Typed for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(OptionalShape::of::<T>())
    }
}

impl<T: Typed> Reflect for Box<T> {
    fn handle(&self) -> TypeHandle {
        (**self).handle()
    }

    fn view(&self) -> View<'_> {
        (**self).view()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        (**self).as_any_mut()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_reflect(&self) -> &dyn Reflect {
        (**self).as_reflect()
    }
}

impl<T: Typed> Typed for Box<T> {
    fn shape() -> Shape {
        Shape::Shared(SharedShape::of::<T>())
    }
}

/// Move every built element out as `T`.
fn collect_items<T: Typed>(items: Vec<Box<dyn Reflect>>) -> JsonResult<Vec<T>> {
    items
        .into_iter()
        .map(|item| {
            let found = item.handle().name();
            downcast_box::<T>(item).ok_or_else(|| {
                JsonError::unsupported(
                    std::any::type_name::<T>(),
                    format!("element built as {}", found),
                )
            })
        })
        .collect()
}

fn collect_pairs<K: Typed, V: Typed>(
    pairs: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
) -> JsonResult<Vec<(K, V)>> {
    let mismatch = || {
        JsonError::unsupported(
            std::any::type_name::<(K, V)>(),
            "entry built with the wrong key or value type",
        )
    };
    pairs
        .into_iter()
        .map(|(key, value)| {
            let key = downcast_box::<K>(key).ok_or_else(mismatch)?;
            let value = downcast_box::<V>(value).ok_or_else(mismatch)?;
            Ok((key, value))
        })
        .collect()
}

fn target_mismatch<C: Any>() -> JsonError {
    JsonError::unsupported(std::any::type_name::<C>(), "instance of another type")
}

/// Reflect impl for a sequence container of `T`.
macro_rules! sequence_reflect {
    ($container:ty, [$($bound:tt)*] $(, const $n:ident)?) => {
        impl<T: Typed $($bound)* $(, const $n: usize)?> Reflect for $container {
            fn handle(&self) -> TypeHandle {
                TypeHandle::of::<Self>()
            }

            fn view(&self) -> View<'_> {
                View::Sequence(Box::new(self.iter().map(|item| item as &dyn Reflect)))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }

            fn as_reflect(&self) -> &dyn Reflect {
                self
            }
        }
    };
}

impl<T: Typed> Reflect for Vec<T> {
    fn handle(&self) -> TypeHandle {
        TypeHandle::of::<Self>()
    }

    fn view(&self) -> View<'_> {
        if let Some(bytes) = (self as &dyn Any).downcast_ref::<Vec<u8>>() {
            return View::Bytes(bytes);
        }
        View::Sequence(Box::new(self.iter().map(|item| item as &dyn Reflect)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_reflect(&self) -> &dyn Reflect {
        self
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::of::<T>(
            SequenceKind::Growable,
            |items| Ok(Box::new(collect_items::<T>(items)?) as Box<dyn Reflect>),
            Some(|target, items| {
                let target = target
                    .downcast_mut::<Vec<T>>()
                    .ok_or_else(target_mismatch::<Vec<T>>)?;
                target.extend(collect_items::<T>(items)?);
                Ok(())
            }),
        ))
    }
}

impl<T: Typed> Reflect for Box<[T]> {
    fn handle(&self) -> TypeHandle {
        TypeHandle::of::<Self>()
    }

    fn view(&self) -> View<'_> {
        if let Some(bytes) = (self as &dyn Any).downcast_ref::<Box<[u8]>>() {
            return View::Bytes(bytes);
        }
        View::Sequence(Box::new(self.iter().map(|item| item as &dyn Reflect)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_reflect(&self) -> &dyn Reflect {
        self
    }
}

impl<T: Typed> Typed for Box<[T]> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::of::<T>(
            SequenceKind::Fixed(None),
            |items| {
                let items = collect_items::<T>(items)?.into_boxed_slice();
                Ok(Box::new(items) as Box<dyn Reflect>)
            },
            None,
        ))
    }
}

sequence_reflect!([T; N], [], const N);

impl<T: Typed, const N: usize> Typed for [T; N] {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::of::<T>(
            SequenceKind::Fixed(Some(N)),
            |items| {
                let found = items.len();
                let array = <[T; N]>::try_from(collect_items::<T>(items)?).map_err(|_| {
                    JsonError::unsupported(
                        std::any::type_name::<[T; N]>(),
                        format!("expected {} elements, found {}", N, found),
                    )
                })?;
                Ok(Box::new(array) as Box<dyn Reflect>)
            },
            None,
        ))
    }
}

sequence_reflect!(VecDeque<T>, []);

impl<T: Typed> Typed for VecDeque<T> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::of::<T>(
            SequenceKind::Growable,
            |items| {
                let items: VecDeque<T> = collect_items::<T>(items)?.into();
                Ok(Box::new(items) as Box<dyn Reflect>)
            },
            Some(|target, items| {
                let target = target
                    .downcast_mut::<VecDeque<T>>()
                    .ok_or_else(target_mismatch::<VecDeque<T>>)?;
                target.extend(collect_items::<T>(items)?);
                Ok(())
            }),
        ))
    }
}

sequence_reflect!(HashSet<T>, [+ Eq + Hash]);

impl<T: Typed + Eq + Hash> Typed for HashSet<T> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::of::<T>(
            SequenceKind::Set,
            |items| {
                let items: HashSet<T> = collect_items::<T>(items)?.into_iter().collect();
                Ok(Box::new(items) as Box<dyn Reflect>)
            },
            Some(|target, items| {
                let target = target
                    .downcast_mut::<HashSet<T>>()
                    .ok_or_else(target_mismatch::<HashSet<T>>)?;
                target.extend(collect_items::<T>(items)?);
                Ok(())
            }),
        ))
    }
}

sequence_reflect!(BTreeSet<T>, [+ Ord]);

impl<T: Typed + Ord> Typed for BTreeSet<T> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::of::<T>(
            SequenceKind::Set,
            |items| {
                let items: BTreeSet<T> = collect_items::<T>(items)?.into_iter().collect();
                Ok(Box::new(items) as Box<dyn Reflect>)
            },
            Some(|target, items| {
                let target = target
                    .downcast_mut::<BTreeSet<T>>()
                    .ok_or_else(target_mismatch::<BTreeSet<T>>)?;
                target.extend(collect_items::<T>(items)?);
                Ok(())
            }),
        ))
    }
}

/// Reflect and Typed impls for a map container from `K` to `V`.
macro_rules! map_impls {
    ($container:ident, [$($bound:tt)*]) => {
        impl<K: Typed $($bound)*, V: Typed> Reflect for $container<K, V> {
            fn handle(&self) -> TypeHandle {
                TypeHandle::of::<Self>()
            }

            fn view(&self) -> View<'_> {
                View::Map(Box::new(
                    self.iter()
                        .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
                ))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }

            fn as_reflect(&self) -> &dyn Reflect {
                self
            }
        }

        impl<K: Typed $($bound)*, V: Typed> Typed for $container<K, V> {
            fn shape() -> Shape {
                Shape::Map(MapShape::of::<K, V>(|pairs| {
                    let map: $container<K, V> = collect_pairs::<K, V>(pairs)?.into_iter().collect();
                    Ok(Box::new(map) as Box<dyn Reflect>)
                }))
            }
        }
    };
}

map_impls!(HashMap, [+ Eq + Hash]);
map_impls!(BTreeMap, [+ Ord]);
map_impls!(IndexMap, [+ Eq + Hash]);

#[cfg(test)]
mod tests {
    use super::*;

    fn build_sequence<C: Typed>(items: Vec<Box<dyn Reflect>>) -> JsonResult<C> {
        match C::shape() {
            Shape::Sequence(shape) => {
                let built = (shape.build)(items)?;
                downcast_box::<C>(built).ok_or_else(|| JsonError::unsupported("test", "downcast"))
            }
            _ => Err(JsonError::unsupported("test", "not a sequence")),
        }
    }

    fn boxed(values: &[i32]) -> Vec<Box<dyn Reflect>> {
        values
            .iter()
            .map(|v| Box::new(*v) as Box<dyn Reflect>)
            .collect()
    }

    #[test]
    fn test_vec_views_bytes() {
        let bytes = vec![1_u8, 2, 3];
        assert!(matches!(bytes.view(), View::Bytes(b) if b == [1, 2, 3]));

        let ints = vec![1_i32, 2];
        assert!(matches!(ints.view(), View::Sequence(_)));
    }

    #[test]
    fn test_option_sees_through() {
        let some: Option<i32> = Some(5);
        let none: Option<i32> = None;
        assert_eq!(some.handle(), TypeHandle::of::<i32>());
        assert_eq!(none.handle(), TypeHandle::of::<Option<i32>>());
        assert!(matches!(none.view(), View::Null));
        assert_eq!(some.as_any().downcast_ref::<i32>(), Some(&5));
    }

    #[test]
    fn test_build_sequences() {
        let vec: Vec<i32> = build_sequence(boxed(&[1, 2, 3])).unwrap();
        assert_eq!(vec, vec![1, 2, 3]);

        let set: BTreeSet<i32> = build_sequence(boxed(&[3, 1, 3])).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 3]);

        let array: [i32; 2] = build_sequence(boxed(&[4, 5])).unwrap();
        assert_eq!(array, [4, 5]);

        let err = build_sequence::<[i32; 2]>(boxed(&[4])).unwrap_err();
        assert_eq!(err.code(), 203);
    }

    #[test]
    fn test_build_sequence_rejects_wrong_element() {
        let items: Vec<Box<dyn Reflect>> = vec![Box::new(String::from("x"))];
        assert!(build_sequence::<Vec<i32>>(items).is_err());
    }

    #[test]
    fn test_map_shape() {
        match <HashMap<String, i32>>::shape() {
            Shape::Map(shape) => {
                assert!(shape.is_string_keyed());
                let built = (shape.build)(vec![(
                    Box::new(String::from("a")) as Box<dyn Reflect>,
                    Box::new(1_i32) as Box<dyn Reflect>,
                )])
                .unwrap();
                let map = downcast_box::<HashMap<String, i32>>(built).unwrap();
                assert_eq!(map.get("a"), Some(&1));
            }
            _ => panic!("expected a map shape"),
        }
        match <BTreeMap<i32, i32>>::shape() {
            Shape::Map(shape) => assert!(!shape.is_string_keyed()),
            _ => panic!("expected a map shape"),
        }
    }

    #[test]
    fn test_date_default() {
        let date = DateTime::default();
        assert_eq!(date.wall().to_string(), "0001-01-01 00:00:00");
    }
}
