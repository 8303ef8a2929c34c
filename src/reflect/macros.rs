//! Macros generating [`Reflect`](crate::Reflect) boilerplate for user types.

/// Implement [`Reflect`](crate::Reflect) for object types.
///
/// The [`Typed`](crate::Typed) impl with the member list is written by hand:
///
/// ```
/// use jsonmap::{reflect_object, Member, ObjectShape, Shape, Typed};
///
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// reflect_object!(Point);
///
/// impl Typed for Point {
///     fn shape() -> Shape {
///         ObjectShape::new::<Self>()
///             .member(Member::field("X", |p: &Self| &p.x, |p: &mut Self, v| p.x = v))
///             .member(Member::field("Y", |p: &Self| &p.y, |p: &mut Self, v| p.y = v))
///             .into()
///     }
/// }
///
/// assert_eq!(jsonmap::Json::new().to_json(&Point { x: 1, y: 2 }).unwrap(), r#"{"X":1,"Y":2}"#);
/// ```
#[macro_export]
macro_rules! reflect_object {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Reflect for $ty {
                fn handle(&self) -> $crate::TypeHandle {
                    $crate::TypeHandle::of::<Self>()
                }

                fn view(&self) -> $crate::View<'_> {
                    $crate::View::Object(self)
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                    self
                }

                fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                    self
                }

                fn as_reflect(&self) -> &dyn $crate::Reflect {
                    self
                }
            }
        )+
    };
}

/// Implement [`Reflect`](crate::Reflect) and [`Typed`](crate::Typed) for a
/// fieldless `Clone` enum, written by member name.
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::Reflect for $ty {
            fn handle(&self) -> $crate::TypeHandle {
                $crate::TypeHandle::of::<Self>()
            }

            fn view(&self) -> $crate::View<'_> {
                $crate::View::Enum(match self {
                    $($ty::$variant => stringify!($variant),)+
                })
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }

            fn as_reflect(&self) -> &dyn $crate::Reflect {
                self
            }
        }

        impl $crate::Typed for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::Enum($crate::EnumShape::new(
                    &[$(stringify!($variant)),+],
                    |index| {
                        [$($ty::$variant),+]
                            .into_iter()
                            .nth(index)
                            .map(|value| Box::new(value) as Box<dyn $crate::reflect::Replicate>)
                    },
                ))
            }
        }
    };
}

/// Implement [`Reflect`](crate::Reflect) and [`Typed`](crate::Typed) for a
/// boxed trait object, listing the concrete types it can be built from.
///
/// The trait must have [`Reflect`](crate::Reflect) as a supertrait.
#[macro_export]
macro_rules! reflect_abstract {
    ($object:ty => $($concrete:ty),+ $(,)?) => {
        impl $crate::Reflect for Box<$object> {
            fn handle(&self) -> $crate::TypeHandle {
                $crate::Reflect::handle(&**self)
            }

            fn view(&self) -> $crate::View<'_> {
                $crate::Reflect::view(&**self)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                $crate::Reflect::as_any(&**self)
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                $crate::Reflect::as_any_mut(&mut **self)
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }

            fn as_reflect(&self) -> &dyn $crate::Reflect {
                $crate::Reflect::as_reflect(&**self)
            }
        }

        impl $crate::Typed for Box<$object> {
            fn shape() -> $crate::Shape {
                $crate::Shape::Abstract($crate::AbstractShape::new(|value| {
                    let value = $crate::Reflect::into_any(value);
                    $(
                        let value = match value.downcast::<$concrete>() {
                            Ok(concrete) => {
                                let object: Box<$object> = concrete;
                                return Some(Box::new(object) as Box<dyn $crate::Reflect>);
                            }
                            Err(other) => other,
                        };
                    )+
                    drop(value);
                    None
                }))
            }
        }
    };
}

/// Implement [`Reflect`](crate::Reflect) and [`Typed`](crate::Typed) for a
/// type handled only through a custom type registration.
#[macro_export]
macro_rules! reflect_opaque {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Reflect for $ty {
                fn handle(&self) -> $crate::TypeHandle {
                    $crate::TypeHandle::of::<Self>()
                }

                fn view(&self) -> $crate::View<'_> {
                    $crate::View::Opaque(self)
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                    self
                }

                fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                    self
                }

                fn as_reflect(&self) -> &dyn $crate::Reflect {
                    self
                }
            }

            impl $crate::Typed for $ty {
                fn shape() -> $crate::Shape {
                    $crate::Shape::Opaque
                }
            }
        )+
    };
}
