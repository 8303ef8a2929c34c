//! jsonmap - lazy JSON value tree, object mapper and serializer.
//!
//! Text is parsed into one of two trees: a lazy [`Value`] tree whose scalars
//! convert on demand, or an eager [`Generic`] tree. The object builder maps
//! a [`Value`] onto any type described through [`Typed`], and the serializer
//! writes such types back out. Per-type metadata is computed once and kept
//! in the [`Registry`](registry::Registry) of a [`Json`] context.
//!
//! # Architecture
//!
//! - [`json`] - Tokenizer, parsers, value trees and formatting
//! - [`reflect`] - Type descriptions replacing runtime reflection
//! - [`registry`] - Cached member metadata, custom types and type names
//! - [`builder`] - Value tree to object graph
//! - [`serializer`] - Object graph to JSON text
//! - [`facade`] - The [`Json`] context
//! - [`settings`] - Reader and writer switches
//! - [`time`] - Date and time span values and their wire layouts
//! - [`error`] - Error type with stable numeric codes
//!
//! # Example
//!
//! ```
//! use jsonmap::Json;
//! use std::collections::BTreeMap;
//!
//! let json = Json::new();
//! let map: BTreeMap<i32, i32> = json.read_object(r#"[{"k":1,"v":2},{"k":3,"v":5}]"#).unwrap();
//! assert_eq!(map.get(&3), Some(&5));
//! assert_eq!(json.to_json(&map).unwrap(), r#"[{"k":1,"v":2},{"k":3,"v":5}]"#);
//! ```

// Bad input must surface as an error, never a panic.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod facade;
pub mod json;
pub mod reflect;
pub mod registry;
pub mod serializer;
pub mod settings;
pub mod time;

// Re-export commonly used types
pub use error::{JsonError, JsonResult};
pub use facade::Json;
pub use json::{Generic, Value};
pub use reflect::shape::Contract;
pub use reflect::{
    AbstractShape, EnumShape, FieldRef, Member, ObjectShape, Reflect, Shape, TypeHandle, Typed, View,
};
pub use registry::{
    ContractTypeNames, CustomType, CustomTypeSerializer, QualifiedTypeNames, SerializationInfo,
    TypeNameStrategy,
};
pub use settings::{MemberSelection, Settings};
pub use time::{DateOptions, DateTime, DateTimeKind, TimeSpan};
