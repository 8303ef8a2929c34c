//! Lazily converted JSON scalars.
//!
//! A [`Primitive`] keeps the raw text of a string or number token (or a
//! boolean literal) and converts on demand. The first conversion to a given
//! target type, under given date options, is cached so repeated reads and
//! repeated custom deserializer calls happen once per node.

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{JsonError, JsonResult};
use crate::reflect::{downcast_box, EnumShape, PrimitiveKind, Reflect, Replicate, TypeHandle};
use crate::time::{DateOptions, DateTime, TimeSpan};

/// Guid text longer than this is read in canonical form, anything shorter
/// as base64 of the 16 bytes.
const GUID_TEXT_THRESHOLD: usize = 30;

struct CacheEntry {
    target: TypeId,
    options: DateOptions,
    value: Box<dyn Replicate>,
}

/// A scalar JSON value held as raw text.
pub struct Primitive {
    raw: String,
    boolean: Option<bool>,
    cache: RefCell<Vec<CacheEntry>>,
}

impl Primitive {
    /// Primitive from the raw text of a string or number token.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            boolean: None,
            cache: RefCell::new(Vec::new()),
        }
    }

    /// Primitive from a boolean literal.
    pub fn from_bool(value: bool) -> Self {
        Self {
            raw: if value { "true" } else { "false" }.to_string(),
            boolean: Some(value),
            cache: RefCell::new(Vec::new()),
        }
    }

    /// The raw text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The boolean literal, if this primitive was one.
    pub fn as_bool(&self) -> Option<bool> {
        self.boolean
    }

    /// Whether this primitive came from a boolean literal.
    pub fn is_bool(&self) -> bool {
        self.boolean.is_some()
    }

    /// Parse as `i64`.
    pub fn as_i64(&self) -> JsonResult<i64> {
        self.try_convert_to()
    }

    /// Parse as `f64`.
    pub fn as_f64(&self) -> JsonResult<f64> {
        self.try_convert_to()
    }

    /// Parse as a date with default options.
    pub fn as_datetime(&self) -> JsonResult<DateTime> {
        self.try_convert_to()
    }

    /// Parse as a guid.
    pub fn as_guid(&self) -> JsonResult<Uuid> {
        self.try_convert_to()
    }

    /// Decode as base64 bytes.
    pub fn as_bytes(&self) -> JsonResult<Vec<u8>> {
        self.try_convert_to()
    }

    /// Convert to `T` with default date options.
    pub fn try_convert_to<T: PrimitiveTarget>(&self) -> JsonResult<T> {
        T::from_primitive(self, &DateOptions::default())
    }

    /// Convert to `T`; date targets honor `options`.
    pub fn try_convert_with<T: PrimitiveTarget>(&self, options: &DateOptions) -> JsonResult<T> {
        T::from_primitive(self, options)
    }

    /// Number of cached conversions.
    pub fn cached_conversions(&self) -> usize {
        self.cache.borrow().len()
    }

    fn lookup(&self, target: TypeId, options: &DateOptions) -> Option<Box<dyn Reflect>> {
        self.cache
            .borrow()
            .iter()
            .find(|entry| entry.target == target && entry.options == *options)
            .map(|entry| entry.value.replicate())
    }

    fn store(&self, target: TypeId, options: &DateOptions, value: Box<dyn Replicate>) {
        self.cache.borrow_mut().push(CacheEntry {
            target,
            options: options.clone(),
            value,
        });
    }

    /// Typed cached conversion.
    pub(crate) fn cached<T>(
        &self,
        options: &DateOptions,
        convert: impl FnOnce(&str) -> JsonResult<T>,
    ) -> JsonResult<T>
    where
        T: Reflect + Clone,
    {
        let target = TypeId::of::<T>();
        if let Some(hit) = self.lookup(target, options).and_then(downcast_box::<T>) {
            return Ok(hit);
        }

        tracing::trace!(target_type = std::any::type_name::<T>(), raw = %self.raw, "converting primitive");
        let value = convert(&self.raw)?;
        self.store(target, options, Box::new(value.clone()));
        Ok(value)
    }

    /// Type-erased cached conversion, keyed by the target handle.
    pub(crate) fn cached_erased(
        &self,
        target: TypeHandle,
        options: &DateOptions,
        convert: impl FnOnce(&str) -> JsonResult<Box<dyn Replicate>>,
    ) -> JsonResult<Box<dyn Reflect>> {
        if let Some(hit) = self.lookup(target.id(), options) {
            return Ok(hit);
        }

        tracing::trace!(target_type = target.name(), raw = %self.raw, "converting primitive");
        let value = convert(&self.raw)?;
        let result = value.replicate();
        self.store(target.id(), options, value);
        Ok(result)
    }

    /// Convert to a built-in scalar kind.
    pub(crate) fn convert_kind(
        &self,
        kind: PrimitiveKind,
        options: &DateOptions,
    ) -> JsonResult<Box<dyn Reflect>> {
        fn boxed<T: Reflect>(value: T) -> Box<dyn Reflect> {
            Box::new(value)
        }

        Ok(match kind {
            PrimitiveKind::Bool => boxed(self.try_convert_with::<bool>(options)?),
            PrimitiveKind::Char => boxed(self.try_convert_with::<char>(options)?),
            PrimitiveKind::String => boxed(self.try_convert_with::<String>(options)?),
            PrimitiveKind::I8 => boxed(self.try_convert_with::<i8>(options)?),
            PrimitiveKind::I16 => boxed(self.try_convert_with::<i16>(options)?),
            PrimitiveKind::I32 => boxed(self.try_convert_with::<i32>(options)?),
            PrimitiveKind::I64 => boxed(self.try_convert_with::<i64>(options)?),
            PrimitiveKind::U8 => boxed(self.try_convert_with::<u8>(options)?),
            PrimitiveKind::U16 => boxed(self.try_convert_with::<u16>(options)?),
            PrimitiveKind::U32 => boxed(self.try_convert_with::<u32>(options)?),
            PrimitiveKind::U64 => boxed(self.try_convert_with::<u64>(options)?),
            PrimitiveKind::F32 => boxed(self.try_convert_with::<f32>(options)?),
            PrimitiveKind::F64 => boxed(self.try_convert_with::<f64>(options)?),
            PrimitiveKind::Decimal => boxed(self.try_convert_with::<Decimal>(options)?),
            PrimitiveKind::DateTime => boxed(self.try_convert_with::<DateTime>(options)?),
            PrimitiveKind::TimeSpan => boxed(self.try_convert_with::<TimeSpan>(options)?),
            PrimitiveKind::Guid => boxed(self.try_convert_with::<Uuid>(options)?),
        })
    }

    /// Convert to an enum member by case-insensitive name.
    pub(crate) fn convert_enum(
        &self,
        target: TypeHandle,
        shape: &EnumShape,
    ) -> JsonResult<Box<dyn Reflect>> {
        self.cached_erased(target, &DateOptions::default(), |raw| {
            shape
                .index_of(raw)
                .and_then(shape.from_index)
                .ok_or_else(|| JsonError::UnknownEnumMember {
                    name: raw.to_string(),
                    enum_name: target.name(),
                })
        })
    }
}

impl Clone for Primitive {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            boolean: self.boolean,
            cache: RefCell::new(Vec::new()),
        }
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.boolean == other.boolean
    }
}

impl Eq for Primitive {}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.boolean {
            Some(value) => write!(f, "Primitive({})", value),
            None => write!(f, "Primitive({:?})", self.raw),
        }
    }
}

/// A type a [`Primitive`] can convert into.
pub trait PrimitiveTarget: Sized {
    /// Convert the primitive, honoring date options where they apply.
    fn from_primitive(primitive: &Primitive, options: &DateOptions) -> JsonResult<Self>;
}

fn reject_bool<T>(primitive: &Primitive) -> JsonResult<()> {
    if primitive.is_bool() {
        return Err(JsonError::unsupported(
            std::any::type_name::<T>(),
            "boolean literal",
        ));
    }
    Ok(())
}

impl PrimitiveTarget for bool {
    fn from_primitive(primitive: &Primitive, _options: &DateOptions) -> JsonResult<Self> {
        if let Some(value) = primitive.boolean {
            return Ok(value);
        }
        match primitive.raw.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(JsonError::InvalidFormat {
                text: other.to_string(),
                target: "bool",
            }),
        }
    }
}

impl PrimitiveTarget for String {
    fn from_primitive(primitive: &Primitive, _options: &DateOptions) -> JsonResult<Self> {
        Ok(primitive.raw.clone())
    }
}

impl PrimitiveTarget for char {
    fn from_primitive(primitive: &Primitive, _options: &DateOptions) -> JsonResult<Self> {
        reject_bool::<char>(primitive)?;
        let mut chars = primitive.raw.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(ch),
            _ => Err(JsonError::InvalidFormat {
                text: primitive.raw.clone(),
                target: "char",
            }),
        }
    }
}

macro_rules! numeric_target {
    ($($ty:ty),+) => {
        $(
            impl PrimitiveTarget for $ty {
                fn from_primitive(primitive: &Primitive, options: &DateOptions) -> JsonResult<Self> {
                    reject_bool::<$ty>(primitive)?;
                    primitive.cached(options, |raw| {
                        raw.parse::<$ty>().map_err(|_| JsonError::InvalidNumericFormat {
                            text: raw.to_string(),
                            target: stringify!($ty),
                        })
                    })
                }
            }
        )+
    };
}

numeric_target!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl PrimitiveTarget for Decimal {
    fn from_primitive(primitive: &Primitive, options: &DateOptions) -> JsonResult<Self> {
        reject_bool::<Decimal>(primitive)?;
        primitive.cached(options, |raw| {
            Decimal::from_str(raw)
                .or_else(|_| Decimal::from_scientific(raw))
                .map_err(|_| JsonError::InvalidNumericFormat {
                    text: raw.to_string(),
                    target: "Decimal",
                })
        })
    }
}

impl PrimitiveTarget for DateTime {
    fn from_primitive(primitive: &Primitive, options: &DateOptions) -> JsonResult<Self> {
        reject_bool::<DateTime>(primitive)?;
        primitive.cached(options, |raw| DateTime::parse(raw, options))
    }
}

impl PrimitiveTarget for TimeSpan {
    fn from_primitive(primitive: &Primitive, options: &DateOptions) -> JsonResult<Self> {
        reject_bool::<TimeSpan>(primitive)?;
        primitive.cached(options, TimeSpan::parse)
    }
}

impl PrimitiveTarget for Uuid {
    fn from_primitive(primitive: &Primitive, options: &DateOptions) -> JsonResult<Self> {
        reject_bool::<Uuid>(primitive)?;
        primitive.cached(options, parse_guid)
    }
}

impl PrimitiveTarget for Vec<u8> {
    fn from_primitive(primitive: &Primitive, options: &DateOptions) -> JsonResult<Self> {
        reject_bool::<Vec<u8>>(primitive)?;
        primitive.cached(options, decode_base64)
    }
}

impl<T: PrimitiveTarget> PrimitiveTarget for Option<T> {
    fn from_primitive(primitive: &Primitive, options: &DateOptions) -> JsonResult<Self> {
        T::from_primitive(primitive, options).map(Some)
    }
}

/// Canonical text when long enough, otherwise base64 of the 16 bytes in
/// mixed-endian field order.
fn parse_guid(raw: &str) -> JsonResult<Uuid> {
    let invalid = || JsonError::InvalidFormat {
        text: raw.to_string(),
        target: "Guid",
    };

    if raw.len() > GUID_TEXT_THRESHOLD {
        return Uuid::parse_str(raw).map_err(|_| invalid());
    }

    let bytes = STANDARD.decode(raw).map_err(|_| invalid())?;
    let bytes: [u8; 16] = bytes.try_into().map_err(|_| invalid())?;
    Ok(Uuid::from_bytes_le(bytes))
}

pub(crate) fn decode_base64(raw: &str) -> JsonResult<Vec<u8>> {
    STANDARD.decode(raw).map_err(|_| JsonError::InvalidFormat {
        text: raw.to_string(),
        target: "base64",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::DateTimeKind;

    #[test]
    fn test_numeric_conversion() {
        let primitive = Primitive::from_raw("42");
        assert_eq!(primitive.try_convert_to::<i32>().unwrap(), 42);
        assert_eq!(primitive.try_convert_to::<u8>().unwrap(), 42);
        assert_eq!(primitive.try_convert_to::<f64>().unwrap(), 42.0);
        assert_eq!(primitive.try_convert_to::<String>().unwrap(), "42");
    }

    #[test]
    fn test_numeric_failure_names_target() {
        let primitive = Primitive::from_raw("12.5");
        match primitive.try_convert_to::<i32>() {
            Err(JsonError::InvalidNumericFormat { text, target }) => {
                assert_eq!(text, "12.5");
                assert_eq!(target, "i32");
            }
            other => panic!("expected InvalidNumericFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_conversion_is_cached_per_target() {
        let primitive = Primitive::from_raw("7");
        assert_eq!(primitive.try_convert_to::<i64>().unwrap(), 7);
        assert_eq!(primitive.try_convert_to::<i64>().unwrap(), 7);
        assert_eq!(primitive.cached_conversions(), 1);
        assert_eq!(primitive.try_convert_to::<f32>().unwrap(), 7.0);
        assert_eq!(primitive.cached_conversions(), 2);
    }

    #[test]
    fn test_clone_drops_cache() {
        let primitive = Primitive::from_raw("7");
        primitive.try_convert_to::<i64>().unwrap();
        let copy = primitive.clone();
        assert_eq!(copy.cached_conversions(), 0);
        assert_eq!(copy, primitive);
    }

    #[test]
    fn test_bool_conversion() {
        assert!(Primitive::from_bool(true).try_convert_to::<bool>().unwrap());
        assert!(!Primitive::from_raw("false").try_convert_to::<bool>().unwrap());
        assert!(Primitive::from_raw("yes").try_convert_to::<bool>().is_err());
        assert_eq!(
            Primitive::from_bool(true).try_convert_to::<i32>().unwrap_err().code(),
            203
        );
    }

    #[test]
    fn test_decimal_accepts_exponent() {
        let value: Decimal = Primitive::from_raw("1.5e2").try_convert_to().unwrap();
        assert_eq!(value, Decimal::from(150));
        let value: Decimal = Primitive::from_raw("0.1").try_convert_to().unwrap();
        assert_eq!(value.to_string(), "0.1");
    }

    #[test]
    fn test_guid_forms() {
        let guid = Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
        let canonical = Primitive::from_raw("00112233-4455-6677-8899-aabbccddeeff");
        assert_eq!(canonical.try_convert_to::<Uuid>().unwrap(), guid);

        let compact = STANDARD.encode(guid.to_bytes_le());
        assert_eq!(compact.len(), 24);
        assert_eq!(Primitive::from_raw(compact).try_convert_to::<Uuid>().unwrap(), guid);

        assert!(Primitive::from_raw("AQID").try_convert_to::<Uuid>().is_err());
    }

    #[test]
    fn test_bytes() {
        let bytes: Vec<u8> = Primitive::from_raw("AQID").try_convert_to().unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_date_cache_respects_options() {
        let primitive = Primitive::from_raw("1955-03-04 10:22:33");
        let plain: DateTime = primitive.try_convert_to().unwrap();
        let utc: DateTime = primitive
            .try_convert_with(&DateOptions::kind(DateTimeKind::Utc))
            .unwrap();
        assert_eq!(plain.kind(), DateTimeKind::Unspecified);
        assert_eq!(utc.kind(), DateTimeKind::Utc);
        assert_eq!(primitive.cached_conversions(), 2);
    }

    #[test]
    fn test_enum_conversion() {
        #[derive(Debug, Clone, Copy, PartialEq)]
        enum Color {
            Red,
            Green,
        }
        crate::reflect_enum!(Color { Red, Green });

        let shape = match <Color as crate::Typed>::shape() {
            crate::Shape::Enum(shape) => shape,
            _ => panic!("expected enum shape"),
        };
        let handle = TypeHandle::of::<Color>();

        let built = Primitive::from_raw("green").convert_enum(handle, &shape).unwrap();
        assert_eq!(downcast_box::<Color>(built), Some(Color::Green));
        let _ = Color::Red;

        let err = Primitive::from_raw("Blue").convert_enum(handle, &shape).err().unwrap();
        assert_eq!(err.code(), 202);
    }
}
