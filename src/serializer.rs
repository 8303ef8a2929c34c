//! Object graph to JSON text.
//!
//! # Dispatch
//!
//! Scalars are written straight from their [`View`]. Every other runtime
//! type gets a [`WriteStrategy`] chosen once and cached in the registry:
//! custom handler, object, sequence, byte array, string-keyed map, general
//! map, enum, or opaque (an error, since only a custom handler can write it).
//!
//! # Objects
//!
//! Objects are written member by member in declaration order, preceded by a
//! `$type` tag when type extension is on. A type with no readable member is
//! an error rather than `{}`. Nesting deeper than `max_depth` objects is an
//! error; this is the only cycle protection.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use uuid::Uuid;

use crate::error::{JsonError, JsonResult};
use crate::json::format::write_string;
use crate::json::TYPE_KEY;
use crate::reflect::{Reflect, Shape, TypeHandle, View};
use crate::registry::custom::SerializeFn;
use crate::registry::Registry;
use crate::settings::Settings;
use crate::time::{DateOptions, DateTime};

/// How values of one runtime type are written.
#[derive(Clone)]
pub enum WriteStrategy {
    /// Registered custom serializer, output quoted verbatim.
    Custom(SerializeFn),
    /// Members through the registry's getters.
    Object,
    /// JSON array of the elements.
    Sequence,
    /// Base64 string.
    Bytes,
    /// JSON object keyed by the map's string keys.
    StringMap,
    /// JSON array of `{"k":..,"v":..}` pairs.
    PairMap,
    /// Member name as a string.
    Enum,
    /// Cannot be written without a custom serializer.
    Opaque,
}

impl WriteStrategy {
    /// Short label for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            WriteStrategy::Custom(_) => "custom",
            WriteStrategy::Object => "object",
            WriteStrategy::Sequence => "sequence",
            WriteStrategy::Bytes => "bytes",
            WriteStrategy::StringMap => "string map",
            WriteStrategy::PairMap => "pair map",
            WriteStrategy::Enum => "enum",
            WriteStrategy::Opaque => "opaque",
        }
    }
}

/// Writes one value graph into a string.
pub struct Serializer<'a> {
    registry: &'a Registry,
    settings: &'a Settings,
    output: String,
    depth: usize,
}

impl<'a> Serializer<'a> {
    /// Serializer bound to a registry and settings.
    pub fn new(registry: &'a Registry, settings: &'a Settings) -> Self {
        Self {
            registry,
            settings,
            output: String::new(),
            depth: 0,
        }
    }

    /// Serialize `value` to compact JSON.
    pub fn serialize(mut self, value: &dyn Reflect) -> JsonResult<String> {
        self.write_value(value, None)?;
        Ok(self.output)
    }

    fn write_value(&mut self, value: &dyn Reflect, date: Option<&DateOptions>) -> JsonResult<()> {
        match value.view() {
            View::Null => self.output.push_str("null"),
            View::Str(text) => write_string(text, &mut self.output),
            View::Char(ch) => {
                let mut buffer = [0_u8; 4];
                write_string(ch.encode_utf8(&mut buffer), &mut self.output);
            }
            View::Guid(guid) => self.write_guid(guid),
            View::Bool(flag) => self.output.push_str(if flag { "true" } else { "false" }),
            View::Signed(number) => self.write_display(number),
            View::Unsigned(number) => self.write_display(number),
            View::Float(number) => self.write_finite(number, number.is_finite(), "f32")?,
            View::Double(number) => self.write_finite(number, number.is_finite(), "f64")?,
            View::Decimal(number) => self.write_display(number),
            View::DateTime(date_time) => self.write_date(date_time, date)?,
            View::TimeSpan(span) => {
                self.output.push('"');
                span.write_wire(&mut self.output);
                self.output.push('"');
            }
            view => self.write_composite(value, view)?,
        }
        Ok(())
    }

    /// JSON has no NaN or infinity literals.
    fn write_finite(
        &mut self,
        number: impl std::fmt::Display,
        finite: bool,
        target: &'static str,
    ) -> JsonResult<()> {
        if !finite {
            return Err(JsonError::unsupported(target, format!("{} is not a JSON number", number)));
        }
        self.write_display(number);
        Ok(())
    }

    fn write_display(&mut self, value: impl std::fmt::Display) {
        // Writing into a String cannot fail.
        let _ = write!(self.output, "{}", value);
    }

    /// Quote without escaping; used for names and custom output.
    fn write_fast(&mut self, text: &str) {
        self.output.push('"');
        self.output.push_str(text);
        self.output.push('"');
    }

    fn write_guid(&mut self, guid: Uuid) {
        if self.settings.use_fast_guid {
            let encoded = STANDARD.encode(guid.to_bytes_le());
            self.write_fast(&encoded);
        } else {
            let mut buffer = Uuid::encode_buffer();
            let text = guid.hyphenated().encode_lower(&mut buffer);
            self.output.push('"');
            self.output.push_str(text);
            self.output.push('"');
        }
    }

    fn write_date(&mut self, value: DateTime, options: Option<&DateOptions>) -> JsonResult<()> {
        self.output.push('"');
        match options.and_then(|options| options.format.as_deref()) {
            Some(format) => value.write_formatted(format, &mut self.output)?,
            None => value.write_wire(self.settings.use_utc_datetime, &mut self.output),
        }
        self.output.push('"');
        Ok(())
    }

    fn choose_strategy(&self, handle: TypeHandle, view: &View<'_>) -> WriteStrategy {
        if let Some(serialize) = self
            .registry
            .custom_entry(handle)
            .and_then(|entry| entry.serialize)
        {
            return WriteStrategy::Custom(serialize);
        }

        match view {
            View::Bytes(_) => WriteStrategy::Bytes,
            View::Sequence(_) => WriteStrategy::Sequence,
            View::Map(_) => match &*self.registry.shape(handle) {
                Shape::Map(map) if !map.is_string_keyed() => WriteStrategy::PairMap,
                _ => WriteStrategy::StringMap,
            },
            View::Enum(_) => WriteStrategy::Enum,
            View::Object(_) => WriteStrategy::Object,
            _ => WriteStrategy::Opaque,
        }
    }

    fn write_composite(&mut self, value: &dyn Reflect, view: View<'_>) -> JsonResult<()> {
        let handle = value.handle();
        let strategy = self
            .registry
            .write_strategy(handle, || Ok(self.choose_strategy(handle, &view)))?;

        match (strategy, view) {
            (WriteStrategy::Custom(serialize), _) => {
                let text = serialize(value.as_any()).ok_or_else(|| {
                    JsonError::unsupported(handle.name(), "custom serializer received another type")
                })?;
                self.write_fast(&text);
            }
            (WriteStrategy::Object, _) => self.write_object(value, handle)?,
            (WriteStrategy::Bytes, View::Bytes(bytes)) => {
                let encoded = STANDARD.encode(bytes);
                self.write_fast(&encoded);
            }
            (WriteStrategy::Sequence, View::Sequence(items)) => {
                self.output.push('[');
                for (index, item) in items.enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.write_value(item, None)?;
                }
                self.output.push(']');
            }
            (WriteStrategy::StringMap, View::Map(entries)) => {
                self.output.push('{');
                let mut written = 0;
                for (key, item) in entries {
                    let View::Str(key) = key.view() else {
                        return Err(JsonError::unsupported(handle.name(), "map key is not a string"));
                    };
                    if !self.settings.serialize_null_values && matches!(item.view(), View::Null) {
                        continue;
                    }
                    if written > 0 {
                        self.output.push(',');
                    }
                    write_string(key, &mut self.output);
                    self.output.push(':');
                    self.write_value(item, None)?;
                    written += 1;
                }
                self.output.push('}');
            }
            (WriteStrategy::PairMap, View::Map(entries)) => {
                self.output.push('[');
                for (index, (key, item)) in entries.enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.output.push_str("{\"k\":");
                    self.write_value(key, None)?;
                    self.output.push_str(",\"v\":");
                    self.write_value(item, None)?;
                    self.output.push('}');
                }
                self.output.push(']');
            }
            (WriteStrategy::Enum, View::Enum(name)) => self.write_fast(name),
            (WriteStrategy::Opaque, _) => {
                return Err(JsonError::unsupported(
                    handle.name(),
                    "no custom serializer is registered for this type",
                ))
            }
            (strategy, view) => {
                return Err(JsonError::unsupported(
                    handle.name(),
                    format!("{} strategy cannot write a {} value", strategy.label(), view.label()),
                ))
            }
        }
        Ok(())
    }

    fn write_object(&mut self, value: &dyn Reflect, handle: TypeHandle) -> JsonResult<()> {
        self.output.push('{');
        self.depth += 1;
        if self.depth > self.settings.max_depth {
            return Err(JsonError::MaxDepthExceeded {
                max_depth: self.settings.max_depth,
            });
        }

        let getters = self.registry.getters(handle)?;
        if getters.is_empty() {
            return Err(JsonError::EmptyObjectSerialization {
                type_name: handle.name(),
            });
        }

        let mut written = 0;
        if self.settings.use_type_extension {
            let name = self.registry.type_names().name_for(handle)?;
            self.write_fast(TYPE_KEY);
            self.output.push(':');
            self.write_fast(&name);
            written += 1;
        }

        for descriptor in getters.iter() {
            let Some(member) = descriptor.get(value) else {
                continue;
            };
            if !self.settings.serialize_null_values && descriptor.is_default_value(&*member) {
                continue;
            }
            if written > 0 {
                self.output.push(',');
            }
            self.write_fast(descriptor.wire_name);
            self.output.push(':');
            self.write_value(&*member, Some(&descriptor.date))?;
            written += 1;
        }

        self.output.push('}');
        self.depth -= 1;
        Ok(())
    }
}
