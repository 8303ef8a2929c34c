//! Error handling for jsonmap.
//!
//! Every failure is local and synchronous: a failed parse, build or
//! serialization yields no partial value. Each variant carries a stable
//! numeric code so callers (and the CLI) can report failures uniformly.
//!
//! # Code ranges
//!
//! - 1xx: text errors raised by the tokenizer and parsers
//! - 2xx: primitive conversion errors
//! - 3xx: registry configuration errors
//! - 4xx: object construction and population errors
//! - 5xx: serialization errors

use thiserror::Error;

/// All errors produced by jsonmap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum JsonError {
    /// The tokenizer met an unrecognized character or ran out of input (code 100).
    #[error("malformed input at offset {offset}: {reason}")]
    MalformedInput {
        /// Byte offset of the failure.
        offset: usize,
        /// What was wrong.
        reason: String,
    },

    /// An object key was not followed by `:` (code 101).
    #[error("expected colon at offset {offset}")]
    ExpectedColon {
        /// Byte offset of the token found instead.
        offset: usize,
    },

    /// A token appeared where the grammar does not allow it (code 102).
    #[error("unexpected token {found} at offset {offset}")]
    UnexpectedToken {
        /// Byte offset of the token.
        offset: usize,
        /// Description of the token found.
        found: String,
    },

    /// Numeric text could not be parsed into the requested type (code 200).
    #[error("invalid numeric format: {text:?} is not a valid {target}")]
    InvalidNumericFormat {
        /// The raw text.
        text: String,
        /// The requested numeric type.
        target: &'static str,
    },

    /// Textual value (date, time span, guid, base64) could not be parsed (code 201).
    #[error("invalid format: {text:?} is not a valid {target}")]
    InvalidFormat {
        /// The raw text.
        text: String,
        /// The requested type.
        target: &'static str,
    },

    /// No enum member matches the given name (code 202).
    #[error("unknown member {name:?} for enum {enum_name}")]
    UnknownEnumMember {
        /// The name read from JSON.
        name: String,
        /// The enum type.
        enum_name: &'static str,
    },

    /// The value cannot be converted to the requested type (code 203).
    #[error("unsupported conversion to {target}: {detail}")]
    UnsupportedConversion {
        /// The requested type.
        target: &'static str,
        /// Why the conversion is not possible.
        detail: String,
    },

    /// Two members of one type resolve to the same wire name (code 300).
    #[error("the wire name {name:?} is already used on type {type_name}")]
    DuplicateWireName {
        /// The conflicting wire name.
        name: String,
        /// The declaring type.
        type_name: &'static str,
    },

    /// Custom handlers cannot replace built-in primitive or collection kinds (code 301).
    #[error("cannot register a custom handler for built-in type {type_name}")]
    CannotOverrideBuiltinType {
        /// The rejected type.
        type_name: &'static str,
    },

    /// A custom type registration has neither serializer nor deserializer (code 302).
    #[error("custom type {type_name} needs a serializer or a deserializer")]
    InvalidCustomType {
        /// The rejected type.
        type_name: &'static str,
    },

    /// A type name or a type is already bound differently (code 303).
    #[error("type name {name:?} conflicts with an existing registration for {type_name}")]
    TypeNameConflict {
        /// The requested name.
        name: String,
        /// The type involved.
        type_name: &'static str,
    },

    /// The type has no default constructor (code 400).
    #[error("type {type_name} has no default constructor")]
    NoDefaultConstructor {
        /// The type that could not be created.
        type_name: &'static str,
    },

    /// Abstract types cannot be instantiated without a concrete type tag (code 401).
    #[error("cannot construct abstract type {type_name}")]
    CannotConstructAbstractType {
        /// The abstract type.
        type_name: &'static str,
    },

    /// An untyped read found no resolvable `$type` tag on the root (code 402).
    #[error("cannot determine the root type: {detail}")]
    AmbiguousRootType {
        /// What was found at the root.
        detail: String,
    },

    /// The member has no setter (code 403).
    #[error("member {member} of {type_name} is not writable")]
    NotWritable {
        /// The member name.
        member: String,
        /// The declaring type.
        type_name: &'static str,
    },

    /// The type has no readable members to emit (code 500).
    #[error("type {type_name} has no serializable members")]
    EmptyObjectSerialization {
        /// The offending type.
        type_name: &'static str,
    },

    /// The serializer nested deeper than the configured maximum (code 501).
    #[error("maximum serialization depth {max_depth} exceeded")]
    MaxDepthExceeded {
        /// The configured maximum.
        max_depth: usize,
    },
}

impl JsonError {
    /// Get the numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            JsonError::MalformedInput { .. } => 100,
            JsonError::ExpectedColon { .. } => 101,
            JsonError::UnexpectedToken { .. } => 102,
            JsonError::InvalidNumericFormat { .. } => 200,
            JsonError::InvalidFormat { .. } => 201,
            JsonError::UnknownEnumMember { .. } => 202,
            JsonError::UnsupportedConversion { .. } => 203,
            JsonError::DuplicateWireName { .. } => 300,
            JsonError::CannotOverrideBuiltinType { .. } => 301,
            JsonError::InvalidCustomType { .. } => 302,
            JsonError::TypeNameConflict { .. } => 303,
            JsonError::NoDefaultConstructor { .. } => 400,
            JsonError::CannotConstructAbstractType { .. } => 401,
            JsonError::AmbiguousRootType { .. } => 402,
            JsonError::NotWritable { .. } => 403,
            JsonError::EmptyObjectSerialization { .. } => 500,
            JsonError::MaxDepthExceeded { .. } => 501,
        }
    }

    /// Get the error name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            JsonError::MalformedInput { .. } => "MalformedInput",
            JsonError::ExpectedColon { .. } => "ExpectedColon",
            JsonError::UnexpectedToken { .. } => "UnexpectedToken",
            JsonError::InvalidNumericFormat { .. } => "InvalidNumericFormat",
            JsonError::InvalidFormat { .. } => "InvalidFormat",
            JsonError::UnknownEnumMember { .. } => "UnknownEnumMember",
            JsonError::UnsupportedConversion { .. } => "UnsupportedConversion",
            JsonError::DuplicateWireName { .. } => "DuplicateWireName",
            JsonError::CannotOverrideBuiltinType { .. } => "CannotOverrideBuiltinType",
            JsonError::InvalidCustomType { .. } => "InvalidCustomType",
            JsonError::TypeNameConflict { .. } => "TypeNameConflict",
            JsonError::NoDefaultConstructor { .. } => "NoDefaultConstructor",
            JsonError::CannotConstructAbstractType { .. } => "CannotConstructAbstractType",
            JsonError::AmbiguousRootType { .. } => "AmbiguousRootType",
            JsonError::NotWritable { .. } => "NotWritable",
            JsonError::EmptyObjectSerialization { .. } => "EmptyObjectSerialization",
            JsonError::MaxDepthExceeded { .. } => "MaxDepthExceeded",
        }
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        JsonError::MalformedInput {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(target: &'static str, detail: impl Into<String>) -> Self {
        JsonError::UnsupportedConversion {
            target,
            detail: detail.into(),
        }
    }
}

/// Result type for jsonmap operations.
pub type JsonResult<T> = Result<T, JsonError>;
