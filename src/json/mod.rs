//! JSON text layer: tokenizer, parsers, value trees and output formatting.
//!
//! # Architecture
//!
//! - [`lexer`] - Tokenizer with one-token lookahead and bulk string copies
//! - [`parser`] - Recursive descent parser feeding a pluggable tree sink
//! - [`types`] - Lazy value tree ([`Value`], [`Array`], [`Object`])
//! - [`primitive`] - Raw scalars with cached on-demand conversion
//! - [`hybrid`] - Eager generic tree ([`Generic`])
//! - [`format`] - String escaping and pretty printing
//!
//! # Example
//!
//! ```
//! use jsonmap::json::{parse, Value};
//!
//! let value = parse(r#"{"when":"1955-03-04 10:22:33","n":5}"#).unwrap().unwrap();
//! let n: i32 = value.get("n").and_then(Value::as_primitive).unwrap().try_convert_to().unwrap();
//! assert_eq!(n, 5);
//! ```

pub mod format;
pub mod hybrid;
pub mod lexer;
pub mod parser;
pub mod primitive;
pub mod types;

pub use format::beautify;
pub use hybrid::{parse_generic, Generic};
pub use lexer::{Token, Tokenizer};
pub use parser::{parse, parse_array};
pub use primitive::{Primitive, PrimitiveTarget};
pub use types::{Array, Object, Value, TYPE_KEY};
