//! Recursive descent JSON parser.
//!
//! One grammar drives every tree shape: the parser reads tokens and hands
//! scalars and finished containers to a [`TreeSink`], which decides what the
//! nodes look like. [`ValueSink`] builds the lazy [`Value`] tree; the hybrid
//! sink in [`super::hybrid`] builds eager generic containers.
//!
//! # Requirements
//!
//! - Object keys must be strings followed by `:`
//! - Duplicate keys overwrite the earlier value
//! - Only whitespace may follow the root value

use indexmap::IndexMap;

use super::lexer::{Token, Tokenizer};
use super::primitive::Primitive;
use super::types::{Array, Object, Value};
use crate::error::{JsonError, JsonResult};

/// Receives parsed nodes and assembles a tree.
pub trait TreeSink {
    /// Node type produced for every value, nulls included.
    type Node;

    /// The `null` literal.
    fn null(&mut self) -> Self::Node;

    /// A boolean literal.
    fn boolean(&mut self, value: bool) -> Self::Node;

    /// An unescaped string.
    fn string(&mut self, value: String) -> Self::Node;

    /// The raw text of a number.
    fn number(&mut self, span: &str) -> JsonResult<Self::Node>;

    /// A finished array.
    fn array(&mut self, items: Vec<Self::Node>) -> Self::Node;

    /// A finished object, keys in first-seen order.
    fn object(&mut self, members: IndexMap<String, Self::Node>) -> Self::Node;
}

/// Sink building the lazy [`Value`] tree; `None` stands for null.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueSink;

impl TreeSink for ValueSink {
    type Node = Option<Value>;

    fn null(&mut self) -> Self::Node {
        None
    }

    fn boolean(&mut self, value: bool) -> Self::Node {
        Some(Value::Primitive(Primitive::from_bool(value)))
    }

    fn string(&mut self, value: String) -> Self::Node {
        Some(Value::Primitive(Primitive::from_raw(value)))
    }

    fn number(&mut self, span: &str) -> JsonResult<Self::Node> {
        Ok(Some(Value::Primitive(Primitive::from_raw(span))))
    }

    fn array(&mut self, items: Vec<Self::Node>) -> Self::Node {
        Some(Value::Array(items.into_iter().collect()))
    }

    fn object(&mut self, members: IndexMap<String, Self::Node>) -> Self::Node {
        let mut object = Object::new();
        for (key, value) in members {
            object.insert(key, value);
        }
        Some(Value::Object(object))
    }
}

/// JSON parser feeding a [`TreeSink`].
pub struct Parser<'a, S> {
    tokenizer: Tokenizer<'a>,
    sink: S,
}

impl<'a, S: TreeSink> Parser<'a, S> {
    /// Create a new parser for the given input.
    pub fn new(input: &'a str, sink: S) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            sink,
        }
    }

    /// Parse the whole input as one value.
    pub fn parse(&mut self) -> JsonResult<S::Node> {
        let value = self.parse_value()?;

        // Ensure no trailing content
        if !self.tokenizer.at_end() {
            let token = self.tokenizer.peek()?;
            return Err(self.tokenizer.unexpected(token));
        }

        Ok(value)
    }

    fn parse_value(&mut self) -> JsonResult<S::Node> {
        match self.tokenizer.peek()? {
            Token::Null => {
                self.tokenizer.next()?;
                Ok(self.sink.null())
            }
            Token::True => {
                self.tokenizer.next()?;
                Ok(self.sink.boolean(true))
            }
            Token::False => {
                self.tokenizer.next()?;
                Ok(self.sink.boolean(false))
            }
            Token::String => {
                let value = self.tokenizer.read_string()?;
                Ok(self.sink.string(value))
            }
            Token::Number => {
                let span = self.tokenizer.read_number_span()?;
                self.sink.number(span)
            }
            Token::LeftBracket => self.parse_array(),
            Token::LeftBrace => self.parse_object(),
            token => Err(self.tokenizer.unexpected(token)),
        }
    }

    fn parse_object(&mut self) -> JsonResult<S::Node> {
        self.tokenizer.expect(Token::LeftBrace)?;
        let mut members = IndexMap::new();

        // Empty object
        if self.tokenizer.peek()? == Token::RightBrace {
            self.tokenizer.next()?;
            return Ok(self.sink.object(members));
        }

        loop {
            // Key must be a string
            let token = self.tokenizer.peek()?;
            if token != Token::String {
                return Err(self.tokenizer.unexpected(token));
            }
            let key = self.tokenizer.read_string()?;

            if self.tokenizer.peek()? != Token::Colon {
                return Err(JsonError::ExpectedColon {
                    offset: self.tokenizer.offset(),
                });
            }
            self.tokenizer.next()?;

            let value = self.parse_value()?;
            members.insert(key, value);

            match self.tokenizer.peek()? {
                Token::Comma => self.tokenizer.next()?,
                Token::RightBrace => {
                    self.tokenizer.next()?;
                    break;
                }
                token => return Err(self.tokenizer.unexpected(token)),
            };
        }

        Ok(self.sink.object(members))
    }

    fn parse_array(&mut self) -> JsonResult<S::Node> {
        self.tokenizer.expect(Token::LeftBracket)?;
        let mut items = Vec::new();

        // Empty array
        if self.tokenizer.peek()? == Token::RightBracket {
            self.tokenizer.next()?;
            return Ok(self.sink.array(items));
        }

        loop {
            items.push(self.parse_value()?);

            match self.tokenizer.peek()? {
                Token::Comma => self.tokenizer.next()?,
                Token::RightBracket => {
                    self.tokenizer.next()?;
                    break;
                }
                token => return Err(self.tokenizer.unexpected(token)),
            };
        }

        Ok(self.sink.array(items))
    }
}

/// Parse text into the lazy value tree; `None` when the document is `null`.
pub fn parse(input: &str) -> JsonResult<Option<Value>> {
    Parser::new(input, ValueSink).parse()
}

/// Parse text that must hold an array.
pub fn parse_array(input: &str) -> JsonResult<Array> {
    match parse(input)? {
        Some(Value::Array(array)) => Ok(array),
        other => Err(JsonError::UnexpectedToken {
            offset: 0,
            found: other.as_ref().map_or("null", Value::kind_name).to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_some(input: &str) -> Value {
        match parse(input) {
            Ok(Some(value)) => value,
            other => panic!("expected a value, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_null() {
        assert_eq!(parse("null").unwrap(), None);
        assert_eq!(parse("  null  ").unwrap(), None);
    }

    #[test]
    fn test_parse_booleans() {
        let value = parse_some("true");
        assert_eq!(value.as_primitive().and_then(Primitive::as_bool), Some(true));
        let value = parse_some("false");
        assert_eq!(value.as_primitive().and_then(Primitive::as_bool), Some(false));
    }

    #[test]
    fn test_parse_number_stays_raw() {
        let value = parse_some("-12.50e3");
        assert_eq!(value.as_str(), Some("-12.50e3"));
    }

    #[test]
    fn test_parse_string() {
        let value = parse_some(r#""hello""#);
        assert_eq!(value.as_str(), Some("hello"));
    }

    #[test]
    fn test_parse_array() {
        let value = parse_some("[1, null, \"x\"]");
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(0).and_then(Value::as_str), Some("1"));
        assert!(array.get(1).is_none());
        assert_eq!(array.get(2).and_then(Value::as_str), Some("x"));
    }

    #[test]
    fn test_parse_object() {
        let value = parse_some(r#"{"b": 2, "a": {"c": []}}"#);
        let object = value.as_object().unwrap();
        let keys: Vec<&str> = object.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(value.get("a").and_then(|a| a.get("c")).unwrap().is_array());
    }

    #[test]
    fn test_duplicate_key_overwrites() {
        let value = parse_some(r#"{"a":1,"b":2,"a":3}"#);
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object.get("a").and_then(Value::as_str), Some("3"));
    }

    #[test]
    fn test_missing_colon() {
        match parse(r#"{"a" 1}"#) {
            Err(JsonError::ExpectedColon { offset }) => assert_eq!(offset, 5),
            other => panic!("expected ExpectedColon, got {:?}", other),
        }
    }

    #[test]
    fn test_non_string_key_rejected() {
        assert_eq!(parse("{1:2}").unwrap_err().code(), 102);
    }

    #[test]
    fn test_trailing_content_rejected() {
        assert_eq!(parse("{} {}").unwrap_err().code(), 102);
        assert_eq!(parse("1 2").unwrap_err().code(), 102);
    }

    #[test]
    fn test_trailing_comma_rejected() {
        assert!(parse("[1,]").is_err());
        assert!(parse(r#"{"a":1,}"#).is_err());
    }

    #[test]
    fn test_truncated_input() {
        assert_eq!(parse("[1,").unwrap_err().code(), 100);
        assert_eq!(parse("").unwrap_err().code(), 100);
    }

    #[test]
    fn test_parse_array_helper() {
        assert_eq!(parse_array("[1,2]").unwrap().len(), 2);
        assert!(parse_array("{}").is_err());
    }
}
