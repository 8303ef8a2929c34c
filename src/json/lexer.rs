//! JSON tokenizer.
//!
//! Turns input text into a stream of payload-free tokens with one-token
//! lookahead. String and number payloads are read by the caller right after
//! the corresponding token is peeked.
//!
//! # Rules
//!
//! - Whitespace (space, tab, CR, LF) is skipped between tokens
//! - Numbers start with `[0-9+-.]` and extend greedily over `[0-9eE+-.]`
//! - `true`, `false` and `null` must match exactly
//! - Unescaped runs inside strings are copied in bulk

use std::fmt;

use crate::error::{JsonError, JsonResult};

/// Token kinds produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Left brace `{`
    LeftBrace,
    /// Right brace `}`
    RightBrace,
    /// Left bracket `[`
    LeftBracket,
    /// Right bracket `]`
    RightBracket,
    /// Colon `:`
    Colon,
    /// Comma `,`
    Comma,
    /// Start of a string; read it with [`Tokenizer::read_string`]
    String,
    /// Start of a number; read it with [`Tokenizer::read_number_span`]
    Number,
    /// True literal
    True,
    /// False literal
    False,
    /// Null literal
    Null,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::LeftBrace => "'{'",
            Token::RightBrace => "'}'",
            Token::LeftBracket => "'['",
            Token::RightBracket => "']'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::String => "string",
            Token::Number => "number",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
        };
        f.write_str(text)
    }
}

/// Tokenizer over JSON text.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    lookahead: Option<(Token, usize)>,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            lookahead: None,
        }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Byte offset of the pending token, or the current position.
    pub fn offset(&self) -> usize {
        self.lookahead.map_or(self.pos, |(_, start)| start)
    }

    fn byte(&self, at: usize) -> Option<u8> {
        self.input.as_bytes().get(at).copied()
    }

    /// Skip whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.byte(self.pos) {
            self.pos += 1;
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> JsonResult<Token> {
        if let Some((token, _)) = self.lookahead {
            return Ok(token);
        }

        self.skip_whitespace();
        let start = self.pos;
        let token = match self.byte(start) {
            None => return Err(JsonError::malformed(start, "reached end of input unexpectedly")),
            Some(b'{') => Token::LeftBrace,
            Some(b'}') => Token::RightBrace,
            Some(b'[') => Token::LeftBracket,
            Some(b']') => Token::RightBracket,
            Some(b':') => Token::Colon,
            Some(b',') => Token::Comma,
            Some(b'"') => Token::String,
            Some(b'0'..=b'9' | b'-' | b'+' | b'.') => Token::Number,
            Some(b't') => self.literal(b"true", Token::True)?,
            Some(b'f') => self.literal(b"false", Token::False)?,
            Some(b'n') => self.literal(b"null", Token::Null)?,
            Some(_) => {
                let found = self.input[start..].chars().next().unwrap_or('?');
                return Err(JsonError::malformed(
                    start,
                    format!("unrecognized character {:?}", found),
                ));
            }
        };

        self.lookahead = Some((token, start));
        Ok(token)
    }

    /// Consume and return the next token.
    ///
    /// A `String` or `Number` token is consumed together with its payload,
    /// which is validated and discarded; use [`read_string`](Self::read_string)
    /// or [`read_number_span`](Self::read_number_span) to keep it.
    pub fn next(&mut self) -> JsonResult<Token> {
        let token = self.peek()?;
        match token {
            Token::String => {
                self.read_string()?;
            }
            Token::Number => {
                self.read_number_span()?;
            }
            _ => self.consume(),
        }
        Ok(token)
    }

    /// Consume the next token, which must be `expected`.
    pub fn expect(&mut self, expected: Token) -> JsonResult<()> {
        let token = self.peek()?;
        if token != expected {
            return Err(self.unexpected(token));
        }
        self.consume();
        Ok(())
    }

    /// Error describing `token` at the pending offset.
    pub fn unexpected(&self, token: Token) -> JsonError {
        JsonError::UnexpectedToken {
            offset: self.offset(),
            found: token.to_string(),
        }
    }

    /// Whether only whitespace remains.
    pub fn at_end(&mut self) -> bool {
        if self.lookahead.is_some() {
            return false;
        }
        self.skip_whitespace();
        self.pos >= self.input.len()
    }

    /// Drop the pending token. Payload tokens leave the position at the
    /// start of their payload.
    fn consume(&mut self) {
        if let Some((token, start)) = self.lookahead.take() {
            self.pos = match token {
                Token::Number => start,
                Token::True | Token::Null => start + 4,
                Token::False => start + 5,
                _ => start + 1,
            };
        }
    }

    fn literal(&self, expected: &[u8], token: Token) -> JsonResult<Token> {
        if self.input.as_bytes()[self.pos..].starts_with(expected) {
            Ok(token)
        } else {
            Err(JsonError::malformed(self.pos, format!("expected literal {}", token)))
        }
    }

    /// Read and unescape the next token, which must be a string.
    pub fn read_string(&mut self) -> JsonResult<String> {
        self.expect(Token::String)?;

        let mut result = String::new();
        let mut run_start = self.pos;

        loop {
            match self.byte(self.pos) {
                None => return Err(JsonError::malformed(self.pos, "unterminated string")),
                Some(b'"') => {
                    result.push_str(&self.input[run_start..self.pos]);
                    self.pos += 1;
                    return Ok(result);
                }
                Some(b'\\') => {
                    result.push_str(&self.input[run_start..self.pos]);
                    self.pos += 1;
                    let ch = self.read_escape_sequence()?;
                    result.push(ch);
                    run_start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Read an escape sequence after a backslash.
    fn read_escape_sequence(&mut self) -> JsonResult<char> {
        let at = self.pos;
        let escaped = self
            .byte(at)
            .ok_or_else(|| JsonError::malformed(at, "unterminated escape sequence"))?;
        self.pos += 1;
        match escaped {
            b'"' => Ok('"'),
            b'\\' => Ok('\\'),
            b'/' => Ok('/'),
            b'b' => Ok('\x08'),
            b'f' => Ok('\x0C'),
            b'n' => Ok('\n'),
            b'r' => Ok('\r'),
            b't' => Ok('\t'),
            b'u' => self.read_unicode_escape(),
            _ => Err(JsonError::malformed(at, "unknown escape sequence")),
        }
    }

    /// Read a \uXXXX unicode escape sequence, pairing surrogates.
    fn read_unicode_escape(&mut self) -> JsonResult<char> {
        let start = self.pos;
        let unit = self.read_hex4()?;

        if (0xD800..=0xDBFF).contains(&unit) {
            if self.byte(self.pos) != Some(b'\\') || self.byte(self.pos + 1) != Some(b'u') {
                return Err(JsonError::malformed(start, "unpaired high surrogate"));
            }
            self.pos += 2;
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(JsonError::malformed(start, "invalid low surrogate"));
            }
            let combined = 0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
            return char::from_u32(combined)
                .ok_or_else(|| JsonError::malformed(start, "invalid surrogate pair"));
        }

        char::from_u32(u32::from(unit))
            .ok_or_else(|| JsonError::malformed(start, "unpaired low surrogate"))
    }

    /// Read 4 hex digits and return the value.
    fn read_hex4(&mut self) -> JsonResult<u16> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let at = self.pos;
            let digit = self
                .byte(at)
                .and_then(|b| (b as char).to_digit(16))
                .ok_or_else(|| JsonError::malformed(at, "invalid hex digit in \\u escape"))?;
            self.pos += 1;
            value = (value << 4) | digit as u16;
        }
        Ok(value)
    }

    /// Read the raw text of the next token, which must be a number.
    pub fn read_number_span(&mut self) -> JsonResult<&'a str> {
        self.expect(Token::Number)?;

        let start = self.pos;
        while let Some(b'0'..=b'9' | b'e' | b'E' | b'+' | b'-' | b'.') = self.byte(self.pos) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(JsonError::malformed(start, "expected a number"));
        }
        Ok(&self.input[start..self.pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> JsonResult<Vec<Token>> {
        let mut tokenizer = Tokenizer::new(input);
        let mut tokens = Vec::new();
        while !tokenizer.at_end() {
            let token = tokenizer.peek()?;
            match token {
                Token::String => {
                    tokenizer.read_string()?;
                }
                Token::Number => {
                    tokenizer.read_number_span()?;
                }
                _ => {
                    tokenizer.next()?;
                }
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    #[test]
    fn test_next_consumes_payloads() {
        let mut tokenizer = Tokenizer::new(r#"12 "a\"b" -3.5e2"#);
        assert_eq!(tokenizer.next().unwrap(), Token::Number);
        assert_eq!(tokenizer.position(), 2);
        assert_eq!(tokenizer.next().unwrap(), Token::String);
        assert_eq!(tokenizer.next().unwrap(), Token::Number);
        assert!(tokenizer.at_end());
        assert!(tokenizer.next().is_err());
    }

    #[test]
    fn test_next_reports_bad_payload() {
        let mut tokenizer = Tokenizer::new(r#""\x""#);
        assert_eq!(tokenizer.next().unwrap_err().code(), 100);
    }

    #[test]
    fn test_structural_tokens() {
        let tokens = lex("{}[],:").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LeftBrace,
                Token::RightBrace,
                Token::LeftBracket,
                Token::RightBracket,
                Token::Comma,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn test_literals() {
        let tokens = lex("null true false").unwrap();
        assert_eq!(tokens, vec![Token::Null, Token::True, Token::False]);
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        let err = lex("True").unwrap_err();
        assert_eq!(err.code(), 100);
        assert!(lex("nul").is_err());
    }

    #[test]
    fn test_peek_is_idempotent() {
        let mut tokenizer = Tokenizer::new("  [1]");
        assert_eq!(tokenizer.peek().unwrap(), Token::LeftBracket);
        assert_eq!(tokenizer.peek().unwrap(), Token::LeftBracket);
        assert_eq!(tokenizer.offset(), 2);
        assert_eq!(tokenizer.next().unwrap(), Token::LeftBracket);
        assert_eq!(tokenizer.peek().unwrap(), Token::Number);
    }

    #[test]
    fn test_string() {
        let mut tokenizer = Tokenizer::new(r#""hello""#);
        assert_eq!(tokenizer.peek().unwrap(), Token::String);
        assert_eq!(tokenizer.read_string().unwrap(), "hello");
        assert!(tokenizer.at_end());
    }

    #[test]
    fn test_string_escapes() {
        let mut tokenizer = Tokenizer::new(r#""a\nb\tc\"d\\e\/f\b\f\r""#);
        assert_eq!(
            tokenizer.read_string().unwrap(),
            "a\nb\tc\"d\\e/f\x08\x0C\r"
        );
    }

    #[test]
    fn test_unicode_escape() {
        let mut tokenizer = Tokenizer::new(r#""\u0041\u00e9\u00E9""#);
        assert_eq!(tokenizer.read_string().unwrap(), "Aéé");
    }

    #[test]
    fn test_surrogate_pair() {
        let mut tokenizer = Tokenizer::new(r#""\ud83d\ude00""#);
        assert_eq!(tokenizer.read_string().unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_unpaired_surrogate_rejected() {
        let mut tokenizer = Tokenizer::new(r#""\uD800x""#);
        assert_eq!(tokenizer.read_string().unwrap_err().code(), 100);
    }

    #[test]
    fn test_non_ascii_passthrough() {
        let mut tokenizer = Tokenizer::new("\"grüße\"");
        assert_eq!(tokenizer.read_string().unwrap(), "grüße");
    }

    #[test]
    fn test_number_spans() {
        let mut tokenizer = Tokenizer::new("42 -1.5e+3 .5 +7");
        let mut spans = Vec::new();
        while !tokenizer.at_end() {
            assert_eq!(tokenizer.peek().unwrap(), Token::Number);
            spans.push(tokenizer.read_number_span().unwrap());
        }
        assert_eq!(spans, vec!["42", "-1.5e+3", ".5", "+7"]);
    }

    #[test]
    fn test_end_of_input_is_malformed() {
        let mut tokenizer = Tokenizer::new("   ");
        match tokenizer.peek() {
            Err(JsonError::MalformedInput { offset, .. }) => assert_eq!(offset, 3),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_character() {
        let mut tokenizer = Tokenizer::new("  @");
        match tokenizer.peek() {
            Err(JsonError::MalformedInput { offset, .. }) => assert_eq!(offset, 2),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let mut tokenizer = Tokenizer::new("\"abc");
        assert!(tokenizer.read_string().is_err());
    }
}
