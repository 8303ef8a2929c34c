//! Tokenizer and parser conformance tests.
//!
//! Exercises the text layer end to end: token stream, the lazy value tree
//! and the eager generic tree, including the error codes each failure
//! surfaces with.

use jsonmap::json::{parse, parse_array, parse_generic, Token, Tokenizer, Value};
use jsonmap::{Generic, JsonError};
use pretty_assertions::assert_eq;

fn tokens(input: &str) -> Result<Vec<Token>, JsonError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut out = Vec::new();
    while !tokenizer.at_end() {
        match tokenizer.peek()? {
            Token::String => {
                tokenizer.read_string()?;
                out.push(Token::String);
            }
            Token::Number => {
                tokenizer.read_number_span()?;
                out.push(Token::Number);
            }
            _ => out.push(tokenizer.next()?),
        }
    }
    Ok(out)
}

// ============================================================================
// Token Stream
// ============================================================================

#[test]
fn tokens_of_nested_document() {
    let stream = tokens(" {\"a\" : [1, true, null], \"b\":false}\r\n").unwrap();
    assert_eq!(
        stream,
        vec![
            Token::LeftBrace,
            Token::String,
            Token::Colon,
            Token::LeftBracket,
            Token::Number,
            Token::Comma,
            Token::True,
            Token::Comma,
            Token::Null,
            Token::RightBracket,
            Token::Comma,
            Token::String,
            Token::Colon,
            Token::False,
            Token::RightBrace,
        ]
    );
}

#[test]
fn peek_does_not_consume() {
    let mut tokenizer = Tokenizer::new("[ ]");
    assert_eq!(tokenizer.peek().unwrap(), Token::LeftBracket);
    assert_eq!(tokenizer.peek().unwrap(), Token::LeftBracket);
    assert_eq!(tokenizer.next().unwrap(), Token::LeftBracket);
    assert_eq!(tokenizer.offset(), 1);
    assert_eq!(tokenizer.next().unwrap(), Token::RightBracket);
    assert!(tokenizer.at_end());
}

#[test]
fn number_span_is_greedy() {
    let mut tokenizer = Tokenizer::new("-12.5e+3,");
    assert_eq!(tokenizer.read_number_span().unwrap(), "-12.5e+3");
    assert_eq!(tokenizer.next().unwrap(), Token::Comma);
}

#[test]
fn next_alone_walks_whole_document() {
    let mut tokenizer = Tokenizer::new(r#"{"k": [12, "v", -0.5]} "#);
    let mut stream = Vec::new();
    while !tokenizer.at_end() {
        stream.push(tokenizer.next().unwrap());
    }
    assert_eq!(
        stream,
        vec![
            Token::LeftBrace,
            Token::String,
            Token::Colon,
            Token::LeftBracket,
            Token::Number,
            Token::Comma,
            Token::String,
            Token::Comma,
            Token::Number,
            Token::RightBracket,
            Token::RightBrace,
        ]
    );
}

#[test]
fn string_escapes_decoded() {
    let mut tokenizer = Tokenizer::new(r#""tab\there \"q\" \/ \\ é 😀""#);
    assert_eq!(
        tokenizer.read_string().unwrap(),
        "tab\there \"q\" / \\ \u{e9} \u{1F600}"
    );
}

#[test]
fn short_escapes_decoded() {
    let mut tokenizer = Tokenizer::new(r#""\b\f\n\r""#);
    assert_eq!(tokenizer.read_string().unwrap(), "\u{8}\u{c}\n\r");
}

// ============================================================================
// Tokenizer Errors
// ============================================================================

#[test]
fn unrecognized_character_is_malformed() {
    let err = tokens("[1, @]").unwrap_err();
    assert_eq!(err.code(), 100);
    assert!(matches!(err, JsonError::MalformedInput { offset: 4, .. }));
}

#[test]
fn misspelled_literal_is_malformed() {
    assert_eq!(parse("nul").unwrap_err().code(), 100);
    assert_eq!(parse("[tru]").unwrap_err().code(), 100);
}

#[test]
fn unterminated_string_is_malformed() {
    assert_eq!(parse(r#"{"a":"open"#).unwrap_err().code(), 100);
}

#[test]
fn bad_escapes_are_malformed() {
    assert_eq!(parse(r#""\x""#).unwrap_err().code(), 100);
    assert_eq!(parse(r#""\u12G4""#).unwrap_err().code(), 100);
    assert_eq!(parse(r#""\ud83d""#).unwrap_err().code(), 100);
}

#[test]
fn empty_input_is_malformed() {
    assert_eq!(parse("").unwrap_err().code(), 100);
    assert_eq!(parse("   ").unwrap_err().code(), 100);
}

// ============================================================================
// Grammar Errors
// ============================================================================

#[test]
fn missing_colon() {
    let err = parse(r#"{"a" 1}"#).unwrap_err();
    assert_eq!(err.code(), 101);
}

#[test]
fn non_string_key() {
    assert_eq!(parse("{1:2}").unwrap_err().code(), 102);
}

#[test]
fn trailing_commas_rejected() {
    assert_eq!(parse("[1,]").unwrap_err().code(), 102);
    assert_eq!(parse(r#"{"a":1,}"#).unwrap_err().code(), 102);
}

#[test]
fn trailing_content_rejected() {
    assert_eq!(parse("[1] [2]").unwrap_err().code(), 102);
    assert!(parse("[1]  \n").is_ok());
}

#[test]
fn missing_separator_rejected() {
    assert_eq!(parse("[1 2]").unwrap_err().code(), 102);
}

// ============================================================================
// Lazy Value Tree
// ============================================================================

#[test]
fn root_null_is_none() {
    assert_eq!(parse("null").unwrap(), None);
}

#[test]
fn scalars_keep_raw_text() {
    let value = parse(r#"{"n":007.50,"s":"x","b":true}"#).unwrap().unwrap();
    assert_eq!(value.get("n").and_then(Value::as_str), Some("007.50"));
    assert_eq!(value.get("s").and_then(Value::as_str), Some("x"));
    let flag = value.get("b").and_then(Value::as_primitive).unwrap();
    assert_eq!(flag.as_bool(), Some(true));
}

#[test]
fn primitives_convert_on_demand() {
    let value = parse(r#"[12, "12", "2024-02-29 13:05:09"]"#).unwrap().unwrap();
    let first = value.get_index(0).and_then(Value::as_primitive).unwrap();
    assert_eq!(first.try_convert_to::<i64>().unwrap(), 12);
    assert_eq!(first.try_convert_to::<f64>().unwrap(), 12.0);

    // Strings convert to numbers the same way numbers do.
    let second = value.get_index(1).and_then(Value::as_primitive).unwrap();
    assert_eq!(second.try_convert_to::<u8>().unwrap(), 12);

    let third = value.get_index(2).and_then(Value::as_primitive).unwrap();
    let date = third.as_datetime().unwrap();
    assert_eq!(date.wall().to_string(), "2024-02-29 13:05:09");
}

#[test]
fn boolean_does_not_convert_to_number() {
    let value = parse("true").unwrap().unwrap();
    let primitive = value.as_primitive().unwrap();
    assert_eq!(primitive.try_convert_to::<i32>().unwrap_err().code(), 203);
}

#[test]
fn duplicate_keys_keep_last_value() {
    let value = parse(r#"{"a":1,"b":2,"a":3}"#).unwrap().unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert_eq!(object.get("a").and_then(Value::as_str), Some("3"));
}

#[test]
fn null_slots_are_kept() {
    let array = parse_array("[1,null,3]").unwrap();
    assert_eq!(array.len(), 3);
    assert!(array.get(1).is_none());
    assert!(parse_array(r#"{"a":1}"#).is_err());
}

// ============================================================================
// Generic Tree
// ============================================================================

#[test]
fn generic_numbers_split_by_form() {
    let tree = parse_generic(r#"{"i":-4,"f":2.5,"e":1e3}"#).unwrap();
    assert_eq!(tree.get("i"), Some(&Generic::Integer(-4)));
    assert_eq!(tree.get("f"), Some(&Generic::Float(2.5)));
    assert_eq!(tree.get("e"), Some(&Generic::Float(1000.0)));
}

#[test]
fn generic_keeps_key_order() {
    let tree = parse_generic(r#"{"z":1,"a":[null,"s",false]}"#).unwrap();
    let Generic::Map(map) = &tree else {
        panic!("expected a map, got {:?}", tree);
    };
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["z", "a"]);

    let list = tree.get("a").unwrap();
    assert!(list.get_index(0).unwrap().is_null());
    assert_eq!(list.get_index(1).and_then(Generic::as_str), Some("s"));
    assert_eq!(list.get_index(2), Some(&Generic::Bool(false)));
}

#[test]
fn generic_rejects_bad_numbers() {
    assert_eq!(parse_generic("[1.2.3]").unwrap_err().code(), 200);
    assert_eq!(parse_generic("99999999999999999999").unwrap_err().code(), 200);
}

#[test]
fn generic_matches_serde_json() {
    let text = r#"{"list":[1,2.5,"x",true,null],"nested":{"k":"v"}}"#;
    let ours = serde_json::Value::from(parse_generic(text).unwrap());
    let theirs: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(ours, theirs);
}
