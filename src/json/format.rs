//! Output formatting: string escaping and pretty printing.
//!
//! # Escaping
//!
//! Runs of printable ASCII other than `"` and `\` are copied in bulk.
//! Tab, CR, LF, quote and backslash get short escapes; every other character
//! is written as `\uXXXX` with uppercase hex, one escape per UTF-16 unit.

use std::fmt::Write as _;

/// Indent used by [`beautify`].
pub const INDENT: &str = "    ";

fn is_plain(byte: u8) -> bool {
    (b' '..0x80).contains(&byte) && byte != b'"' && byte != b'\\'
}

/// Append `s` as a quoted JSON string.
pub fn write_string(s: &str, output: &mut String) {
    output.push('"');

    let bytes = s.as_bytes();
    let mut run_start: Option<usize> = None;

    for (index, ch) in s.char_indices() {
        if ch.is_ascii() && is_plain(bytes[index]) {
            run_start.get_or_insert(index);
            continue;
        }

        if let Some(start) = run_start.take() {
            output.push_str(&s[start..index]);
        }

        match ch {
            '\t' => output.push_str("\\t"),
            '\r' => output.push_str("\\r"),
            '\n' => output.push_str("\\n"),
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            other => {
                let mut units = [0_u16; 2];
                for unit in other.encode_utf16(&mut units) {
                    // Writing into a String cannot fail.
                    let _ = write!(output, "\\u{:04X}", unit);
                }
            }
        }
    }

    if let Some(start) = run_start {
        output.push_str(&s[start..]);
    }
    output.push('"');
}

fn newline(output: &mut String, depth: usize) {
    output.push('\n');
    for _ in 0..depth {
        output.push_str(INDENT);
    }
}

/// Re-indent compact JSON text for reading.
///
/// Whitespace outside strings is dropped, every member and element starts
/// on its own line indented by [`INDENT`] per level, and keys are followed
/// by `" : "`. Strings pass through untouched. Empty containers stay `{}`
/// and `[]`. The input is not validated.
pub fn beautify(json: &str) -> String {
    let mut output = String::with_capacity(json.len() * 2);
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = json.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_string {
            output.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                output.push(ch);
                in_string = true;
            }
            '{' | '[' => {
                output.push(ch);
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                let close = if ch == '{' { '}' } else { ']' };
                if chars.peek() == Some(&close) {
                    chars.next();
                    output.push(close);
                } else {
                    depth += 1;
                    newline(&mut output, depth);
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                newline(&mut output, depth);
                output.push(ch);
            }
            ',' => {
                output.push(ch);
                newline(&mut output, depth);
            }
            ':' => output.push_str(" : "),
            c if c.is_whitespace() => {}
            c => output.push(c),
        }
    }

    output
}
