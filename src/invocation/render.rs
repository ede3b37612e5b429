//! Value rendering module
//!
//! The response body embeds the fetched value using dynamic-language
//! `str()` conventions rather than JSON:
//! - `None`, `True`, `False`
//! - single-quoted strings (double quotes when the text holds only `'`)
//! - `{'key': value}` objects in document order
//! - integers at full precision, shortest round-trip floats with exponent
//!   form outside `1e-4 ..< 1e16`
//! - non-printable characters escaped as `\xNN`, `\uNNNN` or `\UNNNNNNNN`
//!
//! The surrounding body is then JSON-encoded with every non-ASCII
//! character escaped as `\uXXXX`.

use serde_json::{Number, Value};
use std::fmt::{self, Write};
use unicode_general_category::{get_general_category, GeneralCategory};

/// Display adapter rendering a parsed JSON value
pub struct PyRepr<'a>(pub &'a Value);

impl fmt::Display for PyRepr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self.0)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("None"),
        Value::Bool(true) => f.write_str("True"),
        Value::Bool(false) => f.write_str("False"),
        Value::Number(n) => write_number(f, n),
        Value::String(s) => write_quoted(f, s),
        Value::Array(items) => {
            f.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, item)?;
            }
            f.write_char(']')
        }
        Value::Object(map) => {
            f.write_char('{')?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_quoted(f, key)?;
                f.write_str(": ")?;
                write_value(f, item)?;
            }
            f.write_char('}')
        }
    }
}

/// Integers keep their full digits whatever their size; `-0` becomes `0`.
/// Anything with a fraction or exponent is a float.
fn write_number(f: &mut fmt::Formatter<'_>, n: &Number) -> fmt::Result {
    let text = n.to_string();
    if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        let x: f64 = text.parse().map_err(|_| fmt::Error)?;
        return f.write_str(&float_repr(x));
    }

    if text.trim_start_matches('-').bytes().all(|b| b == b'0') {
        f.write_char('0')
    } else {
        f.write_str(&text)
    }
}

/// Shortest round-trip float text, switching to exponent form
/// when the decimal exponent is below -4 or at least 16
fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sign = if x.is_sign_negative() { "-" } else { "" };
    // `{:e}` yields the shortest digits, e.g. "1.5e-7", "1e16", "0e0"
    let sci = format!("{:e}", x.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if !(-4..16).contains(&exp) {
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{:02}", exp.unsigned_abs());
    }

    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    if exp < 0 {
        let leading = "0".repeat(usize::try_from(-exp - 1).unwrap_or(0));
        return format!("{sign}0.{leading}{digits}");
    }

    let int_len = usize::try_from(exp).unwrap_or(0) + 1;
    if digits.len() <= int_len {
        let padding = "0".repeat(int_len - digits.len());
        format!("{sign}{digits}{padding}.0")
    } else {
        format!("{sign}{}.{}", &digits[..int_len], &digits[int_len..])
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c if !is_printable(c) => {
                let code = u32::from(c);
                if code <= 0xff {
                    write!(f, "\\x{code:02x}")?;
                } else if code <= 0xffff {
                    write!(f, "\\u{code:04x}")?;
                } else {
                    write!(f, "\\U{code:08x}")?;
                }
            }
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

/// Separators, control, format, private-use and unassigned code points are
/// escaped; the ASCII space is the one separator left as is.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
            | GeneralCategory::SpaceSeparator
    )
}

/// Encode `s` as a JSON string literal using only printable ASCII
pub fn to_ascii_json_string(s: &str) -> serde_json::Result<String> {
    let encoded = serde_json::to_string(s)?;
    let mut out = String::with_capacity(encoded.len());
    for c in encoded.chars() {
        if (' '..='~').contains(&c) {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                // Writing into a String cannot fail
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
    Ok(out)
}
