use std::fmt::Write;

use metaq_query::{CompareOp, Value};

/// Base clause every predicate list starts from, so each criterion can be
/// appended as `AND <predicate>`.
pub const ALWAYS_TRUE: &str = "2=2";

/// Render a literal. Strings are single-quoted with embedded quotes doubled.
pub fn literal(value: &Value) -> String {
    let mut out = String::new();
    push_literal(&mut out, value);
    out
}

pub(crate) fn push_literal(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => {
            out.reserve(s.len() + 2);
            out.push('\'');
            for ch in s.chars() {
                if ch == '\'' {
                    out.push('\'');
                }
                out.push(ch);
            }
            out.push('\'');
        }
        Value::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Float(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Bool(true) => out.push_str("TRUE"),
        Value::Bool(false) => out.push_str("FALSE"),
        Value::Null => out.push_str("NULL"),
    }
}

pub(crate) fn push_list(out: &mut String, values: &[Value]) {
    out.push('(');
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_literal(out, value);
    }
    out.push(')');
}

pub(crate) fn push_comparison(out: &mut String, column: &str, op: CompareOp, value: &Value) {
    out.push_str(column);
    out.push(' ');
    out.push_str(op.as_sql());
    out.push(' ');
    push_literal(out, value);
}

/// Join alias for the `index`-th meta join: `A`..`Z`, then `AA`, `AB`, ...
pub fn alias(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}
