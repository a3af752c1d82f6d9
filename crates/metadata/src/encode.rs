//! Metadata encoder (§4.3).
//!
//! Produces the text form stored as `metadata.config`: one top-level
//! `{key, value}` term per line, each terminated by `.\n`.

use crate::value::{Metadata, Value};

/// Render a full metadata mapping as the `metadata.config` text.
pub fn encode(metadata: &Metadata) -> String {
    let mut out = String::new();
    for (key, value) in metadata {
        out.push('{');
        encode_str(key, &mut out);
        out.push(',');
        encode_value(value, &mut out);
        out.push_str("}.\n");
    }
    out
}

fn encode_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("undefined"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Str(s) => encode_str(s, out),
        // Atoms round-trip as plain UTF-8 strings, per §4.3.
        Value::Atom(s) => encode_str(s, out),
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_value(item, out);
            }
            out.push(']');
        }
        Value::Map(pairs) => {
            // Mappings become ordered sequences of key/value pairs.
            out.push('[');
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('{');
                encode_str(k, out);
                out.push(',');
                encode_value(v, out);
                out.push('}');
            }
            out.push(']');
        }
    }
}

/// Render a string as an Erlang binary literal `<<"...">>`, escaping
/// backslashes, double quotes, and control characters.
fn encode_str(s: &str, out: &mut String) {
    out.push_str("<<\"");
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push_str("\">>");
}
