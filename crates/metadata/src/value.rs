//! The term value model (§3 "Metadata", §4.3).
//!
//! Package metadata is a mapping with string keys whose values can
//! themselves be nested mappings, lists, binaries (strings), atoms, or
//! numbers. We keep the in-memory shape ordered (`Vec` rather than
//! `HashMap`) because the encoder must reproduce the exact key order it
//! was given — that's part of the byte-reproducibility contract in
//! §8 property 2.

/// One term value in the metadata tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The `undefined` atom.
    Null,
    /// The `true` / `false` atoms.
    Bool(bool),
    /// A bare integer literal.
    Int(i64),
    /// An Erlang binary string, `<<"...">>` on the wire.
    Str(String),
    /// Any other atom-like token (rendered as a UTF-8 string on encode,
    /// per §4.3: "other atom-like values become UTF-8 strings").
    Atom(String),
    /// An ordered list, `[...]` on the wire.
    List(Vec<Value>),
    /// An ordered mapping, rendered as a list of `{key, value}` 2-tuples.
    Map(Metadata),
}

/// An ordered key/value mapping: the shape of both the top-level
/// `metadata.config` document and any nested mapping value.
pub type Metadata = Vec<(String, Value)>;

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Atom(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }
}

/// Look up a key in an ordered mapping.
pub fn get<'a>(map: &'a Metadata, key: &str) -> Option<&'a Value> {
    map.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// Insert or replace a key in an ordered mapping, preserving the
/// position of an existing key and appending new keys at the end.
pub fn set(map: &mut Metadata, key: &str, value: Value) {
    if let Some(entry) = map.iter_mut().find(|(k, _)| k == key) {
        entry.1 = value;
    } else {
        map.push((key.to_string(), value));
    }
}

/// Remove a key, returning its value if present.
pub fn remove(map: &mut Metadata, key: &str) -> Option<Value> {
    let idx = map.iter().position(|(k, _)| k == key)?;
    Some(map.remove(idx).1)
}
