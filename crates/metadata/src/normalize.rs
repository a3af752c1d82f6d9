//! Metadata normalization (§3 "Metadata", §4.4 step 7).
//!
//! Runs after decode, on whichever of `requirements`, `links`, `extra`,
//! `build_tools` are present, reshaping legacy input shapes into the
//! canonical ones callers expect.

use crate::value::{self, Metadata, Value};

/// Fixed table used to guess `build_tools` from a file listing
/// (§3 "build_tools").
const BUILD_TOOL_MARKERS: &[(&str, &str)] = &[
    ("mix.exs", "mix"),
    ("rebar.config", "rebar3"),
    ("rebar", "rebar3"),
    ("Makefile", "make"),
    ("Makefile.win", "make"),
];

/// Apply every normalization rule in place.
pub fn normalize(metadata: &mut Metadata) {
    normalize_requirements(metadata);
    normalize_pair_list("links", metadata);
    normalize_pair_list("extra", metadata);
    guess_build_tools(metadata);
}

/// `requirements`: reshape either of the two accepted legacy shapes into
/// `{name -> mapping-without-name}`.
fn normalize_requirements(metadata: &mut Metadata) {
    let Some(Value::List(items)) = value::get(metadata, "requirements").cloned() else {
        return;
    };

    let mut reshaped: Metadata = Vec::new();
    for item in items {
        match item {
            // Shape (a): a sub-mapping carrying a "name" key.
            Value::List(pairs) if is_pair_list(&pairs) => {
                let mut map = pair_list_to_map(pairs);
                if let Some(name) = value::remove(&mut map, "name").and_then(|v| {
                    v.as_str().map(|s| s.to_string())
                }) {
                    value::set(&mut reshaped, &name, Value::Map(map));
                }
            }
            _ => {}
        }
    }

    // Shape (b): a sequence of (name, value) 2-tuples, where our parser
    // also represents 2-tuples as `Value::List` of length 2. Since shape
    // (a) is a list of pairs carrying "name" and shape (b) is a bare
    // `[name, value]` pair, disambiguate by whether the first element is
    // itself a simple string (shape b) vs. a full sub-mapping (shape a,
    // handled above).
    if reshaped.is_empty() {
        if let Some(Value::List(items)) = value::get(metadata, "requirements").cloned() {
            for item in items {
                if let Value::List(pair) = item {
                    if pair.len() == 2 {
                        if let Some(name) = pair[0].as_str() {
                            let value = coerce_to_map_if_pairs(pair[1].clone());
                            value::set(&mut reshaped, name, value);
                        }
                    }
                }
            }
        }
    }

    if !reshaped.is_empty() {
        value::set(metadata, "requirements", Value::Map(reshaped));
    }
}

/// `links` / `extra`: coerce a sequence of 2-tuples into a mapping;
/// leave anything else untouched.
fn normalize_pair_list(key: &str, metadata: &mut Metadata) {
    let Some(value) = value::get(metadata, key).cloned() else {
        return;
    };
    let coerced = coerce_to_map_if_pairs(value);
    value::set(metadata, key, coerced);
}

fn coerce_to_map_if_pairs(value: Value) -> Value {
    match value {
        Value::List(items) if is_pair_list(&items) => Value::Map(pair_list_to_map(items)),
        other => other,
    }
}

/// A "sequence of 2-tuples" per §3: every item is itself a 2-element
/// list/tuple whose first element is a string-like key.
fn is_pair_list(items: &[Value]) -> bool {
    !items.is_empty()
        && items.iter().all(|item| match item {
            Value::List(pair) => pair.len() == 2 && pair[0].as_str().is_some(),
            _ => false,
        })
}

fn pair_list_to_map(items: Vec<Value>) -> Metadata {
    let mut map = Metadata::new();
    for item in items {
        if let Value::List(mut pair) = item {
            if pair.len() == 2 {
                let v = pair.pop().unwrap();
                let k = pair.pop().unwrap();
                if let Some(k) = k.as_str() {
                    value::set(&mut map, k, v);
                }
            }
        }
    }
    map
}

/// `build_tools`: if absent, infer from `files` against the fixed
/// marker table, sorted and deduplicated.
fn guess_build_tools(metadata: &mut Metadata) {
    if value::get(metadata, "build_tools").is_some() {
        return;
    }

    let files = value::get(metadata, "files")
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut tools: Vec<&str> = Vec::new();
    for file in &files {
        let base = file.rsplit('/').next().unwrap_or(file);
        for (marker, tool) in BUILD_TOOL_MARKERS {
            if base == *marker && !tools.contains(tool) {
                tools.push(tool);
            }
        }
    }
    tools.sort_unstable();

    let list = tools
        .into_iter()
        .map(|t| Value::Str(t.to_string()))
        .collect();
    value::set(metadata, "build_tools", Value::List(list));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_legacy_requirements_with_name_key() {
        let mut metadata: Metadata = vec![(
            "requirements".into(),
            Value::List(vec![Value::List(vec![
                Value::List(vec![Value::Str("name".into()), Value::Str("decimal".into())]),
                Value::List(vec![
                    Value::Str("requirement".into()),
                    Value::Str("~> 1.0".into()),
                ]),
            ])]),
        )];
        normalize(&mut metadata);
        let reqs = value::get(&metadata, "requirements").unwrap().as_map().unwrap();
        let decimal = value::get(reqs, "decimal").unwrap().as_map().unwrap();
        assert_eq!(
            value::get(decimal, "requirement"),
            Some(&Value::Str("~> 1.0".into()))
        );
    }

    #[test]
    fn guesses_build_tools_from_files() {
        let mut metadata: Metadata = vec![(
            "files".into(),
            Value::List(vec![
                Value::Str("mix.exs".into()),
                Value::Str("src/a.erl".into()),
            ]),
        )];
        normalize(&mut metadata);
        let tools = value::get(&metadata, "build_tools").unwrap().as_list().unwrap();
        assert_eq!(tools, &[Value::Str("mix".into())]);
    }

    #[test]
    fn guesses_multiple_build_tools_sorted() {
        let mut metadata: Metadata = vec![(
            "files".into(),
            Value::List(vec![
                Value::Str("Makefile".into()),
                Value::Str("rebar.config".into()),
            ]),
        )];
        normalize(&mut metadata);
        let tools = value::get(&metadata, "build_tools").unwrap().as_list().unwrap();
        assert_eq!(
            tools,
            &[Value::Str("make".into()), Value::Str("rebar3".into())]
        );
    }

    #[test]
    fn empty_files_yields_empty_build_tools() {
        let mut metadata: Metadata = vec![("name".into(), Value::Str("ecto".into()))];
        normalize(&mut metadata);
        let tools = value::get(&metadata, "build_tools").unwrap().as_list().unwrap();
        assert!(tools.is_empty());
    }

    #[test]
    fn existing_build_tools_are_left_alone() {
        let mut metadata: Metadata = vec![(
            "build_tools".into(),
            Value::List(vec![Value::Str("rebar3".into())]),
        )];
        normalize(&mut metadata);
        let tools = value::get(&metadata, "build_tools").unwrap().as_list().unwrap();
        assert_eq!(tools, &[Value::Str("rebar3".into())]);
    }
}
