//! Key/value field collection
//!
//! Turns flat `(name, value)` pairs, as found in query strings and form
//! submissions, into a JSON object:
//! - a repeated name collects its values into an array
//! - `name[]` always produces an array
//! - `name[key]` nests objects
//!
//! A name that is used both as a plain value and as a nested object keeps
//! whichever shape it was given first; the conflicting pair is dropped.

use serde_json::{Map, Value};

/// Collect `pairs` into an object. Empty values are dropped unless
/// `keep_empty` is set.
pub fn collect_fields<I, K, V>(pairs: I, keep_empty: bool) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut fields = Map::new();

    for (name, value) in pairs {
        let name = name.as_ref();
        let value = value.into();
        if name.is_empty() || (!keep_empty && value.is_empty()) {
            continue;
        }

        let (head, path) = split_name(name);
        insert(&mut fields, head, &path, value);
    }

    fields
}

/// `a[b][]` → (`a`, [`b`, ``]). Malformed brackets leave the name whole.
fn split_name(name: &str) -> (&str, Vec<&str>) {
    let Some(open) = name.find('[') else {
        return (name, Vec::new());
    };
    if open == 0 {
        return (name, Vec::new());
    }

    let mut segments = Vec::new();
    let mut rest = &name[open..];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return (name, Vec::new());
        };
        let Some(close) = inner.find(']') else {
            return (name, Vec::new());
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }

    (&name[..open], segments)
}

fn insert(map: &mut Map<String, Value>, key: &str, path: &[&str], value: String) {
    match path.split_first() {
        None => match map.get_mut(key) {
            None => {
                map.insert(key.to_string(), Value::String(value));
            }
            Some(existing) => push_value(key, existing, value),
        },
        Some((&"", _)) => {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            push_value(key, entry, value);
        }
        Some((child, tail)) => {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(inner) => insert(inner, child, tail, value),
                _ => tracing::warn!(field = %key, "Ignoring nested field over a plain value"),
            }
        }
    }
}

fn push_value(key: &str, slot: &mut Value, value: String) {
    match slot {
        Value::Array(items) => items.push(Value::String(value)),
        Value::Object(_) => {
            tracing::warn!(field = %key, "Ignoring plain value over a nested field")
        }
        other => {
            let previous = other.take();
            *other = Value::Array(vec![previous, Value::String(value)]);
        }
    }
}
