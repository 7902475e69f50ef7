// src/value.rs

use indexmap::IndexMap;
use serde_json::Number;
use std::fmt;

/// A URI appearing inside a `$ref` object: either a JSON Pointer into the
/// current document, a relative/absolute file path (optionally carrying a
/// `#/<pointer>` fragment), to be dereferenced by the reference resolver.
pub type RefUri = String;

/// A merged token-document value.
///
/// Mirrors the JSON data model but keeps `$ref` as its own tagged variant
/// rather than an ordinary object, so the reference resolver and alias
/// resolver can be written as total functions over this enum instead of
/// probing objects for a magic key at every call site.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Num(Number),
    /// JSON string, including alias expressions `"{a.b.c}"`.
    Str(String),
    /// JSON array. Array aliasing never flattens: each element resolves
    /// independently and the array keeps its literal length.
    Array(Vec<Value>),
    /// JSON object, preserving declared key order.
    Object(IndexMap<String, Value>),
    /// An unresolved `{ "$ref": <uri> }` object.
    Ref(RefUri),
    /// An unresolved `{ "$ref": <uri>, ...siblings }` object: `siblings` are
    /// merged over the referent after substitution (§4.2).
    RefMerge(RefUri, IndexMap<String, Value>),
}

impl Value {
    /// `true` if this value is an object carrying `$value` or `$ref` — the
    /// definition of a token node versus a group node.
    pub fn is_token(&self) -> bool {
        match self {
            Value::Object(map) => map.contains_key("$value") || matches!(map.get("$ref"), Some(_)),
            Value::Ref(_) | Value::RefMerge(..) => true,
            _ => false,
        }
    }

    /// Borrow this value as an object map, if it is one.
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrow this value as an object map, if it is one.
    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Walk a `/`-separated JSON-Pointer path (already split into raw
    /// segments, RFC 6901 `~1`/`~0` already decoded) starting from `self`.
    pub fn pointer_path(&self, segments: &[String]) -> Option<&Value> {
        let mut current = self;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment.as_str())?,
                Value::Array(items) => {
                    let idx: usize = segment.parse().ok()?;
                    items.get(idx)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for Value {
    /// Textual form used when an alias is interpolated inside a larger
    /// string (`"…{dot.path}…"`); composite values render as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(_) | Value::Object(_) => {
                write!(f, "{}", serde_json::to_string(&to_json(self)).unwrap_or_default())
            }
            Value::Ref(uri) => write!(f, "{{\"$ref\":\"{uri}\"}}"),
            Value::RefMerge(..) => write!(f, "{}", serde_json::to_string(&to_json(self)).unwrap_or_default()),
        }
    }
}

/// Parses `$ref` objects into [`Value::Ref`] while recursing into everything
/// else, the point where the sum-type modeling begins.
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Num(n),
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(uri)) = map.get("$ref") {
                let uri = uri.clone();
                if map.len() == 1 {
                    return Value::Ref(uri);
                }
                let mut siblings = IndexMap::with_capacity(map.len() - 1);
                for (k, v) in map {
                    if k != "$ref" {
                        siblings.insert(k, from_json(v));
                    }
                }
                return Value::RefMerge(uri, siblings);
            }
            let mut out = IndexMap::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k, from_json(v));
            }
            Value::Object(out)
        }
    }
}

/// Inverse of [`from_json`], re-expanding `$ref` back into an object. Used
/// only for diagnostics / display; the pipeline never re-serializes a live
/// `Ref` once Stage 2 has run.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Num(n) => serde_json::Value::Number(n.clone()),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), to_json(v));
            }
            serde_json::Value::Object(out)
        }
        Value::Ref(uri) => {
            let mut out = serde_json::Map::new();
            out.insert("$ref".to_string(), serde_json::Value::String(uri.clone()));
            serde_json::Value::Object(out)
        }
        Value::RefMerge(uri, siblings) => {
            let mut out = serde_json::Map::with_capacity(siblings.len() + 1);
            out.insert("$ref".to_string(), serde_json::Value::String(uri.clone()));
            for (k, v) in siblings {
                out.insert(k.clone(), to_json(v));
            }
            serde_json::Value::Object(out)
        }
    }
}

/// Splits a JSON Pointer (`a/b/0`, already stripped of a leading `#/`) into
/// decoded segments.
pub fn split_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .split('/')
        .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Marker type kept for symmetry with the DTCG `$extensions` bag; the
/// pipeline treats it opaquely and never interprets its contents.
pub type Extensions = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_object_becomes_ref_variant() {
        let json = serde_json::json!({ "$ref": "#/a/b" });
        assert_eq!(from_json(json), Value::Ref("#/a/b".to_string()));
    }

    #[test]
    fn plain_object_is_preserved() {
        let json = serde_json::json!({ "$value": 1, "$type": "number" });
        let v = from_json(json);
        assert!(v.is_token());
    }

    #[test]
    fn pointer_path_walks_arrays_and_objects() {
        let json = serde_json::json!({ "components": [0.2, 0.4, 0.9] });
        let v = from_json(json);
        let path = split_pointer("components/1");
        assert_eq!(v.pointer_path(&path), Some(&Value::Num(Number::from_f64(0.4).unwrap())));
    }
}
