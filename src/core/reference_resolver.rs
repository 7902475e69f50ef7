// src/core/reference_resolver.rs

use crate::core::file_cache::FileCache;
use crate::error::PipelineError;
use crate::value::{split_pointer, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Stage 2/5: expands every whole-node `{ "$ref": <uri> }` to its referent
/// (§4.2). Property-level `$ref`s nested inside a token's `$value` (array
/// elements, composite sub-fields) are deliberately left untouched here —
/// they survive flattening and are resolved later by the Alias Resolver
/// against the flat map (§4.5).
#[derive(Debug)]
pub struct ReferenceResolver<'a> {
    cache: &'a FileCache,
    max_depth: u32,
}

impl<'a> ReferenceResolver<'a> {
    /// Builds a resolver backed by `cache`, rejecting any `$ref` chain
    /// deeper than `max_depth`.
    pub fn new(cache: &'a FileCache, max_depth: u32) -> Self {
        Self { cache, max_depth }
    }

    /// Resolves all whole-node refs in `value`, which was loaded from
    /// `document_dir` (used to resolve relative file refs) with document
    /// root `root` (used to resolve in-document `#/<pointer>` refs).
    ///
    /// Carries a fresh `stack` per call, per §4.2/§5: this is what makes it
    /// safe to call `resolve` concurrently for independent permutations
    /// against the same shared `FileCache`.
    pub fn resolve(&self, value: &Value, root: &Value, document_dir: &Path) -> Result<Value, PipelineError> {
        let mut stack = Vec::new();
        self.walk(value, root, document_dir, false, &mut stack, 0)
    }

    fn walk(
        &self,
        value: &Value,
        root: &Value,
        document_dir: &Path,
        inside_value: bool,
        stack: &mut Vec<String>,
        depth: u32,
    ) -> Result<Value, PipelineError> {
        match value {
            Value::Ref(uri) if !inside_value => {
                self.dereference(uri, root, document_dir, stack, depth)
            }
            Value::RefMerge(uri, extras) if !inside_value => {
                let referent = self.dereference(uri, root, document_dir, stack, depth)?;
                let mut resolved_extras = indexmap::IndexMap::with_capacity(extras.len());
                for (key, v) in extras {
                    resolved_extras.insert(key.clone(), self.walk(v, root, document_dir, inside_value, stack, depth)?);
                }
                Ok(merge_ref_siblings(referent, resolved_extras))
            }
            Value::Object(map) => {
                let mut out = indexmap::IndexMap::with_capacity(map.len());
                for (key, v) in map {
                    let child_inside_value = inside_value || key == "$value";
                    out.insert(key.clone(), self.walk(v, root, document_dir, child_inside_value, stack, depth)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => {
                let resolved: Result<Vec<Value>, PipelineError> = items
                    .iter()
                    .map(|item| self.walk(item, root, document_dir, inside_value, stack, depth))
                    .collect();
                Ok(Value::Array(resolved?))
            }
            other => Ok(other.clone()),
        }
    }

    fn dereference(
        &self,
        uri: &str,
        root: &Value,
        document_dir: &Path,
        stack: &mut Vec<String>,
        depth: u32,
    ) -> Result<Value, PipelineError> {
        if depth >= self.max_depth || stack.iter().any(|s| s == uri) {
            let mut trail = stack.clone();
            trail.push(uri.to_string());
            return Err(PipelineError::CircularReference { trail });
        }

        let resolved = if let Some(pointer) = uri.strip_prefix("#/") {
            self.resolve_in_document(pointer, root, uri)?
        } else {
            self.resolve_in_file(uri, document_dir, uri)?
        };

        let (referent, new_root, new_dir) = resolved;
        stack.push(uri.to_string());
        // Chained refs: keep walking the substituted value so a ref that
        // points at another ref is fully expanded before being merged in.
        let expanded = self.walk(&referent, &new_root, &new_dir, false, stack, depth + 1);
        stack.pop();
        expanded
    }

    fn resolve_in_document(&self, pointer: &str, root: &Value, uri: &str) -> Result<(Value, Value, PathBuf), PipelineError> {
        let segments = split_pointer(pointer);
        root.pointer_path(&segments)
            .cloned()
            .map(|v| (v, root.clone(), PathBuf::from(".")))
            .ok_or_else(|| PipelineError::TokenReference { uri: uri.to_string(), suggestions: Vec::new() })
    }

    fn resolve_in_file(&self, uri: &str, document_dir: &Path, original_uri: &str) -> Result<(Value, Value, PathBuf), PipelineError> {
        let (file_part, fragment) = match uri.split_once("#/") {
            Some((file, frag)) => (file, Some(frag)),
            None => (uri, None),
        };

        let path = if Path::new(file_part).is_absolute() {
            PathBuf::from(file_part)
        } else {
            document_dir.join(file_part)
        };

        let loaded: Arc<Value> = self.cache.load(&path)?;
        let new_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

        let value = match fragment {
            Some(pointer) => {
                let segments = split_pointer(pointer);
                loaded
                    .pointer_path(&segments)
                    .cloned()
                    .ok_or_else(|| PipelineError::TokenReference { uri: original_uri.to_string(), suggestions: Vec::new() })?
            }
            None => (*loaded).clone(),
        };

        Ok((value, (*loaded).clone(), new_dir))
    }
}

/// Merges `extras` (the non-`$ref` keys from a `{ "$ref": ..., ...extras }`
/// object) over the dereferenced `referent`, last-wins per key (§4.2).
fn merge_ref_siblings(referent: Value, extras: indexmap::IndexMap<String, Value>) -> Value {
    match referent {
        Value::Object(mut map) => {
            for (key, value) in extras {
                map.insert(key, value);
            }
            Value::Object(map)
        }
        other if extras.is_empty() => other,
        _ => Value::Object(extras),
    }
}
