// src/core/alias_resolver.rs

use crate::error::PipelineError;
use crate::models::{is_alias_string, ResolvedTable};
use crate::value::{split_pointer, Value};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;

lazy_static! {
    static ref ALIAS_PATTERN: Regex = Regex::new(r"\{([^{}]+)\}").expect("static alias pattern is valid");
}

/// Stage 7: expands every `{a.b.c}` alias and property-level `$ref` pointer
/// left over from Stage 2/5 into its referent's resolved value (§4.5).
///
/// Cycle/depth state (`stack`) is carried through one top-level token's
/// whole expansion chain, the same recursion-stack-plus-depth-counter shape
/// used elsewhere in this crate for bounded recursive expansion; the
/// resolved-value cache is shared across the whole table so a token aliased
/// from several places is only expanded once.
pub fn resolve_table(table: &mut ResolvedTable, max_depth: u32) -> Result<(), PipelineError> {
    let resolver = Resolver { originals: &table.tokens, cache: RefCell::new(HashMap::new()) };
    let names: Vec<String> = table.tokens.keys().cloned().collect();

    let mut resolved_values = HashMap::with_capacity(names.len());
    for name in &names {
        let mut stack = Vec::new();
        let value = resolver.resolve_name(name, &mut stack, 0, max_depth)?;
        resolved_values.insert(name.clone(), value);
    }

    for (name, value) in resolved_values {
        if let Some(token) = table.tokens.get_mut(&name) {
            token.value = value;
        }
    }
    Ok(())
}

struct Resolver<'a> {
    originals: &'a IndexMap<String, crate::models::ResolvedToken>,
    cache: RefCell<HashMap<String, Value>>,
}

impl<'a> Resolver<'a> {
    fn resolve_name(&self, name: &str, stack: &mut Vec<String>, depth: u32, max_depth: u32) -> Result<Value, PipelineError> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(cached.clone());
        }
        if depth > max_depth || stack.contains(&name.to_string()) {
            let mut trail = stack.clone();
            trail.push(name.to_string());
            return Err(PipelineError::CircularReference { trail });
        }
        let original = &self
            .originals
            .get(name)
            .ok_or_else(|| PipelineError::TokenReference {
                uri: name.to_string(),
                suggestions: crate::error::closest_matches(name, self.originals.keys(), 3),
            })?
            .original_value;

        stack.push(name.to_string());
        let resolved = self.resolve_value(original, stack, depth + 1, max_depth)?;
        stack.pop();

        self.cache.borrow_mut().insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn resolve_value(&self, value: &Value, stack: &mut Vec<String>, depth: u32, max_depth: u32) -> Result<Value, PipelineError> {
        match value {
            Value::Str(s) if is_alias_string(s) => {
                let path = &s[1..s.len() - 1];
                self.resolve_name(path, stack, depth, max_depth)
            }
            Value::Str(s) if ALIAS_PATTERN.is_match(s) => {
                let mut error = None;
                let interpolated = ALIAS_PATTERN.replace_all(s, |caps: &regex::Captures<'_>| {
                    if error.is_some() {
                        return String::new();
                    }
                    match self.resolve_name(&caps[1], stack, depth, max_depth) {
                        Ok(v) => v.to_string(),
                        Err(e) => {
                            error = Some(e);
                            String::new()
                        }
                    }
                });
                if let Some(e) = error {
                    return Err(e);
                }
                Ok(Value::Str(interpolated.into_owned()))
            }
            Value::Array(items) => {
                let resolved: Result<Vec<Value>, PipelineError> =
                    items.iter().map(|item| self.resolve_value(item, stack, depth, max_depth)).collect();
                Ok(Value::Array(resolved?))
            }
            Value::Object(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.resolve_value(v, stack, depth, max_depth)?);
                }
                Ok(Value::Object(out))
            }
            Value::Ref(uri) => self.resolve_property_ref(uri, stack, depth, max_depth),
            other => Ok(other.clone()),
        }
    }

    /// Resolves `{ "$ref": "#/a/b/c/$value/components/0" }`: walks the
    /// pointer prefix until it matches a known token's dot-path, then
    /// applies the remaining segments inside that token's resolved value
    /// (§4.5).
    fn resolve_property_ref(&self, uri: &str, stack: &mut Vec<String>, depth: u32, max_depth: u32) -> Result<Value, PipelineError> {
        let pointer = uri.strip_prefix("#/").ok_or_else(|| PipelineError::TokenReference { uri: uri.to_string(), suggestions: Vec::new() })?;
        let segments = split_pointer(pointer);
        let value_idx = segments
            .iter()
            .position(|s| s == "$value")
            .ok_or_else(|| PipelineError::TokenReference { uri: uri.to_string(), suggestions: Vec::new() })?;
        let token_name = segments.get(..value_idx).unwrap_or_default().join(".");
        let remaining = segments.get(value_idx + 1..).unwrap_or_default();

        let resolved_token_value = self.resolve_name(&token_name, stack, depth, max_depth)?;
        resolved_token_value
            .pointer_path(remaining)
            .cloned()
            .ok_or_else(|| PipelineError::TokenReference { uri: uri.to_string(), suggestions: Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Permutation, ResolvedToken};

    fn token(name: &str, value: Value) -> ResolvedToken {
        ResolvedToken {
            name: name.to_string(),
            path: name.split('.').map(str::to_string).collect(),
            r#type: Some("color".to_string()),
            original_value: value.clone(),
            value,
            description: None,
            deprecated: None,
            extensions: None,
            source_set: None,
            source_modifier: None,
        }
    }

    #[test]
    fn expands_standalone_alias() {
        let mut tokens = IndexMap::new();
        tokens.insert("color.neutral.black".to_string(), token("color.neutral.black", Value::Str("#000".to_string())));
        tokens.insert("color.text".to_string(), token("color.text", Value::Str("{color.neutral.black}".to_string())));
        let mut table = ResolvedTable { permutation: Permutation::default(), tokens };
        resolve_table(&mut table, 10).unwrap();
        assert_eq!(table.tokens.get("color.text").unwrap().value, Value::Str("#000".to_string()));
    }

    #[test]
    fn rejects_circular_alias_with_trail() {
        let mut tokens = IndexMap::new();
        tokens.insert("a".to_string(), token("a", Value::Str("{b}".to_string())));
        tokens.insert("b".to_string(), token("b", Value::Str("{a}".to_string())));
        let mut table = ResolvedTable { permutation: Permutation::default(), tokens };
        let err = resolve_table(&mut table, 10).unwrap_err();
        match err {
            PipelineError::CircularReference { trail } => assert_eq!(trail, vec!["a".to_string(), "b".to_string(), "a".to_string()]),
            other => panic!("expected circular reference, got {other:?}"),
        }
    }

    #[test]
    fn property_level_ref_pulls_single_array_element() {
        let mut tokens = IndexMap::new();
        tokens.insert(
            "base.blue".to_string(),
            token("base.blue", Value::Object(IndexMap::from([(
                "components".to_string(),
                Value::Array(vec![Value::Num(serde_json::Number::from_f64(0.2).unwrap()), Value::Num(serde_json::Number::from_f64(0.4).unwrap())]),
            )]))),
        );
        tokens.insert(
            "semantic.primary".to_string(),
            token(
                "semantic.primary",
                Value::Object(IndexMap::from([(
                    "components".to_string(),
                    Value::Array(vec![Value::Ref("#/base/blue/$value/components/0".to_string()), Value::Num(serde_json::Number::from_f64(0.7).unwrap())]),
                )])),
            ),
        );
        let mut table = ResolvedTable { permutation: Permutation::default(), tokens };
        resolve_table(&mut table, 10).unwrap();
        let value = &table.tokens.get("semantic.primary").unwrap().value;
        let components = value.as_object().unwrap().get("components").unwrap().as_array().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], Value::Num(serde_json::Number::from_f64(0.2).unwrap()));
    }

    #[test]
    fn array_aliases_do_not_flatten() {
        let mut tokens = IndexMap::new();
        tokens.insert("shadow.base".to_string(), token("shadow.base", Value::Str("base-shadow".to_string())));
        tokens.insert("shadow.accent".to_string(), token("shadow.accent", Value::Str("accent-shadow".to_string())));
        tokens.insert(
            "shadow.layered".to_string(),
            token(
                "shadow.layered",
                Value::Array(vec![Value::Str("{shadow.base}".to_string()), Value::Str("{shadow.accent}".to_string()), Value::Str("literal".to_string())]),
            ),
        );
        let mut table = ResolvedTable { permutation: Permutation::default(), tokens };
        resolve_table(&mut table, 10).unwrap();
        let value = &table.tokens.get("shadow.layered").unwrap().value;
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    /// Builds a non-circular alias chain `a0 -> a1 -> ... -> a<hops-1> ->
    /// "end"` (`hops` hops deep) to probe the I5/§8 depth bound.
    fn chain_table(hops: usize) -> ResolvedTable {
        let mut tokens = IndexMap::new();
        for i in 0..hops {
            let name = format!("a{i}");
            let value = if i + 1 == hops { Value::Str("end".to_string()) } else { Value::Str(format!("{{a{}}}", i + 1)) };
            tokens.insert(name.clone(), token(&name, value));
        }
        ResolvedTable { permutation: Permutation::default(), tokens }
    }

    #[test]
    fn depth_exactly_at_bound_succeeds() {
        let mut table = chain_table(11);
        resolve_table(&mut table, 10).unwrap();
        assert_eq!(table.tokens.get("a0").unwrap().value, Value::Str("end".to_string()));
    }

    #[test]
    fn depth_one_past_bound_fails() {
        let mut table = chain_table(12);
        let err = resolve_table(&mut table, 10).unwrap_err();
        assert!(matches!(err, PipelineError::CircularReference { .. }));
    }
}
