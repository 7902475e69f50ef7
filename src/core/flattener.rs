// src/core/flattener.rs

use crate::core::resolution_engine::{MergedPermutation, Provenance};
use crate::error::PipelineError;
use crate::models::{ResolvedTable, ResolvedToken};
use crate::value::Value;
use indexmap::IndexMap;

/// Stage 6: depth-first walk of a merged document into a dot-path-keyed
/// flat map, inheriting group-level `$type` into descendant tokens that
/// don't override it (§4.4).
pub fn flatten(merged: &MergedPermutation) -> Result<ResolvedTable, PipelineError> {
    let mut tokens = IndexMap::new();
    walk(&merged.document, &[], None, &merged.provenance, &mut tokens)?;
    Ok(ResolvedTable { permutation: merged.permutation.clone(), tokens })
}

fn walk(
    node: &Value,
    path: &[String],
    inherited_type: Option<&str>,
    provenance: &IndexMap<String, Provenance>,
    out: &mut IndexMap<String, ResolvedToken>,
) -> Result<(), PipelineError> {
    let Value::Object(map) = node else { return Ok(()) };

    if node.is_token() {
        let name = path.join(".");
        if out.contains_key(&name) {
            return Err(PipelineError::Configuration(format!("duplicate token path '{name}' in merged document")));
        }
        let own_type = map.get("$type").and_then(Value::as_str).map(str::to_string);
        let value = map.get("$value").cloned().unwrap_or(Value::Null);
        let prov = provenance.get(&name);
        out.insert(
            name.clone(),
            ResolvedToken {
                name,
                path: path.to_vec(),
                r#type: own_type.or_else(|| inherited_type.map(str::to_string)),
                original_value: value.clone(),
                value,
                description: map.get("$description").and_then(Value::as_str).map(str::to_string),
                deprecated: map.get("$deprecated").cloned(),
                extensions: map.get("$extensions").cloned(),
                source_set: prov.and_then(|p| p.source_set.clone()),
                source_modifier: prov.and_then(|p| p.source_modifier.clone()),
            },
        );
        return Ok(());
    }

    let group_type = map.get("$type").and_then(Value::as_str).or(inherited_type);
    for (key, child) in map {
        if key.starts_with('$') {
            continue;
        }
        let mut child_path = path.to_vec();
        child_path.push(key.clone());
        walk(child, &child_path, group_type, provenance, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Permutation;
    use crate::value::from_json;

    fn merged(doc: serde_json::Value) -> MergedPermutation {
        MergedPermutation { permutation: Permutation::default(), document: from_json(doc), provenance: IndexMap::new() }
    }

    #[test]
    fn flattens_nested_groups_into_dot_paths() {
        let m = merged(serde_json::json!({
            "color": { "brand": { "$type": "color", "$value": "blue" } }
        }));
        let table = flatten(&m).unwrap();
        assert!(table.tokens.contains_key("color.brand"));
        assert_eq!(table.tokens.get("color.brand").unwrap().r#type.as_deref(), Some("color"));
    }

    #[test]
    fn inherits_group_level_type() {
        let m = merged(serde_json::json!({
            "color": { "$type": "color", "brand": { "$value": "blue" }, "accent": { "$type": "dimension", "$value": "1px" } }
        }));
        let table = flatten(&m).unwrap();
        assert_eq!(table.tokens.get("color.brand").unwrap().r#type.as_deref(), Some("color"));
        assert_eq!(table.tokens.get("color.accent").unwrap().r#type.as_deref(), Some("dimension"));
    }
}
