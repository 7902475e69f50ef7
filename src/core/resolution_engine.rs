// src/core/resolution_engine.rs

use crate::core::file_cache::FileCache;
use crate::core::reference_resolver::ReferenceResolver;
use crate::error::PipelineError;
use crate::models::{ModifierDef, NormalizedResolver, Permutation, RefEntry, ResolutionStep};
use crate::value::Value;
use indexmap::IndexMap;
use log::debug;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Provenance of a single merged leaf: which `set`/`modifier` most recently
/// wrote it (§3, §4.3, I4). Kept in a table parallel to the merged tree
/// rather than inside `$value`, per §9 Design Notes.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    /// The `set` that most recently wrote this leaf, if any.
    pub source_set: Option<String>,
    /// The `modifier-context` that most recently wrote this leaf, if any.
    pub source_modifier: Option<String>,
}

/// A permutation's raw merged document plus leaf provenance, the output of
/// Stage 3 before preprocessors/flattening.
#[derive(Debug)]
pub struct MergedPermutation {
    /// The permutation this document was merged for.
    pub permutation: Permutation,
    /// The deep-merged token tree, pre-flattening.
    pub document: Value,
    /// Leaf provenance, keyed by dot-path.
    pub provenance: IndexMap<String, Provenance>,
}

/// Stage 3: enumerate permutations (Cartesian product of modifier contexts,
/// in document dimension order) — §4.3, P6.
pub fn enumerate_permutations(resolver: &NormalizedResolver) -> Vec<Permutation> {
    let mut permutations = vec![Permutation::default()];
    for modifier_name in &resolver.modifier_order {
        let Some(def) = resolver.document.modifiers.get(modifier_name) else { continue };
        let contexts: Vec<&String> = def.contexts.keys().collect();
        let mut expanded = Vec::with_capacity(permutations.len() * contexts.len().max(1));
        for perm in &permutations {
            for ctx in &contexts {
                let mut inputs = perm.inputs.clone();
                inputs.insert(modifier_name.to_lowercase(), ctx.to_lowercase());
                expanded.push(Permutation { inputs });
            }
        }
        permutations = expanded;
    }
    permutations
}

/// The base permutation: every modifier at its declared default (§3).
pub fn base_permutation(resolver: &NormalizedResolver) -> Permutation {
    let mut inputs = IndexMap::new();
    for name in &resolver.modifier_order {
        if let Some(def) = resolver.document.modifiers.get(name) {
            inputs.insert(name.to_lowercase(), def.default.to_lowercase());
        }
    }
    Permutation { inputs }
}

/// Resolves every permutation's merged document in parallel, using a
/// shared file cache and a private reference-resolution `visited` set per
/// task (§5). Results are returned in permutation order regardless of
/// completion order (P2, §5 ordering guarantees), mirroring the
/// scope+promise pattern used elsewhere in this crate for parallel,
/// join-before-return fan-out.
pub fn resolve_all(
    resolver: &NormalizedResolver,
    cache: &FileCache,
    max_depth: u32,
) -> Vec<Result<MergedPermutation, PipelineError>> {
    let permutations = enumerate_permutations(resolver);
    let promises: Vec<Arc<OnceLock<Result<MergedPermutation, PipelineError>>>> =
        permutations.iter().map(|_| Arc::new(OnceLock::new())).collect();

    rayon::scope(|scope| {
        for (promise, permutation) in promises.iter().zip(permutations.iter()) {
            let promise = promise.clone();
            scope.spawn(move |_| {
                debug!("resolving permutation {:?}", permutation.inputs);
                let result = merge_permutation(resolver, cache, max_depth, permutation);
                let _ = promise.set(result);
            });
        }
    });

    promises
        .into_iter()
        .map(|p| Arc::try_unwrap(p).ok().and_then(OnceLock::into_inner).expect("promise always set"))
        .collect()
}

fn merge_permutation(
    resolver: &NormalizedResolver,
    cache: &FileCache,
    max_depth: u32,
    permutation: &Permutation,
) -> Result<MergedPermutation, PipelineError> {
    let reference_resolver = ReferenceResolver::new(cache, max_depth);
    let mut document = Value::Object(IndexMap::new());
    let mut provenance: IndexMap<String, Provenance> = IndexMap::new();

    for step in &resolver.resolution_order {
        match step {
            ResolutionStep::Set(name) => {
                let set_def = resolver
                    .document
                    .sets
                    .get(name)
                    .ok_or_else(|| PipelineError::Configuration(format!("set '{name}' missing after normalization")))?;
                let label = Provenance { source_set: Some(name.clone()), source_modifier: None };
                for source in &set_def.sources {
                    merge_source(
                        &mut document,
                        source,
                        &resolver.base_dir,
                        &reference_resolver,
                        cache,
                        &label,
                        &mut provenance,
                    )?;
                }
            }
            ResolutionStep::Modifier(name) => {
                let def: &ModifierDef = resolver
                    .document
                    .modifiers
                    .get(name)
                    .ok_or_else(|| PipelineError::Configuration(format!("modifier '{name}' missing after normalization")))?;
                let context = permutation
                    .inputs
                    .get(name.to_lowercase().as_str())
                    .cloned()
                    .unwrap_or_else(|| def.default.to_lowercase());
                let matched_context = def
                    .contexts
                    .keys()
                    .find(|c| c.to_lowercase() == context)
                    .ok_or_else(|| PipelineError::Modifier {
                        name: context.clone(),
                        available: def.contexts.keys().cloned().collect(),
                    })?;
                let sources = def.contexts.get(matched_context).expect("matched key exists");
                let label = Provenance { source_set: None, source_modifier: Some(format!("{}-{context}", name.to_lowercase())) };
                for source in sources {
                    merge_source(
                        &mut document,
                        source,
                        &resolver.base_dir,
                        &reference_resolver,
                        cache,
                        &label,
                        &mut provenance,
                    )?;
                }
            }
        }
    }

    Ok(MergedPermutation { permutation: permutation.clone(), document, provenance })
}

fn merge_source(
    document: &mut Value,
    source: &RefEntry,
    base_dir: &Path,
    reference_resolver: &ReferenceResolver<'_>,
    cache: &FileCache,
    label: &Provenance,
    provenance: &mut IndexMap<String, Provenance>,
) -> Result<(), PipelineError> {
    let path = base_dir.join(&source.reference);
    let raw = cache.load(&path)?;
    let resolved = reference_resolver.resolve(&raw, &raw, path.parent().unwrap_or(base_dir))?;
    *document = merge_node(std::mem::replace(document, Value::Null), &resolved, &[], label, provenance);
    Ok(())
}

/// Deep last-wins merge (§4.3): a token leaf replaces whatever previously
/// occupied its dot-path wholesale; groups recurse key-by-key, preserving
/// children the right-hand side doesn't mention.
fn merge_node(target: Value, source: &Value, path: &[String], label: &Provenance, provenance: &mut IndexMap<String, Provenance>) -> Value {
    if source.is_token() {
        provenance.insert(path.join("."), label.clone());
        return source.clone();
    }
    match source {
        Value::Object(src_map) => {
            let mut out = match target {
                Value::Object(t_map) => t_map,
                _ => IndexMap::new(),
            };
            for (key, value) in src_map {
                if key.starts_with('$') {
                    out.insert(key.clone(), value.clone());
                    continue;
                }
                let mut child_path = path.to_vec();
                child_path.push(key.clone());
                let existing = out.shift_remove(key).unwrap_or(Value::Null);
                let merged_child = merge_node(existing, value, &child_path, label, provenance);
                out.insert(key.clone(), merged_child);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModifierDef, ResolverDocument, SetDef};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_json(dir: &Path, name: &str, content: &str) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn build_resolver(dir: &Path) -> NormalizedResolver {
        write_json(dir, "core.json", r#"{"color": {"text": {"$type": "color", "$value": "black"}}}"#);
        write_json(dir, "dark.json", r#"{"color": {"text": {"$type": "color", "$value": "white"}}}"#);

        let mut sets = IndexMap::new();
        sets.insert("core".to_string(), SetDef { sources: vec![RefEntry { reference: "core.json".to_string() }], description: None });

        let mut contexts = IndexMap::new();
        contexts.insert("light".to_string(), vec![]);
        contexts.insert("dark".to_string(), vec![RefEntry { reference: "dark.json".to_string() }]);
        let mut modifiers = IndexMap::new();
        modifiers.insert("theme".to_string(), ModifierDef { default: "light".to_string(), contexts, description: None });

        let document = ResolverDocument {
            version: crate::constants::SUPPORTED_RESOLVER_VERSION.to_string(),
            name: None,
            sets,
            modifiers,
            resolution_order: vec![
                RefEntry { reference: "#/sets/core".to_string() },
                RefEntry { reference: "#/modifiers/theme".to_string() },
            ],
        };

        NormalizedResolver {
            resolution_order: vec![ResolutionStep::Set("core".to_string()), ResolutionStep::Modifier("theme".to_string())],
            modifier_order: vec!["theme".to_string()],
            base_dir: dir.to_path_buf(),
            document,
        }
    }

    #[test]
    fn enumerates_one_permutation_per_context() {
        let dir = TempDir::new().unwrap();
        let resolver = build_resolver(dir.path());
        let perms = enumerate_permutations(&resolver);
        assert_eq!(perms.len(), 2);
    }

    #[test]
    fn dark_permutation_overrides_core_with_modifier_provenance() {
        let dir = TempDir::new().unwrap();
        let resolver = build_resolver(dir.path());
        let cache = FileCache::new();
        let results = resolve_all(&resolver, &cache, 10);
        assert_eq!(results.len(), 2);

        let dark = results
            .iter()
            .find(|r| r.as_ref().unwrap().permutation.inputs.get("theme").map(String::as_str) == Some("dark"))
            .unwrap()
            .as_ref()
            .unwrap();
        let prov = dark.provenance.get("color.text").unwrap();
        assert_eq!(prov.source_modifier.as_deref(), Some("theme-dark"));

        let light = results
            .iter()
            .find(|r| r.as_ref().unwrap().permutation.inputs.get("theme").map(String::as_str) == Some("light"))
            .unwrap()
            .as_ref()
            .unwrap();
        let prov = light.provenance.get("color.text").unwrap();
        assert_eq!(prov.source_set.as_deref(), Some("core"));
    }
}
