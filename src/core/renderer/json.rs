// src/core/renderer/json.rs

use super::{standalone_tree, OutputTree, PermutationTokens, Preset, RenderContext, Renderer};
use crate::error::PipelineError;
use crate::value::to_json;
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

/// Emits a flat JSON tree keyed by token name: one file per permutation in
/// `standalone`, or a single keyed object (one entry per permutation key)
/// with a `_meta` block in `bundle` (§4.7 Keyed bundling).
#[derive(Debug)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn format(&self, ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>], _options: &serde_json::Value) -> Result<OutputTree, PipelineError> {
        match ctx.preset {
            Preset::Standalone => standalone(ctx, permutations),
            Preset::Bundle => bundle(ctx, permutations),
        }
    }
}

pub(super) fn tokens_to_json(tokens: &[crate::models::ResolvedToken]) -> Json {
    let mut map = Map::with_capacity(tokens.len());
    for token in tokens {
        map.insert(token.name.clone(), to_json(&token.value));
    }
    Json::Object(map)
}

fn standalone(ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>]) -> Result<OutputTree, PipelineError> {
    standalone_tree(ctx, permutations, |tokens| {
        serde_json::to_string_pretty(&tokens_to_json(tokens)).expect("json serialization cannot fail")
    })
}

pub(super) fn meta_block(ctx: &RenderContext<'_>) -> Json {
    let mut meta = Map::new();
    meta.insert("dimensions".to_string(), Json::Array(ctx.modifier_order.iter().map(|m| Json::String(m.clone())).collect()));
    let mut defaults = Map::new();
    for (k, v) in ctx.defaults {
        defaults.insert(k.clone(), Json::String(v.clone()));
    }
    meta.insert("defaults".to_string(), Json::Object(defaults));
    Json::Object(meta)
}

fn bundle(ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>]) -> Result<OutputTree, PipelineError> {
    let mut root = Map::new();
    for perm in permutations {
        let key = perm.permutation.key(ctx.modifier_order);
        root.insert(key, tokens_to_json(perm.tokens));
    }
    root.insert("_meta".to_string(), meta_block(ctx));

    let file = ctx.filename_template.replace("{_base}", "bundle");
    let mut tree = IndexMap::new();
    tree.insert(file, serde_json::to_string_pretty(&Json::Object(root)).expect("json serialization cannot fail"));
    Ok(tree)
}
