// src/core/renderer/js.rs

use super::json::{meta_block, tokens_to_json};
use super::{standalone_tree, OutputTree, PermutationTokens, Preset, RenderContext, Renderer};
use crate::error::PipelineError;
use indexmap::IndexMap;
use serde_json::Map;

/// Emits a JS ESM module exporting the resolved tokens as a plain object:
/// one `export default { … }` file per permutation in `standalone`, or a
/// single module keyed by permutation, carrying `_meta`, in `bundle` (§4.7).
#[derive(Debug)]
pub struct JsRenderer;

impl Renderer for JsRenderer {
    fn name(&self) -> &str {
        "js"
    }

    fn format(&self, ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>], _options: &serde_json::Value) -> Result<OutputTree, PipelineError> {
        match ctx.preset {
            Preset::Standalone => standalone(ctx, permutations),
            Preset::Bundle => bundle(ctx, permutations),
        }
    }
}

fn standalone(ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>]) -> Result<OutputTree, PipelineError> {
    standalone_tree(ctx, permutations, |tokens| {
        format!("export default {};\n", serde_json::to_string_pretty(&tokens_to_json(tokens)).expect("json serialization cannot fail"))
    })
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
    tree.insert(file, format!("export default {};\n", serde_json::to_string_pretty(&serde_json::Value::Object(root)).expect("json serialization cannot fail")));
    Ok(tree)
}
