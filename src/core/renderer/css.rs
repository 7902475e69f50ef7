// src/core/renderer/css.rs

use super::{default_selector, standalone_tree, OutputTree, PermutationTokens, RenderContext, Renderer};
use crate::error::PipelineError;
use crate::value::to_json;
use indexmap::IndexMap;

/// Emits CSS custom properties: one `:root` block per permutation in the
/// `standalone` preset, or a cascade of `:root` + single-dimension
/// `[data-modifier="context"]` overrides in the `bundle` preset (§4.7).
#[derive(Debug)]
pub struct CssRenderer;

impl Renderer for CssRenderer {
    fn name(&self) -> &str {
        "css"
    }

    fn format(&self, ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>], _options: &serde_json::Value) -> Result<OutputTree, PipelineError> {
        match ctx.preset {
            super::Preset::Standalone => standalone(ctx, permutations),
            super::Preset::Bundle => bundle(ctx, permutations),
        }
    }
}

fn standalone(ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>]) -> Result<OutputTree, PipelineError> {
    standalone_tree(ctx, permutations, |tokens| css_block(":root", tokens))
}

fn bundle(ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>]) -> Result<OutputTree, PipelineError> {
    let base = permutations
        .iter()
        .find(|p| ctx.is_base(p.permutation))
        .ok_or(PipelineError::BasePermutation)?;

    let mut content = css_block(":root", base.tokens);

    for perm in permutations {
        if ctx.is_base(perm.permutation) {
            continue;
        }
        let Some((modifier, context)) = ctx.single_dimension_deviation(perm.permutation) else {
            continue;
        };
        let label = format!("{modifier}-{context}");
        let deviating: Vec<_> = perm.tokens.iter().filter(|t| t.source_modifier.as_deref() == Some(label.as_str())).cloned().collect();
        if deviating.is_empty() {
            continue;
        }
        let selector = default_selector(&modifier, &context, false);
        content.push('\n');
        content.push_str(&css_block(&selector, &deviating));
    }

    let file = ctx.filename_template.replace("{_base}", "bundle");
    let mut tree = IndexMap::new();
    tree.insert(file, content);
    Ok(tree)
}

fn css_block(selector: &str, tokens: &[crate::models::ResolvedToken]) -> String {
    let mut out = format!("{selector} {{\n");
    for token in tokens {
        let css_value = match &token.value {
            crate::value::Value::Str(s) => s.clone(),
            other => to_json(other).to_string(),
        };
        out.push_str(&format!("  --{}: {};\n", token.name, css_value));
    }
    out.push_str("}\n");
    out
}
