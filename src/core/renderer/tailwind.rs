// src/core/renderer/tailwind.rs

use super::{default_selector, standalone_tree, OutputTree, PermutationTokens, Preset, RenderContext, Renderer};
use crate::error::PipelineError;
use crate::models::ResolvedToken;
use crate::value::to_json;
use indexmap::IndexMap;

/// Emits a Tailwind v4 `@theme` block: the base permutation's tokens become
/// theme variables; `bundle` adds single-dimension deviation overrides the
/// same way the CSS cascade bundler does (§4.7).
#[derive(Debug)]
pub struct TailwindRenderer;

impl Renderer for TailwindRenderer {
    fn name(&self) -> &str {
        "tailwind"
    }

    fn format(&self, ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>], _options: &serde_json::Value) -> Result<OutputTree, PipelineError> {
        match ctx.preset {
            Preset::Standalone => standalone(ctx, permutations),
            Preset::Bundle => bundle(ctx, permutations),
        }
    }
}

fn standalone(ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>]) -> Result<OutputTree, PipelineError> {
    standalone_tree(ctx, permutations, theme_block)
}

fn bundle(ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>]) -> Result<OutputTree, PipelineError> {
    let base = permutations.iter().find(|p| ctx.is_base(p.permutation)).ok_or(PipelineError::BasePermutation)?;
    let mut content = theme_block(base.tokens);

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
        content.push('\n');
        content.push_str(&override_block(&default_selector(&modifier, &context, false), &deviating));
    }

    let file = ctx.filename_template.replace("{_base}", "bundle");
    let mut tree = IndexMap::new();
    tree.insert(file, content);
    Ok(tree)
}

fn theme_block(tokens: &[ResolvedToken]) -> String {
    let mut out = String::from("@theme {\n");
    for token in tokens {
        out.push_str(&format!("  --{}: {};\n", token.name, css_value(token)));
    }
    out.push_str("}\n");
    out
}

fn override_block(selector: &str, tokens: &[ResolvedToken]) -> String {
    let mut out = format!("{selector} {{\n");
    for token in tokens {
        out.push_str(&format!("  --{}: {};\n", token.name, css_value(token)));
    }
    out.push_str("}\n");
    out
}

fn css_value(token: &ResolvedToken) -> String {
    match &token.value {
        crate::value::Value::Str(s) => s.clone(),
        other => to_json(other).to_string(),
    }
}
