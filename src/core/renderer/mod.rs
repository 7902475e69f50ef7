// src/core/renderer/mod.rs

/// CSS custom-property renderer.
pub mod css;
/// JS ESM module renderer.
pub mod js;
/// Flat JSON tree renderer.
pub mod json;
/// Tailwind `@theme` block renderer.
pub mod tailwind;

use crate::constants::BASE_PLACEHOLDER;
use crate::error::PipelineError;
use crate::models::{Permutation, ResolvedToken};
use indexmap::IndexMap;

/// A renderer's return value: virtual-file-path -> string contents (§4.7).
pub type OutputTree = IndexMap<String, String>;

/// How a renderer spreads its permutations across files (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// One file per permutation.
    Standalone,
    /// A single file covering every permutation.
    Bundle,
}

/// One permutation's filtered-and-transformed tokens, as handed to a
/// renderer.
#[derive(Debug)]
pub struct PermutationTokens<'a> {
    /// Which permutation these tokens were resolved for.
    pub permutation: &'a Permutation,
    /// The filtered-and-transformed tokens themselves.
    pub tokens: &'a [ResolvedToken],
}

/// Everything a renderer needs besides the tokens themselves (§4.7 `ctx`).
#[derive(Debug)]
pub struct RenderContext<'a> {
    /// This output's configured name.
    pub output_name: &'a str,
    /// `standalone` or `bundle`.
    pub preset: Preset,
    /// The brace-placeholder filename template (§6).
    pub filename_template: &'a str,
    /// Modifier names in document-declaration order (§4.3 dimension order).
    pub modifier_order: &'a [String],
    /// Modifier name -> default context, lower-cased.
    pub defaults: &'a IndexMap<String, String>,
    /// The permutation where every modifier is at its default.
    pub base_permutation: &'a Permutation,
}

impl<'a> RenderContext<'a> {
    /// `true` if `permutation` differs from the base permutation in
    /// exactly one modifier (the cascade-bundling single-dimension-deviation
    /// test, §4.7).
    pub fn single_dimension_deviation(&self, permutation: &Permutation) -> Option<(String, String)> {
        let mut deviation = None;
        for (modifier, base_context) in &self.base_permutation.inputs {
            let context = permutation.inputs.get(modifier)?;
            if context != base_context {
                if deviation.is_some() {
                    return None;
                }
                deviation = Some((modifier.clone(), context.clone()));
            }
        }
        deviation
    }

    /// `true` if `permutation` is the all-defaults base permutation.
    pub fn is_base(&self, permutation: &Permutation) -> bool {
        permutation == self.base_permutation
    }

    /// Expands `{modifier}`/`{_base}` placeholders in the filename template
    /// using a permutation's context values (§6).
    pub fn filename_for(&self, permutation: &Permutation) -> String {
        let mut name = self.filename_template.to_string();
        for (modifier, context) in &permutation.inputs {
            name = name.replace(&format!("{{{modifier}}}"), context);
        }
        if self.is_base(permutation) {
            name = name.replace(&format!("{{{BASE_PLACEHOLDER}}}"), "base");
        }
        name
    }
}

/// `format(ctx, options) -> OutputTree` (§4.7).
pub trait Renderer: Send + Sync {
    /// Identity used in diagnostics and configuration lookups.
    fn name(&self) -> &str;
    /// Renders every permutation's tokens into an `OutputTree`.
    fn format(&self, ctx: &RenderContext<'_>, permutations: &[PermutationTokens<'_>], options: &serde_json::Value) -> Result<OutputTree, PipelineError>;
}

/// Default selector for a cascade-bundled modifier deviation: `[data-<modifier>="<context>"]`.
pub fn default_selector(modifier: &str, context: &str, is_base: bool) -> String {
    if is_base {
        ":root".to_string()
    } else {
        format!("[data-{modifier}=\"{context}\"]")
    }
}

/// Builds a `standalone`-preset tree: one file per permutation, rejecting a
/// filename template that produces the same path for two permutations
/// (§6: "collisions are a configuration error").
pub fn standalone_tree(
    ctx: &RenderContext<'_>,
    permutations: &[PermutationTokens<'_>],
    mut render_body: impl FnMut(&[ResolvedToken]) -> String,
) -> Result<OutputTree, PipelineError> {
    let mut tree = OutputTree::new();
    for perm in permutations {
        let file = ctx.filename_for(perm.permutation);
        if tree.contains_key(&file) {
            return Err(PipelineError::Configuration(format!(
                "filename template '{}' produces duplicate path '{file}' across permutations",
                ctx.filename_template
            )));
        }
        tree.insert(file, render_body(perm.tokens));
    }
    Ok(tree)
}
