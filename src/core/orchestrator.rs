// src/core/orchestrator.rs

use crate::core::alias_resolver;
use crate::core::file_cache::FileCache;
use crate::core::filter::apply_filters;
use crate::core::flattener;
use crate::core::reference_resolver::ReferenceResolver;
use crate::core::renderer::{PermutationTokens, RenderContext};
use crate::core::resolution_engine;
use crate::core::resolver_loader;
use crate::core::transform::apply_transforms;
use crate::error::{Diagnostic, PipelineError};
use crate::models::{BuildConfig, ResolvedTable, ValidationMode};
use log::{debug, error};

/// Per-output lifecycle (§4.8). `Written` is reached only by the external
/// file-writing collaborator this crate hands its `OutputTree`s to; a
/// build this crate runs end-to-end stops at `Succeeded` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Not yet started.
    Pending,
    /// Permutations are being filtered/transformed/rendered.
    Rendering,
    /// The renderer returned an `OutputTree`.
    Succeeded,
    /// A transform or the renderer raised an error.
    Failed,
}

/// One configured output's result.
#[derive(Debug)]
pub struct OutputResult {
    /// The output's configured name.
    pub name: String,
    /// Where this output landed in its lifecycle.
    pub state: OutputState,
    /// The rendered virtual files, empty if `state` is `Failed`.
    pub files: crate::core::renderer::OutputTree,
}

/// The orchestrator's return value (§4.8 `build(config) -> { success, outputs, errors }`).
#[derive(Debug)]
pub struct BuildReport {
    /// `true` iff `errors` is empty.
    pub success: bool,
    /// One result per configured output, in configuration order.
    pub outputs: Vec<OutputResult>,
    /// Every error/warning surfaced during the build.
    pub errors: Vec<Diagnostic>,
}

/// Stage 1-10 entry point. A failure loading or enumerating the resolver
/// cancels the whole build; a failure resolving/flattening/aliasing one
/// permutation excludes only that permutation; a failure in one output's
/// filters/transforms/renderer fails only that output (§7).
pub fn build(config: &BuildConfig) -> BuildReport {
    let mut errors = Vec::new();

    let normalized = match resolver_loader::load(&config.resolver_source) {
        Ok(n) => n,
        Err(e) => {
            errors.push(Diagnostic::from_error(&e, None));
            return BuildReport { success: false, outputs: Vec::new(), errors };
        }
    };

    let cache = FileCache::new();
    let merged = resolution_engine::resolve_all(&normalized, &cache, config.max_depth);

    let mut tables: Vec<ResolvedTable> = Vec::with_capacity(merged.len());
    for result in merged {
        match result.and_then(|mut m| {
            if !config.preprocessors.is_empty() {
                for preprocessor in &config.preprocessors {
                    m.document = preprocessor.preprocess(m.document)?;
                }
                // Stage 5: re-resolve any `$ref`s the preprocessors introduced.
                let reference_resolver = ReferenceResolver::new(&cache, config.max_depth);
                m.document = reference_resolver.resolve(&m.document, &m.document, &normalized.base_dir)?;
            }
            let mut table = flattener::flatten(&m)?;
            alias_resolver::resolve_table(&mut table, config.max_depth)?;
            Ok(table)
        }) {
            Ok(table) => tables.push(table),
            Err(e) => report(config, &mut errors, &e, None),
        }
    }

    let base_permutation = resolution_engine::base_permutation(&normalized);
    let mut defaults = indexmap::IndexMap::new();
    for name in &normalized.modifier_order {
        if let Some(def) = normalized.document.modifiers.get(name) {
            defaults.insert(name.to_lowercase(), def.default.to_lowercase());
        }
    }

    let mut outputs = Vec::with_capacity(config.outputs.len());
    for output in &config.outputs {
        debug!("rendering output '{}'", output.name);
        let result = render_output(output, &tables, &normalized.modifier_order, &defaults, &base_permutation);
        match result {
            Ok(files) => outputs.push(OutputResult { name: output.name.clone(), state: OutputState::Succeeded, files }),
            Err(e) => {
                error!("output '{}' failed: {e}", output.name);
                report(config, &mut errors, &e, None);
                outputs.push(OutputResult { name: output.name.clone(), state: OutputState::Failed, files: Default::default() });
            }
        }
    }

    BuildReport { success: errors.is_empty(), outputs, errors }
}

fn render_output(
    output: &crate::models::OutputConfig,
    tables: &[ResolvedTable],
    modifier_order: &[String],
    defaults: &indexmap::IndexMap<String, String>,
    base_permutation: &crate::models::Permutation,
) -> Result<crate::core::renderer::OutputTree, PipelineError> {
    let mut per_permutation = Vec::with_capacity(tables.len());
    for table in tables {
        let values: Vec<_> = table.tokens.values().cloned().collect();
        let filtered = apply_filters(&values, &output.filters);
        let transformed = apply_transforms(filtered, &output.transforms)?;
        per_permutation.push((&table.permutation, transformed));
    }

    let permutation_tokens: Vec<PermutationTokens<'_>> = per_permutation
        .iter()
        .map(|(permutation, tokens)| PermutationTokens { permutation, tokens: tokens.as_slice() })
        .collect();

    let ctx = RenderContext {
        output_name: &output.name,
        preset: output.preset,
        filename_template: &output.filename_template,
        modifier_order,
        defaults,
        base_permutation,
    };

    output.renderer.format(&ctx, &permutation_tokens, &output.options)
}

fn report(config: &BuildConfig, errors: &mut Vec<Diagnostic>, error: &PipelineError, source_path: Option<String>) {
    let diagnostic = Diagnostic::from_error(error, source_path);
    match config.validation_mode {
        ValidationMode::Error => errors.push(diagnostic),
        ValidationMode::Warn => {
            if let Some(sink) = &config.on_warning {
                sink(&diagnostic);
            }
        }
        ValidationMode::Off => {}
    }
}
