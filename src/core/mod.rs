// src/core/mod.rs

/// Stage 7: alias and property-level `$ref` expansion.
pub mod alias_resolver;
/// The shared, single-flight-gated file read cache (§4.2, §5).
pub mod file_cache;
/// Stage 8: per-output token filtering.
pub mod filter;
/// Stage 6: tree-to-dot-path flattening with `$type` inheritance.
pub mod flattener;
/// Stage 1-10 entry point: `build(config)`.
pub mod orchestrator;
/// Stage 4: optional user-supplied passes over the raw merged document.
pub mod preprocessor;
/// Stage 2/5: whole-node `$ref` expansion.
pub mod reference_resolver;
/// Stage 10: the `Renderer` trait and built-in renderers.
pub mod renderer;
/// Stage 3: permutation enumeration and the deep last-wins merge.
pub mod resolution_engine;
/// Stage 1: resolver document loading and normalization.
pub mod resolver_loader;
/// Stage 9: per-output token transformation.
pub mod transform;
