// src/lib.rs

//! Resolution and transformation pipeline for DTCG design-token documents:
//! merges ordered token sources and modifier contexts, dereferences
//! `$ref` links, flattens groups into dot-paths, expands alias chains,
//! and runs a per-output Filter -> Transform -> Renderer pipeline over
//! every modifier permutation.

/// Shared numeric/string constants (depth bounds, placeholders, versions).
pub mod constants;
/// The pipeline stages themselves: resolver loading through rendering.
pub mod core;
/// The error taxonomy and diagnostic sink surfaced through `onWarning`.
pub mod error;
/// On-disk document shapes and the in-memory configuration surface.
pub mod models;
/// The tagged `Value` enum the merged token tree is represented as.
pub mod value;

pub use core::orchestrator::{build, BuildReport, OutputResult, OutputState};
pub use error::{Diagnostic, PipelineError};
pub use models::{BuildConfig, OutputConfig, Permutation, ResolvedTable, ResolvedToken, ResolverSource, ValidationMode};
