// src/models.rs

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The only resolver-document schema version this pipeline accepts.
pub const SUPPORTED_VERSION: &str = "2025.10";

/// A raw `$ref` entry as it appears inside `sets`/`modifiers`/`resolutionOrder`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefEntry {
    /// The URI: `#/<pointer>`, a relative/absolute file path, optionally
    /// with a `#/<pointer>` fragment.
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// One named, ordered layer of token-document sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDef {
    /// Token-document sources, merged in order.
    pub sources: Vec<RefEntry>,
    /// Human-readable description; purely informational.
    #[serde(default)]
    pub description: Option<String>,
}

/// One named modifier dimension: a default context and the full set of
/// contexts it can take, each with its own ordered sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierDef {
    /// The context name used when a build doesn't specify this modifier.
    pub default: String,
    /// Context name -> its ordered token-document sources.
    pub contexts: IndexMap<String, Vec<RefEntry>>,
    /// Human-readable description; purely informational.
    #[serde(default)]
    pub description: Option<String>,
}

/// The raw, on-disk resolver document shape (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverDocument {
    /// The resolver schema version; only `2025.10` is accepted.
    pub version: String,
    /// Human-readable document name; purely informational.
    #[serde(default)]
    pub name: Option<String>,
    /// Named, ordered layers of token-document sources.
    #[serde(default)]
    pub sets: IndexMap<String, SetDef>,
    /// Named modifier dimensions.
    #[serde(default)]
    pub modifiers: IndexMap<String, ModifierDef>,
    /// The order sets/modifiers are merged in.
    #[serde(rename = "resolutionOrder")]
    pub resolution_order: Vec<RefEntry>,
}

/// A single step of the normalized `resolutionOrder`, resolved from its raw
/// `{ "$ref": "#/sets/X" }` form into a concrete kind + name pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStep {
    /// `#/sets/<name>`.
    Set(String),
    /// `#/modifiers/<name>`.
    Modifier(String),
}

/// The normalized resolver document produced by the Resolver Loader (§4.1):
/// a validated `ResolverDocument` plus the directory relative `$ref`s
/// resolve against and the normalized resolution order.
#[derive(Debug, Clone)]
pub struct NormalizedResolver {
    /// The validated, parsed resolver document.
    pub document: ResolverDocument,
    /// Directory relative `$ref`s resolve against.
    pub base_dir: PathBuf,
    /// `resolutionOrder`, normalized into concrete steps.
    pub resolution_order: Vec<ResolutionStep>,
    /// Modifier names in document-declaration order; this fixes dimension
    /// order for permutation enumeration and keyed bundling (§4.3, §4.7).
    pub modifier_order: Vec<String>,
}

/// A concrete assignment of one context to every modifier (§3 Permutation).
/// Keys and values are normalized (lower-cased) for comparison; original
/// casing is preserved only where the document text itself is used (filename
/// interpolation) per §6.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Permutation {
    /// modifier name (lower-case) -> context name (lower-case).
    pub inputs: IndexMap<String, String>,
}

impl Permutation {
    /// The stable bundling key: dimension values in modifier-declaration
    /// order joined with `-` (§4.7 Keyed bundling).
    pub fn key(&self, modifier_order: &[String]) -> String {
        modifier_order
            .iter()
            .filter_map(|m| self.inputs.get(m.to_lowercase().as_str()))
            .cloned()
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// A fully merged, flattened, alias-resolved token (§3 Resolved tokens table,
/// §4.4, §4.5). Provenance is kept alongside rather than inside `$value` so
/// transforms cannot accidentally corrupt it (§9 Design Notes).
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    /// The joined dot-path, e.g. `color.brand.primary`.
    pub name: String,
    /// The dot-path as an ordered segment list.
    pub path: Vec<String>,
    /// `$type`, local or inherited from an enclosing group; `None` only
    /// for primitive tokens that never declared or inherited one (I2).
    pub r#type: Option<String>,
    /// The fully alias-resolved `$value` (I1, I3).
    pub value: Value,
    /// `$value` as captured by the flattener, before alias expansion;
    /// consumed by `isAlias`/`isBase` filters and cascade bundlers.
    pub original_value: Value,
    /// `$description`, if present.
    pub description: Option<String>,
    /// `$deprecated`, if present.
    pub deprecated: Option<Value>,
    /// `$extensions`, if present.
    pub extensions: Option<Value>,
    /// The `set` that most recently wrote this leaf, if any (I4).
    pub source_set: Option<String>,
    /// The `modifier-context` that most recently wrote this leaf, if any (I4).
    pub source_modifier: Option<String>,
}

impl ResolvedToken {
    /// `true` if the un-expanded value was a standalone alias string.
    pub fn is_alias(&self) -> bool {
        matches!(&self.original_value, Value::Str(s) if is_alias_string(s))
    }
}

/// `true` if `s` is a standalone `"{dot.path}"` alias (the whole string,
/// not merely containing braces somewhere).
pub fn is_alias_string(s: &str) -> bool {
    s.starts_with('{') && s.ends_with('}') && s.len() > 2 && !s[1..s.len() - 1].contains(['{', '}'])
}

/// A permutation's resolved tokens, keyed by dot-path (§3).
#[derive(Debug, Clone, Default)]
pub struct ResolvedTable {
    /// The permutation this table was resolved for.
    pub permutation: Permutation,
    /// Resolved tokens, keyed by dot-path.
    pub tokens: IndexMap<String, ResolvedToken>,
}

/// Validation strictness, passed to the orchestrator (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Any recoverable error aborts the affected scope.
    #[default]
    Error,
    /// Recoverable errors are downgraded to warnings; the pipeline continues.
    Warn,
    /// Recoverable errors are silently ignored.
    Off,
}

/// One configured rendering target (ambient; implied by §4.8's `build(config)`).
pub struct OutputConfig {
    /// This output's name, used in diagnostics and `OutputResult`.
    pub name: String,
    /// The renderer that produces this output's `OutputTree`.
    pub renderer: Box<dyn crate::core::renderer::Renderer>,
    /// Predicates ANDed together and applied before transforms (§4.6).
    pub filters: Vec<Box<dyn crate::core::filter::Filter>>,
    /// Rewrites applied in list order after filtering (§4.6).
    pub transforms: Vec<Box<dyn crate::core::transform::Transform>>,
    /// `standalone` or `bundle` (§4.7).
    pub preset: crate::core::renderer::Preset,
    /// Brace-placeholder filename template (§6).
    pub filename_template: String,
    /// Renderer-specific options, passed through opaquely.
    pub options: serde_json::Value,
}

impl std::fmt::Debug for OutputConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputConfig")
            .field("name", &self.name)
            .field("preset", &self.preset)
            .field("filename_template", &self.filename_template)
            .finish_non_exhaustive()
    }
}

/// Top-level build configuration (ambient; §6 `validation`, §4.8 `build(config)`).
pub struct BuildConfig {
    /// Where to load the resolver document from.
    pub resolver_source: ResolverSource,
    /// The outputs to render.
    pub outputs: Vec<OutputConfig>,
    /// Stage 4 passes run over each permutation's raw merged document.
    pub preprocessors: Vec<Box<dyn crate::core::preprocessor::Preprocessor>>,
    /// How recoverable errors are handled (§6 `validation.mode`).
    pub validation_mode: ValidationMode,
    /// Sink for diagnostics downgraded to warnings (§6 `validation.onWarning`).
    pub on_warning: Option<Box<dyn Fn(&crate::error::Diagnostic) + Send + Sync>>,
    /// Max alias/reference recursion depth (I5, default 10).
    pub max_depth: u32,
}

impl std::fmt::Debug for BuildConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildConfig")
            .field("resolver_source", &self.resolver_source)
            .field("outputs", &self.outputs)
            .field("validation_mode", &self.validation_mode)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// Where the resolver document comes from.
#[derive(Debug, Clone)]
pub enum ResolverSource {
    /// Load and parse the resolver document from this path.
    Path(PathBuf),
    /// An already-parsed, in-memory resolver document plus the directory
    /// relative `$ref`s resolve against.
    InMemory(ResolverDocument, PathBuf),
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            resolver_source: ResolverSource::InMemory(
                ResolverDocument {
                    version: SUPPORTED_VERSION.to_string(),
                    name: None,
                    sets: IndexMap::new(),
                    modifiers: IndexMap::new(),
                    resolution_order: Vec::new(),
                },
                PathBuf::from("."),
            ),
            outputs: Vec::new(),
            preprocessors: Vec::new(),
            validation_mode: ValidationMode::Error,
            on_warning: None,
            max_depth: crate::constants::DEFAULT_MAX_DEPTH,
        }
    }
}
