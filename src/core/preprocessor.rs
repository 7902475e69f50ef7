// src/core/preprocessor.rs

use crate::error::PipelineError;
use crate::value::Value;

/// Stage 4 (optional): a user-supplied pass over the raw merged document,
/// run once per permutation before the Reference Pass re-resolves any
/// `$ref`s the pass introduced (§2, §6 Plugin surface).
pub trait Preprocessor: Send + Sync {
    /// Identity used in diagnostics; defaults to a generic label.
    fn name(&self) -> &str {
        "preprocessor"
    }
    /// Rewrites the raw merged document for one permutation.
    fn preprocess(&self, document: Value) -> Result<Value, PipelineError>;
}
