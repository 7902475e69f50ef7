// src/error.rs

use thiserror::Error;

/// The error taxonomy named by §7. Each variant carries the fields its
/// propagation and suggestion logic needs; `Pipeline` is the top-level
/// enum aggregating them so every stage can return one `Result` type.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Missing or unknown reference; carries suggestions from a
    /// closest-match search over existing names.
    #[error("unresolved reference '{uri}'{}", suggestion_suffix(.suggestions))]
    TokenReference {
        /// The unresolved `$ref`/alias URI.
        uri: String,
        /// Closest-match existing names, for the diagnostic message.
        suggestions: Vec<String>,
    },

    /// An alias or `$ref` chain revisits a node it has already entered.
    #[error("circular reference detected: {}", .trail.join(" -> "))]
    CircularReference {
        /// The chain of names visited, in order, ending back at the repeat.
        trail: Vec<String>,
    },

    /// Unknown modifier or context name.
    #[error("unknown modifier/context '{name}', available: {}", .available.join(", "))]
    Modifier {
        /// The unknown modifier or context name.
        name: String,
        /// The valid names it could have been.
        available: Vec<String>,
    },

    /// Schema/document-shape failure; `issues` is a list of (path, message).
    #[error("validation failed: {}", .issues.iter().map(|(p, m)| format!("{p}: {m}")).collect::<Vec<_>>().join("; "))]
    Validation {
        /// (document path, failure message) pairs.
        issues: Vec<(String, String)>,
    },

    /// I/O failure reading a `$ref` target.
    #[error("file operation '{op}' failed for '{path}': {cause}")]
    FileOperation {
        /// The operation attempted, e.g. `"read"`.
        op: String,
        /// The path operated on.
        path: String,
        /// The underlying OS error message.
        cause: String,
    },

    /// Malformed plugin configuration or a missing required option.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A bundler could not identify a base permutation among its inputs.
    #[error("no base permutation available for bundling")]
    BasePermutation,
}

fn suggestion_suffix(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(", did you mean: {}?", suggestions.join(", "))
    }
}

impl PipelineError {
    /// The tag used in user-visible error reporting (§7).
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::TokenReference { .. } => "TokenReferenceError",
            PipelineError::CircularReference { .. } => "CircularReferenceError",
            PipelineError::Modifier { .. } => "ModifierError",
            PipelineError::Validation { .. } => "ValidationError",
            PipelineError::FileOperation { .. } => "FileOperationError",
            PipelineError::Configuration(_) => "ConfigurationError",
            PipelineError::BasePermutation => "BasePermutationError",
        }
    }
}

/// A warning or error surfaced through the `onWarning` sink (§7
/// "Warnings follow the same shape").
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The rendered error message.
    pub message: String,
    /// The document path this diagnostic is about, if known.
    pub source_path: Option<String>,
    /// Closest-match suggestions, if the underlying error carried any.
    pub suggestions: Vec<String>,
    /// The error taxonomy tag from `PipelineError::kind`.
    pub kind: &'static str,
}

impl Diagnostic {
    /// Builds a diagnostic from a pipeline error, carrying over any
    /// suggestions it produced.
    pub fn from_error(error: &PipelineError, source_path: Option<String>) -> Self {
        let suggestions = match error {
            PipelineError::TokenReference { suggestions, .. } => suggestions.clone(),
            PipelineError::Modifier { available, .. } => available.clone(),
            _ => Vec::new(),
        };
        Self {
            message: error.to_string(),
            source_path,
            suggestions,
            kind: error.kind(),
        }
    }
}

/// Finds the `limit` closest existing names to `query` by Levenshtein
/// distance, used to populate `TokenReferenceError::suggestions` and
/// `ModifierError::available` (§7).
pub fn closest_matches<'a>(query: &str, candidates: impl IntoIterator<Item = &'a String>, limit: usize) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|c| (levenshtein(query, c), c.as_str()))
        .collect();
    scored.sort_by_key(|(dist, _)| *dist);
    scored.into_iter().take(limit).map(|(_, s)| s.to_string()).collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        if let Some(slot) = curr.first_mut() {
            *slot = i;
        }
        for j in 1..=b.len() {
            let cost = usize::from(a.get(i - 1) != b.get(j - 1));
            let up = prev.get(j).copied().unwrap_or(0) + 1;
            let left = curr.get(j - 1).copied().unwrap_or(0) + 1;
            let diag = prev.get(j - 1).copied().unwrap_or(0) + cost;
            if let Some(slot) = curr.get_mut(j) {
                *slot = up.min(left).min(diag);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev.last().copied().unwrap_or(0)
}
