// src/core/resolver_loader.rs

use crate::constants::SUPPORTED_RESOLVER_VERSION;
use crate::error::PipelineError;
use crate::models::{NormalizedResolver, ResolutionStep, ResolverDocument, ResolverSource};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Stage 1: read and normalize the resolver document, establishing the base
/// directory relative `$ref`s resolve against (§4.1).
pub fn load(source: &ResolverSource) -> Result<NormalizedResolver, PipelineError> {
    let (document, base_dir) = match source {
        ResolverSource::Path(path) => (load_from_path(path)?, base_dir_of(path)),
        ResolverSource::InMemory(doc, dir) => (doc.clone(), dir.clone()),
    };

    if document.version != SUPPORTED_RESOLVER_VERSION {
        return Err(PipelineError::Configuration(format!(
            "unsupported resolver version '{}', expected '{SUPPORTED_RESOLVER_VERSION}'",
            document.version
        )));
    }

    let resolution_order = normalize_resolution_order(&document)?;
    let modifier_order: Vec<String> = document.modifiers.keys().cloned().collect();

    debug!(
        "loaded resolver '{}' with {} sets, {} modifiers",
        document.name.as_deref().unwrap_or("<unnamed>"),
        document.sets.len(),
        document.modifiers.len()
    );

    Ok(NormalizedResolver {
        document,
        base_dir,
        resolution_order,
        modifier_order,
    })
}

fn load_from_path(path: &Path) -> Result<ResolverDocument, PipelineError> {
    let content = fs::read_to_string(path).map_err(|e| PipelineError::FileOperation {
        op: "read".to_string(),
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| PipelineError::FileOperation {
        op: "parse".to_string(),
        path: path.display().to_string(),
        cause: e.to_string(),
    })
}

fn base_dir_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
}

/// Turns `resolutionOrder`'s raw `{ "$ref": "#/sets/X" | "#/modifiers/Y" }`
/// entries into `ResolutionStep`s, validating each name exists.
fn normalize_resolution_order(document: &ResolverDocument) -> Result<Vec<ResolutionStep>, PipelineError> {
    document
        .resolution_order
        .iter()
        .map(|entry| {
            let uri = entry.reference.as_str();
            if let Some(name) = uri.strip_prefix("#/sets/") {
                if !document.sets.contains_key(name) {
                    return Err(PipelineError::TokenReference {
                        uri: uri.to_string(),
                        suggestions: crate::error::closest_matches(name, document.sets.keys(), 3),
                    });
                }
                Ok(ResolutionStep::Set(name.to_string()))
            } else if let Some(name) = uri.strip_prefix("#/modifiers/") {
                if !document.modifiers.contains_key(name) {
                    return Err(PipelineError::TokenReference {
                        uri: uri.to_string(),
                        suggestions: crate::error::closest_matches(name, document.modifiers.keys(), 3),
                    });
                }
                Ok(ResolutionStep::Modifier(name.to_string()))
            } else {
                Err(PipelineError::Configuration(format!(
                    "resolutionOrder entry '{uri}' is neither '#/sets/<name>' nor '#/modifiers/<name>'"
                )))
            }
        })
        .collect()
}
