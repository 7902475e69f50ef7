// src/constants.rs

/// Default bound on alias/reference recursion depth (§3 I5, §8 boundary
/// behaviors: depth exactly at the limit succeeds, limit+1 fails).
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// Placeholder substituted by a renderer that wants to emit one "base" file
/// regardless of a filename template's modifier placeholders (§6).
pub const BASE_PLACEHOLDER: &str = "_base";

/// Resolver-document schema version this pipeline accepts (§4.1).
pub const SUPPORTED_RESOLVER_VERSION: &str = "2025.10";
