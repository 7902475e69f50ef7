// src/core/filter.rs

use crate::models::ResolvedToken;
use regex::Regex;

/// A pure predicate over a resolved token (§4.6). Filters for an output are
/// ANDed together and run before transforms.
pub trait Filter: Send + Sync {
    /// Identity used in diagnostics; defaults to a generic label.
    fn name(&self) -> &str {
        "filter"
    }
    /// `true` if `token` should be kept.
    fn filter(&self, token: &ResolvedToken) -> bool;
}

/// Keeps tokens whose `$type` matches exactly.
#[derive(Debug)]
pub struct ByType {
    /// The `$type` value to match.
    pub token_type: String,
}

impl Filter for ByType {
    fn name(&self) -> &str {
        "byType"
    }
    fn filter(&self, token: &ResolvedToken) -> bool {
        token.r#type.as_deref() == Some(self.token_type.as_str())
    }
}

/// Keeps tokens whose dot-path matches a string prefix or, if `pattern`
/// parses as a regex, a regex match.
#[derive(Debug)]
pub struct ByPath {
    /// The raw pattern text, kept for diagnostics even when it parses as a regex.
    pub pattern: String,
    regex: Option<Regex>,
}

impl ByPath {
    /// Builds a filter from a raw pattern, compiling it as a regex if it
    /// parses as one.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let regex = Regex::new(&pattern).ok();
        Self { pattern, regex }
    }
}

impl Filter for ByPath {
    fn name(&self) -> &str {
        "byPath"
    }
    fn filter(&self, token: &ResolvedToken) -> bool {
        match &self.regex {
            Some(re) => re.is_match(&token.name),
            None => token.name.starts_with(&self.pattern),
        }
    }
}

/// Keeps tokens whose pre-alias-expansion value was an alias expression.
#[derive(Debug)]
pub struct IsAlias;

impl Filter for IsAlias {
    fn name(&self) -> &str {
        "isAlias"
    }
    fn filter(&self, token: &ResolvedToken) -> bool {
        token.is_alias()
    }
}

/// Keeps tokens whose pre-alias-expansion value was a literal (not an alias).
#[derive(Debug)]
pub struct IsBase;

impl Filter for IsBase {
    fn name(&self) -> &str {
        "isBase"
    }
    fn filter(&self, token: &ResolvedToken) -> bool {
        !token.is_alias()
    }
}

/// Token types Figma Variables cannot express; excludes composite types.
const FIGMA_INCOMPATIBLE_TYPES: &[&str] = &["typography", "border", "shadow", "gradient", "cubicBezier", "strokeStyle"];

/// Keeps tokens whose type Figma Variables can represent.
#[derive(Debug)]
pub struct IsFigmaCompatible;

impl Filter for IsFigmaCompatible {
    fn name(&self) -> &str {
        "isFigmaCompatible"
    }
    fn filter(&self, token: &ResolvedToken) -> bool {
        match &token.r#type {
            Some(t) => !FIGMA_INCOMPATIBLE_TYPES.contains(&t.as_str()),
            None => true,
        }
    }
}

/// Applies the logical AND of `filters` to `tokens`, in filter-list order
/// (§4.6: filters run before transforms).
pub fn apply_filters(tokens: &[ResolvedToken], filters: &[Box<dyn Filter>]) -> Vec<ResolvedToken> {
    tokens.iter().filter(|t| filters.iter().all(|f| f.filter(t))).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn token(name: &str, ty: &str, is_alias: bool) -> ResolvedToken {
        let value = if is_alias { Value::Str(format!("{{{name}.ref}}")) } else { Value::Str("literal".to_string()) };
        ResolvedToken {
            name: name.to_string(),
            path: name.split('.').map(str::to_string).collect(),
            r#type: Some(ty.to_string()),
            original_value: value.clone(),
            value,
            description: None,
            deprecated: None,
            extensions: None,
            source_set: None,
            source_modifier: None,
        }
    }

    #[test]
    fn by_type_keeps_matching_type_only() {
        let tokens = vec![token("color.a", "color", false), token("dimension.a", "dimension", false)];
        let filtered = apply_filters(&tokens, &[Box::new(ByType { token_type: "color".to_string() })]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "color.a");
    }

    #[test]
    fn is_alias_and_is_base_partition_tokens() {
        let tokens = vec![token("a", "color", true), token("b", "color", false)];
        assert_eq!(apply_filters(&tokens, &[Box::new(IsAlias)]).len(), 1);
        assert_eq!(apply_filters(&tokens, &[Box::new(IsBase)]).len(), 1);
    }

    #[test]
    fn figma_compatible_excludes_composite_types() {
        let tokens = vec![token("shadow.a", "shadow", false), token("color.a", "color", false)];
        let filtered = apply_filters(&tokens, &[Box::new(IsFigmaCompatible)]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "color.a");
    }
}
