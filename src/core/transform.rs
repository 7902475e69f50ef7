// src/core/transform.rs

use crate::error::PipelineError;
use crate::models::ResolvedToken;
use crate::value::Value;
use log::warn;

/// Rewrites a token's `name` and/or `$value`; must never touch `path` or
/// `$type` (§4.6). Transforms for an output run in list order, each seeing
/// the previous transform's output.
pub trait Transform: Send + Sync {
    /// Identity used in diagnostics; defaults to a generic label.
    fn name(&self) -> &str {
        "transform"
    }
    /// `true` if this transform applies to `token`. A matcher error is
    /// treated as "no match" with a warning (§4.6 Error policy); the
    /// default always matches.
    fn matches(&self, _token: &ResolvedToken) -> bool {
        true
    }
    /// Rewrites `token`.
    fn transform(&self, token: ResolvedToken) -> Result<ResolvedToken, PipelineError>;
}

/// Runs `transforms` over `tokens` in list order; a transform's failure
/// aborts the *output* this call belongs to (the caller propagates the
/// error to the orchestrator, which isolates it per-output) but never
/// touches sibling outputs (§4.6 Error policy).
pub fn apply_transforms(mut tokens: Vec<ResolvedToken>, transforms: &[Box<dyn Transform>]) -> Result<Vec<ResolvedToken>, PipelineError> {
    for transform in transforms {
        let mut next = Vec::with_capacity(tokens.len());
        for token in tokens {
            if transform.matches(&token) {
                let path_before = token.path.clone();
                let type_before = token.r#type.clone();
                let transformed = transform.transform(token)?;
                debug_assert_eq!(transformed.path, path_before, "transform must not rewrite path");
                debug_assert_eq!(transformed.r#type, type_before, "transform must not rewrite $type");
                next.push(transformed);
            } else {
                next.push(token);
            }
        }
        tokens = next;
    }
    Ok(tokens)
}

/// Rewrites `name` to kebab-case (dots become single hyphens, camelCase
/// boundaries get a hyphen inserted): `color.brandPrimary` -> `color-brand-primary`.
#[derive(Debug)]
pub struct KebabCaseName;

impl Transform for KebabCaseName {
    fn name(&self) -> &str {
        "kebab-case"
    }
    fn transform(&self, mut token: ResolvedToken) -> Result<ResolvedToken, PipelineError> {
        token.name = kebab_case(&token.name);
        Ok(token)
    }
}

fn kebab_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev_lower = false;
    for ch in input.chars() {
        if ch == '.' {
            out.push('-');
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            out.push('-');
        }
        out.extend(ch.to_lowercase());
        prev_lower = ch.is_lowercase();
    }
    out
}

/// Prepends `prefix-` to `name`.
#[derive(Debug)]
pub struct PrefixName {
    /// The prefix prepended, without its trailing `-`.
    pub prefix: String,
}

impl Transform for PrefixName {
    fn name(&self) -> &str {
        "prefix"
    }
    fn transform(&self, mut token: ResolvedToken) -> Result<ResolvedToken, PipelineError> {
        token.name = format!("{}-{}", self.prefix, token.name);
        Ok(token)
    }
}

/// Converts a `color` token's `$value` (`{ colorSpace, components: [r,g,b], alpha? }`)
/// into a `#rrggbb`/`#rrggbbaa` hex string. Only matches `color`-typed tokens
/// whose `colorSpace` is `srgb`.
#[derive(Debug)]
pub struct ColorToHex;

impl Transform for ColorToHex {
    fn name(&self) -> &str {
        "color-to-hex"
    }
    fn matches(&self, token: &ResolvedToken) -> bool {
        token.r#type.as_deref() == Some("color") && matches!(&token.value, Value::Object(map) if map.get("colorSpace").and_then(Value::as_str) == Some("srgb"))
    }
    fn transform(&self, mut token: ResolvedToken) -> Result<ResolvedToken, PipelineError> {
        match color_to_hex(&token.value) {
            Some(hex) => token.value = Value::Str(hex),
            None => warn!("color-to-hex: token '{}' has an unexpected color shape, leaving value untouched", token.name),
        }
        Ok(token)
    }
}

fn color_to_hex(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    let components = map.get("components")?.as_array()?;
    let channel = |v: &Value| -> Option<u8> {
        let n = match v {
            Value::Num(n) => n.as_f64()?,
            _ => return None,
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let byte = (n.clamp(0.0, 1.0) * 255.0).round() as u8;
        Some(byte)
    };
    let r = channel(components.first()?)?;
    let g = channel(components.get(1)?)?;
    let b = channel(components.get(2)?)?;
    let alpha = map.get("alpha").and_then(|v| match v {
        Value::Num(n) => n.as_f64(),
        _ => None,
    });
    match alpha {
        Some(a) if a < 1.0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let a8 = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
            Some(format!("#{r:02x}{g:02x}{b:02x}{a8:02x}"))
        }
        _ => Some(format!("#{r:02x}{g:02x}{b:02x}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn color_token(name: &str, r: f64, g: f64, b: f64) -> ResolvedToken {
        let mut components = IndexMap::new();
        components.insert("colorSpace".to_string(), Value::Str("srgb".to_string()));
        components.insert(
            "components".to_string(),
            Value::Array(vec![Value::Num(serde_json::Number::from_f64(r).unwrap()), Value::Num(serde_json::Number::from_f64(g).unwrap()), Value::Num(serde_json::Number::from_f64(b).unwrap())]),
        );
        let value = Value::Object(components);
        ResolvedToken {
            name: name.to_string(),
            path: name.split('.').map(str::to_string).collect(),
            r#type: Some("color".to_string()),
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
    fn kebab_case_joins_dots_and_splits_camel_case() {
        assert_eq!(kebab_case("color.brandPrimary"), "color-brand-primary");
    }

    #[test]
    fn color_to_hex_converts_srgb_components() {
        let token = color_token("color.brand", 0.0, 0.5, 1.0);
        let transformed = ColorToHex.transform(token).unwrap();
        assert_eq!(transformed.value, Value::Str("#0080ff".to_string()));
    }

    #[test]
    fn transforms_never_change_path_or_type() {
        let tokens = vec![color_token("color.brandPrimary", 0.0, 0.5, 1.0)];
        let transforms: Vec<Box<dyn Transform>> = vec![Box::new(KebabCaseName), Box::new(ColorToHex)];
        let result = apply_transforms(tokens, &transforms).unwrap();
        assert_eq!(result[0].name, "color-brand-primary");
        assert_eq!(result[0].path, vec!["color".to_string(), "brandPrimary".to_string()]);
        assert_eq!(result[0].r#type.as_deref(), Some("color"));
    }
}
