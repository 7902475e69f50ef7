// tests/scenarios.rs
//
// End-to-end scenario tests driving the public `build()` entry point
// against in-memory resolver/token documents, covering the S1-S6
// scenarios and boundary behaviors.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, missing_docs)]

use dtcg_resolve::core::filter::ByType;
use dtcg_resolve::core::renderer::css::CssRenderer;
use dtcg_resolve::core::renderer::json::JsonRenderer;
use dtcg_resolve::core::renderer::Preset;
use dtcg_resolve::core::transform::{ColorToHex, KebabCaseName};
use dtcg_resolve::models::{ModifierDef, RefEntry, ResolverDocument, SetDef};
use dtcg_resolve::{build, BuildConfig, OutputConfig, ResolverSource, ValidationMode};
use indexmap::IndexMap;
use std::fs;
use std::path::Path;

fn write_json(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn resolver_with_theme(dir: &Path) -> ResolverDocument {
    write_json(dir, "core.json", r#"{"color": {"text": {"$type": "color", "$value": "{color.neutral.black}"}, "neutral": {"black": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [0,0,0]}}, "white": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [1,1,1]}}}}}"#);
    write_json(dir, "dark.json", r#"{"color": {"text": {"$type": "color", "$value": "{color.neutral.white}"}}}"#);

    let mut sets = IndexMap::new();
    sets.insert("core".to_string(), SetDef { sources: vec![RefEntry { reference: "core.json".to_string() }], description: None });

    let mut contexts = IndexMap::new();
    contexts.insert("light".to_string(), vec![]);
    contexts.insert("dark".to_string(), vec![RefEntry { reference: "dark.json".to_string() }]);
    let mut modifiers = IndexMap::new();
    modifiers.insert("theme".to_string(), ModifierDef { default: "light".to_string(), contexts, description: None });

    ResolverDocument {
        version: dtcg_resolve::constants::SUPPORTED_RESOLVER_VERSION.to_string(),
        name: None,
        sets,
        modifiers,
        resolution_order: vec![
            RefEntry { reference: "#/sets/core".to_string() },
            RefEntry { reference: "#/modifiers/theme".to_string() },
        ],
    }
}

fn css_output(preset: Preset, template: &str) -> OutputConfig {
    OutputConfig {
        name: "css".to_string(),
        renderer: Box::new(CssRenderer),
        filters: Vec::new(),
        transforms: vec![Box::new(KebabCaseName), Box::new(ColorToHex)],
        preset,
        filename_template: template.to_string(),
        options: serde_json::Value::Null,
    }
}

/// S2: theme modifier, cascade bundling emits a `:root` block plus a
/// single `[data-theme="dark"]` override containing only the deviating
/// token.
#[test]
fn s2_theme_modifier_cascade_bundling() {
    let dir = tempfile::TempDir::new().unwrap();
    let document = resolver_with_theme(dir.path());

    let config = BuildConfig {
        resolver_source: ResolverSource::InMemory(document, dir.path().to_path_buf()),
        outputs: vec![css_output(Preset::Bundle, "tokens-{_base}.css")],
        preprocessors: Vec::new(),
        validation_mode: ValidationMode::Error,
        on_warning: None,
        max_depth: 10,
    };

    let report = build(&config);
    assert!(report.success, "errors: {:?}", report.errors.iter().map(|e| &e.message).collect::<Vec<_>>());

    let css = report.outputs[0].files.get("tokens-bundle.css").unwrap();
    assert!(css.contains(":root"));
    assert!(css.contains("--color-text: #000000;"));
    assert!(css.contains("[data-theme=\"dark\"]"));
    assert!(css.contains("--color-text: #ffffff;"));
    // Only the deviating token appears in the dark override block.
    let dark_block = css.split("[data-theme=\"dark\"]").nth(1).unwrap();
    assert_eq!(dark_block.matches("--").count(), 1);
}

/// S6: running the same build with a different number of rayon worker
/// threads produces byte-identical output.
#[test]
fn s6_parallel_build_determinism() {
    let dir = tempfile::TempDir::new().unwrap();
    let document = resolver_with_theme(dir.path());

    let run = || {
        let config = BuildConfig {
            resolver_source: ResolverSource::InMemory(document.clone(), dir.path().to_path_buf()),
            outputs: vec![css_output(Preset::Standalone, "tokens-{theme}.css")],
            preprocessors: Vec::new(),
            validation_mode: ValidationMode::Error,
            on_warning: None,
            max_depth: 10,
        };
        let report = build(&config);
        assert!(report.success);
        let mut files: Vec<(String, String)> = report.outputs[0].files.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        files.sort();
        files
    };

    let single = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let many = rayon::ThreadPoolBuilder::new().num_threads(8).build().unwrap();

    let single_result = single.install(run);
    let many_result = many.install(run);
    assert_eq!(single_result, many_result);
}

/// A modifier with a single context still materializes one permutation,
/// and a standalone preset emits exactly one file for it.
#[test]
fn single_context_modifier_materializes_one_permutation() {
    let dir = tempfile::TempDir::new().unwrap();
    write_json(dir.path(), "core.json", r#"{"color": {"brand": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [0,0,1]}}}}"#);

    let mut sets = IndexMap::new();
    sets.insert("core".to_string(), SetDef { sources: vec![RefEntry { reference: "core.json".to_string() }], description: None });
    let mut contexts = IndexMap::new();
    contexts.insert("only".to_string(), vec![]);
    let mut modifiers = IndexMap::new();
    modifiers.insert("platform".to_string(), ModifierDef { default: "only".to_string(), contexts, description: None });

    let document = ResolverDocument {
        version: dtcg_resolve::constants::SUPPORTED_RESOLVER_VERSION.to_string(),
        name: None,
        sets,
        modifiers,
        resolution_order: vec![
            RefEntry { reference: "#/sets/core".to_string() },
            RefEntry { reference: "#/modifiers/platform".to_string() },
        ],
    };

    let config = BuildConfig {
        resolver_source: ResolverSource::InMemory(document, dir.path().to_path_buf()),
        outputs: vec![css_output(Preset::Standalone, "tokens-{platform}.css")],
        preprocessors: Vec::new(),
        validation_mode: ValidationMode::Error,
        on_warning: None,
        max_depth: 10,
    };

    let report = build(&config);
    assert!(report.success);
    assert_eq!(report.outputs[0].files.len(), 1);
    assert!(report.outputs[0].files.contains_key("tokens-only.css"));
}

/// Empty `sets` with a non-empty `modifiers` map is still a valid build.
#[test]
fn empty_sets_with_modifiers_is_valid() {
    let dir = tempfile::TempDir::new().unwrap();
    write_json(dir.path(), "dark.json", r#"{"color": {"text": {"$type": "color", "$value": "white"}}}"#);

    let mut contexts = IndexMap::new();
    contexts.insert("light".to_string(), vec![]);
    contexts.insert("dark".to_string(), vec![RefEntry { reference: "dark.json".to_string() }]);
    let mut modifiers = IndexMap::new();
    modifiers.insert("theme".to_string(), ModifierDef { default: "light".to_string(), contexts, description: None });

    let document = ResolverDocument {
        version: dtcg_resolve::constants::SUPPORTED_RESOLVER_VERSION.to_string(),
        name: None,
        sets: IndexMap::new(),
        modifiers,
        resolution_order: vec![RefEntry { reference: "#/modifiers/theme".to_string() }],
    };

    let config = BuildConfig {
        resolver_source: ResolverSource::InMemory(document, dir.path().to_path_buf()),
        outputs: vec![OutputConfig {
            name: "json".to_string(),
            renderer: Box::new(JsonRenderer),
            filters: vec![Box::new(ByType { token_type: "color".to_string() })],
            transforms: Vec::new(),
            preset: Preset::Standalone,
            filename_template: "tokens-{theme}.json".to_string(),
            options: serde_json::Value::Null,
        }],
        preprocessors: Vec::new(),
        validation_mode: ValidationMode::Error,
        on_warning: None,
        max_depth: 10,
    };

    let report = build(&config);
    assert!(report.success);
    assert_eq!(report.outputs[0].files.len(), 2);
}

/// A filename template that collides across permutations is a
/// configuration error rather than a silent overwrite (§6).
#[test]
fn standalone_filename_collision_is_a_configuration_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let document = resolver_with_theme(dir.path());

    let config = BuildConfig {
        resolver_source: ResolverSource::InMemory(document, dir.path().to_path_buf()),
        // Template ignores {theme}, so both permutations collide on one path.
        outputs: vec![css_output(Preset::Standalone, "tokens.css")],
        preprocessors: Vec::new(),
        validation_mode: ValidationMode::Error,
        on_warning: None,
        max_depth: 10,
    };

    let report = build(&config);
    assert!(!report.success);
    assert_eq!(report.errors[0].kind, "ConfigurationError");
}
