//! End-to-end tests driven by JSON theme documents and TOML configuration.

use std::io::Write;
use std::sync::Arc;

use awo_theme::prelude::*;

const CORPORATE: &str = r##"{
    "id": "corporate",
    "name": "Corporate",
    "version": "2.0.0",
    "tokens": {
        "primitives": {
            "colors": { "gray-900": "#111827", "blue-500": "#3b82f6" },
            "spacing": { "4": "1rem" }
        },
        "semantic": {
            "colors": { "text": "primitives.colors.gray-900", "primary": "primitives.colors.blue-500" },
            "spacing": { "md": "primitives.spacing.4" }
        },
        "components": {
            "button": { "default": { "background": "semantic.colors.primary" } }
        }
    },
    "darkMode": {
        "enabled": true,
        "strategy": "auto",
        "darkTokens": { "semantic": { "colors": { "text": "primitives.colors.blue-500" } } }
    },
    "accessibility": { "focusIndicator": true },
    "customCSS": ".brand { font-weight: 700; }"
}"##;

// Same tokens, keys declared in a different order.
const CORPORATE_REORDERED: &str = r##"{
    "name": "Corporate",
    "id": "corporate",
    "version": "2.0.0",
    "customCSS": ".brand { font-weight: 700; }",
    "accessibility": { "focusIndicator": true },
    "darkMode": {
        "darkTokens": { "semantic": { "colors": { "text": "primitives.colors.blue-500" } } },
        "strategy": "auto",
        "enabled": true
    },
    "tokens": {
        "components": {
            "button": { "default": { "background": "semantic.colors.primary" } }
        },
        "semantic": {
            "spacing": { "md": "primitives.spacing.4" },
            "colors": { "primary": "primitives.colors.blue-500", "text": "primitives.colors.gray-900" }
        },
        "primitives": {
            "spacing": { "4": "1rem" },
            "colors": { "blue-500": "#3b82f6", "gray-900": "#111827" }
        }
    }
}"##;

const EXPECTED: &str = "\
/* Theme: Corporate (corporate) */
/* Version: 2.0.0 */

:root {
  --brand-primitives-color-blue-500: #3b82f6;
  --brand-primitives-color-gray-900: #111827;
  --brand-primitives-spacing-4: 1rem;
  --brand-semantic-color-primary: #3b82f6;
  --brand-semantic-color-text: #111827;
  --brand-semantic-spacing-md: 1rem;
}

/* Dark Mode (Auto) */
.dark {
  --brand-semantic-color-text: #3b82f6;
}
@media (prefers-color-scheme: dark) {
  :root {
    --brand-semantic-color-text: #3b82f6;
  }
}
/* Custom CSS */
.brand { font-weight: 700; }
*:focus {
  outline: 2px solid #0066cc;
  outline-offset: 2px;
}
*:focus:not(:focus-visible) {
  outline: none;
}
";

const ENGINE_TOML: &str = r#"
[resolver]
max_depth = 8

[compiler]
prefix = "brand"
include_comments = true

[compiler.cache]
max_cost = 65536
ttl_ms = 60000
"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn load_config() -> EngineConfig {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(ENGINE_TOML.as_bytes()).unwrap();
    EngineConfig::load(file.path()).unwrap()
}

fn engine_for(json: &str) -> ThemeEngine {
    let theme = Theme::from_json(json).unwrap();
    ThemeEngine::new(load_config(), Arc::new(MemoryThemeStore::new().with_theme(theme)))
}

#[test]
fn config_file_is_applied() {
    let config = load_config();
    assert_eq!(config.resolver.max_depth, 8);
    assert_eq!(config.compiler.prefix, "brand");
    assert!(config.compiler.include_comments);
    assert!(!config.compiler.minify);
    assert_eq!(config.compiler.cache.max_cost, 65536);
    // Untouched sections keep their defaults.
    assert!(config.enable_conditionals);
    assert_eq!(config.resolver.cache, CacheConfig::default());
}

#[test]
fn compiles_document_to_expected_stylesheet() {
    init_tracing();
    let compiled = engine_for(CORPORATE).get_compiled_theme(&ThemeRequest::new("corporate")).unwrap();
    assert_eq!(&*compiled.css, EXPECTED);
}

#[test]
fn output_does_not_depend_on_declaration_order() {
    let a = engine_for(CORPORATE).get_compiled_theme(&ThemeRequest::new("corporate")).unwrap();
    let b = engine_for(CORPORATE_REORDERED)
        .get_compiled_theme(&ThemeRequest::new("corporate"))
        .unwrap();
    assert_eq!(a.css, b.css);
}

#[test]
fn repeated_compilation_is_byte_identical() {
    let engine = engine_for(CORPORATE);
    let request = ThemeRequest::new("corporate").with_dark_mode(true);

    let first = engine.get_compiled_theme(&request).unwrap();
    engine.invalidate_cache("corporate", None);
    let second = engine.get_compiled_theme(&request).unwrap();

    assert_eq!(first.css, second.css);
    assert_eq!(engine.stats().compiler.compilations, 2);
}

#[test]
fn minified_output_is_stable() {
    let config = load_config().with_compiler(load_config().compiler.with_minify(true));
    let theme = Theme::from_json(CORPORATE).unwrap();
    let engine = ThemeEngine::new(config, Arc::new(MemoryThemeStore::new().with_theme(theme)));

    let compiled = engine.get_compiled_theme(&ThemeRequest::new("corporate")).unwrap();
    assert!(!compiled.css.contains("/*"));
    assert!(compiled.css.contains("--brand-semantic-color-primary:#3b82f6;"));
    assert_eq!(minify(&compiled.css), &*compiled.css);
}

#[test]
fn resolves_tokens_across_layers() {
    let engine = engine_for(CORPORATE);
    let request = ThemeRequest::new("corporate");

    let primary = engine.resolve_token(&request, "semantic.colors.primary").unwrap();
    assert_eq!(primary.value, "#3b82f6");
    assert_eq!(primary.depth, 1);

    let button = engine.resolve_token(&request, "component.button.default.background").unwrap();
    assert_eq!(button.value, "#3b82f6");
    assert_eq!(button.depth, 2);

    let literal = engine.resolve_token(&request, "primitives.spacing.4").unwrap();
    assert_eq!(literal.depth, 0);

    let dark = engine
        .resolve_token(&request.clone().with_dark_mode(true), "semantic.colors.text")
        .unwrap();
    assert_eq!(dark.value, "#3b82f6");
}

#[test]
fn resolve_all_flattens_every_reference() {
    let resolved = engine_for(CORPORATE).resolve_all(&ThemeRequest::new("corporate")).unwrap();
    assert!(resolved.entries().iter().all(|(_, value)| !is_reference(value)));
    assert_eq!(resolved.get("components.button.default.background"), Some("#3b82f6"));
    assert_eq!(resolved.get("semantic.spacing.md"), Some("1rem"));
}

#[test]
fn configured_depth_limits_long_chains() {
    let mut theme = Theme::from_json(CORPORATE).unwrap();
    let mut previous = "primitives.colors.blue-500".to_string();
    for hop in 0..10 {
        let key = format!("alias-{hop}");
        theme.tokens.semantic.colors.insert(key.clone(), previous);
        previous = format!("semantic.colors.{key}");
    }

    let engine = ThemeEngine::new(load_config(), Arc::new(MemoryThemeStore::new().with_theme(theme)));
    let request = ThemeRequest::new("corporate");

    assert_eq!(engine.resolve_token(&request, "semantic.colors.alias-6").unwrap().depth, 7);
    let err = engine.resolve_token(&request, "semantic.colors.alias-9").unwrap_err();
    assert!(matches!(err, Error::Resolution { .. }), "unexpected error: {err}");
}

#[test]
fn cycles_fail_compilation_with_chain() {
    let mut theme = Theme::from_json(CORPORATE).unwrap();
    theme.tokens.semantic.colors.insert("a".into(), "semantic.colors.b".into());
    theme.tokens.semantic.colors.insert("b".into(), "semantic.colors.a".into());
    let engine = ThemeEngine::new(load_config(), Arc::new(MemoryThemeStore::new().with_theme(theme)));

    let err = engine.get_compiled_theme(&ThemeRequest::new("corporate")).unwrap_err();
    let Error::Compilation { path, source } = err else {
        panic!("expected a compilation error");
    };
    assert_eq!(path, "semantic.colors.a");
    match *source {
        Error::CircularReference { chain } => {
            assert!(chain.contains(&"semantic.colors.a".to_string()));
            assert!(chain.contains(&"semantic.colors.b".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tenant_overrides_from_json() {
    let overrides: OverrideSet = serde_json::from_str(
        r##"{
            "primaryColor": "#ff6b35",
            "colorPalette": { "blue-500": "#2563eb" },
            "customCSS": ".acme-logo { display: block; }"
        }"##,
    )
    .unwrap();

    let theme = Theme::from_json(CORPORATE).unwrap();
    let store = MemoryThemeStore::new().with_theme(theme).with_tenant("acme", overrides);
    let engine = ThemeEngine::new(load_config(), Arc::new(store));

    let compiled = engine.get_compiled_theme(&ThemeRequest::new("corporate").with_tenant("acme")).unwrap();
    assert!(compiled.css.contains("--brand-primitives-color-primary: #ff6b35;"));
    assert!(compiled.css.contains("--brand-semantic-color-primary: #2563eb;"));
    assert!(compiled.css.ends_with(".acme-logo { display: block; }\n"));

    let base = engine.get_compiled_theme(&ThemeRequest::new("corporate")).unwrap();
    assert_eq!(&*base.css, EXPECTED);
}

#[test]
fn rejects_malformed_documents() {
    assert!(matches!(Theme::from_json("{ not json"), Err(Error::Validation { .. })));

    let bad_reference = CORPORATE.replace("primitives.spacing.4", "primitives.spacing.4$");
    assert!(matches!(Theme::from_json(&bad_reference), Err(Error::Validation { .. })));
}
