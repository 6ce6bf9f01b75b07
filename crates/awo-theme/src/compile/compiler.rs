//! CSS custom-property compilation.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::minify::minify;
use crate::config::CompilerConfig;
use crate::error::{Error, Result};
use crate::logging::{span_names, targets};
use crate::resolve::{TokenResolver, TtlCache, VariantSignature};
use crate::theme::{AccessibilityConfig, DarkModeStrategy, Theme};
use crate::tokens::{CategoryRef, TokenTree};

const DEFAULT_FOCUS_COLOR: &str = "#0066cc";
const DEFAULT_FOCUS_WIDTH: &str = "2px";

/// Compiler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerStats {
    /// Stylesheets generated from scratch.
    pub compilations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub failures: u64,
    pub total_duration: Duration,
    pub last_duration: Duration,
}

impl CompilerStats {
    pub fn average_duration(&self) -> Duration {
        match u32::try_from(self.compilations) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total_duration / n,
        }
    }
}

/// Key of one compiled stylesheet: the variant plus a digest of the tree
/// and theme content it was compiled from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompileKey {
    signature: VariantSignature,
    content: u64,
}

impl CompileKey {
    pub fn signature(&self) -> &VariantSignature {
        &self.signature
    }
}

/// Cache type used by [`Compiler`].
pub type CompilerCache = TtlCache<CompileKey, Arc<str>>;

/// Turns a resolved token tree into a deterministic stylesheet.
///
/// Output only depends on the tree, the theme and the configuration: keys are
/// sorted before emission and nothing time-dependent is written.
pub struct Compiler {
    config: CompilerConfig,
    cache: CompilerCache,
    stats: Mutex<CompilerStats>,
}

impl Compiler {
    /// Create a compiler with a cache built from `config.cache`.
    pub fn new(config: CompilerConfig) -> Self {
        let cache = TtlCache::new(config.cache.clone());
        Self::with_cache(config, cache)
    }

    /// Create a compiler around an existing cache.
    pub fn with_cache(config: CompilerConfig, cache: CompilerCache) -> Self {
        Self {
            config,
            cache,
            stats: Mutex::new(CompilerStats::default()),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `tree` (the active tree for `signature`) with the dark-mode,
    /// accessibility and custom CSS settings of `theme`.
    ///
    /// A resolution failure anywhere aborts the whole compilation with
    /// [`Error::Compilation`] naming the first failing path; no partial
    /// stylesheet is returned or cached.
    pub fn compile(
        &self,
        resolver: &dyn TokenResolver,
        tree: &TokenTree,
        theme: &Theme,
        signature: &VariantSignature,
    ) -> Result<Arc<str>> {
        let key = CompileKey {
            signature: signature.clone(),
            content: content_digest(tree, theme),
        };

        if let Some(css) = self.cache.get(&key) {
            self.stats.lock().cache_hits += 1;
            tracing::trace!(target: targets::COMPILER, %signature, "compiled stylesheet cache hit");
            return Ok(css);
        }
        self.stats.lock().cache_misses += 1;

        let _span = tracing::debug_span!(target: targets::COMPILER, span_names::COMPILE, %signature).entered();
        let started = Instant::now();

        let css = match self.generate(resolver, tree, theme, signature) {
            Ok(css) => css,
            Err(e) => {
                self.stats.lock().failures += 1;
                tracing::debug!(target: targets::COMPILER, %signature, error = %e, "compilation failed");
                return Err(e);
            }
        };
        let css: Arc<str> = if self.config.minify { minify(&css).into() } else { css.into() };

        let elapsed = started.elapsed();
        {
            let mut stats = self.stats.lock();
            stats.compilations += 1;
            stats.total_duration += elapsed;
            stats.last_duration = elapsed;
        }
        tracing::debug!(target: targets::COMPILER, %signature, bytes = css.len(), ?elapsed, "compiled theme");

        self.cache.insert(key, Arc::clone(&css), css.len());
        Ok(css)
    }

    /// Custom property name for a key in a category.
    ///
    /// Dots and underscores in the key become dashes:
    /// `semantic.colors.text_muted` → `--awo-semantic-color-text-muted`.
    pub fn variable_name(&self, category: &CategoryRef<'_>, key: &str) -> String {
        format!(
            "--{}-{}-{}-{}",
            self.config.prefix,
            category.layer,
            category.css_name,
            key.replace(['.', '_'], "-")
        )
    }

    /// Drop compiled stylesheets for a theme, optionally for one tenant only.
    pub fn invalidate(&self, theme_id: &str, tenant_id: Option<&str>) -> usize {
        self.cache.remove_where(|key| key.signature.in_scope(theme_id, tenant_id))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CompilerStats {
        *self.stats.lock()
    }

    pub fn cached_stylesheets(&self) -> usize {
        self.cache.len()
    }

    fn generate(
        &self,
        resolver: &dyn TokenResolver,
        tree: &TokenTree,
        theme: &Theme,
        signature: &VariantSignature,
    ) -> Result<String> {
        let mut css = String::new();

        if self.config.include_comments {
            let _ = writeln!(css, "/* Theme: {} ({}) */", theme.name, theme.id);
            if !theme.version.is_empty() {
                let _ = writeln!(css, "/* Version: {} */", theme.version);
            }
            css.push('\n');
        }

        let declarations = self.declarations(resolver, tree, tree, tree.digest(), signature, "  ")?;
        css.push_str(":root {\n");
        css.push_str(&declarations);
        css.push_str("}\n");

        if let Some(dark) = theme.dark_tokens() {
            let strategy = theme.dark_mode.as_ref().map(|d| d.strategy).unwrap_or_default();
            let dark_tree = tree.merged_with(dark);
            let dark_digest = dark_tree.digest();
            let dark_signature = signature.dark_variant();

            if self.config.include_comments {
                let _ = writeln!(css, "\n/* Dark Mode ({strategy:?}) */");
            }
            if matches!(strategy, DarkModeStrategy::Class | DarkModeStrategy::Auto) {
                let declarations = self.declarations(resolver, dark, &dark_tree, dark_digest, &dark_signature, "  ")?;
                css.push_str(".dark {\n");
                css.push_str(&declarations);
                css.push_str("}\n");
            }
            if matches!(strategy, DarkModeStrategy::Media | DarkModeStrategy::Auto) {
                let declarations = self.declarations(resolver, dark, &dark_tree, dark_digest, &dark_signature, "    ")?;
                css.push_str("@media (prefers-color-scheme: dark) {\n  :root {\n");
                css.push_str(&declarations);
                css.push_str("  }\n}\n");
            }
        }

        if !theme.custom_css.is_empty() {
            if self.config.include_comments {
                css.push_str("/* Custom CSS */\n");
            }
            css.push_str(&theme.custom_css);
            css.push('\n');
        }

        if let Some(a11y) = &theme.accessibility {
            write_accessibility(&mut css, a11y);
        }

        Ok(css)
    }

    /// One declaration per key declared in `declared`, resolved inside
    /// `active`, in sorted order.
    fn declarations(
        &self,
        resolver: &dyn TokenResolver,
        declared: &TokenTree,
        active: &TokenTree,
        digest: u64,
        signature: &VariantSignature,
        indent: &str,
    ) -> Result<String> {
        let mut out = String::new();
        for category in declared.categories() {
            let mut keys: Vec<&String> = category.tokens.keys().collect();
            keys.sort();
            for key in keys {
                let path = category.path_of(key);
                let token = resolver
                    .resolve_in(active, digest, &path, signature)
                    .map_err(|e| Error::compilation(path.as_str(), e))?;
                let _ = writeln!(out, "{indent}{}: {};", self.variable_name(&category, key), token.value);
            }
        }
        Ok(out)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

fn write_accessibility(css: &mut String, a11y: &AccessibilityConfig) {
    if a11y.focus_indicator {
        let color = a11y.focus_outline_color.as_deref().unwrap_or(DEFAULT_FOCUS_COLOR);
        let width = a11y.focus_outline_width.as_deref().unwrap_or(DEFAULT_FOCUS_WIDTH);
        let _ = writeln!(css, "*:focus {{\n  outline: {width} solid {color};\n  outline-offset: 2px;\n}}");
        css.push_str("*:focus:not(:focus-visible) {\n  outline: none;\n}\n");
    }

    if a11y.reduced_motion {
        css.push_str(
            "@media (prefers-reduced-motion: reduce) {\n  *, *::before, *::after {\n    \
             animation-duration: 0.01ms !important;\n    \
             animation-iteration-count: 1 !important;\n    \
             transition-duration: 0.01ms !important;\n  }\n}\n",
        );
    }

    if a11y.high_contrast {
        css.push_str("@media (prefers-contrast: high) {\n  * {\n    border-width: 2px;\n  }\n}\n");
    }
}

fn content_digest(tree: &TokenTree, theme: &Theme) -> u64 {
    let mut hasher = DefaultHasher::new();
    tree.hash_content(&mut hasher);
    theme.hash_content(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{ResolvedToken, Resolver};
    use crate::theme::DarkModeConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delegates to a real resolver and counts calls.
    struct CountingResolver {
        inner: Resolver,
        calls: AtomicUsize,
    }

    impl CountingResolver {
        fn new() -> Self {
            Self {
                inner: Resolver::default(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TokenResolver for CountingResolver {
        fn resolve_in(
            &self,
            tree: &TokenTree,
            digest: u64,
            path: &str,
            signature: &VariantSignature,
        ) -> Result<ResolvedToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve_in(tree, digest, path, signature)
        }
    }

    fn tree() -> TokenTree {
        TokenTree::new()
            .with("primitives.colors.blue-500", "#3b82f6")
            .unwrap()
            .with("primitives.colors.gray-900", "#111827")
            .unwrap()
            .with("primitives.spacing.4", "1rem")
            .unwrap()
            .with("semantic.colors.primary", "primitives.colors.blue-500")
            .unwrap()
            .with("semantic.colors.text_muted", "primitives.colors.gray-900")
            .unwrap()
    }

    fn theme() -> Theme {
        Theme::new("corporate", "Corporate").with_tokens(tree())
    }

    fn sig() -> VariantSignature {
        VariantSignature::new("corporate")
    }

    #[test]
    fn emits_resolved_variables() {
        let css = Compiler::default().compile(&Resolver::default(), &tree(), &theme(), &sig()).unwrap();
        assert!(css.starts_with(":root {\n"));
        assert!(css.contains("  --awo-semantic-color-primary: #3b82f6;\n"));
        assert!(css.contains("  --awo-primitives-color-blue-500: #3b82f6;\n"));
        assert!(css.contains("  --awo-primitives-spacing-4: 1rem;\n"));
        assert!(css.contains("--awo-semantic-color-text-muted: #111827;"));
        assert!(!css.contains("primitives.colors"));
    }

    #[test]
    fn sorted_within_category() {
        let css = Compiler::default().compile(&Resolver::default(), &tree(), &theme(), &sig()).unwrap();
        let blue = css.find("--awo-primitives-color-blue-500").unwrap();
        let gray = css.find("--awo-primitives-color-gray-900").unwrap();
        let semantic = css.find("--awo-semantic-color-primary").unwrap();
        assert!(blue < gray && gray < semantic);
    }

    #[test]
    fn byte_identical_regardless_of_insertion_order() {
        let reversed = TokenTree::new()
            .with("semantic.colors.text_muted", "primitives.colors.gray-900")
            .unwrap()
            .with("semantic.colors.primary", "primitives.colors.blue-500")
            .unwrap()
            .with("primitives.spacing.4", "1rem")
            .unwrap()
            .with("primitives.colors.gray-900", "#111827")
            .unwrap()
            .with("primitives.colors.blue-500", "#3b82f6")
            .unwrap();

        let a = Compiler::default().compile(&Resolver::default(), &tree(), &theme(), &sig()).unwrap();
        let b = Compiler::default()
            .compile(&Resolver::default(), &reversed, &theme().with_tokens(reversed.clone()), &sig())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn prefix_is_configurable() {
        let compiler = Compiler::new(CompilerConfig::default().with_prefix("brand"));
        let css = compiler.compile(&Resolver::default(), &tree(), &theme(), &sig()).unwrap();
        assert!(css.contains("--brand-semantic-color-primary: #3b82f6;"));
    }

    #[test]
    fn minified_output() {
        let tree = TokenTree::new().with("primitives.colors.primary", "#FF0000").unwrap();
        let theme = Theme::new("t", "T").with_tokens(tree.clone());
        let compiler = Compiler::new(CompilerConfig::default().with_minify(true));
        let css = compiler.compile(&Resolver::default(), &tree, &theme, &sig()).unwrap();
        assert_eq!(&*css, ":root{--awo-primitives-color-primary:#FF0000}");
        assert_eq!(minify(&css), &*css);
    }

    #[test]
    fn failure_aborts_without_partial_output() {
        let broken = tree().with("semantic.colors.danger", "primitives.colors.red-500").unwrap();
        let compiler = Compiler::default();
        let err = compiler
            .compile(&Resolver::default(), &broken, &theme().with_tokens(broken.clone()), &sig())
            .unwrap_err();

        match &err {
            Error::Compilation { path, source } => {
                assert_eq!(path, "semantic.colors.danger");
                assert!(source.is_not_found());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(compiler.cached_stylesheets(), 0);
        assert_eq!(compiler.stats().failures, 1);
    }

    fn dark_theme(strategy: DarkModeStrategy) -> Theme {
        let dark = TokenTree::new().with("semantic.colors.primary", "primitives.colors.gray-900").unwrap();
        theme().with_dark_mode(DarkModeConfig {
            enabled: true,
            default: false,
            strategy,
            tokens: Some(dark),
        })
    }

    #[test]
    fn dark_mode_class_strategy() {
        let css = Compiler::default()
            .compile(&Resolver::default(), &tree(), &dark_theme(DarkModeStrategy::Class), &sig())
            .unwrap();
        assert!(css.contains(".dark {\n  --awo-semantic-color-primary: #111827;\n}\n"));
        assert!(!css.contains("prefers-color-scheme"));
        // Base block keeps the light value.
        assert!(css.contains(":root {\n  --awo-primitives-color-blue-500: #3b82f6;"));
        assert!(css.contains("  --awo-semantic-color-primary: #3b82f6;\n"));
    }

    #[test]
    fn dark_mode_media_strategy() {
        let css = Compiler::default()
            .compile(&Resolver::default(), &tree(), &dark_theme(DarkModeStrategy::Media), &sig())
            .unwrap();
        assert!(css.contains(
            "@media (prefers-color-scheme: dark) {\n  :root {\n    --awo-semantic-color-primary: #111827;\n  }\n}\n"
        ));
        assert!(!css.contains(".dark {"));
    }

    #[test]
    fn dark_mode_auto_strategy_emits_both() {
        let css = Compiler::default()
            .compile(&Resolver::default(), &tree(), &dark_theme(DarkModeStrategy::Auto), &sig())
            .unwrap();
        assert!(css.contains(".dark {"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
    }

    #[test]
    fn accessibility_blocks() {
        let theme = theme().with_accessibility(AccessibilityConfig {
            focus_indicator: true,
            focus_outline_color: Some("#ff00ff".into()),
            reduced_motion: true,
            high_contrast: true,
            ..AccessibilityConfig::default()
        });
        let css = Compiler::default().compile(&Resolver::default(), &tree(), &theme, &sig()).unwrap();
        assert!(css.contains("outline: 2px solid #ff00ff;"));
        assert!(css.contains("*:focus:not(:focus-visible)"));
        assert!(css.contains("@media (prefers-reduced-motion: reduce)"));
        assert!(css.contains("@media (prefers-contrast: high)"));
    }

    #[test]
    fn custom_css_is_verbatim_and_ordered() {
        let theme = dark_theme(DarkModeStrategy::Class)
            .with_custom_css(".brand { color: semantic.colors.primary; }")
            .with_accessibility(AccessibilityConfig {
                focus_indicator: true,
                ..AccessibilityConfig::default()
            });
        let css = Compiler::default().compile(&Resolver::default(), &tree(), &theme, &sig()).unwrap();
        let dark = css.find(".dark {").unwrap();
        let custom = css.find(".brand { color: semantic.colors.primary; }").unwrap();
        let focus = css.find("*:focus {").unwrap();
        assert!(dark < custom && custom < focus);
    }

    #[test]
    fn compiled_output_is_cached() {
        let resolver = CountingResolver::new();
        let compiler = Compiler::default();
        let first = compiler.compile(&resolver, &tree(), &theme(), &sig()).unwrap();
        let calls = resolver.calls.load(Ordering::SeqCst);
        assert_eq!(calls, tree().len());

        let second = compiler.compile(&resolver, &tree(), &theme(), &sig()).unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), calls);
        assert_eq!(compiler.stats().cache_hits, 1);
        assert_eq!(compiler.stats().compilations, 1);
    }

    #[test]
    fn changed_content_misses_cache() {
        let resolver = CountingResolver::new();
        let compiler = Compiler::default();
        compiler.compile(&resolver, &tree(), &theme(), &sig()).unwrap();

        let changed = tree().with("primitives.colors.blue-500", "#2563eb").unwrap();
        let css = compiler.compile(&resolver, &changed, &theme(), &sig()).unwrap();
        assert!(css.contains("--awo-primitives-color-blue-500: #2563eb;"));
        assert_eq!(compiler.stats().compilations, 2);
    }

    #[test]
    fn include_comments_has_no_timestamp() {
        let compiler = Compiler::new(CompilerConfig::default().with_comments(true));
        let a = compiler.compile(&Resolver::default(), &tree(), &theme(), &sig()).unwrap();
        compiler.clear_cache();
        let b = compiler.compile(&Resolver::default(), &tree(), &theme(), &sig()).unwrap();
        assert!(a.starts_with("/* Theme: Corporate (corporate) */"));
        assert_eq!(a, b);
    }
}
