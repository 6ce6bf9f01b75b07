//! Request orchestration: load, override, resolve, compile, cache.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use awo_theme::prelude::*;
//!
//! let store = Arc::new(MemoryThemeStore::new().with_theme(Theme::from_json(json)?));
//! let engine = ThemeEngine::new(EngineConfig::default(), store);
//!
//! let compiled = engine.get_compiled_theme(
//!     &ThemeRequest::new("corporate").with_tenant("acme").with_dark_mode(true),
//! )?;
//! println!("{}", compiled.css);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::compile::{Compiler, CompilerStats};
use crate::condition::{ConditionEvaluator, EvalContext};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::logging::{span_names, targets};
use crate::resolve::{ResolvedToken, Resolver, ResolverStats, VariantSignature};
use crate::store::ThemeStore;
use crate::theme::{Condition, OverrideSet, Theme, apply_all};
use crate::tokens::TokenTree;

/// What a caller wants compiled.
#[derive(Debug, Clone, Default)]
pub struct ThemeRequest {
    pub theme_id: String,
    pub tenant_id: Option<String>,
    pub dark_mode: bool,
    /// Data for condition expressions. Conditions are skipped without it.
    pub context: Option<EvalContext>,
}

impl ThemeRequest {
    pub fn new(theme_id: impl Into<String>) -> Self {
        Self {
            theme_id: theme_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn with_dark_mode(mut self, dark_mode: bool) -> Self {
        self.dark_mode = dark_mode;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: EvalContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// A compiled theme variant.
#[derive(Debug, Clone)]
pub struct CompiledTheme {
    /// The theme after tenant and conditional overrides.
    pub theme: Arc<Theme>,
    /// The stylesheet, tenant custom CSS included.
    pub css: Arc<str>,
    pub signature: VariantSignature,
    pub tenant_id: Option<String>,
    pub dark_mode: bool,
    /// Ids of the conditions that matched, in application order.
    pub applied_conditions: Vec<String>,
}

/// Engine counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub resolver: ResolverStats,
    pub compiler: CompilerStats,
}

/// One theme variant ready to resolve or compile.
struct Variant {
    theme: Theme,
    tree: TokenTree,
    signature: VariantSignature,
    tenant_css: String,
    applied_conditions: Vec<String>,
}

/// Serves compiled theme variants to concurrent callers.
///
/// # Thread Safety
///
/// `ThemeEngine` is `Send + Sync`; share it behind an `Arc`. Every operation
/// takes `&self`.
pub struct ThemeEngine {
    config: EngineConfig,
    store: Arc<dyn ThemeStore>,
    evaluator: Option<Arc<dyn ConditionEvaluator>>,
    resolver: Resolver,
    compiler: Compiler,
}

impl ThemeEngine {
    /// Create an engine over `store`.
    pub fn new(config: EngineConfig, store: Arc<dyn ThemeStore>) -> Self {
        let resolver = Resolver::new(config.resolver.clone());
        let compiler = Compiler::new(config.compiler.clone());
        Self::from_parts(config, store, resolver, compiler)
    }

    /// Create an engine around an existing resolver and compiler, e.g. ones
    /// built with caches of their own.
    pub fn from_parts(
        config: EngineConfig,
        store: Arc<dyn ThemeStore>,
        resolver: Resolver,
        compiler: Compiler,
    ) -> Self {
        Self {
            config,
            store,
            evaluator: None,
            resolver,
            compiler,
        }
    }

    /// Attach a condition evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Compile the requested variant, serving it from cache when possible.
    ///
    /// Unknown themes fail with [`Error::NotFound`](crate::Error::NotFound);
    /// resolution failures surface as
    /// [`Error::Compilation`](crate::Error::Compilation).
    pub fn get_compiled_theme(&self, request: &ThemeRequest) -> Result<CompiledTheme> {
        let _span = tracing::debug_span!(
            target: targets::ENGINE,
            span_names::THEME_REQUEST,
            theme_id = %request.theme_id,
            tenant_id = ?request.tenant_id,
            dark_mode = request.dark_mode
        )
        .entered();

        let variant = self.prepare(request)?;
        let css = self
            .compiler
            .compile(&self.resolver, &variant.tree, &variant.theme, &variant.signature)?;

        let css: Arc<str> = if variant.tenant_css.is_empty() {
            css
        } else {
            format!("{css}{}\n", variant.tenant_css).into()
        };

        Ok(CompiledTheme {
            theme: Arc::new(variant.theme),
            css,
            signature: variant.signature,
            tenant_id: request.tenant_id.clone(),
            dark_mode: request.dark_mode,
            applied_conditions: variant.applied_conditions,
        })
    }

    /// Resolve one token inside the requested variant.
    pub fn resolve_token(&self, request: &ThemeRequest, path: &str) -> Result<ResolvedToken> {
        let variant = self.prepare(request)?;
        self.resolver.resolve(&variant.tree, path, &variant.signature)
    }

    /// Fully resolved token tree of the requested variant.
    pub fn resolve_all(&self, request: &ThemeRequest) -> Result<TokenTree> {
        let variant = self.prepare(request)?;
        self.resolver.resolve_all(&variant.tree, &variant.signature)
    }

    /// Evict cached results for a theme. `None` covers every tenant.
    ///
    /// Returns the number of evicted entries.
    pub fn invalidate_cache(&self, theme_id: &str, tenant_id: Option<&str>) -> usize {
        let resolved = self.resolver.invalidate(theme_id, tenant_id);
        let compiled = self.compiler.invalidate(theme_id, tenant_id);
        tracing::info!(
            target: targets::ENGINE,
            theme_id,
            ?tenant_id,
            resolved,
            compiled,
            "invalidated theme caches"
        );
        resolved + compiled
    }

    /// Validate (if configured), store and invalidate a theme.
    pub fn publish_theme(&self, theme: Theme) -> Result<()> {
        if self.config.validate_on_publish {
            theme.validate()?;
        }
        let id = theme.id.clone();
        self.store.save_theme(theme)?;
        self.invalidate_cache(&id, None);
        Ok(())
    }

    /// Delete a theme and everything cached for it.
    pub fn remove_theme(&self, theme_id: &str) -> Result<()> {
        self.store.delete_theme(theme_id)?;
        self.invalidate_cache(theme_id, None);
        Ok(())
    }

    pub fn list_themes(&self) -> Result<Vec<String>> {
        self.store.list_themes()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            resolver: self.resolver.stats(),
            compiler: self.compiler.stats(),
        }
    }

    fn prepare(&self, request: &ThemeRequest) -> Result<Variant> {
        let base = self.store.get_theme(&request.theme_id)?;
        let tenant = match request.tenant_id.as_deref() {
            Some(tenant_id) => self.store.tenant_overrides(tenant_id)?,
            None => None,
        };

        let conditions = self.active_conditions(&base, request.context.as_ref());
        let condition_sets: Vec<OverrideSet> = conditions.iter().map(|c| OverrideSet::from(*c)).collect();

        let mut hasher = DefaultHasher::new();
        tenant.as_ref().map(OverrideSet::digest).hash(&mut hasher);
        for (condition, set) in conditions.iter().zip(&condition_sets) {
            condition.id.hash(&mut hasher);
            set.digest().hash(&mut hasher);
        }

        let signature = VariantSignature::new(base.id.as_str())
            .with_tenant(request.tenant_id.as_deref())
            .with_dark_mode(request.dark_mode)
            .with_overrides(hasher.finish())
            .with_revision(base.fingerprint());

        // Tenant branding first, then matching conditions by ascending priority.
        let theme = apply_all(&base, tenant.iter().chain(condition_sets.iter()))?;

        let tree = match (request.dark_mode, theme.dark_tokens()) {
            (true, Some(dark)) => theme.tokens.merged_with(dark),
            _ => theme.tokens.clone(),
        };

        Ok(Variant {
            tree,
            signature,
            tenant_css: tenant.map(|t| t.custom_css).unwrap_or_default(),
            applied_conditions: conditions.iter().map(|c| c.id.clone()).collect(),
            theme,
        })
    }

    /// Conditions that hold for `context`, ordered lowest priority first so
    /// the highest priority is applied last. Evaluator errors count as "not
    /// met".
    fn active_conditions<'t>(&self, theme: &'t Theme, context: Option<&EvalContext>) -> Vec<&'t Condition> {
        if !self.config.enable_conditionals || theme.conditions.is_empty() {
            return Vec::new();
        }
        let (Some(evaluator), Some(context)) = (self.evaluator.as_ref(), context) else {
            return Vec::new();
        };

        let mut active: Vec<&Condition> = theme
            .conditions
            .iter()
            .filter(|condition| match evaluator.evaluate(&condition.expression, context) {
                Ok(matched) => matched,
                Err(e) => {
                    tracing::warn!(
                        target: targets::OVERRIDES,
                        theme_id = %theme.id,
                        condition = %condition.id,
                        error = %e,
                        "condition evaluation failed; treating as not met"
                    );
                    false
                }
            })
            .collect();

        active.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        active
    }
}
