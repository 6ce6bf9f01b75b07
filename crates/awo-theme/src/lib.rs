//! Design-token resolution and CSS compilation for multi-tenant themes.
//!
//! This crate turns layered design tokens into CSS custom properties:
//!
//! - **Token tree**: primitives, semantic aliases and component tokens
//! - **Resolution**: reference chains with cycle detection and a depth ceiling
//! - **Variants**: tenant branding, dark mode and conditional overrides
//! - **Compilation**: deterministic, optionally minified stylesheets
//! - **Caching**: bounded TTL caches keyed by variant signature
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use awo_theme::prelude::*;
//!
//! let theme = Theme::from_json(&std::fs::read_to_string("themes/corporate.json")?)?;
//! let store = MemoryThemeStore::new()
//!     .with_theme(theme)
//!     .with_tenant("acme", OverrideSet::new().with_primary_color("#ff5500"));
//!
//! let engine = ThemeEngine::new(EngineConfig::default(), Arc::new(store));
//! let compiled = engine.get_compiled_theme(&ThemeRequest::new("corporate").with_tenant("acme"))?;
//!
//! // :root {
//! //   --awo-semantic-color-primary: #ff5500;
//! // ...
//! println!("{}", compiled.css);
//! ```

pub mod compile;
pub mod condition;
pub mod config;
pub mod engine;
pub mod logging;
pub mod resolve;
pub mod store;
pub mod theme;
pub mod tokens;

mod error;

pub use error::{Error, NotFoundKind, Result};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::compile::{Compiler, CompilerStats, minify};
    pub use crate::condition::{ConditionEvaluator, EvalContext, EvalError};
    pub use crate::config::{CacheConfig, CompilerConfig, EngineConfig, ResolverConfig};
    pub use crate::engine::{CompiledTheme, EngineStats, ThemeEngine, ThemeRequest};
    pub use crate::resolve::{
        MAX_RESOLUTION_DEPTH, ResolvedToken, Resolver, ResolverStats, TokenResolver,
        VariantSignature,
    };
    pub use crate::store::{MemoryThemeStore, ThemeStore};
    pub use crate::theme::{
        AccessibilityConfig, Condition, DarkModeConfig, DarkModeStrategy, OverrideSet, Theme,
        apply_overrides,
    };
    pub use crate::tokens::{TokenPath, TokenTree, is_reference};
    pub use crate::{Error, Result};
}
