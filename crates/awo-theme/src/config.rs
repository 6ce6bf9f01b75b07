//! Engine configuration.
//!
//! Every struct here is `#[serde(default)]`, so a TOML file only needs to
//! name the values it changes:
//!
//! ```toml
//! enable_conditionals = true
//!
//! [resolver]
//! max_depth = 12
//!
//! [compiler]
//! prefix = "brand"
//! minify = true
//!
//! [compiler.cache]
//! ttl_ms = 60000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::resolve::MAX_RESOLUTION_DEPTH;

/// Configuration for one bounded TTL cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether results are cached at all.
    /// Default: true.
    pub enabled: bool,
    /// Upper bound on the summed cost of live entries, in bytes.
    pub max_cost: usize,
    /// Time-to-live of an entry in milliseconds.
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_cost: 10 * 1024 * 1024, // 10 MB
            ttl_ms: 5 * 60 * 1000,
        }
    }
}

impl CacheConfig {
    /// A configuration with caching turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the maximum total cost in bytes.
    #[must_use]
    pub fn with_max_cost(mut self, bytes: usize) -> Self {
        self.max_cost = bytes;
        self
    }

    /// Set the maximum total cost in megabytes.
    #[must_use]
    pub fn with_max_cost_mb(mut self, mb: usize) -> Self {
        self.max_cost = mb * 1024 * 1024;
        self
    }

    /// Set the entry time-to-live.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable caching.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Entry time-to-live as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum number of reference hops. Values above
    /// [`MAX_RESOLUTION_DEPTH`] are clamped to it.
    pub max_depth: usize,
    /// Resolution cache settings.
    pub cache: CacheConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_RESOLUTION_DEPTH,
            cache: CacheConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Set the maximum number of reference hops.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Replace the cache settings.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// The depth limit actually enforced.
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.min(MAX_RESOLUTION_DEPTH)
    }
}

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Prefix of every emitted custom property (`--{prefix}-...`).
    pub prefix: String,
    /// Minify the final stylesheet.
    pub minify: bool,
    /// Emit a comment header naming the theme.
    pub include_comments: bool,
    /// Compiled output cache settings.
    pub cache: CacheConfig,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            prefix: "awo".to_string(),
            minify: false,
            include_comments: false,
            cache: CacheConfig {
                enabled: true,
                max_cost: 20 * 1024 * 1024, // 20 MB
                ttl_ms: 10 * 60 * 1000,
            },
        }
    }
}

impl CompilerConfig {
    /// Set the custom property prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enable or disable minification.
    #[must_use]
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Enable or disable the comment header.
    #[must_use]
    pub fn with_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    /// Replace the cache settings.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Top-level configuration for [`ThemeEngine`](crate::engine::ThemeEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluate theme conditions when a request carries a context.
    pub enable_conditionals: bool,
    /// Validate themes before they are published to the store.
    pub validate_on_publish: bool,
    pub resolver: ResolverConfig,
    pub compiler: CompilerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_conditionals: true,
            validate_on_publish: true,
            resolver: ResolverConfig::default(),
            compiler: CompilerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::config(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Serialize the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_compiler(mut self, compiler: CompilerConfig) -> Self {
        self.compiler = compiler;
        self
    }

    #[must_use]
    pub fn with_conditionals(mut self, enable: bool) -> Self {
        self.enable_conditionals = enable;
        self
    }
}
