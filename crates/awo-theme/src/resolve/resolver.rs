//! Reference resolution with cycle detection, a depth ceiling and caching.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::logging::{span_names, targets};
use crate::tokens::{Layer, TokenPath, TokenTree, TokenValue, is_reference};

use super::cache::TtlCache;
use super::signature::VariantSignature;

/// Hard ceiling on reference hops. Configuration can lower it, never raise it.
pub const MAX_RESOLUTION_DEPTH: usize = 20;

/// The final literal behind a token path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    /// The literal value.
    pub value: String,
    /// Number of references followed. `0` when the path holds a literal.
    pub depth: usize,
    /// Every path visited, starting with the requested one, with layer
    /// names spelled canonically.
    pub chain: Vec<String>,
}

impl ResolvedToken {
    fn cost(&self) -> usize {
        self.value.len() + self.chain.iter().map(String::len).sum::<usize>() + 32
    }

    /// A cached token is structurally sound if it holds a literal and
    /// respects the depth ceiling.
    fn is_well_formed(&self) -> bool {
        !is_reference(&self.value) && self.depth <= MAX_RESOLUTION_DEPTH && self.chain.len() == self.depth + 1
    }
}

/// Key of one cached resolution: the variant, the digest of the tree it was
/// resolved in and the canonical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolverKey {
    signature: VariantSignature,
    content: u64,
    path: String,
}

impl ResolverKey {
    pub fn new(signature: VariantSignature, content: u64, path: impl Into<String>) -> Self {
        Self {
            signature,
            content,
            path: path.into(),
        }
    }

    pub fn signature(&self) -> &VariantSignature {
        &self.signature
    }
}

/// Cache type used by [`Resolver`].
pub type ResolverCache = TtlCache<ResolverKey, ResolvedToken>;

/// Seam between the compiler and the resolver.
pub trait TokenResolver: Send + Sync {
    /// Resolve `path` inside `tree`, whose [`TokenTree::digest`] is `digest`.
    ///
    /// `signature` identifies the variant `tree` was built for. Any caching
    /// is scoped by both the signature and the digest, so a changed tree
    /// never sees values resolved in an older one.
    fn resolve_in(
        &self,
        tree: &TokenTree,
        digest: u64,
        path: &str,
        signature: &VariantSignature,
    ) -> Result<ResolvedToken>;

    /// Resolve `path` inside `tree` to a literal.
    fn resolve(&self, tree: &TokenTree, path: &str, signature: &VariantSignature) -> Result<ResolvedToken> {
        self.resolve_in(tree, tree.digest(), path, signature)
    }
}

/// Resolver counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolverStats {
    /// Resolutions computed from the tree rather than served from cache.
    pub computations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cached_entries: usize,
    /// Deepest chain seen so far.
    pub max_depth_seen: usize,
    pub hit_rate: f64,
}

/// Follows token references to their literal values.
///
/// # Thread Safety
///
/// `Resolver` is `Send + Sync`. Each call keeps its own visited chain on the
/// stack, so concurrent resolutions never share cycle-detection state.
pub struct Resolver {
    config: ResolverConfig,
    cache: ResolverCache,
    computations: AtomicU64,
    max_depth_seen: AtomicUsize,
}

impl Resolver {
    /// Create a resolver with a cache built from `config.cache`.
    pub fn new(config: ResolverConfig) -> Self {
        let cache = TtlCache::new(config.cache.clone());
        Self::with_cache(config, cache)
    }

    /// Create a resolver around an existing cache.
    pub fn with_cache(config: ResolverConfig, cache: ResolverCache) -> Self {
        Self {
            config,
            cache,
            computations: AtomicU64::new(0),
            max_depth_seen: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the token at `path`.
    ///
    /// Fails with [`Error::Validation`] for malformed paths,
    /// [`Error::NotFound`] when any path in the chain is undeclared,
    /// [`Error::CircularReference`] when the chain loops and
    /// [`Error::Resolution`] past the depth ceiling. Failures are never cached.
    pub fn resolve(&self, tree: &TokenTree, path: &str, signature: &VariantSignature) -> Result<ResolvedToken> {
        self.resolve_in(tree, tree.digest(), path, signature)
    }

    /// [`resolve`](Self::resolve) with the tree digest computed by the
    /// caller, for resolving many paths in one tree.
    pub fn resolve_in(
        &self,
        tree: &TokenTree,
        digest: u64,
        path: &str,
        signature: &VariantSignature,
    ) -> Result<ResolvedToken> {
        let path = TokenPath::parse(path)?;
        let key = ResolverKey::new(signature.clone(), digest, path.canonical());

        if let Some(hit) = self.cache.get_valid(&key, ResolvedToken::is_well_formed) {
            tracing::trace!(target: targets::RESOLVER, path = %path, %signature, "cache hit");
            return Ok(hit);
        }

        let resolved = self.compute(tree, &path)?;
        self.cache.insert(key, resolved.clone(), resolved.cost());
        Ok(resolved)
    }

    /// Resolve a raw value: literals pass through at depth `0`, references
    /// are followed and compound values are resolved part by part.
    pub fn resolve_value(&self, tree: &TokenTree, value: &str, signature: &VariantSignature) -> Result<String> {
        self.value_in(tree, tree.digest(), value, signature)
    }

    /// Resolve a whitespace-separated value such as
    /// `1px solid semantic.colors.border`, replacing each reference part.
    ///
    /// Parts are re-joined with single spaces.
    pub fn resolve_compound(&self, tree: &TokenTree, value: &str, signature: &VariantSignature) -> Result<String> {
        self.compound_in(tree, tree.digest(), value, signature)
    }

    /// A copy of `tree` with every value resolved to a literal.
    ///
    /// Component values may be compound. The first failure aborts.
    pub fn resolve_all(&self, tree: &TokenTree, signature: &VariantSignature) -> Result<TokenTree> {
        let digest = tree.digest();
        let mut resolved = tree.clone();
        for (path, raw) in tree.entries() {
            if !is_reference(raw) && !raw.contains(char::is_whitespace) {
                continue;
            }
            let value = self.value_in(tree, digest, raw, signature)?;
            resolved.set(&TokenPath::parse(&path)?, value)?;
        }
        Ok(resolved)
    }

    /// Drop cached resolutions for a theme, optionally for one tenant only.
    pub fn invalidate(&self, theme_id: &str, tenant_id: Option<&str>) -> usize {
        let removed = self.cache.remove_where(|key| key.signature.in_scope(theme_id, tenant_id));
        tracing::debug!(target: targets::RESOLVER, theme_id, ?tenant_id, removed, "invalidated resolutions");
        removed
    }

    /// Drop every cached resolution.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> ResolverStats {
        let cache = self.cache.stats();
        ResolverStats {
            computations: self.computations.load(Ordering::Relaxed),
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            cached_entries: cache.entries,
            max_depth_seen: self.max_depth_seen.load(Ordering::Relaxed),
            hit_rate: cache.hit_rate(),
        }
    }

    fn value_in(&self, tree: &TokenTree, digest: u64, value: &str, signature: &VariantSignature) -> Result<String> {
        match TokenValue::classify(value) {
            TokenValue::Reference(path) => Ok(self.resolve_in(tree, digest, path, signature)?.value),
            TokenValue::Literal(literal) if literal.contains(char::is_whitespace) => {
                self.compound_in(tree, digest, literal, signature)
            }
            TokenValue::Literal(literal) => Ok(literal.to_string()),
        }
    }

    fn compound_in(&self, tree: &TokenTree, digest: u64, value: &str, signature: &VariantSignature) -> Result<String> {
        let parts = value
            .split_whitespace()
            .map(|part| {
                if is_reference(part) {
                    self.resolve_in(tree, digest, part, signature).map(|r| r.value)
                } else {
                    Ok(part.to_string())
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(" "))
    }

    fn compute(&self, tree: &TokenTree, path: &TokenPath) -> Result<ResolvedToken> {
        let _span = tracing::trace_span!(target: targets::RESOLVER, span_names::RESOLVE, path = %path).entered();
        self.computations.fetch_add(1, Ordering::Relaxed);

        let mut visited = Vec::new();
        let value = self.follow(tree, path.as_str(), &mut visited)?;
        let depth = visited.len() - 1;
        self.max_depth_seen.fetch_max(depth, Ordering::Relaxed);

        Ok(ResolvedToken {
            value,
            depth,
            chain: visited,
        })
    }

    /// Follow one hop. `visited` holds the chain of the current call only.
    fn follow(&self, tree: &TokenTree, path: &str, visited: &mut Vec<String>) -> Result<String> {
        let parsed = TokenPath::parse(path)?;
        let canonical = parsed.canonical();
        if visited.contains(&canonical) {
            let mut chain = visited.clone();
            chain.push(canonical);
            return Err(Error::CircularReference { chain });
        }

        let raw = tree.lookup(&parsed)?;
        visited.push(canonical);

        match TokenValue::classify(raw) {
            TokenValue::Literal(literal) => Ok(literal.to_string()),
            TokenValue::Reference(next) => {
                if visited.len() > self.config.effective_max_depth() {
                    return Err(Error::resolution(
                        visited.first().map(String::as_str).unwrap_or(path),
                        format!(
                            "maximum resolution depth {} exceeded",
                            self.config.effective_max_depth()
                        ),
                    ));
                }
                if parsed.layer() == Some(Layer::Primitives) {
                    tracing::warn!(target: targets::RESOLVER, path, reference = next, "primitive token holds a reference");
                }
                self.follow(tree, next, visited)
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl TokenResolver for Resolver {
    fn resolve_in(
        &self,
        tree: &TokenTree,
        digest: u64,
        path: &str,
        signature: &VariantSignature,
    ) -> Result<ResolvedToken> {
        Resolver::resolve_in(self, tree, digest, path, signature)
    }
}
