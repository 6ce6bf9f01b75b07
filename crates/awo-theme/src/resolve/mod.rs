//! Token resolution: the resolver, its cache and variant signatures.

pub mod cache;
mod resolver;
mod signature;

pub use cache::{CacheStats, TtlCache};
pub use resolver::{
    MAX_RESOLUTION_DEPTH, ResolvedToken, Resolver, ResolverCache, ResolverKey, ResolverStats,
    TokenResolver,
};
pub use signature::VariantSignature;
