//! Tracing targets and span names used by the theme engine.
//!
//! The crate never installs a subscriber. Embedders pick one and can filter
//! subsystems with the constants below:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("awo_theme::resolver=debug,awo_theme::cache=trace")
//!     .init();
//! ```

/// Span names used throughout the engine.
pub mod span_names {
    /// One top-level token resolution.
    pub const RESOLVE: &str = "awo_theme::resolve";
    /// One CSS compilation.
    pub const COMPILE: &str = "awo_theme::compile";
    /// One orchestrated theme request.
    pub const THEME_REQUEST: &str = "awo_theme::theme_request";
}

/// Target names for log filtering.
pub mod targets {
    /// Reference resolution.
    pub const RESOLVER: &str = "awo_theme::resolver";
    /// CSS emission and minification.
    pub const COMPILER: &str = "awo_theme::compiler";
    /// Tenant and conditional override application.
    pub const OVERRIDES: &str = "awo_theme::overrides";
    /// Request orchestration and invalidation.
    pub const ENGINE: &str = "awo_theme::engine";
    /// Cache hits, misses and evictions.
    pub const CACHE: &str = "awo_theme::cache";
}
