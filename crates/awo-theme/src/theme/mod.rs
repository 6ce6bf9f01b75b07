//! Theme documents and override application.

mod model;
mod overrides;

pub use model::{
    AccessibilityConfig, Condition, DarkModeConfig, DarkModeStrategy, MAX_CUSTOM_CODE_BYTES, Theme,
};
pub use overrides::{OverrideSet, apply_all, apply_overrides};
