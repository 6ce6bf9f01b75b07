//! Tenant branding overrides and the applier that merges them into a theme.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::model::{Condition, Theme};
use crate::error::Result;
use crate::logging::targets;
use crate::tokens::TokenPath;

/// A tenant's branding delta over a base theme.
///
/// Named fields are shorthands for common primitives. `tokens` addresses any
/// token by its full path and is applied last, so it wins over the
/// shorthands. Custom CSS is appended to the compiled stylesheet verbatim and
/// is never token-resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverrideSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Key → color, written to `primitives.colors.<key>`.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub color_palette: HashMap<String, String>,
    /// Key → value, written to `primitives.typography.<key>`.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub typography_scale: HashMap<String, String>,
    /// Key → value, written to `primitives.spacing.<key>`.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub spacing_scale: HashMap<String, String>,
    /// Full token path → value.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tokens: HashMap<String, String>,
    #[serde(rename = "customCSS", skip_serializing_if = "String::is_empty")]
    pub custom_css: String,
    #[serde(rename = "customJS", skip_serializing_if = "String::is_empty")]
    pub custom_js: String,
}

fn sorted(map: &HashMap<String, String>) -> Vec<(&String, &String)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort();
    entries
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_primary_color(mut self, color: impl Into<String>) -> Self {
        self.primary_color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_token(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.tokens.insert(path.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_custom_css(mut self, css: impl Into<String>) -> Self {
        self.custom_css = css.into();
        self
    }

    /// Token writes in application order. Later entries win.
    pub fn assignments(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();

        for (key, value) in sorted(&self.color_palette) {
            out.push((format!("primitives.colors.{key}"), value.clone()));
        }
        for (key, value) in sorted(&self.typography_scale) {
            out.push((format!("primitives.typography.{key}"), value.clone()));
        }
        for (key, value) in sorted(&self.spacing_scale) {
            out.push((format!("primitives.spacing.{key}"), value.clone()));
        }

        let named = [
            ("primitives.colors.primary", &self.primary_color),
            ("primitives.colors.secondary", &self.secondary_color),
            ("primitives.colors.accent", &self.accent_color),
            ("primitives.typography.fontFamily.sans", &self.font_family),
        ];
        for (path, value) in named {
            if let Some(value) = value {
                out.push((path.to_string(), value.clone()));
            }
        }

        for (path, value) in sorted(&self.tokens) {
            out.push((path.clone(), value.clone()));
        }
        out
    }

    /// Returns `true` if the set changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Identity of this set's content, independent of map ordering.
    pub fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.assignments().hash(&mut hasher);
        self.custom_css.hash(&mut hasher);
        self.custom_js.hash(&mut hasher);
        hasher.finish()
    }
}

impl From<&Condition> for OverrideSet {
    fn from(condition: &Condition) -> Self {
        Self {
            tokens: condition.overrides.clone(),
            ..Self::default()
        }
    }
}

/// Produce a new theme with `overrides` merged into a copy of `theme`.
///
/// Later writes win. `theme` itself is never modified. Override custom JS is
/// appended to the theme's; override custom CSS is left for the caller to
/// append after compilation.
pub fn apply_overrides(theme: &Theme, overrides: &OverrideSet) -> Result<Theme> {
    let mut themed = theme.clone();
    apply_in_place(&mut themed, overrides)?;
    Ok(themed)
}

/// Apply several override sets in order onto one copy of `theme`.
pub fn apply_all<'a>(theme: &Theme, sets: impl IntoIterator<Item = &'a OverrideSet>) -> Result<Theme> {
    let mut themed = theme.clone();
    for set in sets {
        apply_in_place(&mut themed, set)?;
    }
    Ok(themed)
}

fn apply_in_place(theme: &mut Theme, overrides: &OverrideSet) -> Result<()> {
    let assignments = overrides.assignments();
    for (path, value) in &assignments {
        let path = TokenPath::parse(path)?;
        theme.tokens.set(&path, value.as_str())?;
    }

    if !overrides.custom_js.is_empty() {
        if !theme.custom_js.is_empty() {
            theme.custom_js.push('\n');
        }
        theme.custom_js.push_str(&overrides.custom_js);
    }

    tracing::debug!(
        target: targets::OVERRIDES,
        theme = %theme.id,
        writes = assignments.len(),
        "applied override set"
    );
    Ok(())
}
