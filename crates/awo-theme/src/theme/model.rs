//! Theme documents.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tokens::{TokenPath, TokenTree};

/// Largest accepted custom CSS or JS payload.
pub const MAX_CUSTOM_CODE_BYTES: usize = 1024 * 1024;

/// How dark-mode variables are selected in the compiled stylesheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkModeStrategy {
    /// A `.dark` class on an ancestor element.
    #[default]
    Class,
    /// The `prefers-color-scheme: dark` media query.
    Media,
    /// Both the class and the media query.
    Auto,
}

/// Dark-mode settings and the token delta applied in dark mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DarkModeConfig {
    pub enabled: bool,
    /// Dark mode is the default presentation.
    pub default: bool,
    pub strategy: DarkModeStrategy,
    /// Tokens overriding the base tree in dark mode.
    #[serde(rename = "darkTokens", skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenTree>,
}

impl DarkModeConfig {
    /// The dark token delta, if dark mode is enabled and declares one.
    pub fn active_tokens(&self) -> Option<&TokenTree> {
        if self.enabled { self.tokens.as_ref() } else { None }
    }
}

/// A runtime condition that overrides tokens when its expression holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub id: String,
    /// Opaque to the engine; interpreted by a
    /// [`ConditionEvaluator`](crate::condition::ConditionEvaluator).
    pub expression: String,
    /// Higher priorities are applied later and therefore win.
    pub priority: i32,
    /// Token path → replacement value.
    pub overrides: HashMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Accessibility options that add rules to the compiled stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessibilityConfig {
    pub high_contrast: bool,
    pub min_contrast_ratio: f64,
    pub focus_indicator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_outline_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_outline_width: Option<String>,
    pub keyboard_nav: bool,
    pub reduced_motion: bool,
    pub screen_reader: bool,
    /// One of `off`, `polite` or `assertive`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_live: Option<String>,
}

impl AccessibilityConfig {
    fn hash_content<H: Hasher>(&self, state: &mut H) {
        self.high_contrast.hash(state);
        self.min_contrast_ratio.to_bits().hash(state);
        self.focus_indicator.hash(state);
        self.focus_outline_color.hash(state);
        self.focus_outline_width.hash(state);
        self.keyboard_nav.hash(state);
        self.reduced_motion.hash(state);
        self.screen_reader.hash(state);
        self.aria_live.hash(state);
    }
}

/// A complete theme: token tree plus dark mode, conditions, accessibility
/// and custom code.
///
/// Themes are plain values. Applying overrides always produces a new theme
/// and never touches the one held by a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    pub tokens: TokenTree,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<DarkModeConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<AccessibilityConfig>,
    #[serde(rename = "customCSS", skip_serializing_if = "String::is_empty")]
    pub custom_css: String,
    #[serde(rename = "customJS", skip_serializing_if = "String::is_empty")]
    pub custom_js: String,
}

impl Theme {
    /// Create an empty theme.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens: TokenTree) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn with_dark_mode(mut self, dark_mode: DarkModeConfig) -> Self {
        self.dark_mode = Some(dark_mode);
        self
    }

    #[must_use]
    pub fn with_accessibility(mut self, accessibility: AccessibilityConfig) -> Self {
        self.accessibility = Some(accessibility);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn with_custom_css(mut self, css: impl Into<String>) -> Self {
        self.custom_css = css.into();
        self
    }

    /// Parse and validate a theme from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let theme: Theme =
            serde_json::from_str(json).map_err(|e| Error::validation("theme document", e.to_string()))?;
        theme.validate()?;
        Ok(theme)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::validation("theme document", e.to_string()))
    }

    /// The dark token delta, if dark mode is enabled and declares one.
    pub fn dark_tokens(&self) -> Option<&TokenTree> {
        self.dark_mode.as_ref().and_then(DarkModeConfig::active_tokens)
    }

    /// Check the whole document.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("theme", "id is required"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::validation("theme", format!("'{}' has no name", self.id)));
        }

        self.tokens.validate()?;
        if let Some(dark) = self.dark_tokens() {
            dark.validate()?;
        }

        for condition in &self.conditions {
            if condition.id.trim().is_empty() {
                return Err(Error::validation("condition", "id is required"));
            }
            if condition.expression.trim().is_empty() {
                return Err(Error::validation(
                    "condition",
                    format!("'{}' has no expression", condition.id),
                ));
            }
            for (path, value) in &condition.overrides {
                TokenPath::parse(path)?;
                if value.trim().is_empty() {
                    return Err(Error::validation(
                        "condition",
                        format!("'{}' overrides '{path}' with an empty value", condition.id),
                    ));
                }
            }
        }

        if let Some(a11y) = &self.accessibility {
            if !(0.0..=21.0).contains(&a11y.min_contrast_ratio) {
                return Err(Error::validation(
                    "accessibility",
                    format!("contrast ratio {} is outside 0..=21", a11y.min_contrast_ratio),
                ));
            }
            if let Some(live) = &a11y.aria_live {
                if !matches!(live.as_str(), "off" | "polite" | "assertive") {
                    return Err(Error::validation(
                        "accessibility",
                        format!("unknown aria-live value '{live}'"),
                    ));
                }
            }
        }

        if self.custom_css.len() > MAX_CUSTOM_CODE_BYTES {
            return Err(Error::validation("theme", "custom CSS exceeds 1 MiB"));
        }
        if self.custom_js.len() > MAX_CUSTOM_CODE_BYTES {
            return Err(Error::validation("theme", "custom JS exceeds 1 MiB"));
        }
        Ok(())
    }

    /// Feed everything that affects compiled output into `state`.
    pub fn hash_content<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
        self.version.hash(state);
        self.tokens.hash_content(state);
        match &self.dark_mode {
            Some(dark) => {
                true.hash(state);
                dark.enabled.hash(state);
                dark.default.hash(state);
                dark.strategy.hash(state);
                if let Some(tokens) = &dark.tokens {
                    tokens.hash_content(state);
                }
            }
            None => false.hash(state),
        }

        let mut conditions: Vec<&Condition> = self.conditions.iter().collect();
        conditions.sort_by(|a, b| a.id.cmp(&b.id));
        for condition in conditions {
            condition.id.hash(state);
            condition.expression.hash(state);
            condition.priority.hash(state);
            let mut overrides: Vec<_> = condition.overrides.iter().collect();
            overrides.sort();
            overrides.hash(state);
        }

        match &self.accessibility {
            Some(a11y) => {
                true.hash(state);
                a11y.hash_content(state);
            }
            None => false.hash(state),
        }
        self.custom_css.hash(state);
        self.custom_js.hash(state);
    }

    /// A digest of the theme's content, stable for equal themes.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_content(&mut hasher);
        hasher.finish()
    }
}
