//! The three-layer token tree.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::path::{Layer, TokenPath};
use super::value::is_reference;
use crate::error::{Error, Result};

/// Flat key → raw value map of one category.
pub type TokenMap = HashMap<String, String>;
/// Property → raw value map of one component variant.
pub type StyleProperties = HashMap<String, String>;
/// Variant → properties map of one component.
pub type ComponentVariants = HashMap<String, StyleProperties>;
/// Component → variants map.
pub type ComponentTokens = HashMap<String, ComponentVariants>;

/// Categories of the primitives layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveCategory {
    Colors,
    Spacing,
    Radius,
    Typography,
    Borders,
    Shadows,
    Effects,
    Animation,
    ZIndex,
    Breakpoints,
}

impl PrimitiveCategory {
    /// All categories in emission order.
    pub const ALL: [PrimitiveCategory; 10] = [
        PrimitiveCategory::Colors,
        PrimitiveCategory::Spacing,
        PrimitiveCategory::Radius,
        PrimitiveCategory::Typography,
        PrimitiveCategory::Borders,
        PrimitiveCategory::Shadows,
        PrimitiveCategory::Effects,
        PrimitiveCategory::Animation,
        PrimitiveCategory::ZIndex,
        PrimitiveCategory::Breakpoints,
    ];

    /// Path segment naming this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Colors => "colors",
            Self::Spacing => "spacing",
            Self::Radius => "radius",
            Self::Typography => "typography",
            Self::Borders => "borders",
            Self::Shadows => "shadows",
            Self::Effects => "effects",
            Self::Animation => "animation",
            Self::ZIndex => "zindex",
            Self::Breakpoints => "breakpoints",
        }
    }

    /// Short name used inside CSS custom property names.
    pub fn css_name(&self) -> &'static str {
        match self {
            Self::Colors => "color",
            Self::Spacing => "spacing",
            Self::Radius => "radius",
            Self::Typography => "font",
            Self::Borders => "border",
            Self::Shadows => "shadow",
            Self::Effects => "effect",
            Self::Animation => "animation",
            Self::ZIndex => "z",
            Self::Breakpoints => "breakpoint",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == segment)
    }
}

/// Categories of the semantic layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticCategory {
    Colors,
    Spacing,
    Typography,
    Interactive,
}

impl SemanticCategory {
    /// All categories in emission order.
    pub const ALL: [SemanticCategory; 4] = [
        SemanticCategory::Colors,
        SemanticCategory::Spacing,
        SemanticCategory::Typography,
        SemanticCategory::Interactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Colors => "colors",
            Self::Spacing => "spacing",
            Self::Typography => "typography",
            Self::Interactive => "interactive",
        }
    }

    pub fn css_name(&self) -> &'static str {
        match self {
            Self::Colors => "color",
            Self::Spacing => "spacing",
            Self::Typography => "font",
            Self::Interactive => "interactive",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == segment)
    }
}

/// Raw design values. These must be literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitiveTokens {
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub colors: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub spacing: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub radius: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub typography: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub borders: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub shadows: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub effects: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub animation: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub zindex: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub breakpoints: TokenMap,
}

impl PrimitiveTokens {
    pub fn category(&self, category: PrimitiveCategory) -> &TokenMap {
        match category {
            PrimitiveCategory::Colors => &self.colors,
            PrimitiveCategory::Spacing => &self.spacing,
            PrimitiveCategory::Radius => &self.radius,
            PrimitiveCategory::Typography => &self.typography,
            PrimitiveCategory::Borders => &self.borders,
            PrimitiveCategory::Shadows => &self.shadows,
            PrimitiveCategory::Effects => &self.effects,
            PrimitiveCategory::Animation => &self.animation,
            PrimitiveCategory::ZIndex => &self.zindex,
            PrimitiveCategory::Breakpoints => &self.breakpoints,
        }
    }

    pub fn category_mut(&mut self, category: PrimitiveCategory) -> &mut TokenMap {
        match category {
            PrimitiveCategory::Colors => &mut self.colors,
            PrimitiveCategory::Spacing => &mut self.spacing,
            PrimitiveCategory::Radius => &mut self.radius,
            PrimitiveCategory::Typography => &mut self.typography,
            PrimitiveCategory::Borders => &mut self.borders,
            PrimitiveCategory::Shadows => &mut self.shadows,
            PrimitiveCategory::Effects => &mut self.effects,
            PrimitiveCategory::Animation => &mut self.animation,
            PrimitiveCategory::ZIndex => &mut self.zindex,
            PrimitiveCategory::Breakpoints => &mut self.breakpoints,
        }
    }
}

/// Purpose-named values, usually references into the primitives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticTokens {
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub colors: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub spacing: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub typography: TokenMap,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub interactive: TokenMap,
}

impl SemanticTokens {
    pub fn category(&self, category: SemanticCategory) -> &TokenMap {
        match category {
            SemanticCategory::Colors => &self.colors,
            SemanticCategory::Spacing => &self.spacing,
            SemanticCategory::Typography => &self.typography,
            SemanticCategory::Interactive => &self.interactive,
        }
    }

    pub fn category_mut(&mut self, category: SemanticCategory) -> &mut TokenMap {
        match category {
            SemanticCategory::Colors => &mut self.colors,
            SemanticCategory::Spacing => &mut self.spacing,
            SemanticCategory::Typography => &mut self.typography,
            SemanticCategory::Interactive => &mut self.interactive,
        }
    }
}

/// One declared category of the primitives or semantic layer.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRef<'a> {
    pub layer: Layer,
    /// Path segment, e.g. `colors`.
    pub name: &'static str,
    /// CSS short name, e.g. `color`.
    pub css_name: &'static str,
    pub tokens: &'a TokenMap,
}

impl CategoryRef<'_> {
    /// Full token path of `key` inside this category.
    pub fn path_of(&self, key: &str) -> String {
        format!("{}.{}.{}", self.layer, self.name, key)
    }
}

/// A complete token tree: primitives, semantic aliases and component tokens.
///
/// Values are raw strings; see [`is_reference`] for how references are told
/// apart from literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenTree {
    pub primitives: PrimitiveTokens,
    pub semantic: SemanticTokens,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub components: ComponentTokens,
}

impl TokenTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert by path text.
    pub fn with(mut self, path: &str, value: impl Into<String>) -> Result<Self> {
        self.set(&TokenPath::parse(path)?, value)?;
        Ok(self)
    }

    /// Look up the raw value stored at `path`.
    pub fn lookup(&self, path: &TokenPath) -> Result<&str> {
        let not_found = || Error::token_not_found(path.as_str());
        let tail = path.tail();

        match path.layer() {
            Some(Layer::Primitives) => {
                let (category, key) = split_category(&tail).ok_or_else(not_found)?;
                let category = PrimitiveCategory::from_segment(category).ok_or_else(not_found)?;
                self.primitives.category(category).get(&key).map(String::as_str).ok_or_else(not_found)
            }
            Some(Layer::Semantic) => {
                let (category, key) = split_category(&tail).ok_or_else(not_found)?;
                let category = SemanticCategory::from_segment(category).ok_or_else(not_found)?;
                self.semantic.category(category).get(&key).map(String::as_str).ok_or_else(not_found)
            }
            Some(Layer::Components) => {
                if tail.len() < 3 {
                    return Err(not_found());
                }
                let property = tail[2..].join(".");
                self.components
                    .get(tail[0])
                    .and_then(|variants| variants.get(tail[1]))
                    .and_then(|props| props.get(&property))
                    .map(String::as_str)
                    .ok_or_else(not_found)
            }
            None => Err(not_found()),
        }
    }

    /// Look up a raw value by path text.
    pub fn get(&self, path: &str) -> Option<&str> {
        TokenPath::parse(path).ok().and_then(|p| self.lookup(&p).ok())
    }

    /// Store `value` at `path`, creating component and variant maps on demand.
    pub fn set(&mut self, path: &TokenPath, value: impl Into<String>) -> Result<()> {
        let tail = path.tail();
        let invalid = |message: &str| Error::validation("token path", format!("'{path}' {message}"));

        match path.layer() {
            Some(Layer::Primitives) => {
                let (category, key) = split_category(&tail).ok_or_else(|| invalid("has no key"))?;
                let category = PrimitiveCategory::from_segment(category)
                    .ok_or_else(|| invalid("names an unknown primitive category"))?;
                self.primitives.category_mut(category).insert(key, value.into());
            }
            Some(Layer::Semantic) => {
                let (category, key) = split_category(&tail).ok_or_else(|| invalid("has no key"))?;
                let category = SemanticCategory::from_segment(category)
                    .ok_or_else(|| invalid("names an unknown semantic category"))?;
                self.semantic.category_mut(category).insert(key, value.into());
            }
            Some(Layer::Components) => {
                if tail.len() < 3 {
                    return Err(invalid("must be components.<component>.<variant>.<property>"));
                }
                self.components
                    .entry(tail[0].to_string())
                    .or_default()
                    .entry(tail[1].to_string())
                    .or_default()
                    .insert(tail[2..].join("."), value.into());
            }
            None => return Err(invalid("names an unknown layer")),
        }
        Ok(())
    }

    /// Merge `delta` into `self`. Values in `delta` win.
    pub fn merge(&mut self, delta: &TokenTree) {
        for category in PrimitiveCategory::ALL {
            let target = self.primitives.category_mut(category);
            for (k, v) in delta.primitives.category(category) {
                target.insert(k.clone(), v.clone());
            }
        }
        for category in SemanticCategory::ALL {
            let target = self.semantic.category_mut(category);
            for (k, v) in delta.semantic.category(category) {
                target.insert(k.clone(), v.clone());
            }
        }
        for (component, variants) in &delta.components {
            let target = self.components.entry(component.clone()).or_default();
            for (variant, props) in variants {
                let target = target.entry(variant.clone()).or_default();
                for (k, v) in props {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
    }

    /// A copy of `self` with `delta` merged on top.
    #[must_use]
    pub fn merged_with(&self, delta: &TokenTree) -> TokenTree {
        let mut merged = self.clone();
        merged.merge(delta);
        merged
    }

    /// Declared primitive and semantic categories, in emission order,
    /// skipping empty ones.
    pub fn categories(&self) -> impl Iterator<Item = CategoryRef<'_>> {
        let primitives = PrimitiveCategory::ALL.into_iter().map(|c| CategoryRef {
            layer: Layer::Primitives,
            name: c.as_str(),
            css_name: c.css_name(),
            tokens: self.primitives.category(c),
        });
        let semantic = SemanticCategory::ALL.into_iter().map(|c| CategoryRef {
            layer: Layer::Semantic,
            name: c.as_str(),
            css_name: c.css_name(),
            tokens: self.semantic.category(c),
        });
        primitives.chain(semantic).filter(|c| !c.tokens.is_empty())
    }

    /// Every `(path, raw value)` pair in the tree, sorted by path.
    pub fn entries(&self) -> Vec<(String, &str)> {
        let mut entries: Vec<(String, &str)> = self
            .categories()
            .flat_map(|c| c.tokens.iter().map(move |(k, v)| (c.path_of(k), v.as_str())))
            .collect();

        for (component, variants) in &self.components {
            for (variant, props) in variants {
                for (property, value) in props {
                    entries.push((format!("components.{component}.{variant}.{property}"), value.as_str()));
                }
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Total number of tokens.
    pub fn len(&self) -> usize {
        let flat: usize = self.categories().map(|c| c.tokens.len()).sum();
        let components: usize = self
            .components
            .values()
            .flat_map(|variants| variants.values())
            .map(HashMap::len)
            .sum();
        flat + components
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content digest of the tree. Equal trees have equal digests.
    pub fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_content(&mut hasher);
        hasher.finish()
    }

    /// Feed the tree's content into `state`. Independent of map iteration
    /// order, so equal trees always hash equally.
    pub fn hash_content<H: Hasher>(&self, state: &mut H) {
        let entries = self.entries();
        entries.len().hash(state);
        for (path, value) in entries {
            path.hash(state);
            value.hash(state);
        }
    }

    /// Structural checks: primitives hold literals, references are
    /// well-formed paths, values are non-empty and component variants
    /// declare at least one property.
    pub fn validate(&self) -> Result<()> {
        for (component, variants) in &self.components {
            for (variant, props) in variants {
                if props.is_empty() {
                    return Err(Error::validation(
                        "component tokens",
                        format!("variant '{component}.{variant}' declares no properties"),
                    ));
                }
            }
        }

        for (path, value) in self.entries() {
            if value.trim().is_empty() {
                return Err(Error::validation("token value", format!("'{path}' is empty")));
            }
            if !is_reference(value) {
                continue;
            }
            if path.starts_with("primitives.") {
                return Err(Error::validation(
                    "token value",
                    format!("primitive '{path}' must be a literal, found reference '{value}'"),
                ));
            }
            TokenPath::parse(value).map_err(|_| {
                Error::validation("token value", format!("'{path}' holds malformed reference '{value}'"))
            })?;
        }
        Ok(())
    }
}

/// Split `[category, key...]` into the category and the dotted key.
fn split_category<'a>(tail: &[&'a str]) -> Option<(&'a str, String)> {
    match tail {
        [category, key @ ..] if !key.is_empty() => Some((*category, key.join("."))),
        _ => None,
    }
}
