//! Design tokens: values, paths and the layered tree that holds them.

pub mod path;
pub mod tree;
pub mod value;

pub use path::{Layer, TokenPath};
pub use tree::{
    CategoryRef, ComponentTokens, ComponentVariants, PrimitiveCategory, PrimitiveTokens,
    SemanticCategory, SemanticTokens, StyleProperties, TokenMap, TokenTree,
};
pub use value::{TokenValue, is_css_literal, is_reference};
