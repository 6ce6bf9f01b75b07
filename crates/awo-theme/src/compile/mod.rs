//! Stylesheet generation from resolved token trees.

mod compiler;
mod minify;

pub use compiler::{CompileKey, Compiler, CompilerCache, CompilerStats};
pub use minify::minify;
