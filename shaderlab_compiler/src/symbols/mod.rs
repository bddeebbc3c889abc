//! Symbols of the content parser
//!
//! Render-state blocks, render-queue names and variables declared inside
//! `Shader`/`SubShader`/`Pass` bodies. One scope per body, owned by the
//! compile context and pushed/popped by the parser.

pub mod table;

pub use table::{Symbol, SymbolKind, SymbolTable, SymbolTableStack, SymbolValue};
