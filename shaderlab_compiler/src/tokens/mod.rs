//! Token types for both lexers
//!
//! - [`Token`] / [`TokenKind`]: preprocessor tokens, arena-allocated and
//!   referenced through [`TokenId`] handles by macro definitions.
//! - [`ShaderToken`] / [`ShaderTokenKind`]: tokens of the structural content
//!   lexer, produced on demand and never stored.

pub mod shader_token;
pub mod token;

pub use shader_token::{ShaderToken, ShaderTokenKind};
pub use token::{DirectiveKind, Token, TokenId, TokenKind};
