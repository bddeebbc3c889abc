//! Tokens of the structural content lexer

use crate::grammar::{EngineEnumType, Keyword};
use crate::utils::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderTokenKind {
    Keyword(Keyword),
    /// Engine enum namespace (`BlendFactor`, `CullMode`, ...)
    EngineEnum(EngineEnumType),
    Identifier(String),
    Number(f64),
    Boolean(bool),
    StringLiteral(String),
    /// One of `{ } ( ) [ ] ; , = . -`
    Punct(char),
    /// Any other character of opaque GLSL text
    Other(char),
    Eof,
}

impl ShaderTokenKind {
    pub fn is_punct(&self, c: char) -> bool {
        matches!(self, Self::Punct(p) if *p == c)
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, Self::Keyword(k) if *k == kw)
    }
}

impl fmt::Display for ShaderTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(kw) => write!(f, "{}", kw),
            Self::EngineEnum(ty) => write!(f, "{}", ty),
            Self::Identifier(name) => f.write_str(name),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::StringLiteral(s) => write!(f, "\"{}\"", s),
            Self::Punct(c) | Self::Other(c) => write!(f, "{}", c),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderToken {
    pub kind: ShaderTokenKind,
    pub span: Span,
}

impl ShaderToken {
    pub fn new(kind: ShaderTokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == ShaderTokenKind::Eof
    }
}
