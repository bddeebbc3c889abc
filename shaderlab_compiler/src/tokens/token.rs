//! Preprocessor tokens
//!
//! Macro names, parameters and bodies are stored as `Token`s in the
//! compile context's arena and referenced by `TokenId`.

use crate::utils::{Handle, Span};
use std::fmt;

pub type TokenId = Handle<Token>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    Define,
    Undef,
    If,
    Ifdef,
    Ifndef,
    Else,
    Elif,
    Endif,
    Include,
    /// `#version`, `#extension`, `#pragma`, ... passed through verbatim
    Other(String),
}

impl DirectiveKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "define" => Self::Define,
            "undef" => Self::Undef,
            "if" => Self::If,
            "ifdef" => Self::Ifdef,
            "ifndef" => Self::Ifndef,
            "else" => Self::Else,
            "elif" => Self::Elif,
            "endif" => Self::Endif,
            "include" => Self::Include,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Define => "define",
            Self::Undef => "undef",
            Self::If => "if",
            Self::Ifdef => "ifdef",
            Self::Ifndef => "ifndef",
            Self::Else => "else",
            Self::Elif => "elif",
            Self::Endif => "endif",
            Self::Include => "include",
            Self::Other(name) => name,
        }
    }

    /// Opens a conditional block
    pub fn opens_conditional(&self) -> bool {
        matches!(self, Self::If | Self::Ifdef | Self::Ifndef)
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Directive(DirectiveKind),
    Identifier,
    Number,
    StringLiteral,
    Punct,
    /// Raw text run, e.g. a macro body
    Text,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_names() {
        assert_eq!(DirectiveKind::from_name("ifndef"), DirectiveKind::Ifndef);
        assert_eq!(
            DirectiveKind::from_name("version"),
            DirectiveKind::Other("version".to_string())
        );
        assert_eq!(DirectiveKind::Elif.to_string(), "#elif");
        assert!(DirectiveKind::Ifdef.opens_conditional());
        assert!(!DirectiveKind::Endif.opens_conditional());
    }
}
