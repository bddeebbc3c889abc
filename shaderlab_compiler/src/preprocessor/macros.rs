//! Macro definitions and the per-compile macro table

use crate::tokens::{Token, TokenId, TokenKind};
use crate::utils::{Arena, Span};
use std::collections::HashMap;

/// Names with this prefix belong to the GL driver and cannot be redefined
pub const RESERVED_PREFIX: &str = "GL_";

const BUILTIN_FILE: &str = "<builtin>";

pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// One `#define`. Name, parameters and body are tokens in the context arena.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDefine {
    pub name: TokenId,
    pub body: Option<TokenId>,
    /// Present for function-like macros, possibly empty for `F()`
    pub params: Option<Vec<TokenId>>,
    pub location: Span,
    pub source_file: String,
}

impl MacroDefine {
    pub fn new(
        tokens: &mut Arena<Token>,
        name: &str,
        name_span: Span,
        location: Span,
        source_file: &str,
    ) -> Self {
        Self {
            name: tokens.alloc(Token::new(TokenKind::Identifier, name, name_span)),
            body: None,
            params: None,
            location,
            source_file: source_file.to_string(),
        }
    }

    pub fn with_params(mut self, tokens: &mut Arena<Token>, params: &[(String, Span)]) -> Self {
        self.params = Some(
            params
                .iter()
                .map(|(name, span)| tokens.alloc(Token::new(TokenKind::Identifier, name.as_str(), *span)))
                .collect(),
        );
        self
    }

    /// An empty body is stored as no body at all
    pub fn with_body(mut self, tokens: &mut Arena<Token>, body: &str, span: Span) -> Self {
        if !body.is_empty() {
            self.body = Some(tokens.alloc(Token::new(TokenKind::Text, body, span)));
        }
        self
    }

    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }

    pub fn name_text<'t>(&self, tokens: &'t Arena<Token>) -> &'t str {
        tokens.get(self.name).map(|t| t.lexeme.as_str()).unwrap_or_default()
    }

    pub fn body_text<'t>(&self, tokens: &'t Arena<Token>) -> &'t str {
        self.body
            .and_then(|id| tokens.get(id))
            .map(|t| t.lexeme.as_str())
            .unwrap_or_default()
    }

    pub fn param_names<'t>(&self, tokens: &'t Arena<Token>) -> Vec<&'t str> {
        self.params
            .iter()
            .flatten()
            .filter_map(|id| tokens.get(*id))
            .map(|t| t.lexeme.as_str())
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MacroTable {
    defines: HashMap<String, MacroDefine>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.defines.clear();
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MacroDefine> {
        self.defines.get(name)
    }

    /// Returns the definition that was replaced, if any
    pub fn insert(&mut self, name: &str, define: MacroDefine) -> Option<MacroDefine> {
        self.defines.insert(name.to_string(), define)
    }

    pub fn remove(&mut self, name: &str) -> Option<MacroDefine> {
        self.defines.remove(name)
    }

    /// Seed a macro that did not come from source text
    pub fn define_builtin(&mut self, tokens: &mut Arena<Token>, name: &str, value: Option<&str>) {
        let span = Span::default();
        let define = MacroDefine::new(tokens, name, span, span, BUILTIN_FILE)
            .with_body(tokens, value.unwrap_or_default().trim(), span);
        self.insert(name, define);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defines.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_resolve_through_arena() {
        let mut tokens = Arena::new();
        let mut table = MacroTable::new();
        let span = Span::default();

        let add = MacroDefine::new(&mut tokens, "ADD", span, span, "main.shader")
            .with_params(&mut tokens, &[("a".to_string(), span), ("b".to_string(), span)])
            .with_body(&mut tokens, "(a+b)", span);
        assert!(table.insert("ADD", add).is_none());

        let define = table.get("ADD").unwrap();
        assert!(define.is_function_like());
        assert_eq!(define.name_text(&tokens), "ADD");
        assert_eq!(define.body_text(&tokens), "(a+b)");
        assert_eq!(define.param_names(&tokens), vec!["a", "b"]);
    }

    #[test]
    fn test_builtin_and_reserved_names() {
        let mut tokens = Arena::new();
        let mut table = MacroTable::new();
        table.define_builtin(&mut tokens, "GL_ES", None);
        table.define_builtin(&mut tokens, "QUALITY", Some(" 2 "));

        assert!(is_reserved("GL_ES"));
        assert!(!is_reserved("GLOW"));
        assert_eq!(table.get("GL_ES").unwrap().body, None);
        assert_eq!(table.get("QUALITY").unwrap().body_text(&tokens), "2");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_stale_handles_read_as_empty_after_reset() {
        let mut tokens = Arena::new();
        let mut table = MacroTable::new();
        table.define_builtin(&mut tokens, "X", Some("1"));
        tokens.reset();
        assert_eq!(table.get("X").unwrap().body_text(&tokens), "");
    }
}
