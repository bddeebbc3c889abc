//! Scoped symbol tables for render-state declarations and variables

use crate::grammar::{RenderStateType, RenderStates, ValueKind};
use crate::utils::Span;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// What a name was declared as. The same identifier may be declared once
/// per kind in a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    /// `BlendState name { ... }` or `BlendState name;`
    RenderState(RenderStateType),
    /// `RenderQueueType name;`
    RenderQueue,
    /// `float name;`, `BlendFactor name;`, ...
    Variable(ValueKind),
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenderState(state) => write!(f, "{}", state),
            Self::RenderQueue => f.write_str("RenderQueueType"),
            Self::Variable(kind) => write!(f, "{} variable", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SymbolValue {
    /// Properties of a declared render-state block
    RenderStates(RenderStates),
    /// Forward declarations and plain variables
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub ident: String,
    pub kind: SymbolKind,
    pub value: SymbolValue,
    #[serde(skip)]
    pub span: Span,
}

impl Symbol {
    pub fn new(ident: &str, kind: SymbolKind, value: SymbolValue, span: Span) -> Self {
        Self {
            ident: ident.to_string(),
            kind,
            value,
            span,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, SymbolKind::Variable(_))
    }
}

/// One scope (`Shader`, `SubShader` or `Pass` body)
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, Vec<Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing a same-name same-kind symbol
    pub fn declare(&mut self, symbol: Symbol) -> Option<Symbol> {
        let entries = self.entries.entry(symbol.ident.clone()).or_default();
        match entries.iter_mut().find(|existing| existing.kind == symbol.kind) {
            Some(existing) => Some(std::mem::replace(existing, symbol)),
            None => {
                entries.push(symbol);
                None
            }
        }
    }

    pub fn get(&self, ident: &str, kind: SymbolKind) -> Option<&Symbol> {
        self.entries.get(ident)?.iter().find(|s| s.kind == kind)
    }

    pub fn find(&self, ident: &str, predicate: impl Fn(&Symbol) -> bool) -> Option<&Symbol> {
        self.entries.get(ident)?.iter().find(|s| predicate(s))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stack of scopes; lookups walk from the innermost scope outwards
#[derive(Debug, Clone, Default)]
pub struct SymbolTableStack {
    scopes: Vec<SymbolTable>,
}

impl SymbolTableStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(SymbolTable::new());
    }

    pub fn pop_scope(&mut self) -> Option<SymbolTable> {
        self.scopes.pop()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn clear(&mut self) {
        self.scopes.clear();
    }

    pub fn declare(&mut self, symbol: Symbol) -> Option<Symbol> {
        if self.scopes.is_empty() {
            self.push_scope();
        }
        self.scopes.last_mut()?.declare(symbol)
    }

    pub fn lookup(&self, ident: &str, kind: SymbolKind) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(ident, kind))
    }

    /// Innermost variable named `ident`, whatever its value kind
    pub fn lookup_variable(&self, ident: &str) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.find(ident, Symbol::is_variable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::EngineEnumType;

    fn symbol(ident: &str, kind: SymbolKind) -> Symbol {
        Symbol::new(ident, kind, SymbolValue::Undefined, Span::default())
    }

    #[test]
    fn test_lookup_walks_innermost_first() {
        let blend = SymbolKind::RenderState(RenderStateType::BlendState);
        let mut stack = SymbolTableStack::new();
        stack.push_scope();
        stack.declare(Symbol::new(
            "b",
            blend,
            SymbolValue::RenderStates(RenderStates::default()),
            Span::default(),
        ));
        stack.push_scope();
        stack.declare(symbol("b", blend));

        assert_eq!(stack.lookup("b", blend).unwrap().value, SymbolValue::Undefined);
        stack.pop_scope();
        assert_matches::assert_matches!(
            stack.lookup("b", blend).unwrap().value,
            SymbolValue::RenderStates(_)
        );
        stack.pop_scope();
        assert!(stack.lookup("b", blend).is_none());
    }

    #[test]
    fn test_same_name_different_kinds() {
        let mut table = SymbolTable::new();
        assert!(table.declare(symbol("q", SymbolKind::RenderQueue)).is_none());
        assert!(table
            .declare(symbol("q", SymbolKind::RenderState(RenderStateType::DepthState)))
            .is_none());
        assert!(table.declare(symbol("q", SymbolKind::RenderQueue)).is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_variable_lookup_ignores_value_kind() {
        let mut stack = SymbolTableStack::new();
        stack.declare(symbol(
            "src",
            SymbolKind::Variable(ValueKind::Enum(EngineEnumType::BlendFactor)),
        ));
        let found = stack.lookup_variable("src").unwrap();
        assert_eq!(
            found.kind,
            SymbolKind::Variable(ValueKind::Enum(EngineEnumType::BlendFactor))
        );
        assert!(stack.lookup_variable("dst").is_none());
        assert_eq!(stack.depth(), 1);
    }
}
