//! Per-compile state
//!
//! One [`CompilerContext`] is threaded through preprocessing and content
//! parsing. It owns the macro table, the token arena, the segment stack,
//! the include cache and the symbol scopes. `reset` clears everything and
//! bumps the arena generation, so a context can be reused for the next
//! compile without leaking macros or symbols from the previous one.

use crate::config::compile_time::content::MAX_COLLECTED_ERRORS;
use crate::config::runtime::PreprocessorPreferences;
use crate::diagnostics::{CompileError, CompileResult, SourceMap};
use crate::log_debug;
use crate::preprocessor::{MacroTable, SegmentStack};
use crate::symbols::SymbolTableStack;
use crate::syntax::CompilationError;
use crate::tokens::Token;
use crate::utils::Arena;
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the built-in macro seeded before every compile
pub const GL_ES_MACRO: &str = "GL_ES";

/// Expanded text of an include chunk, reused when the chunk is included again
#[derive(Debug, Clone)]
pub struct CachedInclude {
    pub text: String,
    pub source_map: SourceMap,
}

#[derive(Debug, Default)]
pub struct CompilerContext {
    pub macros: MacroTable,
    pub tokens: Arena<Token>,
    pub segments: SegmentStack,
    pub include_cache: HashMap<String, CachedInclude>,
    /// Files currently being preprocessed, outermost first
    pub include_stack: Vec<String>,
    /// Text of every file that contributed to the expanded output
    pub sources: HashMap<String, Arc<str>>,
    pub symbols: SymbolTableStack,
    diagnostics: Vec<CompileError>,
    collect_errors: bool,
    warnings: usize,
}

impl CompilerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all per-compile state and seed the built-in and caller macros
    pub fn reset(&mut self, predefined: &[(String, Option<String>)], prefs: &PreprocessorPreferences) {
        self.macros.clear();
        self.tokens.reset();
        self.segments.clear();
        self.include_cache.clear();
        self.include_stack.clear();
        self.sources.clear();
        self.symbols.clear();
        self.diagnostics.clear();
        self.warnings = 0;

        if prefs.predefine_gl_es {
            self.macros.define_builtin(&mut self.tokens, GL_ES_MACRO, None);
        }
        for (name, value) in predefined {
            self.macros
                .define_builtin(&mut self.tokens, name, value.as_deref());
        }

        log_debug!("Compiler context reset",
            "generation" => self.tokens.generation(),
            "macros" => self.macros.len()
        );
    }

    pub fn set_collect_errors(&mut self, collect: bool) {
        self.collect_errors = collect;
    }

    pub fn collects_errors(&self) -> bool {
        self.collect_errors
    }

    /// Record a recoverable error. Returns it back as `Err` when collection
    /// is off or the error is fatal; hitting the cap aborts with
    /// `TooManyErrors`.
    pub fn report(&mut self, err: CompileError) -> CompileResult<()> {
        if !self.collect_errors || !err.is_recoverable() {
            return Err(err);
        }
        let (span, file, text) = (err.span, err.file.clone(), err.text.clone());
        self.diagnostics.push(err);

        if self.diagnostics.len() >= MAX_COLLECTED_ERRORS {
            return Err(CompileError::new(
                CompilationError::TooManyErrors,
                span,
                &file,
                text,
            ));
        }
        Ok(())
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[CompileError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Count a warning emitted through the logging service
    pub fn note_warning(&mut self) {
        self.warnings += 1;
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorReason;
    use crate::symbols::{Symbol, SymbolKind, SymbolValue};
    use crate::utils::Span;
    use assert_matches::assert_matches;

    fn prefs(gl_es: bool) -> PreprocessorPreferences {
        PreprocessorPreferences {
            warn_on_repeated_include: false,
            log_macro_redefinitions: false,
            predefine_gl_es: gl_es,
        }
    }

    fn undeclared(name: &str) -> CompileError {
        CompileError::new(
            CompilationError::UndeclaredVariable {
                name: name.to_string(),
            },
            Span::default(),
            "s.shader",
            Arc::from(""),
        )
    }

    #[test]
    fn test_reset_seeds_builtins_and_clears_state() {
        let mut ctx = CompilerContext::new();
        ctx.reset(&[("QUALITY".to_string(), Some(" 2 ".to_string()))], &prefs(true));
        assert!(ctx.macros.is_defined(GL_ES_MACRO));
        assert_eq!(
            ctx.macros.get("QUALITY").unwrap().body_text(&ctx.tokens),
            "2"
        );

        ctx.symbols.declare(Symbol::new(
            "q",
            SymbolKind::RenderQueue,
            SymbolValue::Undefined,
            Span::default(),
        ));
        ctx.include_stack.push("main".to_string());
        let generation = ctx.tokens.generation();

        ctx.reset(&[], &prefs(false));
        assert!(ctx.macros.is_empty());
        assert_eq!(ctx.symbols.depth(), 0);
        assert!(ctx.include_stack.is_empty());
        assert_ne!(ctx.tokens.generation(), generation);
    }

    #[test]
    fn test_report_without_collection_returns_error() {
        let mut ctx = CompilerContext::new();
        assert!(ctx.report(undeclared("a")).is_err());
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_report_collects_until_cap() {
        let mut ctx = CompilerContext::new();
        ctx.set_collect_errors(true);
        for i in 0..MAX_COLLECTED_ERRORS - 1 {
            ctx.report(undeclared(&format!("v{}", i))).unwrap();
        }
        let err = ctx.report(undeclared("last")).unwrap_err();
        assert_matches!(err.reason, ErrorReason::Compilation(CompilationError::TooManyErrors));
        assert_eq!(ctx.take_diagnostics().len(), MAX_COLLECTED_ERRORS);
        assert!(!ctx.has_errors());
    }
}
