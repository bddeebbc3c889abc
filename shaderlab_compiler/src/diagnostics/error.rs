//! Located compile errors

use super::render::{render_header, render_snippet, Snippet};
use super::source_map::{MappedPosition, SourceMap};
use crate::config::runtime::DiagnosticPreferences;
use crate::lexical::ScannerError;
use crate::log_error;
use crate::logging::Code;
use crate::preprocessor::PreprocessorError;
use crate::syntax::CompilationError;
use crate::utils::{LineIndex, Span};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorReason {
    #[error(transparent)]
    Scanner(#[from] ScannerError),

    #[error(transparent)]
    Preprocessor(#[from] PreprocessorError),

    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Scanner,
    Preprocessor,
    Compilation,
}

/// An error with the file, span and text it was found in
#[derive(Debug, Clone, thiserror::Error)]
#[error("{file}:{}: {reason}", .span.start)]
pub struct CompileError {
    pub reason: ErrorReason,
    pub span: Span,
    pub file: String,
    pub text: Arc<str>,
    /// Set once the error has been traced back through a source map
    pub origin: Option<MappedPosition>,
}

impl CompileError {
    pub fn new(reason: impl Into<ErrorReason>, span: Span, file: &str, text: Arc<str>) -> Self {
        Self {
            reason: reason.into(),
            span,
            file: file.to_string(),
            text,
            origin: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.reason {
            ErrorReason::Scanner(_) => ErrorKind::Scanner,
            ErrorReason::Preprocessor(_) => ErrorKind::Preprocessor,
            ErrorReason::Compilation(_) => ErrorKind::Compilation,
        }
    }

    pub fn error_code(&self) -> Code {
        match &self.reason {
            ErrorReason::Scanner(e) => e.error_code(),
            ErrorReason::Preprocessor(e) => e.error_code(),
            ErrorReason::Compilation(e) => e.error_code(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match &self.reason {
            ErrorReason::Compilation(e) => e.is_recoverable(),
            _ => false,
        }
    }

    pub fn message(&self) -> String {
        self.reason.to_string()
    }

    /// Header, location and `wrap` lines of context around the error
    pub fn render(&self, wrap: usize) -> String {
        let code = self.error_code();
        let message = self.message();
        let index = LineIndex::new(self.text.clone());
        let snippet = Snippet {
            code: code.as_str(),
            message: &message,
            file: &self.file,
            span: index.span(self.span.start.offset, self.span.end.offset),
        };
        render_snippet(&snippet, &index, wrap)
    }

    pub fn render_with(&self, preferences: &DiagnosticPreferences) -> String {
        if preferences.show_source_snippet {
            return self.render(preferences.wrapping_line_count);
        }
        let code = self.error_code();
        let message = self.message();
        render_header(&Snippet {
            code: code.as_str(),
            message: &message,
            file: &self.file,
            span: self.span,
        })
    }

    /// Re-locate an error found in expanded text to the file and offset it
    /// came from. `sources` holds the text of every file the map can name;
    /// without it the error keeps its span and only records the origin.
    pub fn remap(mut self, map: &SourceMap, sources: &HashMap<String, Arc<str>>) -> Self {
        let start = map.map(self.span.start.offset);
        let end_index = if self.span.is_empty() {
            start.index
        } else {
            let last = map.map(self.span.end.offset - 1);
            if last.source_file == start.source_file && last.index >= start.index {
                last.index + 1
            } else {
                start.index
            }
        };

        if let Some(text) = sources.get(&start.source_file) {
            let index = LineIndex::new(text.clone());
            self.span = index.span(start.index, end_index);
            self.file = start.source_file.clone();
            self.text = text.clone();
        }
        self.origin = Some(start);
        self
    }

    pub fn log(&self) {
        log_error!(self.error_code(), &self.message(),
            span = self.span,
            "file" => self.file,
            "kind" => format!("{:?}", self.kind())
        );
    }
}
