//! Preprocessor errors; all of them abort the compile

use crate::config::compile_time::preprocessor::{
    MAX_CONDITIONAL_DEPTH, MAX_EXPANSION_DEPTH, MAX_INCLUDE_DEPTH, MAX_MACRO_COUNT,
};
use crate::logging::codes;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreprocessorError {
    #[error("Cannot redefine reserved macro '{name}'")]
    ReservedMacroRedefinition { name: String },

    #[error("Included chunk '{name}' not found")]
    MissingInclude { name: String },

    #[error("Recursive include of '{name}' ({chain})")]
    RecursiveInclude { name: String, chain: String },

    #[error("Include nesting deeper than {MAX_INCLUDE_DEPTH} at '{name}'")]
    IncludeDepthExceeded { name: String },

    #[error("Malformed expression: {message}")]
    MalformedExpression { message: String },

    #[error("Division by zero in conditional expression")]
    DivisionByZero,

    #[error("Function-like macro '{name}' cannot be evaluated in a condition")]
    FunctionMacroInCondition { name: String },

    #[error("Macro '{name}' expects {expected} argument(s), found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Missing #endif for {directive}")]
    UnterminatedConditional { directive: String },

    #[error("Unexpected {directive}: {reason}")]
    UnexpectedDirective { directive: String, reason: String },

    #[error("{directive} requires a macro name")]
    InvalidMacroName { directive: String },

    #[error("Macro expansion deeper than {MAX_EXPANSION_DEPTH} at '{name}'")]
    ExpansionDepthExceeded { name: String },

    #[error("More than {MAX_MACRO_COUNT} macros defined")]
    TooManyMacros,

    #[error("Conditional nesting deeper than {MAX_CONDITIONAL_DEPTH}")]
    ConditionalDepthExceeded,
}

impl PreprocessorError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExpression {
            message: message.into(),
        }
    }

    pub fn unexpected(directive: &str, reason: &str) -> Self {
        Self::UnexpectedDirective {
            directive: directive.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn error_code(&self) -> crate::logging::Code {
        use codes::preprocessor::*;
        match self {
            Self::ReservedMacroRedefinition { .. } => RESERVED_MACRO_REDEFINITION,
            Self::MissingInclude { .. } => MISSING_INCLUDE,
            Self::RecursiveInclude { .. } => RECURSIVE_INCLUDE,
            Self::IncludeDepthExceeded { .. } => INCLUDE_DEPTH_EXCEEDED,
            Self::MalformedExpression { .. } => MALFORMED_EXPRESSION,
            Self::DivisionByZero => DIVISION_BY_ZERO,
            Self::FunctionMacroInCondition { .. } => FUNCTION_MACRO_IN_CONDITION,
            Self::ArityMismatch { .. } => ARITY_MISMATCH,
            Self::UnterminatedConditional { .. } => UNTERMINATED_CONDITIONAL,
            Self::UnexpectedDirective { .. } => UNEXPECTED_DIRECTIVE,
            Self::InvalidMacroName { .. } => INVALID_MACRO_NAME,
            Self::ExpansionDepthExceeded { .. } => EXPANSION_DEPTH_EXCEEDED,
            Self::TooManyMacros => TOO_MANY_MACROS,
            Self::ConditionalDepthExceeded => CONDITIONAL_DEPTH_EXCEEDED,
        }
    }
}
