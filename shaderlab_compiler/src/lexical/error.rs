//! Character-level scanner errors

use crate::config::compile_time::scanner::{MAX_SOURCE_SIZE, MAX_TOKEN_LENGTH};
use crate::logging::codes;

/// Any unmet expectation of the base scanner. Always fatal for the
/// surrounding call; the location lives on the wrapping `CompileError`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScannerError {
    #[error("Unexpected character '{found}'")]
    UnexpectedCharacter { found: char },

    #[error("Expected '{expected}', found '{found}'")]
    ExpectedLexeme { expected: String, found: String },

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Unterminated '{open}': missing closing '{close}'")]
    UnterminatedPair { open: char, close: char },

    #[error("Unterminated block comment")]
    UnterminatedComment,

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("Invalid number literal '{text}'")]
    InvalidNumber { text: String },

    #[error("Token too long: {length} bytes (max {MAX_TOKEN_LENGTH})")]
    TokenTooLong { length: usize },

    #[error("Source too large: {size} bytes (max {MAX_SOURCE_SIZE})")]
    SourceTooLarge { size: usize },
}

impl ScannerError {
    pub fn expected_lexeme(expected: &str, found: &str) -> Self {
        Self::ExpectedLexeme {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn unexpected_end(expected: &str) -> Self {
        Self::UnexpectedEnd {
            expected: expected.to_string(),
        }
    }

    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::UnexpectedCharacter { .. } => codes::scanner::UNEXPECTED_CHARACTER,
            Self::ExpectedLexeme { .. } => codes::scanner::EXPECTED_LEXEME,
            Self::UnterminatedString => codes::scanner::UNTERMINATED_STRING,
            Self::UnterminatedPair { .. } => codes::scanner::UNTERMINATED_PAIR,
            Self::UnterminatedComment => codes::scanner::UNTERMINATED_COMMENT,
            Self::UnexpectedEnd { .. } => codes::scanner::UNEXPECTED_END,
            Self::InvalidNumber { .. } => codes::scanner::INVALID_NUMBER,
            Self::TokenTooLong { .. } => codes::scanner::TOKEN_TOO_LONG,
            Self::SourceTooLarge { .. } => codes::scanner::SOURCE_TOO_LARGE,
        }
    }
}
