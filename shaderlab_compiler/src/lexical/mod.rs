//! Character-level scanning
//!
//! [`BaseScanner`] holds the cursor primitives every lexer in the crate is
//! built on; [`ShaderLexer`] turns preprocessed text into structural tokens.

pub mod error;
pub mod scanner;
pub mod shader_lexer;

use crate::config::compile_time::scanner::MAX_SOURCE_SIZE;
use crate::diagnostics::{CompileError, CompileResult};
use crate::utils::{Position, Span};
use std::sync::Arc;

pub use error::ScannerError;
pub use scanner::{is_word_char, is_word_start, BaseScanner};
pub use shader_lexer::ShaderLexer;

/// Reject texts over the scanner's size limit before any scanning starts
pub fn check_source_size(file: &str, text: &Arc<str>) -> CompileResult<()> {
    if text.len() > MAX_SOURCE_SIZE {
        return Err(CompileError::new(
            ScannerError::SourceTooLarge { size: text.len() },
            Span::point(Position::start()),
            file,
            text.clone(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::diagnostics::ErrorReason;

    #[test]
    fn test_check_source_size() {
        let fits: Arc<str> = Arc::from("Shader \"S\" {}");
        assert!(check_source_size("s.shader", &fits).is_ok());

        let oversized: Arc<str> = Arc::from(" ".repeat(MAX_SOURCE_SIZE + 1));
        let err = check_source_size("big.shader", &oversized).unwrap_err();
        assert_eq!(err.file, "big.shader");
        assert_matches!(
            err.reason,
            ErrorReason::Scanner(ScannerError::SourceTooLarge { size }) if size == MAX_SOURCE_SIZE + 1
        );
    }
}
