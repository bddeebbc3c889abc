//! On-demand lexer for the structural content language
//!
//! Produces `ShaderToken`s from the preprocessed text with one token of
//! lookahead. Cloning the lexer is a checkpoint.

use super::error::ScannerError;
use super::scanner::{is_word_start, BaseScanner};
use crate::diagnostics::{CompileError, CompileResult, ErrorReason};
use crate::grammar::{EngineEnumType, Keyword};
use crate::tokens::{ShaderToken, ShaderTokenKind};
use crate::utils::Span;
use std::sync::Arc;

const PUNCTUATION: &[char] = &['{', '}', '(', ')', '[', ']', ';', ',', '=', '.', '-'];

#[derive(Debug, Clone)]
pub struct ShaderLexer {
    scanner: BaseScanner,
    peeked: Option<ShaderToken>,
}

impl ShaderLexer {
    pub fn new(file: &str, text: Arc<str>) -> Self {
        Self {
            scanner: BaseScanner::new(file, text),
            peeked: None,
        }
    }

    pub fn file(&self) -> &str {
        self.scanner.file()
    }

    pub fn text(&self) -> &Arc<str> {
        self.scanner.text()
    }

    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.scanner.slice(start, end)
    }

    pub fn error(&self, reason: impl Into<ErrorReason>, span: Span) -> CompileError {
        self.scanner.error(reason, span)
    }

    pub fn peek(&mut self) -> CompileResult<&ShaderToken> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    pub fn next_token(&mut self) -> CompileResult<ShaderToken> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan_token(),
        }
    }

    /// Consume the next token if it is the punctuation `c`
    pub fn eat_punct(&mut self, c: char) -> CompileResult<bool> {
        if self.peek()?.kind.is_punct(c) {
            self.next_token()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Require the punctuation `c` next
    pub fn expect_punct(&mut self, c: char) -> CompileResult<Span> {
        let token = self.next_token()?;
        if token.kind.is_punct(c) {
            return Ok(token.span);
        }
        Err(self.error(
            ScannerError::expected_lexeme(&c.to_string(), &token.kind.to_string()),
            token.span,
        ))
    }

    /// Consume the rest of the current line, starting at the next token
    pub fn take_line(&mut self) -> CompileResult<Span> {
        let start = match self.peeked.take() {
            Some(token) => token.span.start,
            None => {
                self.scanner.skip_comments_and_space()?;
                self.scanner.position()
            }
        };
        self.scanner.reset_to(start);
        self.scanner.skip_line();
        Ok(self.scanner.span_from(start))
    }

    fn scan_token(&mut self) -> CompileResult<ShaderToken> {
        self.scanner.skip_comments_and_space()?;
        let start = self.scanner.position();

        let Some(c) = self.scanner.cur_char() else {
            return Ok(ShaderToken::new(ShaderTokenKind::Eof, Span::point(start)));
        };

        if is_word_start(c) {
            let (word, span) = self.scanner.scan_word()?;
            let kind = match Keyword::from_str(&word) {
                Some(Keyword::True) => ShaderTokenKind::Boolean(true),
                Some(Keyword::False) => ShaderTokenKind::Boolean(false),
                Some(kw) => ShaderTokenKind::Keyword(kw),
                None => match EngineEnumType::from_str(&word) {
                    Some(ty) => ShaderTokenKind::EngineEnum(ty),
                    None => ShaderTokenKind::Identifier(word),
                },
            };
            return Ok(ShaderToken::new(kind, span));
        }

        let starts_number = c.is_ascii_digit()
            || (c == '.' && matches!(self.scanner.peek_char(1), Some(d) if d.is_ascii_digit()));
        if starts_number {
            let (text, span) = self.scanner.scan_number()?;
            let value = parse_number(&text)
                .ok_or_else(|| self.error(ScannerError::InvalidNumber { text }, span))?;
            return Ok(ShaderToken::new(ShaderTokenKind::Number(value), span));
        }

        if c == '"' {
            let (content, span) = self.scanner.scan_string()?;
            return Ok(ShaderToken::new(ShaderTokenKind::StringLiteral(content), span));
        }

        self.scanner.advance(1);
        let span = self.scanner.span_from(start);
        let kind = if PUNCTUATION.contains(&c) {
            ShaderTokenKind::Punct(c)
        } else {
            ShaderTokenKind::Other(c)
        };
        Ok(ShaderToken::new(kind, span))
    }
}

fn parse_number(text: &str) -> Option<f64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let digits = hex.trim_end_matches(&['u', 'U'][..]);
        return i64::from_str_radix(digits, 16).ok().map(|v| v as f64);
    }
    text.trim_end_matches(&['u', 'U', 'f', 'F'][..]).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<ShaderTokenKind> {
        let mut lexer = ShaderLexer::new("t.shader", Arc::from(text));
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token.is_eof() {
                return out;
            }
            out.push(token.kind);
        }
    }

    #[test]
    fn test_keywords_enums_and_literals() {
        assert_eq!(
            kinds("Pass \"P\" { CullMode.Back; true 0.5 }"),
            vec![
                ShaderTokenKind::Keyword(Keyword::Pass),
                ShaderTokenKind::StringLiteral("P".to_string()),
                ShaderTokenKind::Punct('{'),
                ShaderTokenKind::EngineEnum(EngineEnumType::CullMode),
                ShaderTokenKind::Punct('.'),
                ShaderTokenKind::Identifier("Back".to_string()),
                ShaderTokenKind::Punct(';'),
                ShaderTokenKind::Boolean(true),
                ShaderTokenKind::Number(0.5),
                ShaderTokenKind::Punct('}'),
            ]
        );
    }

    #[test]
    fn test_render_queue_type_is_keyword() {
        assert_eq!(
            kinds("RenderQueueType"),
            vec![ShaderTokenKind::Keyword(Keyword::RenderQueueType)]
        );
    }

    #[test]
    fn test_glsl_operators_are_other() {
        assert_eq!(
            kinds("a*2u"),
            vec![
                ShaderTokenKind::Identifier("a".to_string()),
                ShaderTokenKind::Other('*'),
                ShaderTokenKind::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = ShaderLexer::new("t", Arc::from("{ }"));
        assert!(lexer.peek().unwrap().kind.is_punct('{'));
        assert!(lexer.eat_punct('{').unwrap());
        assert!(!lexer.eat_punct('{').unwrap());
        assert!(lexer.expect_punct('}').is_ok());
        assert!(lexer.peek().unwrap().is_eof());
    }

    #[test]
    fn test_checkpoint_restore_by_clone() {
        let mut lexer = ShaderLexer::new("t", Arc::from("BlendState name"));
        let checkpoint = lexer.clone();
        lexer.next_token().unwrap();
        lexer = checkpoint;
        assert!(lexer.peek().unwrap().kind.is_keyword(Keyword::BlendState));
    }

    #[test]
    fn test_take_line() {
        let mut lexer = ShaderLexer::new("t", Arc::from("  #version 300 es\nvoid"));
        lexer.peek().unwrap();
        let span = lexer.take_line().unwrap();
        assert_eq!(span.slice(lexer.text()), "#version 300 es");
        assert_eq!(
            lexer.next_token().unwrap().kind,
            ShaderTokenKind::Identifier("void".to_string())
        );
    }
}
