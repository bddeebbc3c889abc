//! Character cursor shared by the preprocessor and the content lexer
//!
//! The scanner walks an immutable `Arc<str>`, optionally restricted to a
//! byte region, and keeps a full `Position` so every span it hands out has
//! line and column information. It is `Clone`, which is how callers take a
//! checkpoint and backtrack.

use super::error::ScannerError;
use crate::config::compile_time::scanner::MAX_TOKEN_LENGTH;
use crate::diagnostics::{CompileError, CompileResult, ErrorReason};
use crate::utils::{Position, Span};
use std::sync::Arc;

pub fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug, Clone)]
pub struct BaseScanner {
    file: Arc<str>,
    text: Arc<str>,
    pos: Position,
    end: usize,
}

impl BaseScanner {
    pub fn new(file: &str, text: Arc<str>) -> Self {
        let end = text.len();
        Self {
            file: Arc::from(file),
            text,
            pos: Position::start(),
            end,
        }
    }

    /// Scanner over `[start, end)` of `text`. Positions stay relative to the
    /// whole text so spans can be rendered against it directly.
    pub fn with_region(file: &str, text: Arc<str>, start: Position, end: usize) -> Self {
        let end = end.min(text.len());
        Self {
            file: Arc::from(file),
            text,
            pos: start,
            end,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn offset(&self) -> usize {
        self.pos.offset
    }

    /// Rewind (or jump) to a position previously returned by `position`
    pub fn reset_to(&mut self, pos: Position) {
        self.pos = pos;
    }

    pub fn is_end(&self) -> bool {
        self.pos.offset >= self.end
    }

    /// Unscanned text of the region
    pub fn rest(&self) -> &str {
        self.text.get(self.pos.offset..self.end).unwrap_or_default()
    }

    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.text.get(start..end).unwrap_or_default()
    }

    pub fn cur_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Character `n` places after the current one; `peek_char(0)` is `cur_char`
    pub fn peek_char(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Move forward `n` characters, stopping at the region end
    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            match self.cur_char() {
                Some(c) => self.pos = self.pos.advance(c),
                None => break,
            }
        }
    }

    pub fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.pos)
    }

    pub fn error(&self, reason: impl Into<ErrorReason>, span: Span) -> CompileError {
        CompileError::new(reason, span, &self.file, self.text.clone())
    }

    pub fn skip_space(&mut self, include_line_break: bool) {
        while let Some(c) = self.cur_char() {
            match c {
                ' ' | '\t' | '\r' => self.advance(1),
                '\n' if include_line_break => self.advance(1),
                _ => break,
            }
        }
    }

    /// Advance to the next line break without consuming it
    pub fn skip_line(&mut self) {
        while let Some(c) = self.cur_char() {
            if c == '\n' {
                break;
            }
            self.advance(1);
        }
    }

    /// Skip a `/* ... */` comment starting at the cursor
    pub fn skip_block_comment(&mut self) -> CompileResult<Span> {
        let start = self.pos;
        self.advance(2);
        loop {
            if self.starts_with("*/") {
                self.advance(2);
                return Ok(self.span_from(start));
            }
            if self.is_end() {
                return Err(self.error(ScannerError::UnterminatedComment, self.span_from(start)));
            }
            self.advance(1);
        }
    }

    /// Skip whitespace, line breaks and both comment forms until real text
    pub fn skip_comments_and_space(&mut self) -> CompileResult<()> {
        loop {
            self.skip_space(true);
            if self.starts_with("//") {
                self.skip_line();
            } else if self.starts_with("/*") {
                self.skip_block_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    fn found_text(&self) -> String {
        match self.cur_char() {
            Some(c) if is_word_char(c) => self
                .rest()
                .chars()
                .take_while(|c| is_word_char(*c))
                .collect(),
            Some(c) => c.to_string(),
            None => String::new(),
        }
    }

    /// Skip leading trivia, then require `expected` at the cursor
    pub fn scan_lexeme(&mut self, expected: &str) -> CompileResult<Span> {
        self.skip_comments_and_space()?;
        let start = self.pos;

        if self.starts_with(expected) {
            self.advance(expected.chars().count());
            return Ok(self.span_from(start));
        }

        if self.is_end() {
            let expected = format!("'{}'", expected);
            return Err(self.error(ScannerError::unexpected_end(&expected), Span::point(start)));
        }

        let found = self.found_text();
        let mut probe = self.clone();
        probe.advance(found.chars().count().max(1));
        Err(self.error(
            ScannerError::expected_lexeme(expected, &found),
            probe.span_from(start),
        ))
    }

    pub fn scan_word(&mut self) -> CompileResult<(String, Span)> {
        let start = self.pos;
        match self.cur_char() {
            Some(c) if is_word_start(c) => {}
            Some(c) => {
                let mut probe = self.clone();
                probe.advance(1);
                return Err(self.error(
                    ScannerError::UnexpectedCharacter { found: c },
                    probe.span_from(start),
                ));
            }
            None => {
                return Err(self.error(
                    ScannerError::unexpected_end("identifier"),
                    Span::point(start),
                ))
            }
        }

        while matches!(self.cur_char(), Some(c) if is_word_char(c)) {
            self.advance(1);
        }

        self.finish_token(start)
    }

    /// Decimal, float or hex literal with an optional `u`/`U`/`f`/`F` suffix
    pub fn scan_number(&mut self) -> CompileResult<(String, Span)> {
        let start = self.pos;
        let mut digits = 0usize;

        if self.starts_with("0x") || self.starts_with("0X") {
            self.advance(2);
            while matches!(self.cur_char(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance(1);
                digits += 1;
            }
        } else {
            while matches!(self.cur_char(), Some(c) if c.is_ascii_digit()) {
                self.advance(1);
                digits += 1;
            }
            if self.cur_char() == Some('.') {
                self.advance(1);
                while matches!(self.cur_char(), Some(c) if c.is_ascii_digit()) {
                    self.advance(1);
                    digits += 1;
                }
            }
            if digits > 0 && matches!(self.cur_char(), Some('e' | 'E')) {
                let signed = matches!(self.peek_char(1), Some('+' | '-'));
                let first_digit = if signed { 2 } else { 1 };
                if matches!(self.peek_char(first_digit), Some(c) if c.is_ascii_digit()) {
                    self.advance(first_digit);
                    while matches!(self.cur_char(), Some(c) if c.is_ascii_digit()) {
                        self.advance(1);
                    }
                }
            }
        }

        if digits > 0 && matches!(self.cur_char(), Some('u' | 'U' | 'f' | 'F')) {
            self.advance(1);
        }

        // Glued word characters make the whole run invalid
        let malformed = digits == 0 || matches!(self.cur_char(), Some(c) if is_word_char(c));
        if malformed {
            while matches!(self.cur_char(), Some(c) if is_word_char(c) || c == '.') {
                self.advance(1);
            }
            let span = self.span_from(start);
            let text = span.slice(&self.text).to_string();
            return Err(self.error(ScannerError::InvalidNumber { text }, span));
        }

        self.finish_token(start)
    }

    fn finish_token(&self, start: Position) -> CompileResult<(String, Span)> {
        let span = self.span_from(start);
        if span.len() > MAX_TOKEN_LENGTH {
            return Err(self.error(ScannerError::TokenTooLong { length: span.len() }, span));
        }
        Ok((span.slice(&self.text).to_string(), span))
    }

    /// Text between `left` and its matching `right`; the delimiters are
    /// consumed but not returned. With `balanced`, nested pairs are counted
    /// and strings and comments inside are skipped as units.
    pub fn scan_paired_char(
        &mut self,
        left: char,
        right: char,
        balanced: bool,
        skip_leading: bool,
    ) -> CompileResult<(String, Span)> {
        if skip_leading {
            self.skip_comments_and_space()?;
        }

        let open = self.pos;
        match self.cur_char() {
            Some(c) if c == left => self.advance(1),
            Some(_) => {
                let found = self.found_text();
                return Err(self.error(
                    ScannerError::expected_lexeme(&left.to_string(), &found),
                    Span::point(open),
                ));
            }
            None => {
                return Err(self.error(
                    ScannerError::unexpected_end(&format!("'{}'", left)),
                    Span::point(open),
                ))
            }
        }

        let inner_start = self.pos;
        let mut depth = 1usize;
        loop {
            match self.cur_char() {
                None => {
                    return Err(self.error(
                        ScannerError::UnterminatedPair { open: left, close: right },
                        Span::new(open, inner_start),
                    ))
                }
                Some(c) if c == right => {
                    depth -= 1;
                    if !balanced || depth == 0 {
                        let span = self.span_from(inner_start);
                        self.advance(1);
                        return Ok((span.slice(&self.text).to_string(), span));
                    }
                    self.advance(1);
                }
                Some(c) if balanced && c == left => {
                    depth += 1;
                    self.advance(1);
                }
                Some('"') if balanced => {
                    self.scan_string()?;
                }
                Some('/') if balanced && self.starts_with("//") => self.skip_line(),
                Some('/') if balanced && self.starts_with("/*") => {
                    self.skip_block_comment()?;
                }
                Some(_) => self.advance(1),
            }
        }
    }

    /// Double-quoted literal at the cursor. Returns the unescaped content and
    /// the span of the whole literal, quotes included.
    pub fn scan_string(&mut self) -> CompileResult<(String, Span)> {
        let start = self.pos;
        match self.cur_char() {
            Some('"') => self.advance(1),
            Some(_) => {
                let found = self.found_text();
                return Err(self.error(
                    ScannerError::expected_lexeme("\"", &found),
                    Span::point(start),
                ));
            }
            None => {
                return Err(self.error(
                    ScannerError::unexpected_end("string literal"),
                    Span::point(start),
                ))
            }
        }

        let mut content = String::new();
        loop {
            match self.cur_char() {
                None | Some('\n') => {
                    return Err(self.error(ScannerError::UnterminatedString, self.span_from(start)))
                }
                Some('"') => {
                    self.advance(1);
                    return Ok((content, self.span_from(start)));
                }
                Some('\\') => {
                    self.advance(1);
                    match self.cur_char() {
                        Some('n') => content.push('\n'),
                        Some('t') => content.push('\t'),
                        Some(c) => content.push(c),
                        None => continue,
                    }
                    self.advance(1);
                }
                Some(c) => {
                    content.push(c);
                    self.advance(1);
                }
            }
        }
    }
}
