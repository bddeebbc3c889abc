//! Directive loop
//!
//! An engine processes one region of one text: the whole main file, an
//! included chunk, or the selected branch of a conditional. Every rewrite
//! becomes a segment on the context's segment stack; when the region is
//! done the segments are assembled into the region's output and map.
//! Conditional branches and includes run as nested regions, so their maps
//! nest the same way.

use super::error::PreprocessorError;
use super::expander::{split_args, strip_comments, Expander};
use super::expression::ExpressionEvaluator;
use super::macros::{is_reserved, MacroDefine};
use super::segments::{assemble, ExpandSegment};
use super::IncludeMap;
use crate::config::compile_time::preprocessor::{
    MAX_CONDITIONAL_DEPTH, MAX_INCLUDE_DEPTH, MAX_MACRO_COUNT,
};
use crate::config::runtime::PreprocessorPreferences;
use crate::context::{CachedInclude, CompilerContext};
use crate::diagnostics::{BlockInfo, CompileResult, OffsetRange, SourceMap};
use crate::lexical::{check_source_size, is_word_char, is_word_start, BaseScanner};
use crate::logging::codes;
use crate::tokens::DirectiveKind;
use crate::utils::{Position, Span};
use crate::{log_debug, log_success, log_warning};
use std::collections::HashSet;
use std::sync::Arc;

/// One `#if`/`#elif`/`#else` arm and the body it guards
#[derive(Debug)]
struct Branch {
    kind: DirectiveKind,
    /// Expression or macro name, with its span
    condition: Option<(String, Span)>,
    body_start: Position,
    body_end: usize,
}

pub(crate) struct Engine<'a> {
    ctx: &'a mut CompilerContext,
    includes: &'a IncludeMap,
    prefs: &'a PreprocessorPreferences,
    file: String,
    text: Arc<str>,
    include_depth: usize,
    conditional_depth: usize,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(
        ctx: &'a mut CompilerContext,
        includes: &'a IncludeMap,
        prefs: &'a PreprocessorPreferences,
        file: &str,
        text: Arc<str>,
    ) -> Self {
        Self {
            ctx,
            includes,
            prefs,
            file: file.to_string(),
            text,
            include_depth: 0,
            conditional_depth: 0,
        }
    }

    /// Process the whole text
    pub(crate) fn run(&mut self) -> CompileResult<(String, SourceMap)> {
        let end = self.text.len();
        self.process_region(Position::start(), end)
    }

    fn process_region(&mut self, start: Position, end: usize) -> CompileResult<(String, SourceMap)> {
        let mut scanner = BaseScanner::with_region(&self.file, self.text.clone(), start, end);

        self.ctx.segments.push_level();
        let scanned = self.scan_region(&mut scanner);
        let segments = self.ctx.segments.pop_level();
        scanned?;

        Ok(assemble(&self.text, &self.file, start.offset, end, segments))
    }

    fn scan_region(&mut self, scanner: &mut BaseScanner) -> CompileResult<()> {
        let mut line_start = true;
        // Reserved-name conditionals left for the GLSL compiler
        let mut passthrough: Vec<(DirectiveKind, Span)> = Vec::new();

        while let Some(c) = scanner.cur_char() {
            match c {
                '\n' => {
                    scanner.advance(1);
                    line_start = true;
                }
                ' ' | '\t' | '\r' => scanner.advance(1),
                '#' if line_start => {
                    self.directive(scanner, &mut passthrough)?;
                    line_start = false;
                }
                '/' if scanner.starts_with("//") => {
                    let start = scanner.position();
                    scanner.skip_line();
                    self.push_rewrite(start.offset, scanner.offset(), "");
                }
                '/' if scanner.starts_with("/*") => {
                    let span = scanner.skip_block_comment()?;
                    self.push_rewrite(span.start.offset, span.end.offset, " ");
                }
                '"' => {
                    scanner.scan_string()?;
                    line_start = false;
                }
                c if c.is_ascii_digit() => {
                    while matches!(scanner.cur_char(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '.') {
                        scanner.advance(1);
                    }
                    line_start = false;
                }
                c if is_word_start(c) => {
                    self.identifier(scanner)?;
                    line_start = false;
                }
                _ => {
                    scanner.advance(1);
                    line_start = false;
                }
            }
        }

        match passthrough.first() {
            Some((kind, open)) => Err(scanner.error(
                PreprocessorError::UnterminatedConditional {
                    directive: kind.to_string(),
                },
                *open,
            )),
            None => Ok(()),
        }
    }

    fn push_rewrite(&mut self, start: usize, end: usize, replacement: &str) {
        self.ctx
            .segments
            .push_segment(ExpandSegment::new(OffsetRange::new(start, end), replacement, None));
    }

    fn identifier(&mut self, scanner: &mut BaseScanner) -> CompileResult<()> {
        let (name, span) = scanner.scan_word()?;
        let function_like = match self.ctx.macros.get(&name) {
            Some(define) => define.is_function_like(),
            None => return Ok(()),
        };

        let args = if function_like {
            let mut lookahead = scanner.clone();
            lookahead.skip_space(true);
            if lookahead.cur_char() != Some('(') {
                return Ok(());
            }
            let (inner, _) = lookahead.scan_paired_char('(', ')', true, false)?;
            *scanner = lookahead;
            Some(split_args(&strip_comments(&inner)))
        } else {
            None
        };

        let expander = Expander::new(&self.ctx.macros, &self.ctx.tokens);
        let mut expanded = expander
            .expand_invocation(&name, args)
            .map_err(|e| scanner.error(e, scanner.span_from(span.start)))?;

        // An expansion ending in a function-like macro name takes its
        // argument list from the text that follows the invocation
        let mut called = HashSet::from([name]);
        while let Some(tail) = expander.trailing_function_macro(&expanded) {
            let callee = expanded[tail..].to_string();
            if !called.insert(callee.clone()) {
                break;
            }
            let mut lookahead = scanner.clone();
            lookahead.skip_space(true);
            if lookahead.cur_char() != Some('(') {
                break;
            }
            let (inner, _) = lookahead.scan_paired_char('(', ')', true, false)?;
            *scanner = lookahead;
            let call = expander
                .expand_invocation(&callee, Some(split_args(&strip_comments(&inner))))
                .map_err(|e| scanner.error(e, scanner.span_from(span.start)))?;
            expanded.truncate(tail);
            expanded.push_str(&call);
        }

        let range = OffsetRange::new(span.start.offset, scanner.offset());

        self.ctx.segments.push_segment(ExpandSegment::new(
            range,
            expanded,
            Some(BlockInfo::Literal {
                source_file: self.file.clone(),
                range,
            }),
        ));
        Ok(())
    }

    fn directive(
        &mut self,
        scanner: &mut BaseScanner,
        passthrough: &mut Vec<(DirectiveKind, Span)>,
    ) -> CompileResult<()> {
        let start = scanner.position();
        scanner.advance(1);
        scanner.skip_space(false);

        let name = match scanner.cur_char() {
            Some(c) if is_word_start(c) => scanner.scan_word()?.0,
            _ => String::new(),
        };
        let kind = DirectiveKind::from_name(&name);

        match kind {
            DirectiveKind::Define => self.define(scanner, start),
            DirectiveKind::Undef => self.undef(scanner, start),
            DirectiveKind::Include => self.include(scanner, start),
            DirectiveKind::If | DirectiveKind::Ifdef | DirectiveKind::Ifndef => {
                self.conditional(scanner, start, kind, passthrough)
            }
            DirectiveKind::Else | DirectiveKind::Elif | DirectiveKind::Endif => {
                if passthrough.is_empty() {
                    return Err(scanner.error(
                        PreprocessorError::unexpected(&kind.to_string(), "no matching #if"),
                        scanner.span_from(start),
                    ));
                }
                if kind == DirectiveKind::Endif {
                    passthrough.pop();
                }
                scanner.skip_line();
                Ok(())
            }
            // #version, #extension, #pragma and friends stay for the GLSL compiler
            DirectiveKind::Other(_) => {
                scanner.skip_line();
                Ok(())
            }
        }
    }

    fn directive_name(&self, scanner: &mut BaseScanner, kind: DirectiveKind) -> CompileResult<(String, Span)> {
        scanner.skip_space(false);
        match scanner.cur_char() {
            Some(c) if is_word_start(c) => scanner.scan_word(),
            _ => Err(scanner.error(
                PreprocessorError::InvalidMacroName {
                    directive: kind.to_string(),
                },
                Span::point(scanner.position()),
            )),
        }
    }

    fn define(&mut self, scanner: &mut BaseScanner, start: Position) -> CompileResult<()> {
        let (name, name_span) = self.directive_name(scanner, DirectiveKind::Define)?;
        if is_reserved(&name) {
            return Err(scanner.error(
                PreprocessorError::ReservedMacroRedefinition { name },
                name_span,
            ));
        }

        // Function-like only when '(' follows the name directly
        let params = if scanner.cur_char() == Some('(') {
            let (inner, inner_span) = scanner.scan_paired_char('(', ')', false, false)?;
            Some(self.parse_params(scanner, &inner, inner_span)?)
        } else {
            None
        };

        let (body, body_span) = self.define_body(scanner)?;

        let redefined = self.ctx.macros.is_defined(&name);
        if !redefined && self.ctx.macros.len() >= MAX_MACRO_COUNT {
            return Err(scanner.error(PreprocessorError::TooManyMacros, name_span));
        }

        let location = scanner.span_from(start);
        let tokens = &mut self.ctx.tokens;
        let mut define = MacroDefine::new(tokens, &name, name_span, location, &self.file);
        if let Some(params) = &params {
            define = define.with_params(tokens, params);
        }
        define = define.with_body(tokens, &body, body_span);
        self.ctx.macros.insert(&name, define);

        if redefined && self.prefs.log_macro_redefinitions {
            self.ctx.note_warning();
            log_warning!(code = codes::preprocessor::MACRO_REDEFINED, "Macro redefined",
                "name" => name,
                "file" => self.file,
                "line" => name_span.start.line
            );
        } else {
            log_debug!("Macro defined", "name" => name, "file" => self.file);
        }

        self.push_rewrite(start.offset, scanner.offset(), "");
        Ok(())
    }

    fn parse_params(
        &self,
        scanner: &BaseScanner,
        inner: &str,
        inner_span: Span,
    ) -> CompileResult<Vec<(String, Span)>> {
        if inner.trim().is_empty() {
            return Ok(Vec::new());
        }
        inner
            .split(',')
            .map(str::trim)
            .map(|param| {
                let valid = param.chars().next().is_some_and(is_word_start)
                    && param.chars().all(is_word_char);
                if valid {
                    Ok((param.to_string(), inner_span))
                } else {
                    Err(scanner.error(
                        PreprocessorError::unexpected("#define", "invalid parameter list"),
                        inner_span,
                    ))
                }
            })
            .collect()
    }

    /// Rest of the logical line. Block comments are skipped, a line
    /// comment ends the body and a trailing backslash joins the next line.
    fn define_body(&self, scanner: &mut BaseScanner) -> CompileResult<(String, Span)> {
        scanner.skip_space(false);
        let start = scanner.position();
        let mut body = String::new();

        loop {
            match scanner.cur_char() {
                None | Some('\n') => break,
                Some('\\') if matches!(scanner.peek_char(1), Some('\n')) => {
                    scanner.advance(2);
                    body.push(' ');
                }
                Some('\\') if scanner.rest().starts_with("\\\r\n") => {
                    scanner.advance(3);
                    body.push(' ');
                }
                Some('/') if scanner.starts_with("//") => {
                    scanner.skip_line();
                    break;
                }
                Some('/') if scanner.starts_with("/*") => {
                    scanner.skip_block_comment()?;
                    body.push(' ');
                }
                Some('"') => {
                    let (_, span) = scanner.scan_string()?;
                    body.push_str(span.slice(scanner.text()));
                }
                Some(c) => {
                    body.push(c);
                    scanner.advance(1);
                }
            }
        }

        Ok((body.trim().to_string(), scanner.span_from(start)))
    }

    fn undef(&mut self, scanner: &mut BaseScanner, start: Position) -> CompileResult<()> {
        let (name, _) = self.directive_name(scanner, DirectiveKind::Undef)?;
        scanner.skip_line();
        if self.ctx.macros.remove(&name).is_some() {
            log_debug!("Macro undefined", "name" => name);
        }
        self.push_rewrite(start.offset, scanner.offset(), "");
        Ok(())
    }

    fn include(&mut self, scanner: &mut BaseScanner, start: Position) -> CompileResult<()> {
        scanner.skip_space(false);
        let (name, name_span) = match scanner.cur_char() {
            Some('"') => scanner.scan_string()?,
            Some('<') => scanner.scan_paired_char('<', '>', false, false)?,
            _ => {
                return Err(scanner.error(
                    PreprocessorError::unexpected("#include", "expected \"name\" or <name>"),
                    scanner.span_from(start),
                ))
            }
        };
        scanner.skip_line();

        let (text, map) = self
            .include_chunk(&name)
            .map_err(|e| scanner.error(e, name_span))
            .and_then(|result| result)?;

        self.ctx.segments.push_segment(ExpandSegment::new(
            OffsetRange::new(start.offset, scanner.offset()),
            text,
            Some(BlockInfo::Nested(Box::new(map))),
        ));
        Ok(())
    }

    /// Outer error: the include itself is not allowed. Inner error: the
    /// chunk failed to preprocess and is already located in that chunk.
    fn include_chunk(
        &mut self,
        name: &str,
    ) -> Result<CompileResult<(String, SourceMap)>, PreprocessorError> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(PreprocessorError::IncludeDepthExceeded {
                name: name.to_string(),
            });
        }
        if self.ctx.include_stack.iter().any(|open| open == name) {
            let mut chain = self.ctx.include_stack.clone();
            chain.push(name.to_string());
            return Err(PreprocessorError::RecursiveInclude {
                name: name.to_string(),
                chain: chain.join(" -> "),
            });
        }

        if let Some(cached) = self.ctx.include_cache.get(name).cloned() {
            if self.prefs.warn_on_repeated_include {
                self.ctx.note_warning();
                log_warning!(code = codes::preprocessor::REPEATED_INCLUDE, "Chunk included more than once",
                    "include" => name,
                    "file" => self.file
                );
            }
            return Ok(Ok((cached.text, cached.source_map)));
        }

        let source = self
            .includes
            .get(name)
            .ok_or_else(|| PreprocessorError::MissingInclude {
                name: name.to_string(),
            })?;
        let text: Arc<str> = Arc::from(source.as_str());
        if let Err(e) = check_source_size(name, &text) {
            return Ok(Err(e));
        }
        self.ctx.sources.insert(name.to_string(), text.clone());

        self.ctx.include_stack.push(name.to_string());
        let include_depth = self.include_depth + 1;
        let conditional_depth = self.conditional_depth;
        let result = {
            let mut nested = Engine::new(&mut *self.ctx, self.includes, self.prefs, name, text);
            nested.include_depth = include_depth;
            nested.conditional_depth = conditional_depth;
            nested.run()
        };
        self.ctx.include_stack.pop();

        if let Ok((expanded, map)) = &result {
            self.ctx.include_cache.insert(
                name.to_string(),
                CachedInclude {
                    text: expanded.clone(),
                    source_map: map.clone(),
                },
            );
            log_success!(codes::success::INCLUDE_RESOLVED, "Include resolved",
                "include" => name,
                "bytes" => expanded.len()
            );
        }
        Ok(result)
    }

    fn conditional(
        &mut self,
        scanner: &mut BaseScanner,
        start: Position,
        kind: DirectiveKind,
        passthrough: &mut Vec<(DirectiveKind, Span)>,
    ) -> CompileResult<()> {
        let condition = if kind == DirectiveKind::If {
            scanner.skip_space(false);
            let expr_start = scanner.position();
            scanner.skip_line();
            let span = scanner.span_from(expr_start);
            (span.slice(scanner.text()).to_string(), span)
        } else {
            let (name, span) = self.directive_name(scanner, kind.clone())?;
            scanner.skip_line();
            if is_reserved(&name) && !self.ctx.macros.is_defined(&name) {
                // Driver extension macro: keep the whole construct for the GLSL compiler
                passthrough.push((kind, scanner.span_from(start)));
                return Ok(());
            }
            (name, span)
        };

        if self.conditional_depth >= MAX_CONDITIONAL_DEPTH {
            return Err(scanner.error(
                PreprocessorError::ConditionalDepthExceeded,
                scanner.span_from(start),
            ));
        }

        let open_span = scanner.span_from(start);
        let branches = self.scan_branches(scanner, kind, condition, open_span)?;
        let end = scanner.offset();

        let mut selected = None;
        for branch in &branches {
            if self.branch_taken(scanner, branch)? {
                selected = Some(branch);
                break;
            }
        }

        let block = match selected {
            Some(branch) => {
                self.conditional_depth += 1;
                let result = self.process_region(branch.body_start, branch.body_end);
                self.conditional_depth -= 1;
                let (text, map) = result?;
                Some((text, BlockInfo::Nested(Box::new(map))))
            }
            None => None,
        };

        let range = OffsetRange::new(start.offset, end);
        let segment = match block {
            Some((text, block)) => ExpandSegment::new(range, text, Some(block)),
            None => ExpandSegment::new(range, "", None),
        };
        self.ctx.segments.push_segment(segment);
        Ok(())
    }

    fn branch_taken(&self, scanner: &BaseScanner, branch: &Branch) -> CompileResult<bool> {
        let Some((condition, span)) = &branch.condition else {
            return Ok(true);
        };
        match branch.kind {
            DirectiveKind::Ifdef => Ok(self.ctx.macros.is_defined(condition)),
            DirectiveKind::Ifndef => Ok(!self.ctx.macros.is_defined(condition)),
            _ => ExpressionEvaluator::new(&self.ctx.macros, &self.ctx.tokens)
                .is_true(condition)
                .map_err(|e| scanner.error(e, *span)),
        }
    }

    /// Split the block that starts at the current line break into branches,
    /// stopping after the matching `#endif` line.
    fn scan_branches(
        &self,
        scanner: &mut BaseScanner,
        kind: DirectiveKind,
        condition: (String, Span),
        open_span: Span,
    ) -> CompileResult<Vec<Branch>> {
        let opening = kind.to_string();
        let mut branches = Vec::new();
        let mut current = Branch {
            kind,
            condition: Some(condition),
            body_start: next_line(scanner),
            body_end: 0,
        };
        let mut nesting = 0usize;
        let mut seen_else = false;

        loop {
            if scanner.is_end() {
                return Err(scanner.error(
                    PreprocessorError::UnterminatedConditional { directive: opening },
                    open_span,
                ));
            }

            let line = scanner.position();
            scanner.skip_space(false);
            if scanner.cur_char() != Some('#') {
                skip_rest_of_line(scanner)?;
                next_line(scanner);
                continue;
            }

            let directive_start = scanner.position();
            scanner.advance(1);
            scanner.skip_space(false);
            let name = match scanner.cur_char() {
                Some(c) if is_word_start(c) => scanner.scan_word()?.0,
                _ => String::new(),
            };
            let found = DirectiveKind::from_name(&name);

            if found.opens_conditional() {
                nesting += 1;
            } else if nesting > 0 {
                if found == DirectiveKind::Endif {
                    nesting -= 1;
                }
            } else {
                match found {
                    DirectiveKind::Endif => {
                        current.body_end = line.offset;
                        branches.push(current);
                        scanner.skip_line();
                        return Ok(branches);
                    }
                    DirectiveKind::Else | DirectiveKind::Elif => {
                        if seen_else {
                            return Err(scanner.error(
                                PreprocessorError::unexpected(&found.to_string(), "after #else"),
                                scanner.span_from(directive_start),
                            ));
                        }
                        seen_else = found == DirectiveKind::Else;

                        scanner.skip_space(false);
                        let condition_start = scanner.position();
                        scanner.skip_line();
                        let condition = if found == DirectiveKind::Elif {
                            let span = scanner.span_from(condition_start);
                            Some((span.slice(scanner.text()).to_string(), span))
                        } else {
                            None
                        };

                        current.body_end = line.offset;
                        branches.push(current);
                        current = Branch {
                            kind: found,
                            condition,
                            body_start: next_line(scanner),
                            body_end: 0,
                        };
                        continue;
                    }
                    _ => {}
                }
            }

            skip_rest_of_line(scanner)?;
            next_line(scanner);
        }
    }
}

/// Step over the line break at the cursor, if any, and return the position
fn next_line(scanner: &mut BaseScanner) -> Position {
    if scanner.cur_char() == Some('\n') {
        scanner.advance(1);
    }
    scanner.position()
}

/// Skip to the end of the line; block comments may carry it over line breaks
fn skip_rest_of_line(scanner: &mut BaseScanner) -> CompileResult<()> {
    while let Some(c) = scanner.cur_char() {
        match c {
            '\n' => break,
            '/' if scanner.starts_with("//") => scanner.skip_line(),
            '/' if scanner.starts_with("/*") => {
                scanner.skip_block_comment()?;
            }
            _ => scanner.advance(1),
        }
    }
    Ok(())
}
