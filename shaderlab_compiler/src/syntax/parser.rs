//! Structural content parser
//!
//! Recursive descent over the preprocessed text. `Shader`, `SubShader` and
//! `Pass` bodies share one statement loop; statements the parser does not
//! recognize are captured verbatim as opaque GLSL text.

use super::error::CompilationError;
use crate::config::runtime::ContentPreferences;
use crate::context::CompilerContext;
use crate::diagnostics::{CompileError, CompileResult};
use crate::grammar::{
    EngineEnumType, Keyword, RenderStateType, RenderStates, ShaderPassSource, ShaderSource, SubShaderSource,
    TagValue, Tags, ValueKind,
};
use crate::lexical::ShaderLexer;
use crate::symbols::{Symbol, SymbolKind, SymbolValue};
use crate::tokens::{ShaderToken, ShaderTokenKind};
use crate::utils::Span;
use crate::{log_debug, log_warning};
use std::fmt;

/// Which body the statement loop is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Shader,
    SubShader,
    Pass,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shader => f.write_str("Shader"),
            Self::SubShader => f.write_str("SubShader"),
            Self::Pass => f.write_str("Pass"),
        }
    }
}

/// Everything one body can contribute to its node
#[derive(Debug, Default)]
pub(crate) struct NodeBody {
    pub pending_contents: Vec<String>,
    pub render_states: RenderStates,
    pub tags: Tags,
    pub sub_shaders: Vec<SubShaderSource>,
    pub passes: Vec<ShaderPassSource>,
    pub vertex_entry: Option<String>,
    pub fragment_entry: Option<String>,
}

/// Identifier-like text of a token: identifiers, keywords and enum
/// namespaces all qualify where a name is expected
pub(crate) fn token_word(kind: &ShaderTokenKind) -> Option<String> {
    match kind {
        ShaderTokenKind::Identifier(name) => Some(name.clone()),
        ShaderTokenKind::Keyword(kw) => Some(kw.as_str().to_string()),
        ShaderTokenKind::EngineEnum(ty) => Some(ty.as_str().to_string()),
        _ => None,
    }
}

pub struct ContentParser<'a> {
    pub(crate) lexer: ShaderLexer,
    pub(crate) ctx: &'a mut CompilerContext,
    pub(crate) prefs: &'a ContentPreferences,
    context_stack: Vec<String>,
}

impl<'a> ContentParser<'a> {
    pub fn new(ctx: &'a mut CompilerContext, prefs: &'a ContentPreferences, lexer: ShaderLexer) -> Self {
        Self {
            lexer,
            ctx,
            prefs,
            context_stack: Vec::new(),
        }
    }

    /// `Shader "<name>" { ... }` followed by end of input
    pub fn parse_shader(&mut self) -> CompileResult<ShaderSource> {
        let token = self.lexer.next_token()?;
        if !token.kind.is_keyword(Keyword::Shader) {
            return Err(self.unexpected("'Shader'", &token));
        }
        let name = self.expect_string()?;
        self.lexer.expect_punct('{')?;

        let label = format!("Shader \"{}\"", name);
        let body = self.with_scope(&label, |p| p.parse_body(Scope::Shader))?;

        let trailing = self.lexer.next_token()?;
        if !trailing.is_eof() {
            return Err(self.unexpected("end of input", &trailing));
        }

        Ok(ShaderSource {
            name,
            sub_shaders: body.sub_shaders,
            pending_contents: body.pending_contents,
            render_states: body.render_states,
        })
    }

    /// Push a symbol scope around `f`; the scope is popped on every exit path
    pub(crate) fn with_scope<T>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        self.ctx.symbols.push_scope();
        self.context_stack.push(label.to_string());
        if self.prefs.log_symbol_events {
            log_debug!("Entering scope", "scope" => label, "depth" => self.ctx.symbols.depth());
        }

        let result = f(self);

        self.context_stack.pop();
        self.ctx.symbols.pop_scope();
        if self.prefs.log_symbol_events {
            log_debug!("Leaving scope", "scope" => label, "ok" => result.is_ok());
        }
        result
    }

    pub(crate) fn current_context(&self) -> &str {
        self.context_stack.last().map(String::as_str).unwrap_or("<top level>")
    }

    /// Statements up to and including the body's closing `}`
    fn parse_body(&mut self, scope: Scope) -> CompileResult<NodeBody> {
        let mut body = NodeBody::default();

        loop {
            let token = self.lexer.peek()?.clone();
            match &token.kind {
                ShaderTokenKind::Punct('}') => {
                    self.lexer.next_token()?;
                    return Ok(body);
                }
                ShaderTokenKind::Eof => return Err(self.unexpected("'}'", &token)),
                ShaderTokenKind::Keyword(kw) => self.parse_keyword_statement(*kw, &token, scope, &mut body)?,
                ShaderTokenKind::EngineEnum(ty) => {
                    if !self.try_enum_variable(*ty)? {
                        self.parse_opaque(&mut body)?;
                    }
                }
                ShaderTokenKind::Other('#') => {
                    let span = self.lexer.take_line()?;
                    body.pending_contents
                        .push(span.slice(self.lexer.text()).to_string());
                }
                _ => self.parse_opaque(&mut body)?,
            }
        }
    }

    fn parse_keyword_statement(
        &mut self,
        kw: Keyword,
        token: &ShaderToken,
        scope: Scope,
        body: &mut NodeBody,
    ) -> CompileResult<()> {
        match kw {
            Keyword::SubShader if scope == Scope::Shader => {
                let sub_shader = self.parse_sub_shader()?;
                body.sub_shaders.push(sub_shader);
            }
            Keyword::Pass if scope == Scope::SubShader => {
                let pass = self.parse_pass()?;
                body.passes.push(pass);
            }
            Keyword::UsePass if scope == Scope::SubShader => {
                self.lexer.next_token()?;
                let path = self.expect_string()?;
                self.lexer.eat_punct(';')?;
                body.passes.push(ShaderPassSource::use_pass(&path));
            }
            Keyword::Tags if scope != Scope::Shader => {
                self.lexer.next_token()?;
                self.parse_tags(&mut body.tags)?;
            }
            Keyword::VertexShader | Keyword::FragmentShader if scope == Scope::Pass => {
                self.parse_entry(kw, body)?;
            }
            Keyword::BlendState | Keyword::DepthState | Keyword::RasterState | Keyword::StencilState => {
                let state = match kw {
                    Keyword::BlendState => RenderStateType::BlendState,
                    Keyword::DepthState => RenderStateType::DepthState,
                    Keyword::RasterState => RenderStateType::RasterState,
                    _ => RenderStateType::StencilState,
                };
                self.parse_render_state(state, &mut body.render_states)?;
            }
            Keyword::RenderQueueType => self.parse_render_queue(&mut body.render_states)?,
            kw if kw.is_editor_block() => self.skip_editor_block()?,
            _ => {
                return Err(self.error(
                    CompilationError::unexpected(&format!("a statement valid in {}", scope), kw),
                    token.span,
                ))
            }
        }
        Ok(())
    }

    fn parse_sub_shader(&mut self) -> CompileResult<SubShaderSource> {
        self.lexer.next_token()?;
        let name = self.expect_string()?;
        self.lexer.expect_punct('{')?;

        let label = format!("SubShader \"{}\"", name);
        let body = self.with_scope(&label, |p| p.parse_body(Scope::SubShader))?;
        Ok(SubShaderSource {
            name,
            passes: body.passes,
            pending_contents: body.pending_contents,
            render_states: body.render_states,
            tags: body.tags,
        })
    }

    fn parse_pass(&mut self) -> CompileResult<ShaderPassSource> {
        self.lexer.next_token()?;
        let name = self.expect_string()?;
        self.lexer.expect_punct('{')?;

        let label = format!("Pass \"{}\"", name);
        let body = self.with_scope(&label, |p| p.parse_body(Scope::Pass))?;
        Ok(ShaderPassSource {
            name,
            vertex_entry: body.vertex_entry,
            fragment_entry: body.fragment_entry,
            pending_contents: body.pending_contents,
            render_states: body.render_states,
            tags: body.tags,
            contents: None,
            is_use_pass: false,
        })
    }

    /// `VertexShader = main;`, assignable once per pass
    fn parse_entry(&mut self, kw: Keyword, body: &mut NodeBody) -> CompileResult<()> {
        let keyword = self.lexer.next_token()?;
        self.lexer.expect_punct('=')?;
        let token = self.lexer.next_token()?;
        let entry = match &token.kind {
            ShaderTokenKind::Identifier(name) => name.clone(),
            _ => return Err(self.unexpected("entry function name", &token)),
        };
        self.lexer.expect_punct(';')?;

        let slot = match kw {
            Keyword::VertexShader => &mut body.vertex_entry,
            _ => &mut body.fragment_entry,
        };
        if slot.is_some() {
            return Err(self.error(
                CompilationError::DuplicateEntryPoint {
                    entry: kw.as_str().to_string(),
                },
                keyword.span.merge(token.span),
            ));
        }
        *slot = Some(entry);
        Ok(())
    }

    /// `Tags { key = "value", other = 1 }`
    fn parse_tags(&mut self, tags: &mut Tags) -> CompileResult<()> {
        self.lexer.expect_punct('{')?;
        loop {
            let token = self.lexer.next_token()?;
            if token.kind.is_punct('}') {
                return Ok(());
            }
            let Some(key) = token_word(&token.kind) else {
                return Err(self.unexpected("tag name", &token));
            };
            self.lexer.expect_punct('=')?;

            let value_token = self.lexer.next_token()?;
            let value = match value_token.kind {
                ShaderTokenKind::StringLiteral(s) => TagValue::String(s),
                ShaderTokenKind::Number(n) => TagValue::Number(n),
                ShaderTokenKind::Boolean(b) => TagValue::Boolean(b),
                _ => return Err(self.unexpected("tag value", &value_token)),
            };
            if tags.insert(key.clone(), value).is_some() {
                self.ctx.note_warning();
                log_warning!("Tag assigned twice, keeping the last value",
                    "tag" => key.as_str(),
                    "scope" => self.current_context()
                );
            }
            if !self.lexer.eat_punct(',')? {
                self.lexer.eat_punct(';')?;
            }
        }
    }

    /// `Editor { ... }` and friends carry editor-only data
    fn skip_editor_block(&mut self) -> CompileResult<()> {
        self.lexer.next_token()?;
        self.lexer.expect_punct('{')?;
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.lexer.next_token()?;
            match token.kind {
                ShaderTokenKind::Punct('{') => depth += 1,
                ShaderTokenKind::Punct('}') => depth -= 1,
                ShaderTokenKind::Eof => return Err(self.unexpected("'}'", &token)),
                _ => {}
            }
        }
        Ok(())
    }

    /// `BlendFactor srcFactor;` declares a render-state variable; the
    /// declaration is not GLSL and is dropped from the body. Returns false
    /// (nothing consumed) when the statement has another shape.
    fn try_enum_variable(&mut self, ty: EngineEnumType) -> CompileResult<bool> {
        let checkpoint = self.lexer.clone();
        self.lexer.next_token()?;
        let name = self.lexer.next_token()?;
        let ShaderTokenKind::Identifier(ident) = &name.kind else {
            self.lexer = checkpoint;
            return Ok(false);
        };
        if !self.lexer.eat_punct(';')? {
            self.lexer = checkpoint;
            return Ok(false);
        }
        self.declare(Symbol::new(
            ident,
            SymbolKind::Variable(ValueKind::Enum(ty)),
            SymbolValue::Undefined,
            name.span,
        ));
        Ok(true)
    }

    /// One opaque statement: tokens up to `;` or through a balanced block
    fn parse_opaque(&mut self, body: &mut NodeBody) -> CompileResult<()> {
        let first = self.lexer.peek()?.clone();
        let mut end = first.span.end.offset;
        let mut depth = 0usize;
        let mut words: Vec<ShaderTokenKind> = Vec::new();

        loop {
            let token = self.lexer.peek()?.clone();
            match &token.kind {
                ShaderTokenKind::Eof if depth == 0 => break,
                ShaderTokenKind::Eof => return Err(self.unexpected("'}'", &token)),
                ShaderTokenKind::Punct('}') if depth == 0 => break,
                ShaderTokenKind::Keyword(kw) if depth == 0 && kw.is_structural() && !words.is_empty() => break,
                _ => {}
            }

            self.lexer.next_token()?;
            end = token.span.end.offset;
            match token.kind {
                ShaderTokenKind::Punct(';') if depth == 0 => break,
                ShaderTokenKind::Punct('{') => depth += 1,
                ShaderTokenKind::Punct('}') => {
                    depth -= 1;
                    if depth == 0 {
                        // `struct S { ... };`
                        if self.lexer.peek()?.kind.is_punct(';') {
                            end = self.lexer.next_token()?.span.end.offset;
                        }
                        break;
                    }
                }
                kind if depth == 0 && words.len() < 4 => words.push(kind),
                _ => {}
            }
        }

        let text = self.lexer.slice(first.span.start.offset, end).to_string();
        self.register_glsl_variable(&words, first.span);
        body.pending_contents.push(text);
        Ok(())
    }

    /// `[uniform] float name;` declares a variable usable as a render-state
    /// value. The statement itself stays in the body.
    fn register_glsl_variable(&mut self, words: &[ShaderTokenKind], span: Span) {
        let words = match words {
            [ShaderTokenKind::Identifier(q), rest @ ..] if q == "uniform" => rest,
            _ => words,
        };
        if let [ShaderTokenKind::Identifier(ty), ShaderTokenKind::Identifier(name)] = words {
            if let Some(kind) = ValueKind::from_glsl_type(ty) {
                self.declare(Symbol::new(
                    name,
                    SymbolKind::Variable(kind),
                    SymbolValue::Undefined,
                    span,
                ));
            }
        }
    }

    pub(crate) fn declare(&mut self, symbol: Symbol) {
        if self.prefs.log_symbol_events {
            log_debug!("Symbol declared",
                "ident" => symbol.ident.as_str(),
                "kind" => symbol.kind.to_string(),
                "scope" => self.current_context()
            );
        }
        if let Some(previous) = self.ctx.symbols.declare(symbol) {
            log_debug!("Symbol redeclared in the same scope", "ident" => previous.ident.as_str());
        }
    }

    pub(crate) fn expect_string(&mut self) -> CompileResult<String> {
        let token = self.lexer.next_token()?;
        match token.kind {
            ShaderTokenKind::StringLiteral(s) => Ok(s),
            _ => Err(self.unexpected("string literal", &token)),
        }
    }

    pub(crate) fn error(&self, reason: CompilationError, span: Span) -> CompileError {
        self.lexer.error(reason, span)
    }

    pub(crate) fn unexpected(&self, expected: &str, token: &ShaderToken) -> CompileError {
        self.error(CompilationError::unexpected(expected, &token.kind), token.span)
    }

    /// Collect a recoverable error and skip to the end of the statement.
    /// Fatal errors, and any error when collection is off, propagate.
    pub(crate) fn recover<T>(&mut self, result: CompileResult<T>) -> CompileResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() && self.ctx.collects_errors() => {
                err.log();
                self.ctx.report(err)?;
                self.skip_to_statement_end()?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Consume through the next `;`, stopping before a `}` that closes the
    /// enclosing block
    fn skip_to_statement_end(&mut self) -> CompileResult<()> {
        let mut depth = 0usize;
        loop {
            let kind = self.lexer.peek()?.kind.clone();
            match kind {
                ShaderTokenKind::Eof => return Ok(()),
                ShaderTokenKind::Punct('}') if depth == 0 => return Ok(()),
                ShaderTokenKind::Punct(';') if depth == 0 => {
                    self.lexer.next_token()?;
                    return Ok(());
                }
                ShaderTokenKind::Punct('{') => depth += 1,
                ShaderTokenKind::Punct('}') => depth -= 1,
                _ => {}
            }
            self.lexer.next_token()?;
        }
    }
}
