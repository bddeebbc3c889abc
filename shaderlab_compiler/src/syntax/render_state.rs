//! Render-state blocks, render-queue statements and property values

use super::error::CompilationError;
use super::parser::{token_word, ContentParser};
use crate::config::compile_time::content::MAX_BLEND_TARGETS;
use crate::diagnostics::CompileResult;
use crate::grammar::{
    EngineEnumType, EnumValue, Keyword, RenderStateElementKey, RenderStateType, RenderStateValue,
    RenderStates, StateProperty, ValueKind,
};
use crate::symbols::{Symbol, SymbolKind, SymbolValue};
use crate::tokens::{ShaderToken, ShaderTokenKind};
use crate::utils::Span;

/// Right-hand side of a property assignment
#[derive(Debug, Clone, PartialEq)]
enum PropertyValue {
    Constant(RenderStateValue),
    /// Name of a declared variable, resolved by a later stage
    Variable(String),
}

impl<'a> ContentParser<'a> {
    /// One of
    /// - `BlendState name { ... }` declaration
    /// - `BlendState name;` forward declaration
    /// - `BlendState = name;` assignment of a declared block
    /// - `BlendState { ... }` anonymous block, merged into the node
    pub(crate) fn parse_render_state(
        &mut self,
        state: RenderStateType,
        target: &mut RenderStates,
    ) -> CompileResult<()> {
        self.lexer.next_token()?;
        let token = self.lexer.peek()?.clone();

        match &token.kind {
            ShaderTokenKind::Punct('=') => {
                self.lexer.next_token()?;
                let assigned = self.parse_state_assignment(state);
                if let Some(states) = self.recover(assigned)? {
                    target.overlay(&states);
                }
                Ok(())
            }
            ShaderTokenKind::Punct('{') => {
                let states = self.parse_properties(state)?;
                target.overlay(&states);
                Ok(())
            }
            ShaderTokenKind::Identifier(name) => {
                self.lexer.next_token()?;
                let value = if self.lexer.eat_punct(';')? {
                    SymbolValue::Undefined
                } else if self.lexer.peek()?.kind.is_punct('{') {
                    SymbolValue::RenderStates(self.parse_properties(state)?)
                } else {
                    let next = self.lexer.next_token()?;
                    return Err(self.unexpected("'{' or ';'", &next));
                };
                self.declare(Symbol::new(name, SymbolKind::RenderState(state), value, token.span));
                Ok(())
            }
            _ => Err(self.unexpected(&format!("render state name, '=' or '{{' after {}", state), &token)),
        }
    }

    /// `= name;` with `name` a declared block of the same state type
    fn parse_state_assignment(&mut self, state: RenderStateType) -> CompileResult<RenderStates> {
        let token = self.lexer.next_token()?;
        let ShaderTokenKind::Identifier(name) = &token.kind else {
            return Err(self.unexpected("render state name", &token));
        };

        let states = match self.ctx.symbols.lookup(name, SymbolKind::RenderState(state)) {
            None => {
                return Err(self.error(
                    CompilationError::UndeclaredVariable { name: name.clone() },
                    token.span,
                ))
            }
            Some(Symbol {
                value: SymbolValue::RenderStates(states),
                ..
            }) => states.clone(),
            Some(_) => {
                return Err(self.error(
                    CompilationError::InvalidVariableType {
                        name: name.clone(),
                        expected: format!("a {} block", state),
                    },
                    token.span,
                ))
            }
        };
        self.lexer.expect_punct(';')?;
        Ok(states)
    }

    /// `{ prop = value; ... }`; recoverable property errors are collected
    fn parse_properties(&mut self, state: RenderStateType) -> CompileResult<RenderStates> {
        self.lexer.expect_punct('{')?;
        let mut states = RenderStates::default();

        loop {
            let token = self.lexer.peek()?.clone();
            match token.kind {
                ShaderTokenKind::Punct('}') => {
                    self.lexer.next_token()?;
                    return Ok(states);
                }
                ShaderTokenKind::Eof => return Err(self.unexpected("'}'", &token)),
                _ => {
                    let property = self.parse_property(state);
                    if let Some((key, value)) = self.recover(property)? {
                        match value {
                            PropertyValue::Constant(value) => states.set_constant(key, value),
                            PropertyValue::Variable(name) => states.set_variable(key, name),
                        }
                    }
                }
            }
        }
    }

    /// `Name[index] = value;`
    fn parse_property(
        &mut self,
        state: RenderStateType,
    ) -> CompileResult<(RenderStateElementKey, PropertyValue)> {
        let token = self.lexer.next_token()?;
        let Some(name) = token_word(&token.kind) else {
            return Err(self.unexpected("property name", &token));
        };
        let property = StateProperty::lookup(state, &name).ok_or_else(|| {
            self.error(
                CompilationError::UnknownProperty {
                    state: state.to_string(),
                    name: name.clone(),
                },
                token.span,
            )
        })?;

        let key = if self.lexer.peek()?.kind.is_punct('[') {
            let open = self.lexer.next_token()?;
            let index = self.parse_index(property, open.span)?;
            RenderStateElementKey::indexed(property, index)
        } else {
            RenderStateElementKey::new(property)
        };

        self.lexer.expect_punct('=')?;
        let value = self.parse_value(property)?;
        self.lexer.expect_punct(';')?;
        Ok((key, value))
    }

    /// `[n]` after an indexed blend property
    fn parse_index(&mut self, property: StateProperty, open: Span) -> CompileResult<u8> {
        let token = self.lexer.next_token()?;
        let ShaderTokenKind::Number(n) = token.kind else {
            return Err(self.unexpected("blend target index", &token));
        };
        let close = self.lexer.expect_punct(']')?;
        let span = open.merge(close);

        let invalid = |reason: String| CompilationError::InvalidPropertyIndex {
            property: property.qualified_name(),
            reason,
        };
        if !property.is_indexed() {
            return Err(self.error(invalid("property takes no index".to_string()), span));
        }
        if n.fract() != 0.0 || n < 0.0 || n >= f64::from(MAX_BLEND_TARGETS) {
            return Err(self.error(
                invalid(format!("{} is not in 0..{}", n, MAX_BLEND_TARGETS)),
                span,
            ));
        }
        Ok(n as u8)
    }

    fn parse_value(&mut self, property: StateProperty) -> CompileResult<PropertyValue> {
        let expected = property.value_kind();
        let token = self.lexer.next_token()?;

        let (value, span) = match &token.kind {
            ShaderTokenKind::Number(n) => (RenderStateValue::Number(*n), token.span),
            ShaderTokenKind::Punct('-') => {
                let number = self.lexer.next_token()?;
                let ShaderTokenKind::Number(n) = number.kind else {
                    return Err(self.unexpected("number", &number));
                };
                (RenderStateValue::Number(-n), token.span.merge(number.span))
            }
            ShaderTokenKind::Boolean(b) => (RenderStateValue::Boolean(*b), token.span),
            ShaderTokenKind::Identifier(name) if name == "Color" && self.lexer.peek()?.kind.is_punct('(') => {
                let (color, span) = self.parse_color(token.span)?;
                (RenderStateValue::Color(color), span)
            }
            ShaderTokenKind::EngineEnum(ty) => self.parse_enum_member(*ty, token.span)?,
            ShaderTokenKind::Keyword(Keyword::RenderQueueType) => {
                self.parse_enum_member(EngineEnumType::RenderQueueType, token.span)?
            }
            ShaderTokenKind::Identifier(name) if self.lexer.peek()?.kind.is_punct('.') => {
                self.lexer.next_token()?;
                self.lexer.next_token()?;
                return Err(self.error(
                    CompilationError::UnknownEnumType { name: name.clone() },
                    token.span,
                ));
            }
            ShaderTokenKind::Identifier(name) => {
                return self.resolve_variable(name, expected, token.span);
            }
            _ => return Err(self.unexpected("render state value", &token)),
        };

        if value.kind() != expected {
            return Err(self.error(
                CompilationError::ValueTypeMismatch {
                    property: property.qualified_name(),
                    expected: expected.to_string(),
                    found: value.kind().to_string(),
                },
                span,
            ));
        }
        Ok(PropertyValue::Constant(value))
    }

    /// `.Member` after an enum namespace
    fn parse_enum_member(
        &mut self,
        enum_type: EngineEnumType,
        start: Span,
    ) -> CompileResult<(RenderStateValue, Span)> {
        self.lexer.expect_punct('.')?;
        let token = self.lexer.next_token()?;
        let Some(member) = token_word(&token.kind) else {
            return Err(self.unexpected(&format!("{} member", enum_type), &token));
        };
        let span = start.merge(token.span);
        let value = enum_type.member_value(&member).ok_or_else(|| {
            self.error(
                CompilationError::UnknownEnumMember {
                    enum_type: enum_type.to_string(),
                    member: member.clone(),
                },
                span,
            )
        })?;
        Ok((
            RenderStateValue::Enum(EnumValue {
                enum_type,
                member,
                value,
            }),
            span,
        ))
    }

    /// `Color(r, g, b, a)`
    fn parse_color(&mut self, start: Span) -> CompileResult<([f32; 4], Span)> {
        self.lexer.expect_punct('(')?;
        let mut color = [0.0f32; 4];
        for (i, channel) in color.iter_mut().enumerate() {
            if i > 0 {
                self.lexer.expect_punct(',')?;
            }
            let negative = self.lexer.eat_punct('-')?;
            let token = self.lexer.next_token()?;
            let ShaderTokenKind::Number(n) = token.kind else {
                return Err(self.unexpected("color component", &token));
            };
            *channel = if negative { -n as f32 } else { n as f32 };
        }
        let close = self.lexer.expect_punct(')')?;
        Ok((color, start.merge(close)))
    }

    /// Bare identifier value: a declared variable of the property's kind
    fn resolve_variable(
        &self,
        name: &str,
        expected: ValueKind,
        span: Span,
    ) -> CompileResult<PropertyValue> {
        match self.ctx.symbols.lookup_variable(name) {
            None => Err(self.error(
                CompilationError::UndeclaredVariable {
                    name: name.to_string(),
                },
                span,
            )),
            Some(symbol) if symbol.kind == SymbolKind::Variable(expected) => {
                Ok(PropertyValue::Variable(name.to_string()))
            }
            Some(_) => Err(self.error(
                CompilationError::InvalidVariableType {
                    name: name.to_string(),
                    expected: expected.to_string(),
                },
                span,
            )),
        }
    }

    /// `RenderQueueType name;` declares, `RenderQueueType = value;` assigns
    pub(crate) fn parse_render_queue(&mut self, target: &mut RenderStates) -> CompileResult<()> {
        self.lexer.next_token()?;
        let token = self.lexer.next_token()?;

        match &token.kind {
            ShaderTokenKind::Identifier(name) => {
                self.lexer.expect_punct(';')?;
                self.declare(Symbol::new(
                    name,
                    SymbolKind::RenderQueue,
                    SymbolValue::Undefined,
                    token.span,
                ));
                Ok(())
            }
            ShaderTokenKind::Punct('=') => {
                let assigned = self.parse_queue_value();
                if let Some(value) = self.recover(assigned)? {
                    let key = RenderStateElementKey::new(StateProperty::RenderQueueType);
                    match value {
                        PropertyValue::Constant(value) => target.set_constant(key, value),
                        PropertyValue::Variable(name) => target.set_variable(key, name),
                    }
                }
                Ok(())
            }
            _ => Err(self.unexpected("render queue name or '='", &token)),
        }
    }

    fn parse_queue_value(&mut self) -> CompileResult<PropertyValue> {
        let token = self.lexer.next_token()?;
        let value = match &token.kind {
            ShaderTokenKind::Keyword(Keyword::RenderQueueType)
            | ShaderTokenKind::EngineEnum(EngineEnumType::RenderQueueType) => {
                let (value, _) = self.parse_enum_member(EngineEnumType::RenderQueueType, token.span)?;
                PropertyValue::Constant(value)
            }
            ShaderTokenKind::Identifier(name) => self.resolve_queue_name(name, &token)?,
            _ => return Err(self.unexpected("render queue value", &token)),
        };
        self.lexer.expect_punct(';')?;
        Ok(value)
    }

    /// Declared queue name, bare member (`Transparent`), or a variable of
    /// the render-queue enum type
    fn resolve_queue_name(&self, name: &str, token: &ShaderToken) -> CompileResult<PropertyValue> {
        if self.ctx.symbols.lookup(name, SymbolKind::RenderQueue).is_some() {
            return Ok(PropertyValue::Variable(name.to_string()));
        }
        let queue = EngineEnumType::RenderQueueType;
        if let Some(value) = queue.member_value(name) {
            return Ok(PropertyValue::Constant(RenderStateValue::Enum(EnumValue {
                enum_type: queue,
                member: name.to_string(),
                value,
            })));
        }
        self.resolve_variable(name, ValueKind::Enum(queue), token.span)
    }
}
