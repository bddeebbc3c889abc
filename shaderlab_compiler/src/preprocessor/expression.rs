//! Constant expressions of `#if` / `#elif`
//!
//! Precedence climbing over C preprocessor integer arithmetic. Identifiers
//! resolve through the macro table: undefined names are 0, object macros
//! without a body are 1, and bodies are evaluated as expressions in turn.

use super::error::PreprocessorError;
use super::macros::MacroTable;
use crate::config::compile_time::preprocessor::MAX_EXPRESSION_DEPTH;
use crate::lexical::{is_word_char, is_word_start};
use crate::tokens::Token;
use crate::utils::Arena;
use std::collections::HashSet;

type EvalResult<T> = Result<T, PreprocessorError>;

#[derive(Debug, Clone, PartialEq)]
enum ExprToken {
    Int(i64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

const TWO_CHAR_OPS: [&str; 8] = ["||", "&&", "==", "!=", "<=", ">=", "<<", ">>"];
const ONE_CHAR_OPS: [&str; 11] = ["+", "-", "*", "/", "%", "<", ">", "&", "|", "^", "!"];

fn binary_precedence(op: &str) -> Option<u8> {
    let precedence = match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | ">" | "<=" | ">=" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    };
    Some(precedence)
}

fn tokenize(text: &str) -> EvalResult<Vec<ExprToken>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if rest.starts_with("//") {
            break;
        }
        if rest.starts_with("/*") {
            let close = rest[2..]
                .find("*/")
                .ok_or_else(|| PreprocessorError::malformed("unterminated comment"))?;
            rest = &rest[close + 4..];
            continue;
        }
        if c.is_ascii_digit() {
            let len = rest
                .find(|c: char| !(is_word_char(c) || c == '.'))
                .unwrap_or(rest.len());
            tokens.push(ExprToken::Int(parse_integer(&rest[..len])?));
            rest = &rest[len..];
            continue;
        }
        if is_word_start(c) {
            let len = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
            tokens.push(ExprToken::Ident(rest[..len].to_string()));
            rest = &rest[len..];
            continue;
        }
        match c {
            '(' => tokens.push(ExprToken::LParen),
            ')' => tokens.push(ExprToken::RParen),
            '~' => tokens.push(ExprToken::Op("~")),
            _ => {
                if let Some(op) = TWO_CHAR_OPS.iter().find(|op| rest.starts_with(**op)) {
                    tokens.push(ExprToken::Op(*op));
                    rest = &rest[2..];
                    continue;
                }
                match ONE_CHAR_OPS.iter().find(|op| rest.starts_with(**op)) {
                    Some(op) => tokens.push(ExprToken::Op(*op)),
                    None => {
                        return Err(PreprocessorError::malformed(format!(
                            "unexpected character '{}'",
                            c
                        )))
                    }
                }
            }
        }
        rest = &rest[c.len_utf8()..];
    }

    Ok(tokens)
}

/// Decimal, `0x` hex or leading-zero octal, with optional `u`/`l` suffixes
fn parse_integer(literal: &str) -> EvalResult<i64> {
    let digits = literal.trim_end_matches(&['u', 'U', 'l', 'L'][..]);
    let invalid = || PreprocessorError::malformed(format!("invalid integer literal '{}'", literal));

    let (radix, body) = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if body.is_empty() {
        return Err(invalid());
    }
    u64::from_str_radix(body, radix)
        .map(|value| value as i64)
        .map_err(|_| invalid())
}

pub struct ExpressionEvaluator<'a> {
    macros: &'a MacroTable,
    tokens: &'a Arena<Token>,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(macros: &'a MacroTable, tokens: &'a Arena<Token>) -> Self {
        Self { macros, tokens }
    }

    pub fn evaluate(&self, text: &str) -> EvalResult<i64> {
        let mut visited = HashSet::new();
        self.evaluate_nested(text, &mut visited, 0)
    }

    pub fn is_true(&self, text: &str) -> EvalResult<bool> {
        self.evaluate(text).map(|value| value != 0)
    }

    fn evaluate_nested(&self, text: &str, visited: &mut HashSet<String>, depth: usize) -> EvalResult<i64> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(PreprocessorError::malformed("empty expression"));
        }

        let mut parser = ExprParser {
            evaluator: self,
            tokens,
            pos: 0,
            depth,
            visited,
        };
        let value = parser.parse_binary(1)?;
        match parser.tokens.get(parser.pos) {
            None => Ok(value),
            Some(token) => Err(PreprocessorError::malformed(format!(
                "unexpected {} after expression",
                describe(token)
            ))),
        }
    }

    fn macro_value(&self, name: &str, visited: &mut HashSet<String>, depth: usize) -> EvalResult<i64> {
        let Some(define) = self.macros.get(name) else {
            return Ok(0);
        };
        if define.is_function_like() {
            return Err(PreprocessorError::FunctionMacroInCondition {
                name: name.to_string(),
            });
        }

        let body = define.body_text(self.tokens).trim();
        if body.is_empty() {
            return Ok(1);
        }
        // A macro whose value refers back to itself contributes 0
        if !visited.insert(name.to_string()) {
            return Ok(0);
        }
        let value = self.evaluate_nested(body, visited, depth + 1);
        visited.remove(name);
        value
    }
}

fn describe(token: &ExprToken) -> String {
    match token {
        ExprToken::Int(value) => format!("'{}'", value),
        ExprToken::Ident(name) => format!("'{}'", name),
        ExprToken::Op(op) => format!("'{}'", op),
        ExprToken::LParen => "'('".to_string(),
        ExprToken::RParen => "')'".to_string(),
    }
}

struct ExprParser<'e, 'a, 'v> {
    evaluator: &'e ExpressionEvaluator<'a>,
    tokens: Vec<ExprToken>,
    pos: usize,
    depth: usize,
    visited: &'v mut HashSet<String>,
}

impl ExprParser<'_, '_, '_> {
    fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<ExprToken> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> EvalResult<()> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(PreprocessorError::malformed("expression nests too deeply"));
        }
        Ok(())
    }

    fn parse_binary(&mut self, min_precedence: u8) -> EvalResult<i64> {
        self.descend()?;
        let mut lhs = self.parse_unary()?;

        while let Some(ExprToken::Op(op)) = self.peek() {
            let op = *op;
            let Some(precedence) = binary_precedence(op) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = apply_binary(op, lhs, rhs)?;
        }

        self.depth -= 1;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> EvalResult<i64> {
        match self.peek() {
            Some(ExprToken::Op(op @ ("!" | "~" | "-" | "+"))) => {
                let op = *op;
                self.pos += 1;
                self.descend()?;
                let value = self.parse_unary()?;
                self.depth -= 1;
                Ok(match op {
                    "!" => (value == 0) as i64,
                    "~" => !value,
                    "-" => value.wrapping_neg(),
                    _ => value,
                })
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> EvalResult<i64> {
        match self.next() {
            Some(ExprToken::Int(value)) => Ok(value),
            Some(ExprToken::LParen) => {
                let value = self.parse_binary(1)?;
                match self.next() {
                    Some(ExprToken::RParen) => Ok(value),
                    _ => Err(PreprocessorError::malformed("missing ')'")),
                }
            }
            Some(ExprToken::Ident(name)) if name == "defined" => self.parse_defined(),
            Some(ExprToken::Ident(name)) => {
                self.evaluator
                    .macro_value(&name, self.visited, self.depth)
            }
            Some(token) => Err(PreprocessorError::malformed(format!(
                "unexpected {}",
                describe(&token)
            ))),
            None => Err(PreprocessorError::malformed("unexpected end of expression")),
        }
    }

    /// `defined NAME` or `defined(NAME)`
    fn parse_defined(&mut self) -> EvalResult<i64> {
        let parenthesized = self.peek() == Some(&ExprToken::LParen);
        if parenthesized {
            self.pos += 1;
        }
        let name = match self.next() {
            Some(ExprToken::Ident(name)) => name,
            _ => return Err(PreprocessorError::malformed("'defined' requires a macro name")),
        };
        if parenthesized && self.next() != Some(ExprToken::RParen) {
            return Err(PreprocessorError::malformed("missing ')' after 'defined'"));
        }
        Ok(self.evaluator.macros.is_defined(&name) as i64)
    }
}

fn apply_binary(op: &str, lhs: i64, rhs: i64) -> EvalResult<i64> {
    let value = match op {
        "||" => (lhs != 0 || rhs != 0) as i64,
        "&&" => (lhs != 0 && rhs != 0) as i64,
        "|" => lhs | rhs,
        "^" => lhs ^ rhs,
        "&" => lhs & rhs,
        "==" => (lhs == rhs) as i64,
        "!=" => (lhs != rhs) as i64,
        "<" => (lhs < rhs) as i64,
        ">" => (lhs > rhs) as i64,
        "<=" => (lhs <= rhs) as i64,
        ">=" => (lhs >= rhs) as i64,
        "<<" => lhs.wrapping_shl(rhs as u32),
        ">>" => lhs.wrapping_shr(rhs as u32),
        "+" => lhs.wrapping_add(rhs),
        "-" => lhs.wrapping_sub(rhs),
        "*" => lhs.wrapping_mul(rhs),
        "/" | "%" if rhs == 0 => return Err(PreprocessorError::DivisionByZero),
        "/" => lhs.wrapping_div(rhs),
        "%" => lhs.wrapping_rem(rhs),
        other => {
            return Err(PreprocessorError::malformed(format!(
                "'{}' is not a binary operator",
                other
            )))
        }
    };
    Ok(value)
}
