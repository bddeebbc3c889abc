//! Macro invocation expansion
//!
//! Arguments are expanded first, substituted into the body by whole-word
//! match, and the result is rescanned. While a macro's own expansion is
//! being rescanned its name is in the `visited` set, so a macro that
//! reintroduces itself is left as plain text on the second occurrence.

use super::error::PreprocessorError;
use super::macros::MacroTable;
use crate::config::compile_time::preprocessor::MAX_EXPANSION_DEPTH;
use crate::lexical::{is_word_char, is_word_start};
use crate::tokens::Token;
use crate::utils::Arena;
use std::collections::HashSet;

type ExpandResult<T> = Result<T, PreprocessorError>;

/// Byte length of the identifier at the start of `text`
fn word_len(text: &str) -> usize {
    text.find(|c: char| !is_word_char(c)).unwrap_or(text.len())
}

/// Byte length of the double-quoted literal at the start of `text`
fn string_len(text: &str) -> usize {
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return i + 1,
            '\n' => return i,
            _ => escaped = false,
        }
    }
    text.len()
}

/// Offset of the `)` matching the `(` at `open`. String literals are
/// skipped whole.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = open;

    while let Some(c) = text[pos..].chars().next() {
        match c {
            '"' => {
                pos += string_len(&text[pos..]);
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
        pos += c.len_utf8();
    }
    None
}

/// Split an argument list on the commas that are not inside parentheses
/// or string literals
pub fn split_args(inner: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut rest = inner;

    while let Some(c) = rest.chars().next() {
        let len = match c {
            '"' => {
                let len = string_len(rest);
                current.push_str(&rest[..len]);
                rest = &rest[len..];
                continue;
            }
            '(' => {
                depth += 1;
                current.push(c);
                c.len_utf8()
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
                c.len_utf8()
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
                c.len_utf8()
            }
            _ => {
                current.push(c);
                c.len_utf8()
            }
        };
        rest = &rest[len..];
    }
    args.push(current.trim().to_string());
    args
}

/// Replace comments with a single space; string literals are kept as is
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("//") {
            let len = rest.find('\n').unwrap_or(rest.len());
            out.push(' ');
            rest = &rest[len..];
        } else if rest.starts_with("/*") {
            let len = rest[2..].find("*/").map(|i| i + 4).unwrap_or(rest.len());
            out.push(' ');
            rest = &rest[len..];
        } else if c == '"' {
            let len = string_len(rest);
            out.push_str(&rest[..len]);
            rest = &rest[len..];
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

/// Substitute whole-word occurrences of `params` in `body` with `args`
fn substitute(body: &str, params: &[&str], args: &[String]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(c) = rest.chars().next() {
        let len = if is_word_start(c) {
            let len = word_len(rest);
            let word = &rest[..len];
            match params.iter().position(|p| *p == word) {
                Some(index) => out.push_str(&args[index]),
                None => out.push_str(word),
            }
            len
        } else if c.is_ascii_digit() {
            let len = word_len(rest);
            out.push_str(&rest[..len]);
            len
        } else if c == '"' {
            let len = string_len(rest);
            out.push_str(&rest[..len]);
            len
        } else {
            out.push(c);
            c.len_utf8()
        };
        rest = &rest[len..];
    }
    out
}

pub struct Expander<'a> {
    macros: &'a MacroTable,
    tokens: &'a Arena<Token>,
}

impl<'a> Expander<'a> {
    pub fn new(macros: &'a MacroTable, tokens: &'a Arena<Token>) -> Self {
        Self { macros, tokens }
    }

    /// Expand one invocation found in source text. `args` is `Some` exactly
    /// when the macro is function-like and an argument list followed it.
    pub fn expand_invocation(&self, name: &str, args: Option<Vec<String>>) -> ExpandResult<String> {
        let mut visited = HashSet::new();
        self.expand_macro(name, args.as_deref(), &mut visited, 0)
    }

    /// Expand every macro in `text`, skipping names in `visited`
    pub fn expand_text(
        &self,
        text: &str,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> ExpandResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        while let Some(c) = text[pos..].chars().next() {
            let rest = &text[pos..];

            if c == '"' {
                let len = string_len(rest);
                out.push_str(&rest[..len]);
                pos += len;
                continue;
            }
            if c.is_ascii_digit() {
                let len = word_len(rest);
                out.push_str(&rest[..len]);
                pos += len;
                continue;
            }
            if !is_word_start(c) {
                out.push(c);
                pos += c.len_utf8();
                continue;
            }

            let len = word_len(rest);
            let name = &rest[..len];
            pos += len;

            let Some(define) = self.macros.get(name).filter(|_| !visited.contains(name)) else {
                out.push_str(name);
                continue;
            };

            if !define.is_function_like() {
                out.push_str(&self.expand_macro(name, None, visited, depth)?);
                continue;
            }

            let open = pos + text[pos..].len() - text[pos..].trim_start().len();
            let close = text[open..]
                .starts_with('(')
                .then(|| matching_paren(text, open))
                .flatten();
            match close {
                Some(close) => {
                    let args = split_args(&text[open + 1..close]);
                    out.push_str(&self.expand_macro(name, Some(&args), visited, depth)?);
                    pos = close + 1;
                }
                // Without an argument list the name is ordinary text
                None => out.push_str(name),
            }
        }

        Ok(out)
    }

    /// Byte offset of a function-like macro name that ends `text`, if any.
    /// Such a name could not find its argument list inside `text`.
    pub fn trailing_function_macro(&self, text: &str) -> Option<usize> {
        let trimmed = text.trim_end();
        let start = trimmed
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_word_char(*c))
            .last()
            .map(|(i, _)| i)?;
        let name = &trimmed[start..];
        let starts_word = name.chars().next().is_some_and(is_word_start);
        self.macros
            .get(name)
            .filter(|define| starts_word && define.is_function_like())
            .map(|_| start)
    }

    fn expand_macro(
        &self,
        name: &str,
        args: Option<&[String]>,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> ExpandResult<String> {
        if depth >= MAX_EXPANSION_DEPTH {
            return Err(PreprocessorError::ExpansionDepthExceeded {
                name: name.to_string(),
            });
        }
        let Some(define) = self.macros.get(name) else {
            return Ok(name.to_string());
        };

        let body = define.body_text(self.tokens);
        let substituted = match (define.is_function_like(), args) {
            (true, Some(args)) => {
                let params = define.param_names(self.tokens);
                let found = if params.is_empty() && args.len() == 1 && args[0].is_empty() {
                    0
                } else {
                    args.len()
                };
                if found != params.len() {
                    return Err(PreprocessorError::ArityMismatch {
                        name: name.to_string(),
                        expected: params.len(),
                        found,
                    });
                }

                let expanded_args = args
                    .iter()
                    .take(found)
                    .map(|arg| self.expand_text(arg, visited, depth + 1))
                    .collect::<ExpandResult<Vec<_>>>()?;
                substitute(body, &params, &expanded_args)
            }
            (true, None) => return Ok(name.to_string()),
            (false, _) => body.to_string(),
        };

        visited.insert(name.to_string());
        let result = self.expand_text(&substituted, visited, depth + 1);
        visited.remove(name);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessor::macros::MacroDefine;
    use crate::utils::Span;
    use assert_matches::assert_matches;

    struct Fixture {
        tokens: Arena<Token>,
        macros: MacroTable,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tokens: Arena::new(),
                macros: MacroTable::new(),
            }
        }

        fn object(mut self, name: &str, body: &str) -> Self {
            self.macros.define_builtin(&mut self.tokens, name, Some(body));
            self
        }

        fn function(mut self, name: &str, params: &[&str], body: &str) -> Self {
            let span = Span::default();
            let params: Vec<(String, Span)> = params.iter().map(|p| (p.to_string(), span)).collect();
            let define = MacroDefine::new(&mut self.tokens, name, span, span, "t")
                .with_params(&mut self.tokens, &params)
                .with_body(&mut self.tokens, body, span);
            self.macros.insert(name, define);
            self
        }

        fn expand(&self, text: &str) -> ExpandResult<String> {
            Expander::new(&self.macros, &self.tokens).expand_text(text, &mut HashSet::new(), 0)
        }
    }

    #[test]
    fn test_function_macro_substitution() {
        let f = Fixture::new().function("ADD", &["a", "b"], "(a+b)");
        assert_eq!(f.expand("ADD(1,2)").unwrap(), "(1+2)");
        assert_eq!(f.expand("ADD(ADD(1,2),3)").unwrap(), "((1+2)+3)");
        assert_eq!(f.expand("ADD (x, f(y, z))").unwrap(), "(x+f(y, z))");
    }

    #[test]
    fn test_substitution_is_whole_word() {
        let f = Fixture::new().function("SCALE", &["a"], "a * alpha + a2");
        assert_eq!(f.expand("SCALE(2)").unwrap(), "2 * alpha + a2");
    }

    #[test]
    fn test_self_reference_terminates() {
        let f = Fixture::new().object("X", "X");
        assert_eq!(f.expand("X").unwrap(), "X");

        let f = Fixture::new().object("A", "B + 1").object("B", "A * 2");
        assert_eq!(f.expand("A").unwrap(), "A * 2 + 1");
    }

    #[test]
    fn test_nested_object_macros_resolve_fully() {
        let f = Fixture::new()
            .object("PI", "3.14159")
            .object("TAU", "(2.0 * PI)")
            .function("TURNS", &["t"], "t * TAU");
        assert_eq!(f.expand("TURNS(0.5)").unwrap(), "0.5 * (2.0 * 3.14159)");
    }

    #[test]
    fn test_function_macro_without_arguments_is_plain_text() {
        let f = Fixture::new().function("F", &["x"], "x");
        assert_eq!(f.expand("F + 1").unwrap(), "F + 1");
    }

    #[test]
    fn test_strings_are_not_expanded() {
        let f = Fixture::new().object("NAME", "value");
        assert_eq!(f.expand("\"NAME\" NAME").unwrap(), "\"NAME\" value");
    }

    #[test]
    fn test_arity_mismatch() {
        let f = Fixture::new().function("ADD", &["a", "b"], "(a+b)").function("NOW", &[], "0");
        assert_matches!(
            f.expand("ADD(1)"),
            Err(PreprocessorError::ArityMismatch { expected: 2, found: 1, .. })
        );
        assert_eq!(f.expand("NOW()").unwrap(), "0");
    }

    #[test]
    fn test_trailing_function_macro() {
        let f = Fixture::new().function("G", &["x"], "x").object("H", "1");
        let expander = Expander::new(&f.macros, &f.tokens);
        assert_eq!(expander.trailing_function_macro("a + G "), Some(4));
        assert_eq!(expander.trailing_function_macro("G(1)"), None);
        assert_eq!(expander.trailing_function_macro("a + H"), None);
        assert_eq!(expander.trailing_function_macro("2G"), None);
        assert_eq!(expander.trailing_function_macro(""), None);
    }

    #[test]
    fn test_quoted_delimiters_in_arguments() {
        let f = Fixture::new()
            .function("FIRST", &["a", "b"], "a")
            .object("CALL", "FIRST(\"x)\", y)");
        assert_eq!(f.expand("FIRST(\"a,b\", c)").unwrap(), "\"a,b\"");
        assert_eq!(f.expand("CALL").unwrap(), "\"x)\"");
    }

    #[test]
    fn test_argument_helpers() {
        assert_eq!(split_args("a, f(b, c) ,d"), vec!["a", "f(b, c)", "d"]);
        assert_eq!(split_args("\"(,\", b"), vec!["\"(,\"", "b"]);
        assert_eq!(split_args(""), vec![""]);
        assert_eq!(strip_comments("a /* b */ c // d\ne"), "a   c  \ne");
        assert_eq!(strip_comments("\"/* kept */\""), "\"/* kept */\"");
    }
}
