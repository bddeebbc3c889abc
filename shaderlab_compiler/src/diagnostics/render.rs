//! Source snippet rendering
//!
//! ```text
//! error[E204]: Undeclared variable 'myQueue'
//!  --> water.shader:3:23
//!   |
//! 2 |   Pass "P" {
//! 3 |     RenderQueueType = myQueue;
//!   |                       ^^^^^^^
//! 4 |   }
//! ```

use crate::utils::{LineIndex, Span};
use std::fmt::Write;

pub struct Snippet<'a> {
    pub code: &'a str,
    pub message: &'a str,
    pub file: &'a str,
    pub span: Span,
}

/// Header and location only
pub fn render_header(snippet: &Snippet<'_>) -> String {
    format!(
        "error[{}]: {}\n --> {}:{}:{}",
        snippet.code, snippet.message, snippet.file, snippet.span.start.line, snippet.span.start.column
    )
}

/// Header plus `wrap` lines of context above and below the offending line
pub fn render_snippet(snippet: &Snippet<'_>, index: &LineIndex, wrap: usize) -> String {
    let mut out = render_header(snippet);

    let start = index.position_at(snippet.span.start.offset);
    let end = index.position_at(snippet.span.end.offset);
    let line = start.line as usize;

    let first = line.saturating_sub(wrap).max(1);
    let last = (line + wrap).min(index.line_count());
    let gutter = last.to_string().len();

    let _ = write!(out, "\n{:>gutter$} |", "");

    for number in first..=last {
        let Some(text) = index.get_line(number as u32) else {
            continue;
        };
        let _ = write!(out, "\n{:>gutter$} | {}", number, text);

        if number == line {
            let line_start = index.line_start(start.line).unwrap_or(0);
            let prefix_end = start.offset.saturating_sub(line_start).min(text.len());
            let prefix: String = text[..prefix_end]
                .chars()
                .map(|c| if c == '\t' { '\t' } else { ' ' })
                .collect();

            let caret_count = if end.line == start.line {
                index.source()[start.offset..end.offset.max(start.offset)]
                    .chars()
                    .count()
            } else {
                text[prefix_end..].chars().count()
            }
            .max(1);

            let _ = write!(out, "\n{:>gutter$} | {}{}", "", prefix, "^".repeat(caret_count));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn render(text: &str, start: usize, end: usize, wrap: usize) -> String {
        let index = LineIndex::new(Arc::from(text));
        let snippet = Snippet {
            code: "E204",
            message: "Undeclared variable 'q'",
            file: "t.shader",
            span: index.span(start, end),
        };
        render_snippet(&snippet, &index, wrap)
    }

    #[test]
    fn test_single_line_caret() {
        let out = render("a\nRenderQueueType = q;\nc", 20, 21, 1);
        let expected = "error[E204]: Undeclared variable 'q'\n --> t.shader:2:19\n  |\n1 | a\n2 | RenderQueueType = q;\n  |                   ^\n3 | c";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_span_gets_one_caret_and_tabs_are_kept() {
        let out = render("\tx = ;", 5, 5, 0);
        assert!(out.ends_with("1 | \tx = ;\n  | \t    ^"));
    }

    #[test]
    fn test_wrap_is_clamped_to_file() {
        let out = render("only line", 0, 4, 5);
        assert!(out.contains("1 | only line"));
        assert!(out.ends_with("^^^^"));
    }
}
