//! Source location tracking.
//!
//! This is a trimmed-down version of the lexer's span type: the pass never
//! lexes anything itself, but every AST node carries one of these so
//! diagnostics can point back at the offending source text.

use std::fmt::Display;

use colored::Colorize;

/// A half-open range of source text, given as `(line, column)` pairs plus
/// the full source the range was taken from. Line and column are both
/// zero-indexed, matching how the (external) lexer numbers them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: (usize, usize),
    pub end: (usize, usize),
    pub source: String,
}

impl Span {
    pub fn new(start: (usize, usize), end: (usize, usize), source: impl ToString) -> Self {
        Span {
            start,
            end,
            source: source.to_string(),
        }
    }

    /// Render `msg` as a single- or multi-line annotated snippet, the way
    /// the compiler's CLI prints diagnostics to the terminal.
    pub fn to_string(&self, msg: impl ToString + std::fmt::Display) -> String {
        let Span { start, end, source } = self;

        if source.is_empty() {
            return msg.to_string();
        }

        let lines = source.lines().collect::<Vec<_>>();
        let Some(line_str) = lines.get(start.0) else {
            return msg.to_string();
        };

        let left_margin = format!("{}", end.0).len();
        let fill = " ".repeat(left_margin);

        let (left, right) = if start.1 <= line_str.len() {
            line_str.split_at(start.1)
        } else {
            (*line_str, "")
        };

        let annotated = if start.0 != end.0 {
            format!("{left}{}", right.red())
        } else {
            let width = (end.1.saturating_sub(start.1)).min(right.len());
            let (err_str, after_err) = right.split_at(width);
            format!("{left}{}{after_err}", err_str.red())
        };

        format!("{fill} |\n{} |{annotated}\n{fill} | {msg}", start.0)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.0, self.start.1, self.end.0, self.end.1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_span_has_empty_source() {
        let span = Span::default();
        assert_eq!(span.source, "");
        assert_eq!(span.to_string("oops"), "oops");
    }

    #[test]
    fn renders_single_line_annotation() {
        let span = Span::new((0, 4), (0, 7), "let foo = 1\n");
        let rendered = span.to_string("bad name");
        assert!(rendered.contains("bad name"));
    }
}
