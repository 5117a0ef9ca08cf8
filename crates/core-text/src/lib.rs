//! Append-only logical-line storage.
//!
//! `LogBuffer` is the source of truth for pane text: an ordered sequence of
//! logical lines that only ever grows. Line breaks never survive into a
//! stored line; raw text is split at the boundary on arrival so wrapping and
//! scrolling deal exclusively in break-free lines.
//!
//! Construction and later appends split with the same rule. Historically
//! line boundaries could depend on whether text arrived up front or streamed
//! in later; here `from_text` and `append` share one splitter so they cannot
//! diverge.

pub mod wrap;

pub use wrap::{DisplayLine, WrapError, wrap_line};

use std::ops::Range;

/// Ordered, append-only sequence of logical lines.
#[derive(Debug, Default, Clone)]
pub struct LogBuffer {
    lines: Vec<String>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a buffer from raw text, splitting on line breaks.
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new();
        buf.append(text);
        buf
    }

    /// Append raw text as zero or more logical lines, returning the index
    /// range of the lines added.
    ///
    /// Splitting rules:
    /// * each `\n` ends a line; a `\r` directly before it is stripped, so
    ///   CRLF input behaves as LF;
    /// * a trailing fragment without a terminating break is kept as a final
    ///   line;
    /// * a terminating break does not add an empty final line, and appending
    ///   an empty string adds nothing.
    pub fn append(&mut self, text: &str) -> Range<usize> {
        let start = self.lines.len();
        let mut rest = text;
        while let Some(pos) = rest.find('\n') {
            self.lines.push(strip_cr(&rest[..pos]).to_string());
            rest = &rest[pos + 1..];
        }
        if !rest.is_empty() {
            self.lines.push(strip_cr(rest).to_string());
        }
        start..self.lines.len()
    }

    /// Total number of logical lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The requested logical line, or `None` past the end.
    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Iterate all logical lines in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
