//! Whitespace-aware word wrapping.
//!
//! `wrap_line` turns one logical line into the ordered sub-lines shown for
//! it at a given width. Breaks prefer the most recent whitespace; the
//! whitespace consumed by a soft break is dropped for good, so the product
//! is not byte-for-byte reversible.
//!
//! Character-cell semantics: one `char` occupies one cell, wide and
//! combining characters included. That keeps the arithmetic exact for the
//! grid the renderer emits, at the cost of terminal-accurate alignment for
//! CJK and emoji.
//!
//! Guarantees:
//! * every sub-line has at most `max_width` chars;
//! * a line whose length is an exact multiple of `max_width` wraps into
//!   exactly `len / max_width` sub-lines, no empty trailing sub-line and no
//!   dropped character;
//! * an empty line yields one empty sub-line, so every logical line
//!   contributes at least one display row.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WrapError {
    /// Zero-width requests are rejected rather than clamped; a silent
    /// minimum would hide a broken resize path upstream.
    #[error("wrap width must be at least one column")]
    ZeroWidth,
}

/// One logical line wrapped at a fixed width: an ordered, never-empty list
/// of sub-lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    subs: Vec<String>,
}

impl DisplayLine {
    pub fn subs(&self) -> &[String] {
        &self.subs
    }

    pub fn sub(&self, idx: usize) -> Option<&str> {
        self.subs.get(idx).map(String::as_str)
    }

    /// Number of display rows this line occupies (always at least one).
    pub fn rows(&self) -> usize {
        self.subs.len()
    }

    /// Index of the last sub-line.
    pub fn last_index(&self) -> usize {
        self.subs.len() - 1
    }
}

/// Wrap a single break-free logical line at `max_width` character cells.
///
/// Left-to-right scan tracking the most recent whitespace since the last
/// break. When a character no longer fits in the running segment, break at
/// that whitespace when one exists (the whitespace itself is consumed),
/// otherwise break hard at exactly `max_width` chars.
pub fn wrap_line(line: &str, max_width: usize) -> Result<DisplayLine, WrapError> {
    if max_width == 0 {
        return Err(WrapError::ZeroWidth);
    }
    let chars: Vec<char> = line.chars().collect();
    let mut subs: Vec<String> = Vec::new();
    let mut start = 0usize;
    let mut last_ws: Option<usize> = None;
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_whitespace() {
            last_ws = Some(i);
        }
        if i - start + 1 > max_width {
            match last_ws {
                Some(ws) if ws >= start => {
                    subs.push(chars[start..ws].iter().collect());
                    start = ws + 1;
                }
                _ => {
                    subs.push(chars[start..start + max_width].iter().collect());
                    start = i;
                }
            }
        }
    }
    if start < chars.len() || subs.is_empty() {
        subs.push(chars[start..].iter().collect());
    }
    Ok(DisplayLine { subs })
}
