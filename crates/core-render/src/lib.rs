//! Frame assembly: a fixed-geometry character grid composed from the
//! viewport's visible rows.
//!
//! The renderer is a pure read. It never touches the persisted cursor and
//! always emits exactly `height` rows of exactly `width` cells: sub-lines
//! are padded with blanks on the right, and rows past the end of the
//! content are entirely blank. One `char` is one cell; display-width
//! variance of wide glyphs is out of scope here.

use core_view::PaneView;

/// A rendered character grid. Every row has exactly `width` chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    rows: Vec<String>,
}

impl Frame {
    /// An all-blank frame of the given geometry.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![" ".repeat(width); height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Row `y`, or `None` past the bottom.
    pub fn row(&self, y: usize) -> Option<&str> {
        self.rows.get(y).map(String::as_str)
    }
}

/// Compose a frame for a viewport: the idiomatic entry point for hosts.
pub fn render_view(view: &PaneView) -> Frame {
    compose(view.width(), view.height(), view.visible_rows())
}

/// Compose a frame from at most `height` visible sub-lines. Shorter content
/// is padded with blank rows; each sub-line is padded to `width` cells.
pub fn compose<'a>(
    width: usize,
    height: usize,
    visible: impl Iterator<Item = &'a str>,
) -> Frame {
    let mut rows = Vec::with_capacity(height);
    for sub in visible.take(height) {
        rows.push(pad(sub, width));
    }
    while rows.len() < height {
        rows.push(" ".repeat(width));
    }
    Frame {
        width,
        height,
        rows,
    }
}

fn pad(sub: &str, width: usize) -> String {
    let cells = sub.chars().count();
    debug_assert!(
        cells <= width,
        "sub-line of {cells} cells wider than pane width {width}"
    );
    let mut row = String::with_capacity(width);
    row.extend(sub.chars().take(width));
    for _ in cells.min(width)..width {
        row.push(' ');
    }
    row
}
