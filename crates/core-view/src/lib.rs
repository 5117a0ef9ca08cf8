//! Viewport state and the row-granular scroll engine.
//!
//! `PaneView` owns the pane geometry, the cursor (top logical line plus
//! sub-line within its wrapped form), the stick-to-bottom flag, and the
//! materialized display window: a `VecDeque` of wrapped lines covering the
//! viewport. Crossing a logical-line boundary slides the window by one slot
//! instead of re-wrapping the whole visible region; only a resize pays for a
//! full regeneration.
//!
//! Invariants:
//! * `width >= 1` and `height >= 1`; zero is rejected at construction and
//!   resize, leaving prior state untouched.
//! * The window is non-empty whenever the buffer is non-empty, and
//!   `window[i]` is `buffer[top_line + i]` wrapped at the current width.
//! * `top_sub` always indexes into `window[0]`.
//! * Coverage: the window extends at least one row past the viewport or to
//!   the end of the buffer, so the bottom-boundary decision never needs a
//!   full re-wrap.
//! * `follow == true` keeps the cursor at the bottom anchor: the last
//!   rendered row is the final sub-line of the final logical line, or all
//!   content fits and the cursor is at the origin.

use std::collections::VecDeque;

use core_text::{DisplayLine, LogBuffer, wrap_line};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("pane width must be at least one column")]
    ZeroWidth,
    #[error("pane height must be at least one row")]
    ZeroHeight,
}

/// Scroll direction for the single-row movement operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug)]
pub struct PaneView {
    width: usize,
    height: usize,
    top_line: usize,
    top_sub: usize,
    follow: bool,
    window: VecDeque<DisplayLine>,
}

impl PaneView {
    pub fn new(width: u16, height: u16) -> Result<Self, ViewError> {
        let (width, height) = validate(width, height)?;
        Ok(Self {
            width,
            height,
            top_line: 0,
            top_sub: 0,
            follow: false,
            window: VecDeque::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    /// Current cursor as (logical line index, sub-line index).
    pub fn cursor(&self) -> (usize, usize) {
        (self.top_line, self.top_sub)
    }

    /// Move the cursor one display row in `dir`. Returns whether movement
    /// occurred; hitting a buffer boundary is a normal outcome, not an
    /// error.
    pub fn scroll(&mut self, buffer: &LogBuffer, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.scroll_up(buffer),
            Direction::Down => self.scroll_down(buffer),
        }
    }

    /// One row up: within the top line's sub-lines first, then onto the
    /// previous logical line's last sub-line. False at the very top.
    pub fn scroll_up(&mut self, buffer: &LogBuffer) -> bool {
        if self.top_sub > 0 {
            self.top_sub -= 1;
            self.trim();
            return true;
        }
        if self.top_line == 0 {
            return false;
        }
        self.top_line -= 1;
        let line = self.wrap(buffer, self.top_line);
        self.top_sub = line.last_index();
        self.window.push_front(line);
        self.trim();
        true
    }

    /// One row down. False once the rows from the cursor to the end of the
    /// buffer fit within the viewport, so the view can never scroll past a
    /// bottom-anchored final sub-line.
    pub fn scroll_down(&mut self, buffer: &LogBuffer) -> bool {
        self.refill(buffer);
        if self.rows_from_cursor() <= self.height {
            return false;
        }
        let first_rows = self
            .window
            .front()
            .map(DisplayLine::rows)
            .expect("rows below the viewport imply a non-empty window");
        if self.top_sub + 1 < first_rows {
            self.top_sub += 1;
        } else {
            self.window.pop_front();
            self.top_line += 1;
            self.top_sub = 0;
        }
        self.refill(buffer);
        self.trim();
        true
    }

    /// Flip stick-to-bottom. Enabling seats the cursor so the final
    /// sub-line of the final line lands on the last row; disabling freezes
    /// the view where it sits.
    pub fn toggle_follow(&mut self, buffer: &LogBuffer) {
        self.set_follow(!self.follow, buffer);
    }

    pub fn set_follow(&mut self, follow: bool, buffer: &LogBuffer) {
        self.follow = follow;
        if follow {
            self.scroll_to_bottom(buffer);
        }
        debug!(target: "pane.scroll", follow, "follow_changed");
    }

    /// React to lines appended to the buffer. Following keeps the newest
    /// content on screen; otherwise the cursor stays put and only the
    /// window is topped up so fresh lines can fill previously blank rows.
    pub fn on_append(&mut self, buffer: &LogBuffer) {
        if self.follow {
            while self.scroll_down(buffer) {}
        } else {
            self.refill(buffer);
        }
    }

    /// Apply a new geometry. Validates both dimensions up front so a
    /// rejected resize leaves no partial state behind. On change the
    /// sub-line cursor resets to the top of the current logical line and
    /// the window is regenerated at the new width; a following view
    /// re-anchors to the bottom immediately.
    pub fn resize(&mut self, width: u16, height: u16, buffer: &LogBuffer) -> Result<(), ViewError> {
        let (width, height) = validate(width, height)?;
        if width == self.width && height == self.height {
            return Ok(());
        }
        trace!(
            target: "pane.view",
            from_width = self.width,
            from_height = self.height,
            width,
            height,
            "resize"
        );
        self.width = width;
        self.height = height;
        if self.follow {
            self.scroll_to_bottom(buffer);
        } else {
            self.rebuild(buffer);
        }
        Ok(())
    }

    /// Change the wrap width only. No-op when unchanged.
    pub fn set_width(&mut self, width: u16, buffer: &LogBuffer) -> Result<(), ViewError> {
        self.resize(width, self.height as u16, buffer)
    }

    /// Change the viewport height only. No-op when unchanged.
    pub fn set_height(&mut self, height: u16, buffer: &LogBuffer) -> Result<(), ViewError> {
        self.resize(self.width as u16, height, buffer)
    }

    /// Visible sub-lines from the cursor, at most `height` of them. A pure
    /// read walking local copies of the window pointers; the persisted
    /// cursor never moves.
    pub fn visible_rows(&self) -> impl Iterator<Item = &str> {
        let window = &self.window;
        let height = self.height;
        let mut line_idx = 0usize;
        let mut sub_idx = self.top_sub;
        let mut emitted = 0usize;
        std::iter::from_fn(move || {
            if emitted >= height {
                return None;
            }
            let line = window.get(line_idx)?;
            let sub = line.sub(sub_idx)?;
            emitted += 1;
            if sub_idx + 1 < line.rows() {
                sub_idx += 1;
            } else {
                line_idx += 1;
                sub_idx = 0;
            }
            Some(sub)
        })
    }

    fn scroll_to_bottom(&mut self, buffer: &LogBuffer) {
        self.top_line = buffer.len().saturating_sub(self.height);
        self.rebuild(buffer);
        while self.scroll_down(buffer) {}
    }

    /// Regenerate the window from scratch at the current geometry, keeping
    /// the logical line but resetting the sub-line cursor.
    fn rebuild(&mut self, buffer: &LogBuffer) {
        self.window.clear();
        self.top_sub = 0;
        if buffer.is_empty() {
            self.top_line = 0;
            return;
        }
        if self.top_line >= buffer.len() {
            self.top_line = buffer.len() - 1;
        }
        self.refill(buffer);
    }

    /// Extend the window from the back until it covers at least one row
    /// past the viewport or the buffer runs out.
    fn refill(&mut self, buffer: &LogBuffer) {
        if self.window.is_empty() {
            if self.top_line >= buffer.len() {
                return;
            }
            let line = self.wrap(buffer, self.top_line);
            self.window.push_back(line);
        }
        while self.rows_from_cursor() <= self.height && !self.window_exhausts(buffer) {
            let next = self.top_line + self.window.len();
            let line = self.wrap(buffer, next);
            self.window.push_back(line);
        }
    }

    /// Drop trailing window lines wholly below the viewport and its one-row
    /// lookahead, keeping the slid window bounded.
    fn trim(&mut self) {
        while self.window.len() > 1 {
            let back_rows = self
                .window
                .back()
                .map(DisplayLine::rows)
                .unwrap_or_default();
            if self.rows_from_cursor() - back_rows > self.height {
                self.window.pop_back();
            } else {
                break;
            }
        }
    }

    /// Display rows from the cursor through the end of the materialized
    /// window.
    fn rows_from_cursor(&self) -> usize {
        self.window
            .iter()
            .enumerate()
            .map(|(i, line)| if i == 0 { line.rows() - self.top_sub } else { line.rows() })
            .sum()
    }

    fn window_exhausts(&self, buffer: &LogBuffer) -> bool {
        self.top_line + self.window.len() >= buffer.len()
    }

    fn wrap(&self, buffer: &LogBuffer, idx: usize) -> DisplayLine {
        let line = buffer
            .line(idx)
            .expect("window indices stay within buffer bounds");
        wrap_line(line, self.width).expect("pane width is validated non-zero")
    }
}

fn validate(width: u16, height: u16) -> Result<(usize, usize), ViewError> {
    if width == 0 {
        return Err(ViewError::ZeroWidth);
    }
    if height == 0 {
        return Err(ViewError::ZeroHeight);
    }
    Ok((usize::from(width), usize::from(height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(width: u16, height: u16) -> PaneView {
        PaneView::new(width, height).unwrap()
    }

    fn filled(width: u16, height: u16, text: &str) -> (PaneView, LogBuffer) {
        let buffer = LogBuffer::from_text(text);
        let mut v = view(width, height);
        v.on_append(&buffer);
        (v, buffer)
    }

    fn rows(v: &PaneView) -> Vec<String> {
        v.visible_rows().map(str::to_string).collect()
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(PaneView::new(0, 5).unwrap_err(), ViewError::ZeroWidth);
        assert_eq!(PaneView::new(5, 0).unwrap_err(), ViewError::ZeroHeight);
    }

    #[test]
    fn rejected_resize_leaves_state_untouched() {
        let (mut v, buf) = filled(4, 3, "one\ntwo\nthree\nfour\nfive\n");
        assert!(v.scroll_down(&buf));
        let cursor = v.cursor();
        assert_eq!(v.resize(0, 7, &buf), Err(ViewError::ZeroWidth));
        assert_eq!(v.resize(7, 0, &buf), Err(ViewError::ZeroHeight));
        assert_eq!(v.cursor(), cursor);
        assert_eq!(v.width(), 4);
        assert_eq!(v.height(), 3);
    }

    #[test]
    fn scroll_up_at_top_is_a_boundary() {
        let (mut v, buf) = filled(10, 3, "a\nb\nc\nd\ne\n");
        assert!(!v.scroll_up(&buf));
        assert_eq!(v.cursor(), (0, 0));
    }

    #[test]
    fn scroll_down_at_bottom_is_a_boundary() {
        let (mut v, buf) = filled(10, 3, "a\nb\nc\nd\ne\n");
        assert!(v.scroll_down(&buf));
        assert!(v.scroll_down(&buf));
        // Rows c, d, e fill the viewport; no further movement.
        assert!(!v.scroll_down(&buf));
        assert_eq!(v.cursor(), (2, 0));
        assert_eq!(rows(&v), vec!["c", "d", "e"]);
    }

    #[test]
    fn content_shorter_than_viewport_never_scrolls() {
        let (mut v, buf) = filled(10, 5, "a\nb\n");
        assert!(!v.scroll_down(&buf));
        assert!(!v.scroll_up(&buf));
        assert_eq!(v.cursor(), (0, 0));
    }

    #[test]
    fn scrolling_walks_sub_lines_before_lines() {
        // "abcdef" wraps to 3 sub-lines at width 2.
        let (mut v, buf) = filled(2, 2, "abcdef\nxy\nzz\n");
        assert_eq!(rows(&v), vec!["ab", "cd"]);
        assert!(v.scroll_down(&buf));
        assert_eq!(v.cursor(), (0, 1));
        assert_eq!(rows(&v), vec!["cd", "ef"]);
        assert!(v.scroll_down(&buf));
        assert_eq!(v.cursor(), (0, 2));
        assert!(v.scroll_down(&buf));
        assert_eq!(v.cursor(), (1, 0));
        assert_eq!(rows(&v), vec!["xy", "zz"]);
    }

    #[test]
    fn up_then_down_restores_the_cursor() {
        let (mut v, buf) = filled(2, 2, "abcdef\nxy\nzz\nqq\n");
        for _ in 0..3 {
            assert!(v.scroll_down(&buf));
        }
        let cursor = v.cursor();
        assert!(v.scroll_up(&buf));
        assert!(v.scroll_down(&buf));
        assert_eq!(v.cursor(), cursor);
        assert!(v.scroll_down(&buf));
        assert!(v.scroll_up(&buf));
        assert_eq!(v.cursor(), cursor);
    }

    #[test]
    fn scroll_up_enters_previous_line_at_its_last_sub_line() {
        let (mut v, buf) = filled(2, 2, "abcdef\nxy\nzz\n");
        for _ in 0..3 {
            assert!(v.scroll_down(&buf));
        }
        assert_eq!(v.cursor(), (1, 0));
        assert!(v.scroll_up(&buf));
        assert_eq!(v.cursor(), (0, 2));
        assert_eq!(rows(&v), vec!["ef", "xy"]);
    }

    #[test]
    fn follow_lands_final_sub_line_on_last_row() {
        // Three lines of three sub-lines each at width 2, viewport of 5.
        let (mut v, buf) = filled(2, 5, "aabbcc\nddeeff\ngghhii\n");
        v.set_follow(true, &buf);
        assert_eq!(
            rows(&v),
            vec!["ee", "ff", "gg", "hh", "ii"],
            "last row must be the final sub-line"
        );
        assert_eq!(v.cursor(), (1, 1));
        assert!(!v.scroll_down(&buf));
    }

    #[test]
    fn follow_on_short_content_stays_at_origin() {
        let (mut v, buf) = filled(4, 5, "asdfg\n");
        v.set_follow(true, &buf);
        assert_eq!(v.cursor(), (0, 0));
        assert_eq!(rows(&v), vec!["asdf", "g"]);
    }

    #[test]
    fn append_while_following_tracks_new_content() {
        let mut buffer = LogBuffer::from_text("one\ntwo\n");
        let mut v = view(10, 3);
        v.on_append(&buffer);
        v.set_follow(true, &buffer);
        for i in 0..10 {
            buffer.append(&format!("line-{i}\n"));
            v.on_append(&buffer);
        }
        assert_eq!(rows(&v), vec!["line-7", "line-8", "line-9"]);
    }

    #[test]
    fn append_while_frozen_keeps_the_top_row() {
        let mut buffer = LogBuffer::from_text("one\ntwo\n");
        let mut v = view(10, 3);
        v.on_append(&buffer);
        let before = rows(&v)[0].clone();
        buffer.append("three\nfour\nfive\n");
        v.on_append(&buffer);
        assert_eq!(rows(&v)[0], before);
        // The previously blank third row now shows fresh content.
        assert_eq!(rows(&v), vec!["one", "two", "three"]);
    }

    #[test]
    fn toggle_off_freezes_the_view() {
        let mut buffer = LogBuffer::from_text("a\nb\nc\nd\ne\nf\n");
        let mut v = view(10, 3);
        v.on_append(&buffer);
        v.toggle_follow(&buffer);
        assert!(v.follow());
        let anchored = v.cursor();
        v.toggle_follow(&buffer);
        assert!(!v.follow());
        assert_eq!(v.cursor(), anchored);
        buffer.append("g\nh\n");
        v.on_append(&buffer);
        assert_eq!(v.cursor(), anchored);
    }

    #[test]
    fn width_change_resets_sub_line_and_rewraps() {
        let (mut v, buf) = filled(2, 4, "abcdef\nzz\nyy\nxx\n");
        assert!(v.scroll_down(&buf));
        assert_eq!(v.cursor(), (0, 1));
        v.resize(3, 4, &buf).unwrap();
        assert_eq!(v.cursor(), (0, 0));
        assert_eq!(rows(&v), vec!["abc", "def", "zz", "yy"]);
    }

    #[test]
    fn resize_to_same_geometry_is_a_no_op() {
        let (mut v, buf) = filled(2, 2, "abcdef\nzz\n");
        assert!(v.scroll_down(&buf));
        let cursor = v.cursor();
        v.resize(2, 2, &buf).unwrap();
        assert_eq!(v.cursor(), cursor);
    }

    #[test]
    fn resize_while_following_re_anchors() {
        let (mut v, buf) = filled(10, 2, "a\nb\nc\nd\ne\n");
        v.set_follow(true, &buf);
        assert_eq!(rows(&v), vec!["d", "e"]);
        v.resize(10, 4, &buf).unwrap();
        assert_eq!(rows(&v), vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn rewrap_preserves_every_character() {
        let text = "alpha beta gamma\ndelta\nepsilon zeta\n";
        let (mut v, buf) = filled(5, 4, text);
        for width in [3u16, 7, 11, 2] {
            v.resize(width, 4, &buf).unwrap();
            for (idx, line) in buf.iter().enumerate() {
                let wrapped = wrap_line(line, usize::from(width)).unwrap();
                let joined: String = wrapped.subs().concat();
                let original: String = line.chars().filter(|c| !c.is_whitespace()).collect();
                let kept: String = joined.chars().filter(|c| !c.is_whitespace()).collect();
                assert_eq!(kept, original, "line {idx} lost characters at width {width}");
            }
        }
    }

    #[test]
    fn empty_buffer_has_no_visible_rows() {
        let buffer = LogBuffer::new();
        let mut v = view(3, 2);
        v.on_append(&buffer);
        assert_eq!(rows(&v), Vec::<String>::new());
        assert!(!v.scroll_down(&buffer));
        assert!(!v.scroll_up(&buffer));
    }

    #[test]
    fn window_stays_bounded_after_long_upward_scrolls() {
        let mut buffer = LogBuffer::new();
        for i in 0..200 {
            buffer.append(&format!("row-{i}\n"));
        }
        let mut v = view(10, 4);
        v.set_follow(true, &buffer);
        v.on_append(&buffer);
        v.set_follow(false, &buffer);
        for _ in 0..150 {
            v.scroll_up(&buffer);
        }
        assert!(v.window.len() <= v.height + 2, "window grew unbounded");
        assert_eq!(rows(&v).len(), 4);
    }
}
