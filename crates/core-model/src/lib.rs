//! The pane model: buffer, viewport, and auxiliary sinks behind one
//! boundary.
//!
//! `LogPane` owns the whole pane state and exposes the five boundary
//! operations hosts drive: feed, resize, scroll, follow-toggle, render.
//! `HostPane` is the capability interface a host event loop binds to
//! (translate native events into `PaneEvent`s, apply the returned commands),
//! so the core carries no dependency on any particular framework.
//!
//! Appends may come from arbitrary producer threads while scroll and render
//! run on the UI thread. `PaneHandle` is that mutual-exclusion boundary: a
//! clone-able `Arc<Mutex<LogPane>>` which also implements `std::io::Write`,
//! so logging tools can point straight at the pane.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use core_events::{InputEvent, KeyMap, PaneAction, PaneEvent};
use core_render::{render_view, Frame};
use core_text::LogBuffer;
use core_view::{Direction, PaneView, ViewError};
use tracing::{debug, warn};

/// An auxiliary destination for fed text. Failures are per-sink and never
/// affect the pane buffer.
struct Sink {
    label: String,
    writer: Box<dyn Write + Send>,
}

/// Aggregated sink failures from one `feed_text` call. The buffer append
/// has already succeeded by the time this is produced.
#[derive(Debug)]
pub struct SinkError {
    failures: Vec<(String, io::Error)>,
}

impl SinkError {
    /// The failed sinks as (label, error) pairs.
    pub fn failures(&self) -> &[(String, io::Error)] {
        &self.failures
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sink write(s) failed: ", self.failures.len())?;
        for (i, (label, err)) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{label}: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SinkError {}

/// Instructions handed back to the host after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneCommand {
    Redraw,
    Quit,
}

/// Capability interface the host event loop drives.
pub trait HostPane {
    fn handle(&mut self, event: PaneEvent) -> Vec<PaneCommand>;
    fn render(&self) -> Frame;
}

pub struct LogPane {
    buffer: LogBuffer,
    view: PaneView,
    keymap: KeyMap,
    sinks: Vec<Sink>,
}

impl LogPane {
    pub fn new(width: u16, height: u16) -> Result<Self, ViewError> {
        Ok(Self {
            buffer: LogBuffer::new(),
            view: PaneView::new(width, height)?,
            keymap: KeyMap::default(),
            sinks: Vec::new(),
        })
    }

    /// Construct with seed text already in the buffer (split on line breaks
    /// exactly like later feeds).
    pub fn with_initial_text(width: u16, height: u16, text: &str) -> Result<Self, ViewError> {
        let mut pane = Self::new(width, height)?;
        pane.buffer.append(text);
        pane.view.on_append(&pane.buffer);
        Ok(pane)
    }

    pub fn set_key_map(&mut self, keymap: KeyMap) {
        self.keymap = keymap;
    }

    /// Register an auxiliary sink receiving every fed byte verbatim.
    pub fn add_sink(&mut self, label: impl Into<String>, writer: Box<dyn Write + Send>) {
        self.sinks.push(Sink {
            label: label.into(),
            writer,
        });
    }

    pub fn follow(&self) -> bool {
        self.view.follow()
    }

    pub fn set_follow(&mut self, follow: bool) {
        self.view.set_follow(follow, &self.buffer);
    }

    pub fn toggle_follow(&mut self) {
        self.view.toggle_follow(&self.buffer);
    }

    /// Append bytes as logical lines, then fan them out to every sink.
    ///
    /// The buffer append always succeeds and is never rolled back; sink
    /// failures are independent per sink, collected, and returned as one
    /// aggregated error.
    pub fn feed_text(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let text = String::from_utf8_lossy(bytes);
        let added = self.buffer.append(&text);
        self.view.on_append(&self.buffer);
        debug!(
            target: "pane.feed",
            size_bytes = bytes.len(),
            lines = added.len(),
            follow = self.view.follow(),
            "feed"
        );

        let mut failures = Vec::new();
        for sink in &mut self.sinks {
            let outcome = sink.writer.write_all(bytes).and_then(|()| sink.writer.flush());
            if let Err(e) = outcome {
                warn!(target: "pane.feed", sink = sink.label.as_str(), error = %e, "sink_write_failed");
                failures.push((sink.label.clone(), e));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError { failures })
        }
    }

    /// Apply a new geometry. Zero dimensions are rejected with prior state
    /// untouched.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<(), ViewError> {
        self.view.resize(width, height, &self.buffer)
    }

    /// Move one display row; `false` means the buffer boundary was already
    /// reached.
    pub fn scroll(&mut self, dir: Direction) -> bool {
        self.view.scroll(&self.buffer, dir)
    }

    /// Materialize the current display grid. Pure read.
    pub fn render(&self) -> Frame {
        render_view(&self.view)
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }
}

impl HostPane for LogPane {
    fn handle(&mut self, event: PaneEvent) -> Vec<PaneCommand> {
        match event {
            PaneEvent::Input(InputEvent::Key(key)) => match self.keymap.action_for(&key) {
                Some(PaneAction::ScrollUp) => redraw_if(self.scroll(Direction::Up)),
                Some(PaneAction::ScrollDown) => redraw_if(self.scroll(Direction::Down)),
                Some(PaneAction::ToggleFollow) => {
                    self.toggle_follow();
                    vec![PaneCommand::Redraw]
                }
                Some(PaneAction::Quit) => vec![PaneCommand::Quit],
                None => Vec::new(),
            },
            PaneEvent::Input(InputEvent::Resize(w, h)) => match self.resize(w, h) {
                Ok(()) => vec![PaneCommand::Redraw],
                Err(e) => {
                    warn!(target: "pane.view", error = %e, "resize_rejected");
                    Vec::new()
                }
            },
            PaneEvent::Input(InputEvent::CtrlC) => vec![PaneCommand::Quit],
            PaneEvent::Feed(text) => {
                if let Err(e) = self.feed_text(text.as_bytes()) {
                    warn!(target: "pane.feed", error = %e, "feed_sink_failures");
                }
                vec![PaneCommand::Redraw]
            }
            PaneEvent::RenderRequested => vec![PaneCommand::Redraw],
            PaneEvent::Shutdown => vec![PaneCommand::Quit],
        }
    }

    fn render(&self) -> Frame {
        LogPane::render(self)
    }
}

fn redraw_if(moved: bool) -> Vec<PaneCommand> {
    if moved {
        vec![PaneCommand::Redraw]
    } else {
        Vec::new()
    }
}

/// Clone-able, thread-safe handle to a `LogPane`.
///
/// This is the mutual-exclusion boundary between UI-thread operations and
/// appends arriving from arbitrary producers. The `Write` impl appends the
/// bytes and reports success as long as the buffer took them; sink
/// failures are logged rather than surfaced, since the primary write did
/// land.
#[derive(Clone)]
pub struct PaneHandle {
    inner: Arc<Mutex<LogPane>>,
}

impl PaneHandle {
    pub fn new(pane: LogPane) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pane)),
        }
    }

    /// Lock the pane for a batch of operations. Poisoning means a panic
    /// mid-mutation; the state is unrecoverable, so fail fast.
    pub fn lock(&self) -> MutexGuard<'_, LogPane> {
        self.inner.lock().expect("pane mutex poisoned")
    }
}

impl Write for PaneHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Err(e) = self.lock().feed_text(buf) {
            warn!(target: "pane.feed", error = %e, "sink_failures_from_writer");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
