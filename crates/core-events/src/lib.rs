//! Event types, key bindings, and async event-source plumbing for the pane
//! runtime.
//!
//! The pane core is a synchronous state machine; everything here exists so
//! hosts can translate their native input into the five boundary operations
//! and drive them through one bounded channel. Producers use `blocking_send`
//! (or `send().await`) against the channel; with a single consumer the
//! backpressure simply parks the producer instead of dropping events.

use std::fmt;

use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// Capacity of the runtime event channel. Generous for keyboard and log
/// traffic while still bounding memory under a stalled consumer.
pub const EVENT_CHANNEL_CAP: usize = 1024;

/// Top-level event consumed by the pane event loop.
#[derive(Debug, Clone)]
pub enum PaneEvent {
    Input(InputEvent),
    /// Raw text handed to the pane: appended to the buffer and fanned out
    /// to the auxiliary sinks.
    Feed(String),
    /// A producer mutated the pane through a shared handle and wants a
    /// repaint.
    RenderRequested,
    Shutdown,
}

/// Normalized input events.
#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(KeyEvent),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
    /// Interrupt surfaced distinctly so hosts can treat it as quit even
    /// when no binding matches.
    CtrlC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::empty(),
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

/// Normalized logical key representations consumed by the key map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
}

impl KeyCode {
    /// Parse a config-file key name: a single character stands for itself,
    /// named keys are matched case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Some(KeyCode::Char(ch));
        }
        match name.to_ascii_lowercase().as_str() {
            "enter" => Some(KeyCode::Enter),
            "esc" | "escape" => Some(KeyCode::Esc),
            "backspace" => Some(KeyCode::Backspace),
            "tab" => Some(KeyCode::Tab),
            "up" => Some(KeyCode::Up),
            "down" => Some(KeyCode::Down),
            "left" => Some(KeyCode::Left),
            "right" => Some(KeyCode::Right),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

/// Pane operations a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneAction {
    ScrollUp,
    ScrollDown,
    ToggleFollow,
    Quit,
}

/// Key-binding table mapping normalized keys to pane actions.
///
/// Defaults mirror the classic pager bindings: `j`/Down and `k`/Up scroll,
/// `S` toggles stick-to-bottom, `q`/Esc quits the host.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(KeyCode, PaneAction)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            bindings: vec![
                (KeyCode::Char('k'), PaneAction::ScrollUp),
                (KeyCode::Up, PaneAction::ScrollUp),
                (KeyCode::Char('j'), PaneAction::ScrollDown),
                (KeyCode::Down, PaneAction::ScrollDown),
                (KeyCode::Char('S'), PaneAction::ToggleFollow),
                (KeyCode::Char('q'), PaneAction::Quit),
                (KeyCode::Esc, PaneAction::Quit),
            ],
        }
    }
}

impl KeyMap {
    /// Resolve a key to its action. CTRL/ALT chords never match plain
    /// bindings; SHIFT is ignored so `S` arrives as expected.
    pub fn action_for(&self, key: &KeyEvent) -> Option<PaneAction> {
        if key.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) {
            return None;
        }
        self.bindings
            .iter()
            .find(|(code, _)| *code == key.code)
            .map(|(_, action)| *action)
    }

    /// Replace every binding for `action` with the given keys. An empty
    /// list unbinds the action entirely.
    pub fn rebind(&mut self, action: PaneAction, keys: &[KeyCode]) {
        self.bindings.retain(|(_, a)| *a != action);
        for &code in keys {
            self.bindings.push((code, action));
        }
    }
}

/// An async event producer: owns one background task that pushes events
/// into the shared channel and exits promptly when the channel closes.
pub trait EventSource: Send + 'static {
    /// Stable identifier used for logging and diagnostics.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the producer task.
    fn spawn(self: Box<Self>, tx: Sender<PaneEvent>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn EventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: EventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn all registered sources, draining the registry so a second
    /// call cannot double-spawn. The caller keeps ownership of `tx`; each
    /// source gets its own clone and observes shutdown through channel
    /// closure.
    pub fn spawn_all(&mut self, tx: &Sender<PaneEvent>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            tracing::info!(target: "runtime.events", source = src.name(), "spawning event source");
            handles.push(src.spawn(tx.clone()));
        }
        handles
    }
}
