//! Tailpane entrypoint.
//!
//! The binary is the host: it enters the terminal session, translates
//! crossterm events into `PaneEvent`s, pumps them through the pane model,
//! and paints the resulting frames. Text arrives on stdin and is appended
//! through the shared `PaneHandle` from a producer task, exactly the path
//! an embedding application's logger would use.

use std::fs::OpenOptions;
use std::io::{stdout, BufRead, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use clap::Parser;
use core_config::Config;
use core_events::{
    EventSource, EventSourceRegistry, InputEvent, KeyCode, KeyEvent, KeyModifiers, PaneEvent,
    EVENT_CHANNEL_CAP,
};
use core_model::{HostPane, LogPane, PaneCommand, PaneHandle};
use core_render::Frame;
use core_terminal::{CrosstermBackend, TerminalBackend};
use crossterm::event::{
    Event as CEvent, EventStream, KeyCode as CKeyCode, KeyEventKind as CKind,
    KeyModifiers as CMods,
};
use crossterm::{cursor::MoveTo, queue, style::Print};
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "tailpane", version, about = "Scrollable log pane fed from stdin")]
struct Args {
    /// Optional file whose contents seed the pane before stdin is tailed.
    pub path: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `tailpane.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Duplicate everything fed to the pane into this file (repeatable).
    #[arg(long = "sink")]
    pub sinks: Vec<PathBuf>,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("tailpane.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }
        let file_appender = tracing_appender::rolling::never(log_dir, "tailpane.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(()) => self.log_guard = Some(guard),
            Err(_) => {
                // A global subscriber is already installed; drop the guard so
                // the spare writer shuts down.
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

/// Seed text read at startup, if any.
fn load_initial_text(args: &Args) -> String {
    let Some(path) = args.path.as_ref() else {
        return String::new();
    };
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(target: "io", file = %path.display(), size_bytes = content.len(), "seed_read_ok");
            content
        }
        Err(e) => {
            error!(target: "io", file = %path.display(), ?e, "seed_open_error");
            String::new()
        }
    }
}

fn open_sinks(pane: &mut LogPane, config: &Config, args: &Args) {
    let paths = config.sink_files().iter().chain(args.sinks.iter());
    for path in paths {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                info!(target: "runtime", sink = %path.display(), "sink_attached");
                pane.add_sink(path.display().to_string(), Box::new(file));
            }
            Err(e) => {
                warn!(target: "runtime", sink = %path.display(), error = %e, "sink_open_failed");
            }
        }
    }
}

fn build_pane(args: &Args, config: &Config, width: u16, height: u16) -> Result<LogPane> {
    let initial = load_initial_text(args);
    let mut pane = LogPane::with_initial_text(width, height, &initial)
        .context("terminal reported an unusable size")?;
    pane.set_key_map(config.key_map());
    open_sinks(&mut pane, config, args);
    pane.set_follow(config.follow_on_start());
    Ok(pane)
}

/// Crossterm input events translated onto the pane event vocabulary.
struct TerminalInputSource;

impl EventSource for TerminalInputSource {
    fn name(&self) -> &'static str {
        "terminal_input"
    }

    fn spawn(self: Box<Self>, tx: Sender<PaneEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut stream = EventStream::new();
            while let Some(item) = stream.next().await {
                let event = match item {
                    Ok(ev) => ev,
                    Err(e) => {
                        warn!(target: "input", error = %e, "event_stream_error");
                        break;
                    }
                };
                let Some(input) = translate(event) else {
                    continue;
                };
                if tx.send(PaneEvent::Input(input)).await.is_err() {
                    break;
                }
            }
            debug!(target: "input", "terminal input source stopped");
        })
    }
}

/// Stdin feeder: appends through the shared handle, then nudges the UI loop
/// for a repaint. This is the same concurrent-append path an embedding
/// application's log writer takes.
///
/// The reader runs on a detached OS thread rather than the blocking pool: a
/// thread parked in `read_line` must not keep runtime shutdown waiting. The
/// spawned task merely mirrors channel closure so the registry handle
/// resolves.
struct StdinFeedSource {
    handle: PaneHandle,
}

impl EventSource for StdinFeedSource {
    fn name(&self) -> &'static str {
        "stdin_feed"
    }

    fn spawn(self: Box<Self>, tx: Sender<PaneEvent>) -> JoinHandle<()> {
        let mut writer = self.handle;
        let feed_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut reader = stdin.lock();
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if writer.write_all(line.as_bytes()).is_err() {
                            break;
                        }
                        if feed_tx.blocking_send(PaneEvent::RenderRequested).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(target: "input", error = %e, "stdin_read_error");
                        break;
                    }
                }
            }
            debug!(target: "input", "stdin feed source stopped");
        });
        tokio::spawn(async move {
            tx.closed().await;
        })
    }
}

fn translate(event: CEvent) -> Option<InputEvent> {
    match event {
        CEvent::Key(key) if key.kind == CKind::Press => {
            if key.modifiers.contains(CMods::CONTROL) && key.code == CKeyCode::Char('c') {
                return Some(InputEvent::CtrlC);
            }
            let code = match key.code {
                CKeyCode::Char(c) => KeyCode::Char(c),
                CKeyCode::Enter => KeyCode::Enter,
                CKeyCode::Esc => KeyCode::Esc,
                CKeyCode::Backspace => KeyCode::Backspace,
                CKeyCode::Tab => KeyCode::Tab,
                CKeyCode::Up => KeyCode::Up,
                CKeyCode::Down => KeyCode::Down,
                CKeyCode::Left => KeyCode::Left,
                CKeyCode::Right => KeyCode::Right,
                _ => return None,
            };
            let mut mods = KeyModifiers::empty();
            if key.modifiers.contains(CMods::CONTROL) {
                mods |= KeyModifiers::CTRL;
            }
            if key.modifiers.contains(CMods::ALT) {
                mods |= KeyModifiers::ALT;
            }
            if key.modifiers.contains(CMods::SHIFT) {
                mods |= KeyModifiers::SHIFT;
            }
            Some(InputEvent::Key(KeyEvent { code, mods }))
        }
        CEvent::Resize(w, h) => Some(InputEvent::Resize(w, h)),
        _ => None,
    }
}

fn paint(frame: &Frame) -> Result<()> {
    let mut out = stdout();
    for (y, row) in frame.rows().iter().enumerate() {
        queue!(out, MoveTo(0, y as u16), Print(row))?;
    }
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let config = core_config::load_from(args.config.clone())?;

    startup.backend.set_title("tailpane")?;
    let _guard = startup.backend.enter_guard()?;
    let (width, height) = core_terminal::dimensions().context("query terminal size")?;

    let pane = build_pane(&args, &config, width, height)?;
    let handle = PaneHandle::new(pane);

    let (tx, mut rx) = mpsc::channel::<PaneEvent>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    registry.register(TerminalInputSource);
    registry.register(StdinFeedSource {
        handle: handle.clone(),
    });
    let source_handles = registry.spawn_all(&tx);
    drop(tx);

    paint(&handle.lock().render())?;

    while let Some(event) = rx.recv().await {
        let commands = handle.lock().handle(event);
        let mut quit = false;
        for command in commands {
            match command {
                PaneCommand::Redraw => {
                    let frame = handle.lock().render();
                    paint(&frame)?;
                }
                PaneCommand::Quit => quit = true,
            }
        }
        if quit {
            break;
        }
    }

    // Close the channel before awaiting the producers so they observe the
    // shutdown instead of blocking on a full queue.
    rx.close();
    drop(rx);
    for source in source_handles {
        source.abort();
        let _ = source.await;
    }
    info!(target: "runtime", "shutdown");
    Ok(())
}
