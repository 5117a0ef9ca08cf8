//! Integration-adjacent session test: configuration, key translation, the
//! pane model, and frame composition working together the way the binary
//! drives them.

use core_config::load_from;
use core_events::{InputEvent, KeyCode, KeyEvent, PaneEvent};
use core_model::{HostPane, LogPane, PaneCommand, PaneHandle};
use core_view::Direction;
use std::io::Write;

fn key_event(code: KeyCode) -> PaneEvent {
    PaneEvent::Input(InputEvent::Key(KeyEvent::plain(code)))
}

#[test]
fn keyboard_session_scrolls_follows_and_quits() {
    let cfg_file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        cfg_file.path(),
        "[pane]\nfollow = false\n[keys]\nscroll_up = \"up\"\n",
    )
    .unwrap();
    let config = load_from(Some(cfg_file.path().to_path_buf())).unwrap();

    let mut pane = LogPane::new(6, 3).unwrap();
    pane.set_key_map(config.key_map());
    pane.set_follow(config.follow_on_start());
    assert!(!pane.follow());

    for i in 0..6 {
        pane.handle(PaneEvent::Feed(format!("row-{i}\n")));
    }
    // Frozen view still shows the oldest rows.
    assert_eq!(pane.render().row(0), Some("row-0 "));

    // Default scroll-down binding still applies; the configured Up arrow
    // replaces `k` for scroll-up.
    assert_eq!(
        pane.handle(key_event(KeyCode::Char('j'))),
        vec![PaneCommand::Redraw]
    );
    assert_eq!(pane.render().row(0), Some("row-1 "));
    assert_eq!(
        pane.handle(key_event(KeyCode::Up)),
        vec![PaneCommand::Redraw]
    );
    assert_eq!(pane.render().row(0), Some("row-0 "));
    assert!(pane.handle(key_event(KeyCode::Char('k'))).is_empty());

    // Toggling follow anchors the newest row on the bottom.
    pane.handle(key_event(KeyCode::Char('S')));
    assert!(pane.follow());
    assert_eq!(pane.render().row(2), Some("row-5 "));
    pane.handle(PaneEvent::Feed("row-6\n".into()));
    assert_eq!(pane.render().row(2), Some("row-6 "));

    assert_eq!(
        pane.handle(key_event(KeyCode::Char('q'))),
        vec![PaneCommand::Quit]
    );
}

#[test]
fn resize_session_rewraps_and_keeps_geometry() {
    let mut pane = LogPane::with_initial_text(4, 5, "asdfg").unwrap();
    let frame = pane.render();
    assert_eq!(
        frame.rows(),
        &["asdf", "g   ", "    ", "    ", "    "].map(str::to_string)
    );

    let cmds = pane.handle(PaneEvent::Input(InputEvent::Resize(5, 2)));
    assert_eq!(cmds, vec![PaneCommand::Redraw]);
    let frame = pane.render();
    assert_eq!(frame.rows(), &["asdfg", "     "].map(str::to_string));

    // A zero dimension is refused and the previous geometry survives.
    assert!(pane
        .handle(PaneEvent::Input(InputEvent::Resize(0, 2)))
        .is_empty());
    assert_eq!(pane.render().rows().len(), 2);
}

#[test]
fn producer_thread_feeds_while_ui_scrolls() {
    let handle = PaneHandle::new(LogPane::new(12, 4).unwrap());
    {
        let mut pane = handle.lock();
        pane.set_follow(true);
    }

    let mut producer = handle.clone();
    let feeder = std::thread::spawn(move || {
        for i in 0..100 {
            writeln!(producer, "background-{i}").unwrap();
        }
    });

    // UI-thread operations interleave with the producer under the lock.
    for _ in 0..50 {
        let mut pane = handle.lock();
        pane.scroll(Direction::Up);
        let frame = pane.render();
        assert_eq!(frame.rows().len(), 4);
    }
    feeder.join().unwrap();

    let pane = handle.lock();
    assert_eq!(pane.buffer().len(), 100);
}
