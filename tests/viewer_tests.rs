// Integration tests for the viewer contract and the terminal front end

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pyviz::tracer::trace;
use pyviz::ui::app::navigation_for;
use pyviz::ui::App;
use pyviz::viewer::{Navigation, Session};
use ratatui::{backend::TestBackend, Terminal};

/// Render `app` into a `width`x`height` test terminal and return its rows
fn render(app: &mut App, width: u16, height: u16) -> Vec<String> {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
    terminal.draw(|f| app.render(f)).expect("draw");
    let buffer = terminal.backend().buffer();
    buffer
        .content()
        .chunks(buffer.area.width as usize)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect()
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn session(source: &str) -> Session {
    Session::new(trace(source), source)
}

#[test]
fn test_navigation_stays_in_bounds() {
    let mut session = session("a = 1\nb = 2\nc = 3\n");
    for _ in 0..10 {
        session.navigate(Navigation::Next);
    }
    assert_eq!(session.position(), Some(2));
    for _ in 0..10 {
        session.navigate(Navigation::Prev);
    }
    assert_eq!(session.position(), Some(0));
}

#[test]
fn test_key_bindings() {
    assert_eq!(navigation_for(KeyCode::Char('n')), Some(Navigation::Next));
    assert_eq!(navigation_for(KeyCode::Right), Some(Navigation::Next));
    assert_eq!(navigation_for(KeyCode::Down), Some(Navigation::Next));
    assert_eq!(navigation_for(KeyCode::Char('p')), Some(Navigation::Prev));
    assert_eq!(navigation_for(KeyCode::Left), Some(Navigation::Prev));
    assert_eq!(navigation_for(KeyCode::Up), Some(Navigation::Prev));
    assert_eq!(navigation_for(KeyCode::Home), Some(Navigation::First));
    assert_eq!(navigation_for(KeyCode::End), Some(Navigation::Last));
    assert_eq!(navigation_for(KeyCode::Char('Q')), Some(Navigation::Quit));
    assert_eq!(navigation_for(KeyCode::Char('x')), None);
}

#[test]
fn test_keys_drive_session() {
    let mut session = session("x = 1\ny = x + 1\nprint(y)\n");
    let mut app = App::new(&mut session);

    app.handle_key_event(key(KeyCode::Char('n')));
    assert_eq!(app.session.position(), Some(1));
    app.handle_key_event(key(KeyCode::End));
    assert_eq!(app.session.position(), Some(2));
    app.handle_key_event(key(KeyCode::Backspace));
    assert_eq!(app.session.position(), Some(0));
    app.handle_key_event(key(KeyCode::Char('q')));
    assert!(app.should_quit());
}

#[test]
fn test_auto_play_stops_at_end() {
    let mut session = session("a = 1\nb = 2\n");
    let mut app = App::new(&mut session);

    app.handle_key_event(key(KeyCode::Char(' ')));
    assert!(app.is_playing);
    app.tick_play();
    assert_eq!(app.session.position(), Some(1));
    app.tick_play();
    assert!(!app.is_playing);
    assert_eq!(app.status_message, "Playback complete");
}

#[test]
fn test_render_current_step() {
    let mut session = session("x = 1\ny = x + 1\nprint(y)\n");
    session.navigate(Navigation::Last);
    let mut app = App::new(&mut session);
    let rows = render(&mut app, 80, 24);

    assert!(rows[0].contains("Python Code Visualizer"));
    assert!(rows[0].contains("Step 3/3"));
    assert!(rows.iter().any(|row| row.contains("   3 print(y)")));
    assert!(rows.iter().any(|row| row.contains("x = 1")));
    assert!(rows.iter().any(|row| row.contains("y = 2")));
    assert!(rows.iter().any(|row| row.contains("Output")));
}

#[test]
fn test_render_placeholders() {
    let mut session = session("x = 1\n");
    let mut app = App::new(&mut session);
    let rows = render(&mut app, 80, 24);

    assert!(rows.iter().any(|row| row.contains("<no locals>")));
    assert!(rows.iter().any(|row| row.contains("<no output>")));
}

#[test]
fn test_render_empty_trace() {
    let mut session = session("x = (\n");
    let mut app = App::new(&mut session);
    let rows = render(&mut app, 80, 24);

    assert!(rows[0].contains("Step 0/0"));
    assert!(rows.iter().any(|row| row.contains("<no steps>")));
    assert!(rows.iter().any(|row| row.contains("SyntaxError:")));
}

#[test]
fn test_render_too_small() {
    let mut session = session("x = 1\n");
    let mut app = App::new(&mut session);

    let rows = render(&mut app, 30, 20);
    assert!(rows.iter().any(|row| row.contains("Window too small.")));

    let rows = render(&mut app, 80, 7);
    assert!(rows.iter().any(|row| row.contains("Window too small.")));
}

#[test]
fn test_source_window_follows_cursor() {
    let source: String = (0..40).map(|i| format!("v{} = {}\n", i, i)).collect();
    let mut session = session(&source);
    let mut app = App::new(&mut session);

    // 24 rows: code window of 11 lines
    render(&mut app, 80, 24);
    assert_eq!(app.window.top, 0);

    for _ in 0..11 {
        app.session.navigate(Navigation::Next);
    }
    let rows = render(&mut app, 80, 24);
    assert_eq!(app.window.top, 1);
    assert!(rows[2].contains("   2 v1 = 1"));
    assert!(rows[12].contains("  12 v11 = 11"));

    app.session.navigate(Navigation::Last);
    render(&mut app, 80, 24);
    assert_eq!(app.window.top, 29);

    app.session.navigate(Navigation::First);
    render(&mut app, 80, 24);
    assert_eq!(app.window.top, 0);
}
