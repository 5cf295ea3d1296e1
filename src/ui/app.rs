//! Main TUI application state and logic

use crate::snapshot::Outcome;
use crate::ui::panes;
use crate::viewer::{
    compute_code_height, Frontend, Navigation, Session, SourceWindow, HEADER_LINES, MIN_HEIGHT,
    MIN_WIDTH,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

/// Interval between steps in auto-play mode
const PLAY_INTERVAL: Duration = Duration::from_secs(1);

/// Map a key to a navigation command
pub fn navigation_for(code: KeyCode) -> Option<Navigation> {
    match code {
        KeyCode::Char('n') | KeyCode::Right | KeyCode::Down => Some(Navigation::Next),
        KeyCode::Char('p') | KeyCode::Left | KeyCode::Up => Some(Navigation::Prev),
        KeyCode::Home | KeyCode::Backspace => Some(Navigation::First),
        KeyCode::End | KeyCode::Enter => Some(Navigation::Last),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Navigation::Quit),
        _ => None,
    }
}

/// The terminal viewer's state over one session
pub struct App<'s> {
    /// The trace being browsed
    pub session: &'s mut Session,

    /// Visible region of the source
    pub window: SourceWindow,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Option<Instant>,
}

impl<'s> App<'s> {
    pub fn new(session: &'s mut Session) -> Self {
        App {
            session,
            window: SourceWindow::default(),
            status_message: String::new(),
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: None,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.session.should_quit()
    }

    /// Run the TUI event loop until the user quits
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit() {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= PLAY_INTERVAL {
                self.tick_play();
            }

            // Poll with a timeout so auto-play keeps running
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Advance one step in auto-play mode, stopping at the end
    pub fn tick_play(&mut self) {
        if self.session.navigate(Navigation::Next) {
            self.status_message = "Playing...".to_string();
        } else {
            self.is_playing = false;
            self.status_message = "Playback complete".to_string();
        }
        self.last_play_time = Instant::now();
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char(' ') {
            self.toggle_play();
            return;
        }

        let Some(command) = navigation_for(key.code) else {
            return;
        };
        self.is_playing = false;
        let moved = self.session.navigate(command);
        debug!(?command, moved, position = ?self.session.position(), "navigation");

        self.status_message = match (command, moved) {
            (Navigation::First, _) => "Jumped to start".to_string(),
            (Navigation::Last, _) => "Jumped to end".to_string(),
            (Navigation::Next, false) if !self.session.is_empty() => {
                "Already at the last step".to_string()
            }
            (Navigation::Prev, false) if !self.session.is_empty() => {
                "Already at the first step".to_string()
            }
            _ => String::new(),
        };
    }

    fn toggle_play(&mut self) {
        // 200ms debounce against key repeat
        if self
            .last_space_press
            .is_some_and(|pressed| pressed.elapsed() < Duration::from_millis(200))
        {
            return;
        }
        self.last_space_press = Some(Instant::now());
        self.is_playing = !self.is_playing;
        if self.is_playing {
            self.last_play_time = Instant::now()
                .checked_sub(PLAY_INTERVAL)
                .unwrap_or_else(Instant::now);
            self.status_message = "Playing...".to_string();
        } else {
            self.status_message = "Paused".to_string();
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let height = size.height as usize;
        let code_height = compute_code_height(height, HEADER_LINES);

        let header_area = Rect {
            height: size.height.min(HEADER_LINES as u16),
            ..size
        };
        panes::render_title_bar(
            frame,
            header_area,
            self.session,
            &self.status_message,
            self.is_playing,
        );

        if size.width < MIN_WIDTH || size.height < MIN_HEIGHT || code_height == 0 {
            if size.height > HEADER_LINES as u16 + 1 {
                let notice = Rect {
                    y: size.y + HEADER_LINES as u16 + 1,
                    height: 1,
                    ..size
                };
                frame.render_widget(Paragraph::new("Window too small."), notice);
            }
            return;
        }

        let lines = self.session.source_lines();
        self.window
            .follow(self.session.current_line(), code_height, lines.len());

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_LINES as u16),
                Constraint::Length(code_height as u16),
                Constraint::Min(0),
            ])
            .split(size);

        panes::render_source_pane(
            frame,
            rows[1],
            &lines,
            self.session.current_line(),
            self.window.top,
        );

        let left_width = (size.width / 2).max(20);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(left_width),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(rows[2]);

        panes::render_locals_pane(frame, columns[0], self.session.current());
        let is_error = self.session.trace().outcome != Outcome::Completed;
        panes::render_output_pane(frame, columns[2], self.session.output(), is_error);
    }
}

/// Full-screen terminal front end
#[derive(Debug, Default)]
pub struct TerminalViewer;

impl Frontend for TerminalViewer {
    type Error = io::Error;

    fn present(&mut self, session: &mut Session) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = App::new(session).run(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }
}
