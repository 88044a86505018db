//! Main TUI application state and logic

use crate::snapshot::{Snapshot, SnapshotManager, Transcript};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

use super::panes::{self, SourceScrollState};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Module,
    Transcript,
}

impl FocusedPane {
    /// Move focus to the next pane (source -> transcript -> module)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Transcript,
            FocusedPane::Transcript => FocusedPane::Module,
            FocusedPane::Module => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    snapshots: SnapshotManager,
    transcript: Transcript,

    /// The source code that was compiled
    pub source_code: String,

    /// Index of the current snapshot
    pub position: usize,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: SourceScrollState,
    pub module_scroll: usize,
    pub transcript_scroll: usize,

    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    pub fn new(snapshots: SnapshotManager, transcript: Transcript, source_code: String) -> Self {
        let status_message = if snapshots.is_empty() {
            String::from("Nothing to show: no top-level units")
        } else {
            String::from("Ready!")
        };

        App {
            snapshots,
            transcript,
            source_code,
            position: 0,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            module_scroll: 0,
            transcript_scroll: usize::MAX,
            should_quit: false,
            status_message,
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or(Instant::now()),
        }
    }

    /// The snapshot under the cursor, if any unit was recorded
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.position)
    }

    pub fn total(&self) -> usize {
        self.snapshots.len()
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_secs(1) {
                if self.step_forward().is_ok() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so auto-play keeps ticking
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

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Transcript (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[0]);

        let (line, failed, module_ir, transcript_len) = match self.snapshots.get(self.position) {
            Some(s) => (s.location.line, !s.succeeded, s.module_ir.as_str(), s.transcript_len),
            None => (0, false, "", 0),
        };

        panes::render_source_pane(
            frame,
            left_rows[0],
            &self.source_code,
            line,
            failed,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_transcript_pane(
            frame,
            left_rows[1],
            &self.transcript,
            transcript_len,
            self.focused_pane == FocusedPane::Transcript,
            &mut self.transcript_scroll,
        );

        panes::render_module_pane(
            frame,
            columns[1],
            module_ir,
            self.focused_pane == FocusedPane::Module,
            &mut self.module_scroll,
        );

        panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.position,
            self.snapshots.len(),
            failed,
            self.is_playing,
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.status_message = match self.step_backward() {
                    Ok(()) => self.describe_current(),
                    Err(message) => format!("Cannot step backward: {}", message),
                };
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.status_message = match self.step_forward() {
                    Ok(()) => self.describe_current(),
                    Err(message) => format!("Cannot step forward: {}", message),
                };
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Module => {
                    self.module_scroll = self.module_scroll.saturating_sub(1);
                }
                FocusedPane::Transcript => {
                    self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Module => {
                    self.module_scroll = self.module_scroll.saturating_add(1);
                }
                FocusedPane::Transcript => {
                    self.transcript_scroll = self.transcript_scroll.saturating_add(1);
                }
            },
            KeyCode::Char(' ') => {
                // 200ms debounce against key repeat
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(Duration::from_secs(1))
                            .unwrap_or(Instant::now());
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.jump_to(self.snapshots.len().saturating_sub(1));
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.jump_to(0);
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    fn step_forward(&mut self) -> Result<(), String> {
        if self.position + 1 >= self.snapshots.len() {
            return Err("already at the last unit".to_string());
        }
        self.jump_to(self.position + 1);
        Ok(())
    }

    fn step_backward(&mut self) -> Result<(), String> {
        if self.position == 0 {
            return Err("already at the first unit".to_string());
        }
        self.jump_to(self.position - 1);
        Ok(())
    }

    fn jump_to(&mut self, position: usize) {
        self.position = position;
        // Follow the newest output; the pane clamps this
        self.transcript_scroll = usize::MAX;
    }

    fn describe_current(&self) -> String {
        self.current()
            .map(|s| s.summary.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use crossterm::event::KeyModifiers;
    use inkwell::context::Context;

    fn app(source: &str) -> App {
        let context = Context::create();
        let mut driver = Driver::new(&context, source.chars()).with_history();
        driver
            .run(&mut io::sink())
            .expect("writing to a sink cannot fail");
        let (snapshots, transcript) = driver.into_history().expect("history was enabled");
        App::new(snapshots, transcript, source.to_string())
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_stepping_is_bounded() {
        let mut app = app("def f(x) x\nf(1)\n)");
        assert_eq!(app.total(), 3);

        press(&mut app, KeyCode::Left);
        assert_eq!(app.position, 0);
        assert!(app.status_message.starts_with("Cannot step backward"));

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.position, 2);
        assert!(!app.current().unwrap().succeeded);
    }

    #[test]
    fn test_jump_to_ends() {
        let mut app = app("1; 2; 3; 4");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.position, 3);

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.position, 0);
    }

    #[test]
    fn test_step_shows_summary() {
        let mut app = app("extern sin(x)\ndef f(x) sin(x)");
        press(&mut app, KeyCode::Right);
        assert_eq!(app.status_message, "definition 'f' lowered");
    }

    #[test]
    fn test_focus_cycles() {
        let mut app = app("1");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Transcript);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Module);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Source);
    }

    #[test]
    fn test_empty_history() {
        let mut app = app("# nothing here\n");
        assert!(app.current().is_none());
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.position, 0);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
