use std::collections::VecDeque;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::logging::{Diagnostic, DiagnosticLog};
use crate::shell::{Command, Outcome, Shell, HELP};

use super::helpers::{input_window, level_style, surface_error, tail_window};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the bordered input field.
const INPUT_HEIGHT: u16 = 3;
/// Height of the bordered diagnostics pane.
const DIAGNOSTICS_HEIGHT: u16 = 7;
/// Scrollback entries kept before the oldest are dropped.
const SCROLLBACK_LIMIT: usize = 2_000;
/// Lines moved per PageUp/PageDown.
const PAGE: usize = 10;

/// One line of the scrollback pane.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Input(String),
    Row(String),
    Info(String),
    Error(String),
}

impl Entry {
    fn to_line(&self) -> Line<'static> {
        match self {
            Entry::Input(text) => Line::from(vec![
                Span::styled("=> ", Style::default().fg(Color::Cyan)),
                Span::styled(text.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Entry::Row(text) => Line::from(text.clone()),
            Entry::Info(text) => Line::from(Span::styled(
                text.clone(),
                Style::default().fg(Color::Green),
            )),
            Entry::Error(text) => {
                Line::from(Span::styled(text.clone(), Style::default().fg(Color::Red)))
            }
        }
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// State of the full-screen SQL console.
pub struct Console {
    shell: Shell,
    log: DiagnosticLog,
    scrollback: VecDeque<Entry>,
    diagnostics: VecDeque<Diagnostic>,
    input: String,
    history: Vec<String>,
    /// Position while walking back through `history`; `None` means editing a
    /// fresh line.
    history_cursor: Option<usize>,
    /// Lines scrolled up from the bottom of the scrollback.
    scroll: usize,
    status: Option<StatusMessage>,
}

impl Console {
    pub fn new(shell: Shell, log: DiagnosticLog) -> Self {
        let mut console = Self {
            shell,
            log,
            scrollback: VecDeque::new(),
            diagnostics: VecDeque::new(),
            input: String::new(),
            history: Vec::new(),
            history_cursor: None,
            scroll: 0,
            status: None,
        };
        let connected = console.shell.manager().is_connected();
        if connected {
            console.set_status("Connected. Type .help for commands.", StatusKind::Info);
        } else {
            console.set_status(
                "No database file yet. Type .reset to create one.",
                StatusKind::Error,
            );
        }
        console
    }

    /// Process a key press. Returns `true` when the console should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Enter => return Ok(self.submit()),
            KeyCode::Char(c) => {
                self.input.push(c);
                self.history_cursor = None;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Up => self.recall_previous(),
            KeyCode::Down => self.recall_next(),
            KeyCode::PageUp => {
                let max = self.scrollback.len();
                self.scroll = (self.scroll + PAGE).min(max);
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(PAGE),
            _ => {}
        }
        Ok(false)
    }

    /// Clear the scrollback pane.
    pub(crate) fn handle_ctrl_l(&mut self) {
        self.scrollback.clear();
        self.scroll = 0;
        self.clear_status();
    }

    /// Reconnect to the configured database file.
    pub(crate) fn handle_ctrl_r(&mut self) {
        self.run(Command::Refresh);
    }

    /// Move captured tracing output into the diagnostics pane.
    pub(crate) fn pull_diagnostics(&mut self) {
        for diagnostic in self.log.drain() {
            if self.diagnostics.len() == SCROLLBACK_LIMIT {
                self.diagnostics.pop_front();
            }
            self.diagnostics.push_back(diagnostic);
        }
    }

    fn submit(&mut self) -> bool {
        let line = mem::take(&mut self.input);
        self.history_cursor = None;
        self.scroll = 0;

        let command = Command::parse(&line);
        if command != Command::Empty {
            self.history.push(line.trim().to_string());
            self.push_entry(Entry::Input(line.trim().to_string()));
        }
        self.run(command)
    }

    fn run(&mut self, command: Command) -> bool {
        let outcome = match self.shell.dispatch(command) {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = surface_error(&err);
                self.push_entry(Entry::Error(format!("error: {err:#}")));
                self.set_status(message, StatusKind::Error);
                return false;
            }
        };

        match outcome {
            Outcome::Quit => return true,
            Outcome::Nothing => {}
            Outcome::Rows(rows) => {
                let count = rows.len();
                for row in rows {
                    self.push_entry(Entry::Row(row.to_string()));
                }
                let noun = if count == 1 { "row" } else { "rows" };
                self.set_status(format!("{count} {noun}"), StatusKind::Info);
            }
            Outcome::Failed(err) => {
                self.push_entry(Entry::Error(format!("error: {err}")));
                self.set_status(err.to_string(), StatusKind::Error);
            }
            Outcome::Refreshed { connected: true } => {
                self.set_status("Connected.", StatusKind::Info);
            }
            Outcome::Refreshed { connected: false } => {
                self.set_status(
                    "No database file. Type .reset to create one.",
                    StatusKind::Error,
                );
            }
            Outcome::Reset => {
                self.push_entry(Entry::Info("database reset".to_string()));
                self.set_status("Database reset to the seed rows.", StatusKind::Info);
            }
            Outcome::Help => {
                for line in HELP.lines() {
                    self.push_entry(Entry::Info(line.to_string()));
                }
            }
        }
        false
    }

    fn recall_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_cursor {
            Some(0) => 0,
            Some(idx) => idx - 1,
            None => self.history.len() - 1,
        };
        self.history_cursor = Some(idx);
        self.input = self.history[idx].clone();
    }

    fn recall_next(&mut self) {
        match self.history_cursor {
            Some(idx) if idx + 1 < self.history.len() => {
                self.history_cursor = Some(idx + 1);
                self.input = self.history[idx + 1].clone();
            }
            Some(_) => {
                self.history_cursor = None;
                self.input.clear();
            }
            None => {}
        }
    }

    fn push_entry(&mut self, entry: Entry) {
        if self.scrollback.len() == SCROLLBACK_LIMIT {
            self.scrollback.pop_front();
        }
        self.scrollback.push_back(entry);
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(DIAGNOSTICS_HEIGHT),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_scrollback(frame, chunks[0]);
        self.draw_diagnostics(frame, chunks[1]);
        self.draw_input(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_scrollback(&self, frame: &mut Frame, area: Rect) {
        let path = self.shell.config().db_path().display().to_string();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Aquarium - {path}"));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let window = tail_window(self.scrollback.len(), inner.height as usize, self.scroll);
        let lines: Vec<Line> = self
            .scrollback
            .range(window)
            .map(Entry::to_line)
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_diagnostics(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Diagnostics");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let window = tail_window(self.diagnostics.len(), inner.height as usize, 0);
        let lines: Vec<Line> = self
            .diagnostics
            .range(window)
            .map(|diagnostic| {
                Line::from(Span::styled(
                    diagnostic.text.clone(),
                    level_style(diagnostic.level),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("SQL");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let prompt = "=> ";
        let field_width = (inner.width as usize).saturating_sub(prompt.len());
        let (visible, cursor) = input_window(&self.input, field_width);
        let line = Line::from(vec![
            Span::styled(prompt, Style::default().fg(Color::Cyan)),
            Span::raw(visible),
        ]);
        frame.render_widget(Paragraph::new(line), inner);

        if inner.width > 0 && inner.height > 0 {
            let cursor_x = inner.x + (prompt.len() + cursor) as u16;
            frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        Line::from(vec![
            Span::styled("[Enter]", key_style),
            Span::raw(" Run   "),
            Span::styled("[Up/Down]", key_style),
            Span::raw(" History   "),
            Span::styled("[PgUp/PgDn]", key_style),
            Span::raw(" Scroll   "),
            Span::styled("[Ctrl-R]", key_style),
            Span::raw(" Reconnect   "),
            Span::styled("[Ctrl-L]", key_style),
            Span::raw(" Clear   "),
            Span::styled("[Esc]", key_style),
            Span::raw(" Quit"),
        ])
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::config::Config;

    fn console_in(dir: &tempfile::TempDir) -> Console {
        let shell = Shell::new(Config::new(dir.path().join("aquarium.db")));
        Console::new(shell, DiagnosticLog::default())
    }

    fn type_line(console: &mut Console, text: &str) -> bool {
        for c in text.chars() {
            console.handle_key(KeyCode::Char(c)).unwrap();
        }
        console.handle_key(KeyCode::Enter).unwrap()
    }

    fn rendered(console: &Console) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|frame| console.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn reset_and_select_fill_scrollback() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console_in(&dir);

        assert!(!type_line(&mut console, ".reset"));
        assert!(!type_line(&mut console, "SELECT * FROM fish;"));

        assert!(console
            .scrollback
            .contains(&Entry::Row("('Sammy', 'shark', 1)".to_string())));
        assert!(console
            .scrollback
            .contains(&Entry::Row("('Jamie', 'cuttlefish', 7)".to_string())));
        assert_eq!(console.status.as_ref().map(|s| s.text.as_str()), Some("2 rows"));
        assert!(rendered(&console).contains("('Jamie', 'cuttlefish', 7)"));
    }

    #[test]
    fn quit_line_and_escape_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console_in(&dir);
        assert!(type_line(&mut console, "quit"));
        assert!(console.handle_key(KeyCode::Esc).unwrap());
    }

    #[test]
    fn failures_are_shown_as_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console_in(&dir);

        type_line(&mut console, "SELECT * FROM fish;");

        assert!(matches!(
            console.scrollback.back(),
            Some(Entry::Error(text)) if text.contains("no database connection")
        ));
    }

    #[test]
    fn history_walks_back_and_forward() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console_in(&dir);
        type_line(&mut console, "SELECT 1");
        type_line(&mut console, "SELECT 2");

        console.handle_key(KeyCode::Up).unwrap();
        assert_eq!(console.input, "SELECT 2");
        console.handle_key(KeyCode::Up).unwrap();
        console.handle_key(KeyCode::Up).unwrap();
        assert_eq!(console.input, "SELECT 1");
        console.handle_key(KeyCode::Down).unwrap();
        assert_eq!(console.input, "SELECT 2");
        console.handle_key(KeyCode::Down).unwrap();
        assert!(console.input.is_empty());
    }

    #[test]
    fn ctrl_l_clears_scrollback() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console_in(&dir);
        type_line(&mut console, ".help");
        assert!(!console.scrollback.is_empty());

        console.handle_ctrl_l();
        assert!(console.scrollback.is_empty());
    }

    #[test]
    fn ctrl_r_picks_up_a_database_created_later() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console_in(&dir);
        crate::db::initialize_database(&dir.path().join("aquarium.db")).unwrap();

        console.handle_ctrl_r();
        assert!(console.shell.manager().is_connected());
    }
}
