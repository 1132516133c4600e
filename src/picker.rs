//! Full-screen list picker used to choose templates and figures.

use std::io::{self, Stderr};

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::{debug, warn};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::surface::Chooser;

/// What a key press did to the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerOutcome {
    Pending,
    Selected(usize),
    Canceled,
}

/// Selection state of the picker list.
#[derive(Debug)]
pub struct PickerState {
    pub labels: Vec<String>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl PickerState {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            selected: 0,
            scroll_offset: 0,
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn select_next(&mut self) {
        if !self.labels.is_empty() && self.selected < self.labels.len() - 1 {
            self.selected += 1;
        }
    }

    /// Ensure selected item is visible, adjusting scroll_offset if needed.
    pub fn ensure_visible(&mut self, visible_height: usize) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if visible_height > 0 && self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> PickerOutcome {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => PickerOutcome::Canceled,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                PickerOutcome::Canceled
            }
            KeyCode::Enter if !self.labels.is_empty() => PickerOutcome::Selected(self.selected),
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_prev();
                PickerOutcome::Pending
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                PickerOutcome::Pending
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.selected = 0;
                PickerOutcome::Pending
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.labels.len().saturating_sub(1);
                PickerOutcome::Pending
            }
            _ => PickerOutcome::Pending,
        }
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Cut `text` to at most `width` terminal columns.
fn truncate_to_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

fn draw_picker(f: &mut Frame, placeholder: &str, state: &mut PickerState) {
    let modal_width: u16 = 60;
    let modal_height: u16 = (state.labels.len() as u16).saturating_add(4).clamp(6, 24);
    let modal_area = centered_rect(modal_width, modal_height, f.area());

    f.render_widget(Clear, modal_area);

    let inner_width = modal_area.width.saturating_sub(2) as usize;
    let list_height = (modal_area.height as usize).saturating_sub(4);
    state.ensure_visible(list_height);

    let mut content: Vec<Line> = vec![
        Line::from(Span::styled(
            format!(" {}", truncate_to_width(placeholder, inner_width.saturating_sub(1))),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    if state.labels.is_empty() {
        content.push(Line::from(Span::styled(
            "  Nothing to choose from",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let visible_end = (state.scroll_offset + list_height).min(state.labels.len());
    for idx in state.scroll_offset..visible_end {
        let is_selected = idx == state.selected;
        let style = if is_selected {
            Style::default().fg(Color::Black).bg(Color::White)
        } else {
            Style::default().fg(Color::White)
        };

        let label = truncate_to_width(&state.labels[idx], inner_width.saturating_sub(2));
        let padding = inner_width.saturating_sub(2 + label.width());
        content.push(Line::from(vec![
            Span::styled("  ", style),
            Span::styled(label, style),
            Span::styled(" ".repeat(padding), style),
        ]));
    }

    let modal = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" autoink ")
            .title_alignment(ratatui::layout::Alignment::Center)
            .style(Style::default().fg(Color::White)),
    );

    f.render_widget(modal, modal_area);
}

type UndoStep = (&'static str, fn() -> io::Result<()>);

/// Terminal modes entered for the picker. Every step that succeeded is
/// undone on drop, last first, so an early error still restores the terminal.
struct RawScreen {
    undo: Vec<UndoStep>,
}

impl RawScreen {
    fn enter() -> io::Result<Self> {
        let mut screen = Self { undo: Vec::new() };
        enable_raw_mode()?;
        screen.undo.push(("disable_raw_mode", disable_raw_mode));
        execute!(io::stderr(), EnterAlternateScreen)?;
        screen.undo.push(("leave_alternate_screen", leave_alternate_screen));
        Ok(screen)
    }
}

fn leave_alternate_screen() -> io::Result<()> {
    execute!(io::stderr(), LeaveAlternateScreen)
}

impl Drop for RawScreen {
    fn drop(&mut self) {
        while let Some((step, undo)) = self.undo.pop() {
            if let Err(e) = undo() {
                warn!(step, error = %e, "terminal_restore_failed");
            }
        }
    }
}

/// Picker drawn on stderr, leaving stdout free for LaTeX output.
pub struct TerminalChooser;

impl TerminalChooser {
    fn run(placeholder: &str, labels: &[String]) -> io::Result<Option<usize>> {
        let _screen = RawScreen::enter()?;
        let mut terminal: Terminal<CrosstermBackend<Stderr>> =
            Terminal::new(CrosstermBackend::new(io::stderr()))?;

        let result = Self::event_loop(&mut terminal, placeholder, labels);
        if let Err(e) = terminal.show_cursor() {
            debug!(error = %e, "show_cursor_failed");
        }
        result
    }

    fn event_loop(
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
        placeholder: &str,
        labels: &[String],
    ) -> io::Result<Option<usize>> {
        let mut state = PickerState::new(labels.to_vec());

        loop {
            terminal.draw(|f| draw_picker(f, placeholder, &mut state))?;

            if let Event::Key(key) = crossterm::event::read()?
                && key.kind == KeyEventKind::Press
            {
                match state.handle_key(key.code, key.modifiers) {
                    PickerOutcome::Pending => {}
                    PickerOutcome::Selected(idx) => return Ok(Some(idx)),
                    PickerOutcome::Canceled => return Ok(None),
                }
            }
        }
    }
}

impl Chooser for TerminalChooser {
    fn choose(&mut self, placeholder: &str, labels: &[String]) -> Option<usize> {
        match Self::run(placeholder, labels) {
            Ok(choice) => {
                debug!(choice = ?choice, options = labels.len(), "picker_closed");
                choice
            }
            Err(e) => {
                warn!(error = %e, "picker_failed");
                None
            }
        }
    }
}
