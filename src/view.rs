//! Terminal rendering and key handling for the chat widget
//!
//! Rendering is a pure function of the conversation snapshot and the input
//! line; key handling only edits the input line and tells the caller what to
//! do next.

use crate::quick_actions::QuickActionCatalog;
use crate::state_machine::{ChatState, Role, Turn};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const TITLE: &str = "Curry Pizza House";
const SUBTITLE: &str = "AI Menu Assistant";
const FOOTER: &str = "Powered by Curry Pizza House AI • Order online: www.currypizzahouse.com";
const PLACEHOLDER: &str = "Ask me about our menu...";

/// What the caller should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    None,
    Quit,
    Submit(String),
    QuickAction(usize),
}

/// The single-line text input
#[derive(Debug, Default)]
pub struct InputLine {
    buffer: String,
}

impl InputLine {
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Apply one key press.
    ///
    /// While a request is pending the input is disabled: typing and the
    /// quick-action keys do nothing. Enter on blank text is ignored and keeps
    /// the buffer; otherwise the buffer is submitted and cleared.
    pub fn handle_key(&mut self, key: KeyEvent, pending: bool) -> Command {
        if key.kind != KeyEventKind::Press {
            return Command::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Command::Quit,
            KeyCode::Char('c') if ctrl => return Command::Quit,
            _ => {}
        }

        if pending {
            return Command::None;
        }

        match key.code {
            KeyCode::F(n) => {
                let index = usize::from(n).wrapping_sub(1);
                if index < QuickActionCatalog::len() {
                    Command::QuickAction(index)
                } else {
                    Command::None
                }
            }
            KeyCode::Enter => {
                if self.buffer.trim().is_empty() {
                    Command::None
                } else {
                    Command::Submit(std::mem::take(&mut self.buffer))
                }
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                Command::None
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.buffer.push(c);
                Command::None
            }
            _ => Command::None,
        }
    }
}

/// Draw the whole widget. `tick` drives the typing indicator animation.
pub fn draw(frame: &mut Frame, state: &ChatState, input: &InputLine, tick: usize) {
    let [header_area, messages_area, actions_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header_area);
    render_messages(frame, messages_area, state, tick);
    render_quick_actions(frame, actions_area, state.is_pending());
    render_input(frame, input_area, input, state.is_pending());

    let footer = Paragraph::new(Span::styled(FOOTER, Style::default().fg(Color::DarkGray)))
        .alignment(Alignment::Center);
    frame.render_widget(footer, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::Gray))),
    ]);
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

fn render_messages(frame: &mut Frame, area: Rect, state: &ChatState, tick: usize) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    let width = usize::from(inner.width.max(1));

    let mut lines: Vec<Line> = Vec::new();
    for turn in state.log() {
        push_turn(&mut lines, turn, width);
    }

    if state.is_pending() {
        let dots = ".".repeat(tick % 3 + 1);
        lines.push(Line::from(Span::styled(
            format!("Assistant is typing{dots}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    // Lines are pre-wrapped, so one line is one row. Keep the newest in view.
    let rows = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let scroll = rows.saturating_sub(inner.height);

    let messages = Paragraph::new(lines).block(block).scroll((scroll, 0));
    frame.render_widget(messages, area);
}

fn push_turn(lines: &mut Vec<Line<'static>>, turn: &Turn, width: usize) {
    let time = turn.timestamp().with_timezone(&Local).format("%H:%M");
    let (label, color, alignment) = match turn.role() {
        Role::User => ("You", Color::Cyan, Alignment::Right),
        Role::Assistant => ("Assistant", Color::Yellow, Alignment::Left),
    };

    lines.push(
        Line::from(vec![
            Span::styled(label, Style::default().fg(color).bold()),
            Span::styled(format!(" {time}"), Style::default().fg(Color::DarkGray)),
        ])
        .alignment(alignment),
    );
    for text in turn.content().lines() {
        for row in wrap_text(text, width) {
            lines.push(Line::from(row).alignment(alignment));
        }
    }
    lines.push(Line::default());
}

/// Break `text` into rows at most `width` columns wide, at spaces where
/// possible. Words wider than a row are split. Always yields at least one row.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;

    for word in text.split(' ') {
        let word_width = Span::raw(word).width();
        let gap = usize::from(!row.is_empty());
        if row_width + gap + word_width <= width {
            if gap == 1 {
                row.push(' ');
            }
            row.push_str(word);
            row_width += gap + word_width;
            continue;
        }

        if !row.is_empty() {
            rows.push(std::mem::take(&mut row));
            row_width = 0;
        }
        if word_width <= width {
            row.push_str(word);
            row_width = word_width;
            continue;
        }

        let mut buf = [0u8; 4];
        for c in word.chars() {
            let char_width = Span::raw(&*c.encode_utf8(&mut buf)).width();
            if row_width + char_width > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(c);
            row_width += char_width;
        }
    }

    rows.push(row);
    rows
}

fn render_quick_actions(frame: &mut Frame, area: Rect, pending: bool) {
    let (key_style, label_style) = if QuickActionCatalog::is_enabled(pending) {
        (
            Style::default().bg(Color::DarkGray).fg(Color::White),
            Style::default().fg(Color::White),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };

    let mut spans = Vec::new();
    for (i, action) in QuickActionCatalog::entries().iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(format!(" F{} ", i + 1), key_style));
        spans.push(Span::styled(format!(" {}", action.phrase()), label_style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(frame: &mut Frame, area: Rect, input: &InputLine, pending: bool) {
    let border = if pending { Color::DarkGray } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let content = if input.text().is_empty() {
        Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(input.text().to_string())
    };
    frame.render_widget(Paragraph::new(Line::from(content)).block(block), area);

    if !pending {
        let width = u16::try_from(input.text().chars().count()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(width)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position((x, area.y + 1));
    }
}
