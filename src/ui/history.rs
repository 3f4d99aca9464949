//! Transcript display: role-styled message blocks with a transient typing
//! indicator while a reply is pending.

use crate::transcript::{Message, Role, Transcript};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub struct HistoryView<'a> {
    pub transcript: &'a Transcript,
    pub busy: bool,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("Weather Chat");
        let inner = block.inner(area);
        block.render(area, buf);

        if self.transcript.is_empty() && !self.busy {
            let welcome = [
                Line::from(vec![Span::styled(
                    "Ask the weather agent anything.",
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Press Enter to send, Esc to quit.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];
            for (i, line) in welcome.iter().enumerate() {
                if i < inner.height as usize {
                    buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
                }
            }
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.transcript.messages() {
            all_lines.extend(render_message(message, inner.width));
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        // The typing indicator is presentation only; it is never part of the
        // transcript and never leaves the process.
        if self.busy {
            all_lines.push(typing_indicator());
        }

        // Bottom-anchored: always show the newest lines.
        let height = inner.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}

fn render_message(message: &Message, width: u16) -> Vec<Line<'static>> {
    let (icon, style) = match message.role {
        Role::User => ("You", Style::default().fg(Color::Blue)),
        Role::Agent => ("Agent", Style::default().fg(Color::Green)),
    };

    let timestamp = message.timestamp.format("%H:%M:%S").to_string();
    let header = format!("{} {} {}", icon, timestamp, "─".repeat(20));

    let mut lines = vec![Line::from(vec![Span::styled(
        header,
        Style::default().fg(Color::DarkGray),
    )])];

    for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(content_line, style),
        ]));
    }

    lines
}

fn typing_indicator() -> Line<'static> {
    let dots = match (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        / 300)
        % 4
    {
        0 => ".",
        1 => "..",
        2 => "...",
        _ => "   ",
    };

    Line::from(vec![
        Span::styled("Agent is typing", Style::default().fg(Color::Green)),
        Span::styled(dots.to_string(), Style::default().fg(Color::Yellow)),
    ])
}

/// Word-wrap to the given width, preserving explicit newlines in the reply.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
