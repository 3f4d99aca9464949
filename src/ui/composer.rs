//! Single-line input field at the bottom of the screen.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

const PLACEHOLDER_IDLE: &str = "Type your message...";
const PLACEHOLDER_BUSY: &str = "Fetching...";

/// Editable single-line input. The cursor is a byte offset kept on a char
/// boundary so multi-byte input edits stay valid.
#[derive(Debug, Default, Clone)]
pub struct Composer {
    content: String,
    cursor: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Clear the field and hand back what was typed.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    pub fn insert(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.content.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            self.content.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.content[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }
}

/// The composer drawn with its busy state. While a request is outstanding
/// the field is dimmed and shows the fetching placeholder.
pub struct ComposerView<'a> {
    pub composer: &'a Composer,
    pub busy: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Message")
            .style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.composer.content().is_empty() {
            let placeholder = if self.busy {
                PLACEHOLDER_BUSY
            } else {
                PLACEHOLDER_IDLE
            };
            let line = Line::from(vec![Span::styled(
                placeholder,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        let mut content = self.composer.content().to_string();
        if !self.busy {
            let cursor = self.composer.cursor.min(content.len());
            content.insert(cursor, '▌');
        }
        let line = Line::from(vec![Span::raw(content)]);
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}
