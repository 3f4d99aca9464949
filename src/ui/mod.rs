//! TUI layout: transcript pane on top, composer at the bottom.

pub mod composer;
pub mod history;

use crate::app::App;
use composer::ComposerView;
use history::HistoryView;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(frame.size());

    frame.render_widget(
        HistoryView {
            transcript: app.transcript(),
            busy: app.is_busy(),
        },
        chunks[0],
    );

    frame.render_widget(
        ComposerView {
            composer: app.composer(),
            busy: app.is_busy(),
        },
        chunks[1],
    );
}
