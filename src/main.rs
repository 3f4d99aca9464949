mod app;
mod client;
mod decode;
mod transcript;
mod ui;

use crate::app::{App, AppAction};
use crate::client::AgentClient;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "weatherchat")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat client for a hosted weather agent", long_about = None)]
struct Cli {}

/// Diagnostics go to a file; stderr would corrupt the raw-mode terminal.
fn init_logging() -> Result<()> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let log_dir = home.join(".weatherchat");
    fs::create_dir_all(&log_dir).context("Failed to create .weatherchat directory")?;

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("weatherchat.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();
    init_logging()?;

    // One conversation per process: the thread id never rotates or persists.
    let thread_id = uuid::Uuid::new_v4().to_string();
    let client = AgentClient::new(thread_id)?;

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run(&mut terminal, client).await;

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    client: AgentClient,
) -> Result<()> {
    let mut app = App::new();

    loop {
        app.poll_stream();
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // The 50ms tick animates the typing indicator and paces the drain.
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match app.handle_key(key) {
                    AppAction::Exit => return Ok(()),
                    AppAction::Submitted(text) => {
                        tracing::info!(chars = text.chars().count(), "sending message");
                        let rx = client.send(text);
                        app.attach_stream(rx);
                    }
                    AppAction::None => {}
                }
            }
        }
    }
}
