//! Application state and the one-request-at-a-time submission cycle.

use crate::client::StreamEvent;
use crate::transcript::Transcript;
use crate::ui::composer::Composer;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

/// Where the current submission cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No request outstanding; input is accepted.
    Idle,
    /// Request in flight, reply not yet opened.
    Sending,
    /// Reply placeholder exists and is growing.
    Streaming,
}

/// What the main loop should do after a key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    None,
    /// A message was accepted; hand it to the agent client.
    Submitted(String),
    Exit,
}

/// Owns the transcript, the composer, and the busy state. All mutation runs
/// on the UI task; the network task only feeds events through the channel.
pub struct App {
    transcript: Transcript,
    composer: Composer,
    phase: Phase,
    stream_rx: Option<mpsc::UnboundedReceiver<StreamEvent>>,
    reply_buffer: String,
}

impl App {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            composer: Composer::new(),
            phase: Phase::Idle,
            stream_rx: None,
            reply_buffer: String::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Route a key press. Editing keys are ignored while a request is
    /// outstanding; the composer is effectively disabled until Idle.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.kind != KeyEventKind::Press {
            return AppAction::None;
        }

        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return AppAction::Exit;
        }

        if self.is_busy() {
            return AppAction::None;
        }

        match key.code {
            KeyCode::Enter => match self.submit() {
                Some(text) => AppAction::Submitted(text),
                None => AppAction::None,
            },
            KeyCode::Char(c) => {
                self.composer.insert(c);
                AppAction::None
            }
            KeyCode::Backspace => {
                self.composer.backspace();
                AppAction::None
            }
            KeyCode::Delete => {
                self.composer.delete();
                AppAction::None
            }
            KeyCode::Left => {
                self.composer.move_left();
                AppAction::None
            }
            KeyCode::Right => {
                self.composer.move_right();
                AppAction::None
            }
            KeyCode::Home => {
                self.composer.move_home();
                AppAction::None
            }
            KeyCode::End => {
                self.composer.move_end();
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// Try to submit the composer's content. Returns the text to send, or
    /// `None` when busy or when the trimmed input is empty (both silent
    /// no-ops). The raw, untrimmed text goes into the transcript.
    pub fn submit(&mut self) -> Option<String> {
        if self.is_busy() {
            return None;
        }
        if self.composer.content().trim().is_empty() {
            return None;
        }

        let text = self.composer.take();
        self.transcript.push_user(text.clone());
        self.phase = Phase::Sending;
        Some(text)
    }

    /// Wire up the event stream of the in-flight request.
    pub fn attach_stream(&mut self, rx: mpsc::UnboundedReceiver<StreamEvent>) {
        self.reply_buffer.clear();
        self.stream_rx = Some(rx);
    }

    /// Drain any stream events that arrived since the last tick. Called from
    /// the main loop between draws.
    pub fn poll_stream(&mut self) {
        let Some(rx) = self.stream_rx.as_mut() else {
            return;
        };

        loop {
            match rx.try_recv() {
                Ok(StreamEvent::Opened) => {
                    self.transcript.begin_agent_reply();
                    self.phase = Phase::Streaming;
                }
                Ok(StreamEvent::Chunk(text)) => {
                    self.reply_buffer.push_str(&text);
                    self.transcript.set_agent_reply(self.reply_buffer.clone());
                }
                Ok(StreamEvent::Done) => {
                    self.finish_cycle();
                    return;
                }
                Ok(StreamEvent::Failed(cause)) => {
                    tracing::debug!(%cause, "replacing reply with apology");
                    self.transcript.fail_agent_reply();
                    self.finish_cycle();
                    return;
                }
                Err(mpsc::error::TryRecvError::Empty) => return,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    // The network task went away without a terminal event.
                    tracing::warn!("stream task dropped without completing");
                    self.transcript.fail_agent_reply();
                    self.finish_cycle();
                    return;
                }
            }
        }
    }

    // Busy must clear on every outcome so the next submission is accepted.
    fn finish_cycle(&mut self) {
        self.stream_rx = None;
        self.reply_buffer.clear();
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{APOLOGY, Role};

    fn app_with_input(text: &str) -> App {
        let mut app = App::new();
        for c in text.chars() {
            app.composer.insert(c);
        }
        app
    }

    fn feed(app: &mut App, events: Vec<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        app.attach_stream(rx);
        for event in events {
            tx.send(event).unwrap();
        }
        drop(tx);
        app.poll_stream();
    }

    #[test]
    fn submit_appends_one_raw_user_message() {
        let mut app = app_with_input("  hello  ");
        let sent = app.submit().unwrap();
        assert_eq!(sent, "  hello  ");
        assert_eq!(app.transcript().len(), 1);
        assert_eq!(app.transcript().messages()[0].role, Role::User);
        assert_eq!(app.transcript().messages()[0].content, "  hello  ");
        assert!(app.is_busy());
        assert_eq!(app.composer().content(), "");
    }

    #[test]
    fn empty_and_whitespace_submissions_are_noops() {
        let mut app = App::new();
        assert_eq!(app.submit(), None);

        let mut app = app_with_input("   \t ");
        assert_eq!(app.submit(), None);
        assert_eq!(app.transcript().len(), 0);
        assert!(!app.is_busy());
    }

    #[test]
    fn submit_while_busy_is_a_noop() {
        let mut app = app_with_input("first");
        app.submit().unwrap();

        for c in "second".chars() {
            app.composer.insert(c);
        }
        let len_before = app.transcript().len();
        assert_eq!(app.submit(), None);
        assert_eq!(app.transcript().len(), len_before);
        assert!(app.is_busy());
    }

    #[test]
    fn editing_keys_are_ignored_while_busy() {
        let mut app = app_with_input("hello");
        app.submit().unwrap();

        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(app.handle_key(key), AppAction::None);
        assert_eq!(app.composer().content(), "");
    }

    #[test]
    fn streamed_chunks_grow_the_trailing_agent_message() {
        let mut app = app_with_input("hello");
        app.submit().unwrap();
        assert_eq!(app.phase(), Phase::Sending);

        let (tx, rx) = mpsc::unbounded_channel();
        app.attach_stream(rx);

        tx.send(StreamEvent::Opened).unwrap();
        tx.send(StreamEvent::Chunk("Hi".to_string())).unwrap();
        app.poll_stream();
        assert_eq!(app.phase(), Phase::Streaming);
        assert_eq!(app.transcript().len(), 2);
        assert_eq!(app.transcript().messages()[1].content, "Hi");

        tx.send(StreamEvent::Chunk(" there".to_string())).unwrap();
        app.poll_stream();
        assert_eq!(app.transcript().messages()[1].content, "Hi there");

        tx.send(StreamEvent::Done).unwrap();
        app.poll_stream();
        assert!(!app.is_busy());
        assert_eq!(app.transcript().messages()[1].content, "Hi there");
    }

    #[test]
    fn failure_before_reply_opens_appends_apology() {
        let mut app = app_with_input("hello");
        app.submit().unwrap();
        feed(&mut app, vec![StreamEvent::Failed("502".to_string())]);

        assert!(!app.is_busy());
        assert_eq!(app.transcript().len(), 2);
        assert_eq!(app.transcript().messages()[1].content, APOLOGY);
    }

    #[test]
    fn failure_mid_stream_replaces_partial_reply() {
        let mut app = app_with_input("hello");
        app.submit().unwrap();
        feed(
            &mut app,
            vec![
                StreamEvent::Opened,
                StreamEvent::Chunk("Hi th".to_string()),
                StreamEvent::Failed("connection reset".to_string()),
            ],
        );

        assert!(!app.is_busy());
        assert_eq!(app.transcript().len(), 2);
        assert_eq!(app.transcript().messages()[1].content, APOLOGY);
    }

    #[test]
    fn dropped_stream_task_recovers_to_idle() {
        let mut app = app_with_input("hello");
        app.submit().unwrap();
        feed(&mut app, vec![]);

        assert!(!app.is_busy());
        assert_eq!(app.transcript().messages().last().unwrap().content, APOLOGY);
    }

    #[test]
    fn new_submission_accepted_after_each_cycle() {
        let mut app = app_with_input("first");
        app.submit().unwrap();
        feed(
            &mut app,
            vec![StreamEvent::Opened, StreamEvent::Done],
        );
        assert!(!app.is_busy());

        for c in "second".chars() {
            app.composer.insert(c);
        }
        assert_eq!(app.submit(), Some("second".to_string()));

        feed(&mut app, vec![StreamEvent::Failed("down".to_string())]);
        assert!(!app.is_busy());

        for c in "third".chars() {
            app.composer.insert(c);
        }
        assert_eq!(app.submit(), Some("third".to_string()));
    }

    #[test]
    fn full_hello_scenario() {
        let mut app = app_with_input("hello");
        app.submit().unwrap();
        assert_eq!(app.transcript().len(), 1);
        assert!(app.is_busy());

        let (tx, rx) = mpsc::unbounded_channel();
        app.attach_stream(rx);
        tx.send(StreamEvent::Opened).unwrap();
        tx.send(StreamEvent::Chunk("Hi".to_string())).unwrap();
        app.poll_stream();
        assert_eq!(app.transcript().messages()[1].content, "Hi");

        tx.send(StreamEvent::Chunk(" there".to_string())).unwrap();
        tx.send(StreamEvent::Done).unwrap();
        app.poll_stream();

        assert_eq!(app.transcript().len(), 2);
        assert_eq!(app.transcript().messages()[0].content, "hello");
        assert_eq!(app.transcript().messages()[1].content, "Hi there");
        assert!(!app.is_busy());
    }
}
