//! Async readline input handling for the chat loop.
//!
//! Wraps `rustyline_async::Readline` so that realtime messages can be printed
//! through the returned `SharedWriter` without clobbering the prompt.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug)]
pub enum InputEvent {
    /// User submitted a line (trimmed).
    Message(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create the input handler and the writer to print through.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    pub fn update_prompt(&mut self, prompt: &str) {
        let _ = self.rl.update_prompt(prompt);
    }

    /// Read a line of input. Safe to use as a `tokio::select!` branch.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                let trimmed = line.trim().to_string();
                if !trimmed.is_empty() {
                    self.rl.add_history_entry(trimmed.clone());
                }
                InputEvent::Message(trimmed)
            }
            Ok(ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(_) => InputEvent::Eof,
        }
    }

    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }

    /// Flush pending output and restore the terminal.
    pub fn finish(mut self) {
        let _ = self.rl.flush();
    }
}
