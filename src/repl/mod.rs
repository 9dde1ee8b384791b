//! Interactive chat loop
//!
//! Reads a line, hands it to the tutor, prints the outcome. `exit`, Ctrl-C
//! and Ctrl-D end the loop; empty lines are ignored.

pub mod display;
pub mod input;

use anyhow::Result;
use tracing::warn;

use crate::session::SessionState;
use crate::tutor::Tutor;
use input::{is_exit_command, InputEvent, InputHandler};

pub struct ChatSession {
    tutor: Tutor,
    input: InputHandler,
    session: SessionState,
}

impl ChatSession {
    pub fn new(tutor: Tutor) -> Result<Self> {
        let input = match dirs::home_dir() {
            Some(home) => InputHandler::with_history(home.join(".studybuddy").join("history"))?,
            None => InputHandler::new()?,
        };

        Ok(Self {
            tutor,
            input,
            session: SessionState::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        display::show_banner(env!("CARGO_PKG_VERSION"), self.tutor.retriever().store().len());

        loop {
            let line = match self.input.read_line()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted | InputEvent::Eof => break,
            };

            if line.is_empty() {
                continue;
            }
            if is_exit_command(&line) {
                break;
            }

            let session = std::mem::take(&mut self.session);
            let (session, outcome) = self.tutor.turn(session, &line).await;
            self.session = session;

            display::show_outcome(&outcome);
        }

        display::show_goodbye();

        if let Err(e) = self.input.save_history() {
            warn!(error = %e, "Could not save input history");
        }

        Ok(())
    }
}
