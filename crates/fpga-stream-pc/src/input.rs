//! Scripted button input for the PC debug host.
//!
//! One event per line:
//!
//! ```text
//! # pick level 2
//! press down
//! release down
//! tap a          # press immediately followed by release
//! ```

use std::collections::VecDeque;
use std::io::BufRead;

use fpga_stream_hal::{ButtonEvent, ButtonId, InputSource};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("unknown button '{0}'")]
    UnknownButton(String),

    #[error("'{0}' needs a button name")]
    MissingButton(String),

    #[error("unexpected trailing input '{0}'")]
    TrailingInput(String),
}

/// Parse one script line. Blank lines and comments yield no events.
pub fn parse_line(line: &str) -> Result<Vec<ButtonEvent>, ScriptError> {
    let content = line.split('#').next().unwrap_or_default();
    let mut words = content.split_whitespace();
    let Some(action) = words.next() else {
        return Ok(Vec::new());
    };
    let action = action.to_ascii_lowercase();
    let name = words
        .next()
        .ok_or_else(|| ScriptError::MissingButton(action.clone()))?
        .to_ascii_lowercase();
    if let Some(extra) = words.next() {
        return Err(ScriptError::TrailingInput(extra.to_string()));
    }
    let button = ButtonId::from_name(&name).ok_or(ScriptError::UnknownButton(name))?;

    match action.as_str() {
        "press" => Ok(vec![ButtonEvent::press(button)]),
        "release" => Ok(vec![ButtonEvent::release(button)]),
        "tap" => Ok(vec![ButtonEvent::press(button), ButtonEvent::release(button)]),
        _ => Err(ScriptError::UnknownAction(action)),
    }
}

/// Replays button events from a line-oriented script.
pub struct ScriptInput {
    reader: Box<dyn BufRead>,
    pending: VecDeque<ButtonEvent>,
    line_no: usize,
    exhausted: bool,
}

impl ScriptInput {
    pub fn new(reader: Box<dyn BufRead>) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            line_no: 0,
            exhausted: false,
        }
    }

    /// Read lines until one produces events or the script ends.
    fn refill(&mut self) {
        let mut line = String::new();
        while self.pending.is_empty() && !self.exhausted {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => self.exhausted = true,
                Ok(_) => {
                    self.line_no += 1;
                    match parse_line(&line) {
                        Ok(events) => self.pending.extend(events),
                        Err(e) => log::warn!("script line {}: {e}, skipped", self.line_no),
                    }
                }
                Err(e) => {
                    log::error!("script read failed: {e}");
                    self.exhausted = true;
                }
            }
        }
    }
}

impl InputSource for ScriptInput {
    fn init(&mut self) {
        log::info!("scripted input ready");
    }

    fn poll(&mut self) -> Option<ButtonEvent> {
        self.refill();
        self.pending.pop_front()
    }
}
