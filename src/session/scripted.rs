// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A fake `reduce` that replays canned responses.

use std::{collections::VecDeque, path::PathBuf, time::Duration};

use super::{Session, SessionError};

/// Replays a fixed sequence of exchanges. Each exchange pairs a fragment that
/// the sent command must contain with the text `reduce` would print. Like a
/// terminal, the command is echoed on the first line of each response.
///
/// A command that doesn't match the next exchange (or arrives when the script
/// is exhausted) behaves like a `reduce` that never returns to its prompt: a
/// [`SessionError::CommunicationTimeout`], after which the session is
/// poisoned.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    exchanges: VecDeque<(String, String)>,
    /// Every command sent, in order.
    pub sent: Vec<String>,
    poisoned: bool,
    /// If set, the ".fits" files named by "write" commands are created here,
    /// as `reduce` would.
    working_dir: Option<PathBuf>,
}

impl ScriptedSession {
    pub fn new() -> ScriptedSession {
        ScriptedSession::default()
    }

    /// Add an exchange to the end of the script.
    pub fn expect<C: Into<String>, R: Into<String>>(
        mut self,
        command_fragment: C,
        response: R,
    ) -> ScriptedSession {
        self.exchanges
            .push_back((command_fragment.into(), response.into()));
        self
    }

    /// Create the files named by "write" commands in `working_dir`.
    pub fn writing_into<P: Into<PathBuf>>(mut self, working_dir: P) -> ScriptedSession {
        self.working_dir = Some(working_dir.into());
        self
    }

    /// How many exchanges haven't happened yet?
    pub fn remaining(&self) -> usize {
        self.exchanges.len()
    }
}

impl Session for ScriptedSession {
    fn send(&mut self, command: &str) -> Result<String, SessionError> {
        if self.poisoned {
            return Err(SessionError::Poisoned);
        }
        self.sent.push(command.to_string());

        let matches_next = self
            .exchanges
            .front()
            .map_or(false, |(fragment, _)| command.contains(fragment.as_str()));
        let next = if matches_next {
            self.exchanges.pop_front()
        } else {
            None
        };
        let response = match next {
            Some((_, response)) => response,
            None => {
                self.poisoned = true;
                return Err(SessionError::CommunicationTimeout {
                    command: command.to_string(),
                    timeout: Duration::ZERO,
                });
            }
        };

        if let (Some(dir), true) = (&self.working_dir, command.starts_with("write ")) {
            for name in command.split_whitespace().filter(|t| t.ends_with(".fits")) {
                std::fs::write(dir.join(name), b"SIMPLE")?;
            }
        }
        Ok(format!("{command}\r\n{response}"))
    }
}
