// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Request/response exchanges with `reduce`.
//!
//! `reduce` is interactive; a command is written as a line and its response is
//! everything printed before the prompt ([`PROMPT`]) appears again. Only one
//! command is ever in flight. Anything that can do this exchange is a
//! [`Session`], so the code that interprets responses can be driven by a
//! [`ScriptedSession`] in tests rather than a real [`ReduceProcess`].

mod error;
mod process;
mod scripted;

pub use error::SessionError;
pub use process::{ReduceProcess, SessionConfig};
pub use scripted::ScriptedSession;

#[cfg(doc)]
use crate::constants::PROMPT;

/// Something that can send a command to `reduce` and wait for the response.
pub trait Session {
    /// Send a single command line and block until the prompt reappears. The
    /// returned text is everything printed after the previous prompt, which
    /// normally starts with the terminal's echo of the command.
    ///
    /// Any error is fatal to the session; it must be discarded afterwards.
    fn send(&mut self, command: &str) -> Result<String, SessionError>;
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn send(&mut self, command: &str) -> Result<String, SessionError> {
        (**self).send(command)
    }
}

/// The state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    /// Ready for a command.
    Idle,
    /// A command was sent and the prompt hasn't been seen yet.
    AwaitingPrompt,
    /// An exchange failed; nothing more can be sent.
    Poisoned,
}
