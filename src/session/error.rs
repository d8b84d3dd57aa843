// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::time::Duration;

use thiserror::Error;

use crate::environment::EnvironmentError;

/// Errors talking to `reduce`. Apart from [`SessionError::Configuration`],
/// which happens before a session exists, all of these leave the session
/// unusable.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("reduce didn't return to its prompt within {timeout:?} (last command: '{command}')")]
    CommunicationTimeout { command: String, timeout: Duration },

    #[error("reduce exited unexpectedly (last command: '{command}')")]
    ProcessExited { command: String },

    #[error("This reduce session previously failed and can't be reused")]
    Poisoned,

    #[error("Couldn't start reduce: {0}")]
    Configuration(#[from] EnvironmentError),

    #[error("Couldn't launch '{program}': {err}")]
    Spawn { program: String, err: std::io::Error },

    #[error("IO error when talking to reduce: {0}")]
    IO(#[from] std::io::Error),
}
