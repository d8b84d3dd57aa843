// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use crate::{parse::ParseError, session::SessionError};

#[derive(Error, Debug)]
pub enum ReduceError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{filename}: {err}")]
    Parse {
        filename: String,
        #[source]
        err: ParseError,
    },

    #[error("{0} isn't one of the files listed by reduce")]
    UnknownFile(String),

    #[error("No file has been made active")]
    NoActiveFile,

    #[error("Couldn't move {} to {}: {err}", from.display(), to.display())]
    ArtifactMove {
        from: PathBuf,
        to: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("Couldn't write file metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl ReduceError {
    /// Did this error come from the session itself? If so, the session can't
    /// be used any more; any other error only affects the current file.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self, ReduceError::Session(_))
    }
}
