// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-file logs of everything sent to and received from `reduce`.
//!
//! For a raw file "X.raw", the commands go to "X.ami.commands" and the full
//! transcript goes to "X.ami.log". The logs belong to the active file only;
//! they are flushed and closed when another file becomes active (or when they
//! are dropped).

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use log::warn;

use crate::constants::PROMPT;

#[derive(Default)]
pub(crate) struct FileLogs {
    transcript: Option<BufWriter<File>>,
    commands: Option<BufWriter<File>>,
}

impl FileLogs {
    /// Logs that go nowhere.
    pub(crate) fn discard() -> FileLogs {
        FileLogs::default()
    }

    /// Create (truncating) the log files for `rawfile` in `log_dir`.
    pub(crate) fn create(log_dir: &Path, rawfile: &str) -> std::io::Result<FileLogs> {
        fs::create_dir_all(log_dir)?;
        let target = super::obs_name(rawfile);
        let transcript = File::create(log_dir.join(format!("{target}.ami.log")))?;
        let commands = File::create(log_dir.join(format!("{target}.ami.commands")))?;
        Ok(FileLogs {
            transcript: Some(BufWriter::new(transcript)),
            commands: Some(BufWriter::new(commands)),
        })
    }

    pub(crate) fn log_command(&mut self, command: &str) -> std::io::Result<()> {
        if let Some(commands) = self.commands.as_mut() {
            writeln!(commands, "{command}")?;
        }
        Ok(())
    }

    pub(crate) fn log_response(&mut self, response: &str) -> std::io::Result<()> {
        if let Some(transcript) = self.transcript.as_mut() {
            writeln!(transcript, "{PROMPT}{response}")?;
        }
        Ok(())
    }

    /// Flush and close the logs. Further logging is discarded.
    pub(crate) fn close(&mut self) -> std::io::Result<()> {
        for mut log in [self.transcript.take(), self.commands.take()]
            .into_iter()
            .flatten()
        {
            log.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileLogs {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Couldn't flush per-file logs: {e}");
        }
    }
}
