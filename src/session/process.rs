// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A real `reduce` process.

use std::{
    io::{Read, Write},
    path::PathBuf,
    process::{Child, ChildStdin, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use indexmap::IndexMap;
use log::{debug, trace, warn};

use super::{Session, SessionError, SessionState};
use crate::{
    constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_WORKING_DIR, MAX_SAFE_AMI_ROOT_LEN, PROMPT},
    environment::{check_reduce_binary, init_ami_env},
};

/// How to start `reduce`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The top directory of the AMI `reduce` installation.
    pub ami_dir: PathBuf,

    /// The directory `reduce` runs in. Temporary output files are written
    /// here, so its path should be short.
    pub working_dir: PathBuf,

    /// How long to wait for the prompt after each command.
    pub timeout: Duration,

    /// Environment variables set in addition to the AMI environment.
    pub additional_env: IndexMap<String, String>,

    /// The program (and its arguments) that runs `reduce`. `reduce` only
    /// flushes its prompt when talking to a terminal, so by default it is
    /// wrapped with `script` to give it a pseudo-terminal.
    pub launcher: Vec<String>,
}

impl SessionConfig {
    pub fn new(ami_dir: PathBuf) -> SessionConfig {
        SessionConfig {
            ami_dir,
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            additional_env: IndexMap::new(),
            launcher: [
                "script",
                "--quiet",
                "--flush",
                "--command",
                "tcsh -c reduce",
                "/dev/null",
            ]
            .into_iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// A running `reduce`, spoken to over pipes.
///
/// Output is read by a dedicated thread and handed over a channel, so waiting
/// for the prompt can be bounded by a timeout. Dropping the struct kills the
/// process.
pub struct ReduceProcess {
    child: Child,
    stdin: ChildStdin,
    rx: Receiver<Vec<u8>>,
    /// Output received but not yet returned.
    buffer: Vec<u8>,
    timeout: Duration,
    state: SessionState,
}

impl ReduceProcess {
    /// Start `reduce` and wait for its first prompt.
    pub fn spawn(config: &SessionConfig) -> Result<ReduceProcess, SessionError> {
        let SessionConfig {
            ami_dir,
            working_dir,
            timeout,
            additional_env,
            launcher,
        } = config;

        if ami_dir.as_os_str().len() > MAX_SAFE_AMI_ROOT_LEN {
            warn!(
                "Long AMI root path detected ({}); this may cause bugs. It is recommended to use a short symlink instead",
                ami_dir.display()
            );
        }
        check_reduce_binary(ami_dir)?;
        let mut env = init_ami_env(ami_dir)?;
        env.extend(additional_env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let (program, args) = match launcher.split_first() {
            Some(split) => split,
            None => {
                return Err(SessionError::Spawn {
                    program: String::new(),
                    err: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty launcher"),
                })
            }
        };
        debug!("Launching reduce with '{}'", launcher.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .env_clear()
            .envs(&env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| SessionError::Spawn {
                program: program.clone(),
                err,
            })?;

        let (stdin, mut stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                return Err(SessionError::IO(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "reduce's stdin or stdout wasn't captured",
                )))
            }
        };
        let (tx, rx) = unbounded();
        thread::spawn(move || {
            let mut chunk = [0; 4096];
            loop {
                match stdout.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut process = ReduceProcess {
            child,
            stdin,
            rx,
            buffer: vec![],
            timeout: *timeout,
            state: SessionState::AwaitingPrompt,
        };
        // Consume the boot prompt.
        process.expect_prompt("<startup>")?;
        process.state = SessionState::Idle;
        Ok(process)
    }

    /// Wait until the prompt appears in the output, returning everything
    /// before it.
    fn expect_prompt(&mut self, command: &str) -> Result<String, SessionError> {
        let prompt = PROMPT.as_bytes();
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(i) = self
                .buffer
                .windows(prompt.len())
                .position(|w| w == prompt)
            {
                let before = String::from_utf8_lossy(&self.buffer[..i]).into_owned();
                self.buffer.drain(..i + prompt.len());
                return Ok(before);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(chunk) => self.buffer.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    self.state = SessionState::Poisoned;
                    return Err(SessionError::CommunicationTimeout {
                        command: command.to_string(),
                        timeout: self.timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.state = SessionState::Poisoned;
                    return Err(SessionError::ProcessExited {
                        command: command.to_string(),
                    });
                }
            }
        }
    }
}

impl Session for ReduceProcess {
    fn send(&mut self, command: &str) -> Result<String, SessionError> {
        if self.state == SessionState::Poisoned {
            return Err(SessionError::Poisoned);
        }
        trace!("{PROMPT} {command}");

        self.state = SessionState::AwaitingPrompt;
        let written = writeln!(self.stdin, "{command}").and_then(|_| self.stdin.flush());
        if let Err(e) = written {
            self.state = SessionState::Poisoned;
            return Err(e.into());
        }

        let response = self.expect_prompt(command)?;
        self.state = SessionState::Idle;
        Ok(response)
    }
}

impl Drop for ReduceProcess {
    fn drop(&mut self) {
        // Ignore errors; the process may already be gone.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
