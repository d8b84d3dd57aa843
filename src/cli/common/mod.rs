// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Arguments shared between subcommands, e.g. every subcommand that talks to
//! `reduce` needs to know how to start it.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{
    constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_WORKING_DIR},
    environment::{default_ami_dir, expand_tilde},
    params::SessionParams,
    reduce::Array,
    session::SessionConfig,
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref TIMEOUT_HELP: String =
        format!("How long to wait for reduce to respond to a command [seconds]. Default: {DEFAULT_TIMEOUT_SECS}");

    static ref WORKING_DIR_HELP: String =
        format!("The directory reduce runs in; UVFITS files are written here before being moved into place. Default: {DEFAULT_WORKING_DIR}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(AmiDriverError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(AmiDriverError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(AmiDriverError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// How to start `reduce`.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SessionArgs {
    /// Path to the AMI installation directory. Default: $AMI_DIR, or ~/ami.
    /// Keep this short (e.g. use a symlink); reduce mishandles long paths.
    #[clap(long, help_heading = "REDUCE SESSION")]
    pub(super) amidir: Option<PathBuf>,

    /// The array whose data is processed (LA or SA). Default: LA
    #[clap(long, help_heading = "REDUCE SESSION")]
    pub(super) array: Option<String>,

    #[clap(long, help = WORKING_DIR_HELP.as_str(), help_heading = "REDUCE SESSION")]
    pub(super) working_dir: Option<PathBuf>,

    #[clap(long, help = TIMEOUT_HELP.as_str(), help_heading = "REDUCE SESSION")]
    pub(super) timeout: Option<u64>,

    /// Extra environment variables for reduce, e.g. --env AMI_LOGS=/tmp
    #[clap(long, multiple_occurrences(true), help_heading = "REDUCE SESSION")]
    pub(super) env: Option<Vec<String>>,
}

impl SessionArgs {
    /// Merge with arguments from a file, preferring `self`.
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            amidir: self.amidir.or(other.amidir),
            array: self.array.or(other.array),
            working_dir: self.working_dir.or(other.working_dir),
            timeout: self.timeout.or(other.timeout),
            env: self.env.or(other.env),
        }
    }

    pub(super) fn parse(self) -> Result<SessionParams, SessionArgsError> {
        let Self {
            amidir,
            array,
            working_dir,
            timeout,
            env,
        } = self;

        let array = match array {
            Some(a) => {
                Array::from_str(&a.to_uppercase()).map_err(|_| SessionArgsError::BadArray(a))?
            }
            None => Array::Large,
        };
        let ami_dir = expand_tilde(&amidir.unwrap_or_else(default_ami_dir));
        let mut config = SessionConfig::new(ami_dir);
        if let Some(working_dir) = working_dir {
            config.working_dir = expand_tilde(&working_dir);
        }
        match timeout {
            Some(0) => return Err(SessionArgsError::ZeroTimeout),
            Some(t) => config.timeout = Duration::from_secs(t),
            None => (),
        }
        config.additional_env = env
            .unwrap_or_default()
            .into_iter()
            .map(|kv| match kv.split_once('=') {
                Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
                _ => Err(SessionArgsError::BadEnv(kv)),
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;

        let mut printer = InfoPrinter::new("reduce session".into());
        printer.push_block(vec![
            format!("AMI directory: {}", config.ami_dir.display()).into(),
            format!("Working directory: {}", config.working_dir.display()).into(),
        ]);
        printer.push_line(format!("Array: {array}").into());
        printer.push_line(format!("Command timeout: {}s", config.timeout.as_secs()).into());
        if !config.additional_env.is_empty() {
            printer.push_line(
                format!(
                    "Extra environment: {}",
                    config.additional_env.keys().join(", ")
                )
                .into(),
            );
        }
        printer.display();

        Ok(SessionParams { config, array })
    }
}

#[derive(Error, Debug)]
pub(super) enum SessionArgsError {
    #[error("'{0}' isn't an array; use LA or SA")]
    BadArray(String),

    #[error("The command timeout can't be 0")]
    ZeroTimeout,

    #[error("Environment variables must look like NAME=value, but got '{0}'")]
    BadEnv(String),
}
