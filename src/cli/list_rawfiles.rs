// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, SessionArgs, Warn, ARG_FILE_HELP};
use crate::{
    constants::{DEFAULT_LISTING_PREFIX, DEFAULT_POINTING_TOLERANCE_DEG},
    params::{ListRawfilesParams, RawfileListingPaths},
    AmiDriverError,
};

lazy_static::lazy_static! {
    static ref OUTFILE_HELP: String =
        format!("Prefix of the output listings; <prefix>_metadata.json, <prefix>_by_id.json and <prefix>_by_pointing.json are written. Default: {DEFAULT_LISTING_PREFIX}");

    static ref TOLERANCE_HELP: String =
        format!("Targets closer than this are put in the same pointing group [degrees]. Default: {DEFAULT_POINTING_TOLERANCE_DEG}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ListRawfilesArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "session")]
    #[serde(default)]
    pub(super) session_args: SessionArgs,

    #[clap(short = 'o', long, help = OUTFILE_HELP.as_str(), help_heading = "OUTPUT FILES")]
    pub(super) outfile: Option<String>,

    /// Keep each file's verbatim observation listing in the metadata output
    /// (useful for debugging parse failures).
    #[clap(long, help_heading = "OUTPUT FILES")]
    #[serde(default)]
    pub(super) rawtext: bool,

    #[clap(long, help = TOLERANCE_HELP.as_str())]
    pub(super) tolerance: Option<f64>,
}

impl ListRawfilesArgs {
    /// Consolidate the command-line arguments with those of the argument file,
    /// preferring the command line.
    pub(super) fn merge(self) -> Result<ListRawfilesArgs, AmiDriverError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let ListRawfilesArgs {
                args_file: _,
                session_args,
                outfile,
                rawtext,
                tolerance,
            } = unpack_arg_file!(arg_file);

            Ok(ListRawfilesArgs {
                args_file: None,
                session_args: cli_args.session_args.merge(session_args),
                outfile: cli_args.outfile.or(outfile),
                rawtext: cli_args.rawtext || rawtext,
                tolerance: cli_args.tolerance.or(tolerance),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<ListRawfilesParams, AmiDriverError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            session_args,
            outfile,
            rawtext,
            tolerance,
        } = self;

        let session = session_args.parse()?;
        let output_prefix = outfile.unwrap_or_else(|| DEFAULT_LISTING_PREFIX.to_string());
        let pointing_tolerance_deg = match tolerance {
            Some(t) if t > 0.0 => t,
            Some(t) => {
                return Err(AmiDriverError::Generic(format!(
                    "The pointing tolerance must be positive, but got {t}"
                )))
            }
            None => DEFAULT_POINTING_TOLERANCE_DEG,
        };
        if pointing_tolerance_deg > 5.0 {
            format!("A pointing tolerance of {pointing_tolerance_deg}° is unusually large; unrelated targets may be grouped together").warn();
        }

        let paths = RawfileListingPaths::new(&output_prefix);
        let mut printer = InfoPrinter::new("Listing raw files".into());
        printer.push_block(vec![
            format!("Metadata:    {}", paths.metadata.display()).into(),
            format!("By target:   {}", paths.by_id.display()).into(),
            format!("By pointing: {}", paths.by_pointing.display()).into(),
        ]);
        printer.push_line(format!("Pointing tolerance: {pointing_tolerance_deg}°").into());
        if rawtext {
            printer.push_line("Keeping raw observation listings".into());
        }
        printer.display();

        display_warnings();

        Ok(ListRawfilesParams {
            session,
            output_prefix,
            keep_raw_text: rawtext,
            pointing_tolerance_deg,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), AmiDriverError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}
