// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{
    borrow::Cow,
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vec1::Vec1;

use super::common::{display_warnings, InfoPrinter, SessionArgs, Warn, ARG_FILE_HELP};
use crate::{
    constants::{DEFAULT_CALIBRATED_LISTING, DEFAULT_GROUP_NAME},
    environment::{default_output_dir, expand_tilde},
    grouping::FileGroup,
    listing::{load_listing, Datatype, ListingError},
    params::CalibrateRawfilesParams,
    scripts::{NO_CALIBRATOR_REDUCTION, STANDARD_REDUCTION},
    AmiDriverError,
};

lazy_static::lazy_static! {
    static ref OUTFILE_HELP: String =
        format!("Path to the output listing of calibrated files. Default: {DEFAULT_CALIBRATED_LISTING}");

    static ref GROUP_HELP: String =
        format!("The group name of files given with --files. Default: {DEFAULT_GROUP_NAME}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CalibrateRawfilesArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "session")]
    #[serde(default)]
    pub(super) session_args: SessionArgs,

    /// A listing of raw files to reduce, grouped (e.g. the output of
    /// list-rawfiles or filter-listing). Takes precedence over --files.
    #[clap(short, long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) listing: Option<PathBuf>,

    /// Raw files to reduce.
    #[clap(short, long, multiple_values(true), help_heading = "INPUT FILES")]
    pub(super) files: Option<Vec<String>>,

    #[clap(short, long, help = GROUP_HELP.as_str(), help_heading = "INPUT FILES")]
    pub(super) group: Option<String>,

    /// A file of reduce commands to run on each raw file instead of the
    /// standard reduction.
    #[clap(short, long, parse(from_os_str), help_heading = "REDUCTION")]
    pub(super) script: Option<PathBuf>,

    /// Use the built-in reduction for observations without a calibrator.
    #[clap(long, conflicts_with = "script", help_heading = "REDUCTION")]
    #[serde(default)]
    pub(super) no_calibrator: bool,

    /// Top-level output directory; each group is written to
    /// <TOPDIR>/<group>/ami. Default: $AMI_RESULTS, or ~/ami_results
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) topdir: Option<PathBuf>,

    #[clap(short = 'o', long, parse(from_os_str), help = OUTFILE_HELP.as_str(), help_heading = "OUTPUT FILES")]
    pub(super) outfile: Option<PathBuf>,

    /// Don't write per-file logs of reduce commands and output.
    #[clap(long, help_heading = "OUTPUT FILES")]
    #[serde(default)]
    pub(super) no_file_logs: bool,
}

impl CalibrateRawfilesArgs {
    /// Consolidate the command-line arguments with those of the argument file,
    /// preferring the command line.
    pub(super) fn merge(self) -> Result<CalibrateRawfilesArgs, AmiDriverError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let CalibrateRawfilesArgs {
                args_file: _,
                session_args,
                listing,
                files,
                group,
                script,
                no_calibrator,
                topdir,
                outfile,
                no_file_logs,
            } = unpack_arg_file!(arg_file);

            Ok(CalibrateRawfilesArgs {
                args_file: None,
                session_args: cli_args.session_args.merge(session_args),
                listing: cli_args.listing.or(listing),
                files: cli_args.files.or(files),
                group: cli_args.group.or(group),
                script: cli_args.script.or(script),
                no_calibrator: cli_args.no_calibrator || no_calibrator,
                topdir: cli_args.topdir.or(topdir),
                outfile: cli_args.outfile.or(outfile),
                no_file_logs: cli_args.no_file_logs || no_file_logs,
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<CalibrateRawfilesParams, AmiDriverError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            session_args,
            listing,
            files,
            group,
            script,
            no_calibrator,
            topdir,
            outfile,
            no_file_logs,
        } = self;

        let groups = read_groups(listing.as_deref(), files, group)?;
        let (script, script_desc) = match script {
            Some(path) => {
                let contents = std::fs::read_to_string(&path).map_err(|err| {
                    CalibrateRawfilesArgsError::ReadScript {
                        path: path.clone(),
                        err,
                    }
                })?;
                (contents, path.display().to_string())
            }
            None if no_calibrator => (
                NO_CALIBRATOR_REDUCTION.to_string(),
                "built-in (no calibrator)".to_string(),
            ),
            None => (STANDARD_REDUCTION.to_string(), "built-in".to_string()),
        };
        let session = session_args.parse()?;
        let output_dir = expand_tilde(&topdir.unwrap_or_else(default_output_dir));
        let output_listing =
            outfile.unwrap_or_else(|| PathBuf::from(DEFAULT_CALIBRATED_LISTING));

        let mut printer = InfoPrinter::new("Calibrating raw files".into());
        for (name, group) in &groups {
            let mut block: Vec<Cow<'static, str>> = vec![format!("{name}:").into()];
            block.extend(group.files.iter().map(|f| format!("  {f}").into()));
            printer.push_block(block);
        }
        printer.push_line(format!("Reduction script: {script_desc}").into());
        printer.push_block(vec![
            format!("Output directory: {}", output_dir.display()).into(),
            format!("Output listing: {}", output_listing.display()).into(),
        ]);
        printer.display();

        display_warnings();

        Ok(CalibrateRawfilesParams {
            session,
            groups,
            output_dir,
            script,
            file_logging: !no_file_logs,
            output_listing,
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

/// Get the groups of raw files to reduce, either from a listing of raw files,
/// or from individually-specified files put into one group.
fn read_groups(
    listing: Option<&Path>,
    files: Option<Vec<String>>,
    group: Option<String>,
) -> Result<BTreeMap<String, FileGroup>, CalibrateRawfilesArgsError> {
    if let Some(listing) = listing {
        if files.is_some() {
            "--files were given along with a listing; ignoring --files".warn();
        }
        info!("Reducing the files listed in {}", listing.display());
        let (groups, _) = load_listing(
            BufReader::new(File::open(listing).map_err(ListingError::from)?),
            Some(Datatype::RawFiles),
        )?;
        return Ok(groups);
    }

    let files = files
        .and_then(|f| Vec1::try_from_vec(f).ok())
        .ok_or(CalibrateRawfilesArgsError::NoInput)?;
    let group = group.unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string());
    Ok(BTreeMap::from([(
        group,
        FileGroup {
            files: files.into_vec(),
            pointing: None,
        },
    )]))
}

#[derive(Error, Debug)]
pub(super) enum CalibrateRawfilesArgsError {
    #[error("No raw files were given; use --listing or --files")]
    NoInput,

    #[error("Couldn't read the reduction script {}: {err}", path.display())]
    ReadScript {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error(transparent)]
    Listing(#[from] ListingError),
}
