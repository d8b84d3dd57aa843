// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::{params::FilterListingParams, AmiDriverError};

#[derive(Parser, Debug)]
pub(super) struct FilterListingArgs {
    /// Path to a listing of raw files grouped by target or pointing.
    #[clap(name = "LISTING", parse(from_os_str))]
    listing: PathBuf,

    /// Keep the groups with any file whose name contains this (case
    /// insensitive).
    #[clap(name = "MATCH")]
    pattern: String,

    /// Path to the output listing. Default: <MATCH>_rawfiles.json
    #[clap(short = 'o', long, parse(from_os_str))]
    outfile: Option<PathBuf>,
}

impl FilterListingArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), AmiDriverError> {
        let Self {
            listing,
            pattern,
            outfile,
        } = self;
        if pattern.is_empty() {
            return Err(AmiDriverError::Generic(
                "The string to match can't be empty".to_string(),
            ));
        }
        let output = outfile.unwrap_or_else(|| PathBuf::from(format!("{pattern}_rawfiles.json")));
        info!(
            "Filtering {} for '{pattern}' into {}",
            listing.display(),
            output.display()
        );

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        FilterListingParams {
            listing,
            pattern,
            output,
        }
        .run()?;
        Ok(())
    }
}
