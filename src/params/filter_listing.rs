// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
};

use log::info;

use super::{create_file, ProcessingError};
use crate::{
    grouping::FileGroup,
    listing::{load_listing, save_listing, Datatype},
};

pub struct FilterListingParams {
    pub listing: PathBuf,
    pub pattern: String,
    pub output: PathBuf,
}

impl FilterListingParams {
    pub fn run(&self) -> Result<(), ProcessingError> {
        let (groups, _) = load_listing::<FileGroup, _>(
            BufReader::new(File::open(&self.listing)?),
            Some(Datatype::RawFiles),
        )?;
        let num_groups = groups.len();
        let matches = filter_groups(groups, &self.pattern);
        if matches.is_empty() {
            return Err(ProcessingError::NoMatches(self.pattern.clone()));
        }
        info!(
            "{} of {num_groups} groups match '{}'",
            matches.len(),
            self.pattern
        );

        save_listing(
            &matches,
            Datatype::RawFiles,
            BufWriter::new(create_file(&self.output)?),
        )?;
        info!("Wrote matching groups to {}", self.output.display());
        Ok(())
    }
}

/// Keep the groups that have any file whose name contains `pattern`, ignoring
/// case.
pub fn filter_groups(
    groups: BTreeMap<String, FileGroup>,
    pattern: &str,
) -> BTreeMap<String, FileGroup> {
    let pattern = pattern.to_uppercase();
    groups
        .into_iter()
        .filter(|(_, group)| {
            group
                .files
                .iter()
                .any(|f| f.to_uppercase().contains(&pattern))
        })
        .collect()
}
