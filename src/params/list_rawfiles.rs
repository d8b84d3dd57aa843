// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{collections::BTreeMap, io::BufWriter, path::PathBuf};

use log::{info, warn};

use super::{create_file, ProcessingError, SessionParams};
use crate::{
    grouping::{group_obs_by_target_id, group_target_ids_by_pointing},
    listing::{save_listing, Datatype},
    record::ObservationRecord,
};

pub struct ListRawfilesParams {
    pub session: SessionParams,
    /// Prefix of the output listings.
    pub output_prefix: String,
    /// Keep each file's verbatim observation listing in the metadata output.
    pub keep_raw_text: bool,
    pub pointing_tolerance_deg: f64,
}

/// Where [`write_rawfile_listings`] put things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawfileListingPaths {
    pub metadata: PathBuf,
    pub by_id: PathBuf,
    pub by_pointing: PathBuf,
}

impl RawfileListingPaths {
    pub fn new(prefix: &str) -> RawfileListingPaths {
        RawfileListingPaths {
            metadata: PathBuf::from(format!("{prefix}_metadata.json")),
            by_id: PathBuf::from(format!("{prefix}_by_id.json")),
            by_pointing: PathBuf::from(format!("{prefix}_by_pointing.json")),
        }
    }
}

impl ListRawfilesParams {
    pub fn run(&self) -> Result<(), ProcessingError> {
        let mut reduce = self.session.open()?;
        reduce.load_obs_info()?;
        write_rawfile_listings(
            reduce.into_files(),
            &self.output_prefix,
            self.keep_raw_text,
            self.pointing_tolerance_deg,
        )?;
        Ok(())
    }
}

/// Write three raw-file listings: the metadata of every file, files grouped by
/// target ID, and target groups merged by pointing.
///
/// Targets without any parsed pointing can't be grouped by pointing; they are
/// left out of the pointing listing (with a warning).
pub fn write_rawfile_listings(
    mut files: BTreeMap<String, ObservationRecord>,
    prefix: &str,
    keep_raw_text: bool,
    pointing_tolerance_deg: f64,
) -> Result<RawfileListingPaths, ProcessingError> {
    let paths = RawfileListingPaths::new(prefix);

    if !keep_raw_text {
        for record in files.values_mut() {
            record.raw_obs_text = None;
        }
    }
    save_listing(
        &files,
        Datatype::RawFiles,
        BufWriter::new(create_file(&paths.metadata)?),
    )?;
    info!("Wrote file metadata to {}", paths.metadata.display());

    info!("Grouping observations by target ID");
    let mut id_groups = group_obs_by_target_id(&files);
    save_listing(
        &id_groups,
        Datatype::RawFiles,
        BufWriter::new(create_file(&paths.by_id)?),
    )?;
    info!("Wrote ID-grouped listing to {}", paths.by_id.display());

    info!("Grouping targets by pointing");
    id_groups.retain(|id, group| {
        if group.pointing.is_none() {
            warn!(
                "Target {id} has no parsed pointing; leaving its {} file(s) out of the pointing groups",
                group.files.len()
            );
        }
        group.pointing.is_some()
    });
    let pointing_groups = group_target_ids_by_pointing(&id_groups, pointing_tolerance_deg)?;
    save_listing(
        &pointing_groups,
        Datatype::RawFiles,
        BufWriter::new(create_file(&paths.by_pointing)?),
    )?;
    info!(
        "Wrote pointing-grouped listing to {}",
        paths.by_pointing.display()
    );

    Ok(paths)
}
