// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    collections::BTreeMap,
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::{error, info, warn};

use super::{create_file, ProcessingError, SessionParams};
use crate::{
    grouping::FileGroup,
    listing::{save_listing, Datatype},
    record::ObservationRecord,
    reduce::{process_rawfile, Reduce},
    session::Session,
};

pub struct CalibrateRawfilesParams {
    pub session: SessionParams,
    pub groups: BTreeMap<String, FileGroup>,
    /// Each group's products go into `<output_dir>/<group>/ami`.
    pub output_dir: PathBuf,
    pub script: String,
    /// Write per-file command logs and transcripts next to the products.
    pub file_logging: bool,
    /// Where to write the listing of calibrated files.
    pub output_listing: PathBuf,
}

impl CalibrateRawfilesParams {
    pub fn run(&self) -> Result<(), ProcessingError> {
        let processed = process_data_groups(
            &self.groups,
            &self.output_dir,
            &self.script,
            self.file_logging,
            || self.session.open(),
        );
        info!(
            "Calibrated {} of {} files",
            processed.len(),
            self.groups.values().map(|g| g.files.len()).sum::<usize>()
        );

        save_listing(
            &processed,
            Datatype::CalibratedUvfits,
            BufWriter::new(create_file(&self.output_listing)?),
        )?;
        info!(
            "Wrote calibrated file listing to {}",
            self.output_listing.display()
        );
        Ok(())
    }
}

/// Reduce every file of every group with `script`, each group with a fresh
/// session from `open_session`. The records of successfully-reduced files are
/// returned, with their group names.
///
/// A file that fails (e.g. a response can't be parsed, or the products can't
/// be moved) is logged and skipped. If the session itself fails, the rest of
/// the group is abandoned along with the session.
pub fn process_data_groups<S, F>(
    groups: &BTreeMap<String, FileGroup>,
    output_dir: &Path,
    script: &str,
    file_logging: bool,
    mut open_session: F,
) -> BTreeMap<String, ObservationRecord>
where
    S: Session,
    F: FnMut() -> Result<Reduce<S>, ProcessingError>,
{
    let mut processed = BTreeMap::new();
    for (group_name, group) in groups {
        let group_dir = output_dir.join(group_name).join("ami");
        if let Err(e) = process_group(
            group_name,
            group,
            &group_dir,
            script,
            file_logging,
            &mut open_session,
            &mut processed,
        ) {
            error!("Abandoning group {group_name}: {e}");
        }
    }
    processed
}

fn process_group<S, F>(
    group_name: &str,
    group: &FileGroup,
    group_dir: &Path,
    script: &str,
    file_logging: bool,
    open_session: &mut F,
    processed: &mut BTreeMap<String, ObservationRecord>,
) -> Result<(), ProcessingError>
where
    S: Session,
    F: FnMut() -> Result<Reduce<S>, ProcessingError>,
{
    let mut reduce = open_session()?;
    fs::create_dir_all(group_dir)?;
    info!(
        "Calibrating {} rawfiles of {group_name} into {}",
        group.files.len(),
        group_dir.display()
    );

    for rawfile in &group.files {
        match process_rawfile(&mut reduce, rawfile, group_dir, file_logging, script) {
            Ok(mut record) => {
                record.group_name = Some(group_name.to_string());
                processed.insert(rawfile.clone(), record);
            }
            Err(e) if e.is_fatal_to_session() => return Err(e.into()),
            Err(e) => warn!("Couldn't reduce {rawfile}: {e}"),
        }
    }
    Ok(())
}
