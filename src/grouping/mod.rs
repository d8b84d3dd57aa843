// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Group raw files into targets, and targets into pointings.


use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{coord::RADec, record::ObservationRecord};

/// Files that belong together, and where they point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileGroup {
    pub files: Vec<String>,
    /// The representative pointing of the group, if any of its files had a
    /// known pointing.
    #[serde(default)]
    pub pointing: Option<RADec>,
}

#[derive(Error, Debug)]
pub enum GroupingError {
    #[error("Target '{target_id}' has no pointing, so it can't be grouped by pointing")]
    MissingPointing { target_id: String },
}

/// The target ID of a raw file; everything before the last '-', e.g.
/// "SWIFT_590206" for "SWIFT_590206-140305.raw".
pub fn target_id(filename: &str) -> &str {
    filename
        .rsplit_once('-')
        .map(|(id, _)| id)
        .unwrap_or(filename)
}

/// The median of some values. With an even number of values, this is the
/// mean of the middle two.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Group files by their target ID. The pointing of each group is the
/// componentwise median of its members' pointings; the median isn't thrown
/// off by the odd mis-parsed pointing. Files without a pointing don't
/// contribute.
pub fn group_obs_by_target_id(
    files: &BTreeMap<String, ObservationRecord>,
) -> BTreeMap<String, FileGroup> {
    let mut groups: BTreeMap<String, FileGroup> = BTreeMap::new();
    for filename in files.keys() {
        groups
            .entry(target_id(filename).to_string())
            .or_default()
            .files
            .push(filename.clone());
    }

    for (id, group) in groups.iter_mut() {
        let (mut ras, mut decs): (Vec<f64>, Vec<f64>) = group
            .files
            .iter()
            .filter_map(|f| files[f].pointing_degrees)
            .map(|p| (p.ra, p.dec))
            .unzip();
        group.pointing = median(&mut ras)
            .zip(median(&mut decs))
            .map(|(ra, dec)| RADec::from_degrees(ra, dec));
        trace!("{id}: {} files, pointing {:?}", group.files.len(), group.pointing);
    }
    groups
}

/// Partition the IDs of `positions` into clusters, where each member of a
/// cluster is within `tolerance_deg` of at least one other member (a chain of
/// close pairs is enough; the ends of the chain may be far apart). Clusters
/// are keyed by their alphabetically-first member. Members are sorted.
///
/// The partition doesn't depend on the order of exploration, but seeds are
/// taken in sorted order so that logs are reproducible.
pub fn cluster_by_separation(
    positions: &BTreeMap<String, RADec>,
    tolerance_deg: f64,
) -> BTreeMap<String, Vec<String>> {
    let mut ungrouped: BTreeSet<&str> = positions.keys().map(|id| id.as_str()).collect();
    let mut clusters = BTreeMap::new();

    while let Some(seed) = ungrouped.pop_first() {
        debug!("Finding targets near {seed}");
        let mut members = vec![seed];
        let mut process_next = vec![positions[seed]];

        while !process_next.is_empty() {
            let mut newly_included = vec![];
            for pointing in &process_next {
                let close = ungrouped
                    .iter()
                    .copied()
                    .filter(|id| pointing.separation(&positions[*id]) < tolerance_deg)
                    .collect::<Vec<_>>();
                for id in close {
                    trace!("... {id} added to group");
                    ungrouped.remove(id);
                    members.push(id);
                    newly_included.push(positions[id]);
                }
            }
            process_next = newly_included;
        }

        debug!("... {} targets in group", members.len());
        members.sort_unstable();
        clusters.insert(
            members[0].to_string(),
            members.into_iter().map(str::to_string).collect(),
        );
    }
    clusters
}

/// Merge target groups whose pointings are close (see
/// [`cluster_by_separation`]). Each merged group is keyed by, and takes the
/// pointing of, its alphabetically-first target.
pub fn group_target_ids_by_pointing(
    target_groups: &BTreeMap<String, FileGroup>,
    tolerance_deg: f64,
) -> Result<BTreeMap<String, FileGroup>, GroupingError> {
    let positions = target_groups
        .iter()
        .map(|(id, group)| {
            group
                .pointing
                .map(|p| (id.clone(), p))
                .ok_or_else(|| GroupingError::MissingPointing {
                    target_id: id.clone(),
                })
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let pointing_groups = cluster_by_separation(&positions, tolerance_deg)
        .into_iter()
        .map(|(key, members)| {
            let group = FileGroup {
                files: members
                    .iter()
                    .flat_map(|id| target_groups[id].files.iter().cloned())
                    .collect(),
                pointing: Some(positions[&key]),
            };
            (key, group)
        })
        .collect();
    Ok(pointing_groups)
}
