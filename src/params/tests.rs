// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{collections::BTreeMap, fs::File, path::PathBuf};

use tempfile::TempDir;

use super::*;
use crate::{
    coord::RADec,
    grouping::FileGroup,
    listing::{load_listing, Datatype},
    record::ObservationRecord,
    session::ScriptedSession,
};

fn group(files: &[&str]) -> FileGroup {
    FileGroup {
        files: files.iter().map(|f| f.to_string()).collect(),
        pointing: None,
    }
}

#[test]
fn test_filter_groups_ignores_case() {
    let groups = BTreeMap::from([
        ("A".to_string(), group(&["SWIFT_1-1.raw", "other-1.raw"])),
        ("B".to_string(), group(&["GRB_2-1.raw"])),
        ("C".to_string(), group(&[])),
    ]);
    let matches = filter_groups(groups.clone(), "swift");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches["A"], groups["A"]);

    assert!(filter_groups(groups, "nothing").is_empty());
}

#[test]
fn test_filter_listing_writes_matches() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("all.json");
    let output = tmp_dir.path().join("out.json");
    let groups = BTreeMap::from([
        ("A".to_string(), group(&["SWIFT_1-1.raw"])),
        ("B".to_string(), group(&["GRB_2-1.raw"])),
    ]);
    crate::listing::save_listing(&groups, Datatype::RawFiles, File::create(&input).unwrap())
        .unwrap();

    let params = FilterListingParams {
        listing: input.clone(),
        pattern: "grb".to_string(),
        output: output.clone(),
    };
    params.run().unwrap();
    let (written, _) =
        load_listing::<FileGroup, _>(File::open(&output).unwrap(), Some(Datatype::RawFiles))
            .unwrap();
    assert_eq!(written.keys().collect::<Vec<_>>(), ["B"]);

    let params = FilterListingParams {
        listing: input,
        pattern: "xrb".to_string(),
        output,
    };
    assert!(matches!(params.run(), Err(ProcessingError::NoMatches(p)) if p == "xrb"));
}

#[test]
fn test_write_rawfile_listings() {
    let tmp_dir = TempDir::new().unwrap();
    let prefix = tmp_dir.path().join("rawfiles");
    let record = |ra: f64, dec: f64| ObservationRecord {
        pointing_degrees: Some(RADec::from_degrees(ra, dec)),
        raw_obs_text: Some("listing".to_string()),
        ..Default::default()
    };
    let files = BTreeMap::from([
        ("GRB-1.raw".to_string(), record(50.0, 30.0)),
        ("GRB-2.raw".to_string(), record(50.2, 30.0)),
        ("SWIFT-1.raw".to_string(), record(50.1, 30.1)),
        ("XRB-1.raw".to_string(), record(200.0, -10.0)),
        // Never parsed.
        ("BAD-1.raw".to_string(), ObservationRecord::default()),
    ]);

    let paths = write_rawfile_listings(files, prefix.to_str().unwrap(), false, 0.5).unwrap();
    assert_eq!(paths.metadata, PathBuf::from(format!("{}_metadata.json", prefix.display())));

    let (metadata, _) = load_listing::<ObservationRecord, _>(
        File::open(&paths.metadata).unwrap(),
        Some(Datatype::RawFiles),
    )
    .unwrap();
    assert_eq!(metadata.len(), 5);
    assert!(metadata.values().all(|r| r.raw_obs_text.is_none()));

    let (by_id, _) =
        load_listing::<FileGroup, _>(File::open(&paths.by_id).unwrap(), Some(Datatype::RawFiles))
            .unwrap();
    assert_eq!(
        by_id.keys().collect::<Vec<_>>(),
        ["BAD", "GRB", "SWIFT", "XRB"]
    );
    assert_eq!(by_id["GRB"].files, ["GRB-1.raw", "GRB-2.raw"]);

    let (by_pointing, _) = load_listing::<FileGroup, _>(
        File::open(&paths.by_pointing).unwrap(),
        Some(Datatype::RawFiles),
    )
    .unwrap();
    assert_eq!(by_pointing.keys().collect::<Vec<_>>(), ["GRB", "XRB"]);
    assert_eq!(
        by_pointing["GRB"].files,
        ["GRB-1.raw", "GRB-2.raw", "SWIFT-1.raw"]
    );
}

#[test]
fn test_raw_text_can_be_kept() {
    let tmp_dir = TempDir::new().unwrap();
    let prefix = tmp_dir.path().join("rawfiles");
    let files = BTreeMap::from([(
        "GRB-1.raw".to_string(),
        ObservationRecord {
            pointing_degrees: Some(RADec::from_degrees(50.0, 30.0)),
            raw_obs_text: Some("listing".to_string()),
            ..Default::default()
        },
    )]);
    let paths = write_rawfile_listings(files, prefix.to_str().unwrap(), true, 0.5).unwrap();
    let (metadata, _) =
        load_listing::<ObservationRecord, _>(File::open(&paths.metadata).unwrap(), None).unwrap();
    assert_eq!(metadata["GRB-1.raw"].raw_obs_text.as_deref(), Some("listing"));
}

const FILES: &str = "\
 Files available:\r
SWIFT_a-140305.raw   1.08 hrs\r
\r
 1 file\r
\r
";

const LISTING: &str = "\
\r
SWIFT_a-140305.raw\r
 SWIFT_a field observation\r
 Tracking    : 17 53 12.34   18 53 00.0 J2000\r
 Observed on : 05/03/2014\r
 Start time  : 13.55.49 UT   01.23.45 ST   56721.580428 MJD\r
 Stop time   : 15.00.50 UT   02.28.57 ST   56721.625579 MJD\r
";

/// A session that can reduce SWIFT_a-140305.raw once.
fn good_session(working_dir: &std::path::Path) -> ScriptedSession {
    ScriptedSession::new()
        .expect("list files", FILES)
        .expect("list comment", "\r\n")
        .expect("file SWIFT_a", "\r\n")
        .expect("list observation SWIFT_a", LISTING)
        .expect("show flagging", "\r\nTotal of 5 samples flagged =  3.00%\r\n")
        .expect("write fits", "\r\n")
        .writing_into(working_dir)
}

#[test]
fn test_process_data_groups() {
    let working_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let groups = BTreeMap::from([
        // An unknown file is skipped, and the group carries on.
        (
            "GOOD".to_string(),
            group(&["UNKNOWN-1.raw", "SWIFT_a-140305.raw"]),
        ),
        // The session dies on the first file, so the second is never tried.
        (
            "HUNG".to_string(),
            group(&["SWIFT_a-140305.raw", "SWIFT_a-140305.raw"]),
        ),
        // The session can't even be started.
        ("NOSESSION".to_string(), group(&["SWIFT_a-140305.raw"])),
    ]);

    let mut sessions = vec![
        Ok(good_session(working_dir.path())),
        // Answers the registry queries, then hangs.
        Ok(ScriptedSession::new()
            .expect("list files", FILES)
            .expect("list comment", "\r\n")),
        Err(ProcessingError::NoMatches("stand-in for a spawn failure".to_string())),
    ]
    .into_iter();
    let mut num_opened = 0;
    let processed = process_data_groups(&groups, output_dir.path(), "", true, || {
        num_opened += 1;
        let session = sessions.next().unwrap()?;
        Ok(Reduce::new(
            session,
            crate::reduce::Array::Small,
            working_dir.path().to_path_buf(),
        )?)
    });

    // One session per group.
    assert_eq!(num_opened, 3);
    assert_eq!(processed.len(), 1);
    let record = &processed["SWIFT_a-140305.raw"];
    assert_eq!(record.group_name.as_deref(), Some("GOOD"));
    assert!(record
        .target_uvfits
        .as_ref()
        .unwrap()
        .starts_with(output_dir.path().canonicalize().unwrap().join("GOOD").join("ami")));
    assert!(output_dir
        .path()
        .join("GOOD/ami/SWIFT_a-140305.ami.commands")
        .exists());
    // The group directory is only made once a session is running.
    assert!(output_dir.path().join("HUNG/ami").exists());
    assert!(!output_dir.path().join("NOSESSION").exists());
}
