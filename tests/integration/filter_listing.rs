// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs::read_to_string;

use serde_json::Value;
use tempfile::TempDir;

use crate::{ami_driver, get_cmd_output, make_file_in_dir, RAWFILE_LISTING};

#[test]
fn test_filter_listing_keeps_matching_groups() {
    let tmp_dir = TempDir::new().unwrap();
    let listing = make_file_in_dir("all.json", tmp_dir.path(), RAWFILE_LISTING);
    let output = tmp_dir.path().join("swift.json");

    let cmd = ami_driver()
        .args([
            "filter-listing",
            &listing.display().to_string(),
            "swift",
            "-o",
            &output.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "filter-listing failed: {:?}", get_cmd_output(cmd));

    let doc: Value = serde_json::from_str(&read_to_string(&output).unwrap()).unwrap();
    let obj = doc.as_object().unwrap();
    assert_eq!(obj["#DATATYPE"], "AMILA_RAWFILES");
    assert!(obj.contains_key("GRB140327A"));
    assert!(!obj.contains_key("XRF171205A"));
    assert_eq!(obj["GRB140327A"]["files"].as_array().unwrap().len(), 2);
}

#[test]
fn test_filter_listing_without_matches_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let listing = make_file_in_dir("all.json", tmp_dir.path(), RAWFILE_LISTING);
    let output = tmp_dir.path().join("nothing.json");

    let cmd = ami_driver()
        .args([
            "filter-listing",
            &listing.display().to_string(),
            "NGC",
            "-o",
            &output.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("NGC"), "{stderr}");
    assert!(!output.exists());
}

#[test]
fn test_filter_listing_rejects_calibrated_listing() {
    let tmp_dir = TempDir::new().unwrap();
    let listing = make_file_in_dir(
        "calibrated.json",
        tmp_dir.path(),
        &RAWFILE_LISTING.replace("AMILA_RAWFILES", "AMILA_CALIBRATED_UVFITS"),
    );

    let cmd = ami_driver()
        .current_dir(tmp_dir.path())
        .args(["filter-listing", &listing.display().to_string(), "GRB"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("AMILA_CALIBRATED_UVFITS"), "{stderr}");
    assert!(!tmp_dir.path().join("GRB_rawfiles.json").exists());
}

#[test]
fn test_filter_listing_rejects_untagged_listing() {
    let tmp_dir = TempDir::new().unwrap();
    let listing = make_file_in_dir(
        "untagged.json",
        tmp_dir.path(),
        r#"{"GRB140327A": {"files": ["GRB140327A-140328.raw"]}}"#,
    );

    let cmd = ami_driver()
        .current_dir(tmp_dir.path())
        .args(["filter-listing", &listing.display().to_string(), "GRB"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("#DATATYPE"), "{stderr}");
}

#[test]
fn test_filter_listing_default_output_name() {
    let tmp_dir = TempDir::new().unwrap();
    let listing = make_file_in_dir("all.json", tmp_dir.path(), RAWFILE_LISTING);

    let cmd = ami_driver()
        .current_dir(tmp_dir.path())
        .args(["filter-listing", &listing.display().to_string(), "XRF"])
        .ok();
    assert!(cmd.is_ok(), "filter-listing failed: {:?}", get_cmd_output(cmd));
    assert!(tmp_dir.path().join("XRF_rawfiles.json").exists());
}
