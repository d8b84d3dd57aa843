// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{ami_driver, get_cmd_output, make_file_in_dir, RAWFILE_LISTING};

#[test]
fn test_calibrate_rawfiles_dry_run_with_files() {
    let tmp_dir = TempDir::new().unwrap();
    let cmd = ami_driver()
        .args([
            "calibrate-rawfiles",
            "--dry-run",
            "--amidir",
            &tmp_dir.path().display().to_string(),
            "--files",
            "GRB140327A-140328.raw",
            "SWIFT_595794-140328.raw",
            "--group",
            "GRB140327A",
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "calibrate-rawfiles failed: {:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("GRB140327A:"), "{stdout}");
    assert!(stdout.contains("SWIFT_595794-140328.raw"), "{stdout}");
    assert!(stdout.contains("Dry run -- exiting now."), "{stdout}");
}

#[test]
fn test_calibrate_rawfiles_dry_run_with_listing() {
    let tmp_dir = TempDir::new().unwrap();
    let listing = make_file_in_dir("all.json", tmp_dir.path(), RAWFILE_LISTING);
    let cmd = ami_driver()
        .args([
            "calibrate-rawfiles",
            "--dry-run",
            "--amidir",
            &tmp_dir.path().display().to_string(),
            "--listing",
            &listing.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "calibrate-rawfiles failed: {:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("XRF171205A:"), "{stdout}");
}

#[test]
fn test_calibrate_rawfiles_without_input_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let cmd = ami_driver()
        .args([
            "calibrate-rawfiles",
            "--dry-run",
            "--amidir",
            &tmp_dir.path().display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--listing or --files"), "{stderr}");
}

#[test]
fn test_calibrate_rawfiles_save_toml_round_trip() {
    let tmp_dir = TempDir::new().unwrap();
    let toml = tmp_dir.path().join("args.toml");
    let cmd = ami_driver()
        .args([
            "calibrate-rawfiles",
            "--dry-run",
            "--save-toml",
            &toml.display().to_string(),
            "--amidir",
            &tmp_dir.path().display().to_string(),
            "--files",
            "XRF171205A-171206.raw",
        ])
        .ok();
    assert!(cmd.is_ok(), "calibrate-rawfiles failed: {:?}", get_cmd_output(cmd));
    assert!(toml.exists());

    // The saved arguments are enough to repeat the run.
    let cmd = ami_driver()
        .args([
            "calibrate-rawfiles",
            "--dry-run",
            &toml.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "calibrate-rawfiles failed: {:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("XRF171205A-171206.raw"), "{stdout}");
}
