// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod calibrate_rawfiles;
mod filter_listing;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::str::from_utf8;

use assert_cmd::{output::OutputError, Command};
use indoc::indoc;

fn ami_driver() -> Command {
    Command::cargo_bin("ami-driver").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

fn make_file_in_dir<T: AsRef<Path>, U: AsRef<Path>>(
    filename: T,
    dir: U,
    contents: &str,
) -> PathBuf {
    let path = dir.as_ref().join(filename);
    let mut f = File::create(&path).expect("couldn't make file");
    f.write_all(contents.as_bytes()).unwrap();
    path
}

/// A raw-file listing grouped by pointing, as list-rawfiles would write it.
const RAWFILE_LISTING: &str = indoc! {r##"
    {
      "#DATATYPE": "AMILA_RAWFILES",
      "GRB140327A": {
        "files": [
          "GRB140327A-140328.raw",
          "SWIFT_595794-140328.raw"
        ],
        "pointing": [
          268.30141667,
          18.88333333
        ]
      },
      "XRF171205A": {
        "files": [
          "XRF171205A-171206.raw"
        ],
        "pointing": [
          12.0,
          -12.5
        ]
      }
    }
"##};
