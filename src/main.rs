// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::Parser;

use ami_driver::AmiDriver;

fn main() {
    // Errors are displayed with their Display impl rather than Debug, which is
    // what returning a Result from main would do.
    if let Err(e) = AmiDriver::parse().run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
