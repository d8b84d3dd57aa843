// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.
 */

/// The prompt printed by `reduce` when it is ready for a command.
pub const PROMPT: &str = "AMI-reduce>";

/// The default amount of time to wait for `reduce` to return to its prompt
/// \[seconds\].
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Target ids closer than this are merged into the same pointing group
/// \[degrees\].
pub const DEFAULT_POINTING_TOLERANCE_DEG: f64 = 0.5;

/// The running maximum of flagged-sample percentages starts here before any
/// flagging command has reported.
pub const FLAGGING_SEED_PERCENT: f64 = 0.0;

/// `reduce` misbehaves with long paths; AMI root directories longer than this
/// generate a warning.
pub const MAX_SAFE_AMI_ROOT_LEN: usize = 16;

/// The key holding the data type of a listing document.
pub const DATATYPE_KEY: &str = "#DATATYPE";

/// Files specified individually on the command line are put in this group.
pub const DEFAULT_GROUP_NAME: &str = "NOGROUP";

/// The default output listing of calibrated files.
pub const DEFAULT_CALIBRATED_LISTING: &str = "calibrated_files.json";

/// The default prefix of the listings generated from all raw files.
pub const DEFAULT_LISTING_PREFIX: &str = "all_ami_rawfiles";

/// The default working directory of a `reduce` session.
pub const DEFAULT_WORKING_DIR: &str = "/tmp";
