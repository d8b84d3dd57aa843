// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reduction scripts, i.e. the `reduce` commands run on each raw file.
//!
//! A trailing `\` tells `reduce` to use defaults for any unspecified
//! arguments. In "flag" commands, the "no" after "field" refers to updating the
//! entry in the observation database, which should never be necessary.

/// The standard reduction for an observation with a calibrator.
pub const STANDARD_REDUCTION: &str = r"version
flag all
flag int \
flag amp field no \
flag data \
update pcal \
subtract modmeans \
subtract zeros \
subtract means \
fft \
frotate forward y n \
apply rain \
flag amp field no 0.95 1 yes \
flag amp field no 0.15 30 yes \
flag amp field yes no 60 \
frotate forward n y \
cal inter \
reweight \
show flagging no yes \
smooth 20 \
show flagging no yes \
flag bad calibrator \
flag amp field no 0.25 1 yes \
smooth 10 \
flag amp field no 0.075 1 yes \
scan dat cal yes \
scan dat field yes \
show flagging no yes \
";

/// The reduction for an observation without a calibrator.
pub const NO_CALIBRATOR_REDUCTION: &str = r"version
flag all
flag int \
flag amp no \
flag data \
update pcal \
subtract modmeans \
subtract zeros \
subtract means \
fft \
frotate forward y n \
apply rain \
flag amp  no 0.95 1 yes \
flag amp  no 0.15 30 yes \
flag amp  yes no 60 \
frotate forward n y \
cal inter \
reweight \
show flagging no yes \
smooth 20 \
show flagging no yes \
flag bad \
flag amp no 0.25 1 yes \
smooth 10 \
flag amp  no 0.075 1 yes \
scan dat yes \
show flagging no yes \
";

/// Split a script into its commands. Blank lines are skipped.
pub fn script_commands(script: &str) -> impl Iterator<Item = &str> {
    script.lines().filter(|l| !l.trim().is_empty())
}

/// The arguments to the "write" command, which writes UVFITS files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCommandArgs {
    /// "fits", or "multi" for raster observations.
    pub fits_or_multi: String,
    pub if_severely_flagged: String,
    /// Empty, or "all" for raster observations.
    pub offsets: String,
    pub baselines: String,
    pub channels: String,
    pub sample_range: String,
}

impl Default for WriteCommandArgs {
    fn default() -> Self {
        WriteCommandArgs {
            fits_or_multi: "fits".to_string(),
            if_severely_flagged: "yes".to_string(),
            offsets: String::new(),
            baselines: "all".to_string(),
            channels: "3-8".to_string(),
            sample_range: "all".to_string(),
        }
    }
}

impl WriteCommandArgs {
    /// The arguments for writing a raster observation.
    pub fn raster() -> Self {
        WriteCommandArgs {
            fits_or_multi: "multi".to_string(),
            offsets: "all".to_string(),
            ..Default::default()
        }
    }

    /// Render the write command. `output_paths` is one path, or two
    /// (target then calibrator) separated by a space. The "no" is for
    /// updating the observation database.
    pub fn command(&self, output_paths: &str) -> String {
        let WriteCommandArgs {
            fits_or_multi,
            if_severely_flagged,
            offsets,
            baselines,
            channels,
            sample_range,
        } = self;
        format!("write {fits_or_multi} {if_severely_flagged} no {offsets} {baselines} {channels} {sample_range} {output_paths} \\")
    }
}
