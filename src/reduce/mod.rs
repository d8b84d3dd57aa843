// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Keep track of the files `reduce` knows about and drive reductions of them.

mod error;
mod file_logs;

pub use error::ReduceError;

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use self::file_logs::FileLogs;
use crate::{
    parse::{
        convert_to_decimal_degrees, parse_calibrator, parse_command_output, parse_coords,
        parse_field, parse_flagging_results, parse_obs_times, parse_raster, response_lines,
        ParseError,
    },
    record::ObservationRecord,
    scripts::{script_commands, WriteCommandArgs},
    session::Session,
    PROGRESS_BARS,
};

/// The AMI arrays. `reduce` starts on the small array.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum Array {
    #[strum(serialize = "LA")]
    #[serde(rename = "LA")]
    Large,

    #[strum(serialize = "SA")]
    #[serde(rename = "SA")]
    Small,
}

/// The name of an observation, i.e. the raw file name without its extension.
pub fn obs_name(rawfile: &str) -> &str {
    Path::new(rawfile)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(rawfile)
}

/// A `reduce` session plus everything learned from it.
pub struct Reduce<S: Session> {
    session: S,
    array: Array,
    /// The directory `reduce` runs in; bare file names in commands are
    /// relative to it.
    working_dir: PathBuf,
    files: BTreeMap<String, ObservationRecord>,
    active_file: Option<String>,
    logs: FileLogs,
}

impl<S: Session> Reduce<S> {
    /// Take control of a `reduce` session that is sitting at its prompt,
    /// switch to the requested array and populate the file registry.
    pub fn new(session: S, array: Array, working_dir: PathBuf) -> Result<Reduce<S>, ReduceError> {
        let mut reduce = Reduce {
            session,
            array,
            working_dir,
            files: BTreeMap::new(),
            active_file: None,
            logs: FileLogs::discard(),
        };
        if array == Array::Large {
            reduce.switch_to_large_array()?;
        }
        reduce.update_files()?;
        Ok(reduce)
    }

    pub fn array(&self) -> Array {
        self.array
    }

    pub fn files(&self) -> &BTreeMap<String, ObservationRecord> {
        &self.files
    }

    pub fn active_file(&self) -> Option<&str> {
        self.active_file.as_deref()
    }

    pub fn into_files(self) -> BTreeMap<String, ObservationRecord> {
        self.files
    }

    pub fn record_mut(&mut self, rawfile: &str) -> Result<&mut ObservationRecord, ReduceError> {
        self.files
            .get_mut(rawfile)
            .ok_or_else(|| ReduceError::UnknownFile(rawfile.to_string()))
    }

    fn send(&mut self, command: &str) -> Result<String, ReduceError> {
        self.logs.log_command(command)?;
        let raw = self.session.send(command)?;
        self.logs.log_response(&raw)?;
        Ok(raw)
    }

    /// Switch to the large array. The file list of the small array no longer
    /// applies, so the registry is emptied.
    pub fn switch_to_large_array(&mut self) -> Result<(), ReduceError> {
        self.send("set def la")?;
        self.array = Array::Large;
        self.files.clear();
        self.active_file = None;
        Ok(())
    }

    /// Ask `reduce` which files it has and what their comments are. Files
    /// already in the registry keep their metadata.
    pub fn update_files(&mut self) -> Result<(), ReduceError> {
        let raw = self.send("list files \\")?;
        let lines = response_lines(&raw);
        // Two header lines and four footer lines.
        let listing = lines
            .get(2..lines.len().saturating_sub(4))
            .unwrap_or(&[]);
        for line in listing {
            if let Some(filename) = line.split_whitespace().next() {
                self.files.entry(filename.to_string()).or_default();
            }
        }

        let raw = self.send("list comment \\")?;
        let lines = response_lines(&raw);
        for line in lines.get(2..).unwrap_or(&[]) {
            if let Some((filename, comment)) = line.split_once(' ') {
                if let Some(record) = self.files.get_mut(filename) {
                    record.comment = Some(comment.trim().to_string());
                }
            }
        }
        debug!("reduce lists {} files", self.files.len());
        Ok(())
    }

    /// Fill in the pointing, calibrator and timing of `filename` from its
    /// quick listing. If the quick listing has no duration, the observation
    /// was never properly closed; get the timestamps by loading the file
    /// instead.
    pub fn get_obs_details(&mut self, filename: &str) -> Result<(), ReduceError> {
        let raw = self.send(&format!("list observation {filename} \\"))?;
        let duration = self.apply_obs_listing(filename, &raw, false)?;
        if duration == 0.0 {
            warn!("Incomplete observation {filename}; loading the whole file for its times");
            self.load_full_obs_details(filename)?;
        }
        Ok(())
    }

    fn load_full_obs_details(&mut self, filename: &str) -> Result<(), ReduceError> {
        if self.active_file.as_deref() != Some(filename) {
            self.activate(filename, None)?;
        }
        let raw = self.send("show observation \\")?;
        self.apply_obs_listing(filename, &raw, true)?;
        Ok(())
    }

    /// Update the record of `filename` from an observation listing, returning
    /// the duration of the observation \[hours\].
    fn apply_obs_listing(
        &mut self,
        filename: &str,
        raw: &str,
        incomplete: bool,
    ) -> Result<f64, ReduceError> {
        let wrap = |err: ParseError| ReduceError::Parse {
            filename: filename.to_string(),
            err,
        };
        let lines = response_lines(raw);
        // Skip the echoed command and the blank line after it.
        let listing = lines.get(2..).unwrap_or(&[]);

        let pointing = parse_coords(filename, listing).map_err(wrap)?;
        let pointing_degrees = convert_to_decimal_degrees(&pointing).map_err(wrap)?;
        let times = parse_obs_times(listing).map_err(wrap)?;
        let duration = times.duration_hours;

        let record = self.record_mut(filename)?;
        record.raw_obs_text = Some(raw.to_string());
        record.pointing_hms_dms = Some(pointing);
        record.pointing_degrees = Some(pointing_degrees);
        record.calibrator = parse_calibrator(listing);
        record.field = parse_field(listing);
        record.raster = Some(parse_raster(listing));
        record.set_times(times);
        if incomplete {
            record.warnings.incomplete_observation = true;
        }
        Ok(duration)
    }

    /// Get the details of every file whose pointing isn't yet known. A file
    /// that can't be parsed is reported and skipped; a broken session is an
    /// error.
    pub fn load_obs_info(&mut self) -> Result<(), ReduceError> {
        info!("Loading observation metadata, this takes a while");
        self.update_files()?;
        let pending = self
            .files
            .iter()
            .filter(|(_, record)| record.pointing_degrees.is_none())
            .map(|(filename, _)| filename.clone())
            .collect::<Vec<_>>();

        let pb = ProgressBar::with_draw_target(
            Some(pending.len() as u64),
            if PROGRESS_BARS.load() {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:17}: [{wide_bar:.blue}] {pos:4}/{len:4} files ({elapsed_precise}<{eta_precise})")
                .unwrap()
                .progress_chars("=> "),
        )
        .with_message("Reading metadata");

        for filename in pending {
            trace!("Getting details of {filename}");
            match self.get_obs_details(&filename) {
                Ok(()) => (),
                Err(e) if e.is_fatal_to_session() => {
                    pb.abandon();
                    return Err(e);
                }
                Err(e) => warn!("Skipping {filename}: {e}"),
            }
            pb.inc(1);
        }
        pb.finish_with_message("Metadata read");
        Ok(())
    }

    /// Make `filename` the file that subsequent commands act on. If
    /// `log_dir` is given, the commands and transcript for this file are
    /// logged there.
    pub fn set_active_file(
        &mut self,
        filename: &str,
        log_dir: Option<&Path>,
    ) -> Result<(), ReduceError> {
        let filename = filename.trim();
        if !self.files.contains_key(filename) {
            return Err(ReduceError::UnknownFile(filename.to_string()));
        }
        let reply = self.activate(filename, log_dir)?;
        if reply.iter().any(|l| l.contains("incomplete observation")) {
            warn!("{filename} is an incomplete observation");
            self.load_full_obs_details(filename)?;
        } else {
            self.get_obs_details(filename)?;
        }
        debug!("Active file is now {filename}");
        Ok(())
    }

    fn activate(&mut self, filename: &str, log_dir: Option<&Path>) -> Result<Vec<String>, ReduceError> {
        self.logs.close()?;
        self.logs = match log_dir {
            Some(dir) => FileLogs::create(dir, filename)?,
            None => FileLogs::discard(),
        };
        self.active_file = Some(filename.to_string());
        self.run_command(&format!("file {filename} \\"))
    }

    /// Send a command and return its output lines. If a file is active, the
    /// output is also parsed into its record.
    pub fn run_command(&mut self, command: &str) -> Result<Vec<String>, ReduceError> {
        let raw = self.send(command)?;
        let lines = response_lines(&raw);
        if let Some(active) = self.active_file.as_ref() {
            let record = self
                .files
                .get_mut(active)
                .ok_or_else(|| ReduceError::UnknownFile(active.clone()))?;
            parse_command_output(command, &lines, record).map_err(|err| ReduceError::Parse {
                filename: active.clone(),
                err,
            })?;
        }
        Ok(lines)
    }

    pub fn run_script(&mut self, script: &str) -> Result<(), ReduceError> {
        for command in script_commands(script) {
            self.run_command(command)?;
        }
        Ok(())
    }

    /// Record the final flagging percentage of the active file.
    pub fn update_flagging_info(&mut self) -> Result<(), ReduceError> {
        let lines = self.run_command("show flagging no yes \\")?;
        let active = self.active_file.clone().ok_or(ReduceError::NoActiveFile)?;
        let flagged = parse_flagging_results(&lines).map_err(|err| ReduceError::Parse {
            filename: active.clone(),
            err,
        })?;
        self.record_mut(&active)?.flagged_final_percent = flagged;
        Ok(())
    }

    /// Write UVFITS for `rawfile` (and its calibrator, if it has one) into
    /// `output_dir`. `reduce` can't handle long paths, so it writes short
    /// temporary names in its working directory which are then moved into
    /// place.
    pub fn write_files(
        &mut self,
        rawfile: &str,
        output_dir: &Path,
        args: &WriteCommandArgs,
    ) -> Result<(), ReduceError> {
        fs::create_dir_all(output_dir)?;
        let name = obs_name(rawfile).to_string();
        let calibrator = self.record_mut(rawfile)?.calibrator.clone();

        let target_dest = output_dir.join(format!("{name}.fits"));
        let target_temp = self.temp_fits_path()?;
        let cal = match calibrator {
            Some(cal) => Some((
                self.temp_fits_path()?,
                output_dir.join(format!("{name}_cal_{cal}.fits")),
            )),
            None => None,
        };

        let output_paths = std::iter::once(&target_temp)
            .chain(cal.as_ref().map(|(temp, _)| temp))
            .filter_map(|p| p.file_name())
            .map(|p| p.to_string_lossy())
            .join(" ");
        debug!("{rawfile}: writing {output_paths}");
        self.run_command(&args.command(&output_paths))?;

        let target_uvfits = move_artifact(&target_temp, &target_dest)?;
        let cal_uvfits = match cal {
            Some((temp, dest)) => Some(move_artifact(&temp, &dest)?),
            None => None,
        };
        let record = self.record_mut(rawfile)?;
        record.target_uvfits = Some(target_uvfits);
        record.cal_uvfits = cal_uvfits;
        Ok(())
    }

    /// A free "ami_*.fits" name in the working directory. The file itself is
    /// removed again; `reduce` creates it.
    fn temp_fits_path(&self) -> Result<PathBuf, ReduceError> {
        let temp = tempfile::Builder::new()
            .prefix("ami_")
            .suffix(".fits")
            .tempfile_in(&self.working_dir)?
            .into_temp_path();
        let path = temp.to_path_buf();
        temp.close()?;
        Ok(path)
    }
}

/// `errno` for a rename across filesystems (the same on Linux and macOS).
const EXDEV: i32 = 18;

/// Move a file written by `reduce` to its final path. The working directory
/// is often on a different filesystem (e.g. a tmpfs /tmp); then the file is
/// copied next to its destination first, so the final path never holds a
/// partial file.
fn move_artifact(from: &Path, to: &Path) -> Result<PathBuf, ReduceError> {
    trace!("Moving {} to {}", from.display(), to.display());
    let moved = match fs::rename(from, to) {
        Err(err) if err.raw_os_error() == Some(EXDEV) => {
            debug!("{} is on another filesystem; copying it", to.display());
            copy_into_place(from, to)
        }
        result => result,
    };
    moved.map_err(|err| ReduceError::ArtifactMove {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        err,
    })?;
    Ok(fs::canonicalize(to)?)
}

/// Copy `from` to a temporary file in the directory of `to`, atomically
/// rename that over `to`, then remove `from`.
fn copy_into_place(from: &Path, to: &Path) -> std::io::Result<()> {
    let dest_dir = match to.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dest_dir)?;
    std::io::copy(&mut File::open(from)?, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(to).map_err(|e| e.error)?;
    fs::remove_file(from)
}

/// Reduce a single raw file: run `script` on it, then write its UVFITS and a
/// JSON summary of its record into `output_dir`. The updated record is
/// returned.
pub fn process_rawfile<S: Session>(
    reduce: &mut Reduce<S>,
    rawfile: &str,
    output_dir: &Path,
    file_logging: bool,
    script: &str,
) -> Result<ObservationRecord, ReduceError> {
    let rawfile = rawfile.trim();
    info!("Processing {rawfile}");
    let log_dir = file_logging.then_some(output_dir);
    reduce.set_active_file(rawfile, log_dir)?;
    reduce.record_mut(rawfile)?.clear_reduction_results();
    reduce.run_script(script)?;
    reduce.update_flagging_info()?;

    let write_args = if reduce.record_mut(rawfile)?.raster == Some(true) {
        WriteCommandArgs::raster()
    } else {
        WriteCommandArgs::default()
    };
    reduce.write_files(rawfile, output_dir, &write_args)?;

    let name = obs_name(rawfile).to_string();
    let record = reduce.record_mut(rawfile)?;
    record.obs_name = Some(name.clone());
    let record = record.clone();

    let mut sidecar = BufWriter::new(File::create(output_dir.join(format!("{name}.json")))?);
    serde_json::to_writer_pretty(&mut sidecar, &record)?;
    sidecar.flush()?;
    Ok(record)
}
