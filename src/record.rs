// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Metadata about a single raw observation file.
//!
//! Records are built up incrementally as each `reduce` response is parsed, so
//! every field is optional until the relevant command has been run.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{coord::RADec, parse::ObservationTimes};

/// A pointing as reported by `reduce`, i.e. sexagesimal strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SexagesimalPointing {
    /// Hours, minutes and seconds of right ascension, e.g. "17 53 12.34".
    pub ra: String,
    /// Degrees, minutes and seconds of declination, e.g. "-01 02 03".
    pub dec: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationWarnings {
    /// `reduce` reported the observation as incomplete, or the quick listing
    /// had no duration, so the timestamps came from fully loading the file.
    #[serde(default)]
    pub incomplete_observation: bool,
}

/// Everything known about a raw file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationRecord {
    pub comment: Option<String>,
    pub group_name: Option<String>,
    pub obs_name: Option<String>,

    pub pointing_hms_dms: Option<SexagesimalPointing>,
    /// Only available after the pointing has been successfully parsed.
    pub pointing_degrees: Option<RADec>,
    pub calibrator: Option<String>,
    pub field: Option<String>,
    pub raster: Option<bool>,

    #[serde(with = "datetime_pair")]
    pub time_ut: Option<(NaiveDateTime, NaiveDateTime)>,
    pub time_st: Option<(String, String)>,
    pub time_mjd: Option<(f64, f64)>,
    /// \[hours\]
    pub duration_hours: Option<f64>,

    pub rain_amp_correction: Option<f64>,
    /// The largest flagged-sample percentage reported during the reduction
    /// script.
    pub flagged_max_percent: Option<f64>,
    /// The flagged-sample percentage after the reduction script has finished.
    pub flagged_final_percent: Option<f64>,
    /// \[Jy\]
    pub est_noise_jy: Option<f64>,
    pub archive_cal_available: Option<bool>,
    pub archive_cal_days_apart: Option<f64>,

    pub target_uvfits: Option<PathBuf>,
    pub cal_uvfits: Option<PathBuf>,

    pub warnings: ObservationWarnings,

    /// The verbatim observation listing. Useful for debugging parse failures,
    /// but bulky, so it isn't always written out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_obs_text: Option<String>,
}

impl ObservationRecord {
    /// Forget the results of a previous reduction script, so that running
    /// another one starts from scratch. Observation details are kept.
    pub(crate) fn clear_reduction_results(&mut self) {
        self.rain_amp_correction = None;
        self.flagged_max_percent = None;
        self.flagged_final_percent = None;
        self.est_noise_jy = None;
        self.archive_cal_available = None;
        self.archive_cal_days_apart = None;
        self.target_uvfits = None;
        self.cal_uvfits = None;
    }

    pub(crate) fn set_times(&mut self, times: ObservationTimes) {
        let ObservationTimes {
            utc,
            sidereal,
            mjd,
            duration_hours,
        } = times;
        self.time_ut = Some(utc);
        self.time_st = Some(sidereal);
        self.time_mjd = Some(mjd);
        self.duration_hours = Some(duration_hours);
    }
}

/// (De)serialise a pair of UTC timestamps as "%Y-%m-%d %H:%M:%S" strings.
mod datetime_pair {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub(super) fn serialize<S: Serializer>(
        pair: &Option<(NaiveDateTime, NaiveDateTime)>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        pair.map(|(start, stop)| {
            [
                start.format(FORMAT).to_string(),
                stop.format(FORMAT).to_string(),
            ]
        })
        .serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, D::Error> {
        let strings: Option<[String; 2]> = Option::deserialize(deserializer)?;
        match strings {
            None => Ok(None),
            Some([start, stop]) => {
                let start = NaiveDateTime::parse_from_str(&start, FORMAT).map_err(D::Error::custom)?;
                let stop = NaiveDateTime::parse_from_str(&stop, FORMAT).map_err(D::Error::custom)?;
                Ok(Some((start, stop)))
            }
        }
    }
}
