// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parsing of `reduce` responses.
//!
//! Each parser is independent and looks for the lines it cares about in a
//! whole response; anything else in the response is ignored. Unless stated
//! otherwise, a missing pattern is not an error and `None` is returned.

mod error;
#[cfg(test)]
mod tests;

pub use error::ParseError;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::{trace, warn};

use crate::{
    constants::FLAGGING_SEED_PERCENT,
    coord::{
        sexagesimal::{sexagesimal_dms_str_to_degrees, sexagesimal_hms_str_to_degrees},
        RADec,
    },
    record::{ObservationRecord, SexagesimalPointing},
};

/// The only reference frame we know how to convert from.
const EXPECTED_FRAME: &str = "J2000";

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H.%M.%S";

/// Timing information for an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTimes {
    /// UTC start and stop.
    pub utc: (NaiveDateTime, NaiveDateTime),
    /// Sidereal start and stop, "HH:MM:SS".
    pub sidereal: (String, String),
    /// Modified Julian date start and stop.
    pub mjd: (f64, f64),
    /// \[hours\]
    pub duration_hours: f64,
}

/// Split a raw response into lines, trimming whitespace (including stray
/// carriage returns from the terminal).
pub fn response_lines(raw: &str) -> Vec<String> {
    raw.split('\n').map(|l| l.trim().to_string()).collect()
}

fn parse_number(token: &str, line: &str) -> Result<f64, ParseError> {
    token.parse().map_err(|_| ParseError::BadNumber {
        token: token.to_string(),
        line: line.to_string(),
    })
}

/// Get the pointing of an observation from its listing. The first line
/// containing "Tracking" looks like
///
/// `Tracking    : 17 53 12.34  -01 02 03 J2000`
///
/// RA and Dec are separated by two spaces when the declination is negative
/// (the minus sign takes the third), and three spaces otherwise.
pub fn parse_coords<S: AsRef<str>>(
    filename: &str,
    obs_listing: &[S],
) -> Result<SexagesimalPointing, ParseError> {
    let line = obs_listing
        .iter()
        .map(|l| l.as_ref())
        .find(|l| l.contains("Tracking"))
        .ok_or_else(|| ParseError::MissingCoords {
            filename: filename.to_string(),
        })?;

    let coords = line
        .split_once(':')
        .map(|(_, c)| c)
        .unwrap_or(line)
        .trim();
    // The last token is the reference frame.
    let coords = match coords.rsplit_once(|c: char| c.is_ascii_whitespace()) {
        Some((coords, frame)) => {
            if frame != EXPECTED_FRAME {
                warn!("{filename}: Pointing may not be in {EXPECTED_FRAME} format (frame '{frame}'); co-ordinate conversion may be incorrect");
            }
            coords.trim_end()
        }
        None => return Err(ParseError::BadCoords(line.to_string())),
    };

    let separator = if coords.contains('-') { "  " } else { "   " };
    let mut parts = coords
        .split(separator)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty());
    match (parts.next(), parts.next()) {
        (Some(ra), Some(dec)) => Ok(SexagesimalPointing {
            ra: ra.to_string(),
            dec: dec.to_string(),
        }),
        _ => Err(ParseError::BadCoords(line.to_string())),
    }
}

/// Convert a sexagesimal pointing to decimal degrees. RA is in hour angle.
pub fn convert_to_decimal_degrees(pointing: &SexagesimalPointing) -> Result<RADec, ParseError> {
    let ra = sexagesimal_hms_str_to_degrees(&pointing.ra)?;
    let dec = sexagesimal_dms_str_to_degrees(&pointing.dec)?;
    Ok(RADec::from_degrees(ra, dec))
}

/// The calibrator is the last token on the first line containing "with
/// calibrator".
pub fn parse_calibrator<S: AsRef<str>>(obs_listing: &[S]) -> Option<String> {
    obs_listing
        .iter()
        .map(|l| l.as_ref())
        .find(|l| l.contains("with calibrator"))
        .and_then(|l| l.split_whitespace().last())
        .map(|t| t.to_string())
}

/// The field name is the first token on the first line containing "field
/// observation".
pub fn parse_field<S: AsRef<str>>(obs_listing: &[S]) -> Option<String> {
    obs_listing
        .iter()
        .map(|l| l.as_ref())
        .find(|l| l.contains("field observation"))
        .and_then(|l| l.split_whitespace().next())
        .map(|t| t.to_string())
}

/// Is this a raster observation?
pub fn parse_raster<S: AsRef<str>>(obs_listing: &[S]) -> bool {
    obs_listing
        .iter()
        .map(|l| l.as_ref())
        .any(|l| l.contains("raster"))
}

/// Parse a "Start time" or "Stop time" line, e.g.
///
/// `Start time  : 13.55.49 UT   01.23.45 ST   56721.580428 MJD`
///
/// returning the UT time, the sidereal time and the MJD.
fn parse_time_line(line: &str) -> Result<(NaiveTime, String, f64), ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let token = |index: usize| {
        tokens
            .get(index)
            .copied()
            .ok_or_else(|| ParseError::MissingToken {
                line: line.to_string(),
                index,
            })
    };

    let ut_token = token(3)?;
    let ut = NaiveTime::parse_from_str(ut_token, TIME_FORMAT).map_err(|_| ParseError::BadTime {
        token: ut_token.to_string(),
        what: "UT time (HH.MM.SS)",
    })?;
    let st = token(5)?.replace('.', ":");
    let mjd_index = tokens
        .len()
        .checked_sub(2)
        .ok_or_else(|| ParseError::MissingToken {
            line: line.to_string(),
            index: 0,
        })?;
    let mjd = parse_number(token(mjd_index)?, line)?;
    Ok((ut, st, mjd))
}

/// Get the start and stop times of an observation from its listing. The date
/// is the last token of the line following the "Tracking" line. If the stop
/// time is earlier than the start time, the observation crossed midnight.
pub fn parse_obs_times<S: AsRef<str>>(obs_listing: &[S]) -> Result<ObservationTimes, ParseError> {
    let mut date = None;
    let mut start = None;
    let mut stop = None;

    for (i, line) in obs_listing.iter().map(|l| l.as_ref()).enumerate() {
        if line.contains("Tracking") && date.is_none() {
            let date_token = obs_listing
                .get(i + 1)
                .and_then(|l| l.as_ref().split_whitespace().last())
                .ok_or(ParseError::MissingDate)?;
            date = Some(
                NaiveDate::parse_from_str(date_token, DATE_FORMAT).map_err(|_| {
                    ParseError::BadTime {
                        token: date_token.to_string(),
                        what: "date (DD/MM/YYYY)",
                    }
                })?,
            );
        }
        if line.contains("Start time") {
            start = Some(parse_time_line(line)?);
        }
        if line.contains("Stop time") {
            stop = Some(parse_time_line(line)?);
        }
    }

    let date = date.ok_or(ParseError::MissingTimeLine("Tracking"))?;
    let (ut0, st0, mjd0) = start.ok_or(ParseError::MissingTimeLine("Start time"))?;
    let (ut1, st1, mjd1) = stop.ok_or(ParseError::MissingTimeLine("Stop time"))?;

    let t0 = date.and_time(ut0);
    let mut t1 = date.and_time(ut1);
    if t1 < t0 {
        trace!("Observation crossed midnight");
        t1 += Duration::days(1);
    }
    let duration_hours = (t1 - t0).num_seconds() as f64 / 3600.0;

    Ok(ObservationTimes {
        utc: (t0, t1),
        sidereal: (st0, st1),
        mjd: (mjd0, mjd1),
        duration_hours,
    })
}

/// The output of "apply rain" must contain the mean amplitude correction
/// factor.
pub fn parse_rain_results<S: AsRef<str>>(output_lines: &[S]) -> Result<f64, ParseError> {
    for line in output_lines.iter().map(|l| l.as_ref()) {
        if line.contains("Mean amplitude correction factor") {
            if let Some(token) = line.split_whitespace().last() {
                return parse_number(token, line);
            }
        }
    }
    Err(ParseError::MissingRain)
}

/// Get the percentage of flagged samples, if it was reported, e.g.
///
/// `Total of 51234 samples flagged (12.50%)`
pub fn parse_flagging_results<S: AsRef<str>>(
    output_lines: &[S],
) -> Result<Option<f64>, ParseError> {
    for line in output_lines.iter().map(|l| l.as_ref()) {
        if line.contains("samples flagged") && line.contains("Total of") {
            if let Some(token) = line.split_whitespace().find(|t| t.contains('%')) {
                let stripped = token.trim_matches(|c| c == '%' || c == '(' || c == ')');
                return parse_number(stripped, line).map(Some);
            }
        }
    }
    Ok(None)
}

/// The output of "reweight" must contain the estimated noise \[Jy\] as the
/// second-to-last token.
pub fn parse_reweight_results<S: AsRef<str>>(output_lines: &[S]) -> Result<f64, ParseError> {
    for line in output_lines.iter().map(|l| l.as_ref()) {
        if line.contains("estimated noise") {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() >= 2 {
                return parse_number(tokens[tokens.len() - 2], line);
            }
        }
    }
    Err(ParseError::MissingNoise)
}

/// Is an archival flux for the calibrator available, and how many days apart
/// were the observations?
pub fn parse_cal_inter_results<S: AsRef<str>>(
    output_lines: &[S],
) -> Result<(bool, Option<f64>), ParseError> {
    let mut archive_cal_available = true;
    let mut days_apart = None;
    for line in output_lines.iter().map(|l| l.as_ref()) {
        if line.contains("not available") {
            archive_cal_available = false;
        }
        if line.contains("days apart") {
            let token = line
                .split_whitespace()
                .nth(6)
                .ok_or_else(|| ParseError::MissingToken {
                    line: line.to_string(),
                    index: 6,
                })?;
            days_apart = Some(parse_number(token, line)?);
        }
    }
    Ok((archive_cal_available, days_apart))
}

/// Route a command's output to the parsers that apply to it, updating the
/// record of the active file.
///
/// Flagging commands update a running maximum; it starts at
/// [`FLAGGING_SEED_PERCENT`] so it is defined as soon as any flagging command
/// has run, even one that doesn't report a percentage.
pub fn parse_command_output<S: AsRef<str>>(
    command: &str,
    output_lines: &[S],
    record: &mut ObservationRecord,
) -> Result<(), ParseError> {
    if command.contains("apply rain") {
        record.rain_amp_correction = Some(parse_rain_results(output_lines)?);
    }

    if command.contains("flag") {
        let current = record.flagged_max_percent.unwrap_or(FLAGGING_SEED_PERCENT);
        let reported = parse_flagging_results(output_lines)?;
        record.flagged_max_percent = Some(match reported {
            Some(p) => current.max(p),
            None => current,
        });
    }

    if command.contains("reweight") {
        record.est_noise_jy = Some(parse_reweight_results(output_lines)?);
    }

    if command.contains("cal inter") {
        let (available, days_apart) = parse_cal_inter_results(output_lines)?;
        record.archive_cal_available = Some(available);
        record.archive_cal_days_apart = days_apart;
    }

    Ok(())
}
