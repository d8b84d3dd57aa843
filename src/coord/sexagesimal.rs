// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Code for handling conversion from sexagesimal.

`reduce` reports coordinates as three whitespace-separated fields (e.g.
"17 53 12.34"); colon-delimited strings ("17:53:12.34") are also accepted.
 */

use thiserror::Error;

/// Split a sexagesimal string into its sign and three unsigned fields. The
/// sign is taken from the string rather than the first field, otherwise
/// "-00 30 00" would be positive.
fn split_fields(s: &str) -> Result<(bool, [f64; 3]), SexagesimalError> {
    let trimmed = s.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let fields: Vec<&str> = unsigned
        .split(|c: char| c == ':' || c.is_ascii_whitespace())
        .filter(|f| !f.is_empty())
        .collect();
    if fields.len() != 3 {
        return Err(SexagesimalError::WrongFieldCount(s.to_string()));
    }

    let mut out = [0.0; 3];
    for (o, f) in out.iter_mut().zip(fields) {
        *o = f.parse().map_err(|_| SexagesimalError::ParseFloat {
            field: f.to_string(),
            input: s.to_string(),
        })?;
    }
    if out.iter().any(|f| *f < 0.0) {
        return Err(SexagesimalError::NegativeField(s.to_string()));
    }
    Ok((negative, out))
}

pub fn sexagesimal_dms_to_degrees(negative: bool, d: f64, m: f64, s: f64) -> f64 {
    let num = d + m / 60.0 + s / 3600.0;
    if negative {
        -num
    } else {
        num
    }
}

pub fn sexagesimal_hms_to_degrees(negative: bool, h: f64, m: f64, s: f64) -> f64 {
    15.0 * sexagesimal_dms_to_degrees(negative, h, m, s)
}

/// Convert a sexagesimal string in "degrees minutes seconds" to a float
/// \[degrees\].
///
/// # Examples
///
/// ```
/// # use ami_driver::coord::sexagesimal::*;
/// # use approx::*;
/// # fn main() -> Result<(), SexagesimalError> {
/// let f = sexagesimal_dms_str_to_degrees("-22 58 52.56")?;
/// assert_abs_diff_eq!(f, -22.981267, epsilon = 1e-6);
/// # Ok(())
/// # }
/// ```
pub fn sexagesimal_dms_str_to_degrees(dms: &str) -> Result<f64, SexagesimalError> {
    let (negative, [d, m, s]) = split_fields(dms)?;
    Ok(sexagesimal_dms_to_degrees(negative, d, m, s))
}

/// Convert a sexagesimal string in "hours minutes seconds" to a float
/// \[degrees\].
///
/// # Examples
///
/// ```
/// # use ami_driver::coord::sexagesimal::*;
/// # use approx::*;
/// # fn main() -> Result<(), SexagesimalError> {
/// let f = sexagesimal_hms_str_to_degrees("11:34:23.7854")?;
/// assert_abs_diff_eq!(f, 173.59910583, epsilon = 1e-6);
/// # Ok(())
/// # }
/// ```
pub fn sexagesimal_hms_str_to_degrees(hms: &str) -> Result<f64, SexagesimalError> {
    let (negative, [h, m, s]) = split_fields(hms)?;
    Ok(sexagesimal_hms_to_degrees(negative, h, m, s))
}

#[derive(Error, Debug, PartialEq)]
pub enum SexagesimalError {
    /// Three numbers (fields) are expected; this error is used when the number
    /// of fields is not three.
    #[error("Did not get three sexagesimal fields: '{0}'")]
    WrongFieldCount(String),

    #[error("Couldn't parse '{field}' as a number in sexagesimal string '{input}'")]
    ParseFloat { field: String, input: String },

    #[error("Only the leading sign of a sexagesimal string may be negative: '{0}'")]
    NegativeField(String),
}
