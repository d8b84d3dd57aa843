// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::coord::sexagesimal::SexagesimalError;

/// A `reduce` response didn't contain what was expected of it.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{filename}: Couldn't find the pointing ('Tracking' line) in the observation listing")]
    MissingCoords { filename: String },

    #[error("Couldn't split '{0}' into right ascension and declination")]
    BadCoords(String),

    #[error("Couldn't find a line containing '{0}' in the observation listing")]
    MissingTimeLine(&'static str),

    #[error("Couldn't find the observation date on the line after the 'Tracking' line")]
    MissingDate,

    #[error("Line '{line}' didn't have a token at position {index}")]
    MissingToken { line: String, index: usize },

    #[error("Couldn't parse '{token}' as a {what}")]
    BadTime { token: String, what: &'static str },

    #[error("Couldn't parse '{token}' from line '{line}' as a number")]
    BadNumber { token: String, line: String },

    #[error("Couldn't find the rain modulation ('Mean amplitude correction factor')")]
    MissingRain,

    #[error("Couldn't find the noise estimate ('estimated noise')")]
    MissingNoise,

    #[error(transparent)]
    Sexagesimal(#[from] SexagesimalError),
}
