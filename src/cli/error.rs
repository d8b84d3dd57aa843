// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all ami-driver-related errors. This should be the *only*
//! error enum that is publicly visible.

use thiserror::Error;

use super::{calibrate_rawfiles::CalibrateRawfilesArgsError, common::SessionArgsError};
use crate::{
    listing::ListingError,
    params::ProcessingError,
    reduce::ReduceError,
    session::SessionError,
};

/// The *only* publicly visible error from ami-driver. Each error message
/// should include a hint, unless it's "generic".
#[derive(Error, Debug)]
pub enum AmiDriverError {
    /// An error related to starting or talking to reduce.
    #[error("{0}\n\nCheck the AMI installation (--amidir or $AMI_DIR); -vv shows everything sent to and received from reduce.")]
    Session(String),

    /// An error related to listings.
    #[error("{0}\n\nListings are made by the list-rawfiles subcommand (raw files) and calibrate-rawfiles (calibrated files).")]
    Listing(String),

    /// An error related to the arguments of calibrate-rawfiles.
    #[error("{0}\n\nSee calibrate-rawfiles --help.")]
    Calibrate(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files may be toml or json, and hold the same arguments as the command line. Use --save-toml to make one.")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<SessionArgsError> for AmiDriverError {
    fn from(e: SessionArgsError) -> Self {
        Self::Session(e.to_string())
    }
}

impl From<CalibrateRawfilesArgsError> for AmiDriverError {
    fn from(e: CalibrateRawfilesArgsError) -> Self {
        match e {
            CalibrateRawfilesArgsError::Listing(e) => Self::from(e),
            CalibrateRawfilesArgsError::NoInput
            | CalibrateRawfilesArgsError::ReadScript { .. } => Self::Calibrate(e.to_string()),
        }
    }
}

impl From<SessionError> for AmiDriverError {
    fn from(e: SessionError) -> Self {
        Self::Session(e.to_string())
    }
}

impl From<ReduceError> for AmiDriverError {
    fn from(e: ReduceError) -> Self {
        match e {
            ReduceError::Session(e) => Self::from(e),
            _ => Self::Generic(e.to_string()),
        }
    }
}

impl From<ListingError> for AmiDriverError {
    fn from(e: ListingError) -> Self {
        match e {
            ListingError::IO(e) => Self::from(e),
            _ => Self::Listing(e.to_string()),
        }
    }
}

impl From<ProcessingError> for AmiDriverError {
    fn from(e: ProcessingError) -> Self {
        match e {
            ProcessingError::Session(e) => Self::from(e),
            ProcessingError::Reduce(e) => Self::from(e),
            ProcessingError::Listing(e) => Self::from(e),
            ProcessingError::Grouping(_)
            | ProcessingError::NoMatches(_)
            | ProcessingError::CreateFile { .. }
            | ProcessingError::IO(_) => Self::Generic(e.to_string()),
        }
    }
}

impl From<std::io::Error> for AmiDriverError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
