// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for each of the `ami-driver` workflows.
//!
//! The code here "mirrors" the code within the `cli` module; `cli` is
//! unparsed, user-facing code, whereas parameters have been parsed and are
//! ready to be used directly.

mod calibrate_rawfiles;
mod filter_listing;
mod list_rawfiles;
#[cfg(test)]
mod tests;

pub use calibrate_rawfiles::{process_data_groups, CalibrateRawfilesParams};
pub use filter_listing::{filter_groups, FilterListingParams};
pub use list_rawfiles::{write_rawfile_listings, ListRawfilesParams, RawfileListingPaths};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{
    grouping::GroupingError,
    listing::ListingError,
    reduce::{Array, Reduce, ReduceError},
    session::{ReduceProcess, SessionConfig, SessionError},
};

/// How to start a `reduce` session.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub config: SessionConfig,
    pub array: Array,
}

impl SessionParams {
    /// Spawn `reduce` and wrap it, ready for use.
    pub fn open(&self) -> Result<Reduce<ReduceProcess>, ProcessingError> {
        let process = ReduceProcess::spawn(&self.config)?;
        let reduce = Reduce::new(process, self.array, self.config.working_dir.clone())?;
        Ok(reduce)
    }
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[error("No groups have a file matching '{0}'")]
    NoMatches(String),

    #[error("Couldn't create {}: {err}", path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Create a file for writing, naming the file if that fails.
fn create_file(path: &Path) -> Result<std::fs::File, ProcessingError> {
    std::fs::File::create(path).map_err(|err| ProcessingError::CreateFile {
        path: path.to_path_buf(),
        err,
    })
}
