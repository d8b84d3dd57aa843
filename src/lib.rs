// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drive the interactive AMI `reduce` pipeline.
//!
//! The `reduce` program is scripted over a prompt-synchronised terminal
//! session ([`session`]); its free-form replies are parsed into typed
//! observation metadata ([`parse`], [`record`]) held in a file registry
//! ([`reduce::Reduce`]). Raw files can then be grouped into targets and
//! pointings ([`grouping`]) and persisted as tagged listings ([`listing`]).

mod cli;
pub mod constants;
pub mod coord;
pub mod environment;
pub mod grouping;
pub mod listing;
pub mod params;
pub mod parse;
pub mod record;
pub mod reduce;
pub mod scripts;
pub mod session;

// Re-exports.
pub use cli::{AmiDriver, AmiDriverError};
pub use coord::RADec;
pub use grouping::{
    cluster_by_separation, group_obs_by_target_id, group_target_ids_by_pointing, FileGroup,
};
pub use listing::{load_listing, save_listing, Datatype};
pub use record::ObservationRecord;
pub use reduce::{process_rawfile, Array, Reduce};
pub use session::{ReduceProcess, ScriptedSession, Session, SessionConfig, SessionError};

use crossbeam_utils::atomic::AtomicCell;

/// Are progress bars being drawn? This should only ever be enabled by CLI
/// code.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
