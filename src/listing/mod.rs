// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Listings: JSON objects mapping names (files, targets or groups) to
//! records, tagged with the kind of data they list.


use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::constants::DATATYPE_KEY;

/// The kind of data in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Datatype {
    #[strum(serialize = "AMILA_RAWFILES")]
    RawFiles,

    #[strum(serialize = "AMILA_CALIBRATED_UVFITS")]
    CalibratedUvfits,
}

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("This doesn't appear to be an AMI listing; there's no '{DATATYPE_KEY}' key")]
    MissingDatatype,

    #[error("Expected an AMI listing of type {expected}, but found {found}")]
    UnexpectedDatatype { expected: Datatype, found: String },

    #[error("Unknown AMI listing type '{0}'")]
    UnknownDatatype(String),

    #[error("An AMI listing must be a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Write a listing, tagged with `datatype`. Keys are sorted.
pub fn save_listing<T: Serialize, W: Write>(
    entries: &BTreeMap<String, T>,
    datatype: Datatype,
    mut writer: W,
) -> Result<(), ListingError> {
    let mut listing = Map::new();
    for (key, entry) in entries {
        listing.insert(key.clone(), serde_json::to_value(entry)?);
    }
    listing.insert(
        DATATYPE_KEY.to_string(),
        Value::String(datatype.to_string()),
    );
    // serde_json's Map is a BTreeMap (no "preserve_order"), so keys come out
    // sorted.
    serde_json::to_writer_pretty(&mut writer, &listing)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Read a listing, returning its entries (without the tag) and its datatype.
/// If `expected` is given, a listing of any other type is an error.
pub fn load_listing<T: DeserializeOwned, R: Read>(
    reader: R,
    expected: Option<Datatype>,
) -> Result<(BTreeMap<String, T>, Datatype), ListingError> {
    let doc: Value = serde_json::from_reader(reader)?;
    let mut listing = match doc {
        Value::Object(map) => map,
        _ => return Err(ListingError::NotAnObject),
    };

    let found = match listing.remove(DATATYPE_KEY) {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => return Err(ListingError::MissingDatatype),
    };
    if let Some(expected) = expected {
        if found != expected.to_string() {
            return Err(ListingError::UnexpectedDatatype { expected, found });
        }
    }
    let datatype = found
        .parse()
        .map_err(|_| ListingError::UnknownDatatype(found.clone()))?;

    let entries = listing
        .into_iter()
        .map(|(key, value)| serde_json::from_value(value).map(|entry| (key, entry)))
        .collect::<Result<_, _>>()?;
    Ok((entries, datatype))
}
