// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Handle (right ascension, declination) coordinates.
 */

pub mod sexagesimal;

use serde::{Deserialize, Serialize};

/// A struct containing a Right Ascension and Declination. Unlike most
/// coordinate code, all units are in *degrees*; this matches what is stored in
/// listings, where a pointing is written as an `[ra, dec]` pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct RADec {
    /// Right ascension \[degrees\]
    pub ra: f64,
    /// Declination \[degrees\]
    pub dec: f64,
}

impl RADec {
    /// Make a new `RADec` struct from values in degrees.
    pub fn from_degrees(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// Calculate the great-circle distance between two sets of coordinates
    /// \[degrees\].
    ///
    /// Uses the Vincenty formula, which is well conditioned for both tiny and
    /// antipodal separations.
    pub fn separation(&self, b: &Self) -> f64 {
        let (s_d_ra, c_d_ra) = (b.ra - self.ra).to_radians().sin_cos();
        let (s_dec1, c_dec1) = self.dec.to_radians().sin_cos();
        let (s_dec2, c_dec2) = b.dec.to_radians().sin_cos();

        let num1 = c_dec2 * s_d_ra;
        let num2 = c_dec1 * s_dec2 - s_dec1 * c_dec2 * c_d_ra;
        let den = s_dec1 * s_dec2 + c_dec1 * c_dec2 * c_d_ra;
        num1.hypot(num2).atan2(den).to_degrees()
    }
}

impl From<(f64, f64)> for RADec {
    fn from((ra, dec): (f64, f64)) -> Self {
        Self::from_degrees(ra, dec)
    }
}

impl From<RADec> for (f64, f64) {
    fn from(radec: RADec) -> Self {
        (radec.ra, radec.dec)
    }
}

impl std::fmt::Display for RADec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({:.4}°, {:.4}°)", self.ra, self.dec)
    }
}
