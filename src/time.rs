//! Conversions between decimal Julian years (the time unit of the integrator) and calendar
//! epochs.
//!
//! A decimal Julian year `Y` is the epoch `JD = 2451545.0 + (Y − 2000)·365.25` in
//! Terrestrial Time, so J2000.0 is `2000-01-01T12:00:00 TT`. Epochs are built in the TT
//! scale; a calendar date given in UTC is converted by `hifitime` (leap seconds included).
use hifitime::{Epoch, TimeScale};
use std::str::FromStr;

use crate::{
    constants::{Year, DAYS_PER_JULIAN_YEAR, JDTOMJD, JD_J2000},
    sim_errors::SimulationError,
};

/// Julian date of a decimal Julian year.
pub fn decimal_year_to_jd(year: Year) -> f64 {
    JD_J2000 + (year - 2000.0) * DAYS_PER_JULIAN_YEAR
}

/// Calendar epoch (TT) of a decimal Julian year.
pub fn decimal_year_to_epoch(year: Year) -> Epoch {
    Epoch::from_mjd_in_time_scale(decimal_year_to_jd(year) - JDTOMJD, TimeScale::TT)
}

/// Decimal Julian year of a calendar epoch.
pub fn epoch_to_decimal_year(epoch: Epoch) -> Year {
    2000.0 + (epoch.to_mjd_tt_days() + JDTOMJD - JD_J2000) / DAYS_PER_JULIAN_YEAR
}

/// Parse an ISO-8601 date (e.g. `2018-05-19T00:00:00 UTC`) into a decimal Julian year.
///
/// Return
/// ------
/// * `Err(SimulationError::InvalidParameter)` if the string is not a valid date.
pub fn parse_decimal_year(date: &str) -> Result<Year, SimulationError> {
    let epoch = Epoch::from_str(date.trim())
        .map_err(|e| SimulationError::InvalidParameter(format!("invalid date '{date}': {e}")))?;
    Ok(epoch_to_decimal_year(epoch))
}
