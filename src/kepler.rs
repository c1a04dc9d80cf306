//! Kepler's equation and anomaly conversions.
//!
//! Used when seeding bodies from a time of pericenter passage and when recovering
//! that time from an instantaneous state.
use super::constants::{Radian, DPI};
use crate::sim_errors::SimulationError;
use std::f64::consts::PI;

const KEPLER_MAX_ITER: usize = 100;
const KEPLER_TOL: f64 = 1e-15;

/// Principal value of an angle in `[0, 2π)`.
pub(crate) fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Solve `E − e·sin(E) = M` for the eccentric anomaly of an elliptic orbit (`0 ≤ e < 1`).
///
/// Newton iteration started from `M` (or `π` for very eccentric orbits). The result is
/// in `[0, 2π)` modulo the revolution count of `M`.
pub(crate) fn solve_kepler_elliptic(mean_anomaly: Radian, ecc: f64) -> Result<Radian, SimulationError> {
    let m = principal_angle(mean_anomaly);
    let mut ecc_anom = if ecc < 0.8 { m } else { PI };

    for _ in 0..KEPLER_MAX_ITER {
        let f = ecc_anom - ecc * ecc_anom.sin() - m;
        let fp = 1.0 - ecc * ecc_anom.cos();
        let delta = f / fp;
        ecc_anom -= delta;
        if delta.abs() < KEPLER_TOL {
            return Ok(ecc_anom);
        }
    }

    Err(SimulationError::ConfigurationError(format!(
        "Kepler's equation did not converge (M = {mean_anomaly}, e = {ecc})"
    )))
}

/// Solve `e·sinh(F) − F = M` for the hyperbolic anomaly (`e > 1`).
pub(crate) fn solve_kepler_hyperbolic(mean_anomaly: Radian, ecc: f64) -> Result<f64, SimulationError> {
    let m = mean_anomaly;
    // asinh(M/e) is a good start for both small and large |M|
    let mut hyp_anom = (m / ecc).asinh();

    for _ in 0..KEPLER_MAX_ITER {
        let f = ecc * hyp_anom.sinh() - hyp_anom - m;
        let fp = ecc * hyp_anom.cosh() - 1.0;
        let delta = f / fp;
        hyp_anom -= delta;
        if delta.abs() < KEPLER_TOL * (1.0 + hyp_anom.abs()) {
            return Ok(hyp_anom);
        }
    }

    Err(SimulationError::ConfigurationError(format!(
        "hyperbolic Kepler equation did not converge (M = {mean_anomaly}, e = {ecc})"
    )))
}

/// True anomaly from the eccentric anomaly (elliptic case).
pub(crate) fn eccentric_to_true(ecc_anom: Radian, ecc: f64) -> Radian {
    2.0 * ((1.0 + ecc).sqrt() * (ecc_anom / 2.0).sin())
        .atan2((1.0 - ecc).sqrt() * (ecc_anom / 2.0).cos())
}

/// True anomaly from the hyperbolic anomaly.
pub(crate) fn hyperbolic_to_true(hyp_anom: f64, ecc: f64) -> Radian {
    2.0 * (((ecc + 1.0) / (ecc - 1.0)).sqrt() * (hyp_anom / 2.0).tanh()).atan()
}

/// Mean anomaly from the true anomaly, for elliptic (`e < 1`) or hyperbolic (`e > 1`) orbits.
///
/// The elliptic result is in `[0, 2π)`; the hyperbolic one is signed (negative before pericenter).
pub(crate) fn true_to_mean(true_anom: Radian, ecc: f64) -> Radian {
    if ecc < 1.0 {
        let ecc_anom = 2.0
            * ((1.0 - ecc).sqrt() * (true_anom / 2.0).sin())
                .atan2((1.0 + ecc).sqrt() * (true_anom / 2.0).cos());
        principal_angle(ecc_anom - ecc * ecc_anom.sin())
    } else {
        let hyp_anom = 2.0 * (((ecc - 1.0) / (ecc + 1.0)).sqrt() * (true_anom / 2.0).tan()).atanh();
        ecc * hyp_anom.sinh() - hyp_anom
    }
}
