//! # Osculating orbital elements
//!
//! This module defines [`ElementSet`], the element set accepted for seeding a body
//! `(a, e, inc, Ω, ω, T)`, and [`OsculatingElements`], the full set recovered from an
//! instantaneous relative state.
//!
//! ## Conventions
//!
//! - Lengths in internal units (arcsec at R0), times in years.
//! - Angles in **radians** inside the crate; degrees only at the reporting boundary
//!   ([`crate::result::OrbitRecord`]).
//! - Elliptic orbits have `a > 0, 0 ≤ e < 1`; hyperbolic orbits have `a < 0, e > 1`.
//!   Parabolic orbits (`e = 1`) cannot be seeded.
//!
//! ## Degeneracies
//!
//! - **Equatorial orbits (`inc → 0` or `π`)**: Ω is undefined and set to `0`; ω then
//!   measures the longitude of pericenter.
//! - **Circular orbits (`e → 0`)**: ω is undefined and set to `0`; the true anomaly then
//!   measures the argument of latitude.
//!
//! ## See also
//!
//! - [`crate::kepler`] – Kepler's equation solvers used by the time-of-pericenter handling.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    constants::{Radian, Year, DPI},
    kepler::{
        eccentric_to_true, hyperbolic_to_true, principal_angle, solve_kepler_elliptic,
        solve_kepler_hyperbolic, true_to_mean,
    },
    sim_errors::SimulationError,
};

/// Threshold under which eccentricity or node vector norms are treated as zero.
const DEGENERATE_EPS: f64 = 1e-11;

/// Osculating elements used to seed a body relative to its primary.
///
/// Fields
/// ------
/// * `semi_major_axis` – `a`, internal length units.
/// * `eccentricity` – `e`, unitless.
/// * `inclination` – `inc`, radians.
/// * `ascending_node` – `Ω`, radians.
/// * `periapsis_argument` – `ω`, radians.
/// * `pericenter_time` – `T`, epoch of pericenter passage (years).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementSet {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub ascending_node: Radian,
    pub periapsis_argument: Radian,
    pub pericenter_time: Year,
}

impl ElementSet {
    /// Check the geometric domain of the element set.
    pub(crate) fn validate(&self) -> Result<(), SimulationError> {
        let (a, e) = (self.semi_major_axis, self.eccentricity);
        let values = [
            a,
            e,
            self.inclination,
            self.ascending_node,
            self.periapsis_argument,
            self.pericenter_time,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SimulationError::InvalidParameter(
                "orbital elements must be finite".into(),
            ));
        }
        if e < 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "eccentricity must be non-negative, got {e}"
            )));
        }
        if e == 1.0 {
            return Err(SimulationError::InvalidParameter(
                "parabolic orbits (e = 1) cannot be seeded from a semi-major axis".into(),
            ));
        }
        if e < 1.0 && a <= 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "bound orbit (e = {e}) requires a positive semi-major axis, got {a}"
            )));
        }
        if e > 1.0 && a >= 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "unbound orbit (e = {e}) requires a negative semi-major axis, got {a}"
            )));
        }
        Ok(())
    }

    /// Mean motion `n = sqrt(μ/|a|³)`.
    fn mean_motion(&self, mu: f64) -> f64 {
        (mu / self.semi_major_axis.abs().powi(3)).sqrt()
    }

    /// True anomaly reached at `epoch` when pericenter is crossed at `T`.
    fn true_anomaly_at(&self, mu: f64, epoch: Year) -> Result<Radian, SimulationError> {
        let ecc = self.eccentricity;
        let mean_anomaly = self.mean_motion(mu) * (epoch - self.pericenter_time);

        if ecc < 1.0 {
            let ecc_anom = solve_kepler_elliptic(mean_anomaly, ecc)?;
            Ok(eccentric_to_true(ecc_anom, ecc))
        } else {
            let hyp_anom = solve_kepler_hyperbolic(mean_anomaly, ecc)?;
            Ok(hyperbolic_to_true(hyp_anom, ecc))
        }
    }

    /// Position and velocity relative to the primary at `epoch`.
    ///
    /// Arguments
    /// ---------
    /// * `mu` – gravitational parameter `G·(M_primary + m)`.
    /// * `epoch` – epoch of the requested state (years).
    ///
    /// Return
    /// ------
    /// * `(position, velocity)` in the reference frame of the primary.
    /// * `Err(SimulationError::ConfigurationError)` if `mu` is not strictly positive.
    pub fn to_relative_state(
        &self,
        mu: f64,
        epoch: Year,
    ) -> Result<(Vector3<f64>, Vector3<f64>), SimulationError> {
        self.validate()?;
        if !(mu > 0.0) || !mu.is_finite() {
            return Err(SimulationError::ConfigurationError(format!(
                "cannot place a body on an orbit with gravitational parameter {mu}"
            )));
        }

        let ecc = self.eccentricity;
        let f = self.true_anomaly_at(mu, epoch)?;
        if ecc > 1.0 && f.cos() <= -1.0 / ecc {
            return Err(SimulationError::ConfigurationError(
                "true anomaly beyond the asymptote of the hyperbola".into(),
            ));
        }

        let p = self.semi_major_axis * (1.0 - ecc * ecc);
        let r = p / (1.0 + ecc * f.cos());
        let v0 = (mu / p).sqrt();

        let (s_node, c_node) = self.ascending_node.sin_cos();
        let (s_peri, c_peri) = self.periapsis_argument.sin_cos();
        let (s_inc, c_inc) = self.inclination.sin_cos();
        let (s_f, c_f) = f.sin_cos();

        // argument of latitude u = ω + f
        let c_u = c_peri * c_f - s_peri * s_f;
        let s_u = s_peri * c_f + c_peri * s_f;

        let position = Vector3::new(
            r * (c_node * c_u - s_node * s_u * c_inc),
            r * (s_node * c_u + c_node * s_u * c_inc),
            r * s_u * s_inc,
        );

        let velocity = Vector3::new(
            v0 * ((ecc + c_f) * (-c_inc * c_peri * s_node - c_node * s_peri)
                - s_f * (c_peri * c_node - c_inc * s_peri * s_node)),
            v0 * ((ecc + c_f) * (c_inc * c_peri * c_node - s_node * s_peri)
                - s_f * (c_peri * s_node + c_inc * s_peri * c_node)),
            v0 * ((ecc + c_f) * c_peri * s_inc - s_f * s_inc * s_peri),
        );

        Ok((position, velocity))
    }
}

/// Osculating elements recovered from a relative state.
///
/// Units
/// -----
/// * `semi_major_axis`: internal length (negative for hyperbolic orbits).
/// * angles: radians in `[0, 2π)` (inclination in `[0, π]`).
/// * `period`: years, carrying the sign of `a` (negative when unbound).
/// * `pericenter_time`: epoch of the closest pericenter passage consistent with `mean_anomaly`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsculatingElements {
    pub reference_epoch: Year,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub ascending_node: Radian,
    pub periapsis_argument: Radian,
    pub true_anomaly: Radian,
    pub mean_anomaly: Radian,
    pub period: Year,
    pub pericenter_time: Year,
}

impl OsculatingElements {
    /// Compute osculating elements from a position/velocity relative to the primary.
    ///
    /// Arguments
    /// ---------
    /// * `position`, `velocity` – state of the body minus state of the primary.
    /// * `mu` – gravitational parameter `G·(M_primary + m)`.
    /// * `reference_epoch` – epoch of the state (years).
    ///
    /// Return
    /// ------
    /// * `Err(SimulationError::ConfigurationError)` if `mu ≤ 0`, the bodies coincide,
    ///   or the orbit is exactly parabolic.
    pub fn from_relative_state(
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        mu: f64,
        reference_epoch: Year,
    ) -> Result<Self, SimulationError> {
        if !(mu > 0.0) || !mu.is_finite() {
            return Err(SimulationError::ConfigurationError(format!(
                "orbital elements undefined for gravitational parameter {mu}"
            )));
        }
        let d = position.norm();
        if d == 0.0 {
            return Err(SimulationError::ConfigurationError(
                "orbital elements undefined: body coincides with its primary".into(),
            ));
        }

        let v2 = velocity.norm_squared();
        let rv = position.dot(velocity);
        let h = position.cross(velocity);
        let h_norm = h.norm();

        let inv_a = 2.0 / d - v2 / mu;
        if inv_a == 0.0 {
            return Err(SimulationError::ConfigurationError(
                "orbital elements undefined for an exactly parabolic orbit".into(),
            ));
        }
        let a = 1.0 / inv_a;

        // eccentricity (Laplace-Runge-Lenz) vector
        let e_vec = ((v2 - mu / d) * position - rv * velocity) / mu;
        let ecc = e_vec.norm();

        let inc = if h_norm > 0.0 {
            (h.z / h_norm).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let node = Vector3::new(-h.y, h.x, 0.0);
        let node_norm = node.norm();
        let equatorial = node_norm <= DEGENERATE_EPS * h_norm.max(f64::MIN_POSITIVE);
        let circular = ecc < DEGENERATE_EPS;

        let ascending_node = if equatorial {
            0.0
        } else {
            let mut o = (node.x / node_norm).clamp(-1.0, 1.0).acos();
            if node.y < 0.0 {
                o = DPI - o;
            }
            o
        };

        let periapsis_argument = if circular {
            0.0
        } else if equatorial {
            let w = e_vec.y.atan2(e_vec.x);
            principal_angle(if h.z < 0.0 { -w } else { w })
        } else {
            let mut w = (node.dot(&e_vec) / (node_norm * ecc)).clamp(-1.0, 1.0).acos();
            if e_vec.z < 0.0 {
                w = DPI - w;
            }
            w
        };

        let true_anomaly = if !circular {
            let mut f = (e_vec.dot(position) / (ecc * d)).clamp(-1.0, 1.0).acos();
            if rv < 0.0 {
                f = DPI - f;
            }
            f
        } else if !equatorial {
            // argument of latitude
            let mut u = (node.dot(position) / (node_norm * d)).clamp(-1.0, 1.0).acos();
            if position.z < 0.0 {
                u = DPI - u;
            }
            u
        } else {
            // true longitude
            let l = position.y.atan2(position.x);
            principal_angle(if h.z < 0.0 { -l } else { l })
        };

        let mean_anomaly = true_to_mean(true_anomaly, ecc);
        let mean_motion = (mu / a.abs().powi(3)).sqrt();
        let period = (DPI / mean_motion).copysign(a);

        Ok(OsculatingElements {
            reference_epoch,
            semi_major_axis: a,
            eccentricity: ecc,
            inclination: inc,
            ascending_node,
            periapsis_argument,
            true_anomaly,
            mean_anomaly,
            period,
            pericenter_time: reference_epoch - mean_anomaly / mean_motion,
        })
    }
}

impl fmt::Display for OsculatingElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Osculating elements @ epoch (yr): {:.6}", self.reference_epoch)?;
        writeln!(f, "-------------------------------------------")?;
        writeln!(f, "  a   (semi-major axis)       = {:.6}", self.semi_major_axis)?;
        writeln!(f, "  e   (eccentricity)          = {:.6}", self.eccentricity)?;
        writeln!(f, "  i   (inclination)           = {:.6}°", self.inclination.to_degrees())?;
        writeln!(f, "  Ω   (longitude of node)     = {:.6}°", self.ascending_node.to_degrees())?;
        writeln!(f, "  ω   (argument of periapsis) = {:.6}°", self.periapsis_argument.to_degrees())?;
        writeln!(f, "  P   (period)                = {:.6} yr", self.period)
    }
}
