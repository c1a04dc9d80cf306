//! # Unit normalization
//!
//! Converts the fixed physical ratios of [`crate::constants`] into the scalars of one run,
//! given the reference distance `R0` (parsec).
//!
//! Lengths inside the integrator are arcseconds seen from `R0`, so:
//!
//! ```text
//! G_int  = (G·M☉·yr²/au³) / R0³
//! c_int  = (c·yr/au) / R0
//! k_vel  = (au/yr in km/s) · R0
//! ```
use crate::{
    constants::{
        GRAVITATIONAL_CONSTANT_TIMES_R0_CUBED, SPEED_OF_LIGHT_TIMES_R0,
        VELOCITY_CONVERSION_PER_R0,
    },
    sim_errors::SimulationError,
};

/// Normalized scalars derived from `R0`, immutable for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InternalUnits {
    /// Reference distance (pc) the units were built from.
    pub r0: f64,
    /// Gravitational constant in arcsec³ / (M☉ · yr²).
    pub gravitational_constant: f64,
    /// Speed of light in arcsec / yr.
    pub speed_of_light: f64,
    /// Multiply an internal velocity by this factor to obtain km/s.
    pub velocity_conversion_factor: f64,
}

impl InternalUnits {
    /// Build the internal units for a reference distance `r0`.
    ///
    /// Return
    /// ------
    /// * `Err(SimulationError::InvalidParameter)` if `r0` is not a finite, strictly positive number.
    pub fn new(r0: f64) -> Result<Self, SimulationError> {
        if !r0.is_finite() || r0 <= 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "R0 must be a finite positive distance, got {r0}"
            )));
        }

        Ok(InternalUnits {
            r0,
            gravitational_constant: GRAVITATIONAL_CONSTANT_TIMES_R0_CUBED / r0.powi(3),
            speed_of_light: SPEED_OF_LIGHT_TIMES_R0 / r0,
            velocity_conversion_factor: VELOCITY_CONVERSION_PER_R0 * r0,
        })
    }

    /// Convert an internal velocity (arcsec/yr) to km/s.
    #[inline]
    pub fn to_km_per_s(&self, velocity: f64) -> f64 {
        velocity * self.velocity_conversion_factor
    }
}
