//! # Relativistic observation correction
//!
//! Turns the live integrator state into what a distant observer records at one epoch:
//!
//! 1. integrate to the observation epoch `t_obs`,
//! 2. estimate the emission (retarded) time with one light-time correction
//!    `t' = t_obs − (z/c)·(1 − vz/c)`, using the state sampled at `t_obs`,
//! 3. integrate to `t'` and sample the state again,
//! 4. compute the special-relativistic Doppler shift of that state.
//!
//! The light-time correction is a single first-order update, not an iteration to
//! convergence. Its residual is of order `(z/c)·(vz/c)²`, a small systematic offset of
//! the emission epoch that is part of the model.
//!
//! The internal line of sight is `+z` (positive `vz` means receding). Reported Cartesian
//! components are rotated by 90° about that axis into the sky-plane convention
//! `x = −y_int`, `y = x_int`.
use nalgebra::Vector3;

use crate::{
    constants::Year,
    nbody::simulation::Simulation,
    result::ObservationRecord,
    sim_errors::SimulationError,
    units::InternalUnits,
};

/// Emission epoch after one light-time correction.
///
/// Arguments
/// -----------------
/// * `t_obs` – observation epoch (years).
/// * `z`, `vz` – line-of-sight position and velocity at `t_obs` (internal units).
/// * `speed_of_light` – `c` in internal units.
#[inline]
pub fn retarded_time(t_obs: Year, z: f64, vz: f64, speed_of_light: f64) -> Year {
    t_obs - z / speed_of_light * (1.0 - vz / speed_of_light)
}

/// Relativistic Doppler redshift `z_D = (1 + β∥)/sqrt(1 − β²) − 1`.
///
/// `β∥ = vz/c` and `β² = |v|²/c²`. Positive for a receding source.
pub fn relativistic_doppler(velocity: &Vector3<f64>, speed_of_light: f64) -> f64 {
    let beta_parallel = velocity.z / speed_of_light;
    let beta2 = velocity.norm_squared() / (speed_of_light * speed_of_light);
    (1.0 + beta_parallel) / (1.0 - beta2).sqrt() - 1.0
}

/// Observe body `idx` at `t_obs`, leaving the simulation at the emission epoch.
///
/// Return
/// ------
/// * The [`ObservationRecord`] built from the emission-time state.
/// * `Err(SimulationError::IntegrationFailure)` if the integration fails or the body moves
///   faster than light.
pub fn observe(
    sim: &mut Simulation,
    idx: usize,
    t_obs: Year,
    units: &InternalUnits,
) -> Result<ObservationRecord, SimulationError> {
    let c = units.speed_of_light;

    sim.integrate(t_obs)?;
    let (z, vz) = (sim.position(idx).z, sim.velocity(idx).z);
    let t_emit = retarded_time(t_obs, z, vz, c);
    sim.integrate(t_emit)?;

    let p = *sim.position(idx);
    let v = *sim.velocity(idx);
    let z_doppler = relativistic_doppler(&v, c);
    if !z_doppler.is_finite() {
        return Err(SimulationError::IntegrationFailure(format!(
            "superluminal velocity at t = {t_emit} (|v|/c = {:e})",
            v.norm() / c
        )));
    }

    Ok(ObservationRecord {
        t: t_obs,
        t_emit,
        x: -p.y,
        y: p.x,
        z: p.z,
        vx: -v.y,
        vy: v.x,
        vz: units.to_km_per_s(v.z),
        vr_doppler: units.to_km_per_s(z_doppler * c),
    })
}

#[cfg(test)]
mod observation_test {
    use super::*;
    use crate::nbody::{particle::Particle, simulation::IntegratorSettings};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_retarded_time() {
        // closer to the observer (z < 0): light emitted later
        assert!(retarded_time(10.0, -1.0, 0.0, 100.0) > 10.0);
        assert_relative_eq!(retarded_time(10.0, 2.0, 0.0, 100.0), 9.98);
        assert_relative_eq!(retarded_time(10.0, 2.0, 10.0, 100.0), 10.0 - 0.02 * 0.9);
        assert_eq!(retarded_time(10.0, 0.0, 5.0, 100.0), 10.0);
    }

    #[test]
    fn test_doppler_sign_and_limits() {
        let c = 1.0;
        assert_eq!(relativistic_doppler(&Vector3::zeros(), c), 0.0);
        assert!(relativistic_doppler(&Vector3::new(0.0, 0.0, 0.01), c) > 0.0);
        assert!(relativistic_doppler(&Vector3::new(0.0, 0.0, -0.01), c) < 0.0);

        // longitudinal: sqrt((1+β)/(1−β)) − 1
        let beta: f64 = 0.3;
        assert_relative_eq!(
            relativistic_doppler(&Vector3::new(0.0, 0.0, beta), c),
            ((1.0 + beta) / (1.0 - beta)).sqrt() - 1.0,
            max_relative = 1e-14
        );

        // transverse: pure time dilation, always a redshift
        let transverse = relativistic_doppler(&Vector3::new(beta, 0.0, 0.0), c);
        assert_relative_eq!(transverse, 1.0 / (1.0 - beta * beta).sqrt() - 1.0);
    }

    #[test]
    fn test_observe_axis_convention() {
        let units = InternalUnits::new(1.0).unwrap();
        let mut sim = Simulation::new(units.gravitational_constant, 0.0, IntegratorSettings::default());
        // free body: no forces act on a lone particle
        sim.add(Particle::new(
            "probe",
            1.0,
            Vector3::new(1.0, 2.0, 0.0),
            Vector3::new(0.5, -0.25, 0.0),
        ))
        .unwrap();

        let rec = observe(&mut sim, 0, 1.0, &units).unwrap();
        assert_eq!(rec.t, 1.0);
        assert_eq!(rec.t_emit, 1.0);
        assert_abs_diff_eq!(rec.x, -1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(rec.y, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(rec.vx, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(rec.vy, 0.5, epsilon = 1e-12);
        assert_eq!(rec.vz, 0.0);
        // transverse motion only: small positive shift
        assert!(rec.vr_doppler > 0.0);
    }

    #[test]
    fn test_superluminal_state_fails() {
        let units = InternalUnits::new(1.0).unwrap();
        let mut sim = Simulation::new(units.gravitational_constant, 0.0, IntegratorSettings::default());
        sim.add(Particle::new(
            "tachyon",
            1.0,
            Vector3::zeros(),
            Vector3::new(2.0 * units.speed_of_light, 0.0, 0.0),
        ))
        .unwrap();

        let err = observe(&mut sim, 0, 0.0, &units).unwrap_err();
        assert!(matches!(err, SimulationError::IntegrationFailure(_)));
    }
}
