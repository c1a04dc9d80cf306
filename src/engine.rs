//! # Simulation engine
//!
//! Runs one parameter set end to end:
//!
//! 1. [`InternalUnits`] from `R0`,
//! 2. a [`Simulation`] seeded body by body in declaration order, optionally with the 1PN
//!    correction, then moved to the barycentric frame,
//! 3. the [`TimeGrid`] of observation epochs,
//! 4. for each epoch and each body, the light-time corrected [`ObservationRecord`]
//!    (see [`crate::observation`]) and, for bodies with a primary, the [`OrbitRecord`]
//!    at the emission epoch.
//!
//! The engine holds no state between runs. [`try_run_simulation`] exposes the typed error;
//! [`run_simulation`] folds any error into a failure [`SimulationResult`] with no partial data.
use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::{
    nbody::{particle::Particle, simulation::Simulation},
    observation::observe,
    orbit_elements::OsculatingElements,
    params::{InitialState, Primary, SimulationParameters},
    result::{ObservationRecord, OrbitRecord, SimulationOutput, SimulationResult},
    sim_errors::SimulationError,
    time_grid::TimeGrid,
    units::InternalUnits,
};

/// Reference state resolved for one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrimaryRef {
    /// Centre of mass of the bodies `0..upto`.
    Barycenter { upto: usize },
    /// Body at this index.
    Body(usize),
}

impl PrimaryRef {
    fn state(self, sim: &Simulation) -> Particle {
        match self {
            PrimaryRef::Barycenter { upto } => sim.center_of_mass(0..upto),
            PrimaryRef::Body(idx) => sim.particle(idx),
        }
    }
}

/// Live system plus, per body, the primary its orbit is reported against.
struct ConfiguredSystem {
    simulation: Simulation,
    tracked: Vec<Option<PrimaryRef>>,
}

fn configure(
    params: &SimulationParameters,
    units: &InternalUnits,
) -> Result<ConfiguredSystem, SimulationError> {
    let mut sim = Simulation::new(
        units.gravitational_constant,
        params.start_time,
        params.integrator,
    );
    if params.enable_gr {
        sim.enable_post_newtonian(units.speed_of_light);
    }

    let mut tracked = Vec::with_capacity(params.bodies.len());
    for (idx, body) in params.bodies.iter().enumerate() {
        let primary = match &body.primary {
            Some(Primary::Barycenter) => Some(PrimaryRef::Barycenter { upto: idx }),
            Some(Primary::Body(name)) => {
                let j = sim.index_of(name).ok_or_else(|| {
                    SimulationError::ConfigurationError(format!(
                        "primary '{name}' of '{}' does not match any previously added body",
                        body.name
                    ))
                })?;
                Some(PrimaryRef::Body(j))
            }
            None => None,
        };

        let particle = match &body.initial_state {
            InitialState::Cartesian { position, velocity } => {
                Particle::new(body.name.clone(), body.mass, *position, *velocity)
            }
            InitialState::Elements(elements) => {
                // no primary: place relative to the barycenter of the bodies added so far
                let reference = primary
                    .unwrap_or(PrimaryRef::Barycenter { upto: idx })
                    .state(&sim);
                let mu = sim.gravitational_constant() * (reference.mass + body.mass);
                let (r, v) = elements
                    .to_relative_state(mu, params.start_time)
                    .map_err(|e| match e {
                        SimulationError::ConfigurationError(msg) => {
                            SimulationError::ConfigurationError(format!("body '{}': {msg}", body.name))
                        }
                        other => other,
                    })?;
                Particle::new(
                    body.name.clone(),
                    body.mass,
                    reference.position + r,
                    reference.velocity + v,
                )
            }
        };

        sim.add(particle)?;
        tracked.push(primary);
    }

    sim.move_to_com();

    debug!(
        "configured {} bodies at t = {} (G = {:e}, c = {:e}, 1PN: {})",
        sim.len(),
        params.start_time,
        units.gravitational_constant,
        units.speed_of_light,
        params.enable_gr
    );

    Ok(ConfiguredSystem {
        simulation: sim,
        tracked,
    })
}

/// Build the live N-body system of a parameter set, in the barycentric frame.
///
/// Return
/// ------
/// * `Err(SimulationError::InvalidParameter)` / `Err(SimulationError::ConfigurationError)` if
///   the parameters break an invariant (see [`SimulationParameters::validate`]).
pub fn configure_simulation(params: &SimulationParameters) -> Result<Simulation, SimulationError> {
    params.validate()?;
    let units = InternalUnits::new(params.r0)?;
    Ok(configure(params, &units)?.simulation)
}

fn osculating_elements(
    sim: &Simulation,
    idx: usize,
    primary: PrimaryRef,
) -> Result<OsculatingElements, SimulationError> {
    let reference = primary.state(sim);
    let mu = sim.gravitational_constant() * (reference.mass + sim.mass(idx));
    OsculatingElements::from_relative_state(
        &(sim.position(idx) - reference.position),
        &(sim.velocity(idx) - reference.velocity),
        mu,
        sim.time(),
    )
}

/// Run one simulation and return the per-body series, or the first error met.
///
/// Arguments
/// -----------------
/// * `params` – parameter set, validated before anything is integrated.
///
/// Return
/// ----------
/// * [`SimulationOutput`] with one [`ObservationRecord`] per body and epoch, and one
///   [`OrbitRecord`] per epoch for bodies with a primary.
/// * `Err(SimulationError)` – invalid input, unresolvable primary or integration failure.
///   Nothing computed before the error is returned.
///
/// See also
/// ------------
/// * [`run_simulation`] – same computation with errors folded into the result.
pub fn try_run_simulation(params: &SimulationParameters) -> Result<SimulationOutput, SimulationError> {
    params.validate()?;
    let units = InternalUnits::new(params.r0)?;
    let ConfiguredSystem {
        simulation: mut sim,
        tracked,
    } = configure(params, &units)?;
    let grid = TimeGrid::linspace(params.start_time, params.end_time, params.time_steps)?;

    let n_bodies = params.bodies.len();
    let mut data: Vec<Vec<ObservationRecord>> = vec![Vec::with_capacity(grid.len()); n_bodies];
    let mut orbits: Vec<Vec<OrbitRecord>> = tracked
        .iter()
        .map(|p| Vec::with_capacity(if p.is_some() { grid.len() } else { 0 }))
        .collect();

    for &t_obs in grid.iter() {
        for idx in 0..n_bodies {
            let record = observe(&mut sim, idx, t_obs, &units)?;
            data[idx].push(record);

            if let Some(primary) = tracked[idx] {
                let elements = osculating_elements(&sim, idx, primary)?;
                orbits[idx].push(OrbitRecord::new(t_obs, &elements));
            }
        }
    }

    info!(
        "simulation of {n_bodies} bodies over [{}, {}] done ({} epochs, {} integrator steps)",
        params.start_time,
        params.end_time,
        grid.len(),
        sim.steps_done()
    );

    let order: Vec<String> = params.bodies.iter().map(|b| b.name.clone()).collect();
    let orbits: BTreeMap<String, Vec<OrbitRecord>> = order
        .iter()
        .zip(tracked.iter().zip(orbits))
        .filter(|(_, (primary, _))| primary.is_some())
        .map(|(name, (_, series))| (name.clone(), series))
        .collect();
    let data: BTreeMap<String, Vec<ObservationRecord>> =
        order.iter().cloned().zip(data).collect();

    Ok(SimulationOutput {
        order,
        data,
        orbits,
    })
}

/// Run one simulation; never returns an error.
///
/// Failures of any kind produce a [`SimulationResult`] with failure status, a message
/// and empty series.
pub fn run_simulation(params: &SimulationParameters) -> SimulationResult {
    match try_run_simulation(params) {
        Ok(out) => out.into(),
        Err(err) => {
            warn!("simulation failed: {err}");
            SimulationResult::failure(&err)
        }
    }
}

#[cfg(test)]
mod engine_test {
    use super::*;
    use crate::{orbit_elements::ElementSet, params::BodyConfig};
    use nalgebra::Vector3;

    fn circular(a: f64) -> ElementSet {
        ElementSet {
            semi_major_axis: a,
            eccentricity: 0.0,
            inclination: 0.0,
            ascending_node: 0.0,
            periapsis_argument: 0.0,
            pericenter_time: 0.0,
        }
    }

    #[test]
    fn test_barycenter_primary_is_previous_bodies() {
        let params = SimulationParameters::builder()
            .r0(1.0)
            .start_time(0.0)
            .end_time(1.0)
            .time_steps(2)
            .enable_gr(false)
            .body(BodyConfig::cartesian("a", 1.0, Vector3::new(-1.0, 0.0, 0.0), Vector3::zeros()))
            .body(BodyConfig::cartesian("b", 1.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros()))
            .body(BodyConfig::from_elements("c", 0.0, circular(10.0)).orbiting(Primary::Barycenter))
            .build()
            .unwrap();

        let units = InternalUnits::new(params.r0).unwrap();
        let system = configure(&params, &units).unwrap();
        assert_eq!(system.tracked[2], Some(PrimaryRef::Barycenter { upto: 2 }));
        assert_eq!(system.tracked[0], None);

        // a and b are symmetric about the origin: c sits 10 units from it
        let c = system.simulation.particle(2);
        assert!((c.position.norm() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_primary() {
        let mut params = SimulationParameters::default();
        params.bodies[1].primary = Some(Primary::Body("Sgr B*".into()));
        let err = try_run_simulation(&params).unwrap_err();
        assert!(matches!(err, SimulationError::ConfigurationError(_)));
    }
}
