//! Live N-body state driven by the IAS15 integrator.
//!
//! A [`Simulation`] owns the bodies (struct-of-arrays), the force model and the integrator
//! history. Bodies are looked up by name through a hash map built at insertion time;
//! caller-owned configuration is never touched.
use std::fmt;
use std::ops::Range;

use ahash::AHashMap;
use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    constants::Year,
    nbody::{
        forces::{ForceModel, NewtonianGravity, PostNewtonian},
        ias15::Ias15,
        particle::Particle,
    },
    sim_errors::SimulationError,
};

/// Tuning of the IAS15 integrator and of the post-Newtonian solver.
///
/// Defaults
/// -----------------
/// * `epsilon`: 1e-9 (relative size of the last Radau coefficient)
/// * `min_dt`: 0.0 (no lower bound on the step)
/// * `safety_factor`: 0.25 (reject steps shrinking by more than 4×, cap growth at 4×)
/// * `max_iterations`: 12 predictor–corrector passes
/// * `initial_dt`: 1e-3 yr
/// * `max_steps`: 1 000 000 steps per call to [`Simulation::integrate`]
/// * `pn_max_iterations`: 10
/// * `pn_tolerance`: 1e-16
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    pub epsilon: f64,
    pub min_dt: f64,
    pub safety_factor: f64,
    pub max_iterations: usize,
    pub initial_dt: f64,
    pub max_steps: usize,
    pub pn_max_iterations: usize,
    pub pn_tolerance: f64,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        IntegratorSettings {
            epsilon: 1e-9,
            min_dt: 0.0,
            safety_factor: 0.25,
            max_iterations: 12,
            initial_dt: 1e-3,
            max_steps: 1_000_000,
            pn_max_iterations: 10,
            pn_tolerance: 1e-16,
        }
    }
}

impl IntegratorSettings {
    pub fn builder() -> IntegratorSettingsBuilder {
        IntegratorSettingsBuilder::new()
    }

    pub(crate) fn validate(&self) -> Result<(), SimulationError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.epsilon) {
            return Err(SimulationError::InvalidParameter(
                "integrator epsilon must be > 0".into(),
            ));
        }
        if !(self.min_dt.is_finite() && self.min_dt >= 0.0) {
            return Err(SimulationError::InvalidParameter(
                "min_dt must be >= 0".into(),
            ));
        }
        if !(positive(self.safety_factor) && self.safety_factor < 1.0) {
            return Err(SimulationError::InvalidParameter(
                "safety_factor must be in (0, 1)".into(),
            ));
        }
        if !positive(self.initial_dt) {
            return Err(SimulationError::InvalidParameter(
                "initial_dt must be > 0".into(),
            ));
        }
        if self.max_iterations == 0 || self.max_steps == 0 || self.pn_max_iterations == 0 {
            return Err(SimulationError::InvalidParameter(
                "iteration and step limits must be >= 1".into(),
            ));
        }
        if !(self.pn_tolerance.is_finite() && self.pn_tolerance >= 0.0) {
            return Err(SimulationError::InvalidParameter(
                "pn_tolerance must be >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`IntegratorSettings`], with validation.
#[derive(Debug, Clone, Default)]
pub struct IntegratorSettingsBuilder {
    settings: IntegratorSettings,
}

impl IntegratorSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epsilon(mut self, v: f64) -> Self {
        self.settings.epsilon = v;
        self
    }
    pub fn min_dt(mut self, v: f64) -> Self {
        self.settings.min_dt = v;
        self
    }
    pub fn safety_factor(mut self, v: f64) -> Self {
        self.settings.safety_factor = v;
        self
    }
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.settings.max_iterations = v;
        self
    }
    pub fn initial_dt(mut self, v: f64) -> Self {
        self.settings.initial_dt = v;
        self
    }
    pub fn max_steps(mut self, v: usize) -> Self {
        self.settings.max_steps = v;
        self
    }
    pub fn pn_max_iterations(mut self, v: usize) -> Self {
        self.settings.pn_max_iterations = v;
        self
    }
    pub fn pn_tolerance(mut self, v: f64) -> Self {
        self.settings.pn_tolerance = v;
        self
    }

    pub fn build(self) -> Result<IntegratorSettings, SimulationError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

/// Gravitational N-body system with exact-finish integration.
pub struct Simulation {
    names: Vec<String>,
    masses: Vec<f64>,
    positions: Vec<Vector3<f64>>,
    velocities: Vec<Vector3<f64>>,
    index: AHashMap<String, usize>,

    gravitational_constant: f64,
    time: Year,
    dt: f64,
    steps_done: usize,

    forces: ForceModel,
    integrator: Ias15,
    settings: IntegratorSettings,
}

impl Simulation {
    /// Empty system under Newtonian gravity, clock set to `t0`.
    pub fn new(gravitational_constant: f64, t0: Year, settings: IntegratorSettings) -> Self {
        Simulation {
            names: Vec::new(),
            masses: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            index: AHashMap::new(),
            gravitational_constant,
            time: t0,
            dt: settings.initial_dt,
            steps_done: 0,
            forces: ForceModel::new().with(NewtonianGravity {
                gravitational_constant,
            }),
            integrator: Ias15::new(),
            settings,
        }
    }

    /// Attach the 1PN (EIH) correction for a speed of light in internal units.
    pub fn enable_post_newtonian(&mut self, speed_of_light: f64) {
        self.forces.push(PostNewtonian {
            gravitational_constant: self.gravitational_constant,
            speed_of_light,
            max_iterations: self.settings.pn_max_iterations,
            tolerance: self.settings.pn_tolerance,
        });
        self.integrator.reset();
    }

    /// Add a body and return its index.
    ///
    /// Return
    /// ------
    /// * `Err(SimulationError::ConfigurationError)` if the name is already used.
    /// * `Err(SimulationError::InvalidParameter)` if the state is not finite or the mass is negative.
    pub fn add(&mut self, particle: Particle) -> Result<usize, SimulationError> {
        if self.index.contains_key(&particle.hash) {
            return Err(SimulationError::ConfigurationError(format!(
                "duplicate body name '{}'",
                particle.hash
            )));
        }
        if !particle.is_finite() || !(particle.mass.is_finite() && particle.mass >= 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "body '{}' has a non-finite state or an invalid mass",
                particle.hash
            )));
        }

        let idx = self.names.len();
        self.index.insert(particle.hash.clone(), idx);
        self.names.push(particle.hash);
        self.masses.push(particle.mass);
        self.positions.push(particle.position);
        self.velocities.push(particle.velocity);
        self.integrator.reset();
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Snapshot of body `idx`.
    pub fn particle(&self, idx: usize) -> Particle {
        Particle::new(
            self.names[idx].clone(),
            self.masses[idx],
            self.positions[idx],
            self.velocities[idx],
        )
    }

    pub fn position(&self, idx: usize) -> &Vector3<f64> {
        &self.positions[idx]
    }

    pub fn velocity(&self, idx: usize) -> &Vector3<f64> {
        &self.velocities[idx]
    }

    pub fn mass(&self, idx: usize) -> f64 {
        self.masses[idx]
    }

    pub fn time(&self) -> Year {
        self.time
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.gravitational_constant
    }

    /// Total number of accepted integrator steps so far.
    pub fn steps_done(&self) -> usize {
        self.steps_done
    }

    /// Centre of mass of the bodies in `range`, as a pseudo-particle named `"com"`.
    ///
    /// A massless (or empty) range yields a zero-mass particle at the origin.
    pub fn center_of_mass(&self, range: Range<usize>) -> Particle {
        let mut mass = 0.0;
        let mut position = Vector3::zeros();
        let mut velocity = Vector3::zeros();
        for i in range {
            mass += self.masses[i];
            position += self.positions[i] * self.masses[i];
            velocity += self.velocities[i] * self.masses[i];
        }
        if mass > 0.0 {
            position /= mass;
            velocity /= mass;
        }
        Particle::new("com", mass, position, velocity)
    }

    /// Shift positions and velocities to the barycentric frame of the whole system.
    pub fn move_to_com(&mut self) {
        let com = self.center_of_mass(0..self.len());
        for (r, v) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            *r -= com.position;
            *v -= com.velocity;
        }
        self.integrator.reset();
    }

    /// Integrate forward or backward until the clock equals `target` exactly.
    ///
    /// The last step is truncated to land on `target`; when it is accepted the previous
    /// adaptive step is kept for the next call. Asking for the current time does nothing.
    ///
    /// Return
    /// ------
    /// * `Err(SimulationError::IntegrationFailure)` if the state becomes non-finite or more than
    ///   `max_steps` steps are needed.
    pub fn integrate(&mut self, target: Year) -> Result<(), SimulationError> {
        if !target.is_finite() {
            return Err(SimulationError::IntegrationFailure(format!(
                "cannot integrate to non-finite time {target}"
            )));
        }
        if target == self.time {
            return Ok(());
        }
        if self.is_empty() {
            self.time = target;
            return Ok(());
        }

        let forward = target > self.time;
        if (self.dt > 0.0) != forward {
            self.dt = -self.dt;
        }

        let mut steps = 0;
        loop {
            let remaining = target - self.time;
            let truncated = self.dt.abs() >= remaining.abs();
            let dt_try = if truncated { remaining } else { self.dt };

            let report = self.integrator.step(
                &self.masses,
                &mut self.positions,
                &mut self.velocities,
                &self.forces,
                dt_try,
                &self.settings,
            )?;
            steps += 1;
            self.steps_done += 1;

            if truncated && report.dt_done == dt_try {
                self.time = target;
                break;
            }
            self.time += report.dt_done;
            self.dt = report.dt_next;

            if steps >= self.settings.max_steps {
                return Err(SimulationError::IntegrationFailure(format!(
                    "more than {} steps needed to reach t = {target} (stopped at t = {})",
                    self.settings.max_steps, self.time
                )));
            }
        }

        debug!(
            "integrated to t = {target} in {steps} steps (dt = {:e})",
            self.dt
        );
        Ok(())
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Simulation at t = {} ({} bodies, G = {:e}, {} force terms)",
            self.time,
            self.len(),
            self.gravitational_constant,
            self.forces.len()
        )?;
        for i in 0..self.len() {
            let r = &self.positions[i];
            let v = &self.velocities[i];
            writeln!(
                f,
                "  {:<12} m = {:e}  r = ({:.6e}, {:.6e}, {:.6e})  v = ({:.6e}, {:.6e}, {:.6e})",
                self.names[i], self.masses[i], r.x, r.y, r.z, v.x, v.y, v.z
            )?;
        }
        Ok(())
    }
}
