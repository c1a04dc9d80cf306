//! # Simulation parameters
//!
//! Typed, immutable input of one engine run.
//!
//! [`SimulationParameters`] and [`BodyConfig`] deserialize from the JSON layout used by
//! parameter files:
//!
//! ```json
//! {
//!   "R0": 8300.0, "start_time": 2000, "end_time": 2030, "time_steps": 300,
//!   "bodies": [
//!     {"hash": "Sgr A*", "m": 4.2e6, "x": 0, "y": 0, "z": 0, "vx": 0, "vy": 0, "vz": 0},
//!     {"hash": "S2", "m": 0, "a": 0.126, "e": 0.884, "inc": 2.34, "Omega": 3.96,
//!      "omega": 1.15, "T": 2002.33, "primary": "Sgr A*"}
//!   ]
//! }
//! ```
//!
//! Units
//! -----
//! * `R0` in parsec, masses in solar masses, lengths in arcseconds seen from `R0`,
//!   times in Julian years, velocities in arcsec/yr.
//! * Element angles (`inc`, `Omega`, `omega`) in radians.
//!
//! A body is given either a full Cartesian state or a full element set; the raw JSON
//! form is checked by [`BodyConfig::try_from`] and any other mix is rejected.
//! `primary` is the name of a body declared earlier, or `"com"` for the barycenter of the
//! bodies declared before this one.
//!
//! See also
//! ------------
//! * [`SimulationParameters::builder`] – programmatic construction with validation.
//! * [`crate::engine::run_simulation`] – consumes the parameters.
use std::{fmt, fs::File, io::BufReader, path::Path};

use ahash::AHashMap;
use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{ArcSec, SolarMass, Year, BARYCENTER_SYMBOL},
    nbody::simulation::IntegratorSettings,
    orbit_elements::ElementSet,
    sim_errors::SimulationError,
    units::InternalUnits,
};

/// Reference an element set (and the extracted orbit) is measured against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Primary {
    /// Centre of mass of the bodies declared before the orbiting body.
    Barycenter,
    /// A body declared earlier, by name.
    Body(String),
}

impl From<String> for Primary {
    fn from(s: String) -> Self {
        if s == BARYCENTER_SYMBOL {
            Primary::Barycenter
        } else {
            Primary::Body(s)
        }
    }
}

impl From<&str> for Primary {
    fn from(s: &str) -> Self {
        Primary::from(s.to_string())
    }
}

impl From<Primary> for String {
    fn from(p: Primary) -> Self {
        match p {
            Primary::Barycenter => BARYCENTER_SYMBOL.to_string(),
            Primary::Body(name) => name,
        }
    }
}

impl fmt::Display for Primary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primary::Barycenter => write!(f, "{BARYCENTER_SYMBOL}"),
            Primary::Body(name) => write!(f, "{name}"),
        }
    }
}

/// How a body is placed at `start_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialState {
    /// Absolute position (arcsec) and velocity (arcsec/yr).
    Cartesian {
        position: Vector3<ArcSec>,
        velocity: Vector3<f64>,
    },
    /// Osculating elements relative to the primary.
    Elements(ElementSet),
}

/// One body of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBodyConfig", into = "RawBodyConfig")]
pub struct BodyConfig {
    pub name: String,
    pub mass: SolarMass,
    pub initial_state: InitialState,
    pub primary: Option<Primary>,
}

impl BodyConfig {
    /// Body placed by an absolute Cartesian state, with no primary.
    pub fn cartesian(
        name: impl Into<String>,
        mass: SolarMass,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
    ) -> Self {
        BodyConfig {
            name: name.into(),
            mass,
            initial_state: InitialState::Cartesian { position, velocity },
            primary: None,
        }
    }

    /// Body placed by osculating elements.
    ///
    /// Without a call to [`BodyConfig::orbiting`] the elements are taken relative to the
    /// barycenter of the previous bodies, but no orbit is reported.
    pub fn from_elements(name: impl Into<String>, mass: SolarMass, elements: ElementSet) -> Self {
        BodyConfig {
            name: name.into(),
            mass,
            initial_state: InitialState::Elements(elements),
            primary: None,
        }
    }

    /// Set the primary of the body.
    pub fn orbiting(mut self, primary: impl Into<Primary>) -> Self {
        self.primary = Some(primary.into());
        self
    }
}

/// Flat JSON form of a [`BodyConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBodyConfig {
    #[serde(alias = "name")]
    pub hash: String,
    #[serde(alias = "mass", default)]
    pub m: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vz: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inc: Option<f64>,
    #[serde(rename = "Omega", default, skip_serializing_if = "Option::is_none")]
    pub node: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omega: Option<f64>,
    #[serde(rename = "T", default, skip_serializing_if = "Option::is_none")]
    pub pericenter_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<Primary>,
}

impl TryFrom<RawBodyConfig> for BodyConfig {
    type Error = SimulationError;

    /// Return
    /// ------
    /// * `Err(SimulationError::ConfigurationError)` unless exactly one of the Cartesian state
    ///   or the element set is complete and the other one is absent.
    fn try_from(raw: RawBodyConfig) -> Result<Self, Self::Error> {
        let cartesian = [raw.x, raw.y, raw.z, raw.vx, raw.vy, raw.vz];
        let elements = [
            raw.a,
            raw.e,
            raw.inc,
            raw.node,
            raw.omega,
            raw.pericenter_time,
        ];
        let n_cart = cartesian.iter().flatten().count();
        let n_elem = elements.iter().flatten().count();

        let initial_state = match (n_cart, n_elem) {
            (6, 0) => {
                let [x, y, z, vx, vy, vz] = cartesian.map(Option::unwrap_or_default);
                InitialState::Cartesian {
                    position: Vector3::new(x, y, z),
                    velocity: Vector3::new(vx, vy, vz),
                }
            }
            (0, 6) => {
                let [a, e, inc, node, omega, t] = elements.map(Option::unwrap_or_default);
                InitialState::Elements(ElementSet {
                    semi_major_axis: a,
                    eccentricity: e,
                    inclination: inc,
                    ascending_node: node,
                    periapsis_argument: omega,
                    pericenter_time: t,
                })
            }
            (0, 0) => {
                return Err(SimulationError::ConfigurationError(format!(
                    "body '{}' has neither a Cartesian state nor orbital elements",
                    raw.hash
                )))
            }
            (c, e) if c > 0 && e > 0 => {
                return Err(SimulationError::ConfigurationError(format!(
                    "body '{}' mixes Cartesian coordinates and orbital elements",
                    raw.hash
                )))
            }
            _ => {
                return Err(SimulationError::ConfigurationError(format!(
                    "body '{}' has an incomplete specification: expected all of x, y, z, vx, vy, vz \
                     or all of a, e, inc, Omega, omega, T",
                    raw.hash
                )))
            }
        };

        Ok(BodyConfig {
            name: raw.hash,
            mass: raw.m,
            initial_state,
            primary: raw.primary,
        })
    }
}

impl From<BodyConfig> for RawBodyConfig {
    fn from(body: BodyConfig) -> Self {
        let mut raw = RawBodyConfig {
            hash: body.name,
            m: body.mass,
            primary: body.primary,
            ..Default::default()
        };
        match body.initial_state {
            InitialState::Cartesian { position, velocity } => {
                raw.x = Some(position.x);
                raw.y = Some(position.y);
                raw.z = Some(position.z);
                raw.vx = Some(velocity.x);
                raw.vy = Some(velocity.y);
                raw.vz = Some(velocity.z);
            }
            InitialState::Elements(el) => {
                raw.a = Some(el.semi_major_axis);
                raw.e = Some(el.eccentricity);
                raw.inc = Some(el.inclination);
                raw.node = Some(el.ascending_node);
                raw.omega = Some(el.periapsis_argument);
                raw.pericenter_time = Some(el.pericenter_time);
            }
        }
        raw
    }
}

fn default_enable_gr() -> bool {
    true
}

/// Complete input of one run.
///
/// Fields
/// -----------------
/// * `r0` – reference distance (pc), serialized as `R0`.
/// * `start_time`, `end_time` – bounds of the observation window (years), `start_time < end_time`.
/// * `time_steps` – number of observation epochs (≥ 2), both bounds included.
/// * `enable_gr` – attach the 1PN correction (default `true`).
/// * `bodies` – bodies in declaration order; the order matters for primary resolution.
/// * `integrator` – IAS15 tuning, defaulted when absent.
///
/// The [`Default`] value is the S2 / Sgr A* system over 2000–2030 at R0 = 8.3 kpc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    #[serde(rename = "R0")]
    pub r0: f64,
    pub start_time: Year,
    pub end_time: Year,
    pub time_steps: usize,
    #[serde(default = "default_enable_gr")]
    pub enable_gr: bool,
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub integrator: IntegratorSettings,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            r0: 8.3e3,
            start_time: 2000.0,
            end_time: 2030.0,
            time_steps: 300,
            enable_gr: true,
            bodies: vec![
                BodyConfig::cartesian("Sgr A*", 4.2e6, Vector3::zeros(), Vector3::zeros()),
                BodyConfig::from_elements(
                    "S2",
                    0.0,
                    ElementSet {
                        semi_major_axis: 0.126,
                        eccentricity: 0.884,
                        inclination: 2.34,
                        ascending_node: 3.96,
                        periapsis_argument: 1.15,
                        pericenter_time: 2002.33,
                    },
                )
                .orbiting("Sgr A*"),
            ],
            integrator: IntegratorSettings::default(),
        }
    }
}

impl SimulationParameters {
    pub fn builder() -> SimulationParametersBuilder {
        SimulationParametersBuilder::new()
    }

    /// Parse parameters from a JSON string (no physical validation).
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load parameters from a JSON file (no physical validation).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Canonical JSON serialization, used as a memoization key.
    pub fn to_json(&self) -> Result<String, SimulationError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check the physical invariants of the parameter set.
    ///
    /// Return
    /// ------
    /// * `Err(SimulationError::InvalidParameter)` for out-of-range scalars: `R0 ≤ 0`,
    ///   `time_steps < 2`, non-finite or unordered time bounds, negative or non-finite masses,
    ///   invalid element sets or integrator settings.
    /// * `Err(SimulationError::ConfigurationError)` for duplicate names, a primary that is
    ///   not a previously declared body, a `"com"` primary with no body declared before it,
    ///   or a body whose orbit around its reference has no mass to define it
    ///   (`M_reference + m = 0`).
    pub fn validate(&self) -> Result<(), SimulationError> {
        InternalUnits::new(self.r0)?;

        if self.time_steps < 2 {
            return Err(SimulationError::InvalidParameter(format!(
                "time_steps must be at least 2, got {}",
                self.time_steps
            )));
        }
        if !self.start_time.is_finite() || !self.end_time.is_finite() {
            return Err(SimulationError::InvalidParameter(
                "start_time and end_time must be finite".into(),
            ));
        }
        if self.start_time >= self.end_time {
            return Err(SimulationError::InvalidParameter(format!(
                "start_time ({}) must be lower than end_time ({})",
                self.start_time, self.end_time
            )));
        }
        self.integrator.validate()?;

        if let Some(name) = self.bodies.iter().map(|b| b.name.as_str()).duplicates().next() {
            return Err(SimulationError::ConfigurationError(format!(
                "duplicate body name '{name}'"
            )));
        }

        // mass of every body declared so far, and their total
        let mut declared: AHashMap<&str, f64> = AHashMap::with_capacity(self.bodies.len());
        let mut earlier_mass = 0.0;
        for body in &self.bodies {
            if !(body.mass.is_finite() && body.mass >= 0.0) {
                return Err(SimulationError::InvalidParameter(format!(
                    "mass of '{}' must be finite and non-negative, got {}",
                    body.name, body.mass
                )));
            }
            match &body.initial_state {
                InitialState::Cartesian { position, velocity } => {
                    if position.iter().chain(velocity.iter()).any(|c| !c.is_finite()) {
                        return Err(SimulationError::InvalidParameter(format!(
                            "Cartesian state of '{}' must be finite",
                            body.name
                        )));
                    }
                }
                InitialState::Elements(elements) => elements.validate()?,
            }
            if let Some(Primary::Body(primary)) = &body.primary {
                if primary == &body.name {
                    return Err(SimulationError::ConfigurationError(format!(
                        "body '{primary}' cannot orbit itself"
                    )));
                }
            }
            let reference_mass = match (&body.primary, &body.initial_state) {
                (Some(Primary::Body(primary)), _) => {
                    Some(*declared.get(primary.as_str()).ok_or_else(|| {
                        SimulationError::ConfigurationError(format!(
                            "primary '{primary}' of '{}' is not a previously declared body",
                            body.name
                        ))
                    })?)
                }
                (Some(Primary::Barycenter), _) => {
                    if declared.is_empty() {
                        return Err(SimulationError::ConfigurationError(format!(
                            "'{}' orbits the barycenter of the previous bodies but is declared first",
                            body.name
                        )));
                    }
                    Some(earlier_mass)
                }
                // elements with no primary are seeded around the earlier barycenter
                (None, InitialState::Elements(_)) => Some(earlier_mass),
                (None, InitialState::Cartesian { .. }) => None,
            };
            if let Some(reference_mass) = reference_mass {
                if !(reference_mass + body.mass > 0.0) {
                    return Err(SimulationError::ConfigurationError(format!(
                        "orbit of '{}' is undefined: its reference and itself are massless",
                        body.name
                    )));
                }
            }
            declared.insert(&body.name, body.mass);
            earlier_mass += body.mass;
        }
        Ok(())
    }
}

/// Builder for [`SimulationParameters`], with validation.
///
/// Starts from the scalar defaults of [`SimulationParameters::default`] and an empty body list.
#[derive(Debug, Clone)]
pub struct SimulationParametersBuilder {
    params: SimulationParameters,
}

impl Default for SimulationParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationParametersBuilder {
    pub fn new() -> Self {
        Self {
            params: SimulationParameters {
                bodies: Vec::new(),
                ..SimulationParameters::default()
            },
        }
    }

    pub fn r0(mut self, v: f64) -> Self {
        self.params.r0 = v;
        self
    }
    pub fn start_time(mut self, v: Year) -> Self {
        self.params.start_time = v;
        self
    }
    pub fn end_time(mut self, v: Year) -> Self {
        self.params.end_time = v;
        self
    }
    pub fn time_steps(mut self, v: usize) -> Self {
        self.params.time_steps = v;
        self
    }
    pub fn enable_gr(mut self, v: bool) -> Self {
        self.params.enable_gr = v;
        self
    }
    pub fn integrator(mut self, v: IntegratorSettings) -> Self {
        self.params.integrator = v;
        self
    }

    /// Append a body (declaration order is kept).
    pub fn body(mut self, body: BodyConfig) -> Self {
        self.params.bodies.push(body);
        self
    }

    pub fn bodies(mut self, bodies: impl IntoIterator<Item = BodyConfig>) -> Self {
        self.params.bodies.extend(bodies);
        self
    }

    /// Validate and return the parameters.
    ///
    /// See [`SimulationParameters::validate`] for the checks performed.
    pub fn build(self) -> Result<SimulationParameters, SimulationError> {
        self.params.validate()?;
        Ok(self.params)
    }
}
