//! Records and the run-level result returned to callers.
//!
//! Column names follow the tables of the dashboard: `t, t', x, y, z, vx, vy, vz, vrD` for
//! observations and `t, t', a, e, inc, Omega, omega, P` for orbits.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{Degree, KmPerSec, Year, ORBIT_REPORT_DECIMALS},
    orbit_elements::OsculatingElements,
    sim_errors::{ErrorKind, SimulationError},
};

/// What a distant observer records for one body at one epoch.
///
/// Positions and the sky-plane velocities `vx, vy` stay in internal units (arcsec,
/// arcsec/yr); `vz` and `vrD` are in km/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub t: Year,
    #[serde(rename = "t'")]
    pub t_emit: Year,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: KmPerSec,
    #[serde(rename = "vrD")]
    pub vr_doppler: KmPerSec,
}

/// Osculating orbit of one body relative to its primary, at the emission epoch `t'`.
///
/// Angles in degrees; all values rounded to [`ORBIT_REPORT_DECIMALS`] decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitRecord {
    pub t: Year,
    #[serde(rename = "t'")]
    pub t_emit: Year,
    pub a: f64,
    pub e: f64,
    pub inc: Degree,
    #[serde(rename = "Omega")]
    pub node: Degree,
    pub omega: Degree,
    #[serde(rename = "P")]
    pub period: Year,
}

fn round_report(value: f64) -> f64 {
    let scale = 10f64.powi(ORBIT_REPORT_DECIMALS);
    (value * scale).round() / scale
}

impl OrbitRecord {
    /// Reporting view of osculating elements observed at `t_obs`.
    pub fn new(t_obs: Year, elements: &OsculatingElements) -> Self {
        OrbitRecord {
            t: t_obs,
            t_emit: elements.reference_epoch,
            a: round_report(elements.semi_major_axis),
            e: round_report(elements.eccentricity),
            inc: round_report(elements.inclination.to_degrees()),
            node: round_report(elements.ascending_node.to_degrees()),
            omega: round_report(elements.periapsis_argument.to_degrees()),
            period: round_report(elements.period),
        }
    }
}

/// Per-body series of a successful run.
///
/// `order` keeps the declaration order of the bodies; the maps are keyed by body name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub order: Vec<String>,
    pub data: BTreeMap<String, Vec<ObservationRecord>>,
    pub orbits: BTreeMap<String, Vec<OrbitRecord>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

/// Outcome of one run, as handed to presentation code.
///
/// On failure `data`, `orbits` and `order` are empty and `message` explains the error;
/// `kind` carries its tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub status: Status,
    pub message: String,
    pub order: Vec<String>,
    pub data: BTreeMap<String, Vec<ObservationRecord>>,
    pub orbits: BTreeMap<String, Vec<OrbitRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl SimulationResult {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    pub fn failure(err: &SimulationError) -> Self {
        SimulationResult {
            status: Status::Failure,
            message: err.to_string(),
            order: Vec::new(),
            data: BTreeMap::new(),
            orbits: BTreeMap::new(),
            kind: Some(err.kind()),
        }
    }

    /// Observation series of `name`, if it was part of the run.
    pub fn observations(&self, name: &str) -> Option<&[ObservationRecord]> {
        self.data.get(name).map(Vec::as_slice)
    }

    /// Orbit series of `name`, if it has a primary.
    pub fn orbit(&self, name: &str) -> Option<&[OrbitRecord]> {
        self.orbits.get(name).map(Vec::as_slice)
    }
}

impl From<SimulationOutput> for SimulationResult {
    fn from(out: SimulationOutput) -> Self {
        let n_epochs = out.data.values().next().map_or(0, Vec::len);
        SimulationResult {
            status: Status::Success,
            message: format!(
                "simulated {} bodies over {} epochs",
                out.order.len(),
                n_epochs
            ),
            order: out.order,
            data: out.data,
            orbits: out.orbits,
            kind: None,
        }
    }
}

impl From<Result<SimulationOutput, SimulationError>> for SimulationResult {
    fn from(res: Result<SimulationOutput, SimulationError>) -> Self {
        match res {
            Ok(out) => out.into(),
            Err(err) => SimulationResult::failure(&err),
        }
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Status::Success => write!(f, "success: {}", self.message),
            Status::Failure => write!(f, "failure: {}", self.message),
        }
    }
}

#[cfg(test)]
mod result_test {
    use super::*;

    #[test]
    fn test_orbit_record_rounding() {
        let elements = OsculatingElements {
            reference_epoch: 2001.0,
            semi_major_axis: 0.125_999_999_7,
            eccentricity: 0.884_000_000_4,
            inclination: 2.34,
            ascending_node: 3.96,
            periapsis_argument: 1.15,
            true_anomaly: 0.0,
            mean_anomaly: 0.0,
            period: 16.052_345_678,
            pericenter_time: 2002.33,
        };
        let rec = OrbitRecord::new(2001.5, &elements);
        assert_eq!(rec.t, 2001.5);
        assert_eq!(rec.t_emit, 2001.0);
        assert_eq!(rec.a, 0.126);
        assert_eq!(rec.e, 0.884);
        assert_eq!(rec.inc, 134.072124);
        assert_eq!(rec.period, 16.052346);
    }

    #[test]
    fn test_failure_is_empty() {
        let err = SimulationError::ConfigurationError("primary 'X' not found".into());
        let res = SimulationResult::from(Err::<SimulationOutput, _>(err));
        assert!(!res.is_success());
        assert!(res.data.is_empty() && res.orbits.is_empty() && res.order.is_empty());
        assert!(res.message.contains("primary 'X' not found"));
        assert_eq!(res.error_kind(), Some(ErrorKind::ConfigurationError));
    }

    #[test]
    fn test_record_column_names() {
        let rec = ObservationRecord {
            t: 1.0,
            t_emit: 0.5,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            vr_doppler: 0.0,
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"t'\":0.5"));
        assert!(json.contains("\"vrD\""));
    }
}
