//! CSV export of per-body series.
//!
//! Observation tables have the columns `t, t', x, y, z, vx, vy, vz, vrD, date` and orbit
//! tables `t, t', a, e, inc, Omega, omega, P, date`, where `date` is the calendar epoch
//! (TT) of the observation time `t`.
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    result::{ObservationRecord, OrbitRecord, SimulationResult},
    sim_errors::SimulationError,
    time::decimal_year_to_epoch,
};

#[derive(Serialize)]
struct ObservationRow {
    t: f64,
    #[serde(rename = "t'")]
    t_emit: f64,
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    #[serde(rename = "vrD")]
    vr_doppler: f64,
    date: String,
}

impl From<&ObservationRecord> for ObservationRow {
    fn from(r: &ObservationRecord) -> Self {
        ObservationRow {
            t: r.t,
            t_emit: r.t_emit,
            x: r.x,
            y: r.y,
            z: r.z,
            vx: r.vx,
            vy: r.vy,
            vz: r.vz,
            vr_doppler: r.vr_doppler,
            date: decimal_year_to_epoch(r.t).to_string(),
        }
    }
}

#[derive(Serialize)]
struct OrbitRow {
    t: f64,
    #[serde(rename = "t'")]
    t_emit: f64,
    a: f64,
    e: f64,
    inc: f64,
    #[serde(rename = "Omega")]
    node: f64,
    omega: f64,
    #[serde(rename = "P")]
    period: f64,
    date: String,
}

impl From<&OrbitRecord> for OrbitRow {
    fn from(r: &OrbitRecord) -> Self {
        OrbitRow {
            t: r.t,
            t_emit: r.t_emit,
            a: r.a,
            e: r.e,
            inc: r.inc,
            node: r.node,
            omega: r.omega,
            period: r.period,
            date: decimal_year_to_epoch(r.t).to_string(),
        }
    }
}

/// Write an observation series as CSV (header included).
pub fn write_observations<W: Write>(
    writer: W,
    records: &[ObservationRecord],
) -> Result<(), SimulationError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(ObservationRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write an orbit series as CSV (header included).
pub fn write_orbits<W: Write>(writer: W, records: &[OrbitRecord]) -> Result<(), SimulationError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(OrbitRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// File-system safe version of a body name (`"Sgr A*"` → `"Sgr_A_"`).
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write `<body>.csv` (observations) and, when available, `<body>_orbit.csv` into `dir`.
///
/// Return
/// ------
/// * The paths written.
/// * `Err(SimulationError::InvalidParameter)` if the body is not part of the result.
pub fn export_body(
    result: &SimulationResult,
    name: &str,
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, SimulationError> {
    let observations = result.observations(name).ok_or_else(|| {
        SimulationError::InvalidParameter(format!("no body named '{name}' in the result"))
    })?;

    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let stem = file_stem(name);
    let mut written = Vec::with_capacity(2);

    let path = dir.join(format!("{stem}.csv"));
    write_observations(fs::File::create(&path)?, observations)?;
    written.push(path);

    if let Some(orbit) = result.orbit(name) {
        let path = dir.join(format!("{stem}_orbit.csv"));
        write_orbits(fs::File::create(&path)?, orbit)?;
        written.push(path);
    }
    Ok(written)
}

/// Export every body of a result, in declaration order.
pub fn export_all(
    result: &SimulationResult,
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, SimulationError> {
    let mut written = Vec::new();
    for name in &result.order {
        written.extend(export_body(result, name, dir.as_ref())?);
    }
    Ok(written)
}
