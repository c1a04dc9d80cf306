#![allow(dead_code)]
use approx::assert_relative_eq;
use nalgebra::Vector3;
use relorbit::{BodyConfig, ElementSet, ObservationRecord, OrbitRecord};

pub fn elements(
    a: f64,
    e: f64,
    inc: f64,
    node: f64,
    omega: f64,
    pericenter_time: f64,
) -> ElementSet {
    ElementSet {
        semi_major_axis: a,
        eccentricity: e,
        inclination: inc,
        ascending_node: node,
        periapsis_argument: omega,
        pericenter_time,
    }
}

/// Massive body at rest at the origin.
pub fn central_mass(name: &str, mass: f64) -> BodyConfig {
    BodyConfig::cartesian(name, mass, Vector3::zeros(), Vector3::zeros())
}

pub fn assert_observations_close(
    actual: &[ObservationRecord],
    expected: &[ObservationRecord],
    max_relative: f64,
) {
    assert_eq!(actual.len(), expected.len());
    for (a, b) in actual.iter().zip(expected) {
        assert_eq!(a.t, b.t);
        assert_relative_eq!(a.t_emit, b.t_emit, max_relative = max_relative);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-12, max_relative = max_relative);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-12, max_relative = max_relative);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-12, max_relative = max_relative);
        assert_relative_eq!(a.vx, b.vx, epsilon = 1e-12, max_relative = max_relative);
        assert_relative_eq!(a.vy, b.vy, epsilon = 1e-12, max_relative = max_relative);
        assert_relative_eq!(a.vz, b.vz, epsilon = 1e-9, max_relative = max_relative);
        assert_relative_eq!(
            a.vr_doppler,
            b.vr_doppler,
            epsilon = 1e-9,
            max_relative = max_relative
        );
    }
}

pub fn assert_orbits_close(actual: &[OrbitRecord], expected: &[OrbitRecord], epsilon: f64) {
    assert_eq!(actual.len(), expected.len());
    for (a, b) in actual.iter().zip(expected) {
        assert_eq!(a.t, b.t);
        assert_relative_eq!(a.a, b.a, epsilon = epsilon);
        assert_relative_eq!(a.e, b.e, epsilon = epsilon);
        assert_relative_eq!(a.inc, b.inc, epsilon = epsilon);
        assert_relative_eq!(a.node, b.node, epsilon = epsilon);
        assert_relative_eq!(a.omega, b.omega, epsilon = epsilon);
        assert_relative_eq!(a.period, b.period, epsilon = epsilon);
    }
}
