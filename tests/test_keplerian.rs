use approx::assert_relative_eq;
use relorbit::{run_simulation, BodyConfig, InternalUnits, SimulationParameters};

mod common;
use common::{central_mass, elements};

/// Unit-mass primary and a massless companion on a circular orbit of radius 1.
fn circular_two_body() -> SimulationParameters {
    SimulationParameters::builder()
        .r0(1.0)
        .start_time(0.0)
        .end_time(5.0)
        .time_steps(51)
        .enable_gr(false)
        .body(central_mass("star", 1.0))
        .body(BodyConfig::from_elements("planet", 0.0, elements(1.0, 0.0, 0.0, 0.0, 0.0, 0.0)).orbiting("star"))
        .build()
        .unwrap()
}

#[test]
fn test_circular_orbit_elements_are_constant() {
    let params = circular_two_body();
    let result = run_simulation(&params);
    assert!(result.is_success(), "{}", result.message);

    let units = InternalUnits::new(params.r0).unwrap();
    let analytic_period = std::f64::consts::TAU * (1.0 / units.gravitational_constant).sqrt();

    let orbit = result.orbit("planet").unwrap();
    assert_eq!(orbit.len(), 51);
    for rec in orbit {
        assert_relative_eq!(rec.a, 1.0, epsilon = 1e-4);
        assert!(rec.e.abs() < 1e-4, "e = {}", rec.e);
        assert_relative_eq!(rec.inc, 0.0, epsilon = 1e-4);
        assert_relative_eq!(rec.period, analytic_period, max_relative = 1e-2);
    }
}

#[test]
fn test_circular_orbit_positions() {
    let result = run_simulation(&circular_two_body());
    let series = result.observations("planet").unwrap();

    for rec in series {
        // in-plane orbit: no light-time correction
        assert_eq!(rec.t_emit, rec.t);
        assert_relative_eq!((rec.x * rec.x + rec.y * rec.y).sqrt(), 1.0, epsilon = 1e-8);
        assert_eq!(rec.z, 0.0);
        assert_eq!(rec.vz, 0.0);
        // transverse motion only: the Doppler shift is the (positive) time dilation term
        assert!(rec.vr_doppler > 0.0);
    }

    // the star does not move
    for rec in result.observations("star").unwrap() {
        assert_eq!(rec.x, 0.0);
        assert_eq!(rec.y, 0.0);
    }
}
