use nalgebra::Vector3;
use relorbit::{
    run_simulation, try_run_simulation, BodyConfig, ErrorKind, IntegratorSettings, Primary,
    SimulationParameters,
};

mod common;
use common::{assert_observations_close, assert_orbits_close, central_mass, elements};

fn short_default() -> SimulationParameters {
    SimulationParameters {
        end_time: 2010.0,
        time_steps: 50,
        ..SimulationParameters::default()
    }
}

#[test]
fn test_runs_are_deterministic() {
    let params = short_default();
    let first = run_simulation(&params);
    let second = run_simulation(&params);
    assert!(first.is_success(), "{}", first.message);

    for name in ["Sgr A*", "S2"] {
        assert_observations_close(
            first.observations(name).unwrap(),
            second.observations(name).unwrap(),
            1e-9,
        );
    }
    assert_orbits_close(first.orbit("S2").unwrap(), second.orbit("S2").unwrap(), 1e-9);
}

#[test]
fn test_observed_times_match_grid() {
    let params = short_default();
    let result = run_simulation(&params);
    assert!(result.is_success());

    let step = (params.end_time - params.start_time) / (params.time_steps - 1) as f64;
    for name in &result.order {
        let series = result.observations(name).unwrap();
        assert_eq!(series.len(), params.time_steps);
        assert_eq!(series[0].t, params.start_time);
        assert_eq!(series[params.time_steps - 1].t, params.end_time);
        for (i, rec) in series.iter().enumerate().take(params.time_steps - 1) {
            assert_eq!(rec.t, params.start_time + i as f64 * step);
        }
    }
    let orbit = result.orbit("S2").unwrap();
    assert_eq!(orbit.len(), params.time_steps);
    assert!(orbit
        .iter()
        .zip(result.observations("S2").unwrap())
        .all(|(o, d)| o.t == d.t && o.t_emit == d.t_emit));
}

#[test]
fn test_body_without_primary_has_no_orbit() {
    let params = SimulationParameters::builder()
        .r0(8.3e3)
        .start_time(2000.0)
        .end_time(2004.0)
        .time_steps(5)
        .body(central_mass("Sgr A*", 4.2e6))
        .body(BodyConfig::from_elements(
            "S2",
            0.0,
            elements(0.126, 0.884, 2.34, 3.96, 1.15, 2002.33),
        ))
        .body(BodyConfig::cartesian(
            "probe",
            0.0,
            Vector3::new(0.3, 0.0, 0.0),
            Vector3::zeros(),
        ))
        .build()
        .unwrap();

    let result = run_simulation(&params);
    assert!(result.is_success(), "{}", result.message);
    assert_eq!(result.order, vec!["Sgr A*", "S2", "probe"]);
    assert_eq!(result.data.len(), 3);
    assert!(result.orbits.is_empty());
}

#[test]
fn test_unknown_primary_is_contained() {
    let mut params = short_default();
    params.bodies[1].primary = Some(Primary::Body("Sgr B2".into()));

    let result = run_simulation(&params);
    assert!(!result.is_success());
    assert!(!result.message.is_empty());
    assert!(result.message.contains("Sgr B2"));
    assert!(result.data.is_empty());
    assert!(result.orbits.is_empty());
    assert_eq!(result.error_kind(), Some(ErrorKind::ConfigurationError));
}

#[test]
fn test_invalid_scalars_are_contained() {
    let params = SimulationParameters {
        r0: 0.0,
        ..short_default()
    };
    let result = run_simulation(&params);
    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ErrorKind::InvalidParameter));

    let params = SimulationParameters {
        time_steps: 1,
        ..short_default()
    };
    assert_eq!(
        run_simulation(&params).error_kind(),
        Some(ErrorKind::InvalidParameter)
    );
}

#[test]
fn test_step_limit_is_integration_failure() {
    // S2 cannot cross its pericenter passage in ten steps
    let params = SimulationParameters {
        end_time: 2010.0,
        time_steps: 2,
        integrator: IntegratorSettings::builder().max_steps(10).build().unwrap(),
        ..SimulationParameters::default()
    };

    let err = try_run_simulation(&params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IntegrationFailure);

    let result = run_simulation(&params);
    assert!(!result.is_success());
    assert!(result.data.is_empty());
    assert!(result.orbits.is_empty());
    assert_eq!(result.error_kind(), Some(ErrorKind::IntegrationFailure));
}

#[test]
fn test_doppler_sign_follows_line_of_sight() {
    // massless probes far from a unit mass, drifting along the line of sight
    let build = |vz: f64| {
        SimulationParameters::builder()
            .r0(1.0)
            .start_time(0.0)
            .end_time(1.0)
            .time_steps(3)
            .body(central_mass("anchor", 1.0))
            .body(BodyConfig::cartesian(
                "probe",
                0.0,
                Vector3::new(1000.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, vz),
            ))
            .build()
            .unwrap()
    };

    let receding = run_simulation(&build(100.0));
    assert!(receding.is_success(), "{}", receding.message);
    assert!(receding
        .observations("probe")
        .unwrap()
        .iter()
        .all(|r| r.vr_doppler > 0.0 && r.vz > 0.0));

    let approaching = run_simulation(&build(-100.0));
    assert!(approaching
        .observations("probe")
        .unwrap()
        .iter()
        .all(|r| r.vr_doppler < 0.0 && r.vz < 0.0));
}

#[test]
fn test_roemer_delay_direction() {
    // a probe behind the centre (z > 0) is seen with an earlier emission time
    let params = SimulationParameters::builder()
        .r0(1.0)
        .start_time(0.0)
        .end_time(1.0)
        .time_steps(2)
        .body(central_mass("anchor", 1.0))
        .body(BodyConfig::cartesian(
            "behind",
            0.0,
            Vector3::new(0.0, 1000.0, 1000.0),
            Vector3::zeros(),
        ))
        .body(BodyConfig::cartesian(
            "front",
            0.0,
            Vector3::new(0.0, -1000.0, -1000.0),
            Vector3::zeros(),
        ))
        .build()
        .unwrap();

    let result = run_simulation(&params);
    assert!(result.is_success(), "{}", result.message);
    for rec in result.observations("behind").unwrap() {
        assert!(rec.t_emit < rec.t);
    }
    for rec in result.observations("front").unwrap() {
        assert!(rec.t_emit > rec.t);
    }
    // the rotated sky-plane convention: x = −y_int, y = x_int
    let first = result.observations("behind").unwrap()[0];
    assert!(first.x < -999.0 && first.y.abs() < 1e-6);
}

#[test]
fn test_json_file_run() {
    let params = SimulationParameters::from_path("tests/data/s2_sgra.json").unwrap();
    assert_eq!(params.bodies.len(), 4);
    assert_eq!(params.bodies[2].primary, Some(Primary::Barycenter));

    let result = run_simulation(&params);
    assert!(result.is_success(), "{}", result.message);
    assert_eq!(result.order, vec!["Sgr A*", "S2", "S38", "probe"]);
    assert!(result.orbit("S2").is_some());
    assert!(result.orbit("S38").is_some());
    assert!(result.orbit("probe").is_none());
    assert!(result.orbit("Sgr A*").is_none());

    // 1PN terms shift the osculating a by up to ~1% near pericenter
    let s2 = result.orbit("S2").unwrap();
    for rec in s2 {
        assert!((rec.a - 0.126).abs() < 2e-3, "a = {}", rec.a);
        assert!((rec.e - 0.884).abs() < 2e-3, "e = {}", rec.e);
        assert!((rec.inc - 2.34_f64.to_degrees()).abs() < 0.1);
    }

    // Newtonian run of the same file keeps the seeded elements
    let newtonian = SimulationParameters {
        enable_gr: false,
        ..params
    };
    let result = run_simulation(&newtonian);
    assert!(result.is_success(), "{}", result.message);
    for rec in result.orbit("S2").unwrap() {
        assert!((rec.a - 0.126).abs() < 1e-5, "a = {}", rec.a);
        assert!((rec.e - 0.884).abs() < 1e-5, "e = {}", rec.e);
        assert!((rec.inc - 2.34_f64.to_degrees()).abs() < 1e-4);
    }
}

#[test]
fn test_first_body_cannot_orbit_barycenter() {
    let mut params = short_default();
    params.bodies[0].primary = Some(Primary::Barycenter);

    let result = run_simulation(&params);
    assert!(!result.is_success());
    assert!(result.message.contains("Sgr A*"), "{}", result.message);
    assert_eq!(result.error_kind(), Some(ErrorKind::ConfigurationError));
}

#[test]
fn test_massless_primary_is_rejected() {
    let params = SimulationParameters {
        bodies: vec![
            central_mass("Sgr A*", 4.2e6),
            BodyConfig::cartesian("dust", 0.0, Vector3::new(0.2, 0.0, 0.0), Vector3::zeros()),
            BodyConfig::from_elements("grain", 0.0, elements(0.01, 0.1, 0.0, 0.0, 0.0, 2000.0))
                .orbiting("dust"),
        ],
        ..short_default()
    };

    let result = run_simulation(&params);
    assert!(!result.is_success());
    assert!(result.message.contains("grain"), "{}", result.message);
    assert!(result.data.is_empty());
    assert_eq!(result.error_kind(), Some(ErrorKind::ConfigurationError));
}

#[test]
fn test_collision_is_integration_failure() {
    // two massive bodies at the same place: the pairwise acceleration is not finite
    let params = SimulationParameters::builder()
        .r0(8.3e3)
        .start_time(2000.0)
        .end_time(2001.0)
        .time_steps(3)
        .body(central_mass("A", 1.0e6))
        .body(central_mass("B", 1.0e6))
        .build()
        .unwrap();

    let err = try_run_simulation(&params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IntegrationFailure);

    let result = run_simulation(&params);
    assert!(!result.is_success());
    assert!(!result.message.is_empty());
    assert!(result.data.is_empty());
    assert!(result.orbits.is_empty());
    assert!(result.order.is_empty());
    assert_eq!(result.error_kind(), Some(ErrorKind::IntegrationFailure));
}
