use approx::assert_abs_diff_eq;
use nalgebra::Vector3;
use relorbit::{configure_simulation, BodyConfig, Primary, SimulationParameters};

mod common;
use common::elements;

#[test]
fn test_default_system_is_barycentric() {
    let sim = configure_simulation(&SimulationParameters::default()).unwrap();
    let com = sim.center_of_mass(0..sim.len());
    assert_eq!(sim.len(), 2);
    assert_abs_diff_eq!(com.position, Vector3::zeros(), epsilon = 1e-12);
    assert_abs_diff_eq!(com.velocity, Vector3::zeros(), epsilon = 1e-12);
    assert_eq!(sim.time(), 2000.0);
}

#[test]
fn test_massive_binary_is_barycentric() {
    let params = SimulationParameters::builder()
        .r0(8.0e3)
        .body(BodyConfig::cartesian(
            "A",
            3.0e6,
            Vector3::new(0.01, -0.02, 0.005),
            Vector3::new(0.1, 0.0, -0.05),
        ))
        .body(
            BodyConfig::from_elements("B", 1.0e6, elements(0.05, 0.3, 0.7, 1.2, 2.5, 2001.0))
                .orbiting("A"),
        )
        .body(
            BodyConfig::from_elements("C", 2.0e4, elements(0.3, 0.1, 0.2, 0.0, 1.0, 1999.0))
                .orbiting(Primary::Barycenter),
        )
        .build()
        .unwrap();

    let sim = configure_simulation(&params).unwrap();
    let com = sim.center_of_mass(0..sim.len());
    assert_abs_diff_eq!(com.mass, 4.02e6, epsilon = 1e-6);
    assert_abs_diff_eq!(com.position, Vector3::zeros(), epsilon = 1e-12);
    assert_abs_diff_eq!(com.velocity, Vector3::zeros(), epsilon = 1e-12);

    // seeding relative to the primary is preserved by the frame shift
    let (a, b) = (sim.particle(0), sim.particle(1));
    let separation = (b.position - a.position).norm();
    assert!(separation > 0.05 * 0.7 - 1e-9 && separation < 0.05 * 1.3 + 1e-9);
}
