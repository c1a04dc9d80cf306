use nalgebra::Vector3;

/// A point mass tracked by the integrator.
///
/// `hash` is the body name; it is the lookup key into the live simulation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub hash: String,
    pub mass: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl Particle {
    pub fn new(hash: impl Into<String>, mass: f64, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Particle {
            hash: hash.into(),
            mass,
            position,
            velocity,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|c| c.is_finite())
    }
}
