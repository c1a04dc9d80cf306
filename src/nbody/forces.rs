//! Acceleration contributors for the N-body integrator
//!
//! Each term implements [`Acceleration`] and adds its contribution into a shared
//! output buffer; [`ForceModel`] sums the terms attached to a simulation.
//! Available terms: direct Newtonian gravity and the first post-Newtonian
//! (Einstein–Infeld–Hoffmann) correction.
use log::warn;
use nalgebra::Vector3;

/// Read-only view of the system state seen by the force terms.
///
/// The integrator evaluates forces on predicted states, so this view borrows plain
/// slices rather than [`Particle`](crate::nbody::particle::Particle)s.
pub struct BodyView<'a> {
    pub masses: &'a [f64],
    pub positions: &'a [Vector3<f64>],
    pub velocities: &'a [Vector3<f64>],
}

impl BodyView<'_> {
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }
}

/// Trait for acceleration sources operating on a [`BodyView`].
/// Implementations add their contribution into `out[i]` for each body.
pub trait Acceleration {
    fn accumulate(&self, bodies: &BodyView<'_>, out: &mut [Vector3<f64>]);

    /// Whether the term reads velocities (the integrator then predicts them at substeps).
    fn velocity_dependent(&self) -> bool {
        false
    }
}

/// Collection of acceleration terms whose contributions are summed per body.
pub struct ForceModel {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl Default for ForceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceModel {
    /// Create an empty force model
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add a term (builder style)
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.push(term);
        self
    }

    pub fn push<T>(&mut self, term: T)
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn velocity_dependent(&self) -> bool {
        self.terms.iter().any(|t| t.velocity_dependent())
    }

    /// Total accelerations for all bodies; `out` is overwritten.
    pub fn accelerations(&self, bodies: &BodyView<'_>, out: &mut [Vector3<f64>]) {
        out.iter_mut().for_each(|a| *a = Vector3::zeros());
        for term in &self.terms {
            term.accumulate(bodies, out);
        }
    }
}

/// Direct-summation Newtonian gravity, no softening.
pub struct NewtonianGravity {
    pub gravitational_constant: f64,
}

impl Acceleration for NewtonianGravity {
    fn accumulate(&self, bodies: &BodyView<'_>, out: &mut [Vector3<f64>]) {
        let n = bodies.len();
        // each unordered pair once
        for i in 0..n {
            for j in (i + 1)..n {
                let dr = bodies.positions[j] - bodies.positions[i];
                let r2 = dr.norm_squared();
                let inv_r3 = 1.0 / (r2 * r2.sqrt());
                let f = dr * (self.gravitational_constant * inv_r3);
                out[i] += f * bodies.masses[j];
                out[j] -= f * bodies.masses[i];
            }
        }
    }
}

/// First post-Newtonian correction for all pairs (Einstein–Infeld–Hoffmann equations,
/// PPN β = γ = 1).
///
/// Only the correction is added; pair it with [`NewtonianGravity`]. The terms involving the
/// accelerations of the other bodies are solved by fixed-point iteration, starting from
/// the Newtonian accelerations.
///
/// ```text
/// a_i += Σ_j μ_j (r_j − r_i)/r_ij³ · [ −4Φ_i/c² − Φ_j/c² + v_i²/c² + 2v_j²/c² − 4 v_i·v_j/c²
///                                       − 3/(2c²) ((r_i − r_j)·v_j / r_ij)² + (r_j − r_i)·a_j/(2c²) ]
///      + Σ_j μ_j/(c² r_ij³) [(r_i − r_j)·(4v_i − 3v_j)] (v_i − v_j)
///      + 7/(2c²) Σ_j μ_j a_j / r_ij
/// ```
/// with `Φ_i = Σ_{k≠i} μ_k / r_ik`.
pub struct PostNewtonian {
    pub gravitational_constant: f64,
    pub speed_of_light: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl PostNewtonian {
    pub fn new(gravitational_constant: f64, speed_of_light: f64) -> Self {
        PostNewtonian {
            gravitational_constant,
            speed_of_light,
            max_iterations: 10,
            tolerance: 1e-16,
        }
    }
}

impl Acceleration for PostNewtonian {
    fn accumulate(&self, bodies: &BodyView<'_>, out: &mut [Vector3<f64>]) {
        let n = bodies.len();
        if n < 2 {
            return;
        }
        let c2 = self.speed_of_light * self.speed_of_light;
        let mu: Vec<f64> = bodies
            .masses
            .iter()
            .map(|m| m * self.gravitational_constant)
            .collect();
        let (r, v) = (bodies.positions, bodies.velocities);

        // Newtonian accelerations and potentials
        let mut a_newton = vec![Vector3::zeros(); n];
        let mut potential = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dr = r[j] - r[i];
                let d = dr.norm();
                a_newton[i] += dr * (mu[j] / (d * d * d));
                potential[i] += mu[j] / d;
            }
        }

        // terms that do not depend on the accelerations
        let mut a_fixed = vec![Vector3::zeros(); n];
        for i in 0..n {
            let vi2 = v[i].norm_squared();
            for j in 0..n {
                if i == j || mu[j] == 0.0 {
                    continue;
                }
                let rij = r[i] - r[j];
                let d = rij.norm();
                let d3 = d * d * d;
                let radial_vj = rij.dot(&v[j]) / d;

                let bracket = -4.0 * potential[i] - potential[j]
                    + vi2
                    + 2.0 * v[j].norm_squared()
                    - 4.0 * v[i].dot(&v[j])
                    - 1.5 * radial_vj * radial_vj;

                a_fixed[i] -= rij * (mu[j] / d3 * bracket / c2);
                a_fixed[i] +=
                    (v[i] - v[j]) * (mu[j] / (d3 * c2) * rij.dot(&(4.0 * v[i] - 3.0 * v[j])));
            }
        }

        // fixed point on the acceleration-dependent terms
        let mut a_pn = a_fixed.clone();
        let mut converged = false;
        for _ in 0..self.max_iterations {
            let previous = a_pn.clone();
            for i in 0..n {
                let mut acc = a_fixed[i];
                for j in 0..n {
                    if i == j || mu[j] == 0.0 {
                        continue;
                    }
                    let rji = r[j] - r[i];
                    let d = rji.norm();
                    let a_j = a_newton[j] + previous[j];
                    acc += rji * (mu[j] / (d * d * d) * 0.5 * rji.dot(&a_j) / c2);
                    acc += a_j * (3.5 * mu[j] / (d * c2));
                }
                a_pn[i] = acc;
            }

            let change = a_pn
                .iter()
                .zip(&previous)
                .map(|(a, b)| (a - b).amax())
                .fold(0.0, f64::max);
            let scale = a_pn.iter().map(|a| a.amax()).fold(0.0, f64::max);
            if change <= self.tolerance * scale {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!(
                "post-Newtonian accelerations did not converge in {} iterations",
                self.max_iterations
            );
        }

        for (o, a) in out.iter_mut().zip(&a_pn) {
            *o += a;
        }
    }

    fn velocity_dependent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod forces_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_newtonian_pair_is_antisymmetric() {
        let masses = [3.0, 1.0];
        let positions = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)];
        let velocities = [Vector3::zeros(); 2];
        let view = BodyView {
            masses: &masses,
            positions: &positions,
            velocities: &velocities,
        };
        let model = ForceModel::new().with(NewtonianGravity {
            gravitational_constant: 1.0,
        });
        let mut out = vec![Vector3::zeros(); 2];
        model.accelerations(&view, &mut out);

        assert_relative_eq!(out[0], Vector3::new(0.25, 0.0, 0.0));
        assert_relative_eq!(out[1], Vector3::new(-0.75, 0.0, 0.0));
        // momentum conservation
        assert_relative_eq!(out[0] * masses[0] + out[1] * masses[1], Vector3::zeros());
        assert!(!model.velocity_dependent());
    }

    #[test]
    fn test_post_newtonian_test_particle_limit() {
        // massless body around a unit mass at rest: the correction reduces to the
        // Schwarzschild (harmonic gauge) expression μ/(c²r³)[(4μ/r − v²) r + 4 (r·v) v]
        let (g, c) = (1.0, 50.0);
        let masses = [1.0, 0.0];
        let positions = [Vector3::zeros(), Vector3::new(1.0, 0.2, -0.1)];
        let velocities = [Vector3::zeros(), Vector3::new(0.1, 0.9, 0.05)];
        let view = BodyView {
            masses: &masses,
            positions: &positions,
            velocities: &velocities,
        };

        let mut out = vec![Vector3::zeros(); 2];
        PostNewtonian::new(g, c).accumulate(&view, &mut out);

        let (rv, vv) = (positions[1], velocities[1]);
        let d = rv.norm();
        let expected = (rv * (4.0 / d - vv.norm_squared()) + vv * (4.0 * rv.dot(&vv)))
            / (c * c * d.powi(3));

        assert_relative_eq!(out[1], expected, max_relative = 1e-12);
        assert_relative_eq!(out[0], Vector3::zeros());
    }
}
