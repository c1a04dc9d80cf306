//! # IAS15: 15th-order Gauss–Radau integrator with adaptive step size
//!
//! Implicit predictor–corrector scheme of Everhart (1985) with the step-size control of
//! Rein & Spiegel (2015). The acceleration over one step is written as a polynomial in
//! the step fraction `τ ∈ [0, 1]`:
//!
//! ```text
//! a(τ) = a0 + b0·τ + b1·τ² + … + b6·τ⁷
//! ```
//!
//! The `b` coefficients are refined by evaluating the forces at the eight Gauss–Radau
//! nodes until the corrections stall (machine precision), then positions and velocities
//! are advanced by integrating the polynomial analytically. The size of `b6` relative to
//! the accelerations sets the next step (`dt ∝ (ε/err)^(1/7)`). Steps whose proposed
//! successor is more than `1/safety_factor` smaller are rejected and redone.
//!
//! Negative steps are supported, which is what the light-time correction needs when it
//! goes back from the observation epoch to the emission epoch.
use std::sync::LazyLock;

use log::warn;
use nalgebra::Vector3;

use crate::{
    nbody::{
        forces::{BodyView, ForceModel},
        simulation::IntegratorSettings,
    },
    sim_errors::SimulationError,
};

/// Gauss–Radau spacings on `[0, 1]`.
const RADAU_NODES: [f64; 8] = [
    0.0,
    0.056_262_560_536_922_146_465_652_191_031_8,
    0.180_240_691_736_892_364_987_579_942_780,
    0.352_624_717_113_169_637_373_907_769_648,
    0.547_153_626_330_555_383_001_448_554_766,
    0.734_210_177_215_410_531_523_210_605_558,
    0.885_320_946_839_095_768_090_359_771_030,
    0.977_520_613_561_287_501_891_174_488_626,
];

/// Ratio of successive step sizes above which the previous `b` is not extrapolated.
const MAX_PREDICTION_RATIO: f64 = 20.0;

/// Convergence threshold of the predictor–corrector loop.
const PC_TOLERANCE: f64 = 1e-16;

const MAX_REJECTIONS: usize = 64;

/// Conversion coefficients between the Newton (`g`) and power (`b`) forms of the
/// acceleration polynomial.
///
/// `newton_to_power[m][j]` is the coefficient of `τ^j` in `Π_{i=1..m} (τ − h_i)`, so that
/// `b_j = Σ_{m ≥ j} newton_to_power[m][j] · g_m`.
struct RadauCoefficients {
    newton_to_power: [[f64; 7]; 7],
}

static RADAU: LazyLock<RadauCoefficients> = LazyLock::new(|| {
    let mut newton_to_power = [[0.0; 7]; 7];
    for (m, row) in newton_to_power.iter_mut().enumerate() {
        let mut poly = vec![1.0];
        for h in &RADAU_NODES[1..=m] {
            let mut next = vec![0.0; poly.len() + 1];
            for (k, c) in poly.iter().enumerate() {
                next[k + 1] += c;
                next[k] -= h * c;
            }
            poly = next;
        }
        row[..poly.len()].copy_from_slice(&poly);
    }
    RadauCoefficients { newton_to_power }
});

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Outcome of one accepted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Step actually taken (may be smaller than requested after rejections).
    pub dt_done: f64,
    /// Step size proposed for the next step.
    pub dt_next: f64,
    /// Number of rejected attempts before acceptance.
    pub rejections: usize,
}

type Coeffs = [Vec<Vector3<f64>>; 7];

fn zeroed(n: usize) -> Coeffs {
    std::array::from_fn(|_| vec![Vector3::zeros(); n])
}

/// Integrator state carried between steps.
pub struct Ias15 {
    b: Coeffs,
    g: Coeffs,
    e: Coeffs,
    /// `b` of the last accepted step
    br: Coeffs,
    /// prediction `e` used for the last accepted step
    er: Coeffs,
    dt_last_done: f64,
    n: usize,
}

impl Default for Ias15 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ias15 {
    pub fn new() -> Self {
        Ias15 {
            b: zeroed(0),
            g: zeroed(0),
            e: zeroed(0),
            br: zeroed(0),
            er: zeroed(0),
            dt_last_done: 0.0,
            n: 0,
        }
    }

    /// Forget the step history (needed whenever bodies are added or states are edited).
    pub fn reset(&mut self) {
        self.n = 0;
        self.dt_last_done = 0.0;
    }

    fn ensure_size(&mut self, n: usize) {
        if self.n != n {
            self.b = zeroed(n);
            self.g = zeroed(n);
            self.e = zeroed(n);
            self.br = zeroed(n);
            self.er = zeroed(n);
            self.dt_last_done = 0.0;
            self.n = n;
        }
    }

    /// Extrapolate the `b` of the last accepted step to a step `ratio` times as long.
    fn predict_from_last_step(&mut self, ratio: f64) {
        if self.dt_last_done == 0.0 || ratio.abs() > MAX_PREDICTION_RATIO {
            for k in 0..7 {
                self.b[k].iter_mut().for_each(|c| *c = Vector3::zeros());
                self.e[k].iter_mut().for_each(|c| *c = Vector3::zeros());
            }
            return;
        }

        for j in 0..7 {
            let q = ratio.powi(j as i32 + 1);
            for i in 0..self.n {
                let mut shifted = Vector3::zeros();
                for k in j..7 {
                    shifted += self.br[k][i] * binomial(k + 1, j + 1);
                }
                let e = shifted * q;
                self.e[j][i] = e;
                self.b[j][i] = e + (self.br[j][i] - self.er[j][i]);
            }
        }
    }

    /// `g` from `b` by back substitution of the unit triangular conversion.
    fn g_from_b(&mut self) {
        let coeffs = &RADAU.newton_to_power;
        for j in (0..7).rev() {
            for i in 0..self.n {
                let mut g = self.b[j][i];
                for m in (j + 1)..7 {
                    g -= self.g[m][i] * coeffs[m][j];
                }
                self.g[j][i] = g;
            }
        }
    }

    /// Advance positions and velocities by one accepted step.
    ///
    /// Arguments
    /// ---------
    /// * `masses`, `positions`, `velocities` – system state, updated in place on success.
    /// * `forces` – accelerations model.
    /// * `dt` – requested step (may be negative).
    /// * `settings` – tolerance and step control parameters.
    ///
    /// Return
    /// ------
    /// * [`StepReport`] with the step taken and the proposal for the next one.
    /// * `Err(SimulationError::IntegrationFailure)` if the state or the accelerations become
    ///   non-finite or the step keeps being rejected.
    pub fn step(
        &mut self,
        masses: &[f64],
        positions: &mut [Vector3<f64>],
        velocities: &mut [Vector3<f64>],
        forces: &ForceModel,
        dt: f64,
        settings: &IntegratorSettings,
    ) -> Result<StepReport, SimulationError> {
        let n = masses.len();
        self.ensure_size(n);

        let x0: Vec<Vector3<f64>> = positions.to_vec();
        let v0: Vec<Vector3<f64>> = velocities.to_vec();
        let mut a0 = vec![Vector3::zeros(); n];
        forces.accelerations(
            &BodyView {
                masses,
                positions: &x0,
                velocities: &v0,
            },
            &mut a0,
        );
        if a0.iter().any(|a| !a.iter().all(|c| c.is_finite())) {
            return Err(SimulationError::IntegrationFailure(
                "non-finite accelerations (close encounter or collision)".into(),
            ));
        }

        let coeffs = &RADAU.newton_to_power;
        let predict_velocities = forces.velocity_dependent();
        let mut x = vec![Vector3::zeros(); n];
        let mut v = v0.clone();
        let mut at = vec![Vector3::zeros(); n];

        let mut dt = dt;
        let mut rejections = 0;
        loop {
            if dt == 0.0 || !dt.is_finite() {
                return Err(SimulationError::IntegrationFailure(format!(
                    "invalid time step {dt}"
                )));
            }

            let ratio = if self.dt_last_done != 0.0 {
                dt / self.dt_last_done
            } else {
                0.0
            };
            self.predict_from_last_step(ratio);
            self.g_from_b();

            let mut pc_error = f64::MAX;
            let mut pc_error_last = 2.0;
            let mut iterations = 0;
            loop {
                if pc_error < PC_TOLERANCE {
                    break;
                }
                // oscillating around machine precision
                if iterations > 2 && pc_error_last <= pc_error {
                    break;
                }
                if iterations >= settings.max_iterations {
                    warn!("IAS15 predictor-corrector did not converge in {iterations} iterations (error {pc_error:e})");
                    break;
                }
                pc_error_last = pc_error;
                iterations += 1;

                for node in 1..8 {
                    let h = RADAU_NODES[node];

                    // position polynomial at τ = h
                    let s0 = dt * h;
                    let s1 = s0 * s0 / 2.0;
                    let s2 = s1 * h / 3.0;
                    let s3 = s2 * h / 2.0;
                    let s4 = 3.0 * s3 * h / 5.0;
                    let s5 = 2.0 * s4 * h / 3.0;
                    let s6 = 5.0 * s5 * h / 7.0;
                    let s7 = 3.0 * s6 * h / 4.0;
                    let s8 = 7.0 * s7 * h / 9.0;

                    // velocity polynomial at τ = h
                    let u0 = dt * h;
                    let u1 = u0 * h / 2.0;
                    let u2 = 2.0 * u1 * h / 3.0;
                    let u3 = 3.0 * u2 * h / 4.0;
                    let u4 = 4.0 * u3 * h / 5.0;
                    let u5 = 5.0 * u4 * h / 6.0;
                    let u6 = 6.0 * u5 * h / 7.0;
                    let u7 = 7.0 * u6 * h / 8.0;

                    let b = &self.b;
                    for i in 0..n {
                        x[i] = x0[i]
                            + b[6][i] * s8
                            + b[5][i] * s7
                            + b[4][i] * s6
                            + b[3][i] * s5
                            + b[2][i] * s4
                            + b[1][i] * s3
                            + b[0][i] * s2
                            + a0[i] * s1
                            + v0[i] * s0;
                        if !predict_velocities {
                            continue;
                        }
                        v[i] = v0[i]
                            + b[6][i] * u7
                            + b[5][i] * u6
                            + b[4][i] * u5
                            + b[3][i] * u4
                            + b[2][i] * u3
                            + b[1][i] * u2
                            + b[0][i] * u1
                            + a0[i] * u0;
                    }

                    forces.accelerations(
                        &BodyView {
                            masses,
                            positions: &x,
                            velocities: &v,
                        },
                        &mut at,
                    );

                    let mut max_correction: f64 = 0.0;
                    let mut max_acceleration: f64 = 0.0;
                    for i in 0..n {
                        // divided differences give the new g_{node-1}
                        let mut val = (at[i] - a0[i]) / (h - RADAU_NODES[0]);
                        for j in 1..node {
                            val = (val - self.g[j - 1][i]) / (h - RADAU_NODES[j]);
                        }
                        let correction = val - self.g[node - 1][i];
                        self.g[node - 1][i] = val;

                        for j in 0..(node - 1) {
                            self.b[j][i] += correction * coeffs[node - 1][j];
                        }
                        self.b[node - 1][i] += correction;

                        if node == 7 {
                            max_correction = max_correction.max(correction.amax());
                            max_acceleration = max_acceleration.max(at[i].amax());
                        }
                    }

                    if node == 7 {
                        pc_error = if max_acceleration > 0.0 {
                            max_correction / max_acceleration
                        } else {
                            0.0
                        };
                    }
                }
            }

            if at.iter().any(|a| !a.iter().all(|c| c.is_finite())) {
                return Err(SimulationError::IntegrationFailure(
                    "non-finite accelerations during predictor-corrector iterations".into(),
                ));
            }

            // step size control
            let max_b6 = self.b[6].iter().map(|c| c.amax()).fold(0.0, f64::max);
            let max_a = at.iter().map(|c| c.amax()).fold(0.0, f64::max);
            let integrator_error = max_b6 / max_a;

            let dt_done = dt;
            let mut dt_new = if integrator_error.is_normal() {
                dt_done * (settings.epsilon / integrator_error).powf(1.0 / 7.0)
            } else {
                dt_done / settings.safety_factor
            };
            if dt_new.abs() < settings.min_dt {
                dt_new = settings.min_dt.copysign(dt_done);
            }

            if (dt_new / dt_done).abs() < settings.safety_factor {
                rejections += 1;
                if rejections > MAX_REJECTIONS {
                    return Err(SimulationError::IntegrationFailure(format!(
                        "step rejected {rejections} times (last proposal dt = {dt_new:e})"
                    )));
                }
                dt = dt_new;
                continue;
            }
            if (dt_new / dt_done).abs() > 1.0 / settings.safety_factor {
                dt_new = dt_done / settings.safety_factor;
            }

            let b = &self.b;
            for i in 0..n {
                positions[i] = x0[i]
                    + v0[i] * dt
                    + (a0[i] / 2.0
                        + b[0][i] / 6.0
                        + b[1][i] / 12.0
                        + b[2][i] / 20.0
                        + b[3][i] / 30.0
                        + b[4][i] / 42.0
                        + b[5][i] / 56.0
                        + b[6][i] / 72.0)
                        * (dt * dt);
                velocities[i] = v0[i]
                    + (a0[i]
                        + b[0][i] / 2.0
                        + b[1][i] / 3.0
                        + b[2][i] / 4.0
                        + b[3][i] / 5.0
                        + b[4][i] / 6.0
                        + b[5][i] / 7.0
                        + b[6][i] / 8.0)
                        * dt;
            }

            let finite = positions
                .iter()
                .chain(velocities.iter())
                .all(|c| c.iter().all(|x| x.is_finite()));
            if !finite {
                return Err(SimulationError::IntegrationFailure(
                    "non-finite body state after step".into(),
                ));
            }

            self.dt_last_done = dt_done;
            for k in 0..7 {
                self.br[k].copy_from_slice(&self.b[k]);
                self.er[k].copy_from_slice(&self.e[k]);
            }

            return Ok(StepReport {
                dt_done,
                dt_next: dt_new,
                rejections,
            });
        }
    }
}
