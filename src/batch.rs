//! Parallel execution of independent runs.
//!
//! Each run owns its own [`Simulation`](crate::nbody::simulation::Simulation), so distinct
//! parameter sets are integrated concurrently on the rayon thread pool.
use rayon::prelude::*;

use crate::{engine::run_simulation, params::SimulationParameters, result::SimulationResult};

/// Run every parameter set, in parallel; results come back in input order.
pub fn run_batch(params: &[SimulationParameters]) -> Vec<SimulationResult> {
    params.par_iter().map(run_simulation).collect()
}

#[cfg(test)]
mod batch_test {
    use super::*;

    #[test]
    fn test_batch_keeps_order() {
        let ok = SimulationParameters {
            end_time: 2000.5,
            time_steps: 3,
            ..SimulationParameters::default()
        };
        let broken = SimulationParameters {
            time_steps: 1,
            ..ok.clone()
        };

        let results = run_batch(&[ok.clone(), broken, ok]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[2].is_success());
        assert_eq!(results[0], results[2]);
    }
}
