//! Uniform sampling of observation epochs.
use std::ops::Deref;

use crate::{constants::Year, sim_errors::SimulationError};

/// Ordered, evenly spaced observation epochs, both endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    epochs: Vec<Year>,
}

impl TimeGrid {
    /// Build `steps` epochs from `start` to `end` inclusive.
    ///
    /// The epochs are computed as `start + i·(end − start)/(steps − 1)` and the last one is
    /// pinned to `end`, so both endpoints are reproduced exactly.
    ///
    /// Return
    /// ------
    /// * `Err(SimulationError::InvalidParameter)` if `steps < 2`, a bound is not finite,
    ///   or `start >= end`.
    pub fn linspace(start: Year, end: Year, steps: usize) -> Result<Self, SimulationError> {
        if steps < 2 {
            return Err(SimulationError::InvalidParameter(format!(
                "time_steps must be at least 2, got {steps}"
            )));
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(SimulationError::InvalidParameter(
                "start_time and end_time must be finite".into(),
            ));
        }
        if start >= end {
            return Err(SimulationError::InvalidParameter(format!(
                "start_time ({start}) must be lower than end_time ({end})"
            )));
        }

        let step = (end - start) / (steps - 1) as f64;
        let mut epochs: Vec<Year> = (0..steps).map(|i| start + i as f64 * step).collect();
        epochs[steps - 1] = end;

        Ok(TimeGrid { epochs })
    }

    pub fn epochs(&self) -> &[Year] {
        &self.epochs
    }
}

impl Deref for TimeGrid {
    type Target = [Year];

    fn deref(&self) -> &Self::Target {
        &self.epochs
    }
}

#[cfg(test)]
mod time_grid_test {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        let grid = TimeGrid::linspace(2000.0, 2030.0, 300).unwrap();
        assert_eq!(grid.len(), 300);
        assert_eq!(grid[0], 2000.0);
        assert_eq!(grid[299], 2030.0);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_linspace_spacing() {
        let grid = TimeGrid::linspace(0.0, 1.0, 5).unwrap();
        assert_eq!(grid.epochs(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_linspace_invalid() {
        assert!(TimeGrid::linspace(0.0, 1.0, 1).is_err());
        assert!(TimeGrid::linspace(1.0, 1.0, 10).is_err());
        assert!(TimeGrid::linspace(2.0, 1.0, 10).is_err());
        assert!(TimeGrid::linspace(f64::NAN, 1.0, 10).is_err());
    }
}
