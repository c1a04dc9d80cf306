//! # relorbit
//!
//! Relativistic N-body simulation of stellar orbits around a massive compact object, as
//! seen by a distant observer.
//!
//! A run integrates the system with a 15th-order Gauss–Radau integrator (IAS15) including
//! the first post-Newtonian correction, corrects every observation epoch for the light
//! travel time along the line of sight (Roemer delay), and reports positions, velocities,
//! relativistic Doppler velocities and osculating orbital elements at the emission epoch.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use relorbit::{run_simulation, SimulationParameters};
//!
//! // S2 around Sgr A*, 2000-2030
//! let params = SimulationParameters::default();
//! let result = run_simulation(&params);
//! assert!(result.is_success());
//! let s2 = result.orbit("S2").unwrap();
//! println!("a = {} arcsec, e = {}", s2[0].a, s2[0].e);
//! ```
//!
//! ## Modules
//!
//! - [`params`] – typed input, JSON layout, builder and validation.
//! - [`engine`] – the run itself ([`run_simulation`], [`try_run_simulation`]).
//! - [`observation`] – light-time correction and Doppler shift.
//! - [`nbody`] – bodies, force terms, IAS15, live simulation.
//! - [`cache`], [`batch`], [`export`] – memoization, parallel runs and CSV tables.
pub mod batch;
pub mod cache;
pub mod constants;
pub mod engine;
pub mod export;
mod kepler;
pub mod nbody;
pub mod observation;
pub mod orbit_elements;
pub mod params;
pub mod result;
pub mod sim_errors;
pub mod time;
pub mod time_grid;
pub mod units;

pub use batch::run_batch;
pub use cache::SimulationCache;
pub use engine::{configure_simulation, run_simulation, try_run_simulation};
pub use nbody::simulation::IntegratorSettings;
pub use orbit_elements::{ElementSet, OsculatingElements};
pub use params::{BodyConfig, InitialState, Primary, SimulationParameters};
pub use result::{ObservationRecord, OrbitRecord, SimulationOutput, SimulationResult, Status};
pub use sim_errors::{ErrorKind, SimulationError};
pub use units::InternalUnits;
