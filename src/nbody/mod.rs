//! Gravitational N-body machinery: bodies, force terms, the IAS15 integrator and the
//! [`Simulation`](simulation::Simulation) that ties them together.
pub mod forces;
pub mod ias15;
pub mod particle;
pub mod simulation;
