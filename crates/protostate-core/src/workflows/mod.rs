//! # Workflows Module
//!
//! High-level procedures that take a [`TitratableSystem`](crate::core::models::system::TitratableSystem)
//! from definition to results.
//!
//! - **Titration** ([`titrate`]) - Protonation of every site and the ensemble free energies over
//!   a grid of pH values, in the folded environment, the unfolded one, or both.
//! - **Analysis** ([`analyze`]) - Instance probabilities, the most probable state and the
//!   partition functions of a system at a single pH.
//!
//! Both workflows build a fresh [`EnergyModel`](crate::engine::model::EnergyModel), report
//! progress through a [`ProgressReporter`](crate::engine::progress::ProgressReporter) and
//! return plain result structs that callers may serialize as they see fit.

pub mod analyze;
pub mod titrate;
