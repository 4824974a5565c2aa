//! # Protostate Core Library
//!
//! Exact statistical thermodynamics of multi-site titratable systems. Every site carries a
//! small set of candidate protonation or tautomer instances; the library enumerates all joint
//! assignments (microstates), scores them with a pairwise-interaction free energy model and
//! derives partition functions and per-instance occupation probabilities at a given pH.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Stateless data: the `Site`/`StateVector` odometer, the
//!   titratable-system definition, physical constants and the packed symmetric matrix.
//!
//! - **[`engine`]: The Logic Core.** The `EnergyModel` with its microstate energy functions,
//!   the partition-function kernel (`BoltzmannFactors`), probability derivation and decoding.
//!
//! - **[`workflows`]: The Public API.** Complete procedures such as computing a titration
//!   curve over a pH grid or analyzing a system at a single pH.

pub mod core;
pub mod engine;
pub mod workflows;
