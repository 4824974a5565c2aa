//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Microstate Representation** ([`models`]) - Sites, the mixed-radix `StateVector` and the
//!   titratable-system definition loaded from TOML
//! - **Numerics** ([`linalg`]) - Packed symmetric storage for the production interaction matrix
//! - **Units** ([`units`]) - Gas constant and the Nernstian pH factor
//!
//! All energies are expressed in kJ/mol and temperatures in Kelvin.

pub mod linalg;
pub mod models;
pub mod units;
