//! # Engine Module
//!
//! The stateful statistical-mechanics engine of the library.
//!
//! ## Overview
//!
//! An [`model::EnergyModel`] owns the per-instance energetics of a titratable system, the raw
//! and symmetrized interaction matrices and a private state vector. On top of it the engine
//! provides:
//!
//! - **Microstate energies** ([`microstate`]) in the folded and the unfolded reference
//!   environment
//! - **Partition functions** ([`partition`]) by exhaustive enumeration of the state space,
//!   stabilized by shifting every energy by the minimum before exponentiation
//! - **Occupation probabilities** derived from the Boltzmann factors in a second pass that
//!   walks the state space in the same order
//! - **Decoding** of the most probable instance of every site
//!
//! ## Supporting Modules
//!
//! - **Configuration** ([`config`]) - Titration and analysis settings with validation
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The engine error type
//!
//! With the `parallel` feature the enumeration is split into contiguous chunks of the state
//! space that are processed on the rayon thread pool.

pub mod config;
mod decode;
pub mod error;
pub mod microstate;
pub mod model;
pub mod partition;
mod probabilities;
pub mod progress;
pub(crate) mod utils;
