//! Numeric storage used by the energy model.

pub mod symmetric;
