//! Data models describing titratable sites and the microstate space they span.
//!
//! A [`site::Site`] owns a contiguous block of global instance indices, a
//! [`state_vector::StateVector`] is the ordered sequence of sites acting as a mixed-radix
//! odometer, and [`system::TitratableSystem`] is the user-facing definition from which an
//! energy model is built.

pub mod site;
pub mod state_vector;
pub mod system;
