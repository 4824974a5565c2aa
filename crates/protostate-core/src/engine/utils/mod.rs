//! Helpers shared by the engine internals.

pub(crate) mod alloc;
