use super::config::ConfigError;
use crate::core::models::state_vector::StateVectorError;
use crate::core::models::system::SystemLoadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to allocate {what} ({requested} elements)")]
    Allocation {
        what: &'static str,
        requested: usize,
    },

    #[error("The number of microstates does not fit in memory addressing")]
    StateSpaceOverflow,

    #[error(
        "State vector does not conform to the model topology (model has {expected} sites, vector has {found})"
    )]
    NonConformable { expected: usize, found: usize },

    #[error("Boltzmann factor buffer holds {found} slots but the model has {expected} microstates")]
    BufferSizeMismatch { expected: usize, found: usize },

    #[error("Instance index {index} is out of range for a model of {n_instances} instances")]
    InstanceOutOfRange { index: usize, n_instances: usize },

    #[error("Site index {index} is out of range for a model of {n_sites} sites")]
    SiteOutOfRange { index: usize, n_sites: usize },

    #[error("Invalid state vector: {source}")]
    StateVector {
        #[from]
        source: StateVectorError,
    },

    #[error("Failed to load titratable system: {source}")]
    System {
        #[from]
        source: SystemLoadError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

impl EngineError {
    /// True for failures that stem from memory limits rather than from invalid input.
    pub fn is_allocation(&self) -> bool {
        matches!(
            self,
            EngineError::Allocation { .. }
                | EngineError::StateSpaceOverflow
                | EngineError::StateVector {
                    source: StateVectorError::Allocation { .. }
                }
        )
    }
}
