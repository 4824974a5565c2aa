use super::error::EngineError;
use super::microstate::Environment;
use super::model::EnergyModel;
use super::partition::{BoltzmannFactors, PartitionFunction};
use crate::core::models::state_vector::StateVector;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use super::partition::ENUMERATION_CHUNK;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

impl EnergyModel {
    /// Converts per-microstate Boltzmann factors into marginal instance probabilities.
    ///
    /// Every microstate contributes its weight to the active instance of each site, and the
    /// sums are normalized by `Z`. Slots are read back in odometer order; factors from a model
    /// with a different site layout are rejected.
    #[instrument(skip_all, name = "probabilities_from_z", fields(environment = %factors.environment()))]
    pub fn probabilities_from_z(&mut self, factors: &BoltzmannFactors) -> Result<(), EngineError> {
        let n_states = self.n_states().ok_or(EngineError::StateSpaceOverflow)?;
        if factors.len() != n_states {
            return Err(EngineError::BufferSizeMismatch {
                expected: n_states,
                found: factors.len(),
            });
        }
        self.check_conformable(factors.layout())?;

        self.accumulate_instance_weights(factors.weights());

        let inverse_z = 1.0 / factors.z();
        for probability in &mut self.probabilities {
            *probability *= inverse_z;
        }

        debug!(z = factors.z(), "Instance probabilities derived.");
        Ok(())
    }

    /// Exact folded-state probabilities at `ph`; returns the partition function used.
    pub fn calculate_probabilities_analytically(
        &mut self,
        ph: f64,
    ) -> Result<PartitionFunction, EngineError> {
        self.calculate_probabilities_in(Environment::Folded, ph)
    }

    /// Exact unfolded-state probabilities at `ph`; returns the partition function used.
    pub fn calculate_probabilities_analytically_unfolded(
        &mut self,
        ph: f64,
    ) -> Result<PartitionFunction, EngineError> {
        self.calculate_probabilities_in(Environment::Unfolded, ph)
    }

    pub fn calculate_probabilities_in(
        &mut self,
        environment: Environment,
        ph: f64,
    ) -> Result<PartitionFunction, EngineError> {
        let factors = self.boltzmann_factors(environment, ph, 0.0)?;
        self.probabilities_from_z(&factors)?;
        Ok(factors.partition())
    }

    #[cfg(not(feature = "parallel"))]
    fn accumulate_instance_weights(&mut self, weights: &[f64]) {
        self.probabilities.fill(0.0);
        let mut cursor = self.vector.clone();
        cursor.reset();
        accumulate_run(&mut cursor, weights, &mut self.probabilities);
    }

    #[cfg(feature = "parallel")]
    fn accumulate_instance_weights(&mut self, weights: &[f64]) {
        let n_instances = self.n_instances();
        let vector = &self.vector;

        let sums = weights
            .par_chunks(ENUMERATION_CHUNK)
            .enumerate()
            .fold(
                || vec![0.0; n_instances],
                |mut sums, (chunk_idx, chunk)| {
                    let mut cursor = vector.clone();
                    cursor.set_from_index(chunk_idx * ENUMERATION_CHUNK);
                    accumulate_run(&mut cursor, chunk, &mut sums);
                    sums
                },
            )
            .reduce(
                || vec![0.0; n_instances],
                |mut total, partial| {
                    for (t, p) in total.iter_mut().zip(partial) {
                        *t += p;
                    }
                    total
                },
            );

        self.probabilities.copy_from_slice(&sums);
    }
}

/// Adds each weight of a contiguous run of microstates to the active instances of that
/// microstate, starting from the cursor's current position.
fn accumulate_run(cursor: &mut StateVector, weights: &[f64], sums: &mut [f64]) {
    for (offset, &weight) in weights.iter().enumerate() {
        if offset > 0 {
            cursor.increment();
        }
        for active in cursor.actives() {
            sums[active] += weight;
        }
    }
}
