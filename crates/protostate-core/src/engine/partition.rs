use super::error::EngineError;
use super::microstate::Environment;
use super::model::EnergyModel;
use super::utils::alloc::try_filled;
use crate::core::models::state_vector::StateVector;
use crate::core::units::thermal_energy;
use nalgebra::DVector;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Returned by [`EnergyModel::calculate_z_folded`] and [`EnergyModel::calculate_z_unfolded`]
/// when the factor buffer cannot be allocated.
pub const Z_ALLOCATION_FAILURE: f64 = -1.0;

/// Microstates handled by one parallel work unit.
#[cfg(feature = "parallel")]
pub(crate) const ENUMERATION_CHUNK: usize = 4096;

/// Partition function of one environment at one pH, relative to its lowest microstate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionFunction {
    /// `sum_k exp(-(G_k - G_min) / RT)`; at least 1 whenever the state space is non-empty.
    pub z: f64,
    /// Absolute energy subtracted before exponentiation, `G_zero + G_min`.
    pub energy_shift: f64,
    pub temperature: f64,
}

impl PartitionFunction {
    /// Absolute free energy of the ensemble, `shift - RT ln Z`.
    pub fn free_energy(&self) -> f64 {
        self.energy_shift - thermal_energy(self.temperature) * self.z.ln()
    }
}

/// Unnormalized Boltzmann weights of every microstate of a model.
///
/// Slot `k` always belongs to the microstate with odometer coordinate `k`, i.e. the state
/// reached from `StateVector::reset` after `k` calls to `StateVector::increment`. Any pass that
/// reads the weights back must walk the state space in that same order.
#[derive(Debug, Clone)]
pub struct BoltzmannFactors {
    weights: DVector<f64>,
    /// Site layout of the model that produced the weights.
    layout: StateVector,
    environment: Environment,
    ph: f64,
    partition: PartitionFunction,
}

impl BoltzmannFactors {
    pub fn z(&self) -> f64 {
        self.partition.z
    }

    pub fn partition(&self) -> PartitionFunction {
        self.partition
    }

    pub fn weights(&self) -> &[f64] {
        self.weights.as_slice()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn ph(&self) -> f64 {
        self.ph
    }

    /// State vector describing the sites the slots were enumerated over.
    pub fn layout(&self) -> &StateVector {
        &self.layout
    }

    /// Normalized probability of the microstate at odometer coordinate `index`.
    pub fn microstate_probability(&self, index: usize) -> Option<f64> {
        self.weights.get(index).map(|w| w / self.partition.z)
    }
}

impl EnergyModel {
    /// Enumerates the whole state space and returns the Boltzmann factor of every microstate
    /// relative to the lowest one, together with their sum `Z`.
    ///
    /// Energies are offset by `g_zero` before the minimum is located; the shift keeps the
    /// largest weight at exactly 1 so the exponentiation cannot overflow.
    #[instrument(skip_all, name = "partition_function", fields(%environment, ph))]
    pub fn boltzmann_factors(
        &self,
        environment: Environment,
        ph: f64,
        g_zero: f64,
    ) -> Result<BoltzmannFactors, EngineError> {
        let n_states = self.n_states().ok_or(EngineError::StateSpaceOverflow)?;
        let mut energies = try_filled("Boltzmann factor buffer", n_states, 0.0)?;

        let g_min = self.fill_relative_energies(environment, ph, g_zero, &mut energies);

        let mut weights = DVector::from_vec(energies);
        weights.add_scalar_mut(-g_min);
        weights.scale_mut(-1.0 / thermal_energy(self.temperature));
        weights.apply(|w| *w = w.exp());
        let z = weights.sum();

        debug!(n_states, g_min, z, "Partition function evaluated.");

        Ok(BoltzmannFactors {
            weights,
            layout: self.vector.clone(),
            environment,
            ph,
            partition: PartitionFunction {
                z,
                energy_shift: g_zero + g_min,
                temperature: self.temperature,
            },
        })
    }

    /// `Z` of the folded environment, or [`Z_ALLOCATION_FAILURE`] if the state space cannot be
    /// held in memory.
    pub fn calculate_z_folded(&self, ph: f64, g_zero: f64) -> f64 {
        self.calculate_z(Environment::Folded, ph, g_zero)
    }

    /// `Z` of the unfolded environment, or [`Z_ALLOCATION_FAILURE`].
    pub fn calculate_z_unfolded(&self, ph: f64, g_zero: f64) -> f64 {
        self.calculate_z(Environment::Unfolded, ph, g_zero)
    }

    fn calculate_z(&self, environment: Environment, ph: f64, g_zero: f64) -> f64 {
        match self.boltzmann_factors(environment, ph, g_zero) {
            Ok(factors) => factors.z(),
            Err(_) => Z_ALLOCATION_FAILURE,
        }
    }

    /// Absolute ensemble free energy `-RT ln sum_k exp(-G_k / RT)` of one environment.
    pub fn free_energy(&self, environment: Environment, ph: f64) -> Result<f64, EngineError> {
        Ok(self
            .boltzmann_factors(environment, ph, 0.0)?
            .partition()
            .free_energy())
    }

    /// Writes `G_k - g_zero` into slot `k` for every microstate and returns the minimum.
    #[cfg(not(feature = "parallel"))]
    fn fill_relative_energies(
        &self,
        environment: Environment,
        ph: f64,
        g_zero: f64,
        out: &mut [f64],
    ) -> f64 {
        let mut cursor = self.vector.clone();
        cursor.reset();
        self.fill_run(&mut cursor, environment, ph, g_zero, out)
    }

    #[cfg(feature = "parallel")]
    fn fill_relative_energies(
        &self,
        environment: Environment,
        ph: f64,
        g_zero: f64,
        out: &mut [f64],
    ) -> f64 {
        out.par_chunks_mut(ENUMERATION_CHUNK)
            .enumerate()
            .map(|(chunk_idx, chunk)| {
                let mut cursor = self.vector.clone();
                cursor.set_from_index(chunk_idx * ENUMERATION_CHUNK);
                self.fill_run(&mut cursor, environment, ph, g_zero, chunk)
            })
            .reduce(|| f64::INFINITY, f64::min)
    }

    /// Scores a contiguous run of microstates starting at the cursor's current position.
    fn fill_run(
        &self,
        cursor: &mut StateVector,
        environment: Environment,
        ph: f64,
        g_zero: f64,
        out: &mut [f64],
    ) -> f64 {
        let mut g_min = f64::INFINITY;
        for (offset, slot) in out.iter_mut().enumerate() {
            if offset > 0 {
                cursor.increment();
            }
            let g = self.evaluate(environment, cursor, ph) - g_zero;
            g_min = g_min.min(g);
            *slot = g;
        }
        g_min
    }
}
