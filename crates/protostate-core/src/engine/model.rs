use super::config::validate_temperature;
use super::error::EngineError;
use super::utils::alloc::try_filled;
use crate::core::linalg::symmetric::SymmetricMatrix;
use crate::core::models::state_vector::StateVector;
use crate::core::models::system::TitratableSystem;
use crate::core::units::DEFAULT_TEMPERATURE;
use nalgebra::DMatrix;
use tracing::{debug, info};

/// Outcome of scanning the raw interaction matrix for asymmetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryReport {
    pub is_symmetric: bool,
    pub max_deviation: f64,
}

/// Per-instance energetics of a multi-site titratable system together with the pairwise
/// interaction matrix and a private state vector.
///
/// Instances are addressed by their global index. Sites and their instance blocks are fixed
/// at allocation; everything else is plain data that may be rewritten freely.
#[derive(Debug, Clone)]
pub struct EnergyModel {
    pub(crate) temperature: f64,
    pub(crate) intrinsic: Vec<f64>,
    pub(crate) models: Vec<f64>,
    pub(crate) protons: Vec<i32>,
    pub(crate) probabilities: Vec<f64>,
    pub(crate) interactions: DMatrix<f64>,
    pub(crate) symmetric: SymmetricMatrix,
    pub(crate) vector: StateVector,
}

impl EnergyModel {
    /// Allocates a model with one site per entry of `site_sizes`, each entry giving the number
    /// of instances of that site. All energies, proton counts and interactions start at zero.
    ///
    /// Either every buffer is acquired or none is; a failure is reported as an error.
    pub fn allocate(site_sizes: &[usize]) -> Result<Self, EngineError> {
        let vector = StateVector::from_site_sizes(site_sizes)?;
        let n_instances = vector.n_instances();

        let intrinsic = try_filled("intrinsic energies", n_instances, 0.0)?;
        let models = try_filled("model energies", n_instances, 0.0)?;
        let protons = try_filled("proton counts", n_instances, 0)?;
        let probabilities = try_filled("probabilities", n_instances, 0.0)?;

        let raw_len = n_instances
            .checked_mul(n_instances)
            .ok_or(EngineError::Allocation {
                what: "raw interaction matrix",
                requested: usize::MAX,
            })?;
        let interactions = DMatrix::from_vec(
            n_instances,
            n_instances,
            try_filled("raw interaction matrix", raw_len, 0.0)?,
        );

        let packed_len =
            SymmetricMatrix::packed_len(n_instances).ok_or(EngineError::Allocation {
                what: "symmetric interaction matrix",
                requested: usize::MAX,
            })?;
        let symmetric = SymmetricMatrix::from_packed(
            n_instances,
            try_filled("symmetric interaction matrix", packed_len, 0.0)?,
        )
        .ok_or(EngineError::Allocation {
            what: "symmetric interaction matrix",
            requested: packed_len,
        })?;

        debug!(
            n_sites = vector.n_sites(),
            n_instances, "Energy model allocated."
        );

        Ok(Self {
            temperature: DEFAULT_TEMPERATURE,
            intrinsic,
            models,
            protons,
            probabilities,
            interactions,
            symmetric,
            vector,
        })
    }

    /// Builds a model from a validated system definition and symmetrizes its interactions.
    pub fn from_system(system: &TitratableSystem, temperature: f64) -> Result<Self, EngineError> {
        validate_temperature(temperature)?;
        let mut model = Self::allocate(&system.site_sizes())?;
        model.temperature = temperature;

        for (index, instance) in system.instances().enumerate() {
            model.intrinsic[index] = instance.intrinsic;
            model.models[index] = instance.model;
            model.protons[index] = instance.protons;
        }
        for (a, b, energy) in system.interaction_entries()? {
            model.set_interaction(a, b, energy)?;
        }
        model.symmetrize_interactions();

        info!(
            n_sites = model.n_sites(),
            n_instances = model.n_instances(),
            n_states = ?model.n_states(),
            temperature,
            "Energy model built from system definition."
        );
        Ok(model)
    }

    #[inline]
    pub fn n_sites(&self) -> usize {
        self.vector.n_sites()
    }

    #[inline]
    pub fn n_instances(&self) -> usize {
        self.intrinsic.len()
    }

    /// Size of the microstate space, `None` if it overflows `usize`.
    pub fn n_states(&self) -> Option<usize> {
        self.vector.n_states()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Sets the temperature in Kelvin; it must be positive and finite.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), EngineError> {
        validate_temperature(temperature)?;
        self.temperature = temperature;
        Ok(())
    }

    /// The model's own state vector.
    pub fn state_vector(&self) -> &StateVector {
        &self.vector
    }

    /// Mutable access for explicit assignment of active instances.
    pub fn state_vector_mut(&mut self) -> &mut StateVector {
        &mut self.vector
    }

    /// Marginal occupation probabilities, meaningful only after a probability calculation.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn symmetric_interactions(&self) -> &SymmetricMatrix {
        &self.symmetric
    }

    pub fn raw_interactions(&self) -> &DMatrix<f64> {
        &self.interactions
    }

    fn check_instance(&self, index: usize) -> Result<(), EngineError> {
        if index < self.n_instances() {
            Ok(())
        } else {
            Err(EngineError::InstanceOutOfRange {
                index,
                n_instances: self.n_instances(),
            })
        }
    }

    pub fn intrinsic(&self, index: usize) -> Option<f64> {
        self.intrinsic.get(index).copied()
    }

    pub fn set_intrinsic(&mut self, index: usize, value: f64) -> Result<(), EngineError> {
        self.check_instance(index)?;
        self.intrinsic[index] = value;
        Ok(())
    }

    pub fn model_energy(&self, index: usize) -> Option<f64> {
        self.models.get(index).copied()
    }

    pub fn set_model_energy(&mut self, index: usize, value: f64) -> Result<(), EngineError> {
        self.check_instance(index)?;
        self.models[index] = value;
        Ok(())
    }

    pub fn protons(&self, index: usize) -> Option<i32> {
        self.protons.get(index).copied()
    }

    pub fn set_protons(&mut self, index: usize, value: i32) -> Result<(), EngineError> {
        self.check_instance(index)?;
        self.protons[index] = value;
        Ok(())
    }

    pub fn probability(&self, index: usize) -> Option<f64> {
        self.probabilities.get(index).copied()
    }

    pub fn set_probability(&mut self, index: usize, value: f64) -> Result<(), EngineError> {
        self.check_instance(index)?;
        self.probabilities[index] = value;
        Ok(())
    }

    /// Raw interaction `W[i, j]` as supplied by the interaction evaluator.
    pub fn interaction(&self, i: usize, j: usize) -> Option<f64> {
        self.interactions.get((i, j)).copied()
    }

    pub fn set_interaction(&mut self, i: usize, j: usize, value: f64) -> Result<(), EngineError> {
        self.check_instance(i)?;
        self.check_instance(j)?;
        self.interactions[(i, j)] = value;
        Ok(())
    }

    /// Symmetrized interaction `w[i, j]` used by the energy functions.
    pub fn symmetric_interaction(&self, i: usize, j: usize) -> Option<f64> {
        self.symmetric.get(i, j)
    }

    /// Scans the raw matrix and reports whether `|W_ij - W_ji| <= tolerance` everywhere.
    pub fn check_interactions_symmetric(&self, tolerance: f64) -> SymmetryReport {
        let n = self.n_instances();
        let mut max_deviation = 0.0f64;
        for i in 0..n {
            for j in 0..i {
                let deviation = (self.interactions[(i, j)] - self.interactions[(j, i)]).abs();
                max_deviation = max_deviation.max(deviation);
            }
        }
        SymmetryReport {
            is_symmetric: max_deviation <= tolerance,
            max_deviation,
        }
    }

    /// Rebuilds the production matrix as `w_ij = (W_ij + W_ji) / 2`.
    pub fn symmetrize_interactions(&mut self) {
        self.symmetric.copy_symmetrized(&self.interactions);
    }

    pub fn reset_interactions(&mut self) {
        self.symmetric.fill(0.0);
    }

    pub fn scale_interactions(&mut self, factor: f64) {
        self.symmetric.scale(factor);
    }

    /// Asymmetry of one raw pair, `(W_ij + W_ji) / 2 - W_ij`, independent of the symmetrized
    /// matrix.
    pub fn deviation(&self, i: usize, j: usize) -> Option<f64> {
        let w_ij = self.interaction(i, j)?;
        let w_ji = self.interaction(j, i)?;
        Some(0.5 * (w_ij + w_ji) - w_ij)
    }

    /// Expected number of protons bound by one site, `sum(p_i * protons_i)` over its
    /// instances, using the current probabilities.
    pub fn site_protonation(&self, site: usize) -> Result<f64, EngineError> {
        let site = self
            .vector
            .site(site)
            .ok_or(EngineError::SiteOutOfRange {
                index: site,
                n_sites: self.n_sites(),
            })?;
        Ok(site
            .range()
            .map(|i| self.probabilities[i] * f64::from(self.protons[i]))
            .sum())
    }

    /// Expected number of protons bound by the whole system.
    pub fn total_protonation(&self) -> f64 {
        self.probabilities
            .iter()
            .zip(&self.protons)
            .map(|(&p, &n)| p * f64::from(n))
            .sum()
    }
}
