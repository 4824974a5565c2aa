use super::error::EngineError;
use super::model::EnergyModel;
use crate::core::models::state_vector::StateVector;
use crate::core::units::nernst_factor;
use itertools::Itertools;
use std::fmt;

/// Reference environment in which a microstate is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Native environment: intrinsic energies plus pairwise interactions.
    Folded,
    /// Non-interacting reference: model energies only, with the opposite pH sign convention.
    Unfolded,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Folded, Environment::Unfolded];

    pub fn label(&self) -> &'static str {
        match self {
            Environment::Folded => "folded",
            Environment::Unfolded => "unfolded",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl EnergyModel {
    /// Free energy of the microstate held by `vector` (or by the model's own vector when
    /// `None`) in the folded environment:
    ///
    /// `E = sum intrinsic[a_s] + sum_{s<t} w[a_s, a_t] + n_protons * RT ln10 * pH`
    pub fn microstate_energy(
        &self,
        vector: Option<&StateVector>,
        ph: f64,
    ) -> Result<f64, EngineError> {
        self.energy_in(Environment::Folded, vector, ph)
    }

    /// Free energy of the microstate in the unfolded reference environment:
    ///
    /// `E = sum models[a_s] - n_protons * RT ln10 * pH`
    pub fn microstate_energy_unfolded(
        &self,
        vector: Option<&StateVector>,
        ph: f64,
    ) -> Result<f64, EngineError> {
        self.energy_in(Environment::Unfolded, vector, ph)
    }

    pub fn energy_in(
        &self,
        environment: Environment,
        vector: Option<&StateVector>,
        ph: f64,
    ) -> Result<f64, EngineError> {
        let vector = self.resolve_vector(vector)?;
        Ok(self.evaluate(environment, vector, ph))
    }

    /// Picks the caller's vector when given, falling back to the model's own one.
    pub(crate) fn resolve_vector<'a>(
        &'a self,
        vector: Option<&'a StateVector>,
    ) -> Result<&'a StateVector, EngineError> {
        match vector {
            Some(external) => {
                self.check_conformable(external)?;
                Ok(external)
            }
            None => Ok(&self.vector),
        }
    }

    pub(crate) fn check_conformable(&self, vector: &StateVector) -> Result<(), EngineError> {
        if vector.conforms_to(&self.vector) {
            Ok(())
        } else {
            Err(EngineError::NonConformable {
                expected: self.vector.n_sites(),
                found: vector.n_sites(),
            })
        }
    }

    /// Energy of a conformable vector. Hot path of every enumeration.
    #[inline]
    pub(crate) fn evaluate(&self, environment: Environment, vector: &StateVector, ph: f64) -> f64 {
        match environment {
            Environment::Folded => self.folded_energy(vector, ph),
            Environment::Unfolded => self.unfolded_energy(vector, ph),
        }
    }

    fn folded_energy(&self, vector: &StateVector, ph: f64) -> f64 {
        let mut energy = 0.0;
        let mut n_protons = 0i64;
        for active in vector.actives() {
            energy += self.intrinsic[active];
            n_protons += i64::from(self.protons[active]);
        }
        for (a, b) in vector.actives().tuple_combinations() {
            energy += self.symmetric[(a, b)];
        }
        energy + n_protons as f64 * nernst_factor(self.temperature) * ph
    }

    fn unfolded_energy(&self, vector: &StateVector, ph: f64) -> f64 {
        let mut energy = 0.0;
        let mut n_protons = 0i64;
        for active in vector.actives() {
            energy += self.models[active];
            n_protons += i64::from(self.protons[active]);
        }
        energy - n_protons as f64 * nernst_factor(self.temperature) * ph
    }
}
