use super::error::EngineError;
use super::model::EnergyModel;
use crate::core::models::state_vector::StateVector;

impl EnergyModel {
    /// Activates, for every site, the instance with the highest marginal probability (first
    /// one wins on ties).
    ///
    /// Writes into `vector` when given, otherwise into the model's own vector. Sites are decoded
    /// independently, so with strong interactions the result need not be the lowest-energy
    /// microstate.
    pub fn state_vector_from_probabilities(
        &mut self,
        vector: Option<&mut StateVector>,
    ) -> Result<(), EngineError> {
        match vector {
            Some(external) => {
                self.check_conformable(external)?;
                select_most_probable(&self.probabilities, external);
            }
            None => select_most_probable(&self.probabilities, &mut self.vector),
        }
        Ok(())
    }

    /// A copy of the model's vector set to the most probable instance of every site.
    pub fn most_probable_state(&self) -> StateVector {
        let mut vector = self.vector.clone();
        select_most_probable(&self.probabilities, &mut vector);
        vector
    }
}

fn select_most_probable(probabilities: &[f64], vector: &mut StateVector) {
    for site in vector.sites_mut() {
        let best = site.range().fold(site.first(), |best, instance| {
            if probabilities[instance] > probabilities[best] {
                instance
            } else {
                best
            }
        });
        site.set_active(best);
    }
}
