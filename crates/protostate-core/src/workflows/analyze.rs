use crate::core::models::state_vector::StateVector;
use crate::core::models::system::TitratableSystem;
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::microstate::Environment;
use crate::engine::model::{EnergyModel, SymmetryReport};
use crate::engine::partition::PartitionFunction;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOccupation {
    pub label: String,
    pub protons: i32,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteOccupation {
    pub name: String,
    pub instances: Vec<InstanceOccupation>,
    /// Position within `instances` of the most probable one.
    pub most_probable: usize,
    pub protonation: f64,
}

/// Folded-state picture of a system at one pH.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub ph: f64,
    pub temperature: f64,
    pub n_states: usize,
    pub sites: Vec<SiteOccupation>,
    pub total_protonation: f64,
    /// Folded energy of the per-site most probable state.
    pub decoded_energy: f64,
    pub folded: PartitionFunction,
    pub unfolded: PartitionFunction,
    pub symmetry: SymmetryReport,
}

impl AnalysisReport {
    pub fn folding_free_energy(&self) -> f64 {
        self.folded.free_energy() - self.unfolded.free_energy()
    }
}

#[instrument(skip_all, name = "analysis_workflow", fields(ph = config.ph))]
pub fn run(
    system: &TitratableSystem,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<AnalysisReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Model Construction",
    });
    let mut model = EnergyModel::from_system(system, config.temperature)?;
    let n_states = model.n_states().ok_or(EngineError::StateSpaceOverflow)?;
    let symmetry = model.check_interactions_symmetric(config.symmetry_tolerance);
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Partition Functions",
    });
    let unfolded = model
        .boltzmann_factors(Environment::Unfolded, config.ph, 0.0)?
        .partition();
    let folded = model.calculate_probabilities_analytically(config.ph)?;
    reporter.report(Progress::PhaseFinish);

    let mut decoded = model.state_vector().clone();
    model.state_vector_from_probabilities(Some(&mut decoded))?;
    let decoded_energy = model.microstate_energy(Some(&decoded), config.ph)?;

    let sites = collect_occupations(system, &model, &decoded)?;

    info!(
        n_states,
        z = folded.z,
        decoded_energy,
        "Analysis finished."
    );

    Ok(AnalysisReport {
        ph: config.ph,
        temperature: config.temperature,
        n_states,
        sites,
        total_protonation: model.total_protonation(),
        decoded_energy,
        folded,
        unfolded,
        symmetry,
    })
}

fn collect_occupations(
    system: &TitratableSystem,
    model: &EnergyModel,
    decoded: &StateVector,
) -> Result<Vec<SiteOccupation>, EngineError> {
    system
        .sites()
        .iter()
        .zip(decoded.sites())
        .enumerate()
        .map(|(index, (definition, site))| {
            let instances = definition
                .instances
                .iter()
                .zip(site.range())
                .map(|(instance, global)| InstanceOccupation {
                    label: instance.label.clone(),
                    protons: instance.protons,
                    probability: model.probabilities()[global],
                })
                .collect();
            Ok(SiteOccupation {
                name: definition.name.clone(),
                instances,
                most_probable: site.offset(),
                protonation: model.site_protonation(index)?,
            })
        })
        .collect()
}
