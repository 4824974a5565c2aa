use crate::core::models::system::TitratableSystem;
use crate::engine::config::TitrationConfig;
use crate::engine::error::EngineError;
use crate::engine::microstate::Environment;
use crate::engine::model::EnergyModel;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument, warn};

/// Equilibrium observables of one environment at one pH.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentResult {
    /// Mean proton count of every site, in site order.
    pub site_protonation: Vec<f64>,
    pub total_protonation: f64,
    /// Ensemble free energy `-RT ln Z` in absolute terms, kJ/mol.
    pub free_energy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitrationPoint {
    pub ph: f64,
    pub folded: Option<EnvironmentResult>,
    pub unfolded: Option<EnvironmentResult>,
}

impl TitrationPoint {
    pub fn result(&self, environment: Environment) -> Option<&EnvironmentResult> {
        match environment {
            Environment::Folded => self.folded.as_ref(),
            Environment::Unfolded => self.unfolded.as_ref(),
        }
    }

    /// `G_folded - G_unfolded`; only available when both environments were evaluated.
    pub fn folding_free_energy(&self) -> Option<f64> {
        match (&self.folded, &self.unfolded) {
            (Some(folded), Some(unfolded)) => Some(folded.free_energy - unfolded.free_energy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitrationCurve {
    pub site_names: Vec<String>,
    pub temperature: f64,
    pub points: Vec<TitrationPoint>,
}

#[instrument(skip_all, name = "titration_workflow")]
pub fn run(
    system: &TitratableSystem,
    config: &TitrationConfig,
    reporter: &ProgressReporter,
) -> Result<TitrationCurve, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Model Construction",
    });
    let mut model = EnergyModel::from_system(system, config.temperature)?;
    let n_states = model.n_states().ok_or(EngineError::StateSpaceOverflow)?;

    let symmetry = model.check_interactions_symmetric(config.symmetry_tolerance);
    if !symmetry.is_symmetric {
        warn!(
            max_deviation = symmetry.max_deviation,
            tolerance = config.symmetry_tolerance,
            "Interaction matrix is not symmetric; using the averaged matrix."
        );
        reporter.report(Progress::Message(format!(
            "Interactions averaged (max asymmetry {:.3e} kJ/mol)",
            symmetry.max_deviation
        )));
    }
    reporter.report(Progress::PhaseFinish);

    let grid = config.ph_grid.values()?;
    let environments = config.environments.environments();
    info!(
        n_states,
        n_points = grid.len(),
        environments = environments.len(),
        "Starting titration."
    );

    reporter.report(Progress::PhaseStart { name: "Titration" });
    reporter.report(Progress::TaskStart {
        total_steps: grid.len() as u64,
    });

    let mut points = Vec::with_capacity(grid.len());
    for &ph in &grid {
        let mut point = TitrationPoint {
            ph,
            folded: None,
            unfolded: None,
        };
        for &environment in environments {
            let result = evaluate_point(&mut model, environment, ph)?;
            reporter.report(Progress::EnvironmentEvaluated {
                ph,
                environment,
                total_protonation: result.total_protonation,
            });
            match environment {
                Environment::Folded => point.folded = Some(result),
                Environment::Unfolded => point.unfolded = Some(result),
            }
        }
        let folding_free_energy = point.folding_free_energy();
        debug!(ph, dg_fold = ?folding_free_energy, "Titration point evaluated.");
        points.push(point);
        reporter.report(Progress::PointComputed {
            ph,
            folding_free_energy,
        });
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!(n_points = points.len(), "Titration finished.");

    Ok(TitrationCurve {
        site_names: system.sites().iter().map(|s| s.name.clone()).collect(),
        temperature: config.temperature,
        points,
    })
}

fn evaluate_point(
    model: &mut EnergyModel,
    environment: Environment,
    ph: f64,
) -> Result<EnvironmentResult, EngineError> {
    let partition = model.calculate_probabilities_in(environment, ph)?;
    let site_protonation = (0..model.n_sites())
        .map(|site| model.site_protonation(site))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EnvironmentResult {
        site_protonation,
        total_protonation: model.total_protonation(),
        free_energy: partition.free_energy(),
    })
}
