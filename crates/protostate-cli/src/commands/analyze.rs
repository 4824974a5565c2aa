use super::load_system;
use crate::cli::AnalyzeArgs;
use crate::config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use protostate::engine::progress::ProgressReporter;
use protostate::workflows::{self, analyze::AnalysisReport};
use std::fmt::Write;
use tracing::{info, warn};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let config = config::resolve_analysis(&args)?;
    let system = load_system(&args.system)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the analysis workflow at pH {}...", config.ph);
    let report = workflows::analyze::run(&system, &config, &reporter)?;
    if !report.symmetry.is_symmetric {
        warn!(
            max_deviation = report.symmetry.max_deviation,
            "Interaction matrix was averaged before use."
        );
    }

    print!("{}", render_report(&report));
    Ok(())
}

pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "pH {:.2} at {:.2} K ({} microstates)",
        report.ph, report.temperature, report.n_states
    );
    let _ = writeln!(out);

    for site in &report.sites {
        let _ = writeln!(
            out,
            "{} (mean protons {:.4})",
            site.name, site.protonation
        );
        for (index, instance) in site.instances.iter().enumerate() {
            let marker = if index == site.most_probable { '*' } else { ' ' };
            let _ = writeln!(
                out,
                "  {} {:<16} H+ {:>2}  p = {:.6}",
                marker, instance.label, instance.protons, instance.probability
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total protonation:        {:.4}", report.total_protonation);
    let _ = writeln!(
        out,
        "Most probable state:      {:.4} kJ/mol",
        report.decoded_energy
    );
    let _ = writeln!(
        out,
        "Folded free energy:       {:.4} kJ/mol (Z = {:.6e})",
        report.folded.free_energy(),
        report.folded.z
    );
    let _ = writeln!(
        out,
        "Unfolded free energy:     {:.4} kJ/mol (Z = {:.6e})",
        report.unfolded.free_energy(),
        report.unfolded.z
    );
    let _ = writeln!(
        out,
        "Folding free energy:      {:.4} kJ/mol",
        report.folding_free_energy()
    );
    if !report.symmetry.is_symmetric {
        let _ = writeln!(
            out,
            "Interactions averaged (max asymmetry {:.3e} kJ/mol)",
            report.symmetry.max_deviation
        );
    }
    out
}
