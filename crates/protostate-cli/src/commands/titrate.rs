use super::load_system;
use crate::cli::TitrateArgs;
use crate::config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use protostate::engine::microstate::Environment;
use protostate::engine::progress::ProgressReporter;
use protostate::workflows::{self, titrate::TitrationCurve};
use std::fs::File;
use std::io::{self, Write};
use tracing::info;

pub fn run(args: TitrateArgs) -> Result<()> {
    let config = config::resolve_titration(&args)?;
    let system = load_system(&args.system)?;

    let progress_handler = if args.output.is_some() {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the titration workflow...");
    let curve = workflows::titrate::run(&system, &config, &reporter)?;
    let environments = config.environments.environments();

    match &args.output {
        Some(path) => {
            write_curve(&curve, environments, File::create(path)?)?;
            println!(
                "✓ Titration curve ({} points) written to: {}",
                curve.points.len(),
                path.display()
            );
        }
        None => write_curve(&curve, environments, io::stdout().lock())?,
    }
    Ok(())
}

/// Writes one CSV row per pH: per-site and total protonation plus the free energy of every
/// evaluated environment, and the folding free energy when both are present.
pub fn write_curve<W: Write>(
    curve: &TitrationCurve,
    environments: &[Environment],
    out: W,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let with_folding = environments.len() == Environment::ALL.len();

    let mut header = vec!["ph".to_string()];
    for environment in environments {
        for name in &curve.site_names {
            header.push(format!("{}_{}", environment, name));
        }
        header.push(format!("{}_total", environment));
        header.push(format!("{}_free_energy", environment));
    }
    if with_folding {
        header.push("folding_free_energy".to_string());
    }
    writer.write_record(&header)?;

    for point in &curve.points {
        let mut record = vec![format_value(point.ph)];
        for &environment in environments {
            match point.result(environment) {
                Some(result) => {
                    record.extend(result.site_protonation.iter().copied().map(format_value));
                    record.push(format_value(result.total_protonation));
                    record.push(format_value(result.free_energy));
                }
                None => record.extend(
                    std::iter::repeat_n(String::new(), curve.site_names.len() + 2),
                ),
            }
        }
        if with_folding {
            record.push(
                point
                    .folding_free_energy()
                    .map(format_value)
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn format_value(value: f64) -> String {
    format!("{:.6}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protostate::workflows::titrate::{EnvironmentResult, TitrationPoint};

    fn result(sites: &[f64], free_energy: f64) -> EnvironmentResult {
        EnvironmentResult {
            site_protonation: sites.to_vec(),
            total_protonation: sites.iter().sum(),
            free_energy,
        }
    }

    fn curve() -> TitrationCurve {
        TitrationCurve {
            site_names: vec!["GLU7".to_string(), "HIS31".to_string()],
            temperature: 300.0,
            points: vec![
                TitrationPoint {
                    ph: 4.0,
                    folded: Some(result(&[0.75, 1.0], -10.0)),
                    unfolded: Some(result(&[0.5, 1.0], -12.5)),
                },
                TitrationPoint {
                    ph: 8.0,
                    folded: Some(result(&[0.0, 0.25], 3.0)),
                    unfolded: Some(result(&[0.0, 0.5], 1.0)),
                },
            ],
        }
    }

    fn render(environments: &[Environment]) -> Vec<String> {
        let mut buffer = Vec::new();
        write_curve(&curve(), environments, &mut buffer).unwrap();
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn folded_only_curve_has_per_site_columns() {
        let lines = render(&[Environment::Folded]);
        assert_eq!(
            lines[0],
            "ph,folded_GLU7,folded_HIS31,folded_total,folded_free_energy"
        );
        assert_eq!(lines[1], "4.000000,0.750000,1.000000,1.750000,-10.000000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn both_environments_add_folding_free_energy() {
        let lines = render(&Environment::ALL);
        assert!(lines[0].starts_with("ph,folded_GLU7"));
        assert!(lines[0].contains(",unfolded_HIS31,"));
        assert!(lines[0].ends_with(",folding_free_energy"));
        assert!(lines[1].ends_with(",2.500000"));
        assert!(lines[2].ends_with(",2.000000"));
    }

    #[test]
    fn missing_environment_results_leave_empty_cells() {
        let mut curve = curve();
        curve.points[0].unfolded = None;
        let mut buffer = Vec::new();
        write_curve(&curve, &Environment::ALL, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let first_row = text.lines().nth(1).unwrap();
        assert!(first_row.ends_with(",,,,,"));
    }
}
