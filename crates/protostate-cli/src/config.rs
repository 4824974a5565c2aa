mod defaults;
mod file;

use crate::cli::{AnalyzeArgs, TitrateArgs};
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use file::FileConfig;
use protostate::engine::config::{
    AnalysisConfig, EnvironmentSelection, TitrationConfig, TitrationConfigBuilder,
};
use tracing::debug;

/// Resolves the titration settings with precedence CLI argument > file > defaults.
pub fn resolve_titration(args: &TitrateArgs) -> Result<TitrationConfig> {
    let mut file = FileConfig::load_optional(args.config.as_deref())?;
    file.apply_set_values(&args.set_values)?;
    merge_titration(args, file, &DefaultsConfig::default())
}

pub fn resolve_analysis(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut file = FileConfig::load_optional(args.config.as_deref())?;
    file.apply_set_values(&args.set_values)?;
    merge_analysis(args, file, &DefaultsConfig::default())
}

fn merge_titration(
    args: &TitrateArgs,
    file: FileConfig,
    defaults: &DefaultsConfig,
) -> Result<TitrationConfig> {
    let section = file.titration.unwrap_or_default();

    let environments = args
        .environments
        .map(EnvironmentSelection::from)
        .or(section.environments.map(EnvironmentSelection::from))
        .unwrap_or(defaults.environments);

    let config = TitrationConfigBuilder::new()
        .temperature(
            args.temperature
                .or(file.temperature)
                .unwrap_or(defaults.temperature),
        )
        .ph_start(args.ph_start.or(section.ph_start).unwrap_or(defaults.ph_start))
        .ph_end(args.ph_end.or(section.ph_end).unwrap_or(defaults.ph_end))
        .ph_step(args.ph_step.or(section.ph_step).unwrap_or(defaults.ph_step))
        .environments(environments)
        .symmetry_tolerance(
            args.symmetry_tolerance
                .or(file.symmetry_tolerance)
                .unwrap_or(defaults.symmetry_tolerance),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!(?config, "Resolved titration configuration.");
    Ok(config)
}

fn merge_analysis(
    args: &AnalyzeArgs,
    file: FileConfig,
    defaults: &DefaultsConfig,
) -> Result<AnalysisConfig> {
    let ph = args
        .ph
        .or(file.analysis.and_then(|a| a.ph))
        .unwrap_or(defaults.analysis_ph);
    let config = AnalysisConfig::new(
        args.temperature
            .or(file.temperature)
            .unwrap_or(defaults.temperature),
        ph,
        args.symmetry_tolerance
            .or(file.symmetry_tolerance)
            .unwrap_or(defaults.symmetry_tolerance),
    )
    .map_err(|e| CliError::Config(e.to_string()))?;

    debug!(?config, "Resolved analysis configuration.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("run.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn titrate_args(extra: &[&str], config: Option<&Path>) -> TitrateArgs {
        let mut argv = vec!["protostate".to_string(), "titrate".to_string()];
        argv.extend(["-s".to_string(), "system.toml".to_string()]);
        if let Some(path) = config {
            argv.extend(["-c".to_string(), path.to_str().unwrap().to_string()]);
        }
        argv.extend(extra.iter().map(|s| s.to_string()));
        match Cli::parse_from(argv).command {
            Commands::Titrate(args) => args,
            _ => panic!("expected titrate subcommand"),
        }
    }

    fn analyze_args(extra: &[&str], config: Option<&Path>) -> AnalyzeArgs {
        let mut argv = vec!["protostate".to_string(), "analyze".to_string()];
        argv.extend(["-s".to_string(), "system.toml".to_string()]);
        if let Some(path) = config {
            argv.extend(["-c".to_string(), path.to_str().unwrap().to_string()]);
        }
        argv.extend(extra.iter().map(|s| s.to_string()));
        match Cli::parse_from(argv).command {
            Commands::Analyze(args) => args,
            _ => panic!("expected analyze subcommand"),
        }
    }

    #[test]
    fn defaults_apply_without_file_or_overrides() {
        let config = resolve_titration(&titrate_args(&[], None)).unwrap();
        assert_eq!(config.temperature, 300.0);
        assert_eq!(config.ph_grid.values().unwrap().len(), 29);
        assert_eq!(config.environments, EnvironmentSelection::Folded);
        assert_eq!(config.symmetry_tolerance, 1e-6);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            r#"
            temperature = 310.0

            [titration]
            ph-start = 2.0
            ph-end = 6.0
            ph-step = 1.0
            environments = "both"
            "#,
        );
        let config = resolve_titration(&titrate_args(&[], Some(&path))).unwrap();
        assert_eq!(config.temperature, 310.0);
        assert_eq!(config.ph_grid.values().unwrap(), vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(config.environments, EnvironmentSelection::Both);
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            r#"
            temperature = 310.0
            [titration]
            ph-step = 1.0
            environments = "both"
            "#,
        );
        let args = titrate_args(
            &["-t", "280", "--ph-step", "2", "-e", "unfolded"],
            Some(&path),
        );
        let config = resolve_titration(&args).unwrap();
        assert_eq!(config.temperature, 280.0);
        assert_eq!(config.ph_grid.step, 2.0);
        assert_eq!(config.environments, EnvironmentSelection::Unfolded);
    }

    #[test]
    fn set_values_override_file_values() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "[titration]\nph-end = 10.0\n");
        let args = titrate_args(
            &["-S", "titration.ph-end=4", "-S", "titration.environments=both"],
            Some(&path),
        );
        let config = resolve_titration(&args).unwrap();
        assert_eq!(config.ph_grid.end, 4.0);
        assert_eq!(config.environments, EnvironmentSelection::Both);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "[titration]\nph-stride = 1.0\n");
        let result = resolve_titration(&titrate_args(&[], Some(&path)));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn unsupported_set_key_is_a_config_error() {
        let result = resolve_titration(&titrate_args(&["-S", "titration.bogus=1"], None));
        assert!(matches!(result, Err(CliError::Config(_))));
        let result = resolve_titration(&titrate_args(&["-S", "temperature"], None));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn invalid_merged_values_surface_as_config_errors() {
        let result = resolve_titration(&titrate_args(&["--ph-step", "0"], None));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn degenerate_grids_from_the_command_line_are_rejected() {
        let tiny_step = resolve_titration(&titrate_args(&["-S", "titration.ph-step=1e-300"], None));
        assert!(matches!(tiny_step, Err(CliError::Config(_))));
        let infinite_end = resolve_titration(&titrate_args(&["--ph-end", "inf"], None));
        assert!(matches!(infinite_end, Err(CliError::Config(_))));
    }

    #[test]
    fn analysis_ph_comes_from_file_unless_given() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "[analysis]\nph = 4.5\n");
        let from_file = resolve_analysis(&analyze_args(&[], Some(&path))).unwrap();
        assert_eq!(from_file.ph, 4.5);

        let from_cli = resolve_analysis(&analyze_args(&["--ph", "9"], Some(&path))).unwrap();
        assert_eq!(from_cli.ph, 9.0);

        let defaulted = resolve_analysis(&analyze_args(&[], None)).unwrap();
        assert_eq!(defaulted.ph, 7.0);
    }
}
