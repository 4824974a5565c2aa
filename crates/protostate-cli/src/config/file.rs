use crate::error::{CliError, Result};
use protostate::engine::config::EnvironmentSelection;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileEnvironments {
    Folded,
    Unfolded,
    Both,
}

impl From<FileEnvironments> for EnvironmentSelection {
    fn from(value: FileEnvironments) -> Self {
        match value {
            FileEnvironments::Folded => EnvironmentSelection::Folded,
            FileEnvironments::Unfolded => EnvironmentSelection::Unfolded,
            FileEnvironments::Both => EnvironmentSelection::Both,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileTitrationSection {
    #[serde(rename = "ph-start")]
    pub ph_start: Option<f64>,
    #[serde(rename = "ph-end")]
    pub ph_end: Option<f64>,
    #[serde(rename = "ph-step")]
    pub ph_step: Option<f64>,
    pub environments: Option<FileEnvironments>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileAnalysisSection {
    pub ph: Option<f64>,
}

/// Run configuration as written in a TOML file; every field is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub temperature: Option<f64>,
    #[serde(rename = "symmetry-tolerance")]
    pub symmetry_tolerance: Option<f64>,
    pub titration: Option<FileTitrationSection>,
    pub analysis: Option<FileAnalysisSection>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `path` when given, otherwise starts from an empty configuration.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    pub fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let key = key.trim();
            let value_str = value_str.trim();

            match key {
                "temperature" => self.temperature = Some(parse_float(key, value_str)?),
                "symmetry-tolerance" => {
                    self.symmetry_tolerance = Some(parse_float(key, value_str)?)
                }
                "titration.ph-start" => {
                    self.titration_mut().ph_start = Some(parse_float(key, value_str)?)
                }
                "titration.ph-end" => {
                    self.titration_mut().ph_end = Some(parse_float(key, value_str)?)
                }
                "titration.ph-step" => {
                    self.titration_mut().ph_step = Some(parse_float(key, value_str)?)
                }
                "titration.environments" => {
                    let environments = match value_str {
                        "folded" => FileEnvironments::Folded,
                        "unfolded" => FileEnvironments::Unfolded,
                        "both" => FileEnvironments::Both,
                        other => {
                            return Err(CliError::Config(format!(
                                "Invalid value for {}: '{}'. Expected folded, unfolded or both.",
                                key, other
                            )));
                        }
                    };
                    self.titration_mut().environments = Some(environments);
                }
                "analysis.ph" => {
                    self.analysis
                        .get_or_insert_with(Default::default)
                        .ph = Some(parse_float(key, value_str)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn titration_mut(&mut self) -> &mut FileTitrationSection {
        self.titration.get_or_insert_with(Default::default)
    }
}

fn parse_float(key: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid float value for {}: {}", key, value)))
}
