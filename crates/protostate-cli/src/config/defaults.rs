use protostate::core::units::DEFAULT_TEMPERATURE;
use protostate::engine::config::EnvironmentSelection;

/// Built-in values used when neither the command line nor the config file sets a parameter.
pub struct DefaultsConfig {
    pub temperature: f64,
    pub ph_start: f64,
    pub ph_end: f64,
    pub ph_step: f64,
    pub environments: EnvironmentSelection,
    pub analysis_ph: f64,
    pub symmetry_tolerance: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            ph_start: 0.0,
            ph_end: 14.0,
            ph_step: 0.5,
            environments: EnvironmentSelection::Folded,
            analysis_ph: 7.0,
            symmetry_tolerance: 1e-6,
        }
    }
}
