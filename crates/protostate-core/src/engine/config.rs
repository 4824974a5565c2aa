use super::microstate::Environment;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// Upper bound on the number of points of a [`PhGrid`].
pub const MAX_PH_POINTS: usize = 100_000;

/// Evenly spaced pH values from `start` to `end` inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhGrid {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl PhGrid {
    pub fn single(ph: f64) -> Self {
        Self {
            start: ph,
            end: ph,
            step: 1.0,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (parameter, value) in [
            ("ph_start", self.start),
            ("ph_end", self.end),
            ("ph_step", self.step),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    parameter,
                    reason: format!("must be a finite number, got {}", value),
                });
            }
        }
        if self.step <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "ph_step",
                reason: format!("step must be positive, got {}", self.step),
            });
        }
        if self.end < self.start {
            return Err(ConfigError::InvalidParameter {
                parameter: "ph_end",
                reason: format!(
                    "end ({}) must not be smaller than start ({})",
                    self.end, self.start
                ),
            });
        }
        self.point_count().map(|_| ())
    }

    /// Number of grid points, at most [`MAX_PH_POINTS`].
    pub fn point_count(&self) -> Result<usize, ConfigError> {
        let too_many = || ConfigError::InvalidParameter {
            parameter: "ph_step",
            reason: format!(
                "grid from {} to {} in steps of {} exceeds {} points",
                self.start, self.end, self.step, MAX_PH_POINTS
            ),
        };
        let span = ((self.end - self.start) / self.step + 1e-9).floor();
        if span.is_nan() || span < 0.0 || span >= MAX_PH_POINTS as f64 {
            return Err(too_many());
        }
        (span as usize).checked_add(1).ok_or_else(too_many)
    }

    /// Grid points, computed by multiplication so rounding does not accumulate. The end point
    /// is included when it falls on the grid up to a small tolerance.
    pub fn values(&self) -> Result<Vec<f64>, ConfigError> {
        self.validate()?;
        let count = self.point_count()?;
        Ok((0..count)
            .map(|k| self.start + k as f64 * self.step)
            .collect())
    }
}

/// Which reference environments a titration evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvironmentSelection {
    #[default]
    Folded,
    Unfolded,
    Both,
}

impl EnvironmentSelection {
    pub fn environments(&self) -> &'static [Environment] {
        match self {
            EnvironmentSelection::Folded => &[Environment::Folded],
            EnvironmentSelection::Unfolded => &[Environment::Unfolded],
            EnvironmentSelection::Both => &Environment::ALL,
        }
    }

    pub fn includes(&self, environment: Environment) -> bool {
        self.environments().contains(&environment)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitrationConfig {
    pub temperature: f64,
    pub ph_grid: PhGrid,
    pub environments: EnvironmentSelection,
    pub symmetry_tolerance: f64,
}

#[derive(Default)]
pub struct TitrationConfigBuilder {
    temperature: Option<f64>,
    ph_start: Option<f64>,
    ph_end: Option<f64>,
    ph_step: Option<f64>,
    environments: Option<EnvironmentSelection>,
    symmetry_tolerance: Option<f64>,
}

impl TitrationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn ph_start(mut self, ph: f64) -> Self {
        self.ph_start = Some(ph);
        self
    }
    pub fn ph_end(mut self, ph: f64) -> Self {
        self.ph_end = Some(ph);
        self
    }
    pub fn ph_step(mut self, step: f64) -> Self {
        self.ph_step = Some(step);
        self
    }
    pub fn environments(mut self, selection: EnvironmentSelection) -> Self {
        self.environments = Some(selection);
        self
    }
    pub fn symmetry_tolerance(mut self, tolerance: f64) -> Self {
        self.symmetry_tolerance = Some(tolerance);
        self
    }

    pub fn build(self) -> Result<TitrationConfig, ConfigError> {
        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        validate_temperature(temperature)?;

        let ph_grid = PhGrid {
            start: self.ph_start.ok_or(ConfigError::MissingParameter("ph_start"))?,
            end: self.ph_end.ok_or(ConfigError::MissingParameter("ph_end"))?,
            step: self.ph_step.ok_or(ConfigError::MissingParameter("ph_step"))?,
        };
        ph_grid.validate()?;

        Ok(TitrationConfig {
            temperature,
            ph_grid,
            environments: self.environments.unwrap_or_default(),
            symmetry_tolerance: self
                .symmetry_tolerance
                .ok_or(ConfigError::MissingParameter("symmetry_tolerance"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub temperature: f64,
    pub ph: f64,
    pub symmetry_tolerance: f64,
}

impl AnalysisConfig {
    pub fn new(temperature: f64, ph: f64, symmetry_tolerance: f64) -> Result<Self, ConfigError> {
        validate_temperature(temperature)?;
        Ok(Self {
            temperature,
            ph,
            symmetry_tolerance,
        })
    }
}

pub(crate) fn validate_temperature(temperature: f64) -> Result<(), ConfigError> {
    if temperature > 0.0 && temperature.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            parameter: "temperature",
            reason: format!("must be a positive number of Kelvin, got {}", temperature),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_builder() -> TitrationConfigBuilder {
        TitrationConfigBuilder::new()
            .temperature(298.15)
            .ph_start(2.0)
            .ph_end(4.0)
            .ph_step(0.5)
            .symmetry_tolerance(1e-6)
    }

    #[test]
    fn build_succeeds_with_all_parameters() {
        let config = complete_builder()
            .environments(EnvironmentSelection::Both)
            .build()
            .unwrap();
        assert_eq!(config.temperature, 298.15);
        assert_eq!(config.environments, EnvironmentSelection::Both);
        assert_eq!(config.ph_grid.values().unwrap(), vec![2.0, 2.5, 3.0, 3.5, 4.0]);
    }

    #[test]
    fn environments_default_to_folded() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.environments.environments(), &[Environment::Folded]);
    }

    #[test]
    fn build_fails_on_missing_temperature() {
        let result = TitrationConfigBuilder::new()
            .ph_start(0.0)
            .ph_end(1.0)
            .ph_step(1.0)
            .symmetry_tolerance(0.0)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("temperature")));
    }

    #[test]
    fn build_rejects_non_positive_step_and_inverted_range() {
        let zero_step = complete_builder().ph_step(0.0).build();
        assert!(matches!(
            zero_step,
            Err(ConfigError::InvalidParameter {
                parameter: "ph_step",
                ..
            })
        ));
        let inverted = complete_builder().ph_start(5.0).build();
        assert!(matches!(
            inverted,
            Err(ConfigError::InvalidParameter {
                parameter: "ph_end",
                ..
            })
        ));
    }

    #[test]
    fn build_rejects_non_finite_grid_bounds() {
        let infinite_end = complete_builder().ph_end(f64::INFINITY).build();
        assert!(matches!(
            infinite_end,
            Err(ConfigError::InvalidParameter {
                parameter: "ph_end",
                ..
            })
        ));
        let nan_start = complete_builder().ph_start(f64::NAN).build();
        assert!(matches!(
            nan_start,
            Err(ConfigError::InvalidParameter {
                parameter: "ph_start",
                ..
            })
        ));
        let nan_step = complete_builder().ph_step(f64::NAN).build();
        assert!(matches!(
            nan_step,
            Err(ConfigError::InvalidParameter {
                parameter: "ph_step",
                ..
            })
        ));
    }

    #[test]
    fn build_rejects_grids_with_too_many_points() {
        let tiny_step = complete_builder()
            .ph_start(0.0)
            .ph_end(14.0)
            .ph_step(1e-300)
            .build();
        assert!(matches!(
            tiny_step,
            Err(ConfigError::InvalidParameter {
                parameter: "ph_step",
                ..
            })
        ));
        let huge_span = complete_builder()
            .ph_start(-1e300)
            .ph_end(1e300)
            .ph_step(1.0)
            .build();
        assert!(huge_span.is_err());
    }

    #[test]
    fn hand_built_invalid_grid_reports_error_instead_of_points() {
        let grid = PhGrid {
            start: 0.0,
            end: f64::INFINITY,
            step: 1.0,
        };
        assert!(grid.values().is_err());
        let grid = PhGrid {
            start: 0.0,
            end: 14.0,
            step: 1e-300,
        };
        assert!(grid.point_count().is_err());
    }

    #[test]
    fn largest_allowed_grid_is_accepted() {
        let grid = PhGrid {
            start: 0.0,
            end: (MAX_PH_POINTS - 1) as f64,
            step: 1.0,
        };
        assert_eq!(grid.point_count().unwrap(), MAX_PH_POINTS);
    }

    #[test]
    fn build_rejects_non_positive_temperature() {
        let result = complete_builder().temperature(-10.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                parameter: "temperature",
                ..
            })
        ));
    }

    #[test]
    fn grid_values_include_end_despite_rounding() {
        let grid = PhGrid {
            start: 0.0,
            end: 1.0,
            step: 0.1,
        };
        let values = grid.values().unwrap();
        assert_eq!(values.len(), 11);
        assert!((values[10] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_grid_has_one_point() {
        assert_eq!(PhGrid::single(7.0).values().unwrap(), vec![7.0]);
    }

    #[test]
    fn analysis_config_validates_temperature() {
        assert!(AnalysisConfig::new(300.0, 7.0, 1e-6).is_ok());
        assert!(AnalysisConfig::new(0.0, 7.0, 1e-6).is_err());
    }

    #[test]
    fn selection_includes_reports_membership() {
        assert!(EnvironmentSelection::Both.includes(Environment::Unfolded));
        assert!(!EnvironmentSelection::Folded.includes(Environment::Unfolded));
    }
}
