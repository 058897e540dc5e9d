//! Run configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `WEATHER_*` environment variables. Command-line flags are applied last by
//! the CLI through [`AnalysisConfig::with_overrides`].

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH, DEFAULT_DELIMITER, DEFAULT_INPUT_FILE,
    DEFAULT_OUTPUT_DIR, DEFAULT_REPORT_NAME, ENV_PREFIX,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AnalysisConfig {
    pub input: PathBuf,

    pub output_dir: PathBuf,

    pub delimiter: char,

    pub charts: bool,

    #[validate(range(min = 200, max = 8000))]
    pub chart_width: u32,

    #[validate(range(min = 200, max = 8000))]
    pub chart_height: u32,

    #[validate(length(min = 1))]
    pub report_name: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            delimiter: DEFAULT_DELIMITER,
            charts: true,
            chart_width: DEFAULT_CHART_WIDTH,
            chart_height: DEFAULT_CHART_HEIGHT,
            report_name: DEFAULT_REPORT_NAME.to_string(),
        }
    }
}

/// Explicit values from the command line; `None` leaves the layered value alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub delimiter: Option<char>,
    pub no_charts: bool,
}

impl AnalysisConfig {
    /// Build the layered configuration, optionally reading a TOML file
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let defaults = AnalysisConfig::default();
        let mut builder = Config::builder()
            .set_default("input", defaults.input.to_string_lossy().into_owned())?
            .set_default("output_dir", defaults.output_dir.to_string_lossy().into_owned())?
            .set_default("delimiter", defaults.delimiter.to_string())?
            .set_default("charts", defaults.charts)?
            .set_default("chart_width", defaults.chart_width as i64)?
            .set_default("chart_height", defaults.chart_height as i64)?
            .set_default("report_name", defaults.report_name)?;

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ProcessingError::Config(format!(
                    "Configuration file '{}' not found",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: AnalysisConfig = settings.try_deserialize()?;
        config.validated()
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(input) = overrides.input {
            self.input = input;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(delimiter) = overrides.delimiter {
            self.delimiter = delimiter;
        }
        if overrides.no_charts {
            self.charts = false;
        }
        self.validated()
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        if !self.delimiter.is_ascii() {
            return Err(ProcessingError::Config(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )));
        }
        Ok(self)
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_name)
    }
}
