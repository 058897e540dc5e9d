/// Default input file name, looked up in the working directory
pub const DEFAULT_INPUT_FILE: &str = "weather_1.csv";

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "weather_analysis_output";

/// Report file name
pub const DEFAULT_REPORT_NAME: &str = "report.md";

/// Prefix of the cleaned table artifact
pub const CLEANED_PREFIX: &str = "cleaned_";

/// Timestamp column of the cleaned table
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Chart file names
pub const CHART_DAILY_TEMPERATURE: &str = "daily_mean_temperature.png";
pub const CHART_MONTHLY_RAINFALL: &str = "monthly_rainfall_totals.png";
pub const CHART_HUMIDITY_SCATTER: &str = "humidity_vs_temperature_scatter.png";
pub const CHART_MONTHLY_COMBINED: &str = "monthly_temp_rainfall_combined.png";

/// Chart dimensions
pub const DEFAULT_CHART_WIDTH: u32 = 1000;
pub const DEFAULT_CHART_HEIGHT: u32 = 400;

/// Processing defaults
pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "WEATHER";
