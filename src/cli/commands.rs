use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn, Level};

use crate::cli::args::{Cli, Commands};
use crate::config::{AnalysisConfig, ConfigOverrides};
use crate::error::{ProcessingError, Result};
use crate::processors::AnalysisPipeline;
use crate::utils::progress::ProgressReporter;

/// Install the global fmt subscriber: INFO by default, DEBUG when verbose
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| ProcessingError::Config(format!("Failed to initialise logging: {}", e)))
}

fn load_config(
    config_file: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> Result<AnalysisConfig> {
    AnalysisConfig::load(config_file.as_deref())?.with_overrides(overrides)
}

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Analyze {
            input,
            output_dir,
            delimiter,
            no_charts,
            config,
        } => {
            let config = load_config(
                config,
                ConfigOverrides {
                    input,
                    output_dir,
                    delimiter,
                    no_charts,
                },
            )?;
            info!("Analyzing {}", config.input.display());

            let progress = ProgressReporter::new_spinner("Analyzing weather data...", cli.quiet);
            let pipeline = AnalysisPipeline::new(config);
            let summary = pipeline.run(&progress)?;
            progress.finish_with_message(&format!(
                "Wrote {} artifacts",
                summary.artifacts_written.len()
            ));

            if !cli.quiet {
                println!("\n{}", summary.summary());
            }

            if !summary.is_success() {
                warn!(
                    "{} artifact(s) failed, see the log for details",
                    summary.artifacts_failed.len()
                );
                return Err(ProcessingError::ArtifactsFailed {
                    failed: summary.artifacts_failed.len(),
                });
            }
        }

        Commands::Inspect {
            input,
            delimiter,
            config,
            sample,
            json,
        } => {
            let config = load_config(
                config,
                ConfigOverrides {
                    input,
                    delimiter,
                    ..ConfigOverrides::default()
                },
            )?;

            let progress = ProgressReporter::new_spinner("Inspecting input...", cli.quiet || json);
            let inspection = AnalysisPipeline::new(config).inspect(&progress, sample)?;
            progress.finish_with_message("Inspection complete");

            if json {
                println!("{}", serde_json::to_string_pretty(&inspection)?);
            } else {
                println!("\n{}", inspection.summary());
            }
        }
    }

    Ok(())
}
