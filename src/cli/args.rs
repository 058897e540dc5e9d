use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-analysis")]
#[command(about = "Clean, summarise and chart tabular weather observations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide progress output")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis and write all artifacts
    Analyze {
        #[arg(short, long, help = "Input CSV file [default: weather_1.csv]")]
        input: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output directory [default: weather_analysis_output]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(short, long, help = "Field delimiter of the input [default: ,]")]
        delimiter: Option<char>,

        #[arg(long, help = "Skip chart rendering")]
        no_charts: bool,

        #[arg(short, long, help = "TOML configuration file")]
        config: Option<PathBuf>,
    },

    /// Show detected columns and date parsing diagnostics without writing anything
    Inspect {
        #[arg(short, long, help = "Input CSV file [default: weather_1.csv]")]
        input: Option<PathBuf>,

        #[arg(short, long, help = "Field delimiter of the input [default: ,]")]
        delimiter: Option<char>,

        #[arg(short, long, help = "TOML configuration file")]
        config: Option<PathBuf>,

        #[arg(short, long, default_value = "5", help = "Number of normalized rows to show")]
        sample: usize,

        #[arg(long, help = "Print the inspection as JSON")]
        json: bool,
    },
}
