pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{cleaned_file_name, summary_file_name};
pub use progress::ProgressReporter;
