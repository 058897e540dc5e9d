use std::path::Path;

use crate::models::AggregateKind;
use crate::utils::constants::CLEANED_PREFIX;

/// Name of the cleaned artifact for an input file: `cleaned_<input file name>`
pub fn cleaned_file_name(input: &Path) -> String {
    let base = input
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input.csv".to_string());
    format!("{}{}", CLEANED_PREFIX, base)
}

/// CSV file name of an aggregate view
pub fn summary_file_name(kind: AggregateKind) -> String {
    format!("{}.csv", kind.artifact_stem())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cleaned_file_name() {
        assert_eq!(
            cleaned_file_name(&PathBuf::from("data/weather_1.csv")),
            "cleaned_weather_1.csv"
        );
        assert_eq!(cleaned_file_name(Path::new("obs.txt")), "cleaned_obs.txt");
    }

    #[test]
    fn test_summary_file_name() {
        assert_eq!(summary_file_name(AggregateKind::Daily), "daily_summary.csv");
        assert_eq!(
            summary_file_name(AggregateKind::BySeason),
            "grouped_by_season.csv"
        );
    }
}
