use crate::models::{ColumnRole, ColumnRoleMap};
use tracing::{info, warn};

/// Infers semantic column roles from header names using substring matching
pub struct ColumnResolver;

impl ColumnResolver {
    pub fn new() -> Self {
        Self
    }

    /// Build the role map for a header row.
    ///
    /// Each role takes the first header (in original order) containing any of
    /// its candidate substrings, skipping headers already claimed by an earlier
    /// role. With no date-like header the first column becomes the date.
    pub fn resolve(&self, headers: &[String]) -> ColumnRoleMap {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let mut claimed = vec![false; headers.len()];
        let mut map = ColumnRoleMap::default();

        for role in ColumnRole::RESOLUTION_ORDER {
            match detect_by_substrings(&normalized, &claimed, role.candidates()) {
                Some(idx) => {
                    claimed[idx] = true;
                    map.set(role, idx, headers[idx].clone());
                }
                None if role == ColumnRole::Date && !headers.is_empty() => {
                    warn!("No obvious date column, using first column: {}", headers[0]);
                    claimed[0] = true;
                    map.set(role, 0, headers[0].clone());
                    map.date_fallback = true;
                }
                None => {}
            }
        }

        info!("Detected columns (best-effort):\n{}", map.summary());
        map
    }
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_by_substrings(normalized: &[String], claimed: &[bool], subs: &[&str]) -> Option<usize> {
    normalized
        .iter()
        .enumerate()
        .filter(|(idx, _)| !claimed[*idx])
        .find(|(_, header)| subs.iter().any(|s| header.contains(s)))
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_typical_headers() {
        let map = ColumnResolver::new().resolve(&headers(&[
            "Date",
            "Temperature (°C)",
            "Rainfall mm",
            "Humidity %",
        ]));

        assert_eq!(map.date.as_deref(), Some("Date"));
        assert_eq!(map.temperature_mean.as_deref(), Some("Temperature (°C)"));
        assert_eq!(map.rainfall.as_deref(), Some("Rainfall mm"));
        assert_eq!(map.humidity.as_deref(), Some("Humidity %"));
        assert!(map.temperature_min.is_none());
        assert!(!map.date_fallback);
    }

    #[test]
    fn test_min_max_not_taken_as_mean() {
        let map = ColumnResolver::new().resolve(&headers(&["day", "min_temp", "max_temp", "precip"]));

        assert_eq!(map.temperature_min.as_deref(), Some("min_temp"));
        assert_eq!(map.temperature_max.as_deref(), Some("max_temp"));
        assert!(map.temperature_mean.is_none());
        assert_eq!(map.rainfall.as_deref(), Some("precip"));
    }

    #[test]
    fn test_date_falls_back_to_first_column() {
        let map = ColumnResolver::new().resolve(&headers(&["day", "tmean"]));

        assert_eq!(map.date.as_deref(), Some("day"));
        assert!(map.date_fallback);
        assert_eq!(map.temperature_mean.as_deref(), Some("tmean"));
    }

    #[test]
    fn test_header_order_breaks_ties() {
        let map = ColumnResolver::new().resolve(&headers(&[
            "Observation Time",
            "Rain (gauge B)",
            "Rain (gauge A)",
        ]));

        assert_eq!(map.date.as_deref(), Some("Observation Time"));
        assert_eq!(map.rainfall.as_deref(), Some("Rain (gauge B)"));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let map = ColumnResolver::new().resolve(&headers(&["  TIMESTAMP ", " RH "]));

        assert_eq!(map.date.as_deref(), Some("  TIMESTAMP "));
        assert_eq!(map.humidity.as_deref(), Some(" RH "));
    }

    #[test]
    fn test_duplicate_headers_keep_their_positions() {
        let map = ColumnResolver::new().resolve(&headers(&["date", "max temp", "max temp"]));

        assert_eq!(map.temperature_max.as_deref(), Some("max temp"));
        assert_eq!(map.temperature_mean.as_deref(), Some("max temp"));
        assert_eq!(map.position(ColumnRole::TemperatureMax), Some(1));
        assert_eq!(map.position(ColumnRole::TemperatureMean), Some(2));
        assert_eq!(map.position(ColumnRole::Date), Some(0));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let h = headers(&["when", "Max Temp", "Min Temp", "temp", "precipitation"]);
        let resolver = ColumnResolver::new();
        assert_eq!(resolver.resolve(&h), resolver.resolve(&h));
        assert!(resolver.resolve(&h).has_numeric_role());
    }

    #[test]
    fn test_no_numeric_roles() {
        let map = ColumnResolver::new().resolve(&headers(&["date", "station"]));
        assert!(!map.has_numeric_role());
    }
}
