use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic role a source column can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    TemperatureMean,
    TemperatureMin,
    TemperatureMax,
    Rainfall,
    Humidity,
}

impl ColumnRole {
    /// Order in which roles claim headers. Min/max come before the mean so that
    /// a `min_temp` header is never taken by the broader `temp` substring.
    pub const RESOLUTION_ORDER: [ColumnRole; 6] = [
        ColumnRole::Date,
        ColumnRole::TemperatureMin,
        ColumnRole::TemperatureMax,
        ColumnRole::TemperatureMean,
        ColumnRole::Rainfall,
        ColumnRole::Humidity,
    ];

    /// Lower-case substrings that mark a header as carrying this role, in priority order
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Date => &["date", "time", "observation", "timestamp"],
            ColumnRole::TemperatureMean => &["temp", "temperature", "°c", "tmean"],
            ColumnRole::TemperatureMin => &["min_temp", "mintemp", "minimum", "tmin", "min temp"],
            ColumnRole::TemperatureMax => &["max_temp", "maxtemp", "maximum", "tmax", "max temp"],
            ColumnRole::Rainfall => &["rain", "precip", "precipitation"],
            ColumnRole::Humidity => &["humid", "humidity", "rel_humidity", "rh", "%"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Date => "date",
            ColumnRole::TemperatureMean => "temperature_mean",
            ColumnRole::TemperatureMin => "temperature_min",
            ColumnRole::TemperatureMax => "temperature_max",
            ColumnRole::Rainfall => "rainfall",
            ColumnRole::Humidity => "humidity",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnRole::Date)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which original header, if any, was assigned to each role.
///
/// Built once by the column resolver; each column appears at most once.
/// Headers are kept for display, positions for reading the data, since a
/// source may repeat a header name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoleMap {
    pub date: Option<String>,
    pub temperature_mean: Option<String>,
    pub temperature_min: Option<String>,
    pub temperature_max: Option<String>,
    pub rainfall: Option<String>,
    pub humidity: Option<String>,
    /// Set when no header looked like a date and the first column was used instead
    pub date_fallback: bool,
    /// Column position of each resolved role in the source header row
    #[serde(default)]
    pub positions: BTreeMap<ColumnRole, usize>,
}

impl ColumnRoleMap {
    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::Date => self.date.as_deref(),
            ColumnRole::TemperatureMean => self.temperature_mean.as_deref(),
            ColumnRole::TemperatureMin => self.temperature_min.as_deref(),
            ColumnRole::TemperatureMax => self.temperature_max.as_deref(),
            ColumnRole::Rainfall => self.rainfall.as_deref(),
            ColumnRole::Humidity => self.humidity.as_deref(),
        }
    }

    pub fn position(&self, role: ColumnRole) -> Option<usize> {
        self.positions.get(&role).copied()
    }

    pub fn set(&mut self, role: ColumnRole, position: usize, header: String) {
        let slot = match role {
            ColumnRole::Date => &mut self.date,
            ColumnRole::TemperatureMean => &mut self.temperature_mean,
            ColumnRole::TemperatureMin => &mut self.temperature_min,
            ColumnRole::TemperatureMax => &mut self.temperature_max,
            ColumnRole::Rainfall => &mut self.rainfall,
            ColumnRole::Humidity => &mut self.humidity,
        };
        *slot = Some(header);
        self.positions.insert(role, position);
    }

    /// True when at least one numeric role was resolved from the source
    pub fn has_numeric_role(&self) -> bool {
        ColumnRole::RESOLUTION_ORDER
            .iter()
            .filter(|role| role.is_numeric())
            .any(|role| self.get(*role).is_some())
    }

    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for role in ColumnRole::RESOLUTION_ORDER {
            let value = self.get(role).unwrap_or("(unresolved)");
            lines.push(format!(" {}: {}", role, value));
        }
        if self.date_fallback {
            lines.push(" (date column fell back to the first column)".to_string());
        }
        lines.join("\n")
    }
}
