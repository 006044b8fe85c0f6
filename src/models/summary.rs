//! Daily summary row materialized by the table sink

use serde::{Deserialize, Serialize};

/// One row of the tabular output
///
/// History rows carry the day's aggregate temperatures; the current
/// snapshot repeats the instantaneous temperature in all three columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// `YYYY-MM-DD` for history rows, the location's local time for snapshots
    pub date: String,
    pub location: Option<String>,
    pub country: Option<String>,
    pub avg_temp_c: Option<f64>,
    pub max_temp_c: Option<f64>,
    pub min_temp_c: Option<f64>,
    pub condition: Option<String>,
}

impl DailySummary {
    /// Column names in serialization order
    pub const HEADERS: [&'static str; 7] = [
        "date",
        "location",
        "country",
        "avg_temp_c",
        "max_temp_c",
        "min_temp_c",
        "condition",
    ];

    /// Format the temperature range for log lines
    #[must_use]
    pub fn format_temperature(&self) -> String {
        match (self.min_temp_c, self.avg_temp_c, self.max_temp_c) {
            (Some(min), Some(avg), Some(max)) => format!("{avg:.1}°C ({min:.1}..{max:.1})"),
            (_, Some(avg), _) => format!("{avg:.1}°C"),
            _ => "n/a".to_string(),
        }
    }
}
