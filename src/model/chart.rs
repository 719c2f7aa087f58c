//! Chart types.

use serde::{Deserialize, Serialize};

/// Chart payload.
///
/// `series_values[s][c]` is the value of series `s` at category `c`;
/// categories line up with `axis_labels` and series with `series_names`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartContent {
    /// Chart type reported by the service (e.g. "bar", "line")
    pub chart_type: String,

    /// Chart title
    pub title: String,

    /// Category labels
    pub axis_labels: Vec<String>,

    /// Series names
    pub series_names: Vec<String>,

    /// Series values, outer index = series, inner index = category
    pub series_values: Vec<Vec<Option<f64>>>,

    /// CSV rendering
    pub csv: String,
}

impl ChartContent {
    /// Number of series.
    pub fn series_count(&self) -> usize {
        self.series_values.len()
    }

    /// Pair a series' values with the category labels.
    ///
    /// Categories past the end of `axis_labels` get an empty label.
    pub fn series(&self, index: usize) -> Option<Vec<(&str, Option<f64>)>> {
        let values = self.series_values.get(index)?;
        Some(
            values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let label = self.axis_labels.get(i).map(String::as_str).unwrap_or("");
                    (label, *value)
                })
                .collect(),
        )
    }
}
