//! Error taxonomy shared by the loaders, the filter cascade, and the front ends.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// One of the three cascading selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterStage {
    /// Contract-power bracket.
    PowerTier,
    /// Billing-rate class.
    Tariff,
    /// Residency classification.
    Residency,
}

impl FilterStage {
    /// All stages in cascade order.
    pub const ALL: [FilterStage; 3] = [Self::PowerTier, Self::Tariff, Self::Residency];

    /// Human-readable label used in UI titles and messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::PowerTier => "power tier",
            Self::Tariff => "tariff",
            Self::Residency => "residency",
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors surfaced by the dashboard pipeline.
///
/// None of these are fatal to the process: every front end reports them and
/// stops the current interaction.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Required columns are absent from the CSV header.
    #[error("missing columns in CSV: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The configured geometry path does not exist.
    #[error("GeoJSON file \"{}\" not found", .0.display())]
    GeometryNotFound(PathBuf),

    /// The geometry file exists but is not a usable FeatureCollection.
    #[error("invalid GeoJSON in \"{}\": {message}", .path.display())]
    GeometryParse { path: PathBuf, message: String },

    /// A cascading selection has no options for the current state.
    #[error("{}", empty_filter_message(.0))]
    EmptyFilterResult(FilterStage),

    /// A requested selection value is not among the valid options.
    #[error("unknown {stage} \"{value}\", available: {}", .available.join(", "))]
    UnknownOption {
        stage: FilterStage,
        value: String,
        available: Vec<String>,
    },

    /// Reading an input or writing an output file failed.
    #[error("I/O error on \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed CSV content.
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    /// The chart backend rejected a drawing operation.
    #[error("cannot render map: {0}")]
    Render(String),

    /// Setting up, drawing to, or restoring the terminal failed.
    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),
}

impl DashboardError {
    /// Returns `true` for conditions reported as warnings rather than errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::EmptyFilterResult(_))
    }
}

fn empty_filter_message(stage: &FilterStage) -> &'static str {
    match stage {
        FilterStage::PowerTier => "no power tier available in the loaded table",
        FilterStage::Tariff => "no tariff available for the selected power tier",
        FilterStage::Residency => "no residency available for the current filters",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_names() {
        let err = DashboardError::MissingColumns(vec!["tariff".into(), "residency".into()]);
        assert_eq!(err.to_string(), "missing columns in CSV: tariff, residency");
    }

    #[test]
    fn only_empty_filter_is_warning() {
        assert!(DashboardError::EmptyFilterResult(FilterStage::Tariff).is_warning());
        assert!(!DashboardError::GeometryNotFound(PathBuf::from("x.geojson")).is_warning());
    }

    #[test]
    fn empty_filter_messages_name_the_stage() {
        let msg = DashboardError::EmptyFilterResult(FilterStage::Residency).to_string();
        assert!(msg.contains("no residency available"));
    }
}
