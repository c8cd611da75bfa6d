use polars::error::PolarsError;
use thiserror::Error;

/// Largest upload the profiler accepts.
pub const MAX_FILESIZE_MB: f64 = 10.0;
/// Rows shown in the data preview.
pub const PREVIEW_ROWS: usize = 10;
/// Histograms rendered by default when the user made no selection.
pub const DEFAULT_HISTOGRAM_COLUMNS: usize = 4;
/// Categorical value counts are cut off after this many entries.
pub const VALUE_COUNT_LIMIT: usize = 15;
/// Bin count for numeric histograms.
pub const HISTOGRAM_BINS: usize = 20;
/// Scatter plots stop after this many points to keep the SVG tractable.
pub const SCATTER_POINT_LIMIT: usize = 2000;

#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("Kindly upload only .csv or .xlsx file")]
    UnsupportedFileType,
    #[error("Maximum allowed filesize is 10 MB. But received {0:.2} MB")]
    FileTooLarge(f64),
    #[error("Failed to load CSV data: {0}")]
    CsvParse(#[from] PolarsError),
    #[error("Failed to load Excel data: {0}")]
    ExcelParse(String),
    #[error("Unknown sheet \"{0}\"")]
    UnknownSheet(String),
    #[error("The uploaded file contains no data")]
    EmptyTable,
    #[error("Report generation failed: {0}")]
    Report(String),
}

/// Report rendering strategy. `Auto` hands the whole table to the report
/// generator, `Manual` renders the fixed dashboard of user-selected views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Auto,
    Manual,
}

impl Strategy {
    pub fn from_param(value: &str) -> Self {
        match value {
            "manual" => Strategy::Manual,
            _ => Strategy::Auto,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::Manual => "manual",
        }
    }
}

/// The three mutually exclusive display modes of the sidebar radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Standard,
    Minimal,
    Explorative,
}

impl DisplayMode {
    pub fn from_param(value: &str) -> Self {
        match value {
            "minimal" => DisplayMode::Minimal,
            "explorative" => DisplayMode::Explorative,
            _ => DisplayMode::Standard,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            DisplayMode::Standard => "standard",
            DisplayMode::Minimal => "minimal",
            DisplayMode::Explorative => "explorative",
        }
    }

    /// Resolve the radio plus the standalone "minimal report" checkbox into
    /// the two flags the report generator understands. The checkbox only
    /// matters in Standard mode.
    pub fn resolve(&self, minimal_checkbox: bool) -> ReportConfig {
        match self {
            DisplayMode::Minimal => ReportConfig {
                minimal: true,
                explorative: false,
            },
            DisplayMode::Explorative => ReportConfig {
                minimal: false,
                explorative: true,
            },
            DisplayMode::Standard => ReportConfig {
                minimal: minimal_checkbox,
                explorative: false,
            },
        }
    }
}

/// Depth flags handed to the report generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportConfig {
    pub minimal: bool,
    pub explorative: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_mode_overrides_checkbox() {
        let cfg = DisplayMode::Minimal.resolve(false);
        assert!(cfg.minimal);
        assert!(!cfg.explorative);
    }

    #[test]
    fn explorative_mode_is_never_minimal() {
        let cfg = DisplayMode::Explorative.resolve(true);
        assert!(!cfg.minimal);
        assert!(cfg.explorative);
    }

    #[test]
    fn standard_mode_takes_checkbox() {
        assert!(DisplayMode::Standard.resolve(true).minimal);
        assert!(!DisplayMode::Standard.resolve(false).minimal);
        assert!(!DisplayMode::Standard.resolve(true).explorative);
    }

    #[test]
    fn mode_roundtrips_through_params() {
        for mode in [
            DisplayMode::Standard,
            DisplayMode::Minimal,
            DisplayMode::Explorative,
        ] {
            assert_eq!(DisplayMode::from_param(mode.as_param()), mode);
        }
        assert_eq!(DisplayMode::from_param("???"), DisplayMode::Standard);
    }
}
