//! Core domain types for modelcharts: catalog records, derived records,
//! rejection bookkeeping, and the serialized chart document.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ModelChartsError, Result};

/// Rendered in tooltips for organization, confidence and date when absent.
pub const UNKNOWN: &str = "unknown";

/// Label for records whose domain matches no classification rule.
pub const OTHER_DOMAIN: &str = "Other";

// ---------------------------------------------------------------------------
// ModelRecord
// ---------------------------------------------------------------------------

/// One catalog entry, as read from the row source.
///
/// Deserialization also accepts the catalog column names, so exported rows
/// can be imported as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Model name (`model` column). Required; `None` or empty is rejected.
    #[serde(default, alias = "model")]
    pub name: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub parameters: Option<f64>,
    /// `training_dataset_size_datapoints` column.
    #[serde(default, alias = "training_dataset_size_datapoints")]
    pub training_dataset_size: Option<f64>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    /// Raw, possibly multi-valued `domain` column (e.g. `"Language,Vision"`).
    #[serde(default, alias = "domain")]
    pub raw_domain: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub frontier_model: Option<bool>,
}

// ---------------------------------------------------------------------------
// Era
// ---------------------------------------------------------------------------

/// Coarse historical bucket used for aggregate statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Era {
    /// Before the first boundary, or undated.
    Era1,
    Era2,
    Era3,
}

// ---------------------------------------------------------------------------
// Chart kinds and plotted fields
// ---------------------------------------------------------------------------

/// A chart variant the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    /// log10(parameters) against log10(training dataset size).
    ParametersVsDatapoints,
    /// Release year against log10(parameters).
    ParametersByYear,
}

impl ChartKind {
    /// Every chart, in the order `extract` builds them by default.
    pub const ALL: [ChartKind; 2] = [Self::ParametersVsDatapoints, Self::ParametersByYear];

    /// Stable identifier, also used as the output subdirectory name.
    pub fn slug(self) -> &'static str {
        match self {
            Self::ParametersVsDatapoints => "parameters-vs-datapoints",
            Self::ParametersByYear => "parameters-by-year",
        }
    }

    /// Field plotted on the X axis.
    pub fn x_field(self) -> PlotField {
        match self {
            Self::ParametersVsDatapoints => PlotField::LogParameters,
            Self::ParametersByYear => PlotField::ReleaseYear,
        }
    }

    /// Field plotted on the Y axis.
    pub fn y_field(self) -> PlotField {
        match self {
            Self::ParametersVsDatapoints => PlotField::LogTrainingDatasetSize,
            Self::ParametersByYear => PlotField::LogParameters,
        }
    }

    /// Source fields this chart needs, in validation order.
    pub fn required_fields(self) -> &'static [Field] {
        match self {
            Self::ParametersVsDatapoints => &[Field::Parameters, Field::TrainingDatasetSize],
            Self::ParametersByYear => &[Field::Parameters, Field::PublicationDate],
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| {
                format!(
                    "unknown chart '{s}': expected 'parameters-vs-datapoints' or 'parameters-by-year'"
                )
            })
    }
}

/// A derived coordinate a chart can plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotField {
    LogParameters,
    LogTrainingDatasetSize,
    ReleaseYear,
}

impl PlotField {
    /// Axis title for renderers.
    pub fn label(self) -> &'static str {
        match self {
            Self::LogParameters => "log10(parameters)",
            Self::LogTrainingDatasetSize => "log10(training dataset size)",
            Self::ReleaseYear => "release year",
        }
    }
}

/// Source field names referenced by rejection reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Parameters,
    TrainingDatasetSize,
    PublicationDate,
}

impl Field {
    /// Row-source column name.
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "model",
            Self::Parameters => "parameters",
            Self::TrainingDatasetSize => "training_dataset_size_datapoints",
            Self::PublicationDate => "publication_date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a record is not usable for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingField(Field),
    InvalidMagnitude(Field),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "MissingField({field})"),
            Self::InvalidMagnitude(field) => write!(f, "InvalidMagnitude({field})"),
        }
    }
}

/// A record excluded from a chart, with the first failing check.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    /// Record name, when it had one.
    pub name: Option<String>,
    pub reason: RejectReason,
}

/// Per-reason counts of rejected records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionTally {
    pub missing_field: usize,
    pub invalid_magnitude: usize,
}

impl RejectionTally {
    /// Count one rejection.
    pub fn record(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::MissingField(_) => self.missing_field += 1,
            RejectReason::InvalidMagnitude(_) => self.invalid_magnitude += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_field + self.invalid_magnitude
    }
}

impl fmt::Display for RejectionTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rejected: {} missing field, {} invalid magnitude",
            self.total(),
            self.missing_field,
            self.invalid_magnitude
        )
    }
}

// ---------------------------------------------------------------------------
// ClassifiedRecord
// ---------------------------------------------------------------------------

/// A record that passed validation for one chart, with derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub record: ModelRecord,
    pub primary_domain: String,
    pub release_year: Option<i32>,
    pub log_parameters: Option<f64>,
    pub log_training_dataset_size: Option<f64>,
    pub era: Era,
}

impl ClassifiedRecord {
    /// The validated, non-empty model name.
    pub fn name(&self) -> &str {
        self.record.name.as_deref().unwrap_or_default()
    }

    /// Value of a derived coordinate, if this record has it.
    pub fn plotted(&self, field: PlotField) -> Option<f64> {
        match field {
            PlotField::LogParameters => self.log_parameters,
            PlotField::LogTrainingDatasetSize => self.log_training_dataset_size,
            PlotField::ReleaseYear => self.release_year.map(f64::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Chart document
// ---------------------------------------------------------------------------

/// Inclusive bounds of one chart axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Usable-record count for one primary domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

/// Usable-record counts per era. `undated` records are included in `era1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraCounts {
    pub era1: usize,
    pub era2: usize,
    pub era3: usize,
    pub undated: usize,
}

/// One plotted model, with everything a tooltip shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Plotted `[x, y]` coordinates.
    pub value: [f64; 2],
    pub name: String,
    pub organization: String,
    pub parameters: f64,
    pub training_dataset_size_datapoints: Option<f64>,
    /// ISO date, or `"unknown"`.
    pub publication_date: String,
    pub confidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontier_model: Option<bool>,
}

/// All points of one primary domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Primary domain label.
    pub name: String,
    /// Renderer series type; always `"scatter"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Vec<ChartPoint>,
}

/// The serialized chart artifact (`data.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    /// Usable record count (not the raw row count).
    pub total_models: usize,
    /// Primary domains in first-seen order.
    pub domains: Vec<String>,
    /// One series per entry of `domains`, same order.
    pub series: Vec<Series>,
    pub x_axis: AxisRange,
    pub y_axis: AxisRange,
    pub domain_counts: Vec<DomainCount>,
    pub era_counts: EraCounts,
}

impl ChartDocument {
    /// Iterate over every point in document order.
    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.series.iter().flat_map(|s| s.data.iter())
    }

    /// Canonical text form: pretty-printed JSON with fixed field order.
    pub fn to_canonical_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ModelChartsError::validation(format!("JSON serialization failed: {e}"))
        })
    }

    /// Parse a document produced by [`ChartDocument::to_canonical_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ModelChartsError::validation(format!("invalid chart document: {e}")))
    }
}
