//! Chart-building logic for modelcharts.
//!
//! The pure stages run in order over one catalog snapshot:
//! [`transform`] (validate, classify, derive) → [`aggregate`] (axis ranges,
//! counts) → [`serialize`] (canonical document) and [`stats`]. The
//! [`pipeline`] module wires them to the catalog and the artifact writer.

pub mod aggregate;
pub mod classifier;
pub mod import;
pub mod pipeline;
pub mod serialize;
pub mod settings;
pub mod stats;
pub mod transform;

pub use classifier::{DomainRule, DomainRules};
pub use import::{ImportResult, run_import};
pub use pipeline::{
    ChartBuild, ChartOutput, ExtractConfig, ExtractResult, ProgressReporter, SilentProgress,
    build_chart, extract_from, run_extract,
};
pub use settings::ChartSettings;
