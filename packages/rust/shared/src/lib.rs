//! Shared types, error model, and configuration for modelcharts.
//!
//! This crate is the foundation depended on by all other modelcharts crates.
//! It provides:
//! - [`ModelChartsError`], the unified error type
//! - Domain types ([`ModelRecord`], [`ClassifiedRecord`], [`ChartDocument`], [`ChartKind`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AxesConfig, ClassifierConfig, DEFAULT_EMBED_MARKER, EmbedConfig, EraConfig,
    OutputConfig, RuleConfig, SourceConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{ModelChartsError, Result};
pub use types::{
    AxisRange, ChartDocument, ChartKind, ChartPoint, ClassifiedRecord, DomainCount, Era,
    EraCounts, Field, ModelRecord, OTHER_DOMAIN, PlotField, RejectReason, Rejected,
    RejectionTally, Series, UNKNOWN,
};
