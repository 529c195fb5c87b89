//! End-to-end `extract` pipeline: catalog → transform → aggregate → serialize → documents.
//!
//! All charts of a run are built from one snapshot of the row source and
//! fully materialized before anything is written, so an empty chart aborts
//! the run without leaving a partial set of documents behind.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use modelcharts_artifacts::write_atomic;
use modelcharts_shared::{
    ChartDocument, ChartKind, ModelChartsError, ModelRecord, Rejected, RejectionTally, Result,
};
use modelcharts_storage::{Catalog, CatalogQuery, RowSource};

use crate::aggregate::aggregate;
use crate::serialize::serialize;
use crate::settings::ChartSettings;
use crate::stats::{ChartStats, compute_stats};
use crate::transform::transform_all;

/// File name of the chart document inside each chart directory.
pub const DOCUMENT_FILE: &str = "data.json";

/// File name of the statistics document inside each chart directory.
pub const STATS_FILE: &str = "stat.json";

/// Configuration for the `extract` pipeline.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Catalog database path.
    pub database: PathBuf,
    /// Which rows to read.
    pub query: CatalogQuery,
    /// Root output directory; each chart writes to `<output_dir>/<slug>/`.
    pub output_dir: PathBuf,
    /// Charts to build, in output order.
    pub charts: Vec<ChartKind>,
    pub settings: ChartSettings,
}

/// One chart, built in memory.
#[derive(Debug, Clone)]
pub struct ChartBuild {
    pub chart: ChartKind,
    pub document: ChartDocument,
    pub stats: ChartStats,
    pub rejected: Vec<Rejected>,
    pub tally: RejectionTally,
}

/// One chart, written to disk.
#[derive(Debug, Clone)]
pub struct ChartOutput {
    pub chart: ChartKind,
    pub data_path: PathBuf,
    pub stats_path: PathBuf,
    pub total_models: usize,
    pub domains: Vec<String>,
    pub tally: RejectionTally,
    /// SHA-256 of the chart document.
    pub sha256: String,
    pub size_bytes: usize,
}

/// Result of the `extract` pipeline.
#[derive(Debug)]
pub struct ExtractResult {
    /// Raw rows read from the source.
    pub rows_read: usize,
    pub charts: Vec<ChartOutput>,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a chart has been built in memory.
    fn chart_built(&self, chart: ChartKind, usable: usize, rejected: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &ExtractResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn chart_built(&self, _chart: ChartKind, _usable: usize, _rejected: usize) {}
    fn done(&self, _result: &ExtractResult) {}
}

/// Build one chart from a row snapshot.
///
/// Fails with `EmptyResultSet` (carrying the rejection tally) when no record
/// is usable for `chart`.
pub fn build_chart(
    records: &[ModelRecord],
    chart: ChartKind,
    settings: &ChartSettings,
) -> Result<ChartBuild> {
    let outcome = transform_all(records, chart, settings);

    let Some(aggregates) = aggregate(&outcome.usable, chart, settings) else {
        return Err(ModelChartsError::EmptyResultSet {
            chart,
            tally: outcome.tally,
        });
    };

    let document = serialize(&outcome.usable, chart, &aggregates);
    let stats = compute_stats(&outcome.usable, chart, &aggregates.domain_counts, outcome.tally);

    info!(
        %chart,
        usable = document.total_models,
        rejected = outcome.tally.total(),
        domains = document.domains.len(),
        "chart built"
    );

    Ok(ChartBuild {
        chart,
        document,
        stats,
        rejected: outcome.rejected,
        tally: outcome.tally,
    })
}

/// Run the pipeline against any row source.
#[instrument(skip_all, fields(output = %config.output_dir.display(), charts = config.charts.len()))]
pub async fn extract_from<S: RowSource + ?Sized>(
    source: &S,
    config: &ExtractConfig,
    progress: &dyn ProgressReporter,
) -> Result<ExtractResult> {
    let start = Instant::now();

    progress.phase("Reading catalog");
    let records = source.read_records(&config.query).await?;
    info!(rows = records.len(), "catalog snapshot read");

    write_charts(&records, config, progress, start)
}

/// Run the full `extract` pipeline against the catalog database.
///
/// The catalog is opened read-only and closed before any document is written.
#[instrument(skip_all, fields(database = %config.database.display()))]
pub async fn run_extract(
    config: &ExtractConfig,
    progress: &dyn ProgressReporter,
) -> Result<ExtractResult> {
    let start = Instant::now();

    progress.phase("Reading catalog");
    let records = {
        let catalog = Catalog::open_readonly(&config.database).await?;
        catalog.read_records(&config.query).await?
    };
    info!(rows = records.len(), "catalog snapshot read");

    write_charts(&records, config, progress, start)
}

fn write_charts(
    records: &[ModelRecord],
    config: &ExtractConfig,
    progress: &dyn ProgressReporter,
    start: Instant,
) -> Result<ExtractResult> {
    if config.charts.is_empty() {
        return Err(ModelChartsError::config("no charts requested"));
    }

    // --- Phase 1: build every chart in memory ---
    let mut builds = Vec::with_capacity(config.charts.len());
    for &chart in &config.charts {
        progress.phase(&format!("Building {chart}"));
        let build = build_chart(records, chart, &config.settings)?;
        progress.chart_built(chart, build.document.total_models, build.tally.total());
        builds.push(build);
    }

    // --- Phase 2: write documents ---
    progress.phase("Writing documents");
    let mut charts = Vec::with_capacity(builds.len());
    for build in &builds {
        charts.push(write_chart(&config.output_dir, build)?);
    }

    let result = ExtractResult {
        rows_read: records.len(),
        charts,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        rows = result.rows_read,
        charts = result.charts.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "extract pipeline complete"
    );

    Ok(result)
}

/// Write `data.json` and `stat.json` for one chart.
fn write_chart(output_dir: &Path, build: &ChartBuild) -> Result<ChartOutput> {
    let chart_dir = output_dir.join(build.chart.slug());
    let data_path = chart_dir.join(DOCUMENT_FILE);
    let stats_path = chart_dir.join(STATS_FILE);

    let document_json = build.document.to_canonical_json()?;
    let stats_json = serde_json::to_string_pretty(&build.stats)
        .map_err(|e| ModelChartsError::validation(format!("JSON serialization failed: {e}")))?;

    let meta = write_atomic(&data_path, &document_json)?;
    write_atomic(&stats_path, &stats_json)?;

    Ok(ChartOutput {
        chart: build.chart,
        data_path,
        stats_path,
        total_models: build.document.total_models,
        domains: build.document.domains.clone(),
        tally: build.tally,
        sha256: meta.sha256,
        size_bytes: meta.size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mc-pipeline-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn rows() -> Vec<ModelRecord> {
        vec![
            ModelRecord {
                name: Some("A".into()),
                parameters: Some(1e9),
                training_dataset_size: Some(1e12),
                publication_date: NaiveDate::from_ymd_opt(2020, 1, 1),
                raw_domain: Some("Language Model".into()),
                ..Default::default()
            },
            ModelRecord {
                name: Some("B".into()),
                parameters: Some(1e3),
                training_dataset_size: None,
                publication_date: NaiveDate::from_ymd_opt(2015, 6, 1),
                raw_domain: Some("Vision".into()),
                ..Default::default()
            },
        ]
    }

    fn config(output_dir: &Path, charts: Vec<ChartKind>) -> ExtractConfig {
        ExtractConfig {
            database: output_dir.join("unused.db"),
            query: CatalogQuery::default(),
            output_dir: output_dir.into(),
            charts,
            settings: ChartSettings::default(),
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        built: Mutex<Vec<(ChartKind, usize, usize)>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn chart_built(&self, chart: ChartKind, usable: usize, rejected: usize) {
            self.built.lock().unwrap().push((chart, usable, rejected));
        }
        fn done(&self, _result: &ExtractResult) {}
    }

    #[test]
    fn build_chart_reports_rejections() {
        let build =
            build_chart(&rows(), ChartKind::ParametersVsDatapoints, &ChartSettings::default())
                .unwrap();
        assert_eq!(build.document.total_models, 1);
        assert_eq!(build.tally.invalid_magnitude, 1);
        assert_eq!(build.rejected[0].name.as_deref(), Some("B"));
        assert_eq!(build.stats.total_models, 1);
    }

    #[test]
    fn empty_chart_is_fatal_with_tally() {
        let only_b = &rows()[1..];
        let err = build_chart(only_b, ChartKind::ParametersVsDatapoints, &ChartSettings::default())
            .unwrap_err();
        assert_eq!(err.kind(), "EmptyResultSet");
        assert!(err.to_string().contains("1 invalid magnitude"));
    }

    #[tokio::test]
    async fn extract_writes_each_chart() {
        let tmp = temp_dir();
        let records = rows();
        let progress = RecordingProgress::default();

        let result = extract_from(
            records.as_slice(),
            &config(&tmp, ChartKind::ALL.to_vec()),
            &progress,
        )
        .await
        .unwrap();

        assert_eq!(result.rows_read, 2);
        assert_eq!(result.charts.len(), 2);
        for output in &result.charts {
            assert!(output.data_path.is_file());
            assert!(output.stats_path.is_file());
            assert!(output.data_path.starts_with(tmp.join(output.chart.slug())));
        }
        // Both rows are dated with parameters, so the by-year chart keeps B.
        assert_eq!(result.charts[1].total_models, 2);

        let built = progress.built.lock().unwrap();
        assert_eq!(built[0], (ChartKind::ParametersVsDatapoints, 1, 1));
        assert_eq!(progress.phases.lock().unwrap()[0], "Reading catalog");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn empty_chart_writes_nothing() {
        let tmp = temp_dir();
        let undated = vec![ModelRecord {
            name: Some("undated".into()),
            parameters: Some(1e6),
            training_dataset_size: Some(1e9),
            ..Default::default()
        }];

        let err = extract_from(
            undated.as_slice(),
            &config(&tmp, ChartKind::ALL.to_vec()),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "EmptyResultSet");
        assert!(!tmp.join(ChartKind::ParametersVsDatapoints.slug()).exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn run_extract_requires_existing_catalog() {
        let tmp = temp_dir();
        let err = run_extract(&config(&tmp, vec![ChartKind::ParametersByYear]), &SilentProgress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "IOFailure");
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn no_charts_is_config_error() {
        let tmp = temp_dir();
        let err = extract_from(rows().as_slice(), &config(&tmp, vec![]), &SilentProgress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
