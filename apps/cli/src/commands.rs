//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use modelcharts_artifacts::{EmbedRequest, run_embed};
use modelcharts_core::{
    ChartSettings, ExtractConfig, ExtractResult, ProgressReporter, run_extract, run_import,
};
use modelcharts_shared::{
    AppConfig, ChartKind, ModelChartsError, init_config, load_config, load_config_from,
};
use modelcharts_storage::CatalogQuery;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// modelcharts: scaling charts from an AI model catalog.
#[derive(Parser)]
#[command(
    name = "modelcharts",
    version,
    about = "Build scatter-chart documents from an AI model catalog and embed them into standalone pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.modelcharts/modelcharts.toml).
    #[arg(long, global = true, env = "MODELCHARTS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Read the catalog and write chart documents (data.json + stat.json).
    Extract {
        /// Catalog database (overrides source.database).
        #[arg(long)]
        db: Option<PathBuf>,

        /// Output directory (overrides output.dir).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Chart to build; repeat for several. Defaults to all.
        #[arg(long = "chart", value_name = "CHART")]
        charts: Vec<ChartKind>,

        /// Catalog table (overrides source.table).
        #[arg(long)]
        table: Option<String>,

        /// File with a custom extraction query (overrides source.query_file).
        #[arg(long)]
        query_file: Option<PathBuf>,
    },

    /// Inline a chart document into a rendering template.
    Embed {
        /// Chart document produced by `extract`.
        #[arg(long)]
        data: PathBuf,

        /// Rendering template (defaults to the built-in ECharts page).
        #[arg(long)]
        template: Option<PathBuf>,

        /// Output path for the standalone page.
        #[arg(short, long)]
        out: PathBuf,

        /// Template text to replace (overrides embed.marker).
        #[arg(long)]
        marker: Option<String>,
    },

    /// Append rows from a JSON export to a catalog database.
    Import {
        /// JSON array of catalog rows.
        rows: PathBuf,

        /// Catalog database (overrides source.database).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "modelcharts=info",
        1 => "modelcharts=debug",
        _ => "modelcharts=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// One-line diagnostic for a failed command: `error[<Kind>]: <message>`.
pub(crate) fn diagnostic(report: &Report) -> String {
    match report.downcast_ref::<ModelChartsError>() {
        Some(err) => format!("error[{}]: {err}", err.kind()),
        None => format!("error: {report}"),
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Extract {
            db,
            out,
            charts,
            table,
            query_file,
        } => {
            let config = resolve_config(config_path)?;
            cmd_extract(&config, db, out, charts, table, query_file).await
        }
        Command::Embed {
            data,
            template,
            out,
            marker,
        } => {
            let config = resolve_config(config_path)?;
            cmd_embed(&config, data, template, out, marker)
        }
        Command::Import { rows, db } => {
            let config = resolve_config(config_path)?;
            cmd_import(&config, &rows, db).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load `--config` if given, otherwise the user config (or defaults).
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Catalog path from the flag, falling back to `source.database`.
fn resolve_database(config: &AppConfig, flag: Option<PathBuf>) -> Result<PathBuf> {
    flag.or_else(|| config.source.database.as_ref().map(PathBuf::from))
        .ok_or_else(|| {
            ModelChartsError::config(
                "no catalog database given: pass --db or set source.database",
            )
            .into()
        })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_extract(
    config: &AppConfig,
    db: Option<PathBuf>,
    out: Option<PathBuf>,
    charts: Vec<ChartKind>,
    table: Option<String>,
    query_file: Option<PathBuf>,
) -> Result<()> {
    let database = resolve_database(config, db)?;
    let output_dir = out.unwrap_or_else(|| PathBuf::from(&config.output.dir));
    let charts = if charts.is_empty() {
        ChartKind::ALL.to_vec()
    } else {
        charts
    };

    let query_file = query_file.or_else(|| config.source.query_file.as_ref().map(PathBuf::from));
    let query = match query_file {
        Some(path) => {
            let sql = std::fs::read_to_string(&path)
                .map_err(|e| ModelChartsError::io(&path, e))?;
            CatalogQuery::Custom(sql)
        }
        None => CatalogQuery::Table(table.unwrap_or_else(|| config.source.table.clone())),
    };

    let extract_config = ExtractConfig {
        database,
        query,
        output_dir,
        charts,
        settings: ChartSettings::from_config(config)?,
    };

    info!(
        database = %extract_config.database.display(),
        output = %extract_config.output_dir.display(),
        charts = extract_config.charts.len(),
        "extracting chart documents"
    );

    let reporter = CliProgress::new();
    let result = match run_extract(&extract_config, &reporter).await {
        Ok(result) => result,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    println!();
    println!("  Chart documents written.");
    println!("  Rows read: {}", result.rows_read);
    for chart in &result.charts {
        println!();
        println!("  {}", chart.chart);
        println!("    Models:   {}", chart.total_models);
        println!("    Rejected: {}", chart.tally);
        println!("    Domains:  {}", chart.domains.join(", "));
        println!("    Data:     {}", chart.data_path.display());
        println!("    Stats:    {}", chart.stats_path.display());
        println!("    SHA-256:  {}", chart.sha256);
    }
    println!();
    println!("  Time: {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_embed(
    config: &AppConfig,
    data: PathBuf,
    template: Option<PathBuf>,
    out: PathBuf,
    marker: Option<String>,
) -> Result<()> {
    let request = EmbedRequest {
        document_path: data,
        template_path: template,
        output_path: out,
        marker: marker.unwrap_or_else(|| config.embed.marker.clone()),
    };

    info!(document = %request.document_path.display(), "embedding chart document");

    let result = run_embed(&request)?;

    println!();
    println!("  Standalone page written.");
    println!("  Models:   {}", result.total_models);
    println!("  Template: {} bytes", result.template_bytes);
    println!("  Document: {} bytes", result.document_bytes);
    println!("  Output:   {} bytes", result.artifact.size_bytes);
    println!("  Path:     {}", result.output_path.display());
    println!("  SHA-256:  {}", result.artifact.sha256);
    println!();

    Ok(())
}

async fn cmd_import(config: &AppConfig, rows: &Path, db: Option<PathBuf>) -> Result<()> {
    let database = resolve_database(config, db)?;
    let result = run_import(&database, rows).await?;

    println!(
        "Imported {} rows into {} (schema v{})",
        result.rows_inserted,
        result.database.display(),
        result.schema_version
    );
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn chart_built(&self, chart: ChartKind, usable: usize, rejected: usize) {
        self.spinner.println(format!(
            "  built {chart}: {usable} usable, {rejected} rejected"
        ));
    }

    fn done(&self, _result: &ExtractResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::eyre;

    #[test]
    fn cli_parses_extract_flags() {
        let cli = Cli::try_parse_from([
            "modelcharts",
            "extract",
            "--db",
            "catalog.db",
            "--chart",
            "parameters-by-year",
            "--chart",
            "parameters-vs-datapoints",
        ])
        .unwrap();
        match cli.command {
            Command::Extract { db, charts, .. } => {
                assert_eq!(db, Some(PathBuf::from("catalog.db")));
                assert_eq!(
                    charts,
                    [ChartKind::ParametersByYear, ChartKind::ParametersVsDatapoints]
                );
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn cli_rejects_unknown_chart() {
        let parsed = Cli::try_parse_from(["modelcharts", "extract", "--chart", "bubble"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn diagnostic_names_error_kind() {
        let report: Report = ModelChartsError::embedding("marker not found").into();
        assert_eq!(
            diagnostic(&report),
            "error[EmbeddingError]: embedding error: marker not found"
        );
        assert_eq!(diagnostic(&eyre!("plain failure")), "error: plain failure");
    }

    #[test]
    fn database_flag_overrides_config() {
        let mut config = AppConfig::default();
        config.source.database = Some("from-config.db".into());
        assert_eq!(
            resolve_database(&config, Some("flag.db".into())).unwrap(),
            PathBuf::from("flag.db")
        );
        assert_eq!(
            resolve_database(&config, None).unwrap(),
            PathBuf::from("from-config.db")
        );
        let err = resolve_database(&AppConfig::default(), None).unwrap_err();
        assert!(diagnostic(&err).starts_with("error[ConfigError]"));
    }
}
