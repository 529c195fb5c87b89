//! Application configuration for modelcharts.
//!
//! User config lives at `~/.modelcharts/modelcharts.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ModelChartsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "modelcharts.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".modelcharts";

/// Marker the stock templates use to fetch `data.json` at runtime.
pub const DEFAULT_EMBED_MARKER: &str = "fetch('data.json').then((response) => response.json())";

// ---------------------------------------------------------------------------
// Config structs (matching modelcharts.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog database settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Where chart documents are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Domain classification rules.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Era boundaries.
    #[serde(default)]
    pub eras: EraConfig,

    /// Axis padding.
    #[serde(default)]
    pub axes: AxesConfig,

    /// Standalone embedding.
    #[serde(default)]
    pub embed: EmbedConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the catalog database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Table holding one row per model.
    #[serde(default = "default_table")]
    pub table: String,

    /// Optional file with a custom extraction query. It must return the
    /// eight catalog columns by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_file: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database: None,
            table: default_table(),
            query_file: None,
        }
    }
}

fn default_table() -> String {
    "models".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory; each chart gets `<dir>/<chart>/data.json`.
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "charts".into()
}

/// `[classifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Ordered rules; the first pattern contained in the raw domain wins.
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

/// One `{ pattern, label }` classification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Case-sensitive substring searched for in the raw domain.
    pub pattern: String,
    /// Primary domain assigned on match.
    pub label: String,
}

fn default_rules() -> Vec<RuleConfig> {
    [
        "Language",
        "Vision",
        "Multimodal",
        "Audio",
        "Video",
        "Mathematics",
        "Code",
        "Reasoning",
    ]
    .into_iter()
    .map(|label| RuleConfig {
        pattern: label.into(),
        label: label.into(),
    })
    .collect()
}

/// `[eras]` section. Lower bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraConfig {
    #[serde(default = "default_era2_start")]
    pub era2_start: NaiveDate,

    #[serde(default = "default_era3_start")]
    pub era3_start: NaiveDate,
}

impl Default for EraConfig {
    fn default() -> Self {
        Self {
            era2_start: default_era2_start(),
            era3_start: default_era3_start(),
        }
    }
}

fn default_era2_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 1, 1).unwrap_or_default()
}
fn default_era3_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default()
}

/// `[axes]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxesConfig {
    /// Extra units added beyond an extremum that lands exactly on an integer.
    #[serde(default = "default_margin")]
    pub margin: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
        }
    }
}

fn default_margin() -> f64 {
    1.0
}

/// `[embed]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Exact text in the template that loads the document at runtime.
    #[serde(default = "default_marker")]
    pub marker: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

fn default_marker() -> String {
    DEFAULT_EMBED_MARKER.into()
}

impl AppConfig {
    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.eras.era2_start >= self.eras.era3_start {
            return Err(ModelChartsError::config(format!(
                "eras.era2_start ({}) must be before eras.era3_start ({})",
                self.eras.era2_start, self.eras.era3_start
            )));
        }
        if !self.axes.margin.is_finite() || self.axes.margin < 0.0 {
            return Err(ModelChartsError::config(format!(
                "axes.margin must be a non-negative number, got {}",
                self.axes.margin
            )));
        }
        if self.embed.marker.is_empty() {
            return Err(ModelChartsError::config("embed.marker must not be empty"));
        }
        if self.classifier.rules.iter().any(|r| r.pattern.is_empty()) {
            return Err(ModelChartsError::config(
                "classifier rule patterns must not be empty",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.modelcharts/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ModelChartsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.modelcharts/modelcharts.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelChartsError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ModelChartsError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ModelChartsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ModelChartsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ModelChartsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
