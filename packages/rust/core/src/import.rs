//! Load catalog rows from a JSON export into a libSQL catalog.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use modelcharts_shared::{ModelChartsError, ModelRecord, Result};
use modelcharts_storage::Catalog;

/// Result of an import run.
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub database: PathBuf,
    pub rows_inserted: usize,
    pub schema_version: u32,
}

/// Read `rows_path` (a JSON array of catalog rows, keyed by column name) and
/// append every row to the catalog at `database`, creating it if needed.
///
/// Rows are inserted as-is; validation happens at extraction time.
#[instrument(skip_all, fields(database = %database.display(), rows = %rows_path.display()))]
pub async fn run_import(database: &Path, rows_path: &Path) -> Result<ImportResult> {
    let content =
        std::fs::read_to_string(rows_path).map_err(|e| ModelChartsError::io(rows_path, e))?;
    let records: Vec<ModelRecord> = serde_json::from_str(&content).map_err(|e| {
        ModelChartsError::validation(format!("invalid rows in {}: {e}", rows_path.display()))
    })?;

    let catalog = Catalog::open(database).await?;
    for record in &records {
        catalog.insert_model(record).await?;
    }
    let schema_version = catalog.get_schema_version().await;

    info!(rows = records.len(), "catalog rows imported");

    Ok(ImportResult {
        database: database.to_path_buf(),
        rows_inserted: records.len(),
        schema_version,
    })
}
