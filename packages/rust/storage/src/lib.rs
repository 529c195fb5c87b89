//! libSQL access to the model catalog.
//!
//! The [`Catalog`] struct wraps a local libSQL/SQLite database holding one row
//! per AI model and implements [`RowSource`] for the extraction pipeline.
//!
//! **Access rules:**
//! - Extraction: read-only via [`Catalog::open_readonly`]; the file must exist
//! - Fixtures and imports: read-write via [`Catalog::open`], which creates the
//!   `models` table if needed

mod migrations;

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use libsql::{Connection, Database, Value, params};
use modelcharts_shared::{ModelChartsError, ModelRecord, Result};
use tracing::{debug, warn};

/// Columns every extraction query must return, by name.
pub const CATALOG_COLUMNS: [&str; 8] = [
    "model",
    "organization",
    "parameters",
    "training_dataset_size_datapoints",
    "publication_date",
    "domain",
    "confidence",
    "frontier_model",
];

// ---------------------------------------------------------------------------
// RowSource
// ---------------------------------------------------------------------------

/// Anything that can yield the raw catalog records for one run.
#[allow(async_fn_in_trait)]
pub trait RowSource {
    /// Read every record of the snapshot.
    async fn read_records(&self, query: &CatalogQuery) -> Result<Vec<ModelRecord>>;
}

/// In-memory rows, for tests and callers that already hold the snapshot.
impl RowSource for [ModelRecord] {
    async fn read_records(&self, _query: &CatalogQuery) -> Result<Vec<ModelRecord>> {
        Ok(self.to_vec())
    }
}

/// Which rows to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    /// `SELECT <catalog columns> FROM <table>`.
    Table(String),
    /// A caller-supplied statement returning the catalog columns by name.
    Custom(String),
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self::Table("models".into())
    }
}

impl CatalogQuery {
    /// Render the SQL statement, validating the table identifier.
    pub fn to_sql(&self) -> Result<String> {
        match self {
            Self::Table(table) => {
                let valid = !table.is_empty()
                    && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                if !valid {
                    return Err(ModelChartsError::config(format!(
                        "invalid catalog table name '{table}'"
                    )));
                }
                Ok(format!(
                    "SELECT {} FROM {table}",
                    CATALOG_COLUMNS.join(", ")
                ))
            }
            Self::Custom(sql) => {
                let sql = sql.trim().trim_end_matches(';').trim();
                if sql.is_empty() {
                    return Err(ModelChartsError::config("custom catalog query is empty"));
                }
                Ok(sql.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Handle on a catalog database. The connection is released on drop.
pub struct Catalog {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Catalog {
    /// Open or create a catalog at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ModelChartsError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(ModelChartsError::storage)?;

        let conn = db.connect().map_err(ModelChartsError::storage)?;

        let catalog = Self {
            db,
            conn,
            readonly: false,
        };
        catalog.run_migrations().await?;
        Ok(catalog)
    }

    /// Open an existing catalog at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        // libSQL would silently create an empty database otherwise
        if !path.is_file() {
            return Err(ModelChartsError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "catalog database not found"),
            ));
        }

        let db = libsql::Builder::new_local(path)
            .flags(libsql::OpenFlags::SQLITE_OPEN_READ_ONLY)
            .build()
            .await
            .map_err(ModelChartsError::storage)?;

        let conn = db.connect().map_err(ModelChartsError::storage)?;

        debug!(path = %path.display(), "opened catalog read-only");

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ModelChartsError::storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    pub async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ModelChartsError::storage(
                "catalog is opened in read-only mode",
            ));
        }
        Ok(())
    }

    /// Insert one model row.
    pub async fn insert_model(&self, record: &ModelRecord) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO models (model, organization, parameters, training_dataset_size_datapoints,
                                     publication_date, domain, confidence, frontier_model)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.name.as_deref(),
                    record.organization.as_deref(),
                    record.parameters,
                    record.training_dataset_size,
                    record.publication_date.map(|d| d.to_string()),
                    record.raw_domain.as_deref(),
                    record.confidence.as_deref(),
                    record.frontier_model.map(i64::from),
                ],
            )
            .await
            .map_err(ModelChartsError::storage)?;
        Ok(())
    }

    /// Read every row returned by `query`, in the order the database yields them.
    pub async fn fetch_models(&self, query: &CatalogQuery) -> Result<Vec<ModelRecord>> {
        let sql = query.to_sql()?;
        let mut rows = self
            .conn
            .query(&sql, params![])
            .await
            .map_err(ModelChartsError::storage)?;

        let columns = resolve_columns(&rows)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(ModelChartsError::storage)? {
            results.push(row_to_record(&row, &columns)?);
        }

        debug!(rows = results.len(), "catalog rows read");
        Ok(results)
    }
}

impl RowSource for Catalog {
    async fn read_records(&self, query: &CatalogQuery) -> Result<Vec<ModelRecord>> {
        self.fetch_models(query).await
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

/// Map each catalog column name to its index in the result set.
fn resolve_columns(rows: &libsql::Rows) -> Result<HashMap<&'static str, i32>> {
    let mut by_name = HashMap::new();
    for idx in 0..rows.column_count() {
        if let Some(name) = rows.column_name(idx) {
            if let Some(column) = CATALOG_COLUMNS.iter().find(|c| **c == name) {
                by_name.insert(*column, idx);
            }
        }
    }

    let missing: Vec<&str> = CATALOG_COLUMNS
        .iter()
        .filter(|c| !by_name.contains_key(*c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ModelChartsError::storage(format!(
            "catalog query is missing columns: {}",
            missing.join(", ")
        )));
    }
    Ok(by_name)
}

/// Convert a database row to a [`ModelRecord`].
fn row_to_record(row: &libsql::Row, columns: &HashMap<&'static str, i32>) -> Result<ModelRecord> {
    let value = |name: &str| -> Result<Value> {
        row.get_value(columns[name])
            .map_err(ModelChartsError::storage)
    };

    let name = value_to_string(value("model")?);
    Ok(ModelRecord {
        organization: value_to_string(value("organization")?),
        parameters: value_to_f64(value("parameters")?, "parameters", name.as_deref()),
        training_dataset_size: value_to_f64(
            value("training_dataset_size_datapoints")?,
            "training_dataset_size_datapoints",
            name.as_deref(),
        ),
        publication_date: value_to_date(value("publication_date")?, name.as_deref()),
        raw_domain: value_to_string(value("domain")?),
        confidence: value_to_string(value("confidence")?),
        frontier_model: value_to_bool(value("frontier_model")?),
        name,
    })
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Null | Value::Blob(_) => None,
    }
}

/// Numeric columns are sometimes stored as text (`"1.5e9"`).
fn value_to_f64(value: Value, column: &str, model: Option<&str>) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(i as f64),
        Value::Real(f) => Some(f),
        Value::Text(s) if s.trim().is_empty() => None,
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(column, model, value = %s, "unparseable number, treating as absent");
                None
            }
        },
        Value::Null | Value::Blob(_) => None,
    }
}

/// Dates are ISO text; a time suffix (`2020-01-01 00:00:00`) is ignored.
fn value_to_date(value: Value, model: Option<&str>) -> Option<NaiveDate> {
    let Value::Text(s) = value else {
        return None;
    };
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let day = trimmed.get(..10).unwrap_or(trimmed);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(model, value = %s, "unparseable publication_date, treating as absent");
            None
        }
    }
}

fn value_to_bool(value: Value) -> Option<bool> {
    match value {
        Value::Integer(i) => Some(i != 0),
        Value::Real(f) => Some(f != 0.0),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Null | Value::Blob(_) => None,
    }
}
