//! SQL migration definitions for catalogs created by modelcharts.
//!
//! Production catalogs are owned by an external schema and only read. These
//! migrations create the minimal `models` table when a catalog is opened in
//! read-write mode (fixtures, local imports).

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: models",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per catalogued model
CREATE TABLE IF NOT EXISTS models (
    model                            TEXT,
    organization                     TEXT,
    parameters                       REAL,
    training_dataset_size_datapoints REAL,
    publication_date                 TEXT,
    domain                           TEXT,
    confidence                       TEXT,
    frontier_model                   INTEGER
);

CREATE INDEX IF NOT EXISTS idx_models_publication_date ON models(publication_date);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
