//! Database schema definitions
//!
//! This module contains the fixed SQL schema of the result database. The
//! `listings` table is not part of it: its columns depend on the site and
//! are created when the final table is written.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per written shard checkpoint
CREATE TABLE IF NOT EXISTS shard_checkpoints (
    shard_index INTEGER PRIMARY KEY,
    completed_at TEXT NOT NULL,
    job_count INTEGER NOT NULL,
    record_count INTEGER NOT NULL
);

-- Job outcomes of each checkpointed shard
CREATE TABLE IF NOT EXISTS checkpoint_jobs (
    shard_index INTEGER NOT NULL REFERENCES shard_checkpoints(shard_index) ON DELETE CASCADE,
    job_index INTEGER NOT NULL,
    category TEXT NOT NULL,
    category_link TEXT,
    status TEXT NOT NULL,
    pages_expected INTEGER NOT NULL,
    pages_harvested INTEGER NOT NULL,
    attempts INTEGER NOT NULL,
    error TEXT,
    PRIMARY KEY (shard_index, job_index)
);

-- Record fields of each checkpointed job, one row per field
CREATE TABLE IF NOT EXISTS checkpoint_records (
    shard_index INTEGER NOT NULL,
    job_index INTEGER NOT NULL,
    record_index INTEGER NOT NULL,
    position INTEGER NOT NULL,
    field_name TEXT NOT NULL,
    field_value TEXT,
    PRIMARY KEY (shard_index, job_index, record_index, position),
    FOREIGN KEY (shard_index, job_index)
        REFERENCES checkpoint_jobs(shard_index, job_index) ON DELETE CASCADE
);

-- Completed runs
CREATE TABLE IF NOT EXISTS run_meta (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    complete INTEGER NOT NULL,
    partial INTEGER NOT NULL,
    skipped INTEGER NOT NULL,
    records INTEGER NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Quotes an identifier for use in dynamic SQL
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
