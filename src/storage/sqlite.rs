//! SQLite sink implementation
//!
//! This module provides a SQLite-based implementation of the Sink trait.

use crate::output::{HarvestTable, RunReport};
use crate::state::PartialBatch;
use crate::storage::schema::{initialize_schema, quote_identifier};
use crate::storage::traits::{Sink, SinkResult};
use crate::storage::RunRecord;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;

/// SQLite result database
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the result database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(SinkError)` - Failed to open database
    pub fn new(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Indices of the shards that have a checkpoint, ascending
    ///
    /// A resuming run can skip these shards.
    pub fn checkpointed_shards(&self) -> SinkResult<Vec<usize>> {
        let mut stmt = self
            .conn
            .prepare("SELECT shard_index FROM shard_checkpoints ORDER BY shard_index")?;

        let shards = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(shards.into_iter().map(|shard| shard as usize).collect())
    }

    /// Number of records stored in the checkpoint of `shard_index`
    pub fn checkpoint_record_count(&self, shard_index: usize) -> SinkResult<Option<u64>> {
        let count = self
            .conn
            .query_row(
                "SELECT record_count FROM shard_checkpoints WHERE shard_index = ?1",
                params![shard_index as i64],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        Ok(count.map(|count| count as u64))
    }

    /// The most recently finished run, if any
    pub fn latest_run(&self) -> SinkResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, site, config_hash, started_at, finished_at, complete, partial, skipped, records
                 FROM run_meta ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        site: row.get(1)?,
                        config_hash: row.get(2)?,
                        started_at: row.get(3)?,
                        finished_at: row.get(4)?,
                        complete: row.get::<_, i64>(5)? as u64,
                        partial: row.get::<_, i64>(6)? as u64,
                        skipped: row.get::<_, i64>(7)? as u64,
                        records: row.get::<_, i64>(8)? as u64,
                    })
                },
            )
            .optional()?;

        Ok(run)
    }

    /// Rows in the final listings table; zero before any final write
    pub fn listing_count(&self) -> SinkResult<u64> {
        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'listings'",
            [],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(0);
        }

        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Column names of the final listings table, in table order
    pub fn listing_columns(&self) -> SinkResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM pragma_table_info('listings')")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(columns
            .into_iter()
            .filter(|column| column != "row_index")
            .collect())
    }
}

impl Sink for SqliteSink {
    fn write_batch(&mut self, batch: &PartialBatch) -> SinkResult<()> {
        let shard = batch.shard_index as i64;
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM checkpoint_records WHERE shard_index = ?1", params![shard])?;
        tx.execute("DELETE FROM checkpoint_jobs WHERE shard_index = ?1", params![shard])?;
        tx.execute(
            "INSERT INTO shard_checkpoints (shard_index, completed_at, job_count, record_count)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(shard_index) DO UPDATE SET
                completed_at = excluded.completed_at,
                job_count = excluded.job_count,
                record_count = excluded.record_count",
            params![
                shard,
                batch.completed_at.to_rfc3339(),
                batch.jobs.len() as i64,
                batch.record_count() as i64
            ],
        )?;

        {
            let mut insert_job = tx.prepare(
                "INSERT INTO checkpoint_jobs
                    (shard_index, job_index, category, category_link, status,
                     pages_expected, pages_harvested, attempts, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            let mut insert_field = tx.prepare(
                "INSERT INTO checkpoint_records
                    (shard_index, job_index, record_index, position, field_name, field_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for job in &batch.jobs {
                let job_index = job.index as i64;
                insert_job.execute(params![
                    shard,
                    job_index,
                    job.leaf.to_string(),
                    job.leaf.canonical_link(),
                    job.status.to_db_string(),
                    job.pages_expected,
                    job.pages_harvested,
                    job.attempts,
                    job.error
                ])?;

                for (record_index, record) in job.records.iter().enumerate() {
                    for (position, (name, value)) in record.fields.iter().enumerate() {
                        insert_field.execute(params![
                            shard,
                            job_index,
                            record_index as i64,
                            position as i64,
                            name,
                            value
                        ])?;
                    }
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn write_final(&mut self, table: &HarvestTable, report: &RunReport) -> SinkResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute_batch("DROP TABLE IF EXISTS listings;")?;

        let column_defs: Vec<String> = table
            .columns
            .iter()
            .map(|column| format!("{} TEXT", quote_identifier(column)))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE listings (row_index INTEGER PRIMARY KEY, {});",
            column_defs.join(", ")
        ))?;

        {
            let names: Vec<String> = table.columns.iter().map(|c| quote_identifier(c)).collect();
            let placeholders: Vec<String> =
                (1..=table.columns.len() + 1).map(|i| format!("?{}", i)).collect();
            let mut insert = tx.prepare(&format!(
                "INSERT INTO listings (row_index, {}) VALUES ({})",
                names.join(", "),
                placeholders.join(", ")
            ))?;

            for (row_index, row) in table.rows.iter().enumerate() {
                let values = std::iter::once(Value::Integer(row_index as i64)).chain(
                    row.iter().map(|cell| match cell {
                        Some(text) => Value::Text(text.clone()),
                        None => Value::Null,
                    }),
                );
                insert.execute(params_from_iter(values))?;
            }
        }

        tx.execute(
            "INSERT INTO run_meta
                (site, config_hash, started_at, finished_at, complete, partial, skipped, records)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                report.site,
                report.config_hash,
                report.started_at.to_rfc3339(),
                report.finished_at.to_rfc3339(),
                report.summary.complete as i64,
                report.summary.partial as i64,
                report.summary.skipped as i64,
                report.summary.records as i64
            ],
        )?;

        tx.commit()?;
        Ok(())
    }
}
