//! SQLite-backed result store.
//!
//! Each write opens the database, applies pending migrations, inserts one
//! `tests` row and one `technical_metrics` row inside a single transaction,
//! and closes the connection again. Any failure rolls the transaction back
//! and is returned as a `SinkError`; the connection is released on every
//! path because it never outlives `write`.
//!
//! # Schema
//!
//! ```text
//! tests              (id, file_kind, file_name, original_size, algorithm,
//!                     script_version, origin, executed_at, prior_comment,
//!                     char_count, input_crc32)
//! technical_metrics  (test_id -> tests.id, one column per ResultRecord field)
//! ```

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::error::SinkError;
use crate::report::RunReport;
use crate::sink::ResultSink;

const V001_INITIAL: &str = "
CREATE TABLE IF NOT EXISTS tests (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    file_kind       TEXT    NOT NULL,
    file_name       TEXT    NOT NULL,
    original_size   INTEGER NOT NULL,
    algorithm       TEXT    NOT NULL,
    script_version  TEXT    NOT NULL,
    origin          TEXT    NOT NULL,
    executed_at     TEXT    NOT NULL,
    prior_comment   TEXT    NOT NULL,
    char_count      INTEGER NOT NULL,
    input_crc32     INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tests_crc ON tests(input_crc32);

CREATE TABLE IF NOT EXISTS technical_metrics (
    test_id                     INTEGER PRIMARY KEY REFERENCES tests(id) ON DELETE CASCADE,
    final_size                  INTEGER NOT NULL,
    compression_ratio           REAL    NOT NULL,
    compression_gain            REAL    NOT NULL,
    execution_time_ms           REAL    NOT NULL,
    initial_entropy             REAL    NOT NULL,
    final_entropy               REAL    NOT NULL,
    entropy_variation           REAL    NOT NULL,
    relative_entropy_variation  REAL    NOT NULL,
    initial_redundancy          REAL    NOT NULL,
    final_redundancy            REAL    NOT NULL,
    cpu_usage_percent           REAL    NOT NULL,
    memory_delta_bytes          INTEGER NOT NULL,
    bits_per_char               INTEGER NOT NULL,
    padding_bits                INTEGER NOT NULL,
    distinct_chars              INTEGER NOT NULL,
    losses_detected             INTEGER NOT NULL,
    noise_level                 REAL    NOT NULL
);
";

/// Apply every migration newer than the database's `user_version`.
pub fn run_migrations(conn: &Connection) -> Result<(), SinkError> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| SinkError::Migration {
            version: 0,
            message: e.to_string(),
        })?;

    let migrations: &[(&str, u32)] = &[(V001_INITIAL, 1)];

    for &(sql, version) in migrations {
        if current_version < version {
            conn.execute_batch(sql)
                .and_then(|()| conn.pragma_update(None, "user_version", version))
                .map_err(|e| SinkError::Migration {
                    version,
                    message: e.to_string(),
                })?;
            tracing::info!(version, "applied migration");
        }
    }

    Ok(())
}

/// Stores reports in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: PathBuf,
}

impl SqliteSink {
    /// The database is not touched until the first `write`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, SinkError> {
        let open_err = |e: rusqlite::Error| SinkError::Open {
            location: self.path.display().to_string(),
            message: e.to_string(),
        };
        let conn = Connection::open(&self.path).map_err(open_err)?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(open_err)?;
        run_migrations(&conn)?;
        Ok(conn)
    }
}

impl ResultSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn write(&mut self, report: &RunReport) -> Result<Option<i64>, SinkError> {
        let mut conn = self.open()?;
        let id = insert_report(&mut conn, report)?;
        tracing::info!(test_id = id, database = %self.path.display(), "stored run");
        Ok(Some(id))
    }
}

/// Insert both rows for `report` in one transaction; returns `tests.id`.
pub fn insert_report(conn: &mut Connection, report: &RunReport) -> Result<i64, SinkError> {
    let tx = conn.transaction().map_err(|e| SinkError::Insert {
        table: "tests",
        message: e.to_string(),
    })?;

    let info = &report.info;
    let r = &report.record;

    tx.execute(
        "INSERT INTO tests (
            file_kind, file_name, original_size, algorithm, script_version,
            origin, executed_at, prior_comment, char_count, input_crc32
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            info.file_kind.as_str(),
            info.file_name,
            r.original_size as i64,
            info.labels.algorithm,
            info.labels.script_version,
            info.labels.origin,
            info.executed_at.to_rfc3339(),
            info.labels.comment,
            info.char_count as i64,
            info.input_crc32,
        ],
    )
    .map_err(|e| SinkError::Insert {
        table: "tests",
        message: e.to_string(),
    })?;
    let test_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO technical_metrics (
            test_id, final_size, compression_ratio, compression_gain, execution_time_ms,
            initial_entropy, final_entropy, entropy_variation, relative_entropy_variation,
            initial_redundancy, final_redundancy, cpu_usage_percent, memory_delta_bytes,
            bits_per_char, padding_bits, distinct_chars, losses_detected, noise_level
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            test_id,
            r.final_size as i64,
            r.compression_ratio,
            r.compression_gain,
            r.execution_time_ms,
            r.initial_entropy,
            r.final_entropy,
            r.entropy_variation,
            r.relative_entropy_variation,
            r.initial_redundancy,
            r.final_redundancy,
            r.cpu_usage_percent,
            r.memory_delta_bytes,
            r.bits_per_char,
            r.padding_bits,
            r.distinct_chars as i64,
            r.losses_detected,
            r.noise_level,
        ],
    )
    .map_err(|e| SinkError::Insert {
        table: "technical_metrics",
        message: e.to_string(),
    })?;

    tx.commit().map_err(|e| SinkError::Insert {
        table: "technical_metrics",
        message: format!("commit failed: {e}"),
    })?;

    Ok(test_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_write_returns_generated_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SqliteSink::new(dir.path().join("runs.db"));

        let first = sink.write(&sample_report("a.txt", "aabbbcc")).unwrap();
        let second = sink.write(&sample_report("b.txt", "zzzz")).unwrap();
        assert_eq!(first, Some(1));
        assert_eq!(second, Some(2));
    }

    #[test]
    fn test_every_record_field_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.db");
        let report = sample_report("a.txt", "aabbbcc");
        let id = SqliteSink::new(&path).write(&report).unwrap().unwrap();

        let conn = Connection::open(&path).unwrap();
        let (file_kind, original_size, crc): (String, i64, u32) = conn
            .query_row(
                "SELECT file_kind, original_size, input_crc32 FROM tests WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(file_kind, "text");
        assert_eq!(original_size, 7);
        assert_eq!(crc, report.info.input_crc32);

        let (final_size, bpc, padding, distinct, lossy, ratio): (i64, u8, u8, i64, bool, f64) = conn
            .query_row(
                "SELECT final_size, bits_per_char, padding_bits, distinct_chars,
                        losses_detected, compression_ratio
                 FROM technical_metrics WHERE test_id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .unwrap();
        assert_eq!(final_size, 2);
        assert_eq!(bpc, 2);
        assert_eq!(padding, 2);
        assert_eq!(distinct, 3);
        assert!(!lossy);
        assert_eq!(ratio, report.record.compression_ratio);

        let columns: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('technical_metrics')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        // test_id + 17 record fields (original_size lives on tests)
        assert_eq!(columns, 18);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_unopenable_path_is_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SqliteSink::new(dir.path().join("missing").join("runs.db"));
        let err = sink.write(&sample_report("a.txt", "abc")).unwrap_err();
        assert!(matches!(err, SinkError::Open { .. }));
    }

    #[test]
    fn test_failed_insert_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute_batch("DROP TABLE technical_metrics;").unwrap();

        let err = insert_report(&mut conn, &sample_report("a.txt", "abc")).unwrap_err();
        assert!(matches!(err, SinkError::Insert { table: "technical_metrics", .. }));

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM tests", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }
}
