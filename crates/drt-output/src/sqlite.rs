//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! four tables: `events`, `validations`, `reoptimizations` and `customers`.

use std::path::Path;

use rusqlite::{Connection, params};

use crate::writer::OutputWriter;
use crate::{CustomerRow, EventRow, OutputError, OutputResult, ReoptRow, ValidationRow};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS events (
                 time_secs      INTEGER NOT NULL,
                 unix_time_secs INTEGER NOT NULL,
                 seq            INTEGER NOT NULL,
                 kind           TEXT    NOT NULL,
                 vehicle        INTEGER,
                 customer       INTEGER,
                 stop           INTEGER,
                 description    TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS validations (
                 time_secs INTEGER NOT NULL,
                 customer  INTEGER NOT NULL,
                 vehicle   INTEGER NOT NULL,
                 stop      INTEGER NOT NULL,
                 action    TEXT    NOT NULL,
                 success   INTEGER NOT NULL,
                 reason    TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS reoptimizations (
                 time_secs INTEGER NOT NULL,
                 trigger   TEXT    NOT NULL,
                 customers TEXT    NOT NULL,
                 outcome   TEXT    NOT NULL,
                 vehicles  INTEGER NOT NULL,
                 slots     INTEGER NOT NULL,
                 detail    TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS customers (
                 customer      INTEGER PRIMARY KEY,
                 pickup        INTEGER NOT NULL,
                 delivery      INTEGER NOT NULL,
                 earliest_secs INTEGER NOT NULL,
                 latest_secs   INTEGER NOT NULL,
                 request_secs  INTEGER NOT NULL,
                 prebooked     INTEGER NOT NULL,
                 state         TEXT    NOT NULL,
                 vehicle       INTEGER,
                 boarded_secs  INTEGER,
                 alighted_secs INTEGER
             );",
        )?;

        Ok(Self { conn, finished: false })
    }

    fn check_open(&self, what: &'static str) -> OutputResult<()> {
        if self.finished { Err(OutputError::Finished(what)) } else { Ok(()) }
    }
}

impl OutputWriter for SqliteWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        self.check_open("events")?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events \
                 (time_secs, unix_time_secs, seq, kind, vehicle, customer, stop, description) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.time_secs,
                    row.unix_time_secs,
                    row.seq,
                    row.kind,
                    row.vehicle,
                    row.customer,
                    row.stop,
                    row.description,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_validations(&mut self, rows: &[ValidationRow]) -> OutputResult<()> {
        self.check_open("validations")?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO validations \
                 (time_secs, customer, vehicle, stop, action, success, reason) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.time_secs,
                    row.customer,
                    row.vehicle,
                    row.stop,
                    row.action,
                    row.success as i64,
                    row.reason,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_reoptimization(&mut self, row: &ReoptRow) -> OutputResult<()> {
        self.check_open("re-optimisations")?;
        self.conn.execute(
            "INSERT INTO reoptimizations \
             (time_secs, trigger, customers, outcome, vehicles, slots, detail) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.time_secs,
                row.trigger,
                row.customers,
                row.outcome,
                row.vehicles,
                row.slots,
                row.detail,
            ],
        )?;
        Ok(())
    }

    fn write_customers(&mut self, rows: &[CustomerRow]) -> OutputResult<()> {
        self.check_open("customers")?;
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO customers \
                 (customer, pickup, delivery, earliest_secs, latest_secs, request_secs, \
                  prebooked, state, vehicle, boarded_secs, alighted_secs) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.customer,
                    row.pickup,
                    row.delivery,
                    row.earliest_secs,
                    row.latest_secs,
                    row.request_secs,
                    row.prebooked as i64,
                    row.state,
                    row.vehicle,
                    row.boarded_secs,
                    row.alighted_secs,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
