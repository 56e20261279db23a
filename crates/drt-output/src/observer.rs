//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use drt_core::{SimConfig, SimTime};
use drt_fleet::Fleet;
use drt_sim::{ReoptRecord, SimError, SimObserver, SimReport, TraceRecord, ValidationRecord};

use crate::row::{CustomerRow, EventRow, ReoptRow, ValidationRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Rows buffered before a batch is handed to the writer.
pub const DEFAULT_BATCH_SIZE: usize = 1_024;

/// A [`SimObserver`] that writes the event trace, boarding validations,
/// re-optimisation attempts and final customer states to any
/// [`OutputWriter`] backend (CSV, SQLite, Parquet, …).
///
/// Events and validations are buffered and written in batches.  The buffers
/// are flushed on every contract violation, and the writer is finished both
/// when the run ends and when it aborts.  Errors from the writer are stored
/// internally because `SimObserver` methods have no return value.  After
/// `sim.run()` returns, check for errors with [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:          W,
    start_unix_secs: i64,
    batch_size:      usize,
    events:          Vec<EventRow>,
    validations:     Vec<ValidationRow>,
    violations:      Vec<(SimTime, String)>,
    last_error:      Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` for wall-clock
    /// conversion.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            start_unix_secs: config.start_unix_secs,
            batch_size:      DEFAULT_BATCH_SIZE,
            events:          Vec::new(),
            validations:     Vec::new(),
            violations:      Vec::new(),
            last_error:      None,
        }
    }

    /// Rows per write batch (at least one).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Contract violations reported during the run, with their event time.
    pub fn violations(&self) -> &[(SimTime, String)] {
        &self.violations
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Write all buffered events and validations now.
    pub fn flush(&mut self) {
        self.flush_events();
        self.flush_validations();
    }

    fn close(&mut self, fleet: &Fleet) {
        self.flush();
        let rows: Vec<CustomerRow> = fleet.customers().iter().map(CustomerRow::from).collect();
        let result = self.writer.write_customers(&rows);
        self.store_err(result);
        let result = self.writer.finish();
        self.store_err(result);
    }

    fn flush_events(&mut self) {
        if self.events.is_empty() {
            return;
        }
        let result = self.writer.write_events(&self.events);
        self.events.clear();
        self.store_err(result);
    }

    fn flush_validations(&mut self) {
        if self.validations.is_empty() {
            return;
        }
        let result = self.writer.write_validations(&self.validations);
        self.validations.clear();
        self.store_err(result);
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_event(&mut self, record: &TraceRecord) {
        self.events.push(EventRow::from_record(record, self.start_unix_secs));
        if self.events.len() >= self.batch_size {
            self.flush_events();
        }
    }

    fn on_validation(&mut self, record: &ValidationRecord) {
        self.validations.push(record.into());
        if self.validations.len() >= self.batch_size {
            self.flush_validations();
        }
    }

    fn on_reoptimization(&mut self, record: &ReoptRecord) {
        let result = self.writer.write_reoptimization(&record.into());
        self.store_err(result);
    }

    fn on_contract_violation(&mut self, time: SimTime, error: &SimError) {
        self.violations.push((time, error.to_string()));
        self.flush();
    }

    fn on_run_aborted(&mut self, _time: SimTime, _error: &SimError, fleet: &Fleet) {
        self.close(fleet);
    }

    fn on_sim_end(&mut self, _report: &SimReport, fleet: &Fleet) {
        self.close(fleet);
    }
}
