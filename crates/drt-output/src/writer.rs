//! The `OutputWriter` trait implemented by all backend writers.

use crate::{CustomerRow, EventRow, OutputResult, ReoptRow, ValidationRow};

/// Trait implemented by CSV, SQLite, and Parquet writers.
///
/// Errors never reach the simulation: [`SimOutputObserver`] keeps the first
/// one for [`take_error`].
///
/// [`SimOutputObserver`]: crate::SimOutputObserver
/// [`take_error`]: crate::SimOutputObserver::take_error
pub trait OutputWriter {
    /// Write a batch of handled events, in handling order.
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    /// Write a batch of board/alight attempts.
    fn write_validations(&mut self, rows: &[ValidationRow]) -> OutputResult<()>;

    /// Write one re-optimisation attempt.
    fn write_reoptimization(&mut self, row: &ReoptRow) -> OutputResult<()>;

    /// Write the final customer table.  Called once, at the end of the run.
    fn write_customers(&mut self, rows: &[CustomerRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; writes after the first call fail with
    /// [`OutputError::Finished`](crate::OutputError::Finished).
    fn finish(&mut self) -> OutputResult<()>;
}
