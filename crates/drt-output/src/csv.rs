//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `events.csv`
//! - `validations.csv`
//! - `reoptimizations.csv`
//! - `customers.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{CustomerRow, EventRow, OutputError, OutputResult, ReoptRow, ValidationRow};

pub const EVENT_HEADER: [&str; 8] =
    ["time_secs", "unix_time_secs", "seq", "kind", "vehicle", "customer", "stop", "description"];
pub const VALIDATION_HEADER: [&str; 7] =
    ["time_secs", "customer", "vehicle", "stop", "action", "success", "reason"];
pub const REOPT_HEADER: [&str; 7] =
    ["time_secs", "trigger", "customers", "outcome", "vehicles", "slots", "detail"];
pub const CUSTOMER_HEADER: [&str; 11] = [
    "customer", "pickup", "delivery", "earliest_secs", "latest_secs", "request_secs",
    "prebooked", "state", "vehicle", "boarded_secs", "alighted_secs",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes simulation output to four CSV files.
pub struct CsvWriter {
    events:      Writer<File>,
    validations: Writer<File>,
    reopts:      Writer<File>,
    customers:   Writer<File>,
    finished:    bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let open = |name: &str, header: &[&str]| -> OutputResult<Writer<File>> {
            let mut w = Writer::from_path(dir.join(name))?;
            w.write_record(header)?;
            Ok(w)
        };
        Ok(Self {
            events:      open("events.csv", &EVENT_HEADER)?,
            validations: open("validations.csv", &VALIDATION_HEADER)?,
            reopts:      open("reoptimizations.csv", &REOPT_HEADER)?,
            customers:   open("customers.csv", &CUSTOMER_HEADER)?,
            finished:    false,
        })
    }

    fn check_open(&self, what: &'static str) -> OutputResult<()> {
        if self.finished { Err(OutputError::Finished(what)) } else { Ok(()) }
    }
}

impl OutputWriter for CsvWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        self.check_open("events")?;
        for row in rows {
            self.events.write_record(&[
                row.time_secs.to_string(),
                row.unix_time_secs.to_string(),
                row.seq.to_string(),
                row.kind.to_owned(),
                opt(row.vehicle),
                opt(row.customer),
                opt(row.stop),
                row.description.clone(),
            ])?;
        }
        Ok(())
    }

    fn write_validations(&mut self, rows: &[ValidationRow]) -> OutputResult<()> {
        self.check_open("validations")?;
        for row in rows {
            self.validations.write_record(&[
                row.time_secs.to_string(),
                row.customer.to_string(),
                row.vehicle.to_string(),
                row.stop.to_string(),
                row.action.to_owned(),
                (row.success as u8).to_string(),
                row.reason.clone(),
            ])?;
        }
        Ok(())
    }

    fn write_reoptimization(&mut self, row: &ReoptRow) -> OutputResult<()> {
        self.check_open("re-optimisations")?;
        self.reopts.write_record(&[
            row.time_secs.to_string(),
            row.trigger.to_owned(),
            row.customers.clone(),
            row.outcome.to_owned(),
            row.vehicles.to_string(),
            row.slots.to_string(),
            row.detail.clone(),
        ])?;
        Ok(())
    }

    fn write_customers(&mut self, rows: &[CustomerRow]) -> OutputResult<()> {
        self.check_open("customers")?;
        for row in rows {
            self.customers.write_record(&[
                row.customer.to_string(),
                row.pickup.to_string(),
                row.delivery.to_string(),
                row.earliest_secs.to_string(),
                row.latest_secs.to_string(),
                row.request_secs.to_string(),
                (row.prebooked as u8).to_string(),
                row.state.to_owned(),
                opt(row.vehicle),
                opt(row.boarded_secs),
                opt(row.alighted_secs),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.validations.flush()?;
        self.reopts.flush()?;
        self.customers.flush()?;
        Ok(())
    }
}
