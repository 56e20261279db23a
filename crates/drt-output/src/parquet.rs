//! Parquet output backend (feature `parquet`).
//!
//! Creates four files in the configured output directory:
//! - `events.parquet`
//! - `validations.parquet`
//! - `reoptimizations.parquet`
//! - `customers.parquet`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Int64Builder, StringBuilder, UInt32Builder, UInt64Builder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{CustomerRow, EventRow, OutputError, OutputResult, ReoptRow, ValidationRow};

fn event_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("time_secs",      DataType::UInt64, false),
        Field::new("unix_time_secs", DataType::Int64,  false),
        Field::new("seq",            DataType::UInt64, false),
        Field::new("kind",           DataType::Utf8,   false),
        Field::new("vehicle",        DataType::UInt32, true),
        Field::new("customer",       DataType::UInt32, true),
        Field::new("stop",           DataType::UInt32, true),
        Field::new("description",    DataType::Utf8,   false),
    ]))
}

fn validation_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("time_secs", DataType::UInt64,  false),
        Field::new("customer",  DataType::UInt32,  false),
        Field::new("vehicle",   DataType::UInt32,  false),
        Field::new("stop",      DataType::UInt32,  false),
        Field::new("action",    DataType::Utf8,    false),
        Field::new("success",   DataType::Boolean, false),
        Field::new("reason",    DataType::Utf8,    false),
    ]))
}

fn reopt_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("time_secs", DataType::UInt64, false),
        Field::new("trigger",   DataType::Utf8,   false),
        Field::new("customers", DataType::Utf8,   false),
        Field::new("outcome",   DataType::Utf8,   false),
        Field::new("vehicles",  DataType::UInt32, false),
        Field::new("slots",     DataType::UInt32, false),
        Field::new("detail",    DataType::Utf8,   false),
    ]))
}

fn customer_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("customer",      DataType::UInt32,  false),
        Field::new("pickup",        DataType::UInt32,  false),
        Field::new("delivery",      DataType::UInt32,  false),
        Field::new("earliest_secs", DataType::UInt64,  false),
        Field::new("latest_secs",   DataType::UInt64,  false),
        Field::new("request_secs",  DataType::UInt64,  false),
        Field::new("prebooked",     DataType::Boolean, false),
        Field::new("state",         DataType::Utf8,    false),
        Field::new("vehicle",       DataType::UInt32,  true),
        Field::new("boarded_secs",  DataType::UInt64,  true),
        Field::new("alighted_secs", DataType::UInt64,  true),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// One open Parquet file and its schema.
struct Table {
    writer: Option<ArrowWriter<File>>,
    schema: Arc<Schema>,
    name:   &'static str,
}

impl Table {
    fn create(dir: &Path, name: &'static str, schema: Arc<Schema>) -> OutputResult<Self> {
        let file = File::create(dir.join(format!("{name}.parquet")))?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))?;
        Ok(Self { writer: Some(writer), schema, name })
    }

    fn write(&mut self, columns: Vec<ArrayRef>) -> OutputResult<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(OutputError::Finished(self.name));
        };
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), columns)?;
        writer.write(&batch)?;
        Ok(())
    }

    fn close(&mut self) -> OutputResult<()> {
        if let Some(w) = self.writer.take() {
            w.close()?;
        }
        Ok(())
    }
}

/// Writes simulation output to four Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footers; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    events:      Table,
    validations: Table,
    reopts:      Table,
    customers:   Table,
}

impl ParquetWriter {
    /// Create the Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            events:      Table::create(dir, "events", event_schema())?,
            validations: Table::create(dir, "validations", validation_schema())?,
            reopts:      Table::create(dir, "reoptimizations", reopt_schema())?,
            customers:   Table::create(dir, "customers", customer_schema())?,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut times        = UInt64Builder::new();
        let mut unix_times   = Int64Builder::new();
        let mut seqs         = UInt64Builder::new();
        let mut kinds        = StringBuilder::new();
        let mut vehicles     = UInt32Builder::new();
        let mut customers    = UInt32Builder::new();
        let mut stops        = UInt32Builder::new();
        let mut descriptions = StringBuilder::new();

        for row in rows {
            times.append_value(row.time_secs);
            unix_times.append_value(row.unix_time_secs);
            seqs.append_value(row.seq);
            kinds.append_value(row.kind);
            vehicles.append_option(row.vehicle);
            customers.append_option(row.customer);
            stops.append_option(row.stop);
            descriptions.append_value(&row.description);
        }

        self.events.write(vec![
            Arc::new(times.finish()),
            Arc::new(unix_times.finish()),
            Arc::new(seqs.finish()),
            Arc::new(kinds.finish()),
            Arc::new(vehicles.finish()),
            Arc::new(customers.finish()),
            Arc::new(stops.finish()),
            Arc::new(descriptions.finish()),
        ])
    }

    fn write_validations(&mut self, rows: &[ValidationRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut times     = UInt64Builder::new();
        let mut customers = UInt32Builder::new();
        let mut vehicles  = UInt32Builder::new();
        let mut stops     = UInt32Builder::new();
        let mut actions   = StringBuilder::new();
        let mut successes = BooleanBuilder::new();
        let mut reasons   = StringBuilder::new();

        for row in rows {
            times.append_value(row.time_secs);
            customers.append_value(row.customer);
            vehicles.append_value(row.vehicle);
            stops.append_value(row.stop);
            actions.append_value(row.action);
            successes.append_value(row.success);
            reasons.append_value(&row.reason);
        }

        self.validations.write(vec![
            Arc::new(times.finish()),
            Arc::new(customers.finish()),
            Arc::new(vehicles.finish()),
            Arc::new(stops.finish()),
            Arc::new(actions.finish()),
            Arc::new(successes.finish()),
            Arc::new(reasons.finish()),
        ])
    }

    fn write_reoptimization(&mut self, row: &ReoptRow) -> OutputResult<()> {
        let mut times     = UInt64Builder::new();
        let mut triggers  = StringBuilder::new();
        let mut customers = StringBuilder::new();
        let mut outcomes  = StringBuilder::new();
        let mut vehicles  = UInt32Builder::new();
        let mut slots     = UInt32Builder::new();
        let mut details   = StringBuilder::new();

        times.append_value(row.time_secs);
        triggers.append_value(row.trigger);
        customers.append_value(&row.customers);
        outcomes.append_value(row.outcome);
        vehicles.append_value(row.vehicles);
        slots.append_value(row.slots);
        details.append_value(&row.detail);

        self.reopts.write(vec![
            Arc::new(times.finish()),
            Arc::new(triggers.finish()),
            Arc::new(customers.finish()),
            Arc::new(outcomes.finish()),
            Arc::new(vehicles.finish()),
            Arc::new(slots.finish()),
            Arc::new(details.finish()),
        ])
    }

    fn write_customers(&mut self, rows: &[CustomerRow]) -> OutputResult<()> {
        let mut ids        = UInt32Builder::new();
        let mut pickups    = UInt32Builder::new();
        let mut deliveries = UInt32Builder::new();
        let mut earliest   = UInt64Builder::new();
        let mut latest     = UInt64Builder::new();
        let mut requests   = UInt64Builder::new();
        let mut prebooked  = BooleanBuilder::new();
        let mut states     = StringBuilder::new();
        let mut vehicles   = UInt32Builder::new();
        let mut boarded    = UInt64Builder::new();
        let mut alighted   = UInt64Builder::new();

        for row in rows {
            ids.append_value(row.customer);
            pickups.append_value(row.pickup);
            deliveries.append_value(row.delivery);
            earliest.append_value(row.earliest_secs);
            latest.append_value(row.latest_secs);
            requests.append_value(row.request_secs);
            prebooked.append_value(row.prebooked);
            states.append_value(row.state);
            vehicles.append_option(row.vehicle);
            boarded.append_option(row.boarded_secs);
            alighted.append_option(row.alighted_secs);
        }

        self.customers.write(vec![
            Arc::new(ids.finish()),
            Arc::new(pickups.finish()),
            Arc::new(deliveries.finish()),
            Arc::new(earliest.finish()),
            Arc::new(latest.finish()),
            Arc::new(requests.finish()),
            Arc::new(prebooked.finish()),
            Arc::new(states.finish()),
            Arc::new(vehicles.finish()),
            Arc::new(boarded.finish()),
            Arc::new(alighted.finish()),
        ])
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.events.close()?;
        self.validations.close()?;
        self.reopts.close()?;
        self.customers.close()
    }
}
