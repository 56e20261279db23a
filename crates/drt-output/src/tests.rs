//! Integration tests for drt-output.

#[cfg(test)]
mod fixtures {
    use drt_core::{GeoPoint, ServiceMode, SimConfig, SimTime, StopId, TimeWindow};
    use drt_fleet::{CustomerSpec, Fleet, VehicleSpec};
    use drt_network::{Planar, StopNetworkBuilder};
    use drt_routing::InsertionOracle;
    use drt_sim::{Sim, SimBuilder};

    use crate::row::{CustomerRow, EventRow, ReoptRow, ValidationRow};

    pub fn event_row(seq: u64) -> EventRow {
        EventRow {
            time_secs:      seq * 10,
            unix_time_secs: 1_000 + seq as i64 * 10,
            seq,
            kind:           "arrive",
            vehicle:        Some(0),
            customer:       None,
            stop:           Some(seq as u32),
            description:    format!("VehicleId(0) arrives at StopId({seq})"),
        }
    }

    pub fn validation_row(success: bool) -> ValidationRow {
        ValidationRow {
            time_secs: 70,
            customer:  1,
            vehicle:   0,
            stop:      0,
            action:    "board",
            success,
            reason:    if success { String::new() } else { "vehicle VehicleId(0) is full (1 seats)".into() },
        }
    }

    pub fn reopt_row() -> ReoptRow {
        ReoptRow {
            time_secs: 100,
            trigger:   "request",
            customers: "3 4".into(),
            outcome:   "infeasible",
            vehicles:  0,
            slots:     0,
            detail:    "no feasible route".into(),
        }
    }

    pub fn customer_rows() -> Vec<CustomerRow> {
        vec![
            CustomerRow {
                customer:      0,
                pickup:        1,
                delivery:      3,
                earliest_secs: 300,
                latest_secs:   2_000,
                request_secs:  100,
                prebooked:     false,
                state:         "alighted",
                vehicle:       Some(0),
                boarded_secs:  Some(310),
                alighted_secs: Some(530),
            },
            CustomerRow {
                customer:      1,
                pickup:        2,
                delivery:      4,
                earliest_secs: 0,
                latest_secs:   600,
                request_secs:  0,
                prebooked:     true,
                state:         "rejected",
                vehicle:       None,
                boarded_secs:  None,
                alighted_secs: None,
            },
        ]
    }

    pub fn config() -> SimConfig {
        SimConfig { default_speed_mps: 10.0, start_unix_secs: 1_000, ..SimConfig::default() }
    }

    /// One van on five stops 1 km apart with two dynamic requests.
    pub fn small_sim() -> Sim<InsertionOracle, Planar> {
        let mut b = StopNetworkBuilder::new();
        for i in 0..5 {
            b.add_stop(&format!("S{i}"), "", GeoPoint::new(0.0, 1_000.0 * i as f64)).unwrap();
        }
        let mut fleet = Fleet::new();
        fleet.add_vehicle(VehicleSpec {
            capacity:    4,
            speed_mps:   10.0,
            mode:        ServiceMode::Flexible,
            start_depot: StopId(0),
            end_depot:   StopId(0),
        });
        for (pickup, delivery, requested) in [(1, 3, 100), (2, 4, 150)] {
            fleet.add_customer(CustomerSpec {
                pickup:       StopId(pickup),
                delivery:     StopId(delivery),
                window:       TimeWindow::secs(requested + 200, requested + 3_000),
                request_time: SimTime(requested),
                prebooked:    false,
            });
        }
        SimBuilder::new(config(), b.build(), InsertionOracle::new(), Planar)
            .fleet(fleet)
            .build()
            .unwrap()
    }
}

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use super::fixtures::*;
    use crate::csv::CsvWriter;
    use crate::writer::OutputWriter;
    use crate::OutputError;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn records(dir: &TempDir, name: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(name)).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        for name in ["events.csv", "validations.csv", "reoptimizations.csv", "customers.csv"] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("validations.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, ["time_secs", "customer", "vehicle", "stop", "action", "success", "reason"]);

        let mut rdr = csv::Reader::from_path(dir.path().join("customers.csv")).unwrap();
        assert_eq!(rdr.headers().unwrap().len(), 11);
    }

    #[test]
    fn csv_events_keep_order_and_blank_missing_ids() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_events(&[event_row(0), event_row(1), event_row(2)]).unwrap();
        w.finish().unwrap();

        let rows = records(&dir, "events.csv");
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][2], "1");       // seq
        assert_eq!(&rows[1][1], "1010");    // unix time
        assert_eq!(&rows[1][3], "arrive");
        assert_eq!(&rows[1][5], "");        // no customer
        assert_eq!(&rows[2][6], "2");       // stop
    }

    #[test]
    fn csv_failed_validation_keeps_reason() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_validations(&[validation_row(true), validation_row(false)]).unwrap();
        w.write_reoptimization(&reopt_row()).unwrap();
        w.finish().unwrap();

        let rows = records(&dir, "validations.csv");
        assert_eq!(&rows[0][5], "1");
        assert_eq!(&rows[0][6], "");
        assert_eq!(&rows[1][5], "0");
        assert!(rows[1][6].contains("full"));

        let reopts = records(&dir, "reoptimizations.csv");
        assert_eq!(reopts.len(), 1);
        assert_eq!(&reopts[0][2], "3 4");
        assert_eq!(&reopts[0][3], "infeasible");
    }

    #[test]
    fn csv_customer_states() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_customers(&customer_rows()).unwrap();
        w.finish().unwrap();

        let rows = records(&dir, "customers.csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][7], "alighted");
        assert_eq!(&rows[0][10], "530");
        assert_eq!(&rows[1][7], "rejected");
        assert_eq!(&rows[1][8], "");
    }

    #[test]
    fn csv_finish_idempotent_and_final() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
        let late = w.write_events(&[event_row(0)]);
        assert!(matches!(late, Err(OutputError::Finished("events"))));
    }

    #[test]
    fn integration_csv() {
        use crate::observer::SimOutputObserver;

        let mut sim = small_sim();
        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SimOutputObserver::new(writer, &config()).with_batch_size(4);
        let report = sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");
        assert!(obs.violations().is_empty());

        let events = records(&dir, "events.csv");
        assert_eq!(events.len() as u64, report.stats.events_handled);
        let times: Vec<u64> = events.iter().map(|r| r[0].parse().unwrap()).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]), "event times must not decrease");

        let validations = records(&dir, "validations.csv");
        assert_eq!(
            validations.len() as u64,
            report.stats.boardings + report.stats.alightings + report.stats.denied_full
        );
        assert_eq!(records(&dir, "reoptimizations.csv").len() as u64, report.stats.reopt_attempts);

        let customers = records(&dir, "customers.csv");
        assert_eq!(customers.len(), report.customers);
        let served = customers.iter().filter(|r| &r[7] == "alighted").count();
        assert_eq!(served, report.served);
    }

    #[test]
    fn strict_abort_keeps_the_buffered_trace() {
        use drt_core::{CustomerId, SimTime, StopId, VehicleId};
        use drt_events::EventPayload;

        use crate::observer::SimOutputObserver;

        let mut sim = small_sim();
        sim.config.strict = true;
        // Nobody is aboard before the first pickup window opens at 300.
        sim.queue
            .insert(
                SimTime(200),
                EventPayload::CustomerAlight { customer: CustomerId(0), vehicle: VehicleId(0), stop: StopId(0) },
            )
            .unwrap();
        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SimOutputObserver::new(writer, &config());
        let err = sim.run(&mut obs).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(obs.take_error().is_none());
        assert_eq!(obs.violations().len(), 1);

        let events = records(&dir, "events.csv");
        assert!(sim.stats.events_handled >= 3, "both requests and the stray alight");
        assert_eq!(events.len() as u64, sim.stats.events_handled);
        assert_eq!(&events[events.len() - 1][0], "200");
        let validations = records(&dir, "validations.csv");
        assert!(validations.iter().any(|r| &r[5] == "0"));
        assert_eq!(records(&dir, "customers.csv").len(), 2);
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use drt_sim::NoopObserver;

    use super::fixtures::*;
    use crate::row::{CustomerRow, EventRow, ReoptRow, ValidationRow};
    use crate::writer::OutputWriter;
    use crate::{OutputError, OutputResult, SimOutputObserver};

    /// Keeps batch sizes in memory; optionally fails every event write.
    #[derive(Default)]
    struct MemoryWriter {
        event_batches: Vec<usize>,
        validations:   usize,
        reopts:        usize,
        customers:     usize,
        finished:      u32,
        fail_events:   bool,
    }

    impl OutputWriter for MemoryWriter {
        fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
            if self.fail_events {
                return Err(OutputError::Io(std::io::Error::other("disk full")));
            }
            self.event_batches.push(rows.len());
            Ok(())
        }
        fn write_validations(&mut self, rows: &[ValidationRow]) -> OutputResult<()> {
            self.validations += rows.len();
            Ok(())
        }
        fn write_reoptimization(&mut self, _row: &ReoptRow) -> OutputResult<()> {
            self.reopts += 1;
            Ok(())
        }
        fn write_customers(&mut self, rows: &[CustomerRow]) -> OutputResult<()> {
            self.customers += rows.len();
            Ok(())
        }
        fn finish(&mut self) -> OutputResult<()> {
            self.finished += 1;
            Ok(())
        }
    }

    #[test]
    fn events_are_written_in_batches() {
        let mut sim = small_sim();
        let mut obs = SimOutputObserver::new(MemoryWriter::default(), &config()).with_batch_size(5);
        let report = sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let w = obs.into_writer();
        let total: usize = w.event_batches.iter().sum();
        assert_eq!(total as u64, report.stats.events_handled);
        let (last, full) = w.event_batches.split_last().unwrap();
        assert!(full.iter().all(|&n| n == 5));
        assert!((1..=5).contains(last));
        assert_eq!(w.customers, 2);
        assert_eq!(w.reopts as u64, report.stats.reopt_attempts);
        assert_eq!(w.finished, 1);
    }

    #[test]
    fn first_write_error_is_kept() {
        let mut sim = small_sim();
        let writer = MemoryWriter { fail_events: true, ..MemoryWriter::default() };
        let mut obs = SimOutputObserver::new(writer, &config()).with_batch_size(1);
        // Write failures never stop the run.
        let report = sim.run(&mut obs).unwrap();
        assert_eq!(report.served, 2);

        let err = obs.take_error().expect("stored error");
        assert!(err.to_string().contains("disk full"));
        assert!(obs.take_error().is_none(), "taken once");
    }

    #[test]
    fn aborted_run_still_finishes_the_writer() {
        use drt_core::{CustomerId, SimTime, StopId, VehicleId};
        use drt_events::EventPayload;

        let mut sim = small_sim();
        sim.config.strict = true;
        sim.queue
            .insert(
                SimTime(120),
                EventPayload::CustomerAlight { customer: CustomerId(1), vehicle: VehicleId(0), stop: StopId(2) },
            )
            .unwrap();
        let mut obs = SimOutputObserver::new(MemoryWriter::default(), &config());
        assert!(sim.run(&mut obs).is_err());

        let w = obs.into_writer();
        assert_eq!(w.event_batches.iter().sum::<usize>() as u64, sim.stats.events_handled);
        assert_eq!(w.validations, 1);
        assert_eq!(w.customers, 2);
        assert_eq!(w.finished, 1);
    }

    #[test]
    fn flush_writes_partial_batches() {
        let mut sim = small_sim();
        let mut obs = SimOutputObserver::new(MemoryWriter::default(), &config());
        let handled = sim.run_events(2, &mut obs).unwrap();
        assert_eq!(handled, 2);
        obs.flush();
        obs.flush();
        let w = obs.into_writer();
        assert_eq!(w.event_batches, vec![2]);
        assert_eq!(w.finished, 0);
    }

    #[test]
    fn noop_and_output_observers_see_the_same_run() {
        let quiet = small_sim().run(&mut NoopObserver).unwrap();
        let mut obs = SimOutputObserver::new(MemoryWriter::default(), &config());
        let loud = small_sim().run(&mut obs).unwrap();
        assert_eq!(quiet, loud);
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use super::fixtures::*;
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn open(dir: &TempDir) -> rusqlite::Connection {
        rusqlite::Connection::open(dir.path().join("output.db")).unwrap()
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_event_count_and_nulls() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_events(&[event_row(0), event_row(1), event_row(2)]).unwrap();
        w.finish().unwrap();

        let conn = open(&dir);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 3);
        let nulls: i64 = conn
            .query_row("SELECT COUNT(*) FROM events WHERE customer IS NULL", [], |r| r.get(0))
            .unwrap();
        assert_eq!(nulls, 3);
    }

    #[test]
    fn sqlite_success_as_integer() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_validations(&[validation_row(true), validation_row(false)]).unwrap();
        w.finish().unwrap();

        let conn = open(&dir);
        let failed: i64 = conn
            .query_row("SELECT COUNT(*) FROM validations WHERE success = 0", [], |r| r.get(0))
            .unwrap();
        assert_eq!(failed, 1);
    }

    #[test]
    fn sqlite_customers_and_reopts() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_customers(&customer_rows()).unwrap();
        w.write_reoptimization(&reopt_row()).unwrap();
        w.finish().unwrap();

        let conn = open(&dir);
        let (state, alighted): (String, Option<i64>) = conn
            .query_row(
                "SELECT state, alighted_secs FROM customers WHERE customer = 0",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(state, "alighted");
        assert_eq!(alighted, Some(530));
        let vehicle: Option<i64> = conn
            .query_row("SELECT vehicle FROM customers WHERE customer = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(vehicle, None);
        let outcome: String = conn
            .query_row("SELECT outcome FROM reoptimizations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(outcome, "infeasible");
    }
}

// ── Parquet tests ─────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "parquet"))]
mod parquet_tests {
    use tempfile::TempDir;

    use arrow::datatypes::DataType;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use super::fixtures::*;
    use crate::parquet::ParquetWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn row_count(dir: &TempDir, name: &str) -> usize {
        let file = std::fs::File::open(dir.path().join(name)).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file).unwrap().build().unwrap();
        reader.map(|b| b.unwrap().num_rows()).sum()
    }

    #[test]
    fn parquet_files_created() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        for name in ["events", "validations", "reoptimizations", "customers"] {
            assert!(dir.path().join(format!("{name}.parquet")).exists());
        }
    }

    #[test]
    fn parquet_events_round_trip() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_events(&[event_row(0), event_row(1)]).unwrap();
        w.write_events(&[event_row(2)]).unwrap();
        w.finish().unwrap();
        assert_eq!(row_count(&dir, "events.parquet"), 3);

        let file = std::fs::File::open(dir.path().join("events.parquet")).unwrap();
        let schema = ParquetRecordBatchReaderBuilder::try_new(file).unwrap().schema().clone();
        let customer = schema.field_with_name("customer").unwrap();
        assert!(customer.is_nullable());
        assert_eq!(*schema.field_with_name("kind").unwrap().data_type(), DataType::Utf8);
    }

    #[test]
    fn parquet_customers_and_validations() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_customers(&customer_rows()).unwrap();
        w.write_validations(&[validation_row(false)]).unwrap();
        w.write_reoptimization(&reopt_row()).unwrap();
        w.finish().unwrap();
        assert_eq!(row_count(&dir, "customers.parquet"), 2);
        assert_eq!(row_count(&dir, "validations.parquet"), 1);
        assert_eq!(row_count(&dir, "reoptimizations.parquet"), 1);

        let file = std::fs::File::open(dir.path().join("validations.parquet")).unwrap();
        let schema = ParquetRecordBatchReaderBuilder::try_new(file).unwrap().schema().clone();
        assert_eq!(*schema.field_with_name("success").unwrap().data_type(), DataType::Boolean);
    }

    #[test]
    fn parquet_finish_required() {
        // Without finish() the footer is never written.
        let dir = tmp();
        {
            let mut w = ParquetWriter::new(dir.path()).unwrap();
            w.write_events(&[event_row(0)]).unwrap();
        }
        let file = std::fs::File::open(dir.path().join("events.parquet")).unwrap();
        assert!(ParquetRecordBatchReaderBuilder::try_new(file).is_err());
    }
}
