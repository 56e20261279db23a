//! dispatch — smallest end-to-end run of the rust_drt simulator.
//!
//! Generates a day of random ride requests on a synthetic eight-stop network
//! with one fixed bus line and two on-demand vans, runs the event loop with
//! the insertion oracle, and writes the trace to `output/dispatch/`.
//!
//! ```text
//! cargo run -p dispatch --release [config.json]
//! ```
//!
//! The optional JSON file holds a `SimConfig`; missing fields keep their
//! defaults.

mod network;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use drt_core::{SimConfig, SimRng};
use drt_fleet::Fleet;
use drt_network::Haversine;
use drt_output::{CsvWriter, OutputWriter, SimOutputObserver};
use drt_routing::{InsertionOracle, SnapshotBuilder, SnapshotConfig};
use drt_sim::{
    GeneratorConfig, ReoptRecord, RequestGenerator, SimBuilder, SimError, SimObserver, SimReport,
    TraceRecord, ValidationRecord,
};

use network::{build_fleet, build_network};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:            u64 = 42;
const REQUEST_COUNT:   usize = 24;
const ORACLE_BUDGET:   Duration = Duration::from_millis(50);
const OUTPUT_DIR:      &str = "output/dispatch";

// ── Observer wrapper to count rows ───────────────────────────────────────────

struct CountingObserver<W: OutputWriter> {
    inner:       SimOutputObserver<W>,
    events:      usize,
    validations: usize,
    reopts:      usize,
}

impl<W: OutputWriter> CountingObserver<W> {
    fn new(inner: SimOutputObserver<W>) -> Self {
        Self { inner, events: 0, validations: 0, reopts: 0 }
    }
}

impl<W: OutputWriter> SimObserver for CountingObserver<W> {
    fn on_event(&mut self, record: &TraceRecord) {
        self.events += 1;
        self.inner.on_event(record);
    }

    fn on_validation(&mut self, record: &ValidationRecord) {
        self.validations += 1;
        self.inner.on_validation(record);
    }

    fn on_reoptimization(&mut self, record: &ReoptRecord) {
        self.reopts += 1;
        if !record.committed() {
            println!("  {} {:?} rejected: {}", record.time, record.customers, record.detail);
        }
        self.inner.on_reoptimization(record);
    }

    fn on_contract_violation(&mut self, time: drt_core::SimTime, error: &SimError) {
        eprintln!("  contract violation at {time}: {error}");
        self.inner.on_contract_violation(time, error);
    }

    fn on_run_aborted(&mut self, time: drt_core::SimTime, error: &SimError, fleet: &Fleet) {
        self.inner.on_run_aborted(time, error, fleet);
    }

    fn on_sim_end(&mut self, report: &SimReport, fleet: &Fleet) {
        self.inner.on_sim_end(report, fleet);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn load_config() -> Result<SimConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(SimConfig { seed: SEED, start_unix_secs: 1_700_000_000, ..SimConfig::default() });
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: SimConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    Ok(config)
}

fn main() -> Result<()> {
    println!("=== dispatch — rust_drt dial-a-ride simulator ===");

    // 1. Config.
    let config = load_config()?;
    config.validate()?;
    println!(
        "Seed: {}  |  dwell {} s  |  batching: {}",
        config.seed,
        config.dwell_secs,
        config
            .dynamic_check_interval_secs
            .map_or_else(|| "off".to_owned(), |s| format!("every {s} s")),
    );

    // 2. Network, demand and fleet.
    let (network, demand) = build_network()?;
    let (mut fleet, codes) = build_fleet(&network)?;
    println!(
        "Network: {} stops, {} routes  |  Fleet: {} vehicles ({} on demand)",
        network.stop_count(),
        network.route_count(),
        fleet.vehicle_count(),
        fleet.flexible_vehicles().len(),
    );

    // 3. Requests: prefer a set the oracle can serve as a whole.
    let metric = Haversine { detour_factor: 1.3 };
    let oracle = InsertionOracle::new().with_time_budget(ORACLE_BUDGET);
    let snapshots = SnapshotBuilder::new(SnapshotConfig::from_sim_config(&config));
    let generator = RequestGenerator::new(
        &network,
        GeneratorConfig { count: REQUEST_COUNT, ..GeneratorConfig::default() },
    )
    .with_demand(&demand);
    let mut rng = SimRng::new(config.seed);
    let specs = match generator.generate_solvable(&mut rng, &fleet, &snapshots, &oracle, &metric) {
        Ok(specs) => specs,
        Err(SimError::GeneratorExhausted { attempts }) => {
            println!("No fully solvable request set in {attempts} draws; using the last draw");
            generator.generate(&mut rng)?
        }
        Err(e) => return Err(e.into()),
    };
    let prebooked = specs.iter().filter(|s| s.prebooked).count();
    for spec in specs {
        fleet.add_customer(spec);
    }
    println!("Requests: {} ({} pre-booked)", fleet.customer_count(), prebooked);
    println!();

    // 4. Build sim.
    let mut sim = SimBuilder::new(config.clone(), network, oracle, metric)
        .fleet(fleet)
        .build()?;

    // 5. Set up output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = CountingObserver::new(SimOutputObserver::new(writer, &config));

    // 6. Run.
    let t0 = Instant::now();
    let report = sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    // 7. Summary.
    println!();
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("{report}");
    println!();
    println!("  events.csv          : {} rows", obs.events);
    println!("  validations.csv     : {} rows", obs.validations);
    println!("  reoptimizations.csv : {} rows", obs.reopts);
    println!("  customers.csv       : {} rows", report.customers);
    println!();

    // 8. Per-vehicle table.
    let mut names: Vec<(&String, _)> = codes.iter().collect();
    names.sort_by_key(|(_, id)| **id);
    println!("{:<8} {:<10} {:>6} {:>8} {:>10}", "Vehicle", "Mode", "Trips", "Served", "km");
    println!("{}", "-".repeat(46));
    for (name, &id) in names {
        let v = sim.fleet.vehicle(id);
        println!(
            "{:<8} {:<10} {:>6} {:>8} {:>10.1}",
            name,
            v.mode.as_str(),
            v.trips_done(),
            v.stats.serviced,
            v.distance_m() / 1_000.0,
        );
    }

    Ok(())
}
