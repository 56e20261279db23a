//! CSV loaders for vehicles, customer requests and fixed-schedule trips.
//!
//! # CSV formats
//!
//! `vehicles.csv` (ids are assigned in row order):
//!
//! ```csv
//! vehicle_id,capacity,speed_mps,mode,start_depot,end_depot
//! bus1,40,8.0,fixed,S1,S1
//! van1,4,10.0,flexible,S1,S9
//! ```
//!
//! `requests.csv`, one row per customer; times are seconds since the start
//! of the service day:
//!
//! ```csv
//! customer_id,request_secs,pickup,delivery,earliest,latest,prebooked
//! c1,0,S2,S5,600,2400,true
//! c2,900,S3,S1,1200,3600,false
//! ```
//!
//! `trips.csv`, one row per stop of a fixed trip, ordered by `seq`:
//!
//! ```csv
//! trip_id,vehicle_id,start_secs,seq,stop_id
//! t1,bus1,21600,0,S1
//! t1,bus1,21600,1,S2
//! ```
//!
//! Each vehicle's fixed trips are queued in `start_secs` order.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use serde::Deserialize;

use drt_core::{ServiceMode, SimTime, StopId, TimeWindow, VehicleId};
use drt_network::{NetworkError, StopNetwork};

use crate::{CustomerSpec, Fleet, FleetError, FleetResult, Trip, VehicleSpec};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct VehicleRecord {
    vehicle_id:  String,
    capacity:    u32,
    speed_mps:   f64,
    mode:        String,
    start_depot: String,
    end_depot:   String,
}

#[derive(Deserialize)]
struct RequestRecord {
    customer_id:  String,
    request_secs: u64,
    pickup:       String,
    delivery:     String,
    earliest:     u64,
    latest:       u64,
    #[serde(default)]
    prebooked:    bool,
}

#[derive(Deserialize)]
struct TripRecord {
    trip_id:    String,
    vehicle_id: String,
    start_secs: u64,
    seq:        u32,
    stop_id:    String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Add one vehicle per row.  Returns a map from the external vehicle code to
/// the assigned `VehicleId`, which [`load_trips_reader`] needs.
pub fn load_vehicles_reader<R: Read>(
    reader:  R,
    network: &StopNetwork,
    fleet:   &mut Fleet,
) -> FleetResult<HashMap<String, VehicleId>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut codes = HashMap::new();
    for result in csv_reader.deserialize::<VehicleRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        if row.capacity == 0 {
            return Err(FleetError::Parse(format!("vehicle {:?} has no seats", row.vehicle_id)));
        }
        if !(row.speed_mps.is_finite() && row.speed_mps > 0.0) {
            return Err(FleetError::Parse(format!(
                "vehicle {:?} has invalid speed {}",
                row.vehicle_id, row.speed_mps
            )));
        }
        let spec = VehicleSpec {
            capacity:    row.capacity,
            speed_mps:   row.speed_mps,
            mode:        parse_mode(&row.mode)?,
            start_depot: resolve_stop(network, &row.start_depot)?,
            end_depot:   resolve_stop(network, &row.end_depot)?,
        };
        let id = fleet.add_vehicle(spec);
        if codes.insert(row.vehicle_id.trim().to_owned(), id).is_some() {
            return Err(FleetError::Parse(format!("duplicate vehicle id {:?}", row.vehicle_id)));
        }
    }
    Ok(codes)
}

/// Add one customer per row.  Returns the number of customers added.
pub fn load_requests_reader<R: Read>(
    reader:  R,
    network: &StopNetwork,
    fleet:   &mut Fleet,
) -> FleetResult<usize> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut added = 0;
    for result in csv_reader.deserialize::<RequestRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let window = TimeWindow::secs(row.earliest, row.latest);
        if !window.is_valid() {
            return Err(FleetError::Parse(format!(
                "customer {:?} has an empty window {window}",
                row.customer_id
            )));
        }
        fleet.add_customer(CustomerSpec {
            pickup:       resolve_stop(network, &row.pickup)?,
            delivery:     resolve_stop(network, &row.delivery)?,
            window,
            request_time: SimTime(row.request_secs),
            prebooked:    row.prebooked,
        });
        added += 1;
    }
    Ok(added)
}

/// Queue fixed trips onto their vehicles.  Returns the number of trips.
pub fn load_trips_reader<R: Read>(
    reader:   R,
    network:  &StopNetwork,
    vehicles: &HashMap<String, VehicleId>,
    fleet:    &mut Fleet,
) -> FleetResult<usize> {
    struct Pending {
        vehicle: VehicleId,
        start:   u64,
        stops:   BTreeMap<u32, StopId>,
    }

    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut trips: BTreeMap<String, Pending> = BTreeMap::new();

    for result in csv_reader.deserialize::<TripRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let vehicle = *vehicles
            .get(row.vehicle_id.trim())
            .ok_or_else(|| FleetError::UnknownVehicle(row.vehicle_id.clone()))?;
        let stop = resolve_stop(network, &row.stop_id)?;
        let pending = trips.entry(row.trip_id.trim().to_owned()).or_insert(Pending {
            vehicle,
            start: row.start_secs,
            stops: BTreeMap::new(),
        });
        if pending.vehicle != vehicle || pending.start != row.start_secs {
            return Err(FleetError::Parse(format!(
                "trip {:?} rows disagree on vehicle or start time",
                row.trip_id
            )));
        }
        if pending.stops.insert(row.seq, stop).is_some() {
            return Err(FleetError::Parse(format!("trip {:?} repeats seq {}", row.trip_id, row.seq)));
        }
    }

    let mut ordered: Vec<Pending> = trips.into_values().collect();
    ordered.sort_by_key(|p| (p.vehicle, p.start));
    let count = ordered.len();
    for p in ordered {
        let stops: Vec<StopId> = p.stops.into_values().collect();
        let id = fleet.next_trip_id();
        let trip = Trip::fixed(id, &stops, SimTime(p.start))?;
        fleet.vehicle_mut(p.vehicle).enqueue_trip(trip);
    }
    Ok(count)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn resolve_stop(network: &StopNetwork, code: &str) -> FleetResult<StopId> {
    network
        .stop_by_code(code.trim())
        .ok_or_else(|| FleetError::Network(NetworkError::UnknownStop(code.to_owned())))
}

fn parse_mode(s: &str) -> FleetResult<ServiceMode> {
    match s.trim() {
        "fixed" => Ok(ServiceMode::Fixed),
        "flexible" => Ok(ServiceMode::Flexible),
        other => Err(FleetError::Parse(format!(
            "invalid mode {other:?}: expected \"fixed\" or \"flexible\""
        ))),
    }
}
