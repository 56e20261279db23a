//! CSV loaders for the static network: stops, routes and the demand table.
//!
//! # CSV formats
//!
//! `stops.csv`, one row per stop:
//!
//! ```csv
//! stop_id,name,lat,lon
//! S1,Depot,52.5200,13.4050
//! S2,Central,52.5251,13.3694
//! ```
//!
//! `routes.csv`, one row per stop of a route, ordered by `seq` (rows may
//! appear in any order):
//!
//! ```csv
//! route_id,seq,stop_id
//! L1,0,S1
//! L1,1,S2
//! ```
//!
//! `demand.csv`, expected requests per hour:
//!
//! ```csv
//! stop_id,route_id,hour,rate
//! S1,L1,7,12.5
//! ```
//!
//! Stop and route codes are resolved once; unknown codes are load errors.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use drt_core::GeoPoint;

use crate::{DemandTable, NetworkError, NetworkResult, StopNetwork, StopNetworkBuilder};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StopRecord {
    stop_id: String,
    name:    String,
    lat:     f64,
    lon:     f64,
}

#[derive(Deserialize)]
struct RouteRecord {
    route_id: String,
    seq:      u32,
    stop_id:  String,
}

#[derive(Deserialize)]
struct DemandRecord {
    stop_id:  String,
    route_id: String,
    hour:     u8,
    rate:     f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load stops and (optionally) routes from CSV files into a [`StopNetwork`].
pub fn load_network_csv(stops: &Path, routes: Option<&Path>) -> NetworkResult<StopNetwork> {
    let mut builder = StopNetworkBuilder::new();
    load_stops_into(&mut builder, std::fs::File::open(stops)?)?;
    if let Some(path) = routes {
        load_routes_into(&mut builder, std::fs::File::open(path)?)?;
    }
    Ok(builder.build())
}

/// Append every row of a `stops.csv` source to `builder`.  Returns the number
/// of stops added.
pub fn load_stops_into<R: Read>(builder: &mut StopNetworkBuilder, reader: R) -> NetworkResult<usize> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut added = 0;
    for result in csv_reader.deserialize::<StopRecord>() {
        let row = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        builder.add_stop(row.stop_id.trim(), &row.name, GeoPoint::new(row.lat, row.lon))?;
        added += 1;
    }
    Ok(added)
}

/// Append the routes of a `routes.csv` source to `builder`.  Stops must have
/// been loaded first.  Routes are added in order of first appearance.
pub fn load_routes_into<R: Read>(builder: &mut StopNetworkBuilder, reader: R) -> NetworkResult<usize> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut order: Vec<String> = Vec::new();
    let mut by_route: std::collections::HashMap<String, BTreeMap<u32, String>> =
        std::collections::HashMap::new();

    for result in csv_reader.deserialize::<RouteRecord>() {
        let row = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        let code = row.route_id.trim().to_owned();
        let seqs = by_route.entry(code.clone()).or_insert_with(|| {
            order.push(code.clone());
            BTreeMap::new()
        });
        if seqs.insert(row.seq, row.stop_id.trim().to_owned()).is_some() {
            return Err(NetworkError::Parse(format!(
                "route {code:?} repeats seq {}",
                row.seq
            )));
        }
    }

    for code in &order {
        let Some(seqs) = by_route.remove(code) else { continue };
        let stops = seqs
            .into_values()
            .map(|s| builder.stop_by_code(&s).ok_or(NetworkError::UnknownStop(s)))
            .collect::<NetworkResult<Vec<_>>>()?;
        builder.add_route(code, stops)?;
    }
    Ok(order.len())
}

/// Load a `demand.csv` source against an already-built network.
pub fn load_demand_reader<R: Read>(reader: R, network: &StopNetwork) -> NetworkResult<DemandTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut table = DemandTable::new();
    for result in csv_reader.deserialize::<DemandRecord>() {
        let row = result.map_err(|e| NetworkError::Parse(e.to_string()))?;
        let stop = network
            .stop_by_code(row.stop_id.trim())
            .ok_or_else(|| NetworkError::UnknownStop(row.stop_id.clone()))?;
        let route = network
            .route_by_code(row.route_id.trim())
            .ok_or_else(|| NetworkError::Parse(format!("unknown route code {:?}", row.route_id)))?;
        if row.hour > 23 {
            return Err(NetworkError::Parse(format!("hour {} out of range 0..=23", row.hour)));
        }
        if !(row.rate.is_finite() && row.rate >= 0.0) {
            return Err(NetworkError::Parse(format!("invalid demand rate {}", row.rate)));
        }
        table.add(stop, route, row.hour, row.rate);
    }
    Ok(table)
}
