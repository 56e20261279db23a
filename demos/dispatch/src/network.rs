//! Synthetic stop network, demand and fleet for the dispatch demo.
//!
//! Eight stops loosely placed on the geography of Mobile, Alabama, one
//! fixed bus line through downtown and two on-demand vans.  Everything is
//! embedded CSV so the demo exercises the same loaders a real run uses.

use std::collections::HashMap;
use std::io::Cursor;

use anyhow::Result;

use drt_core::VehicleId;
use drt_fleet::{Fleet, load_trips_reader, load_vehicles_reader};
use drt_network::{
    DemandTable, StopNetwork, StopNetworkBuilder, load_demand_reader, load_routes_into,
    load_stops_into,
};

const STOPS_CSV: &str = "\
stop_id,name,lat,lon
DEPOT,Bus depot,30.6900,-88.0600
NRES,North residential,30.7100,-88.0700
MIDT,Midtown,30.6850,-88.0800
DTWN,Downtown,30.6950,-88.0450
CPRK,Commerce park,30.7000,-88.0300
SRES,South residential,30.6700,-88.0300
HOSP,Hospital,30.6800,-88.0650
UNIV,University,30.6960,-88.1750
";

const ROUTES_CSV: &str = "\
route_id,seq,stop_id
L1,0,NRES
L1,1,HOSP
L1,2,DTWN
L1,3,CPRK
L1,4,SRES
";

const DEMAND_CSV: &str = "\
stop_id,route_id,hour,rate
NRES,L1,0,6.0
NRES,L1,1,8.0
HOSP,L1,1,3.0
DTWN,L1,2,5.0
DTWN,L1,3,9.0
SRES,L1,0,4.0
CPRK,L1,3,2.0
";

const VEHICLES_CSV: &str = "\
vehicle_id,capacity,speed_mps,mode,start_depot,end_depot
bus1,30,8.0,fixed,NRES,SRES
van1,4,9.0,flexible,DEPOT,DEPOT
van2,4,9.0,flexible,DEPOT,DEPOT
";

const TRIPS_CSV: &str = "\
trip_id,vehicle_id,start_secs,seq,stop_id
out1,bus1,900,0,NRES
out1,bus1,900,1,HOSP
out1,bus1,900,2,DTWN
out1,bus1,900,3,CPRK
out1,bus1,900,4,SRES
back1,bus1,4500,0,SRES
back1,bus1,4500,1,CPRK
back1,bus1,4500,2,DTWN
back1,bus1,4500,3,HOSP
back1,bus1,4500,4,NRES
";

/// Build the stop network and its hourly demand table.
pub fn build_network() -> Result<(StopNetwork, DemandTable)> {
    let mut b = StopNetworkBuilder::new();
    load_stops_into(&mut b, Cursor::new(STOPS_CSV))?;
    load_routes_into(&mut b, Cursor::new(ROUTES_CSV))?;
    let network = b.build();
    let demand = load_demand_reader(Cursor::new(DEMAND_CSV), &network)?;
    Ok((network, demand))
}

/// Vehicles with their queued fixed trips; no customers yet.
pub fn build_fleet(network: &StopNetwork) -> Result<(Fleet, HashMap<String, VehicleId>)> {
    let mut fleet = Fleet::new();
    let codes = load_vehicles_reader(Cursor::new(VEHICLES_CSV), network, &mut fleet)?;
    load_trips_reader(Cursor::new(TRIPS_CSV), network, &codes, &mut fleet)?;
    Ok((fleet, codes))
}
