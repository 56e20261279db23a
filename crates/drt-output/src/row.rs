//! Plain data row types written by output backends.
//!
//! Times are simulation seconds since `SimTime::ZERO`; `unix_time_secs`
//! adds the configured start of the service day.  Optional ids are written
//! as empty CSV fields, SQL `NULL` and Parquet nulls.

use drt_fleet::{Customer, CustomerState};
use drt_sim::{ReoptRecord, TraceRecord, ValidationRecord};

/// One handled event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub time_secs:      u64,
    pub unix_time_secs: i64,
    pub seq:            u64,
    pub kind:           &'static str,
    pub vehicle:        Option<u32>,
    pub customer:       Option<u32>,
    pub stop:           Option<u32>,
    pub description:    String,
}

impl EventRow {
    pub fn from_record(record: &TraceRecord, start_unix_secs: i64) -> Self {
        Self {
            time_secs:      record.time.0,
            unix_time_secs: start_unix_secs + record.time.0 as i64,
            seq:            record.seq,
            kind:           record.kind.as_str(),
            vehicle:        record.payload.vehicle().map(|v| v.0),
            customer:       record.payload.customer().map(|c| c.0),
            stop:           record.payload.stop().map(|s| s.0),
            description:    record.description.clone(),
        }
    }
}

/// One board or alight attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRow {
    pub time_secs: u64,
    pub customer:  u32,
    pub vehicle:   u32,
    pub stop:      u32,
    pub action:    &'static str,
    pub success:   bool,
    /// Empty on success.
    pub reason:    String,
}

impl From<&ValidationRecord> for ValidationRow {
    fn from(r: &ValidationRecord) -> Self {
        Self {
            time_secs: r.time.0,
            customer:  r.customer.0,
            vehicle:   r.vehicle.0,
            stop:      r.stop.0,
            action:    r.action.as_str(),
            success:   r.success,
            reason:    r.reason.clone().unwrap_or_default(),
        }
    }
}

/// One re-optimisation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReoptRow {
    pub time_secs: u64,
    pub trigger:   &'static str,
    /// Space-separated customer ids offered to the oracle.
    pub customers: String,
    pub outcome:   &'static str,
    pub vehicles:  u32,
    pub slots:     u32,
    pub detail:    String,
}

impl From<&ReoptRecord> for ReoptRow {
    fn from(r: &ReoptRecord) -> Self {
        let customers: Vec<String> = r.customers.iter().map(|c| c.0.to_string()).collect();
        Self {
            time_secs: r.time.0,
            trigger:   r.trigger.as_str(),
            customers: customers.join(" "),
            outcome:   r.outcome,
            vehicles:  r.vehicles as u32,
            slots:     r.slots as u32,
            detail:    r.detail.clone(),
        }
    }
}

/// Final state of one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRow {
    pub customer:      u32,
    pub pickup:        u32,
    pub delivery:      u32,
    pub earliest_secs: u64,
    pub latest_secs:   u64,
    pub request_secs:  u64,
    pub prebooked:     bool,
    pub state:         &'static str,
    pub vehicle:       Option<u32>,
    pub boarded_secs:  Option<u64>,
    pub alighted_secs: Option<u64>,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        let vehicle = match c.state() {
            CustomerState::Boarded { vehicle, .. } | CustomerState::Alighted { vehicle, .. } => {
                Some(vehicle.0)
            }
            CustomerState::Requested | CustomerState::Rejected => None,
        };
        Self {
            customer:      c.id.0,
            pickup:        c.pickup.0,
            delivery:      c.delivery.0,
            earliest_secs: c.window.earliest.0,
            latest_secs:   c.window.latest.0,
            request_secs:  c.request_time.0,
            prebooked:     c.prebooked,
            state:         c.state().as_str(),
            vehicle,
            boarded_secs:  c.boarded_at().map(|t| t.0),
            alighted_secs: c.alighted_at().map(|t| t.0),
        }
    }
}
