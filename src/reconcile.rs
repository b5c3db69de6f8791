//! Reconciliation Engine.
//!
//! Two independent jobs over the normalized record sets:
//!
//! 1. The unified per-party ledger: own-fleet and vendor figures side by
//!    side, joined as a set union over canonical parties so a vendor-only
//!    party still gets a row.
//! 2. Pending-CN detection: own-fleet trips old enough to expect a
//!    consignment note but with none found by any matching strategy.
//!    The matching is a best-effort heuristic, not a guarantee of zero
//!    false matches.

use crate::schema::{ConsignmentRecord, DateRange, PartyTotals, TripRecord, TripStatus};
use crate::utils::normalize_key;
use chrono::{Days, NaiveDate};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Minimum age of a loaded trip before a missing consignment note counts
/// as pending.
pub const PENDING_AGE_DAYS: u64 = 3;

/// Build the unified per-party ledger for one period.
///
/// Own rows group to (trips, own cars, own freight); vendor-activity
/// consignments group to (vendor cars, vendor freight). The join is an
/// outer join keyed on canonical party: either side missing contributes
/// zeros. Row order is first-encounter order in the current-period data,
/// own side first.
pub fn build_party_ledger(
    trips: &[TripRecord],
    consignments: &[ConsignmentRecord],
    period: &DateRange,
) -> Vec<PartyTotals> {
    let mut rows: Vec<PartyTotals> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();

    for trip in trips {
        let Some(date) = trip.loading_date else { continue };
        if !period.contains(date) || trip.party.trim().is_empty() {
            continue;
        }
        let idx = *index.entry(trip.party.clone()).or_insert_with(|| {
            rows.push(PartyTotals {
                party: trip.party.clone(),
                category: trip.category,
                trips: 0,
                own_cars: 0,
                own_freight: 0.0,
                vendor_cars: 0,
                vendor_freight: 0.0,
                order: rows.len(),
            });
            rows.len() - 1
        });
        rows[idx].trips += 1;
        rows[idx].own_cars += trip.car_qty;
        rows[idx].own_freight += trip.freight;
    }

    for cn in consignments {
        if !cn.vendor_activity {
            continue;
        }
        let Some(date) = cn.cn_date else { continue };
        if !period.contains(date) || cn.party.trim().is_empty() {
            continue;
        }
        let idx = *index.entry(cn.party.clone()).or_insert_with(|| {
            rows.push(PartyTotals {
                party: cn.party.clone(),
                category: cn.category,
                trips: 0,
                own_cars: 0,
                own_freight: 0.0,
                vendor_cars: 0,
                vendor_freight: 0.0,
                order: rows.len(),
            });
            rows.len() - 1
        });
        rows[idx].vendor_cars += cn.qty;
        rows[idx].vendor_freight += cn.basic_freight;
    }

    debug!(
        "party ledger: {} parties for {} to {}",
        rows.len(),
        period.start,
        period.end
    );
    rows
}

/// One anti-join pass: the trip ids it can pair with a consignment record.
/// Strategies run in order and their matches are removed from the
/// candidate set; adding a strategy never touches the others.
pub struct MatcherStrategy {
    pub name: &'static str,
    pub matched_ids: fn(&[TripRecord], &[ConsignmentRecord]) -> BTreeSet<String>,
}

/// The layered matching policy, in evaluation order.
pub fn matcher_strategies() -> Vec<MatcherStrategy> {
    vec![
        MatcherStrategy {
            name: "date_vehicle",
            matched_ids: match_by_date_vehicle,
        },
        MatcherStrategy {
            name: "route_vehicle",
            matched_ids: match_by_route_vehicle,
        },
    ]
}

/// Normal linkage: any consignment on the same date for the same vehicle.
fn match_by_date_vehicle(
    trips: &[TripRecord],
    consignments: &[ConsignmentRecord],
) -> BTreeSet<String> {
    let keys: HashSet<(NaiveDate, String)> = consignments
        .iter()
        .filter_map(|cn| {
            let date = cn.cn_date?;
            let vehicle = normalize_key(&cn.vehicle_no);
            if vehicle.is_empty() {
                None
            } else {
                Some((date, vehicle))
            }
        })
        .collect();

    trips
        .iter()
        .filter_map(|trip| {
            let date = trip.loading_date?;
            let key = (date, normalize_key(&trip.vehicle_no));
            if keys.contains(&key) {
                Some(trip.trip_id.clone())
            } else {
                None
            }
        })
        .collect()
}

/// Fallback for consignments raised before the trip id was filled in:
/// same route and vehicle on an own-vehicle consignment with no link yet.
fn match_by_route_vehicle(
    trips: &[TripRecord],
    consignments: &[ConsignmentRecord],
) -> BTreeSet<String> {
    let keys: HashSet<(String, String)> = consignments
        .iter()
        .filter(|cn| {
            cn.trip_id.is_none()
                && cn.vehicle_class == crate::schema::VehicleClass::OwnVehicle
        })
        .filter_map(|cn| {
            let route = normalize_key(&cn.route);
            let vehicle = normalize_key(&cn.vehicle_no);
            if route.is_empty() || vehicle.is_empty() {
                None
            } else {
                Some((route, vehicle))
            }
        })
        .collect();

    trips
        .iter()
        .filter(|trip| {
            keys.contains(&(normalize_key(&trip.route), normalize_key(&trip.vehicle_no)))
        })
        .map(|trip| trip.trip_id.clone())
        .collect()
}

/// Trips that should have a consignment note by now but don't.
///
/// Candidates are loaded trips with a blank consignment reference, loaded
/// at least [`PENDING_AGE_DAYS`] before `as_of`, and not manually
/// excluded. Each matcher strategy then subtracts the trips it can pair
/// with a consignment record. The result is always a subset of the
/// candidates, and re-running on unchanged inputs returns the same set.
pub fn find_pending(
    trips: &[TripRecord],
    consignments: &[ConsignmentRecord],
    exclusions: &BTreeSet<String>,
    as_of: NaiveDate,
) -> Vec<TripRecord> {
    let excluded: BTreeSet<String> = exclusions.iter().map(|id| normalize_key(id)).collect();
    let cutoff = as_of.checked_sub_days(Days::new(PENDING_AGE_DAYS)).unwrap_or(as_of);

    let candidates: Vec<&TripRecord> = trips
        .iter()
        .filter(|trip| {
            trip.status == TripStatus::Loaded
                && trip.cn_ref.is_none()
                && trip.loading_date.is_some_and(|d| d <= cutoff)
                && !excluded.contains(&normalize_key(&trip.trip_id))
        })
        .collect();

    let mut matched: BTreeSet<String> = BTreeSet::new();
    for strategy in matcher_strategies() {
        let ids = (strategy.matched_ids)(trips, consignments);
        debug!("matcher '{}' paired {} trips", strategy.name, ids.len());
        matched.extend(ids);
    }

    candidates
        .into_iter()
        .filter(|trip| !matched.contains(&trip.trip_id))
        .cloned()
        .collect()
}
