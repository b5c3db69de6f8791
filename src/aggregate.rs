//! Aggregation & Comparison Engine.
//!
//! Turns the unified party ledger into the presentation table: rows
//! grouped into the fixed category order, subtotal rows for categories
//! with more than one member, a grand-total row, stored targets joined
//! per party, and period-over-period comparison columns.

use crate::schema::{
    Category, DailyRow, DateRange, LedgerRow, LocalLoadRow, PartyTotals, PeriodSummary, RowKind,
    TripRecord, TripStatus,
};
use crate::utils::normalize_key;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Route fragments that mark a movement as local/pilot/yard work.
const LOCAL_ROUTE_MARKERS: [&str; 3] = ["LOCAL", "PILOT", "YARD"];

/// Distance below which a trip is treated as a local movement.
const LOCAL_DISTANCE_KM: f64 = 100.0;

/// Build the client-wise summary table.
///
/// Categories appear in [`Category::ORDERED`]; members keep their
/// first-encounter order from the current period. A subtotal row is
/// emitted only when a category has two or more members, and its target
/// is the sum of the members' stored targets (absent when none stored).
pub fn build_summary_table(
    current: &[PartyTotals],
    compare: &[PartyTotals],
    targets: &BTreeMap<String, f64>,
) -> Vec<LedgerRow> {
    let compare_by_party: BTreeMap<String, (u32, f64)> = compare
        .iter()
        .map(|t| (t.party.clone(), (t.total_cars(), t.total_freight())))
        .collect();

    let mut table = Vec::new();
    let mut grand = LedgerRow {
        party: "Grand Total".to_string(),
        category: Category::Other,
        kind: RowKind::GrandTotal,
        target: None,
        trips: 0,
        own_cars: 0,
        vendor_cars: 0,
        total_cars: 0,
        own_freight: 0.0,
        vendor_freight: 0.0,
        total_freight: 0.0,
        compare_cars: 0,
        compare_freight: 0.0,
    };

    for category in Category::ORDERED {
        let mut members: Vec<&PartyTotals> =
            current.iter().filter(|t| t.category == category).collect();
        members.sort_by_key(|t| t.order);
        if members.is_empty() {
            continue;
        }

        let mut subtotal = LedgerRow {
            party: format!("{} - Total", category.label()),
            category,
            kind: RowKind::Subtotal,
            target: None,
            trips: 0,
            own_cars: 0,
            vendor_cars: 0,
            total_cars: 0,
            own_freight: 0.0,
            vendor_freight: 0.0,
            total_freight: 0.0,
            compare_cars: 0,
            compare_freight: 0.0,
        };

        for totals in &members {
            let (compare_cars, compare_freight) = compare_by_party
                .get(&totals.party)
                .copied()
                .unwrap_or((0, 0.0));
            let target = targets.get(&totals.party).copied();

            let row = LedgerRow {
                party: totals.party.clone(),
                category,
                kind: RowKind::Party,
                target,
                trips: totals.trips,
                own_cars: totals.own_cars,
                vendor_cars: totals.vendor_cars,
                total_cars: totals.total_cars(),
                own_freight: totals.own_freight,
                vendor_freight: totals.vendor_freight,
                total_freight: totals.total_freight(),
                compare_cars,
                compare_freight,
            };

            subtotal.trips += row.trips;
            subtotal.own_cars += row.own_cars;
            subtotal.vendor_cars += row.vendor_cars;
            subtotal.total_cars += row.total_cars;
            subtotal.own_freight += row.own_freight;
            subtotal.vendor_freight += row.vendor_freight;
            subtotal.total_freight += row.total_freight;
            subtotal.compare_cars += row.compare_cars;
            subtotal.compare_freight += row.compare_freight;
            if let Some(t) = target {
                subtotal.target = Some(subtotal.target.unwrap_or(0.0) + t);
            }

            table.push(row);
        }

        grand.trips += subtotal.trips;
        grand.own_cars += subtotal.own_cars;
        grand.vendor_cars += subtotal.vendor_cars;
        grand.total_cars += subtotal.total_cars;
        grand.own_freight += subtotal.own_freight;
        grand.vendor_freight += subtotal.vendor_freight;
        grand.total_freight += subtotal.total_freight;
        grand.compare_cars += subtotal.compare_cars;
        grand.compare_freight += subtotal.compare_freight;
        if let Some(t) = subtotal.target {
            grand.target = Some(grand.target.unwrap_or(0.0) + t);
        }

        // Single-member categories read fine without a subtotal line.
        if members.len() > 1 {
            table.push(subtotal);
        }
    }

    table.push(grand);
    debug!("summary table: {} rows", table.len());
    table
}

/// Headline metrics for the selected period.
pub fn period_summary(
    trips: &[TripRecord],
    period: &DateRange,
    current: &[PartyTotals],
    compare: &[PartyTotals],
) -> PeriodSummary {
    let mut summary = PeriodSummary::default();

    for trip in trips_in_period(trips, period) {
        let blank_party = trip.party.trim().is_empty();
        if trip.status == TripStatus::Empty || blank_party {
            summary.empty_trips += 1;
        } else {
            summary.loaded_trips += 1;
        }
        summary.cars_lifted += trip.car_qty;
    }

    summary.total_freight = current.iter().map(|t| t.total_freight()).sum();
    let compare_freight: f64 = compare.iter().map(|t| t.total_freight()).sum();

    let days = period.inclusive_days();
    summary.average_per_day = if days > 0 {
        summary.total_freight / days as f64
    } else {
        0.0
    };
    summary.shortfall = summary.total_freight - compare_freight;

    summary
}

/// Per-day (trips, cars, freight, distance) over the period.
pub fn daily_summary(trips: &[TripRecord], period: &DateRange) -> Vec<DailyRow> {
    let mut by_date: BTreeMap<NaiveDate, DailyRow> = BTreeMap::new();

    for trip in trips_in_period(trips, period) {
        let Some(date) = trip.loading_date else {
            continue;
        };
        let row = by_date.entry(date).or_insert(DailyRow {
            date,
            trips: 0,
            cars: 0,
            freight: 0.0,
            distance: 0.0,
        });
        row.trips += 1;
        row.cars += trip.car_qty;
        row.freight += trip.freight;
        row.distance += trip.distance;
    }

    by_date.into_values().collect()
}

/// Local/pilot/yard movements summarized per party, in encounter order.
pub fn local_loads(trips: &[TripRecord], period: &DateRange) -> Vec<LocalLoadRow> {
    let mut rows: Vec<LocalLoadRow> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();

    for trip in trips_in_period(trips, period) {
        if trip.party.trim().is_empty() || !is_local_trip(trip) {
            continue;
        }
        let idx = *index.entry(trip.party.clone()).or_insert_with(|| {
            rows.push(LocalLoadRow {
                party: trip.party.clone(),
                trips: 0,
                cars: 0,
                freight: 0.0,
            });
            rows.len() - 1
        });
        rows[idx].trips += 1;
        rows[idx].cars += trip.car_qty;
        rows[idx].freight += trip.freight;
    }

    rows
}

fn is_local_trip(trip: &TripRecord) -> bool {
    let route = normalize_key(&trip.route);
    LOCAL_ROUTE_MARKERS.iter().any(|m| route.contains(m)) || trip.distance < LOCAL_DISTANCE_KM
}

fn trips_in_period<'a>(
    trips: &'a [TripRecord],
    period: &'a DateRange,
) -> impl Iterator<Item = &'a TripRecord> {
    trips
        .iter()
        .filter(move |t| t.loading_date.is_some_and(|d| period.contains(d)))
}
