//! # fleet-ledger
//!
//! A library for reconciling own-fleet trip logs with vendor
//! consignment notes into a unified client-wise ledger.
//!
//! The pipeline runs in stages:
//!
//! 1. **Ingestion** ([`ingestion`]): raw tabular rows from the two feeds,
//!    legacy column names rewritten, test rows dropped.
//! 2. **Normalization** ([`normalize`]): typed records with canonical
//!    party names, categories, and zones from the [`gazetteer`]. Bad
//!    fields are repaired and tallied, never fatal.
//! 3. **Reconciliation** ([`reconcile`]): the unified per-party ledger
//!    and the pending consignment-note report.
//! 4. **Aggregation** ([`aggregate`]): the category-grouped summary
//!    table with targets and period-over-period comparison, plus the
//!    headline, daily, and local-load summaries.
//!
//! [`ReportEngine::run`] executes the whole pipeline for one reporting
//! period.
//!
//! ## Example
//!
//! ```no_run
//! use fleet_ledger::{ReportEngine, ReportInput, ReportParams};
//! use chrono::NaiveDate;
//!
//! # fn main() -> fleet_ledger::Result<()> {
//! let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
//! let report_month = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let params = ReportParams::for_month(report_month, today)?;
//!
//! let engine = ReportEngine::new();
//! let output = engine.run(&ReportInput::default(), &params)?;
//! println!("{} summary rows", output.table.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod error;
pub mod export;
pub mod gazetteer;
pub mod ingestion;
pub mod normalize;
pub mod reconcile;
pub mod schema;
pub mod stores;
pub mod utils;

pub use error::{LedgerError, Result};
pub use gazetteer::Gazetteer;
pub use normalize::Normalizer;

use chrono::NaiveDate;
use ingestion::{RawConsignmentRow, RawTripRow};
use log::{info, warn};
use schema::{
    ConsignmentRecord, DailyRow, DateRange, Diagnostics, LedgerRow, LocalLoadRow, PeriodSummary,
    TripRecord,
};
use std::collections::{BTreeMap, BTreeSet};

/// Period selection and filtering for one report run.
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub period: DateRange,
    /// Reference period for the comparison columns, usually the previous
    /// month.
    pub compare_period: DateRange,
    /// Restrict the ledger and summaries to one canonical party. Pending
    /// detection always runs over the full data.
    pub party_filter: Option<String>,
    /// Reference date for pending-CN aging, usually today.
    pub as_of: NaiveDate,
}

impl ReportParams {
    /// The calendar month containing `day`, compared against the previous
    /// calendar month.
    pub fn for_month(day: NaiveDate, as_of: NaiveDate) -> Result<Self> {
        let (start, end) = utils::month_bounds(day);
        let prev_end = start.pred_opt().unwrap_or(start);
        let (prev_start, prev_end_full) = utils::month_bounds(prev_end);
        Ok(Self {
            period: DateRange::new(start, end)?,
            compare_period: DateRange::new(prev_start, prev_end_full)?,
            party_filter: None,
            as_of,
        })
    }
}

/// Everything a report run consumes.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub trip_rows: Vec<RawTripRow>,
    pub consignment_rows: Vec<RawConsignmentRow>,
    /// Stored per-party freight targets, from a [`stores::TargetStore`].
    pub targets: BTreeMap<String, f64>,
    /// Trip ids dismissed from the pending report, from a
    /// [`stores::ExclusionStore`].
    pub exclusions: BTreeSet<String>,
    /// TEST-prefixed sentinel rows dropped at ingestion, carried through
    /// to the output diagnostics.
    pub test_consignments_skipped: usize,
}

impl ReportInput {
    /// Load both feeds from untyped source rows, applying the column
    /// renames and dropping sentinel rows.
    pub fn from_sources(
        trip_rows: &[ingestion::SourceRow],
        consignment_rows: &[ingestion::SourceRow],
    ) -> Self {
        let trip_rows = ingestion::load_trip_rows(trip_rows);
        let (consignment_rows, test_consignments_skipped) =
            ingestion::load_consignment_rows(consignment_rows);
        Self {
            trip_rows,
            consignment_rows,
            test_consignments_skipped,
            ..Default::default()
        }
    }
}

/// One complete report.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// The client-wise summary table, category-grouped with subtotals
    /// and a grand total.
    pub table: Vec<LedgerRow>,
    /// Loaded trips still awaiting a consignment note.
    pub pending: Vec<TripRecord>,
    pub summary: PeriodSummary,
    pub daily: Vec<DailyRow>,
    pub local_loads: Vec<LocalLoadRow>,
    pub diagnostics: Diagnostics,
    /// Normalized records for drill-down and export.
    pub trips: Vec<TripRecord>,
    pub consignments: Vec<ConsignmentRecord>,
}

/// The report pipeline with its classification tables.
pub struct ReportEngine {
    gazetteer: Gazetteer,
}

impl ReportEngine {
    pub fn new() -> Self {
        Self {
            gazetteer: Gazetteer::default(),
        }
    }

    pub fn with_gazetteer(gazetteer: Gazetteer) -> Self {
        Self { gazetteer }
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    /// Run the full pipeline for one period.
    pub fn run(&self, input: &ReportInput, params: &ReportParams) -> Result<ReportOutput> {
        let normalizer = Normalizer::new(&self.gazetteer);

        let (trips, mut diagnostics) = normalizer.normalize_trips(&input.trip_rows);
        let (consignments, cn_diagnostics) =
            normalizer.normalize_consignments(&input.consignment_rows);
        diagnostics.merge(cn_diagnostics);
        diagnostics.test_consignments_skipped += input.test_consignments_skipped;
        if !diagnostics.unclassified_parties.is_empty() {
            warn!(
                "{} parties classified to no category: {:?}",
                diagnostics.unclassified_parties.len(),
                diagnostics.unclassified_parties
            );
        }

        // Pending detection runs on the unfiltered data: a party filter
        // narrows the report, not the operator's follow-up list.
        let pending = reconcile::find_pending(
            &trips,
            &consignments,
            &input.exclusions,
            params.as_of,
        );

        let (view_trips, view_consignments) = match &params.party_filter {
            Some(party) => (
                trips.iter().filter(|t| &t.party == party).cloned().collect(),
                consignments
                    .iter()
                    .filter(|c| &c.party == party)
                    .cloned()
                    .collect(),
            ),
            None => (trips.clone(), consignments.clone()),
        };

        let current =
            reconcile::build_party_ledger(&view_trips, &view_consignments, &params.period);
        let compare =
            reconcile::build_party_ledger(&view_trips, &view_consignments, &params.compare_period);

        let table = aggregate::build_summary_table(&current, &compare, &input.targets);
        let summary = aggregate::period_summary(&view_trips, &params.period, &current, &compare);
        let daily = aggregate::daily_summary(&view_trips, &params.period);
        let local_loads = aggregate::local_loads(&view_trips, &params.period);

        info!(
            "report {} to {}: {} parties, {} pending, {} diagnostics entries",
            params.period.start,
            params.period.end,
            current.len(),
            pending.len(),
            diagnostics.unmapped_cities.len() + diagnostics.unclassified_parties.len()
        );

        Ok(ReportOutput {
            table,
            pending,
            summary,
            daily,
            local_loads,
            diagnostics,
            trips,
            consignments,
        })
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{Category, RowKind};

    fn trip_row(no: &str, date: &str, party: &str, route: &str, qty: &str, freight: &str) -> RawTripRow {
        RawTripRow {
            trip_no: no.into(),
            loading_date: date.into(),
            vehicle_no: "KA01AB1234".into(),
            new_party_name: party.into(),
            route: route.into(),
            car_qty: qty.into(),
            freight: freight.into(),
            trip_status: "Loaded".into(),
            ..Default::default()
        }
    }

    fn params() -> ReportParams {
        ReportParams {
            period: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            )
            .unwrap(),
            compare_period: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            )
            .unwrap(),
            party_filter: None,
            as_of: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        }
    }

    #[test]
    fn test_for_month_spans_both_calendar_months() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let p = ReportParams::for_month(day, as_of).unwrap();
        assert_eq!(p.period.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(p.period.end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(p.compare_period.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        // 2024 is a leap year.
        assert_eq!(p.compare_period.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_empty_input_yields_grand_total_only() {
        let engine = ReportEngine::new();
        let output = engine.run(&ReportInput::default(), &params()).unwrap();
        assert_eq!(output.table.len(), 1);
        assert_eq!(output.table[0].kind, RowKind::GrandTotal);
        assert!(output.pending.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_end_to_end_classification_and_pending() {
        let input = ReportInput {
            trip_rows: vec![
                trip_row("T-1", "2024-05-02", "Honda Cars India Limited", "Tapukara - Delhi", "5", "50000"),
                trip_row("T-2", "2024-05-03", "Tata Motors Ltd", "Pune - Chennai", "4", "40000"),
            ],
            ..Default::default()
        };
        let engine = ReportEngine::new();
        let output = engine.run(&input, &params()).unwrap();

        // Alias resolves to the canonical Honda name and its category.
        let honda = output
            .table
            .iter()
            .find(|r| r.category == Category::Honda && r.kind == RowKind::Party)
            .unwrap();
        assert_eq!(honda.party, "Honda Cars India Ltd");
        assert_eq!(honda.total_cars, 5);

        // Both trips are old enough and unreferenced, so both are pending.
        assert_eq!(output.pending.len(), 2);
    }

    #[test]
    fn test_party_filter_narrows_table_not_pending() {
        let input = ReportInput {
            trip_rows: vec![
                trip_row("T-1", "2024-05-02", "Honda Cars India Ltd", "Tapukara - Delhi", "5", "50000"),
                trip_row("T-2", "2024-05-03", "Tata Motors Ltd", "Pune - Chennai", "4", "40000"),
            ],
            ..Default::default()
        };
        let mut p = params();
        p.party_filter = Some("Honda Cars India Ltd".to_string());

        let engine = ReportEngine::new();
        let output = engine.run(&input, &p).unwrap();

        let party_rows: Vec<&LedgerRow> = output
            .table
            .iter()
            .filter(|r| r.kind == RowKind::Party)
            .collect();
        assert_eq!(party_rows.len(), 1);
        assert_eq!(party_rows[0].party, "Honda Cars India Ltd");

        // The filter never hides follow-up work.
        assert_eq!(output.pending.len(), 2);
    }
}
