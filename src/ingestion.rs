//! Source-boundary handling for the two tabular feeds.
//!
//! Field names vary by source revision, so a column-rename table runs
//! before anything else. Test/sentinel consignment numbers are dropped
//! here too; everything past this module deals in stable column names.

use crate::utils::normalize_key;
use std::collections::BTreeMap;

/// One raw row from either feed, keyed by column name.
pub type SourceRow = BTreeMap<String, String>;

/// Legacy trip-feed column names mapped to their current names.
pub const TRIP_COLUMN_RENAMES: [(&str, &str); 5] = [
    ("TLHSNo", "TripNo"),
    ("TruckNo", "VehicleNo"),
    ("PartyName", "Party"),
    ("LRNo", "CNRef"),
    ("Qty", "CarQty"),
];

/// Legacy consignment-feed column names mapped to their current names.
pub const CONSIGNMENT_COLUMN_RENAMES: [(&str, &str); 5] = [
    ("CNNo", "ConsignmentNo"),
    ("CNDate", "ConsignmentDate"),
    ("TruckNo", "VehicleNo"),
    ("BillingParty", "BillingName"),
    ("BasicAmount", "BasicFreight"),
];

/// Rewrite legacy column names. Current names take precedence when a row
/// somehow carries both spellings.
pub fn apply_column_renames(row: &SourceRow, renames: &[(&str, &str)]) -> SourceRow {
    let mut out = SourceRow::new();
    for (key, value) in row {
        let renamed = renames
            .iter()
            .find(|(old, _)| old == key)
            .map(|(_, new)| new.to_string())
            .unwrap_or_else(|| key.clone());
        out.entry(renamed).or_insert_with(|| value.clone());
    }
    // A current-name column always wins over a renamed legacy one.
    for (_, new) in renames {
        if let Some(v) = row.get(*new) {
            out.insert((*new).to_string(), v.clone());
        }
    }
    out
}

fn field(row: &SourceRow, name: &str) -> String {
    row.get(name).cloned().unwrap_or_default()
}

/// An own-fleet trip row as shipped by the feed, untyped.
#[derive(Debug, Clone, Default)]
pub struct RawTripRow {
    pub trip_no: String,
    pub loading_date: String,
    pub vehicle_no: String,
    pub driver_id: String,
    pub party: String,
    pub new_party_name: String,
    pub route: String,
    pub car_qty: String,
    pub freight: String,
    pub trip_status: String,
    pub cn_ref: String,
    pub distance: String,
}

impl RawTripRow {
    pub fn from_source(row: &SourceRow) -> Self {
        let row = apply_column_renames(row, &TRIP_COLUMN_RENAMES);
        Self {
            trip_no: field(&row, "TripNo"),
            loading_date: field(&row, "LoadingDate"),
            vehicle_no: field(&row, "VehicleNo"),
            driver_id: field(&row, "DriverId"),
            party: field(&row, "Party"),
            new_party_name: field(&row, "NewPartyName"),
            route: field(&row, "Route"),
            car_qty: field(&row, "CarQty"),
            freight: field(&row, "Freight"),
            trip_status: field(&row, "TripStatus"),
            cn_ref: field(&row, "CNRef"),
            distance: field(&row, "Distance"),
        }
    }
}

/// A vendor consignment-note row as shipped by the feed, untyped.
#[derive(Debug, Clone, Default)]
pub struct RawConsignmentRow {
    pub consignment_no: String,
    pub consignment_date: String,
    pub billing_name: String,
    pub origin: String,
    pub route: String,
    pub vehicle_no: String,
    pub qty: String,
    pub basic_freight: String,
    pub trip_no: String,
    pub bill_no: String,
    pub pod_no: String,
    pub eta: String,
    pub vehicle_class: String,
    pub branch: String,
}

impl RawConsignmentRow {
    pub fn from_source(row: &SourceRow) -> Self {
        let row = apply_column_renames(row, &CONSIGNMENT_COLUMN_RENAMES);
        Self {
            consignment_no: field(&row, "ConsignmentNo"),
            consignment_date: field(&row, "ConsignmentDate"),
            billing_name: field(&row, "BillingName"),
            origin: field(&row, "Origin"),
            route: field(&row, "Route"),
            vehicle_no: field(&row, "VehicleNo"),
            qty: field(&row, "Qty"),
            basic_freight: field(&row, "BasicFreight"),
            trip_no: field(&row, "TripNo"),
            bill_no: field(&row, "BillNo"),
            pod_no: field(&row, "PODNo"),
            eta: field(&row, "ETA"),
            vehicle_class: field(&row, "VehicleClass"),
            branch: field(&row, "Branch"),
        }
    }

    /// Sentinel rows created by the billing team for software checks.
    pub fn is_test_row(&self) -> bool {
        normalize_key(&self.consignment_no).starts_with("TEST")
    }
}

pub fn load_trip_rows(rows: &[SourceRow]) -> Vec<RawTripRow> {
    rows.iter().map(RawTripRow::from_source).collect()
}

/// Returns the usable consignment rows plus the count of skipped
/// TEST-prefixed sentinel rows.
pub fn load_consignment_rows(rows: &[SourceRow]) -> (Vec<RawConsignmentRow>, usize) {
    let mut out = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for row in rows {
        let raw = RawConsignmentRow::from_source(row);
        if raw.is_test_row() {
            skipped += 1;
            continue;
        }
        out.push(raw);
    }
    (out, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(fields: &[(&str, &str)]) -> SourceRow {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_legacy_columns_renamed() {
        let row = source(&[
            ("TLHSNo", "T-100"),
            ("TruckNo", "KA01AB1234"),
            ("PartyName", "Honda Cars India Ltd"),
            ("LRNo", "LR-9"),
            ("LoadingDate", "2024-05-01"),
        ]);
        let raw = RawTripRow::from_source(&row);
        assert_eq!(raw.trip_no, "T-100");
        assert_eq!(raw.vehicle_no, "KA01AB1234");
        assert_eq!(raw.party, "Honda Cars India Ltd");
        assert_eq!(raw.cn_ref, "LR-9");
        assert_eq!(raw.loading_date, "2024-05-01");
    }

    #[test]
    fn test_current_column_wins_over_legacy() {
        let row = source(&[("TLHSNo", "OLD-1"), ("TripNo", "NEW-1")]);
        let raw = RawTripRow::from_source(&row);
        assert_eq!(raw.trip_no, "NEW-1");
    }

    #[test]
    fn test_test_prefixed_consignments_skipped() {
        let rows = vec![
            source(&[("ConsignmentNo", "CN-1"), ("BillingName", "X")]),
            source(&[("ConsignmentNo", "TEST-77"), ("BillingName", "X")]),
            source(&[("ConsignmentNo", " test-78 "), ("BillingName", "X")]),
        ];
        let (loaded, skipped) = load_consignment_rows(&rows);
        assert_eq!(loaded.len(), 1);
        assert_eq!(skipped, 2);
        assert_eq!(loaded[0].consignment_no, "CN-1");
    }
}
