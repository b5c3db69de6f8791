//! Flat CSV export of the period's normalized movements.
//!
//! One row per own-fleet trip and per vendor consignment in the period,
//! with a `source` discriminator column, suitable for spreadsheet
//! drill-down away from the summary table.

use crate::error::{LedgerError, Result};
use crate::schema::{ConsignmentRecord, DateRange, TripRecord, TripStatus};
use log::debug;

const HEADERS: [&str; 11] = [
    "source", "id", "date", "party", "category", "zone", "vehicle", "route", "status", "qty",
    "freight",
];

/// Render every in-period trip and consignment as one CSV document.
pub fn export_flat(
    trips: &[TripRecord],
    consignments: &[ConsignmentRecord],
    period: &DateRange,
) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    let mut rows = 0usize;
    for trip in trips {
        let Some(date) = trip.loading_date.filter(|d| period.contains(*d)) else {
            continue;
        };
        let status = match &trip.status {
            TripStatus::Loaded => "Loaded",
            TripStatus::Empty => "Empty",
            TripStatus::Other(s) => s.as_str(),
        };
        writer.write_record([
            "trip".to_string(),
            trip.trip_id.clone(),
            date.to_string(),
            trip.party.clone(),
            trip.category.label().to_string(),
            trip.origin_zone.to_string(),
            trip.vehicle_no.clone(),
            trip.route.clone(),
            status.to_string(),
            trip.car_qty.to_string(),
            trip.freight.to_string(),
        ])?;
        rows += 1;
    }

    for cn in consignments {
        let Some(date) = cn.cn_date.filter(|d| period.contains(*d)) else {
            continue;
        };
        writer.write_record([
            "consignment".to_string(),
            cn.cn_no.clone(),
            date.to_string(),
            cn.party.clone(),
            cn.category.label().to_string(),
            cn.zone.to_string(),
            cn.vehicle_no.clone(),
            cn.route.clone(),
            String::new(),
            cn.qty.to_string(),
            cn.basic_freight.to_string(),
        ])?;
        rows += 1;
    }

    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| LedgerError::SourceUnavailable(format!("csv buffer: {}", e)))?;
    let out = String::from_utf8(bytes)
        .map_err(|e| LedgerError::SourceUnavailable(format!("csv buffer: {}", e)))?;
    debug!("exported {} flat rows", rows);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Category, VehicleClass, Zone};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn trip(id: &str, d: &str) -> TripRecord {
        TripRecord {
            trip_id: id.to_string(),
            loading_date: Some(date(d)),
            vehicle_no: "KA01AB1234".to_string(),
            driver_id: String::new(),
            raw_party: "Honda Cars India Ltd".to_string(),
            party: "Honda Cars India Ltd".to_string(),
            category: Category::Honda,
            route: "Tapukara - Delhi".to_string(),
            origin_zone: Zone::North,
            car_qty: 5,
            freight: 25000.0,
            status: TripStatus::Loaded,
            cn_ref: None,
            distance: 250.0,
        }
    }

    fn consignment(id: &str, d: &str) -> ConsignmentRecord {
        ConsignmentRecord {
            cn_no: id.to_string(),
            cn_date: Some(date(d)),
            raw_billing_party: "Glovis India Pvt Ltd".to_string(),
            party: "Glovis India Pvt Ltd".to_string(),
            category: Category::Glovis,
            origin: "Chennai".to_string(),
            zone: Zone::South,
            route: "Chennai - Pune".to_string(),
            vehicle_no: "TN09XY7777".to_string(),
            qty: 6,
            basic_freight: 42000.0,
            trip_id: None,
            bill_no: None,
            pod_no: None,
            eta: None,
            vehicle_class: VehicleClass::HireVehicle,
            branch: "Chennai".to_string(),
            vendor_activity: true,
        }
    }

    #[test]
    fn test_export_filters_to_period() {
        let period = DateRange::new(date("2024-05-01"), date("2024-05-31")).unwrap();
        let trips = vec![trip("T-1", "2024-05-03"), trip("T-2", "2024-06-03")];
        let cns = vec![consignment("CN-1", "2024-05-10")];

        let csv_text = export_flat(&trips, &cns, &period).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines.len(), 3); // header + one trip + one consignment
        assert!(lines[0].starts_with("source,id,date"));
        assert!(lines[1].starts_with("trip,T-1,2024-05-03,Honda Cars India Ltd,Honda,North"));
        assert!(lines[2].starts_with("consignment,CN-1,2024-05-10,Glovis India Pvt Ltd,Glovis,South"));
    }

    #[test]
    fn test_undated_records_skipped() {
        let period = DateRange::new(date("2024-05-01"), date("2024-05-31")).unwrap();
        let mut t = trip("T-1", "2024-05-03");
        t.loading_date = None;
        let csv_text = export_flat(&[t], &[], &period).unwrap();
        assert_eq!(csv_text.lines().count(), 1); // header only
    }
}
