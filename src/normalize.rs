//! Record Normalizer: raw feed rows into the typed schema.
//!
//! Nothing here fails a row. Bad dates become `None`, bad numbers become
//! zero, and every such repair is tallied in [`Diagnostics`] for the
//! operator's unmapped/coercion report.

use crate::gazetteer::Gazetteer;
use crate::ingestion::{RawConsignmentRow, RawTripRow};
use crate::schema::{
    Category, ConsignmentRecord, Diagnostics, TripRecord, TripStatus, VehicleClass, Zone,
};
use crate::utils::{parse_amount_lossy, parse_count_lossy, parse_date_flexible};
use chrono::NaiveDate;
use log::debug;

pub struct Normalizer<'a> {
    gazetteer: &'a Gazetteer,
}

impl<'a> Normalizer<'a> {
    pub fn new(gazetteer: &'a Gazetteer) -> Self {
        Self { gazetteer }
    }

    pub fn normalize_trips(&self, rows: &[RawTripRow]) -> (Vec<TripRecord>, Diagnostics) {
        let mut diagnostics = Diagnostics::default();
        let mut records = Vec::with_capacity(rows.len());

        for raw in rows {
            let raw_party = self.resolve_trip_party(raw);
            let party = self.gazetteer.normalize_party_alias(&raw_party);
            let category = self.gazetteer.classify_category(&party);
            if category == Category::Other && !party.trim().is_empty() {
                diagnostics.note_unclassified_party(&party);
            }

            let origin = route_origin(&raw.route);
            let origin_zone = self.gazetteer.classify_zone(origin);
            if origin_zone == Zone::Other && !origin.trim().is_empty() {
                diagnostics.note_unmapped_city(origin);
            }

            records.push(TripRecord {
                trip_id: raw.trip_no.trim().to_string(),
                loading_date: coerce_date(&raw.loading_date, &mut diagnostics),
                vehicle_no: raw.vehicle_no.trim().to_string(),
                driver_id: raw.driver_id.trim().to_string(),
                raw_party,
                party,
                category,
                route: raw.route.trim().to_string(),
                origin_zone,
                car_qty: coerce_count(&raw.car_qty, &mut diagnostics),
                freight: coerce_amount(&raw.freight, &mut diagnostics),
                status: TripStatus::parse(&raw.trip_status),
                cn_ref: non_blank(&raw.cn_ref),
                distance: coerce_amount(&raw.distance, &mut diagnostics),
            });
        }

        debug!(
            "normalized {} trip rows ({} malformed dates, {} coerced numbers)",
            records.len(),
            diagnostics.malformed_dates,
            diagnostics.coerced_numbers
        );
        (records, diagnostics)
    }

    pub fn normalize_consignments(
        &self,
        rows: &[RawConsignmentRow],
    ) -> (Vec<ConsignmentRecord>, Diagnostics) {
        let mut diagnostics = Diagnostics::default();
        let mut records = Vec::with_capacity(rows.len());

        for raw in rows {
            let party = self
                .gazetteer
                .vendor_canonical(&raw.billing_name, &raw.origin);
            let category = self.gazetteer.classify_category(&party);

            let zone = self.gazetteer.classify_zone(&raw.origin);
            if zone == Zone::Other && !raw.origin.trim().is_empty() {
                diagnostics.note_unmapped_city(&raw.origin);
            }

            let trip_id = non_blank(&raw.trip_no);
            let vehicle_class = VehicleClass::parse(&raw.vehicle_class);

            // R.Sai bills through its own trip system; a linked trip id
            // means the movement is already counted on the own-fleet side.
            // Every other billing party is vendor activity only when the
            // vehicle is hired.
            let vendor_activity = if category == Category::RSai {
                trip_id.is_none()
            } else {
                vehicle_class == VehicleClass::HireVehicle
            };

            records.push(ConsignmentRecord {
                cn_no: raw.consignment_no.trim().to_string(),
                cn_date: coerce_date(&raw.consignment_date, &mut diagnostics),
                raw_billing_party: raw.billing_name.trim().to_string(),
                party,
                category,
                origin: raw.origin.trim().to_string(),
                zone,
                route: raw.route.trim().to_string(),
                vehicle_no: raw.vehicle_no.trim().to_string(),
                qty: coerce_count(&raw.qty, &mut diagnostics),
                basic_freight: coerce_amount(&raw.basic_freight, &mut diagnostics),
                trip_id,
                bill_no: non_blank(&raw.bill_no),
                pod_no: non_blank(&raw.pod_no),
                eta: coerce_date(&raw.eta, &mut diagnostics),
                vehicle_class,
                branch: raw.branch.trim().to_string(),
                vendor_activity,
            });
        }

        debug!(
            "normalized {} consignment rows ({} malformed dates, {} coerced numbers)",
            records.len(),
            diagnostics.malformed_dates,
            diagnostics.coerced_numbers
        );
        (records, diagnostics)
    }

    /// The trip feed carries two party columns: the corrected
    /// `NewPartyName` and the operational `Party`. The corrected column
    /// wins, except for the one known bad mapping where it classifies to
    /// no category while the operational column still does; those rows
    /// re-derive from the operational column.
    fn resolve_trip_party(&self, raw: &RawTripRow) -> String {
        let primary = raw.new_party_name.trim();
        let alternate = raw.party.trim();

        if primary.is_empty() {
            return alternate.to_string();
        }
        if self.gazetteer.classify_category(primary) == Category::Other
            && self.gazetteer.classify_category(alternate) != Category::Other
        {
            return alternate.to_string();
        }
        primary.to_string()
    }
}

/// Origin half of an "origin - destination" route string.
pub fn route_origin(route: &str) -> &str {
    route.split('-').next().unwrap_or("").trim()
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn coerce_date(raw: &str, diagnostics: &mut Diagnostics) -> Option<NaiveDate> {
    let parsed = parse_date_flexible(raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        diagnostics.malformed_dates += 1;
    }
    parsed
}

fn coerce_amount(raw: &str, diagnostics: &mut Diagnostics) -> f64 {
    if !raw.trim().is_empty() && raw.trim().parse::<f64>().is_err() {
        diagnostics.coerced_numbers += 1;
    }
    parse_amount_lossy(raw)
}

fn coerce_count(raw: &str, diagnostics: &mut Diagnostics) -> u32 {
    if !raw.trim().is_empty() && raw.trim().parse::<f64>().is_err() {
        diagnostics.coerced_numbers += 1;
    }
    parse_count_lossy(raw)
}
