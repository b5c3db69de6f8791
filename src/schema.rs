use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed business categories a counterparty resolves to.
///
/// Classification is total: every raw name maps to exactly one variant,
/// with `Other` as the default. The declaration order here is also the
/// presentation order of the client-wise summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Honda,
    MandM,
    Toyota,
    Skoda,
    Glovis,
    Tata,
    JohnDeere,
    Spinny,
    JswMg,
    RSai,
    MohanLogistics,
    SaiAuto,
    Kwick,
    MarketLoad,
    Other,
}

impl Category {
    /// Presentation order of the summary table.
    pub const ORDERED: [Category; 15] = [
        Category::Honda,
        Category::MandM,
        Category::Toyota,
        Category::Skoda,
        Category::Glovis,
        Category::Tata,
        Category::JohnDeere,
        Category::Spinny,
        Category::JswMg,
        Category::RSai,
        Category::MohanLogistics,
        Category::SaiAuto,
        Category::Kwick,
        Category::MarketLoad,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Honda => "Honda",
            Category::MandM => "M & M",
            Category::Toyota => "Toyota",
            Category::Skoda => "Skoda",
            Category::Glovis => "Glovis",
            Category::Tata => "Tata",
            Category::JohnDeere => "John Deere",
            Category::Spinny => "Spinny",
            Category::JswMg => "JSW MG",
            Category::RSai => "R.Sai",
            Category::MohanLogistics => "Mohan Logistics",
            Category::SaiAuto => "SAI Auto",
            Category::Kwick => "Kwick",
            Category::MarketLoad => "Market Load",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Geographic zone assigned to an origin/destination city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    North,
    East,
    West,
    South,
    Other,
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Zone::North => "North",
            Zone::East => "East",
            Zone::West => "West",
            Zone::South => "South",
            Zone::Other => "Other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    Loaded,
    Empty,
    Other(String),
}

impl TripStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "LOADED" => TripStatus::Loaded,
            "EMPTY" => TripStatus::Empty,
            _ => TripStatus::Other(raw.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleClass {
    OwnVehicle,
    HireVehicle,
    Other(String),
}

impl VehicleClass {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "OWN VEHICLE" | "OWN" => VehicleClass::OwnVehicle,
            "HIRE VEHICLE" | "HIRE" => VehicleClass::HireVehicle,
            _ => VehicleClass::Other(raw.trim().to_string()),
        }
    }
}

/// A normalized own-fleet trip. Read-only to the engine; the only mutation
/// path is the external exclusion list keyed by `trip_id`.
#[derive(Debug, Clone, Serialize)]
pub struct TripRecord {
    pub trip_id: String,
    pub loading_date: Option<NaiveDate>,
    pub vehicle_no: String,
    pub driver_id: String,
    /// Counterparty name exactly as it appeared in the feed.
    pub raw_party: String,
    /// Canonical display name after alias and exception handling.
    pub party: String,
    pub category: Category,
    /// "origin - destination" as recorded upstream.
    pub route: String,
    pub origin_zone: Zone,
    pub car_qty: u32,
    pub freight: f64,
    pub status: TripStatus,
    /// Blank/absent means no consignment note has been raised yet.
    pub cn_ref: Option<String>,
    pub distance: f64,
}

/// A normalized vendor consignment-note row.
#[derive(Debug, Clone, Serialize)]
pub struct ConsignmentRecord {
    pub cn_no: String,
    pub cn_date: Option<NaiveDate>,
    pub raw_billing_party: String,
    pub party: String,
    pub category: Category,
    pub origin: String,
    pub zone: Zone,
    pub route: String,
    pub vehicle_no: String,
    pub qty: u32,
    pub basic_freight: f64,
    pub trip_id: Option<String>,
    pub bill_no: Option<String>,
    pub pod_no: Option<String>,
    pub eta: Option<NaiveDate>,
    pub vehicle_class: VehicleClass,
    pub branch: String,
    /// True when this row counts as vendor activity for the ledger
    /// (see the R.Sai and hire-vehicle rules in the normalizer).
    pub vendor_activity: bool,
}

/// Inclusive date range selecting a reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(LedgerError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn inclusive_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Per-party totals for one period, before presentation grouping.
/// `order` preserves first-encounter order from the current-period data.
#[derive(Debug, Clone, Serialize)]
pub struct PartyTotals {
    pub party: String,
    pub category: Category,
    pub trips: u32,
    pub own_cars: u32,
    pub own_freight: f64,
    pub vendor_cars: u32,
    pub vendor_freight: f64,
    pub order: usize,
}

impl PartyTotals {
    pub fn total_cars(&self) -> u32 {
        self.own_cars + self.vendor_cars
    }

    pub fn total_freight(&self) -> f64 {
        self.own_freight + self.vendor_freight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Party,
    Subtotal,
    GrandTotal,
}

/// One presentation row of the client-wise summary. Derived on every
/// aggregation pass and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub party: String,
    pub category: Category,
    pub kind: RowKind,
    pub target: Option<f64>,
    pub trips: u32,
    pub own_cars: u32,
    pub vendor_cars: u32,
    pub total_cars: u32,
    pub own_freight: f64,
    pub vendor_freight: f64,
    pub total_freight: f64,
    pub compare_cars: u32,
    pub compare_freight: f64,
}

/// Headline metrics for the selected period.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PeriodSummary {
    pub loaded_trips: usize,
    pub empty_trips: usize,
    pub cars_lifted: u32,
    pub total_freight: f64,
    /// total_freight divided by the inclusive day count of the period.
    pub average_per_day: f64,
    /// total_freight minus the comparison period's freight. Signed.
    pub shortfall: f64,
}

/// Per-day loading summary rows.
#[derive(Debug, Clone, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub trips: u32,
    pub cars: u32,
    pub freight: f64,
    pub distance: f64,
}

/// Local/pilot/yard movement summary per party.
#[derive(Debug, Clone, Serialize)]
pub struct LocalLoadRow {
    pub party: String,
    pub trips: u32,
    pub cars: u32,
    pub freight: f64,
}

/// Recoverable oddities observed while normalizing. These are operator
/// visibility, not errors: the rows they describe stay in the output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub malformed_dates: usize,
    pub coerced_numbers: usize,
    pub test_consignments_skipped: usize,
    pub unmapped_cities: Vec<String>,
    pub unclassified_parties: Vec<String>,
}

impl Diagnostics {
    pub fn note_unmapped_city(&mut self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            return;
        }
        if !self.unmapped_cities.iter().any(|c| c == city) {
            self.unmapped_cities.push(city.to_string());
        }
    }

    pub fn note_unclassified_party(&mut self, party: &str) {
        let party = party.trim();
        if party.is_empty() {
            return;
        }
        if !self.unclassified_parties.iter().any(|p| p == party) {
            self.unclassified_parties.push(party.to_string());
        }
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.malformed_dates += other.malformed_dates;
        self.coerced_numbers += other.coerced_numbers;
        self.test_consignments_skipped += other.test_consignments_skipped;
        for city in other.unmapped_cities {
            self.note_unmapped_city(&city);
        }
        for party in other.unclassified_parties {
            self.note_unclassified_party(&party);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.malformed_dates == 0
            && self.coerced_numbers == 0
            && self.test_consignments_skipped == 0
            && self.unmapped_cities.is_empty()
            && self.unclassified_parties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_status_parse() {
        assert_eq!(TripStatus::parse(" loaded "), TripStatus::Loaded);
        assert_eq!(TripStatus::parse("EMPTY"), TripStatus::Empty);
        assert_eq!(
            TripStatus::parse("In Transit"),
            TripStatus::Other("In Transit".to_string())
        );
    }

    #[test]
    fn test_vehicle_class_parse() {
        assert_eq!(VehicleClass::parse("Own Vehicle"), VehicleClass::OwnVehicle);
        assert_eq!(VehicleClass::parse("HIRE VEHICLE"), VehicleClass::HireVehicle);
        assert_eq!(
            VehicleClass::parse("Attached"),
            VehicleClass::Other("Attached".to_string())
        );
    }

    #[test]
    fn test_date_range_validation() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let range = DateRange::new(start, end).unwrap();
        assert_eq!(range.inclusive_days(), 31);
        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));

        assert!(DateRange::new(end, start).is_err());
    }

    #[test]
    fn test_diagnostics_merge_dedupes() {
        let mut a = Diagnostics::default();
        a.note_unmapped_city("NOWHEREVILLE");
        a.malformed_dates = 1;

        let mut b = Diagnostics::default();
        b.note_unmapped_city("NOWHEREVILLE");
        b.note_unmapped_city("ELSEWHERE");
        b.coerced_numbers = 2;

        a.merge(b);
        assert_eq!(a.unmapped_cities, vec!["NOWHEREVILLE", "ELSEWHERE"]);
        assert_eq!(a.malformed_dates, 1);
        assert_eq!(a.coerced_numbers, 2);
    }

    #[test]
    fn test_category_order_matches_enumeration() {
        assert_eq!(Category::ORDERED[0], Category::Honda);
        assert_eq!(Category::ORDERED[14], Category::Other);
        assert_eq!(Category::ORDERED.len(), 15);
    }
}
