//! Gazetteer classifier: free-text counterparty names to business
//! categories, free-text cities to zones, and alias normalization.
//!
//! The rules are plain data owned by a [`Gazetteer`] value built once and
//! passed into the normalizer, so tests can run against alternate tables.
//! Rule order matters and is part of the output contract.

use crate::schema::{Category, Zone};
use crate::utils::normalize_key;
use std::collections::BTreeMap;

/// One substring rule: if the uppercased name contains any keyword,
/// the rule's category applies. First matching rule wins.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub keywords: Vec<String>,
    pub category: Category,
}

impl CategoryRule {
    fn new(keywords: &[&str], category: Category) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            category,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Gazetteer {
    category_rules: Vec<CategoryRule>,
    /// Ordered zone lists. Evaluation order is North, East, West, South;
    /// a city matching two lists resolves to the earlier one. The lists
    /// are long and hand-maintained, so overlaps are a known limitation
    /// of the data, not something the classifier tries to repair.
    zone_lists: Vec<(Zone, Vec<String>)>,
    /// Exact-match raw name -> canonical display name.
    aliases: BTreeMap<String, String>,
    /// Exact-match vendor billing party -> canonical display name.
    /// Billing parties absent from this table fall into the single
    /// "Market Load" bucket.
    vendor_billing: BTreeMap<String, String>,
}

impl Gazetteer {
    pub fn new(
        category_rules: Vec<CategoryRule>,
        zone_lists: Vec<(Zone, Vec<String>)>,
        aliases: BTreeMap<String, String>,
        vendor_billing: BTreeMap<String, String>,
    ) -> Self {
        Self {
            category_rules,
            zone_lists,
            aliases,
            vendor_billing,
        }
    }

    /// Total, deterministic category assignment. Null/blank and unmatched
    /// names classify as `Other`; this never fails.
    pub fn classify_category(&self, name: &str) -> Category {
        let name = normalize_key(name);
        if name.is_empty() {
            return Category::Other;
        }
        for rule in &self.category_rules {
            if rule.keywords.iter().any(|k| name.contains(k.as_str())) {
                return rule.category;
            }
        }
        Category::Other
    }

    /// Zone lookup over the ordered gazetteer lists. A match occurs when
    /// the city contains a list entry or a list entry contains the city,
    /// which covers both abbreviations ("BLR YARD") and padded names
    /// ("CHAKAN, PUNE"). Blank input is `Other`.
    pub fn classify_zone(&self, city: &str) -> Zone {
        let city = normalize_key(city);
        if city.is_empty() {
            return Zone::Other;
        }
        for (zone, entries) in &self.zone_lists {
            for entry in entries {
                if city.contains(entry.as_str()) || entry.contains(city.as_str()) {
                    return *zone;
                }
            }
        }
        Zone::Other
    }

    /// Exact-match alias lookup; identity (trimmed) when no alias applies.
    pub fn normalize_party_alias(&self, name: &str) -> String {
        match self.aliases.get(&normalize_key(name)) {
            Some(canonical) => canonical.clone(),
            None => name.trim().to_string(),
        }
    }

    /// Canonical display name for a vendor billing party.
    ///
    /// Mahindra Logistics is billed from one entity but operated per
    /// plant, so its rows are re-mapped to regional canonical names by
    /// consignment origin before the allow-list is consulted. Unknown
    /// billing parties all land in the "Market Load" bucket.
    pub fn vendor_canonical(&self, billing_party: &str, origin: &str) -> String {
        let key = normalize_key(billing_party);

        if key.contains("MAHINDRA LOGISTICS") {
            let origin = normalize_key(origin);
            for (needle, region) in [
                ("CHAKAN", "Chakan"),
                ("NASHIK", "Nashik"),
                ("HARIDWAR", "Haridwar"),
            ] {
                if origin.contains(needle) {
                    return format!("Mahindra Logistics Ltd - {region}");
                }
            }
        }

        match self.vendor_billing.get(&key) {
            Some(canonical) => canonical.clone(),
            None => "Market Load".to_string(),
        }
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::new(
            default_category_rules(),
            default_zone_lists(),
            default_aliases(),
            default_vendor_billing(),
        )
    }
}

/// Presentation colour for a category's subtotal row.
pub fn category_color(category: Category) -> &'static str {
    match category {
        Category::Honda => "#ff6b35",
        Category::MandM => "#2e8b57",
        Category::Toyota => "#4169e1",
        Category::Skoda => "#8b5cf6",
        Category::Glovis => "#f59e0b",
        Category::Tata => "#06b6d4",
        Category::JohnDeere => "#84cc16",
        Category::Spinny => "#f43f5e",
        Category::JswMg => "#a855f7",
        Category::RSai => "#0ea5e9",
        Category::MohanLogistics => "#10b981",
        Category::SaiAuto => "#eab308",
        Category::Kwick => "#14b8a6",
        Category::MarketLoad => "#ec4899",
        Category::Other => "#6b7280",
    }
}

fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(&["HONDA"], Category::Honda),
        CategoryRule::new(
            &["MAHINDRA", "M & M", "M&M", "MSTC", "TRAIN LOAD"],
            Category::MandM,
        ),
        CategoryRule::new(&["TOYOTA", "TRANSYSTEM", "DC MOVEMENT"], Category::Toyota),
        CategoryRule::new(&["SKODA", "VOLKSWAGEN"], Category::Skoda),
        CategoryRule::new(&["GLOVIS"], Category::Glovis),
        CategoryRule::new(&["TATA"], Category::Tata),
        CategoryRule::new(&["JOHN DEERE", "JOHNDEERE"], Category::JohnDeere),
        CategoryRule::new(&["SPINNY", "VALUEDRIVE"], Category::Spinny),
        CategoryRule::new(&["JSW", "MG MOTOR"], Category::JswMg),
        CategoryRule::new(&["R.SAI", "R SAI", "RSAI"], Category::RSai),
        CategoryRule::new(&["MOHAN"], Category::MohanLogistics),
        CategoryRule::new(&["SAI AUTO"], Category::SaiAuto),
        CategoryRule::new(&["KWICK"], Category::Kwick),
        CategoryRule::new(&["MARKET LOAD"], Category::MarketLoad),
    ]
}

fn list(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|e| e.to_string()).collect()
}

fn default_zone_lists() -> Vec<(Zone, Vec<String>)> {
    vec![
        (
            Zone::North,
            list(&[
                "DELHI", "GURGAON", "GURUGRAM", "NOIDA", "FARIDABAD", "GHAZIABAD",
                "CHANDIGARH", "AMBALA", "KARNAL", "PANIPAT", "LUDHIANA", "JALANDHAR",
                "AMRITSAR", "JAIPUR", "JODHPUR", "ALWAR", "NEEMRANA", "BHIWADI",
                "REWARI", "ROHTAK", "HISAR", "MEERUT", "LUCKNOW", "KANPUR", "AGRA",
                "VARANASI", "DEHRADUN", "HARIDWAR", "RUDRAPUR", "PANTNAGAR", "JAMMU",
                "SRINAGAR",
            ]),
        ),
        (
            Zone::East,
            list(&[
                "KOLKATA", "HOWRAH", "ASANSOL", "SILIGURI", "DURGAPUR", "KHARAGPUR",
                "PATNA", "MUZAFFARPUR", "GAYA", "RANCHI", "JAMSHEDPUR", "DHANBAD",
                "BOKARO", "BHUBANESWAR", "CUTTACK", "ROURKELA", "SAMBALPUR",
                "GUWAHATI", "DIMAPUR", "AGARTALA", "IMPHAL",
            ]),
        ),
        (
            Zone::West,
            list(&[
                "MUMBAI", "THANE", "PANVEL", "PUNE", "CHAKAN", "PIMPRI", "CHINCHWAD",
                "NASHIK", "AURANGABAD", "NAGPUR", "KOLHAPUR", "SATARA", "SANGLI",
                "GOA", "PANAJI", "AHMEDABAD", "SANAND", "SURAT", "VADODARA",
                "RAJKOT", "HALOL", "BHARUCH", "INDORE", "BHOPAL", "PITHAMPUR",
                "UJJAIN",
            ]),
        ),
        (
            Zone::South,
            list(&[
                "CHENNAI", "SRIPERUMBUDUR", "ORAGADAM", "HOSUR", "BANGALORE",
                "BENGALURU", "BIDADI", "MYSORE", "MYSURU", "HYDERABAD", "ZAHEERABAD",
                "SECUNDERABAD", "VIJAYAWADA", "VISAKHAPATNAM", "GUNTUR", "TIRUPATI",
                "COIMBATORE", "MADURAI", "TRICHY", "SALEM", "KOCHI", "COCHIN",
                "TRIVANDRUM", "CALICUT", "MANGALORE", "HUBLI", "BELGAUM",
            ]),
        ),
    ]
}

fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (normalize_key(k), v.to_string()))
        .collect()
}

fn default_aliases() -> BTreeMap<String, String> {
    map(&[
        ("HONDA CARS INDIA LIMITED", "Honda Cars India Ltd"),
        ("HONDA CARS INDIA LTD.", "Honda Cars India Ltd"),
        ("MAHINDRA & MAHINDRA LIMITED", "Mahindra & Mahindra Ltd"),
        ("M & M LTD", "Mahindra & Mahindra Ltd"),
        ("M&M LTD", "Mahindra & Mahindra Ltd"),
        ("TOYOTA KIRLOSKAR MOTOR PVT. LTD.", "Toyota Kirloskar Motor"),
        ("TOYOTA KIRLOSKAR MOTORS PVT LTD", "Toyota Kirloskar Motor"),
        (
            "SKODA AUTO VOLKSWAGEN INDIA PRIVATE LIMITED",
            "Skoda Auto Volkswagen India",
        ),
        ("GLOVIS INDIA PVT. LTD.", "Glovis India Pvt Ltd"),
        ("GLOVIS INDIA PRIVATE LIMITED", "Glovis India Pvt Ltd"),
        ("TATA MOTORS LIMITED", "Tata Motors Ltd"),
        ("TATA MOTORS LTD.", "Tata Motors Ltd"),
    ])
}

fn default_vendor_billing() -> BTreeMap<String, String> {
    map(&[
        ("GLOVIS INDIA PVT LTD", "Glovis India Pvt Ltd"),
        ("GLOVIS INDIA PVT LTD - KIA", "Glovis India Pvt Ltd - KIA"),
        ("MAHINDRA LOGISTICS LTD", "MAHINDRA LOGISTICS LTD"),
        ("MAHINDRA LOGISTICS LTD.", "MAHINDRA LOGISTICS LTD"),
        (
            "TRANSYSTEM LOGISTICS INTERNATIONAL PVT LTD",
            "Transystem Logistics International",
        ),
        (
            "R.SAI LOGISTICS (INDIA) PVT LTD",
            "R.Sai Logistics (India) Pvt Ltd",
        ),
        ("MOHAN LOGISTICS", "Mohan Logistics"),
        ("SAI AUTO CARRIERS", "SAI Auto Carriers"),
        ("KWICK CARRIERS PVT LTD", "Kwick Carriers Pvt Ltd"),
        ("JSW MG MOTOR INDIA PVT LTD", "JSW MG Motor India"),
        ("TATA MOTORS LTD", "Tata Motors Ltd"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_is_total_and_deterministic() {
        let gaz = Gazetteer::default();
        let inputs = [
            "Honda Cars India Ltd",
            "MAHINDRA LOGISTICS LTD.",
            "random trader",
            "",
            "   ",
            "Glovis India Pvt Ltd - KIA",
        ];
        for input in inputs {
            let first = gaz.classify_category(input);
            let second = gaz.classify_category(input);
            assert_eq!(first, second, "classification must be deterministic");
        }
        assert_eq!(gaz.classify_category(""), Category::Other);
        assert_eq!(gaz.classify_category("random trader"), Category::Other);
    }

    #[test]
    fn test_category_first_rule_wins() {
        let gaz = Gazetteer::default();
        // "MAHINDRA" appears before "MARKET LOAD" rules; a name containing
        // both resolves to the earlier rule.
        assert_eq!(
            gaz.classify_category("Mahindra Market Load Division"),
            Category::MandM
        );
        assert_eq!(gaz.classify_category("honda cars"), Category::Honda);
        assert_eq!(gaz.classify_category("TRANSYSTEM LOGISTICS"), Category::Toyota);
        assert_eq!(gaz.classify_category("Train Load - Ex Nagpur"), Category::MandM);
    }

    #[test]
    fn test_zone_priority_order() {
        // Fixture with the same city in two lists: North must win because
        // it is evaluated first.
        let gaz = Gazetteer::new(
            vec![],
            vec![
                (Zone::North, list(&["AMBIGUE"])),
                (Zone::South, list(&["AMBIGUE"])),
            ],
            BTreeMap::new(),
            BTreeMap::new(),
        );
        assert_eq!(gaz.classify_zone("Ambigue"), Zone::North);
    }

    #[test]
    fn test_zone_bidirectional_containment() {
        let gaz = Gazetteer::default();
        // City token padded beyond the gazetteer entry.
        assert_eq!(gaz.classify_zone("Chakan, Pune"), Zone::West);
        // City token shorter than the gazetteer entry.
        assert_eq!(gaz.classify_zone("BANGAL"), Zone::South);
        assert_eq!(gaz.classify_zone("New Delhi"), Zone::North);
        assert_eq!(gaz.classify_zone("Kolkata Yard"), Zone::East);
        assert_eq!(gaz.classify_zone(""), Zone::Other);
        assert_eq!(gaz.classify_zone("Timbuktu"), Zone::Other);
    }

    #[test]
    fn test_party_alias_identity_when_absent() {
        let gaz = Gazetteer::default();
        assert_eq!(
            gaz.normalize_party_alias("HONDA CARS INDIA LIMITED"),
            "Honda Cars India Ltd"
        );
        assert_eq!(gaz.normalize_party_alias(" Unknown Carrier "), "Unknown Carrier");
    }

    #[test]
    fn test_vendor_canonical_allow_list_and_default() {
        let gaz = Gazetteer::default();
        assert_eq!(
            gaz.vendor_canonical("Glovis India Pvt Ltd - KIA", "Anantapur"),
            "Glovis India Pvt Ltd - KIA"
        );
        assert_eq!(
            gaz.vendor_canonical("Some Tiny Fleet Owner", "Pune"),
            "Market Load"
        );
    }

    #[test]
    fn test_category_colors_are_distinct() {
        let mut seen = std::collections::BTreeSet::new();
        for category in Category::ORDERED {
            assert!(seen.insert(category_color(category)));
        }
    }

    #[test]
    fn test_mahindra_origin_split() {
        let gaz = Gazetteer::default();
        assert_eq!(
            gaz.vendor_canonical("MAHINDRA LOGISTICS LTD.", "Chakan, Pune"),
            "Mahindra Logistics Ltd - Chakan"
        );
        assert_eq!(
            gaz.vendor_canonical("MAHINDRA LOGISTICS LTD.", "Nashik"),
            "Mahindra Logistics Ltd - Nashik"
        );
        assert_eq!(
            gaz.vendor_canonical("MAHINDRA LOGISTICS LTD.", "Haridwar"),
            "Mahindra Logistics Ltd - Haridwar"
        );
        // Non-plant origin keeps the un-split canonical name.
        assert_eq!(
            gaz.vendor_canonical("MAHINDRA LOGISTICS LTD.", "Chennai"),
            "MAHINDRA LOGISTICS LTD"
        );
    }
}
