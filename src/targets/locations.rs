//! Location registry, onset baselines and national aggregation weights.
//!
//! Regions (national, HHS regions, census divisions) carry an onset baseline
//! and therefore an onset target; states, territories, cities and
//! hospitalization age groups do not.

/// Geographic or demographic granularity of a location code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Region,
    State,
    Territory,
    City,
    AgeGroup,
}

/// The ten HHS regions in their canonical order.
pub const HHS_REGIONS: [&str; 10] =
    ["hhs1", "hhs2", "hhs3", "hhs4", "hhs5", "hhs6", "hhs7", "hhs8", "hhs9", "hhs10"];

/// Population weights combining HHS regional wILI into a national value.
pub const HHS_NATIONAL_WEIGHTS: [f64; 10] = [
    0.045286439944771467,
    0.10177386656841922,
    0.095681349146225586,
    0.19610707945020625,
    0.16310640558744591,
    0.12488754783066998,
    0.043916824425230531,
    0.034124204104827027,
    0.15298339758467921,
    0.041244820532846248,
];

const REGISTRY: &[(LocationKind, &str, &str)] = &[
    (LocationKind::Region, "nat", "US National"),
    (LocationKind::Region, "hhs1", "HHS Region 1"),
    (LocationKind::Region, "hhs2", "HHS Region 2"),
    (LocationKind::Region, "hhs3", "HHS Region 3"),
    (LocationKind::Region, "hhs4", "HHS Region 4"),
    (LocationKind::Region, "hhs5", "HHS Region 5"),
    (LocationKind::Region, "hhs6", "HHS Region 6"),
    (LocationKind::Region, "hhs7", "HHS Region 7"),
    (LocationKind::Region, "hhs8", "HHS Region 8"),
    (LocationKind::Region, "hhs9", "HHS Region 9"),
    (LocationKind::Region, "hhs10", "HHS Region 10"),
    (LocationKind::Region, "cen1", "New England"),
    (LocationKind::Region, "cen2", "Mid-Atlantic"),
    (LocationKind::Region, "cen3", "East North Central"),
    (LocationKind::Region, "cen4", "West North Central"),
    (LocationKind::Region, "cen5", "South Atlantic"),
    (LocationKind::Region, "cen6", "East South Central"),
    (LocationKind::Region, "cen7", "West South Central"),
    (LocationKind::Region, "cen8", "Mountain"),
    (LocationKind::Region, "cen9", "Pacific"),
    (LocationKind::State, "al", "Alabama"),
    (LocationKind::State, "ak", "Alaska"),
    (LocationKind::State, "az", "Arizona"),
    (LocationKind::State, "ar", "Arkansas"),
    (LocationKind::State, "ca", "California"),
    (LocationKind::State, "co", "Colorado"),
    (LocationKind::State, "ct", "Connecticut"),
    (LocationKind::State, "de", "Delaware"),
    (LocationKind::State, "fl", "Florida"),
    (LocationKind::State, "ga", "Georgia"),
    (LocationKind::State, "hi", "Hawaii"),
    (LocationKind::State, "id", "Idaho"),
    (LocationKind::State, "il", "Illinois"),
    (LocationKind::State, "in", "Indiana"),
    (LocationKind::State, "ia", "Iowa"),
    (LocationKind::State, "ks", "Kansas"),
    (LocationKind::State, "ky", "Kentucky"),
    (LocationKind::State, "la", "Louisiana"),
    (LocationKind::State, "me", "Maine"),
    (LocationKind::State, "md", "Maryland"),
    (LocationKind::State, "ma", "Massachusetts"),
    (LocationKind::State, "mi", "Michigan"),
    (LocationKind::State, "mn", "Minnesota"),
    (LocationKind::State, "ms", "Mississippi"),
    (LocationKind::State, "mo", "Missouri"),
    (LocationKind::State, "mt", "Montana"),
    (LocationKind::State, "ne", "Nebraska"),
    (LocationKind::State, "nv", "Nevada"),
    (LocationKind::State, "nh", "New Hampshire"),
    (LocationKind::State, "nj", "New Jersey"),
    (LocationKind::State, "nm", "New Mexico"),
    (LocationKind::State, "ny", "New York"),
    (LocationKind::State, "nc", "North Carolina"),
    (LocationKind::State, "nd", "North Dakota"),
    (LocationKind::State, "oh", "Ohio"),
    (LocationKind::State, "ok", "Oklahoma"),
    (LocationKind::State, "or", "Oregon"),
    (LocationKind::State, "pa", "Pennsylvania"),
    (LocationKind::State, "ri", "Rhode Island"),
    (LocationKind::State, "sc", "South Carolina"),
    (LocationKind::State, "sd", "South Dakota"),
    (LocationKind::State, "tn", "Tennessee"),
    (LocationKind::State, "tx", "Texas"),
    (LocationKind::State, "ut", "Utah"),
    (LocationKind::State, "vt", "Vermont"),
    (LocationKind::State, "va", "Virginia"),
    (LocationKind::State, "wa", "Washington"),
    (LocationKind::State, "wv", "West Virginia"),
    (LocationKind::State, "wi", "Wisconsin"),
    (LocationKind::State, "wy", "Wyoming"),
    (LocationKind::Territory, "as", "American Samoa"),
    (LocationKind::Territory, "mp", "Commonwealth of the Northern Mariana Islands"),
    (LocationKind::Territory, "dc", "District of Columbia"),
    (LocationKind::Territory, "gu", "Guam"),
    (LocationKind::Territory, "pr", "Puerto Rico"),
    (LocationKind::Territory, "vi", "Virgin Islands"),
    (LocationKind::City, "ord", "Chicago"),
    (LocationKind::City, "lax", "Los Angeles"),
    (LocationKind::City, "jfk", "New York City"),
    (LocationKind::AgeGroup, "rate_age_0", "0-4 yr"),
    (LocationKind::AgeGroup, "rate_age_1", "5-17 yr"),
    (LocationKind::AgeGroup, "rate_age_2", "18-49 yr"),
    (LocationKind::AgeGroup, "rate_age_3", "50-64 yr"),
    (LocationKind::AgeGroup, "rate_age_4", "65 + yr"),
    (LocationKind::AgeGroup, "rate_overall", "Overall"),
];

// National + HHS regions, in that order.
const BASELINE_TABLES: &[(i32, [f64; 11])] = &[
    (2014, [2.0, 1.2, 2.3, 2.0, 1.9, 1.7, 3.3, 1.7, 1.3, 2.7, 1.1]),
    (2015, [2.1, 1.3, 2.3, 1.8, 1.6, 1.9, 3.6, 1.7, 1.4, 2.6, 1.1]),
    (2016, [2.2, 1.4, 3.0, 2.2, 1.7, 1.9, 4.1, 1.8, 1.4, 2.5, 1.1]),
    (2017, [2.2, 1.4, 3.1, 2.0, 1.9, 1.8, 4.2, 1.9, 1.3, 2.4, 1.4]),
    (2019, [2.4, 1.9, 3.2, 1.9, 2.4, 1.9, 3.8, 1.7, 2.7, 2.4, 1.5]),
];

/// Kind of a known location code; `None` for unregistered codes.
pub fn kind(code: &str) -> Option<LocationKind> {
    REGISTRY.iter().find(|(_, c, _)| *c == code).map(|(k, _, _)| *k)
}

/// Whether `code` is a region (and so has an onset target).
///
/// Unregistered codes are treated as non-regions.
pub fn is_region(code: &str) -> bool {
    kind(code) == Some(LocationKind::Region)
}

pub fn display_name(code: &str) -> Option<&'static str> {
    REGISTRY.iter().find(|(_, c, _)| *c == code).map(|(_, _, d)| *d)
}

pub fn code_for_display_name(name: &str) -> Option<&'static str> {
    REGISTRY.iter().find(|(_, _, d)| *d == name).map(|(_, c, _)| *c)
}

/// Published CDC onset baseline for a region in a season, if tabulated.
pub fn onset_baseline(season: i32, code: &str) -> Option<f64> {
    let index = match code {
        "nat" => 0,
        other => HHS_REGIONS.iter().position(|r| *r == other)? + 1,
    };
    BASELINE_TABLES.iter().find(|(s, _)| *s == season).map(|(_, table)| table[index])
}

/// Weighted national aggregate of regional values.
///
/// Extra values or weights beyond the shorter of the two slices are ignored.
pub fn national(regional: &[f64], weights: &[f64]) -> f64 {
    regional.iter().zip(weights).map(|(v, w)| v * w).sum()
}
