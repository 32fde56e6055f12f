//! Destination zone catalog.
//!
//! Zones are the column axis of every price matrix. The catalog order is the
//! standard column order; codes outside the catalog sort after it.

use crate::pricing::Destination;

/// Representative address used when probing rates for a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleAddress {
    pub city: &'static str,
    pub province: &'static str,
    pub postal_code: &'static str,
    pub country: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneDefinition {
    pub code: &'static str,
    pub name: &'static str,
    pub sample: SampleAddress,
}

pub const ZONE_ITALIA: &str = "IT-ITALIA";
pub const ZONE_SICILIA: &str = "IT-SICILIA";
pub const ZONE_CALABRIA: &str = "IT-CALABRIA";
pub const ZONE_SARDEGNA: &str = "IT-SARDEGNA";
pub const ZONE_LIVIGNO: &str = "IT-LIVIGNO";
pub const ZONE_ISOLE_MINORI: &str = "IT-ISOLE-MINORI";
pub const ZONE_DISAGIATE: &str = "IT-DISAGIATE";
pub const ZONE_EU_1: &str = "EU-ZONA1";
pub const ZONE_EU_2: &str = "EU-ZONA2";

pub const ZONE_CATALOG: [ZoneDefinition; 9] = [
    zone(ZONE_ITALIA, "Italia", "Milano", "MI", "20100", "IT"),
    zone(ZONE_SICILIA, "Sicilia", "Palermo", "PA", "90100", "IT"),
    zone(ZONE_CALABRIA, "Calabria", "Reggio Calabria", "RC", "89100", "IT"),
    zone(ZONE_SARDEGNA, "Sardegna", "Cagliari", "CA", "09100", "IT"),
    zone(ZONE_LIVIGNO, "Livigno", "Livigno", "SO", "23041", "IT"),
    zone(ZONE_ISOLE_MINORI, "Isole Minori", "Capri", "NA", "80073", "IT"),
    zone(ZONE_DISAGIATE, "Aree Disagiate", "Venezia", "VE", "30124", "IT"),
    zone(ZONE_EU_1, "Europa Zona 1", "München", "BY", "80331", "DE"),
    zone(ZONE_EU_2, "Europa Zona 2", "Madrid", "M", "28001", "ES"),
];

const fn zone(
    code: &'static str,
    name: &'static str,
    city: &'static str,
    province: &'static str,
    postal_code: &'static str,
    country: &'static str,
) -> ZoneDefinition {
    ZoneDefinition {
        code,
        name,
        sample: SampleAddress {
            city,
            province,
            postal_code,
            country,
        },
    }
}

const LEGACY_ZONE_CODES: [(&str, &str); 8] = [
    ("IT-STD", ZONE_ITALIA),
    ("IT-CAL", ZONE_CALABRIA),
    ("IT-SIC", ZONE_SICILIA),
    ("IT-SAR", ZONE_SARDEGNA),
    ("IT-VEN", ZONE_DISAGIATE),
    ("IT-LIV", ZONE_LIVIGNO),
    ("IT-ISO", ZONE_ISOLE_MINORI),
    ("EU-Z1", ZONE_EU_1),
];

const SARDEGNA_PROVINCES: [&str; 5] = ["CA", "NU", "OR", "SS", "SU"];
const CALABRIA_PROVINCES: [&str; 5] = ["RC", "CZ", "CS", "KR", "VV"];
const SICILIA_PROVINCES: [&str; 9] = ["PA", "CT", "ME", "AG", "CL", "EN", "RG", "SR", "TP"];

const LIVIGNO_PROVINCE: &str = "SO";
const LIVIGNO_ZIP: &str = "23041";

/// Italian zone codes in catalog order.
pub fn italian_zone_codes() -> Vec<&'static str> {
    ZONE_CATALOG
        .iter()
        .filter(|z| z.code.starts_with("IT-"))
        .map(|z| z.code)
        .collect()
}

pub fn all_zone_codes() -> Vec<&'static str> {
    ZONE_CATALOG.iter().map(|z| z.code).collect()
}

pub fn find_zone(code: &str) -> Option<&'static ZoneDefinition> {
    let code = normalize_zone_code(code);
    ZONE_CATALOG.iter().find(|z| z.code == code)
}

/// Canonical form of a zone code: trimmed, upper-cased, legacy aliases mapped.
pub fn normalize_zone_code(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    LEGACY_ZONE_CODES
        .iter()
        .find(|(legacy, _)| *legacy == upper)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(upper)
}

/// Display name of a zone; unknown codes are shown as-is.
pub fn zone_display_name(code: &str) -> String {
    find_zone(code)
        .map(|z| z.name.to_string())
        .unwrap_or_else(|| code.trim().to_string())
}

/// Position of the zone in the standard column order.
pub fn zone_sort_index(code: &str) -> usize {
    let code = normalize_zone_code(code);
    ZONE_CATALOG
        .iter()
        .position(|z| z.code == code)
        .unwrap_or(ZONE_CATALOG.len())
}

/// Sample destination for probing a zone. Unknown zones probe the mainland sample.
pub fn sample_address(code: &str) -> SampleAddress {
    find_zone(code)
        .map(|z| z.sample)
        .unwrap_or(ZONE_CATALOG[0].sample)
}

/// Resolve the pricing zone of a destination.
///
/// Priority: explicit zone code, foreign country, province, region, then
/// mainland Italy. Every foreign destination is priced at the first EU tier.
pub fn resolve_zone(destination: &Destination) -> String {
    if let Some(code) = non_empty(destination.zone_code.as_deref()) {
        return normalize_zone_code(code);
    }

    let foreign = non_empty(destination.country.as_deref())
        .map_or(false, |country| !country.eq_ignore_ascii_case("IT"));
    if foreign {
        return ZONE_EU_1.to_string();
    }

    if let Some(province) = non_empty(destination.province.as_deref()) {
        let province = province.to_ascii_uppercase();
        if SARDEGNA_PROVINCES.contains(&province.as_str()) {
            return ZONE_SARDEGNA.to_string();
        }
        if CALABRIA_PROVINCES.contains(&province.as_str()) {
            return ZONE_CALABRIA.to_string();
        }
        if SICILIA_PROVINCES.contains(&province.as_str()) {
            return ZONE_SICILIA.to_string();
        }
        // Only Livigno itself; the rest of Sondrio is mainland.
        if province == LIVIGNO_PROVINCE
            && non_empty(destination.zip.as_deref()) == Some(LIVIGNO_ZIP)
        {
            return ZONE_LIVIGNO.to_string();
        }
    }

    if let Some(region) = non_empty(destination.region.as_deref()) {
        match region.to_lowercase().as_str() {
            "sardegna" | "sardinia" => return ZONE_SARDEGNA.to_string(),
            "calabria" => return ZONE_CALABRIA.to_string(),
            "sicilia" | "sicily" => return ZONE_SICILIA.to_string(),
            _ => {}
        }
    }

    ZONE_ITALIA.to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
