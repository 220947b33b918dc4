use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Dataset, GatheringRecord, LabRecord, RepresentativeRecord};
use crate::normalize;

/// Blind-sample laboratory excluded from every metric, overridable via
/// the `EXCLUDED_LAB_ID` env var.
pub const DEFAULT_EXCLUDED_LAB_ID: &str = "5aa61aeeef23e80010b1224e";

/// Entity ids come in as raw Mongo export cells; keep the 24-hex token
/// when one is embedded (e.g. `ObjectId("...")`), the trimmed cell
/// otherwise.
fn normalize_object_id(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut run = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_hexdigit() {
            run += 1;
            if run == 24 {
                return raw[i + 1 - 24..=i].to_string();
            }
        } else {
            run = 0;
        }
    }
    raw.trim().to_string()
}

/// CNPJ: digits only, left-padded to the canonical 14. Empty stays empty.
fn normalize_cnpj(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return digits;
    }
    format!("{digits:0>14}")
}

/// Lenient timestamp parsing; export files mix RFC 3339 and naive
/// formats, and some cells are plain garbage. Garbage becomes `None`
/// and never aborts the load.
fn parse_datetime(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(at.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(at);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => {
            value.eq_ignore_ascii_case("true") || value == "1"
        }
        _ => default,
    }
}

fn is_empty_cell(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), None | Some("")) || raw.map(str::trim) == Some("nan")
}

pub fn load_dataset(data_dir: &Path, excluded_lab_id: &str) -> anyhow::Result<Dataset> {
    let representatives = load_representatives(&data_dir.join("representatives.csv"))?;
    let labs = load_labs(&data_dir.join("laboratories.csv"), excluded_lab_id)?;
    let gatherings = load_gatherings(&data_dir.join("gatherings.csv"))?;

    tracing::info!(
        representatives = representatives.len(),
        labs = labs.len(),
        gatherings = gatherings.len(),
        "dataset loaded"
    );

    Ok(Dataset {
        representatives,
        labs,
        gatherings,
    })
}

fn load_representatives(path: &Path) -> anyhow::Result<Vec<RepresentativeRecord>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        #[serde(rename = "_id")]
        id: String,
        name: Option<String>,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result.with_context(|| format!("bad row in {}", path.display()))?;
        let name_cell = row.name.as_deref().filter(|cell| !is_empty_cell(Some(cell)));
        records.push(RepresentativeRecord {
            id: normalize_object_id(&row.id),
            category: normalize::categorize(name_cell),
            name: normalize::clean_representative_name(name_cell),
        });
    }

    Ok(records)
}

fn load_labs(path: &Path, excluded_lab_id: &str) -> anyhow::Result<Vec<LabRecord>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        #[serde(rename = "_id")]
        id: String,
        #[serde(rename = "fantasyName")]
        fantasy_name: Option<String>,
        cnpj: Option<String>,
        #[serde(rename = "_representative")]
        representative: Option<String>,
        active: Option<String>,
        #[serde(rename = "createdAt")]
        created_at: Option<String>,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result.with_context(|| format!("bad row in {}", path.display()))?;
        let id = normalize_object_id(&row.id);
        if id == excluded_lab_id {
            continue;
        }
        let fantasy_name = match row.fantasy_name {
            Some(ref name) if !is_empty_cell(Some(name)) => name.trim().to_string(),
            _ => String::new(),
        };
        records.push(LabRecord {
            id,
            fantasy_name,
            cnpj: normalize_cnpj(row.cnpj.as_deref().unwrap_or_default()),
            representative_id: row
                .representative
                .as_deref()
                .filter(|cell| !is_empty_cell(Some(cell)))
                .map(normalize_object_id),
            credentialed: parse_bool(row.active.as_deref(), true),
            created_at: parse_datetime(row.created_at.as_deref()),
        });
    }

    Ok(records)
}

fn load_gatherings(path: &Path) -> anyhow::Result<Vec<GatheringRecord>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        #[serde(rename = "_laboratory")]
        laboratory: String,
        #[serde(rename = "createdAt")]
        created_at: Option<String>,
        active: Option<String>,
        #[serde(rename = "disabledInReport")]
        disabled_in_report: Option<String>,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut records = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result.with_context(|| format!("bad row in {}", path.display()))?;
        records.push(GatheringRecord {
            lab_id: normalize_object_id(&row.laboratory),
            collected_at: parse_datetime(row.created_at.as_deref()),
            active: parse_bool(row.active.as_deref(), true),
            disabled_in_report: parse_bool(row.disabled_in_report.as_deref(), false),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_keep_the_hex_token() {
        assert_eq!(
            normalize_object_id("ObjectId(\"5aa61aeeef23e80010b1224e\")"),
            "5aa61aeeef23e80010b1224e"
        );
        assert_eq!(
            normalize_object_id("5aa61aeeef23e80010b1224e"),
            "5aa61aeeef23e80010b1224e"
        );
        assert_eq!(normalize_object_id(" not-an-id "), "not-an-id");
    }

    #[test]
    fn cnpj_pads_to_fourteen_digits() {
        assert_eq!(normalize_cnpj("1.112.220/0013-3"), "00011122200133");
        assert_eq!(normalize_cnpj("00111222000133"), "00111222000133");
        assert_eq!(normalize_cnpj(""), "");
    }

    #[test]
    fn dates_parse_leniently() {
        assert!(parse_datetime(Some("2025-03-10T12:30:00Z")).is_some());
        assert!(parse_datetime(Some("2025-03-10 12:30:00")).is_some());
        assert!(parse_datetime(Some("2025-03-10")).is_some());
        assert_eq!(parse_datetime(Some("not a date")), None);
        assert_eq!(parse_datetime(Some("")), None);
        assert_eq!(parse_datetime(None), None);
    }

    #[test]
    fn bools_parse_pandas_spelling() {
        assert!(parse_bool(Some("True"), false));
        assert!(parse_bool(Some("1"), false));
        assert!(!parse_bool(Some("False"), true));
        assert!(parse_bool(None, true));
        assert!(!parse_bool(None, false));
    }
}
