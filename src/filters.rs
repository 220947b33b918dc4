use std::collections::{HashMap, HashSet};

use chrono::Datelike;

use crate::models::{Category, CollectionRecord, Dataset, LabView};
use crate::normalize::NO_REPRESENTATIVE;

/// Operator-selected filters, owned by the caller and passed into every
/// pipeline invocation. The pipeline holds no filter state of its own.
#[derive(Debug, Clone)]
pub struct FilterParams {
    pub year: i32,
    /// Activity window in days (7-60).
    pub activity_window_days: i64,
    /// `None` means both categories.
    pub category: Option<Category>,
    /// Clean representative names; empty means all.
    pub representatives: Vec<String>,
    /// Case-insensitive substring over lab name or CNPJ.
    pub search: Option<String>,
}

/// Filtered view over the dataset. `records` carries the selected year
/// only; `history` carries all years for the same labs, which is what
/// the alerts page classifies against.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub labs: Vec<LabView>,
    pub records: Vec<CollectionRecord>,
    pub history: Vec<CollectionRecord>,
    /// Post-filter representative universe, so aggregation can seed
    /// zero-valued groups instead of dropping them.
    pub representatives: Vec<(String, Category)>,
}

fn matches_search(lab: &LabView, query: &str) -> bool {
    let query = query.to_lowercase();
    lab.name.to_lowercase().contains(&query) || lab.cnpj.contains(query.trim())
}

/// Apply year, category, representative and search filters to the
/// snapshot, joining labs with their representatives along the way.
pub fn apply(dataset: &Dataset, params: &FilterParams) -> Snapshot {
    let reps_by_id: HashMap<&str, (&str, Category)> = dataset
        .representatives
        .iter()
        .map(|rep| (rep.id.as_str(), (rep.name.as_str(), rep.category)))
        .collect();

    let mut labs: Vec<LabView> = dataset
        .labs
        .iter()
        .map(|lab| {
            let (representative, category) = lab
                .representative_id
                .as_deref()
                .and_then(|id| reps_by_id.get(id).copied())
                .unwrap_or((NO_REPRESENTATIVE, Category::External));
            LabView {
                id: lab.id.clone(),
                name: lab.fantasy_name.clone(),
                cnpj: lab.cnpj.clone(),
                representative: representative.to_string(),
                category,
                credentialed: lab.credentialed,
                accredited_at: lab.created_at,
            }
        })
        .collect();

    if let Some(category) = params.category {
        labs.retain(|lab| lab.category == category);
    }
    if !params.representatives.is_empty() {
        labs.retain(|lab| params.representatives.contains(&lab.representative));
    }
    if let Some(query) = params.search.as_deref() {
        if !query.trim().is_empty() {
            labs.retain(|lab| matches_search(lab, query));
        }
    }

    let lab_index: HashMap<&str, &LabView> =
        labs.iter().map(|lab| (lab.id.as_str(), lab)).collect();

    let mut history = Vec::new();
    for gathering in &dataset.gatherings {
        if !gathering.reportable() {
            continue;
        }
        let Some(collected_at) = gathering.collected_at else {
            continue;
        };
        let Some(lab) = lab_index.get(gathering.lab_id.as_str()) else {
            continue;
        };
        history.push(CollectionRecord {
            lab_id: lab.id.clone(),
            representative: lab.representative.clone(),
            category: lab.category,
            collected_at,
        });
    }

    let records: Vec<CollectionRecord> = history
        .iter()
        .filter(|record| record.collected_at.year() == params.year)
        .cloned()
        .collect();

    let mut seen: HashSet<(String, Category)> = HashSet::new();
    let mut representatives = Vec::new();
    for lab in &labs {
        let key = (lab.representative.clone(), lab.category);
        if seen.insert(key.clone()) {
            representatives.push(key);
        }
    }
    // Explicitly selected representatives stay visible even with zero
    // labs under the current filters.
    for rep in dataset.representatives.iter() {
        if params.representatives.contains(&rep.name)
            && params.category.map_or(true, |c| c == rep.category)
        {
            let key = (rep.name.clone(), rep.category);
            if seen.insert(key.clone()) {
                representatives.push(key);
            }
        }
    }

    Snapshot {
        labs,
        records,
        history,
        representatives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GatheringRecord, LabRecord, RepresentativeRecord};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn dataset() -> Dataset {
        Dataset {
            representatives: vec![
                RepresentativeRecord {
                    id: "r1".to_string(),
                    name: "JOAO SILVA".to_string(),
                    category: Category::Internal,
                },
                RepresentativeRecord {
                    id: "r2".to_string(),
                    name: "MARIA".to_string(),
                    category: Category::External,
                },
            ],
            labs: vec![
                LabRecord {
                    id: "l1".to_string(),
                    fantasy_name: "Lab Alfa".to_string(),
                    cnpj: "00111222000133".to_string(),
                    representative_id: Some("r1".to_string()),
                    credentialed: true,
                    created_at: None,
                },
                LabRecord {
                    id: "l2".to_string(),
                    fantasy_name: "Lab Beta".to_string(),
                    cnpj: "00444555000166".to_string(),
                    representative_id: Some("r2".to_string()),
                    credentialed: true,
                    created_at: None,
                },
                LabRecord {
                    id: "l3".to_string(),
                    fantasy_name: "Lab Gama".to_string(),
                    cnpj: String::new(),
                    representative_id: None,
                    credentialed: false,
                    created_at: None,
                },
            ],
            gatherings: vec![
                GatheringRecord {
                    lab_id: "l1".to_string(),
                    collected_at: Some(at(2025, 3, 10)),
                    active: true,
                    disabled_in_report: false,
                },
                GatheringRecord {
                    lab_id: "l1".to_string(),
                    collected_at: Some(at(2024, 11, 2)),
                    active: true,
                    disabled_in_report: false,
                },
                GatheringRecord {
                    lab_id: "l2".to_string(),
                    collected_at: Some(at(2025, 4, 1)),
                    active: true,
                    disabled_in_report: true,
                },
                GatheringRecord {
                    lab_id: "l2".to_string(),
                    collected_at: None,
                    active: true,
                    disabled_in_report: false,
                },
            ],
        }
    }

    fn params() -> FilterParams {
        FilterParams {
            year: 2025,
            activity_window_days: 15,
            category: None,
            representatives: Vec::new(),
            search: None,
        }
    }

    #[test]
    fn year_filter_splits_records_from_history() {
        let snapshot = apply(&dataset(), &params());
        // l2's gatherings are disabled-in-report or dateless.
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.records[0].collected_at.year(), 2025);
    }

    #[test]
    fn category_filter_restricts_labs_and_records() {
        let mut p = params();
        p.category = Some(Category::External);
        let snapshot = apply(&dataset(), &p);
        // l2 (External) and l3 (no rep, defaults External).
        assert_eq!(snapshot.labs.len(), 2);
        assert!(snapshot.records.is_empty());
    }

    #[test]
    fn missing_representative_defaults_to_placeholder() {
        let snapshot = apply(&dataset(), &params());
        let gama = snapshot.labs.iter().find(|l| l.id == "l3").unwrap();
        assert_eq!(gama.representative, NO_REPRESENTATIVE);
        assert_eq!(gama.category, Category::External);
    }

    #[test]
    fn search_matches_name_or_cnpj() {
        let mut p = params();
        p.search = Some("beta".to_string());
        assert_eq!(apply(&dataset(), &p).labs.len(), 1);

        p.search = Some("00111222".to_string());
        let snapshot = apply(&dataset(), &p);
        assert_eq!(snapshot.labs.len(), 1);
        assert_eq!(snapshot.labs[0].id, "l1");
    }

    #[test]
    fn selected_rep_without_labs_stays_in_universe() {
        let mut p = params();
        p.representatives = vec!["MARIA".to_string()];
        p.search = Some("alfa".to_string());
        let snapshot = apply(&dataset(), &p);
        assert!(snapshot.labs.is_empty());
        assert!(snapshot
            .representatives
            .contains(&("MARIA".to_string(), Category::External)));
    }
}
