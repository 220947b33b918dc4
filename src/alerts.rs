use std::collections::HashMap;

use crate::activity;
use crate::models::{AlertGroup, Category, InactiveLab, LabStatus};
use crate::rank;

/// Summary figures for the alerts page header.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertStats {
    pub labs: usize,
    /// Average days without collecting, over labs with a known last
    /// collection.
    pub avg_days: f64,
    pub max_days: i64,
}

/// Group inactive credentialed labs by representative for follow-up.
///
/// `statuses` must be classified against the full collection history,
/// not just the selected year; a lab that last collected in a previous
/// year is inactive, not unknown. Groups come out most severe first.
pub fn build_alerts(statuses: &[LabStatus], threshold_days: i64) -> Vec<AlertGroup> {
    let mut groups: HashMap<(String, Category), Vec<InactiveLab>> = HashMap::new();

    for status in statuses {
        if !status.lab.credentialed {
            continue;
        }
        if !activity::needs_alert(status.days_since, threshold_days) {
            continue;
        }
        groups
            .entry((status.lab.representative.clone(), status.lab.category))
            .or_default()
            .push(InactiveLab {
                lab_id: status.lab.id.clone(),
                name: status.lab.name.clone(),
                cnpj: status.lab.cnpj.clone(),
                last_collection: status.last_collection,
                days_since: status.days_since,
            });
    }

    let mut result: Vec<AlertGroup> = groups
        .into_iter()
        .map(|((representative, category), mut labs)| {
            // Never-collected labs first, then the longest silent.
            labs.sort_by(|a, b| match (a.days_since, b.days_since) {
                (None, None) => a.name.cmp(&b.name),
                (None, Some(_)) => std::cmp::Ordering::Less,
                (Some(_), None) => std::cmp::Ordering::Greater,
                (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.name.cmp(&b.name)),
            });
            AlertGroup {
                representative,
                category,
                labs,
            }
        })
        .collect();

    result = rank::rank_by(
        &result,
        |group| group.labs.len() as f64,
        |group| group.representative.as_str(),
    );
    result
}

pub fn alert_stats(groups: &[AlertGroup]) -> AlertStats {
    let labs = groups.iter().map(|g| g.labs.len()).sum();
    let known: Vec<i64> = groups
        .iter()
        .flat_map(|g| g.labs.iter().filter_map(|lab| lab.days_since))
        .collect();

    let avg_days = if known.is_empty() {
        0.0
    } else {
        known.iter().sum::<i64>() as f64 / known.len() as f64
    };

    AlertStats {
        labs,
        avg_days,
        max_days: known.into_iter().max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity;
    use crate::models::{CollectionRecord, LabView};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lab(id: &str, rep: &str) -> LabView {
        LabView {
            id: id.to_string(),
            name: format!("Lab {id}"),
            cnpj: String::new(),
            representative: rep.to_string(),
            category: Category::Internal,
            credentialed: true,
            accredited_at: None,
        }
    }

    fn record(lab_id: &str, at: NaiveDate) -> CollectionRecord {
        CollectionRecord {
            lab_id: lab_id.to_string(),
            representative: "JOAO SILVA".to_string(),
            category: Category::Internal,
            collected_at: at.and_hms_opt(14, 0, 0).unwrap(),
        }
    }

    #[test]
    fn stale_lab_lands_under_its_representative() {
        // One collection 40 days back, threshold 30.
        let now = date(2025, 6, 10);
        let labs = vec![lab("L1", "JOAO SILVA")];
        let records = vec![record("L1", date(2025, 5, 1))];
        let statuses = activity::classify(&labs, &records, now, 30);

        let groups = build_alerts(&statuses, 30);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].representative, "JOAO SILVA");
        assert_eq!(groups[0].labs[0].lab_id, "L1");
        assert_eq!(groups[0].labs[0].days_since, Some(40));
    }

    #[test]
    fn fresh_labs_are_not_alerted() {
        let now = date(2025, 6, 10);
        let labs = vec![lab("L1", "JOAO SILVA")];
        let records = vec![record("L1", date(2025, 6, 5))];
        let statuses = activity::classify(&labs, &records, now, 30);
        assert!(build_alerts(&statuses, 30).is_empty());
    }

    #[test]
    fn never_collected_sorts_most_severe() {
        let now = date(2025, 6, 10);
        let labs = vec![lab("L1", "JOAO SILVA"), lab("L2", "JOAO SILVA")];
        let records = vec![record("L1", date(2025, 1, 1))];
        let statuses = activity::classify(&labs, &records, now, 30);

        let groups = build_alerts(&statuses, 30);
        assert_eq!(groups[0].labs[0].lab_id, "L2");
        assert_eq!(groups[0].labs[0].days_since, None);
        assert_eq!(groups[0].labs[1].lab_id, "L1");
    }

    #[test]
    fn groups_sort_by_inactive_count() {
        let now = date(2025, 6, 10);
        let labs = vec![lab("L1", "ZELIA"), lab("L2", "ANA"), lab("L3", "ANA")];
        let statuses = activity::classify(&labs, &[], now, 30);

        let groups = build_alerts(&statuses, 30);
        assert_eq!(groups[0].representative, "ANA");
        assert_eq!(groups[0].labs.len(), 2);
        assert_eq!(groups[1].representative, "ZELIA");
    }

    #[test]
    fn stats_skip_unknown_days() {
        let now = date(2025, 6, 10);
        let labs = vec![lab("L1", "JOAO SILVA"), lab("L2", "JOAO SILVA")];
        let records = vec![record("L1", date(2025, 5, 1))];
        let statuses = activity::classify(&labs, &records, now, 30);

        let stats = alert_stats(&build_alerts(&statuses, 30));
        assert_eq!(stats.labs, 2);
        assert_eq!(stats.avg_days, 40.0);
        assert_eq!(stats.max_days, 40);
    }
}
