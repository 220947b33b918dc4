use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{CollectionRecord, LabStatus, LabView};

/// Calendar days elapsed between the last collection and `now`.
/// Time of day is ignored; a collection stamped "in the future" on the
/// same day (timezone skew in the source) clamps to 0.
pub fn days_between(last: NaiveDate, now: NaiveDate) -> i64 {
    (now - last).num_days().max(0)
}

/// A lab is active iff it collected within the activity window.
/// Labs without a valid last collection are never active.
pub fn is_active(days_since: Option<i64>, window_days: i64) -> bool {
    matches!(days_since, Some(days) if days <= window_days)
}

/// A lab needs follow-up iff it is past the alert threshold, or never
/// collected at all. Independent from the activity window.
pub fn needs_alert(days_since: Option<i64>, threshold_days: i64) -> bool {
    match days_since {
        Some(days) => days > threshold_days,
        None => true,
    }
}

/// Most recent collection per lab.
pub fn last_collections(records: &[CollectionRecord]) -> HashMap<&str, NaiveDateTime> {
    let mut last: HashMap<&str, NaiveDateTime> = HashMap::new();
    for record in records {
        last.entry(record.lab_id.as_str())
            .and_modify(|at| {
                if record.collected_at > *at {
                    *at = record.collected_at;
                }
            })
            .or_insert(record.collected_at);
    }
    last
}

/// Join each lab with its most recent collection and classify it against
/// the activity window.
pub fn classify(
    labs: &[LabView],
    records: &[CollectionRecord],
    now: NaiveDate,
    window_days: i64,
) -> Vec<LabStatus> {
    let last = last_collections(records);

    labs.iter()
        .map(|lab| {
            let last_collection = last.get(lab.id.as_str()).copied();
            let days_since = last_collection.map(|at| days_between(at.date(), now));
            LabStatus {
                lab: lab.clone(),
                last_collection,
                days_since,
                active: is_active(days_since, window_days),
            }
        })
        .collect()
}
