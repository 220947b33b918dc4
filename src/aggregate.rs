use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;

use crate::activity;
use crate::models::{
    Category, CategorySummary, CollectionRecord, LabStatus, LabView, LabVolume, NewAccreditation,
    RepMetrics, TrendPoint, VolumeKpis,
};

/// Ratio with the division-by-zero rule the whole dashboard relies on:
/// a zero denominator yields zero, never an error.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Time bucket for trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Week,
    Month,
}

fn bucket_key(record: &CollectionRecord, bucket: TimeBucket) -> String {
    let date = record.collected_at.date();
    match bucket {
        TimeBucket::Month => format!("{:04}-{:02}", date.year(), date.month()),
        TimeBucket::Week => {
            let week = date.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
    }
}

fn group_entry<'a>(
    groups: &'a mut HashMap<(String, Category), RepMetrics>,
    name: &str,
    category: Category,
) -> &'a mut RepMetrics {
    groups
        .entry((name.to_string(), category))
        .or_insert_with(|| RepMetrics {
            name: name.to_string(),
            category,
            credentialed_labs: 0,
            active_labs: 0,
            inactive_labs: 0,
            total_collections: 0,
            activation_rate: 0.0,
            productivity: 0.0,
        })
}

/// Per-representative performance metrics, grouped by (name, category).
///
/// Every representative in `universe` appears, zero-valued when the
/// current filters leave them without labs or collections.
pub fn representative_metrics(
    universe: &[(String, Category)],
    statuses: &[LabStatus],
    records: &[CollectionRecord],
) -> Vec<RepMetrics> {
    let mut groups: HashMap<(String, Category), RepMetrics> = HashMap::new();

    for (name, category) in universe {
        group_entry(&mut groups, name, *category);
    }

    for status in statuses {
        if !status.lab.credentialed {
            continue;
        }
        let metrics = group_entry(&mut groups, &status.lab.representative, status.lab.category);
        metrics.credentialed_labs += 1;
        if status.active {
            metrics.active_labs += 1;
        }
    }

    for record in records {
        let metrics = group_entry(&mut groups, &record.representative, record.category);
        metrics.total_collections += 1;
    }

    let mut metrics: Vec<RepMetrics> = groups.into_values().collect();
    for m in &mut metrics {
        m.inactive_labs = m.credentialed_labs.saturating_sub(m.active_labs);
        m.activation_rate = ratio(m.active_labs, m.credentialed_labs);
        m.productivity = ratio(m.total_collections, m.active_labs);
    }
    metrics
}

/// Internal vs External rollup. Both categories always appear, so the
/// dashboard can render a zero line instead of dropping one.
pub fn category_summary(statuses: &[LabStatus], records: &[CollectionRecord]) -> Vec<CategorySummary> {
    [Category::Internal, Category::External]
        .into_iter()
        .map(|category| {
            let credentialed = statuses
                .iter()
                .filter(|s| s.lab.category == category && s.lab.credentialed)
                .count();
            let active = statuses
                .iter()
                .filter(|s| s.lab.category == category && s.lab.credentialed && s.active)
                .count();
            let collections = records.iter().filter(|r| r.category == category).count();
            CategorySummary {
                category,
                credentialed_labs: credentialed,
                active_labs: active,
                inactive_labs: credentialed.saturating_sub(active),
                total_collections: collections,
                activation_rate: ratio(active, credentialed),
                productivity: ratio(collections, active),
            }
        })
        .collect()
}

/// Per-lab collection volumes for the lab ranking. Only labs with at
/// least one collection in the filtered set appear, matching the
/// original ranking page.
pub fn lab_volumes(statuses: &[LabStatus], records: &[CollectionRecord]) -> Vec<LabVolume> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.lab_id.as_str()).or_default() += 1;
    }

    statuses
        .iter()
        .filter_map(|status| {
            let collections = *counts.get(status.lab.id.as_str())?;
            Some(LabVolume {
                lab_id: status.lab.id.clone(),
                name: status.lab.name.clone(),
                cnpj: status.lab.cnpj.clone(),
                representative: status.lab.representative.clone(),
                category: status.lab.category,
                collections,
                last_collection: status.last_collection,
                active: status.active,
            })
        })
        .collect()
}

/// Labs credentialed within the last `months_back` months (30-day
/// months, matching the commercial follow-up cadence), most recent
/// first.
pub fn new_accreditations(
    labs: &[LabView],
    now: chrono::NaiveDate,
    months_back: u32,
) -> Vec<NewAccreditation> {
    let cutoff = now - chrono::Duration::days(i64::from(months_back) * 30);

    let mut recent: Vec<NewAccreditation> = labs
        .iter()
        .filter(|lab| lab.credentialed)
        .filter_map(|lab| {
            let accredited_at = lab.accredited_at?;
            if accredited_at.date() < cutoff {
                return None;
            }
            Some(NewAccreditation {
                lab_id: lab.id.clone(),
                name: lab.name.clone(),
                cnpj: lab.cnpj.clone(),
                representative: lab.representative.clone(),
                category: lab.category,
                accredited_at,
                days_accredited: activity::days_between(accredited_at.date(), now),
            })
        })
        .collect();

    recent.sort_by(|a, b| b.accredited_at.cmp(&a.accredited_at));
    recent
}

/// Volume series per (bucket, category), sorted by bucket then category.
/// Internal and External are separate lines, never merged.
pub fn volume_series(records: &[CollectionRecord], bucket: TimeBucket) -> Vec<TrendPoint> {
    let mut counts: BTreeMap<(String, Category), usize> = BTreeMap::new();
    for record in records {
        *counts
            .entry((bucket_key(record, bucket), record.category))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((bucket, category), collections)| TrendPoint {
            bucket,
            category,
            collections,
        })
        .collect()
}

/// Consolidated monthly KPIs. Categories are summed per month first so
/// the min/max/avg describe whole months, not per-category lines.
pub fn monthly_kpis(monthly: &[TrendPoint]) -> VolumeKpis {
    let mut per_month: BTreeMap<&str, usize> = BTreeMap::new();
    for point in monthly {
        *per_month.entry(point.bucket.as_str()).or_default() += point.collections;
    }

    if per_month.is_empty() {
        return VolumeKpis {
            total: 0,
            max_month: 0,
            min_month: 0,
            avg_month: 0,
        };
    }

    let total: usize = per_month.values().sum();
    let max_month = per_month.values().copied().max().unwrap_or(0);
    let min_month = per_month.values().copied().min().unwrap_or(0);
    VolumeKpis {
        total,
        max_month,
        min_month,
        avg_month: total / per_month.len(),
    }
}
