use chrono::NaiveDateTime;
use serde::Serialize;

/// Commercial category of a representative, derived from the raw name
/// prefix at ingestion and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Internal,
    External,
}

impl Category {
    /// Portuguese label used on every operator-facing surface.
    pub fn label(self) -> &'static str {
        match self {
            Category::Internal => "Interno",
            Category::External => "Externo",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct RepresentativeRecord {
    pub id: String,
    /// Display name with technical prefixes stripped. Category is
    /// derived from the raw name before stripping.
    pub name: String,
    pub category: Category,
}

#[derive(Debug, Clone)]
pub struct LabRecord {
    pub id: String,
    pub fantasy_name: String,
    /// Normalized to 14 digits; empty when the source cell was empty.
    pub cnpj: String,
    pub representative_id: Option<String>,
    /// Credentialed in the source system (`active` column).
    pub credentialed: bool,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct GatheringRecord {
    pub lab_id: String,
    /// `None` when the source date was missing or unparseable.
    pub collected_at: Option<NaiveDateTime>,
    pub active: bool,
    pub disabled_in_report: bool,
}

impl GatheringRecord {
    /// Collections that count towards dashboard volumes.
    pub fn reportable(&self) -> bool {
        self.active && !self.disabled_in_report
    }
}

/// Immutable session snapshot, loaded once and passed by reference
/// through every pipeline call.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub representatives: Vec<RepresentativeRecord>,
    pub labs: Vec<LabRecord>,
    pub gatherings: Vec<GatheringRecord>,
}

/// Lab joined with its owning representative.
#[derive(Debug, Clone)]
pub struct LabView {
    pub id: String,
    pub name: String,
    pub cnpj: String,
    pub representative: String,
    pub category: Category,
    pub credentialed: bool,
    pub accredited_at: Option<NaiveDateTime>,
}

/// One observed collection event after the lab/representative join.
#[derive(Debug, Clone)]
pub struct CollectionRecord {
    pub lab_id: String,
    pub representative: String,
    pub category: Category,
    pub collected_at: NaiveDateTime,
}

/// Activity classification for a single lab.
#[derive(Debug, Clone)]
pub struct LabStatus {
    pub lab: LabView,
    pub last_collection: Option<NaiveDateTime>,
    /// Calendar days since the last collection; `None` when the lab
    /// never collected.
    pub days_since: Option<i64>,
    pub active: bool,
}

/// Per-representative performance metrics.
#[derive(Debug, Clone, Serialize)]
pub struct RepMetrics {
    pub name: String,
    pub category: Category,
    pub credentialed_labs: usize,
    pub active_labs: usize,
    pub inactive_labs: usize,
    pub total_collections: usize,
    /// active / credentialed, in [0, 1]; 0 when nothing is credentialed.
    pub activation_rate: f64,
    /// collections / active labs; 0 when nothing is active.
    pub productivity: f64,
}

/// Category-level rollup of the same metrics.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub credentialed_labs: usize,
    pub active_labs: usize,
    pub inactive_labs: usize,
    pub total_collections: usize,
    pub activation_rate: f64,
    pub productivity: f64,
}

/// Per-lab collection volume, feed for the lab ranking.
#[derive(Debug, Clone, Serialize)]
pub struct LabVolume {
    pub lab_id: String,
    pub name: String,
    pub cnpj: String,
    pub representative: String,
    pub category: Category,
    pub collections: usize,
    pub last_collection: Option<NaiveDateTime>,
    pub active: bool,
}

/// One point of a weekly/monthly volume series. Internal and External
/// lines are never merged.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub bucket: String,
    pub category: Category,
    pub collections: usize,
}

/// Consolidated monthly KPIs.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeKpis {
    pub total: usize,
    pub max_month: usize,
    pub min_month: usize,
    pub avg_month: usize,
}

/// Lab credentialed within the recent accreditation lookback.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccreditation {
    pub lab_id: String,
    pub name: String,
    pub cnpj: String,
    pub representative: String,
    pub category: Category,
    pub accredited_at: NaiveDateTime,
    pub days_accredited: i64,
}

/// Inactive lab entry inside an alert group.
#[derive(Debug, Clone, Serialize)]
pub struct InactiveLab {
    pub lab_id: String,
    pub name: String,
    pub cnpj: String,
    pub last_collection: Option<NaiveDateTime>,
    pub days_since: Option<i64>,
}

/// Follow-up alert group for one representative.
#[derive(Debug, Clone, Serialize)]
pub struct AlertGroup {
    pub representative: String,
    pub category: Category,
    pub labs: Vec<InactiveLab>,
}
