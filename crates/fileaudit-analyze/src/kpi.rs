//! Summary statistics and KPI tables.
//!
//! Everything here is a plain derived table: a fixed size-bucket histogram,
//! an ordered KPI list for dashboards, and a handful of smaller aggregates
//! (overview, largest files, per-folder usage). Each degrades to an empty
//! or zeroed result when the columns it needs are absent.

use compact_str::CompactString;
use humansize::{format_size, BINARY};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use fileaudit_core::{Column, RiskPolicy, Snapshot};

use crate::duplicates::find_duplicates;
use crate::risk::best_date;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Fixed half-open size ranges, ascending.
const SIZE_RANGES: [(&str, u64, u64); 5] = [
    ("0-10 MB", 0, 10 * MIB),
    ("10-100 MB", 10 * MIB, 100 * MIB),
    ("100 MB-1 GB", 100 * MIB, GIB),
    ("1-10 GB", GIB, 10 * GIB),
    ("10+ GB", 10 * GIB, u64::MAX),
];

/// One row of the size histogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeBucket {
    /// Range label.
    pub label: CompactString,
    /// Number of records whose size falls in the range.
    pub count: u64,
}

/// Histogram of record sizes over the fixed ranges.
///
/// Records without a known size are excluded; empty buckets still appear
/// with count 0, in range order. Bucket counts therefore sum to the number
/// of records with a known size.
pub fn size_buckets(snapshot: &Snapshot) -> Vec<SizeBucket> {
    let mut counts = [0u64; SIZE_RANGES.len()];
    for record in &snapshot.records {
        let Some(size) = record.size else { continue };
        for (i, (_, lower, upper)) in SIZE_RANGES.iter().enumerate() {
            if size >= *lower && (size < *upper || *upper == u64::MAX) {
                counts[i] += 1;
                break;
            }
        }
    }
    SIZE_RANGES
        .iter()
        .zip(counts)
        .map(|((label, _, _), count)| SizeBucket {
            label: CompactString::const_new(label),
            count,
        })
        .collect()
}

/// A KPI value, displayed as a plain count or a humanized byte total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KpiValue {
    /// Plain count.
    Count(u64),
    /// Byte total.
    Bytes(u64),
}

impl std::fmt::Display for KpiValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KpiValue::Count(n) => write!(f, "{n}"),
            KpiValue::Bytes(b) => write!(f, "{}", format_size(*b, BINARY)),
        }
    }
}

/// One KPI row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpi {
    /// Stable KPI name.
    pub name: CompactString,
    /// Value.
    pub value: KpiValue,
}

impl Kpi {
    fn new(name: &'static str, value: KpiValue) -> Self {
        Self {
            name: CompactString::const_new(name),
            value,
        }
    }
}

/// Dashboard KPIs, in fixed insertion order.
///
/// Duplicate figures reuse the duplicate detector; path and staleness
/// thresholds come from the injected policy. The stale count is emitted
/// only when a date column exists, and the missing-owner/missing-MIME
/// counts only when those columns exist.
pub fn advanced_kpis(snapshot: &Snapshot, policy: &RiskPolicy) -> Vec<Kpi> {
    let mut out = Vec::new();

    let dup = find_duplicates(snapshot);
    out.push(Kpi::new("duplicate_groups", KpiValue::Count(dup.group_count as u64)));
    out.push(Kpi::new(
        "potential_savings",
        KpiValue::Bytes(dup.recoverable_bytes),
    ));

    let long_paths = snapshot
        .records
        .iter()
        .filter(|r| r.path_len() > policy.long_path)
        .count() as u64;
    let deep_paths = snapshot
        .records
        .iter()
        .filter(|r| r.depth() > policy.deep_levels)
        .count() as u64;
    out.push(Kpi::new("long_paths", KpiValue::Count(long_paths)));
    out.push(Kpi::new("deep_paths", KpiValue::Count(deep_paths)));

    let has_dates = snapshot.has_column(Column::Accessed)
        || snapshot.has_column(Column::Modified)
        || snapshot.has_column(Column::Created);
    if has_dates {
        let stale = snapshot
            .records
            .iter()
            .filter(|r| {
                best_date(r).is_some_and(|d| {
                    (policy.reference_time - d).num_days() > policy.stale_days
                })
            })
            .count() as u64;
        out.push(Kpi::new("stale_files", KpiValue::Count(stale)));
    }

    if snapshot.has_column(Column::Owner) {
        let missing = snapshot.records.iter().filter(|r| r.owner.is_none()).count() as u64;
        out.push(Kpi::new("missing_owner", KpiValue::Count(missing)));
    }
    if snapshot.has_column(Column::MimeType) {
        let missing = snapshot
            .records
            .iter()
            .filter(|r| r.mime_type.is_none())
            .count() as u64;
        out.push(Kpi::new("missing_mime", KpiValue::Count(missing)));
    }

    out
}

/// Headline metrics for the whole snapshot.
///
/// Column-dependent fields are `None` when the column is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    /// Number of records.
    pub rows: usize,
    /// Sum of known sizes.
    pub total_bytes: Option<u64>,
    /// Humanized total size.
    pub total_human: Option<String>,
    /// Mean of known sizes.
    pub mean_bytes: Option<f64>,
    /// Records with size exactly zero.
    pub zero_byte_files: Option<u64>,
    /// Distinct extensions.
    pub unique_extensions: Option<usize>,
    /// Records without a hash value.
    pub missing_hashes: Option<u64>,
    /// Percentage of records flagged hidden.
    pub hidden_pct: Option<f64>,
    /// Percentage of records flagged read-only.
    pub read_only_pct: Option<f64>,
}

fn flag_pct(snapshot: &Snapshot, flag: impl Fn(&fileaudit_core::FileRecord) -> bool) -> f64 {
    if snapshot.is_empty() {
        return 0.0;
    }
    let set = snapshot.records.iter().filter(|r| flag(r)).count();
    set as f64 / snapshot.len() as f64 * 100.0
}

/// Compute headline metrics.
pub fn overview(snapshot: &Snapshot) -> Overview {
    let sizes = || snapshot.records.iter().filter_map(|r| r.size);

    let (total_bytes, total_human, mean_bytes, zero_byte_files) =
        if snapshot.has_column(Column::Size) {
            let total: u64 = sizes().sum();
            let known = sizes().count();
            let mean = if known > 0 {
                Some(total as f64 / known as f64)
            } else {
                None
            };
            let zero = sizes().filter(|s| *s == 0).count() as u64;
            (
                Some(total),
                Some(format_size(total, BINARY)),
                mean,
                Some(zero),
            )
        } else {
            (None, None, None, None)
        };

    let unique_extensions = snapshot.has_column(Column::Extension).then(|| {
        let mut seen: Vec<&str> = snapshot
            .records
            .iter()
            .filter_map(|r| r.extension.as_deref())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    });

    let missing_hashes = snapshot
        .has_column(Column::Hash)
        .then(|| snapshot.records.iter().filter(|r| r.hash.is_none()).count() as u64);

    let hidden_pct = snapshot
        .has_column(Column::Hidden)
        .then(|| flag_pct(snapshot, |r| r.hidden == Some(true)));
    let read_only_pct = snapshot
        .has_column(Column::ReadOnly)
        .then(|| flag_pct(snapshot, |r| r.read_only == Some(true)));

    Overview {
        rows: snapshot.len(),
        total_bytes,
        total_human,
        mean_bytes,
        zero_byte_files,
        unique_extensions,
        missing_hashes,
        hidden_pct,
        read_only_pct,
    }
}

/// One of the largest records in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargeFile {
    /// Preferred path.
    pub path: String,
    /// File name.
    pub name: CompactString,
    /// Size in bytes.
    pub size: u64,
}

/// The `n` largest records by size.
///
/// Empty when the size column is absent; records without a size never
/// appear.
pub fn top_by_size(snapshot: &Snapshot, n: usize) -> Vec<LargeFile> {
    if !snapshot.has_column(Column::Size) {
        return Vec::new();
    }
    let mut rows: Vec<LargeFile> = snapshot
        .records
        .iter()
        .filter_map(|r| {
            r.size.map(|size| LargeFile {
                path: r.preferred_path().to_string(),
                name: r.name.clone(),
                size,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.size.cmp(&a.size));
    rows.truncate(n);
    rows
}

/// Aggregate usage for one folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderUsage {
    /// Folder value; records without one group together here.
    pub folder: Option<CompactString>,
    /// Number of records.
    pub files: u64,
    /// Sum of known sizes.
    pub total_bytes: u64,
    /// Humanized byte total.
    pub total_human: String,
}

/// Per-folder file counts and byte totals, largest first.
///
/// Empty when the folder column is absent. Sorted descending by
/// (total bytes, files); ties keep encounter order.
pub fn usage_by_folder(snapshot: &Snapshot, top: usize) -> Vec<FolderUsage> {
    if !snapshot.has_column(Column::Folder) {
        return Vec::new();
    }
    let mut groups: IndexMap<Option<CompactString>, (u64, u64)> = IndexMap::new();
    for record in &snapshot.records {
        let entry = groups.entry(record.folder.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += record.size.unwrap_or(0);
    }
    let mut rows: Vec<FolderUsage> = groups
        .into_iter()
        .map(|(folder, (files, total_bytes))| FolderUsage {
            folder,
            files,
            total_bytes,
            total_human: format_size(total_bytes, BINARY),
        })
        .collect();
    rows.sort_by(|a, b| (b.total_bytes, b.files).cmp(&(a.total_bytes, a.files)));
    rows.truncate(top);
    rows
}
