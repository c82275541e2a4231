//! Deduplication simulation.
//!
//! Partitions duplicate files by (grouping attribute, exact content hash)
//! and selects one member per partition to keep under a retention strategy.
//! The simulation only produces a plan; it never touches the snapshot.
//!
//! Unlike duplicate detection, the exact hash is required here: a snapshot
//! without a hash column yields an empty plan, and the name+size
//! pseudo-hash is never used.

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fileaudit_core::{Column, FileRecord, Snapshot};

/// Action tag on every drop entry.
pub const ACTION_DELETE_DUPLICATE: &str = "delete-duplicate";

/// Which member of a duplicate partition survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionStrategy {
    /// Keep the largest member; ties keep the first encountered.
    KeepLargest,
    /// Keep the earliest creation date, falling back to modification date.
    KeepEarliest,
    /// Keep the latest modification date, falling back to access date.
    KeepLatest,
    /// Keep the first encountered member.
    KeepFirst,
}

impl RetentionStrategy {
    /// Parse a strategy name.
    ///
    /// Unrecognized names map to [`RetentionStrategy::KeepFirst`] — a safe
    /// default, not an error.
    pub fn from_name(name: &str) -> Self {
        match name {
            "keep-largest" => Self::KeepLargest,
            "keep-earliest" => Self::KeepEarliest,
            "keep-latest" => Self::KeepLatest,
            _ => Self::KeepFirst,
        }
    }

    /// Stable kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepLargest => "keep-largest",
            Self::KeepEarliest => "keep-earliest",
            Self::KeepLatest => "keep-latest",
            Self::KeepFirst => "keep-first",
        }
    }
}

/// One simulated removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropEntry {
    /// Preferred path of the record to drop.
    pub path: String,

    /// Size in bytes, when known.
    pub size: Option<u64>,

    /// Grouping attribute value of the partition (missing values group
    /// together).
    pub group: Option<CompactString>,

    /// Content hash of the partition.
    pub hash: CompactString,

    /// Always [`ACTION_DELETE_DUPLICATE`].
    pub action: CompactString,

    /// Preferred path of the member kept in this partition.
    pub keep_ref: String,
}

/// A simulated deduplication plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupPlan {
    /// Drop entries, one per removable duplicate, in partition encounter
    /// order.
    pub drops: Vec<DropEntry>,

    /// Sum of the known sizes of all drop entries.
    pub savings_bytes: u64,
}

impl DedupPlan {
    /// Check whether the plan removes anything.
    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }

    fn empty() -> Self {
        Self {
            drops: Vec::new(),
            savings_bytes: 0,
        }
    }
}

/// Ordered fallbacks when the requested grouping column is absent.
const GROUP_CANDIDATES: [Column; 4] = [
    Column::Folder,
    Column::Owner,
    Column::Extension,
    Column::Root,
];

/// Resolve the grouping column: the requested one when present, else the
/// first present candidate, else `None` (group by hash alone).
fn resolve_group_column(snapshot: &Snapshot, requested: Column) -> Option<Column> {
    if snapshot.has_column(requested) {
        return Some(requested);
    }
    GROUP_CANDIDATES
        .into_iter()
        .find(|c| snapshot.has_column(*c))
}

fn group_value(record: &FileRecord, column: Option<Column>) -> Option<CompactString> {
    match column? {
        Column::Folder => record.folder.clone(),
        Column::Owner => record.owner.clone(),
        Column::Extension => record.extension.clone(),
        Column::Root => record.root.clone(),
        _ => None,
    }
}

/// Pick the index of the member to keep, per strategy.
///
/// Date-based strategies walk an explicit column fallback list; when no
/// date column is present (or every value is missing) the first encountered
/// member wins. All ties resolve to the first encountered.
fn select_keeper(members: &[&FileRecord], snapshot: &Snapshot, strategy: RetentionStrategy) -> usize {
    match strategy {
        RetentionStrategy::KeepLargest => {
            let mut best = 0;
            for (i, m) in members.iter().enumerate().skip(1) {
                if m.size > members[best].size {
                    best = i;
                }
            }
            best
        }
        RetentionStrategy::KeepEarliest => {
            let date = |r: &FileRecord| {
                if snapshot.has_column(Column::Created) {
                    r.created
                } else if snapshot.has_column(Column::Modified) {
                    r.modified
                } else {
                    None
                }
            };
            let mut best = 0;
            for (i, m) in members.iter().enumerate().skip(1) {
                match (date(m), date(members[best])) {
                    (Some(d), Some(b)) if d < b => best = i,
                    (Some(_), None) => best = i,
                    _ => {}
                }
            }
            best
        }
        RetentionStrategy::KeepLatest => {
            let date = |r: &FileRecord| {
                if snapshot.has_column(Column::Modified) {
                    r.modified
                } else if snapshot.has_column(Column::Accessed) {
                    r.accessed
                } else {
                    None
                }
            };
            let mut best = 0;
            for (i, m) in members.iter().enumerate().skip(1) {
                match (date(m), date(members[best])) {
                    (Some(d), Some(b)) if d > b => best = i,
                    (Some(_), None) => best = i,
                    _ => {}
                }
            }
            best
        }
        RetentionStrategy::KeepFirst => 0,
    }
}

/// Simulate deduplication within (grouping value, hash) partitions.
///
/// For every partition with more than one member, exactly one member is
/// kept and the rest become drop entries referencing the keeper's path.
/// Records with a missing hash value never enter a partition.
pub fn simulate_dedup(
    snapshot: &Snapshot,
    group_by: Column,
    strategy: RetentionStrategy,
) -> DedupPlan {
    if !snapshot.has_column(Column::Hash) {
        return DedupPlan::empty();
    }

    let group_column = resolve_group_column(snapshot, group_by);

    let mut partitions: IndexMap<(Option<CompactString>, CompactString), Vec<&FileRecord>> =
        IndexMap::new();
    for record in &snapshot.records {
        let Some(hash) = record.hash.clone() else {
            continue;
        };
        partitions
            .entry((group_value(record, group_column), hash))
            .or_default()
            .push(record);
    }

    let mut drops: Vec<DropEntry> = Vec::new();
    let mut savings_bytes: u64 = 0;

    for ((group, hash), members) in &partitions {
        if members.len() <= 1 {
            continue;
        }
        let keeper = select_keeper(members, snapshot, strategy);
        let keep_ref = members[keeper].preferred_path().to_string();

        for (i, member) in members.iter().enumerate() {
            if i == keeper {
                continue;
            }
            savings_bytes += member.size.unwrap_or(0);
            drops.push(DropEntry {
                path: member.preferred_path().to_string(),
                size: member.size,
                group: group.clone(),
                hash: hash.clone(),
                action: CompactString::const_new(ACTION_DELETE_DUPLICATE),
                keep_ref: keep_ref.clone(),
            });
        }
    }

    debug!(
        group_column = ?group_column,
        strategy = strategy.as_str(),
        drops = drops.len(),
        savings_bytes,
        "dedup simulation complete"
    );

    DedupPlan {
        drops,
        savings_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fileaudit_core::{ColumnSet, FileRecordBuilder};

    fn day(d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn rec(name: &str, folder: &str, hash: &str, size: u64) -> FileRecordBuilder {
        let mut b = FileRecordBuilder::default();
        b.name(name)
            .relative_path(format!("{folder}/{name}"))
            .folder(folder)
            .hash(hash)
            .size(size);
        b
    }

    fn columns() -> ColumnSet {
        ColumnSet::new()
            .with(Column::Hash)
            .with(Column::Size)
            .with(Column::Folder)
    }

    #[test]
    fn test_keep_largest_with_tie_to_first() {
        let snapshot = Snapshot::new(
            vec![
                rec("a", "docs", "h", 50).build().unwrap(),
                rec("b", "docs", "h", 100).build().unwrap(),
                rec("c", "docs", "h", 100).build().unwrap(),
            ],
            columns(),
        );

        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepLargest);
        assert_eq!(plan.drops.len(), 2);
        // b wins the 100-byte tie by encounter order.
        assert!(plan.drops.iter().all(|d| d.keep_ref == "docs/b"));
        assert_eq!(plan.savings_bytes, 150);
    }

    #[test]
    fn test_one_keep_per_partition() {
        let snapshot = Snapshot::new(
            vec![
                rec("a", "x", "h1", 10).build().unwrap(),
                rec("b", "x", "h1", 10).build().unwrap(),
                rec("c", "y", "h1", 10).build().unwrap(),
                rec("d", "y", "h2", 10).build().unwrap(),
            ],
            columns(),
        );

        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepFirst);
        // Only the (x, h1) partition has two members; (y, h1) and (y, h2)
        // are singletons.
        assert_eq!(plan.drops.len(), 1);
        assert_eq!(plan.drops[0].path, "x/b");
        assert_eq!(plan.drops[0].keep_ref, "x/a");
        assert_eq!(plan.drops[0].action, ACTION_DELETE_DUPLICATE);
        assert_eq!(plan.savings_bytes, 10);
    }

    #[test]
    fn test_keep_earliest_prefers_created_then_modified() {
        let mut a = rec("a", "x", "h", 1).build().unwrap();
        a.created = Some(day(20));
        let mut b = rec("b", "x", "h", 1).build().unwrap();
        b.created = Some(day(5));

        let snapshot = Snapshot::new(
            vec![a, b],
            columns().with(Column::Created),
        );
        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepEarliest);
        assert_eq!(plan.drops[0].path, "x/a");
        assert_eq!(plan.drops[0].keep_ref, "x/b");

        // Without a created column, modification dates decide.
        let mut a = rec("a", "x", "h", 1).build().unwrap();
        a.modified = Some(day(20));
        let mut b = rec("b", "x", "h", 1).build().unwrap();
        b.modified = Some(day(5));
        let snapshot = Snapshot::new(vec![a, b], columns().with(Column::Modified));
        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepEarliest);
        assert_eq!(plan.drops[0].keep_ref, "x/b");
    }

    #[test]
    fn test_keep_latest_falls_back_to_first_without_dates() {
        let snapshot = Snapshot::new(
            vec![
                rec("a", "x", "h", 1).build().unwrap(),
                rec("b", "x", "h", 1).build().unwrap(),
            ],
            columns(),
        );
        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepLatest);
        assert_eq!(plan.drops[0].keep_ref, "x/a");
    }

    #[test]
    fn test_unrecognized_strategy_name_is_keep_first() {
        assert_eq!(
            RetentionStrategy::from_name("keep-shiniest"),
            RetentionStrategy::KeepFirst
        );
        assert_eq!(
            RetentionStrategy::from_name("keep-largest"),
            RetentionStrategy::KeepLargest
        );
    }

    #[test]
    fn test_grouping_falls_back_to_first_present_column() {
        // No folder column: owner is the first present candidate.
        let mut a = rec("a", "x", "h", 1).build().unwrap();
        a.folder = None;
        a.owner = Some("alice".into());
        let mut b = rec("b", "x", "h", 1).build().unwrap();
        b.folder = None;
        b.owner = Some("bob".into());

        let snapshot = Snapshot::new(
            vec![a, b],
            ColumnSet::new()
                .with(Column::Hash)
                .with(Column::Size)
                .with(Column::Owner),
        );
        // Same hash, different owners: no partition exceeds one member.
        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepFirst);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_hash_only_grouping_when_no_candidate_present() {
        let mut a = rec("a", "x", "h", 2).build().unwrap();
        a.folder = None;
        let mut b = rec("b", "y", "h", 3).build().unwrap();
        b.folder = None;

        let snapshot = Snapshot::new(
            vec![a, b],
            ColumnSet::new().with(Column::Hash).with(Column::Size),
        );
        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepFirst);
        assert_eq!(plan.drops.len(), 1);
        assert_eq!(plan.savings_bytes, 3);
    }

    #[test]
    fn test_no_hash_column_yields_empty_plan() {
        let snapshot = Snapshot::new(
            vec![rec("a", "x", "h", 1).build().unwrap()],
            ColumnSet::new().with(Column::Size).with(Column::Folder),
        );
        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepLargest);
        assert!(plan.is_empty());
        assert_eq!(plan.savings_bytes, 0);
    }

    #[test]
    fn test_empty_snapshot_yields_empty_plan() {
        let snapshot = Snapshot::new(Vec::new(), columns());
        let plan = simulate_dedup(&snapshot, Column::Folder, RetentionStrategy::KeepLargest);
        assert!(plan.is_empty());
        assert_eq!(plan.savings_bytes, 0);
    }
}
