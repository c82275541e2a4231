//! Duplicate detection over an inventory snapshot.
//!
//! Records are grouped by identity: the exact content hash when the
//! snapshot carries one, otherwise a `name|size` fallback key. The fallback
//! is a deliberate approximation — two unrelated files sharing name and
//! size in different folders collide as "duplicates". Downstream consumers
//! can tell which key was used from [`DuplicateReport::key_kind`].

use compact_str::{format_compact, CompactString};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fileaudit_core::{Column, FileRecord, Snapshot};

/// Which identity key a duplicate report was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKeyKind {
    /// Exact caller-supplied content hash.
    ContentHash,
    /// `name|size` pseudo-hash fallback.
    NameSize,
    /// Neither key was available; the report is empty.
    Unavailable,
}

/// A group of records sharing one identity key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Shared identity key.
    pub key: CompactString,

    /// Number of records in the group (always > 1).
    pub count: usize,

    /// Sum of the known sizes of all members.
    pub total_bytes: u64,

    /// Preferred paths of all members, in encounter order.
    pub paths: Vec<String>,
}

impl DuplicateGroup {
    /// How many members could be removed keeping one copy.
    pub fn deletable_count(&self) -> usize {
        self.count.saturating_sub(1)
    }
}

/// Results from duplicate detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Identity key the report was built from.
    pub key_kind: DuplicateKeyKind,

    /// Duplicate groups, sorted descending by (count, total bytes);
    /// ties keep encounter order.
    pub groups: Vec<DuplicateGroup>,

    /// Number of duplicate groups.
    pub group_count: usize,

    /// Bytes recoverable by keeping one representative per key.
    pub recoverable_bytes: u64,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Total number of records across all duplicate groups.
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }

    fn empty(key_kind: DuplicateKeyKind) -> Self {
        Self {
            key_kind,
            groups: Vec::new(),
            group_count: 0,
            recoverable_bytes: 0,
        }
    }
}

/// Identity key for one record, `None` when the record has no usable key.
fn identity_key(record: &FileRecord, kind: DuplicateKeyKind) -> Option<CompactString> {
    match kind {
        DuplicateKeyKind::ContentHash => record.hash.clone(),
        DuplicateKeyKind::NameSize => {
            let size: CompactString = match record.size {
                Some(s) => format_compact!("{s}"),
                None => CompactString::const_new("NA"),
            };
            Some(format_compact!("{}|{}", record.name, size))
        }
        DuplicateKeyKind::Unavailable => None,
    }
}

struct GroupAccumulator {
    count: usize,
    total_bytes: u64,
    paths: Vec<String>,
    first_size: u64,
}

/// Group records by identity and report duplicate groups and recoverable
/// space.
///
/// Records with a missing key are excluded entirely: they count neither as
/// duplicates nor as uniques, and their sizes do not enter the recoverable
/// total. Recoverable space is the total size of all keyed records minus
/// one representative per distinct key, clamped at zero.
pub fn find_duplicates(snapshot: &Snapshot) -> DuplicateReport {
    let key_kind = if snapshot.has_column(Column::Hash) {
        DuplicateKeyKind::ContentHash
    } else if snapshot.has_column(Column::Size) {
        DuplicateKeyKind::NameSize
    } else {
        return DuplicateReport::empty(DuplicateKeyKind::Unavailable);
    };

    let mut by_key: IndexMap<CompactString, GroupAccumulator> = IndexMap::new();
    for record in &snapshot.records {
        let Some(key) = identity_key(record, key_kind) else {
            continue;
        };
        let size = record.size.unwrap_or(0);
        let acc = by_key.entry(key).or_insert_with(|| GroupAccumulator {
            count: 0,
            total_bytes: 0,
            paths: Vec::new(),
            first_size: size,
        });
        acc.count += 1;
        acc.total_bytes += size;
        acc.paths.push(record.preferred_path().to_string());
    }

    let keyed_total: u64 = by_key.values().map(|a| a.total_bytes).sum();
    let representative_total: u64 = by_key.values().map(|a| a.first_size).sum();
    let recoverable_bytes = keyed_total.saturating_sub(representative_total);

    let mut groups: Vec<DuplicateGroup> = by_key
        .into_iter()
        .filter(|(_, acc)| acc.count > 1)
        .map(|(key, acc)| DuplicateGroup {
            key,
            count: acc.count,
            total_bytes: acc.total_bytes,
            paths: acc.paths,
        })
        .collect();
    groups.sort_by(|a, b| (b.count, b.total_bytes).cmp(&(a.count, a.total_bytes)));

    let group_count = groups.len();
    debug!(
        ?key_kind,
        group_count, recoverable_bytes, "duplicate detection complete"
    );

    DuplicateReport {
        key_kind,
        groups,
        group_count,
        recoverable_bytes,
    }
}
