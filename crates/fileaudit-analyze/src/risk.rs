//! Weighted heuristic risk scoring.
//!
//! Every record is scored against a fixed, ordered table of independent
//! rules. Each rule contributes its policy weight when its predicate fires;
//! the total maps to a band through the policy's ascending cut points.
//! Rules never raise: a record missing a field a rule needs simply does not
//! trigger that rule.
//!
//! The table order is part of the contract — it fixes the order of the
//! reason list on every row, not the score itself.

use std::collections::{HashMap, HashSet};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fileaudit_core::{Column, FileRecord, PolicyError, RiskPolicy, RuleWeights, Snapshot};

use crate::perms;

/// Rule names, in evaluation order.
pub const RULE_BIG_FILE: &str = "big_file";
pub const RULE_DUPLICATE_HASH: &str = "duplicate_hash";
pub const RULE_WORLD_WRITABLE: &str = "world_writable";
pub const RULE_WORLD_READABLE: &str = "world_readable";
pub const RULE_HIDDEN: &str = "hidden";
pub const RULE_LONG_PATH: &str = "long_path";
pub const RULE_DEEP_LEVELS: &str = "deep_levels";
pub const RULE_STALE: &str = "stale";
pub const RULE_BAD_NAME: &str = "bad_name";

/// Shared context for rule predicates.
struct RuleCtx<'a> {
    policy: &'a RiskPolicy,
    snapshot: &'a Snapshot,
    /// Hashes occurring more than once; empty when there is no hash column.
    duplicate_hashes: HashSet<&'a str>,
}

/// One scoring rule: a name, a weight accessor, and a predicate.
struct Rule {
    name: &'static str,
    weight: fn(&RuleWeights) -> u32,
    fires: fn(&FileRecord, &RuleCtx) -> bool,
}

fn fires_big_file(record: &FileRecord, ctx: &RuleCtx) -> bool {
    record.size.is_some_and(|s| s >= ctx.policy.big_bytes)
}

fn fires_duplicate_hash(record: &FileRecord, ctx: &RuleCtx) -> bool {
    record
        .hash
        .as_deref()
        .is_some_and(|h| ctx.duplicate_hashes.contains(h))
}

fn fires_world_writable(record: &FileRecord, ctx: &RuleCtx) -> bool {
    ctx.snapshot.has_column(Column::PermOctal)
        && perms::world_writable(record.perm_octal.as_deref())
}

// Guarded on world_writable not firing: the two rules are sequential by
// design, not an unordered capability set.
fn fires_world_readable(record: &FileRecord, ctx: &RuleCtx) -> bool {
    ctx.snapshot.has_column(Column::PermOctal)
        && !perms::world_writable(record.perm_octal.as_deref())
        && perms::world_readable(record.perm_octal.as_deref())
}

fn fires_hidden(record: &FileRecord, _ctx: &RuleCtx) -> bool {
    record.hidden == Some(true)
}

fn fires_long_path(record: &FileRecord, ctx: &RuleCtx) -> bool {
    record.path_len() > ctx.policy.long_path
}

fn fires_deep_levels(record: &FileRecord, ctx: &RuleCtx) -> bool {
    record.depth() > ctx.policy.deep_levels
}

/// Best available date in priority order: accessed, modified, created.
pub(crate) fn best_date(record: &FileRecord) -> Option<chrono::NaiveDateTime> {
    record.accessed.or(record.modified).or(record.created)
}

fn fires_stale(record: &FileRecord, ctx: &RuleCtx) -> bool {
    best_date(record).is_some_and(|d| {
        (ctx.policy.reference_time - d).num_days() > ctx.policy.stale_days
    })
}

fn fires_bad_name(record: &FileRecord, ctx: &RuleCtx) -> bool {
    let name = record.name.to_lowercase();
    ctx.policy
        .bad_name_patterns
        .iter()
        .any(|p| name.contains(&p.to_lowercase()))
}

/// The ordered rule table.
const RULES: [Rule; 9] = [
    Rule {
        name: RULE_BIG_FILE,
        weight: |w| w.big_file,
        fires: fires_big_file,
    },
    Rule {
        name: RULE_DUPLICATE_HASH,
        weight: |w| w.duplicate_hash,
        fires: fires_duplicate_hash,
    },
    Rule {
        name: RULE_WORLD_WRITABLE,
        weight: |w| w.world_writable,
        fires: fires_world_writable,
    },
    Rule {
        name: RULE_WORLD_READABLE,
        weight: |w| w.world_readable,
        fires: fires_world_readable,
    },
    Rule {
        name: RULE_HIDDEN,
        weight: |w| w.hidden,
        fires: fires_hidden,
    },
    Rule {
        name: RULE_LONG_PATH,
        weight: |w| w.long_path,
        fires: fires_long_path,
    },
    Rule {
        name: RULE_DEEP_LEVELS,
        weight: |w| w.deep_levels,
        fires: fires_deep_levels,
    },
    Rule {
        name: RULE_STALE,
        weight: |w| w.stale,
        fires: fires_stale,
    },
    Rule {
        name: RULE_BAD_NAME,
        weight: |w| w.bad_name,
        fires: fires_bad_name,
    },
];

/// One scored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRow {
    /// Preferred path of the record.
    pub path: String,

    /// File name.
    pub name: CompactString,

    /// Size in bytes, when known.
    pub size: Option<u64>,

    /// Total points: the sum of the weights of the rules in `reasons`.
    pub points: u32,

    /// Names of the rules that fired, in table order.
    pub reasons: Vec<CompactString>,

    /// Band label for `points`.
    pub band: CompactString,
}

/// Results from risk scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// Scored rows, sorted descending by (points, size); ties keep
    /// encounter order.
    pub rows: Vec<RiskRow>,
}

impl RiskReport {
    /// Number of rows per band label, in first-seen order.
    pub fn band_counts(&self) -> Vec<(CompactString, usize)> {
        let mut counts: Vec<(CompactString, usize)> = Vec::new();
        for row in &self.rows {
            match counts.iter_mut().find(|(label, _)| *label == row.band) {
                Some((_, n)) => *n += 1,
                None => counts.push((row.band.clone(), 1)),
            }
        }
        counts
    }

    /// Highest score in the report.
    pub fn max_points(&self) -> u32 {
        self.rows.iter().map(|r| r.points).max().unwrap_or(0)
    }
}

/// Hashes that occur more than once in the snapshot.
///
/// Returns an empty set when the snapshot has no hash column, which
/// disables the duplicate-hash rule entirely. The fallback pseudo-hash is
/// never consulted here.
fn duplicated_hashes(snapshot: &Snapshot) -> HashSet<&str> {
    if !snapshot.has_column(Column::Hash) {
        return HashSet::new();
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in &snapshot.records {
        if let Some(hash) = record.hash.as_deref() {
            *counts.entry(hash).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(h, _)| h)
        .collect()
}

/// Score every record against the policy's rule weights and bands.
///
/// The policy is validated up front; a malformed policy is the only error
/// this analysis can return.
pub fn score_records(snapshot: &Snapshot, policy: &RiskPolicy) -> Result<RiskReport, PolicyError> {
    policy.validate()?;

    let ctx = RuleCtx {
        policy,
        snapshot,
        duplicate_hashes: duplicated_hashes(snapshot),
    };

    let mut rows: Vec<RiskRow> = snapshot
        .records
        .iter()
        .map(|record| {
            let mut points = 0u32;
            let mut reasons: Vec<CompactString> = Vec::new();
            for rule in &RULES {
                if (rule.fires)(record, &ctx) {
                    points += (rule.weight)(&policy.weights);
                    reasons.push(CompactString::const_new(rule.name));
                }
            }
            RiskRow {
                path: record.preferred_path().to_string(),
                name: record.name.clone(),
                size: record.size,
                points,
                reasons,
                band: CompactString::new(policy.band_for(points)),
            }
        })
        .collect();

    rows.sort_by(|a, b| (b.points, b.size).cmp(&(a.points, a.size)));

    debug!(rows = rows.len(), "risk scoring complete");
    Ok(RiskReport { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fileaudit_core::{ColumnSet, FileRecordBuilder};

    fn reference_time() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn policy() -> RiskPolicy {
        RiskPolicy::builder()
            .reference_time(reference_time())
            .build()
            .unwrap()
    }

    fn base(name: &str) -> FileRecordBuilder {
        let mut b = FileRecordBuilder::default();
        b.name(name).relative_path(name);
        b
    }

    #[test]
    fn test_big_writable_hidden_file_scores_critical() {
        // 3 GiB, other triad "rw-", hidden: 3 + 4 + 1 = 8 points.
        let record = base("blob.bin")
            .size(3u64 * 1024 * 1024 * 1024)
            .perm_octal("666")
            .hidden(true)
            .build()
            .unwrap();
        let snapshot = Snapshot::new(
            vec![record],
            ColumnSet::new()
                .with(Column::Size)
                .with(Column::PermOctal)
                .with(Column::Hidden),
        );

        let report = score_records(&snapshot, &policy()).unwrap();
        let row = &report.rows[0];
        assert_eq!(row.points, 8);
        assert_eq!(row.band, "Critical");
        assert_eq!(
            row.reasons,
            vec![RULE_BIG_FILE, RULE_WORLD_WRITABLE, RULE_HIDDEN]
        );
    }

    #[test]
    fn test_world_readable_only_without_writable() {
        let writable = base("w").perm_octal("666").build().unwrap();
        let readable = base("r").perm_octal("644").build().unwrap();
        let snapshot = Snapshot::new(
            vec![writable, readable],
            ColumnSet::new().with(Column::PermOctal),
        );

        let report = score_records(&snapshot, &policy()).unwrap();
        let by_name = |n: &str| {
            report
                .rows
                .iter()
                .find(|r| r.name == n)
                .unwrap()
                .reasons
                .clone()
        };
        assert_eq!(by_name("w"), vec![RULE_WORLD_WRITABLE]);
        assert_eq!(by_name("r"), vec![RULE_WORLD_READABLE]);
    }

    #[test]
    fn test_duplicate_hash_requires_hash_column() {
        let a = base("a").hash("x").build().unwrap();
        let b = base("b").hash("x").build().unwrap();

        let with_column = Snapshot::new(
            vec![a.clone(), b.clone()],
            ColumnSet::new().with(Column::Hash),
        );
        let report = score_records(&with_column, &policy()).unwrap();
        assert!(report.rows.iter().all(|r| r.points == 4));

        // Same records, column declared absent: the rule is skipped.
        let without_column = Snapshot::new(vec![a, b], ColumnSet::new());
        let report = score_records(&without_column, &policy()).unwrap();
        assert!(report.rows.iter().all(|r| r.points == 0));
    }

    #[test]
    fn test_stale_uses_priority_date() {
        let old = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let fresh = NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        // Accessed recently even though modified long ago: not stale.
        let touched = base("touched")
            .accessed(fresh)
            .modified(old)
            .build()
            .unwrap();
        // Only an old creation date: stale.
        let abandoned = base("abandoned").created(old).build().unwrap();
        // No dates at all: never stale.
        let dateless = base("dateless").build().unwrap();

        let snapshot = Snapshot::new(
            vec![touched, abandoned, dateless],
            ColumnSet::new()
                .with(Column::Accessed)
                .with(Column::Modified)
                .with(Column::Created),
        );
        let report = score_records(&snapshot, &policy()).unwrap();
        let reasons = |n: &str| {
            report
                .rows
                .iter()
                .find(|r| r.name == n)
                .unwrap()
                .reasons
                .clone()
        };
        assert!(reasons("touched").is_empty());
        assert_eq!(reasons("abandoned"), vec![RULE_STALE]);
        assert!(reasons("dateless").is_empty());
    }

    #[test]
    fn test_bad_name_is_case_insensitive() {
        let record = base("Quarterly BACKUP.xlsx").build().unwrap();
        let snapshot = Snapshot::new(vec![record], ColumnSet::new());
        let report = score_records(&snapshot, &policy()).unwrap();
        assert_eq!(report.rows[0].reasons, vec![RULE_BAD_NAME]);
    }

    #[test]
    fn test_long_and_deep_paths() {
        let long_name = "x".repeat(300);
        let long = base(&long_name).build().unwrap();
        let deep_path = (0..25).map(|_| "d").collect::<Vec<_>>().join("/") + "/f.txt";
        let mut deep = base("f.txt").build().unwrap();
        deep.relative_path = deep_path.into();

        let snapshot = Snapshot::new(vec![long, deep], ColumnSet::new());
        let report = score_records(&snapshot, &policy()).unwrap();
        let all_reasons: Vec<_> = report
            .rows
            .iter()
            .flat_map(|r| r.reasons.clone())
            .collect();
        assert!(all_reasons.contains(&CompactString::const_new(RULE_LONG_PATH)));
        assert!(all_reasons.contains(&CompactString::const_new(RULE_DEEP_LEVELS)));
    }

    #[test]
    fn test_points_equal_sum_of_reason_weights() {
        let record = base("copy of old backup.tmp")
            .size(5u64 * 1024 * 1024 * 1024)
            .hidden(true)
            .build()
            .unwrap();
        let snapshot = Snapshot::new(
            vec![record],
            ColumnSet::new().with(Column::Size).with(Column::Hidden),
        );
        let p = policy();
        let report = score_records(&snapshot, &p).unwrap();
        for row in &report.rows {
            let expected: u32 = row
                .reasons
                .iter()
                .map(|r| match r.as_str() {
                    RULE_BIG_FILE => p.weights.big_file,
                    RULE_DUPLICATE_HASH => p.weights.duplicate_hash,
                    RULE_WORLD_WRITABLE => p.weights.world_writable,
                    RULE_WORLD_READABLE => p.weights.world_readable,
                    RULE_HIDDEN => p.weights.hidden,
                    RULE_LONG_PATH => p.weights.long_path,
                    RULE_DEEP_LEVELS => p.weights.deep_levels,
                    RULE_STALE => p.weights.stale,
                    RULE_BAD_NAME => p.weights.bad_name,
                    other => panic!("unknown rule {other}"),
                })
                .sum();
            assert_eq!(row.points, expected);
        }
    }

    #[test]
    fn test_rows_sorted_by_points_then_size() {
        let small_hot = base("backup copy.tmp").size(10u64).build().unwrap();
        let big_cold = base("plain.txt").size(100u64).build().unwrap();
        let big_hot = base("old backup copy.tmp").size(100u64).build().unwrap();
        let snapshot = Snapshot::new(
            vec![small_hot, big_cold, big_hot],
            ColumnSet::new().with(Column::Size),
        );
        let report = score_records(&snapshot, &policy()).unwrap();
        let names: Vec<&str> = report.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["old backup copy.tmp", "backup copy.tmp", "plain.txt"]
        );
    }

    #[test]
    fn test_malformed_policy_is_an_error() {
        let mut bad = policy();
        bad.bands.clear();
        let snapshot = Snapshot::new(Vec::new(), ColumnSet::new());
        assert!(score_records(&snapshot, &bad).is_err());
    }
}
